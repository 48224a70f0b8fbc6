//! Arena backed decision trees.
//!
//! Nodes live in a flat `Vec` and refer to each other by index. A node can
//! only reference nodes built before it, so a finished tree has no cycles and
//! every walk from the root ends after at most `len` steps.

use std::fmt::{Display, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

static NEXT_DIAGNOSTIC_ID: AtomicUsize = AtomicUsize::new(1);

pub type Predicate<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// Index of a node in the builder arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Process unique name for a node, used in errors and `describe` output only.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DiagnosticId {
    kind: &'static str,
    serial: usize,
    label: Option<String>,
}

impl DiagnosticId {
    fn next(kind: &'static str) -> DiagnosticId {
        DiagnosticId {
            kind,
            serial: NEXT_DIAGNOSTIC_ID.fetch_add(1, Ordering::Relaxed),
            label: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Display for DiagnosticId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}#{}({})", self.kind, self.serial, label),
            None => write!(f, "{}#{}", self.kind, self.serial),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("decision node {node} has no matching case and no default")]
    DeadEnd { node: String },
    #[error("decision node {node} refers to node {child} which was not built before it")]
    UnknownNode { node: String, child: usize },
    #[error("root node {0} does not exist")]
    UnknownRoot(usize),
}

/// One `multiway` arm.
pub struct Case<C> {
    predicate: Predicate<C>,
    next: NodeId,
}

pub fn case<C, P>(predicate: P, next: NodeId) -> Case<C>
where
    P: Fn(&C) -> bool + Send + Sync + 'static,
{
    Case {
        predicate: Box::new(predicate),
        next,
    }
}

enum NodeKind<C, R> {
    Leaf(R),
    Conditional {
        predicate: Predicate<C>,
        on_true: NodeId,
        on_false: NodeId,
    },
    Multiway {
        cases: Vec<Case<C>>,
        default: Option<NodeId>,
    },
    Passthrough {
        next: NodeId,
    },
}

impl<C, R> NodeKind<C, R> {
    fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Leaf(_) => Vec::new(),
            NodeKind::Conditional { on_true, on_false, .. } => vec![*on_true, *on_false],
            NodeKind::Multiway { cases, default } => cases.iter().map(|c| c.next).chain(default.iter().cloned()).collect(),
            NodeKind::Passthrough { next } => vec![*next],
        }
    }
}

struct DecisionNode<C, R> {
    id: DiagnosticId,
    kind: NodeKind<C, R>,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

pub struct DecisionTreeBuilder<C, R> {
    nodes: Vec<DecisionNode<C, R>>,
}

impl<C, R> Default for DecisionTreeBuilder<C, R> {
    fn default() -> Self {
        DecisionTreeBuilder { nodes: Vec::new() }
    }
}

impl<C, R> DecisionTreeBuilder<C, R> {
    pub fn new() -> DecisionTreeBuilder<C, R> {
        Self::default()
    }

    fn push(&mut self, kind: &'static str, node: NodeKind<C, R>) -> NodeId {
        let id = NodeId(self.nodes.len());

        self.nodes.push(DecisionNode {
            id: DiagnosticId::next(kind),
            kind: node,
        });

        id
    }

    pub fn leaf(&mut self, result: R) -> NodeId {
        self.push("leaf", NodeKind::Leaf(result))
    }

    pub fn conditional<P>(&mut self, predicate: P, on_true: NodeId, on_false: NodeId) -> NodeId
    where
        P: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.push(
            "conditional",
            NodeKind::Conditional {
                predicate: Box::new(predicate),
                on_true,
                on_false,
            },
        )
    }

    /// Cases are tried in the order given; the first match wins.
    pub fn multiway(&mut self, cases: Vec<Case<C>>, default: Option<NodeId>) -> NodeId {
        self.push("multiway", NodeKind::Multiway { cases, default })
    }

    pub fn passthrough(&mut self, label: &str, next: NodeId) -> NodeId {
        let id = self.push("passthrough", NodeKind::Passthrough { next });

        self.label(id, label)
    }

    /// Attach a readable label to a node's diagnostic id.
    pub fn label(&mut self, node: NodeId, label: &str) -> NodeId {
        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.id.label = Some(label.to_owned());
        }

        node
    }

    pub fn build(self, root: NodeId) -> Result<DecisionTree<C, R>, DecisionError> {
        if root.0 >= self.nodes.len() {
            return Err(DecisionError::UnknownRoot(root.0));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(child) = node.kind.children().into_iter().find(|child| child.0 >= index) {
                return Err(DecisionError::UnknownNode {
                    node: node.id.to_string(),
                    child: child.0,
                });
            }
        }

        Ok(DecisionTree { nodes: self.nodes, root })
    }
}

// ─── Tree ────────────────────────────────────────────────────────────────────

pub struct DecisionTree<C, R> {
    nodes: Vec<DecisionNode<C, R>>,
    root: NodeId,
}

impl<C, R> DecisionTree<C, R> {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn diagnostic_id(&self, node: NodeId) -> Option<&DiagnosticId> {
        self.nodes.get(node.0).map(|entry| &entry.id)
    }

    fn node(&self, node: NodeId) -> Result<&DecisionNode<C, R>, DecisionError> {
        self.nodes.get(node.0).ok_or(DecisionError::UnknownRoot(node.0))
    }

    pub fn evaluate(&self, context: &C) -> Result<&R, DecisionError> {
        let mut current = self.node(self.root)?;

        loop {
            let next = match &current.kind {
                NodeKind::Leaf(result) => return Ok(result),
                NodeKind::Conditional {
                    predicate,
                    on_true,
                    on_false,
                } => {
                    if predicate(context) {
                        *on_true
                    } else {
                        *on_false
                    }
                }
                NodeKind::Multiway { cases, default } => cases
                    .iter()
                    .find(|case| (case.predicate)(context))
                    .map(|case| case.next)
                    .or(*default)
                    .ok_or_else(|| DecisionError::DeadEnd {
                        node: current.id.to_string(),
                    })?,
                NodeKind::Passthrough { next } => *next,
            };

            current = self.node(next)?;
        }
    }

    /// Indented text rendering of the tree, one node per line.
    pub fn describe(&self) -> String
    where
        R: std::fmt::Debug,
    {
        let mut out = String::new();

        self.describe_node(self.root, 0, "", &mut out);

        out
    }

    fn describe_node(&self, node: NodeId, depth: usize, edge: &str, out: &mut String)
    where
        R: std::fmt::Debug,
    {
        let Some(entry) = self.nodes.get(node.0) else {
            return;
        };

        let indent = "  ".repeat(depth);

        match &entry.kind {
            NodeKind::Leaf(result) => {
                let _ = writeln!(out, "{}{}{} => {:?}", indent, edge, entry.id, result);
            }
            NodeKind::Conditional { on_true, on_false, .. } => {
                let _ = writeln!(out, "{}{}{}", indent, edge, entry.id);
                self.describe_node(*on_true, depth + 1, "true: ", out);
                self.describe_node(*on_false, depth + 1, "false: ", out);
            }
            NodeKind::Multiway { cases, default } => {
                let _ = writeln!(out, "{}{}{}", indent, edge, entry.id);

                for (index, case) in cases.iter().enumerate() {
                    self.describe_node(case.next, depth + 1, &format!("case {}: ", index), out);
                }

                if let Some(default) = default {
                    self.describe_node(*default, depth + 1, "default: ", out);
                }
            }
            NodeKind::Passthrough { next } => {
                let _ = writeln!(out, "{}{}{}", indent, edge, entry.id);
                self.describe_node(*next, depth + 1, "", out);
            }
        }
    }
}
