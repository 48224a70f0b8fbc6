#[macro_use]
extern crate log;

use serde::Serialize;
use std::borrow::Cow;
use std::cell::RefCell;

pub type StrCow = Cow<'static, str>;

pub type Clock = Box<dyn Fn() -> u64>;

/// A single closed span. Times are in host clock units.
#[derive(Clone, Debug, Serialize)]
pub struct Span {
    pub name: String,
    pub depth: u32,
    pub start: u64,
    pub end: u64,
}

impl Span {
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Trace {
    pub spans: Vec<Span>,
}

impl Trace {
    pub fn total(&self, name: &str) -> u64 {
        self.spans.iter().filter(|s| s.name == name).map(|s| s.duration()).sum()
    }
}

struct TraceState {
    clock: Clock,
    open: Vec<(StrCow, u64)>,
    trace: Trace,
}

thread_local! {
    static TRACE: RefCell<Option<TraceState>> = const { RefCell::new(None) };
}

/// Begin collecting spans using the supplied clock. Replaces any trace already running.
pub fn start_trace(clock: Clock) {
    TRACE.with(|trace| {
        *trace.borrow_mut() = Some(TraceState {
            clock,
            open: Vec::new(),
            trace: Trace::default(),
        });
    });
}

pub fn stop_trace() -> Option<Trace> {
    TRACE.with(|trace| trace.borrow_mut().take().map(|state| state.trace))
}

pub fn is_tracing() -> bool {
    TRACE.with(|trace| trace.borrow().is_some())
}

#[must_use = "The guard is immediately dropped after instantiation. This is probably not
what you want! Consider using a `let` binding to increase its lifetime."]
pub struct SpanGuard {
    name: StrCow,
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        end(self.name.clone());
    }
}

pub fn start_guard<S: Into<StrCow>>(name: S) -> SpanGuard {
    let name = name.into();
    start(name.clone());
    SpanGuard { name }
}

/// Run `f` inside a named span.
pub fn timed<S: Into<StrCow>, R, F: FnOnce() -> R>(name: S, f: F) -> R {
    let _guard = start_guard(name);

    f()
}

fn start(name: StrCow) {
    TRACE.with(|trace| {
        if let Some(state) = trace.borrow_mut().as_mut() {
            let now = (state.clock)();

            trace!("Enter: {:?} - Time: {}", name, now);

            state.open.push((name, now));
        }
    });
}

fn end(name: StrCow) {
    TRACE.with(|trace| {
        if let Some(state) = trace.borrow_mut().as_mut() {
            let now = (state.clock)();

            match state.open.iter().rposition(|(open_name, _)| *open_name == name) {
                Some(index) => {
                    let (_, start) = state.open.remove(index);
                    let depth = index as u32;

                    trace!("Exit: {:?} - Time: {} - Delta: {}", name, now, now.saturating_sub(start));

                    state.trace.spans.push(Span {
                        name: name.into_owned(),
                        depth,
                        start,
                        end: now,
                    });
                }
                None => {
                    //
                    // NOTE: Span was opened before the trace started.
                    //

                    debug!("Exit for span that was never entered: {:?}", name);
                }
            }
        }
    });
}
