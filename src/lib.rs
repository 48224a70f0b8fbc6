#![recursion_limit = "128"]
#![warn(clippy::all)]

pub mod decision;
pub mod entitymappingsystem;
pub mod features;
pub mod game_loop;
pub mod jobs;
pub mod logging;
pub mod memorysystem;
pub mod military;
pub mod operations;
pub mod posture;
pub mod room;
pub mod serialize;
pub mod signals;

pub use decision::{DecisionError, DecisionTree, DecisionTreeBuilder};
pub use features::Features;
pub use game_loop::{SwarmEnvironment, TickReport};
pub use memorysystem::{InMemorySegments, SegmentStorage, SnapshotError, SwarmSnapshot};
