//! Queue replay and conflict resolution

mod engine;
mod resolver;

pub use engine::{EngineConfig, FlushOutcome, FlushReport, SyncEngine};
pub use resolver::{ConflictResolver, ReplayOutcome};
