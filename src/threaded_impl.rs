//! Threaded implementation - The sampling thread and the coordinator that
//! runs a motion alongside it

pub mod coordinator;
pub mod sampling_thread;

pub use coordinator::{RunCoordinator, RunError, RunReport};
pub use sampling_thread::{
    spawn_sampling_thread, LoopStats, RunSummary, SamplingLoop, Termination, MAX_FATAL_ERRORS,
};
