//! IPC module - What crosses between the sampling thread and the rest
//!
//! The stop signal is the only state both threads touch. Log entries flow one
//! way, from the sampling thread into a sink.

pub mod sink;
pub mod stop_signal;

pub use sink::{ChannelSink, LogEntry, LogSink, MemorySink, SampleRecord, WriterSink, HEADER};
pub use stop_signal::StopSignal;
