use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufWriter, Stdout, Write};
use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;

use crate::threaded_impl::sampling_thread::RunSummary;

pub const HEADER: &str = "time_ms, error, P, I, D, output";

// ============================================================================
// SAMPLE RECORD
// ============================================================================

/// Snapshot of one accepted sample, taken right after the controller update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub time_ms: f64,
    pub target: f64,
    pub measured: f64,
    pub rate: f64,
    pub error: f64,
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub output: f64,
}

impl fmt::Display for SampleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0}, {}, {}, {}, {}, {}",
            self.time_ms, self.error, self.p, self.i, self.d, self.output
        )
    }
}

// ============================================================================
// LOG ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Header,
    Sample(SampleRecord),
    Summary(RunSummary),
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Header => f.write_str(HEADER),
            LogEntry::Sample(record) => fmt::Display::fmt(record, f),
            LogEntry::Summary(summary) => write!(
                f,
                "Steady State Error: {}\nOut of range errors: {}, Total errors: {}",
                summary.last_error, summary.recoverable_errors, summary.fatal_errors
            ),
        }
    }
}

/// Append-only destination for a run's header, samples and summary.
pub trait LogSink: Send {
    fn write(&mut self, entry: LogEntry) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

// ============================================================================
// WRITER SINK - One text line per entry
// ============================================================================

pub struct WriterSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<BufWriter<Stdout>> {
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(io::stdout()))
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write(&mut self, entry: LogEntry) -> io::Result<()> {
        writeln!(self.writer, "{}", entry)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

// ============================================================================
// MEMORY SINK - Bounded buffer shared with the reader
// ============================================================================

#[derive(Clone)]
pub struct MemorySink {
    entries: Arc<RwLock<VecDeque<LogEntry>>>,
    max_size: usize,
}

impl MemorySink {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_size.min(4096)))),
            max_size,
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn samples(&self) -> Vec<SampleRecord> {
        self.entries
            .read()
            .iter()
            .filter_map(|e| match e {
                LogEntry::Sample(record) => Some(*record),
                _ => None,
            })
            .collect()
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.entries.read().iter().rev().find_map(|e| match e {
            LogEntry::Summary(summary) => Some(summary.clone()),
            _ => None,
        })
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .flat_map(|e| e.to_string().lines().map(str::to_owned).collect::<Vec<_>>())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl LogSink for MemorySink {
    fn write(&mut self, entry: LogEntry) -> io::Result<()> {
        let mut log = self.entries.write();
        log.push_back(entry);
        if log.len() > self.max_size {
            log.pop_front();
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// CHANNEL SINK - Streams entries to another thread
// ============================================================================

pub struct ChannelSink {
    tx: Sender<LogEntry>,
}

impl ChannelSink {
    pub fn bounded(buffer_size: usize) -> (Self, Receiver<LogEntry>) {
        let (tx, rx) = bounded(buffer_size);
        (Self { tx }, rx)
    }
}

impl LogSink for ChannelSink {
    /// Never blocks the sampling thread; a full buffer drops the entry.
    fn write(&mut self, entry: LogEntry) -> io::Result<()> {
        self.tx.try_send(entry).map_err(|e| match e {
            TrySendError::Full(_) => io::Error::new(io::ErrorKind::WouldBlock, "log channel full"),
            TrySendError::Disconnected(_) => {
                io::Error::new(io::ErrorKind::BrokenPipe, "log receiver dropped")
            }
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
