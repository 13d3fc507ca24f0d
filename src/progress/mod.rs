//! Progress tracking for crawl orchestrations
//!
//! # Components
//!
//! - `Stage`: the orchestration phases and their fixed percentage ranges
//! - `ProgressMapper`: stage-relative progress into one monotonic 0-100 value
//! - `ProgressState`: per-run state producing immutable emission snapshots
//! - `ProgressSink` / `ProgressReporter`: delivery to the external observer

mod mapper;
mod sink;
mod stage;
mod state;

// Re-export main types
pub use mapper::ProgressMapper;
pub use sink::{
    ChannelProgressSink, LoggingProgressSink, NoopProgressSink, ProgressReporter, ProgressSink,
    SinkError,
};
pub use stage::{Stage, ERROR_PERCENTAGE};
pub use state::{ProgressState, ProgressUpdate};
