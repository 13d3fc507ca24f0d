//! Orchestration stages and their percentage ranges
//!
//! One enum is the single source of truth for stage names, ordering, and
//! the fixed percentage sub-range each stage occupies in the overall 0-100
//! progress scale. Both the progress mapper and the orchestrator's
//! transition logic consume this table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel percentage carried by `error` and `cancelled` events
pub const ERROR_PERCENTAGE: i32 = -1;

/// A named phase of the orchestration pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Starting,
    Analyzing,
    Crawling,
    Processing,
    DocumentStorage,
    CodeExtraction,
    Finalization,
    Completed,
    Error,
    Cancelled,
}

impl Stage {
    /// The `[start, end]` percentage range this stage occupies
    ///
    /// `Error` and `Cancelled` have no range; they map to the −1 sentinel.
    pub fn range(self) -> Option<(f64, f64)> {
        match self {
            Self::Starting => Some((0.0, 0.0)),
            Self::Analyzing => Some((0.0, 5.0)),
            Self::Crawling => Some((5.0, 30.0)),
            Self::Processing => Some((30.0, 35.0)),
            Self::DocumentStorage => Some((35.0, 80.0)),
            Self::CodeExtraction => Some((80.0, 95.0)),
            Self::Finalization => Some((95.0, 100.0)),
            Self::Completed => Some((100.0, 100.0)),
            Self::Error | Self::Cancelled => None,
        }
    }

    /// Returns true for states that end an orchestration
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }

    /// The snake_case name used in progress events and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Analyzing => "analyzing",
            Self::Crawling => "crawling",
            Self::Processing => "processing",
            Self::DocumentStorage => "document_storage",
            Self::CodeExtraction => "code_extraction",
            Self::Finalization => "finalization",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
