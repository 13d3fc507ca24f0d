//! Stage-relative to overall progress mapping
//!
//! Strategies and collaborators report progress relative to their own stage
//! (0-100). The mapper interpolates that into the stage's fixed sub-range
//! and clamps the result so the externally visible percentage never moves
//! backward, even across stage transitions or out-of-order callbacks.

use crate::progress::stage::{Stage, ERROR_PERCENTAGE};

/// Maps `(stage, stage_progress)` pairs into one monotonic 0-100 percentage
///
/// One mapper instance belongs to one progress-id for its whole lifetime.
#[derive(Debug, Default)]
pub struct ProgressMapper {
    floor: i32,
}

impl ProgressMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps stage-relative progress into the overall percentage
    ///
    /// `stage_progress` is clamped to [0, 100] before interpolation.
    /// `Completed` always forces 100. `Error` and `Cancelled` always return
    /// the −1 sentinel and leave the monotonic floor untouched.
    pub fn map(&mut self, stage: Stage, stage_progress: f64) -> i32 {
        let (start, end) = match stage {
            Stage::Completed => {
                self.floor = 100;
                return 100;
            }
            Stage::Error | Stage::Cancelled => return ERROR_PERCENTAGE,
            other => match other.range() {
                Some(range) => range,
                None => return ERROR_PERCENTAGE,
            },
        };

        let fraction = stage_progress.clamp(0.0, 100.0) / 100.0;
        let overall = (start + (end - start) * fraction).round() as i32;
        let overall = overall.max(self.floor);
        self.floor = overall;
        overall
    }

    /// The highest percentage returned so far
    pub fn floor(&self) -> i32 {
        self.floor
    }
}
