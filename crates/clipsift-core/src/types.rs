//! Core data types shared by the pipeline, the run controller and presenters.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One accepted image: its top label cleared the minimum probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Path to the source file
    pub path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// The winning label (argmax of the probability vector)
    pub label: String,

    /// Position of `label` in the label set
    pub label_index: usize,

    /// Probability of the winning label, in [0, 1]
    pub probability: f32,

    /// 0-based position among the results of the same run
    pub rank: usize,

    /// Base64-encoded WebP thumbnail, filled in by presenters that want one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// How far a run has got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Candidates visited so far (accepted, rejected or failed)
    pub processed: usize,

    /// Candidates discovered for this run
    pub total: usize,
}

impl ProgressSnapshot {
    /// Progress at the start of a run over `total` candidates.
    pub fn start(total: usize) -> Self {
        Self {
            processed: 0,
            total,
        }
    }

    /// Completion as a fraction in [0, 1]; an empty run counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Lifecycle of the controller's current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Nothing has been started yet
    #[default]
    Idle,
    /// A worker is processing candidates
    Running,
    /// Cancellation requested; the worker stops at the next candidate boundary
    Cancelling,
    /// The last run ended, by exhaustion or cancellation
    Finished,
}

impl RunState {
    /// Whether a worker is (still) alive for the current run.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Cancelling)
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Candidates visited
    pub processed: usize,

    /// Candidates discovered
    pub total: usize,

    /// Candidates whose top label cleared the threshold
    pub accepted: usize,

    /// Candidates classified below the threshold
    pub rejected: usize,

    /// Candidates that could not be decoded or classified
    pub failed: usize,

    /// Whether the run stopped on a cancellation request
    pub cancelled: bool,

    /// Wall time of the worker loop
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl RunSummary {
    /// Images per second over the whole run.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
