//! Events the worker sends back to the interaction side.

use std::path::PathBuf;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::ValidationError;
use crate::gallery::Presenter;
use crate::types::{ClassificationResult, ProgressSnapshot, RunSummary};

/// Receiving end of a controller's event channel.
pub type EventReceiver = UnboundedReceiver<RunEvent>;

pub(crate) type EventSender = UnboundedSender<RunEvent>;

/// One message on the ordered event channel.
///
/// Events of a run carry its `run_id` so presenters can drop anything that
/// arrives for a run they have already moved past.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A run passed validation and is about to visit `total` candidates
    RunStarted { run_id: u64, total: usize },

    /// One more candidate visited
    Progress {
        run_id: u64,
        progress: ProgressSnapshot,
    },

    /// A candidate cleared the threshold
    Result {
        run_id: u64,
        result: ClassificationResult,
    },

    /// A candidate could not be decoded or classified
    ImageFailed {
        run_id: u64,
        path: PathBuf,
        message: String,
    },

    /// The worker stopped, by exhaustion or cancellation
    Finished { run_id: u64, summary: RunSummary },

    /// A start request was rejected before any work began
    ValidationFailed { error: ValidationError },
}

impl RunEvent {
    /// The run this event belongs to, if any.
    pub fn run_id(&self) -> Option<u64> {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::Progress { run_id, .. }
            | Self::Result { run_id, .. }
            | Self::ImageFailed { run_id, .. }
            | Self::Finished { run_id, .. } => Some(*run_id),
            Self::ValidationFailed { .. } => None,
        }
    }

    /// Whether this is the last event of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::ValidationFailed { .. })
    }

    /// Hand the event to the matching presenter callback.
    pub fn dispatch(self, presenter: &mut dyn Presenter) {
        match self {
            Self::RunStarted { run_id, total } => presenter.on_run_started(run_id, total),
            Self::Progress { run_id, progress } => presenter.on_progress(run_id, progress),
            Self::Result { run_id, result } => presenter.on_result(run_id, result),
            Self::ImageFailed {
                run_id,
                path,
                message,
            } => presenter.on_image_failed(run_id, &path, &message),
            Self::Finished { run_id, summary } => presenter.on_finished(run_id, &summary),
            Self::ValidationFailed { error } => presenter.on_validation_error(&error),
        }
    }
}
