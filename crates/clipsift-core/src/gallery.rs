//! Presentation state fed from the run event channel.

use std::path::Path;

use crate::error::ValidationError;
use crate::types::{ClassificationResult, ProgressSnapshot, RunState, RunSummary};

/// Receives run events on the interaction side.
///
/// Implementations own whatever they render; the worker never touches
/// them directly.
pub trait Presenter {
    fn on_run_started(&mut self, run_id: u64, total: usize);

    fn on_progress(&mut self, run_id: u64, progress: ProgressSnapshot);

    fn on_result(&mut self, run_id: u64, result: ClassificationResult);

    fn on_image_failed(&mut self, _run_id: u64, _path: &Path, _message: &str) {}

    fn on_finished(&mut self, run_id: u64, summary: &RunSummary);

    fn on_validation_error(&mut self, error: &ValidationError);
}

/// Results and status of the most recent run.
#[derive(Debug, Default)]
pub struct Gallery {
    run_id: Option<u64>,
    state: RunState,
    results: Vec<ClassificationResult>,
    progress: ProgressSnapshot,
    failed: usize,
    summary: Option<RunSummary>,
    last_error: Option<ValidationError>,
}

impl Gallery {
    pub fn run_id(&self) -> Option<u64> {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Accepted results in arrival order.
    pub fn results(&self) -> &[ClassificationResult] {
        &self.results
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn last_error(&self) -> Option<&ValidationError> {
        self.last_error.as_ref()
    }

    /// One-line status text.
    pub fn status_line(&self) -> String {
        match self.state {
            RunState::Idle => match &self.last_error {
                Some(error) => format!("Not started: {error}"),
                None => "Idle".to_string(),
            },
            RunState::Running => format!(
                "Running: {}/{} processed, {} found",
                self.progress.processed,
                self.progress.total,
                self.results.len()
            ),
            RunState::Cancelling => format!(
                "Stopping after {}/{} processed",
                self.progress.processed, self.progress.total
            ),
            RunState::Finished => {
                let mut line = format!(
                    "Finished: {}/{} processed, {} found",
                    self.progress.processed,
                    self.progress.total,
                    self.results.len()
                );
                if self.failed > 0 {
                    line.push_str(&format!(", {} unreadable", self.failed));
                }
                if self.summary.as_ref().is_some_and(|s| s.cancelled) {
                    line.push_str(" (cancelled)");
                }
                line
            }
        }
    }

    /// Mark the current run as stopping, ahead of the worker noticing.
    pub fn mark_cancelling(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Cancelling;
        }
    }

    fn is_current(&self, run_id: u64) -> bool {
        self.run_id == Some(run_id)
    }
}

impl Presenter for Gallery {
    fn on_run_started(&mut self, run_id: u64, total: usize) {
        self.run_id = Some(run_id);
        self.state = RunState::Running;
        self.results.clear();
        self.progress = ProgressSnapshot::start(total);
        self.failed = 0;
        self.summary = None;
        self.last_error = None;
    }

    fn on_progress(&mut self, run_id: u64, progress: ProgressSnapshot) {
        if self.is_current(run_id) {
            self.progress = progress;
        }
    }

    fn on_result(&mut self, run_id: u64, result: ClassificationResult) {
        if self.is_current(run_id) {
            self.results.push(result);
        }
    }

    fn on_image_failed(&mut self, run_id: u64, _path: &Path, _message: &str) {
        if self.is_current(run_id) {
            self.failed += 1;
        }
    }

    fn on_finished(&mut self, run_id: u64, summary: &RunSummary) {
        if self.is_current(run_id) {
            self.state = RunState::Finished;
            self.progress = ProgressSnapshot {
                processed: summary.processed,
                total: summary.total,
            };
            self.summary = Some(summary.clone());
        }
    }

    fn on_validation_error(&mut self, error: &ValidationError) {
        self.last_error = Some(error.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(name: &str, rank: usize) -> ClassificationResult {
        ClassificationResult {
            path: PathBuf::from(name),
            file_name: name.to_string(),
            label: "cat".to_string(),
            label_index: 0,
            probability: 0.95,
            rank,
            thumbnail: None,
        }
    }

    #[test]
    fn test_new_run_clears_results() {
        let mut gallery = Gallery::default();
        gallery.on_run_started(1, 2);
        gallery.on_result(1, result("a.png", 0));
        gallery.on_progress(1, ProgressSnapshot { processed: 1, total: 2 });
        assert_eq!(gallery.results().len(), 1);

        gallery.on_run_started(2, 5);
        assert!(gallery.results().is_empty());
        assert_eq!(gallery.progress(), ProgressSnapshot::start(5));
        assert_eq!(gallery.state(), RunState::Running);
    }

    #[test]
    fn test_stale_run_events_ignored() {
        let mut gallery = Gallery::default();
        gallery.on_run_started(2, 3);
        gallery.on_result(1, result("old.png", 0));
        gallery.on_progress(1, ProgressSnapshot { processed: 9, total: 9 });
        gallery.on_finished(1, &RunSummary::default());

        assert!(gallery.results().is_empty());
        assert_eq!(gallery.progress().processed, 0);
        assert_eq!(gallery.state(), RunState::Running);
    }

    #[test]
    fn test_status_line_reports_failures() {
        let mut gallery = Gallery::default();
        assert_eq!(gallery.status_line(), "Idle");

        gallery.on_run_started(1, 3);
        gallery.on_image_failed(1, Path::new("bad.png"), "truncated");
        gallery.on_result(1, result("a.png", 0));
        assert_eq!(gallery.status_line(), "Running: 0/3 processed, 1 found");

        gallery.on_finished(
            1,
            &RunSummary {
                processed: 3,
                total: 3,
                accepted: 1,
                failed: 1,
                rejected: 1,
                ..RunSummary::default()
            },
        );
        assert_eq!(
            gallery.status_line(),
            "Finished: 3/3 processed, 1 found, 1 unreadable"
        );
    }

    #[test]
    fn test_validation_error_shown_when_idle() {
        let mut gallery = Gallery::default();
        gallery.on_validation_error(&ValidationError::EmptyLabelSet);
        assert!(gallery.status_line().starts_with("Not started"));
        assert_eq!(gallery.last_error(), Some(&ValidationError::EmptyLabelSet));
    }
}
