//! Run lifecycle: validate, load the backend, spawn one worker, report back.
//!
//! Each run gets its own named OS thread. The backend is called only from
//! that thread, and the thread exits when the run does.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use tokio::sync::{mpsc, oneshot};

use crate::backend::{BackendLoader, InferenceBackend};
use crate::config::{Config, LimitsConfig, ProcessingConfig, ThumbnailConfig};
use crate::error::{PipelineError, ValidationError};
use crate::labels::LabelSet;
use crate::pipeline::{
    ClassificationPipeline, FileDiscovery, ImageCandidate, ImageDecoder, MinProbability,
    Outcome, ThumbnailGenerator,
};
use crate::types::{RunState, RunSummary};

use super::cancel::CancelFlag;
use super::events::{EventReceiver, EventSender, RunEvent};

/// Config sections a run needs.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub processing: ProcessingConfig,
    pub limits: LimitsConfig,
    pub thumbnail: ThumbnailConfig,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            processing: config.processing.clone(),
            limits: config.limits.clone(),
            thumbnail: config.thumbnail.clone(),
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What the user asked for, as typed.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Comma-separated labels
    pub labels: String,
    /// Minimum probability as a percentage
    pub min_probability: String,
    /// Folder to classify
    pub directory: PathBuf,
}

impl RunRequest {
    pub fn new(
        labels: impl Into<String>,
        min_probability: impl Into<String>,
        directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            labels: labels.into(),
            min_probability: min_probability.into(),
            directory: directory.into(),
        }
    }
}

/// Result of a start request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A worker was spawned
    Started { run_id: u64, total: usize },
    /// A run is still active; the request was ignored
    AlreadyRunning,
}

struct ActiveRun {
    run_id: u64,
    cancel: CancelFlag,
    done: oneshot::Receiver<RunSummary>,
}

struct PreparedRun {
    labels: LabelSet,
    threshold: MinProbability,
    candidates: Vec<ImageCandidate>,
    backend: Box<dyn InferenceBackend>,
}

/// Owns the run state and at most one background worker.
///
/// All progress and results come back through the [`EventReceiver`]
/// returned by [`RunController::new`], in the order the worker produced
/// them.
pub struct RunController {
    loader: Arc<dyn BackendLoader>,
    settings: RunSettings,
    events: EventSender,
    state: Arc<Mutex<RunState>>,
    next_run_id: u64,
    active: Option<ActiveRun>,
}

impl RunController {
    pub fn new(loader: Arc<dyn BackendLoader>, settings: RunSettings) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            loader,
            settings,
            events,
            state: Arc::new(Mutex::new(RunState::Idle)),
            next_run_id: 0,
            active: None,
        };
        (controller, receiver)
    }

    /// Validate the request, load the backend and spawn the worker.
    ///
    /// Validation and backend failures are returned here and also published
    /// as [`RunEvent::ValidationFailed`]; no worker is spawned for them.
    pub async fn start(&mut self, request: RunRequest) -> Result<StartOutcome, ValidationError> {
        if self.state().is_active() {
            tracing::warn!("Ignoring start request: a run is already active");
            return Ok(StartOutcome::AlreadyRunning);
        }

        match self.prepare(&request).await {
            Ok(prepared) => Ok(self.spawn(prepared)),
            Err(error) => {
                tracing::warn!("Run rejected ({}): {}", error.kind(), error);
                let _ = self.events.send(RunEvent::ValidationFailed {
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Ask the active run to stop at its next candidate boundary.
    ///
    /// Returns `false` (and does nothing) unless a run is `Running`.
    pub fn cancel(&self) -> bool {
        let mut state = lock(&self.state);
        if *state != RunState::Running {
            return false;
        }
        *state = RunState::Cancelling;

        if let Some(active) = &self.active {
            tracing::info!("Cancelling run {}", active.run_id);
            active.cancel.cancel();
        }
        true
    }

    pub fn state(&self) -> RunState {
        *lock(&self.state)
    }

    /// Id of the most recently started run.
    pub fn current_run_id(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.run_id)
    }

    /// Wait for the active worker to exit and return its summary.
    ///
    /// A worker that died early still reports the partial summary it had.
    pub async fn wait(&mut self) -> Option<RunSummary> {
        let active = self.active.take()?;
        match active.done.await {
            Ok(summary) => Some(summary),
            Err(_) => {
                tracing::error!("Run {} worker exited without a summary", active.run_id);
                *lock(&self.state) = RunState::Finished;
                None
            }
        }
    }

    async fn prepare(&self, request: &RunRequest) -> Result<PreparedRun, ValidationError> {
        let labels = LabelSet::parse(&request.labels)?;
        let threshold = MinProbability::parse_percent(&request.min_probability)?;
        let candidates =
            FileDiscovery::new(self.settings.processing.clone()).discover(&request.directory)?;
        let backend = self.load_backend(&labels).await?;

        Ok(PreparedRun {
            labels,
            threshold,
            candidates,
            backend,
        })
    }

    async fn load_backend(
        &self,
        labels: &LabelSet,
    ) -> Result<Box<dyn InferenceBackend>, ValidationError> {
        let loader = Arc::clone(&self.loader);
        let labels = labels.clone();
        let (tx, rx) = oneshot::channel();

        thread::Builder::new()
            .name("clipsift-load".to_string())
            .spawn(move || {
                let _ = tx.send(load_and_prepare(loader.as_ref(), &labels));
            })
            .map_err(|e| ValidationError::BackendUnavailable {
                message: format!("cannot start backend loader: {e}"),
            })?;

        match rx.await {
            Ok(Ok(backend)) => Ok(backend),
            Ok(Err(e)) => Err(ValidationError::BackendUnavailable {
                message: e.to_string(),
            }),
            Err(_) => Err(ValidationError::BackendUnavailable {
                message: "backend loader panicked".to_string(),
            }),
        }
    }

    fn spawn(&mut self, prepared: PreparedRun) -> StartOutcome {
        self.next_run_id += 1;
        let run_id = self.next_run_id;
        let total = prepared.candidates.len();
        let cancel = CancelFlag::new();

        let pipeline = ClassificationPipeline::new(
            prepared.labels,
            prepared.threshold,
            ImageDecoder::new(self.settings.limits.clone()),
        )
        .with_thumbnails(ThumbnailGenerator::new(self.settings.thumbnail.clone()));

        *lock(&self.state) = RunState::Running;
        let _ = self.events.send(RunEvent::RunStarted { run_id, total });

        let (done_tx, done) = oneshot::channel();
        let context = RunContext {
            run_id,
            cancel: cancel.clone(),
            events: self.events.clone(),
            finish: FinishGuard {
                run_id,
                events: self.events.clone(),
                state: Arc::clone(&self.state),
                done: Some(done_tx),
                summary: RunSummary {
                    total,
                    ..RunSummary::default()
                },
            },
        };
        let candidates = prepared.candidates;
        let backend = prepared.backend;

        // On failure the closure is dropped, and the guard inside it reports Finished
        if let Err(e) = thread::Builder::new()
            .name(format!("clipsift-run-{run_id}"))
            .spawn(move || context.execute(pipeline, candidates, backend))
        {
            tracing::error!("Cannot spawn worker for run {}: {}", run_id, e);
        }

        self.active = Some(ActiveRun {
            run_id,
            cancel,
            done,
        });

        StartOutcome::Started { run_id, total }
    }
}

fn load_and_prepare(
    loader: &dyn BackendLoader,
    labels: &LabelSet,
) -> Result<Box<dyn InferenceBackend>, PipelineError> {
    let mut backend = loader.load()?;
    backend.prepare(labels)?;
    Ok(backend)
}

/// Everything the worker of one run needs besides the pipeline itself.
struct RunContext {
    run_id: u64,
    cancel: CancelFlag,
    events: EventSender,
    finish: FinishGuard,
}

impl RunContext {
    fn execute(
        mut self,
        pipeline: ClassificationPipeline,
        candidates: Vec<ImageCandidate>,
        mut backend: Box<dyn InferenceBackend>,
    ) {
        tracing::info!(
            "Run {}: classifying {} images as [{}] with {} (min {})",
            self.run_id,
            candidates.len(),
            pipeline.labels(),
            backend.name(),
            pipeline.threshold()
        );

        let mut run = pipeline.run(candidates, backend.as_mut(), self.cancel.clone());

        while let Some(step) = run.next() {
            match step.outcome {
                Outcome::Accepted(result) => self.send(RunEvent::Result {
                    run_id: self.run_id,
                    result,
                }),
                Outcome::Rejected { .. } => {}
                Outcome::Failed(e) => self.send(RunEvent::ImageFailed {
                    run_id: self.run_id,
                    path: step.path,
                    message: e.to_string(),
                }),
            }
            self.send(RunEvent::Progress {
                run_id: self.run_id,
                progress: step.progress,
            });
            self.finish.summary = run.summary();
        }

        let summary = run.summary();

        tracing::info!(
            "Run {} finished: {}/{} processed, {} accepted, {} failed{}",
            self.run_id,
            summary.processed,
            summary.total,
            summary.accepted,
            summary.failed,
            if summary.cancelled { " (cancelled)" } else { "" }
        );

        self.finish.complete(summary);
    }

    /// Nobody listening any more: stop at the next boundary.
    fn send(&self, event: RunEvent) {
        if self.events.send(event).is_err() && !self.cancel.is_cancelled() {
            tracing::debug!("Event receiver dropped, stopping run {}", self.run_id);
            self.cancel.cancel();
        }
    }
}

/// Marks the run Finished and publishes its summary exactly once.
///
/// If the worker unwinds before completing, `Drop` reports the last
/// summary it saw so listeners are never left waiting.
struct FinishGuard {
    run_id: u64,
    events: EventSender,
    state: Arc<Mutex<RunState>>,
    done: Option<oneshot::Sender<RunSummary>>,
    summary: RunSummary,
}

impl FinishGuard {
    fn complete(mut self, summary: RunSummary) {
        self.summary = summary;
        self.publish();
    }

    fn publish(&mut self) {
        let Some(done) = self.done.take() else {
            return;
        };
        *lock(&self.state) = RunState::Finished;
        let _ = self.events.send(RunEvent::Finished {
            run_id: self.run_id,
            summary: self.summary.clone(),
        });
        let _ = done.send(self.summary.clone());
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        if self.done.is_some() {
            tracing::error!(
                "Run {} worker stopped early after {}/{} images",
                self.run_id,
                self.summary.processed,
                self.summary.total
            );
            self.publish();
        }
    }
}

fn lock(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
