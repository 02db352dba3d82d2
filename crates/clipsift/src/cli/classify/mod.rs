//! The `clipsift classify` command.
//!
//! A [`ClassifySession`] owns one [`RunController`] and drains its event
//! channel on the calling task, so everything the user sees is written from
//! one place. Ctrl-C while the model loads abandons the request; Ctrl-C
//! during a run requests cooperative cancellation.

mod terminal;
pub mod types;

pub use types::OutputFormat;

use std::fs::File;
use std::future::Future;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use clipsift_core::{
    BackendLoader, ClipLoader, Config, EventReceiver, Gallery, OutputFormat as CoreOutputFormat,
    ResultWriter, RunController, RunEvent, RunRequest, RunSettings, RunSummary, StartOutcome,
};

use terminal::{loading_spinner, TerminalPresenter};

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Folder of images to classify (not searched recursively)
    #[arg(required = true)]
    pub dir: PathBuf,

    /// Comma-separated labels, e.g. "cat, dog, person riding a bike" [default: from config]
    #[arg(short, long)]
    pub labels: Option<String>,

    /// Minimum probability of the best label, in percent (0-100) [default: from config]
    #[arg(short, long, allow_hyphen_values = true)]
    pub min_probability: Option<String>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format [default: from config]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Embed base64 WebP thumbnails in the output (always on for html)
    #[arg(long)]
    pub thumbnails: bool,

    /// Thumbnail size in pixels (longest edge)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub thumbnail_size: Option<u32>,
}

/// Where and how matches are written.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub format: CoreOutputFormat,
    /// `None` writes to stdout
    pub path: Option<PathBuf>,
    pub pretty: bool,
}

impl OutputTarget {
    fn open(&self) -> io::Result<Box<dyn Write>> {
        Ok(match &self.path {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::stdout().lock()),
        })
    }
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let format = match args.format {
        Some(format) => format.into(),
        None => CoreOutputFormat::parse(&config.output.format).unwrap_or(CoreOutputFormat::Json),
    };
    if args.thumbnails || format == CoreOutputFormat::Html {
        config.thumbnail.enabled = true;
    }
    if let Some(size) = args.thumbnail_size {
        config.thumbnail.size = size;
    }

    let request = RunRequest::new(
        args.labels
            .unwrap_or_else(|| config.classify.labels.clone()),
        args.min_probability
            .unwrap_or_else(|| config.classify.min_probability.to_string()),
        args.dir,
    );
    let target = OutputTarget {
        format,
        path: args.output,
        pretty: config.output.pretty,
    };

    let mut session = ClassifySession::new(&config, true);
    session.run(request, Some(&target)).await?;

    if let Some(path) = &target.path {
        tracing::info!("Output written to {:?}", path);
    }
    Ok(())
}

/// A controller plus the presenter that renders its events.
///
/// Reusing one session for several runs keeps run ids increasing; each new
/// run clears the previous results.
pub struct ClassifySession {
    controller: RunController,
    events: EventReceiver,
    presenter: TerminalPresenter,
    show_progress: bool,
}

impl ClassifySession {
    /// Session backed by the configured CLIP model.
    pub fn new(config: &Config, show_progress: bool) -> Self {
        Self::with_loader(
            Arc::new(ClipLoader::from_config(config)),
            RunSettings::from_config(config),
            show_progress,
        )
    }

    pub fn with_loader(
        loader: Arc<dyn BackendLoader>,
        settings: RunSettings,
        show_progress: bool,
    ) -> Self {
        let (controller, events) = RunController::new(loader, settings);
        Self {
            controller,
            events,
            presenter: TerminalPresenter::new(show_progress),
            show_progress,
        }
    }

    /// Results and status of the latest run.
    pub fn gallery(&self) -> &Gallery {
        self.presenter.gallery()
    }

    /// Run one classification to the end, or until Ctrl-C.
    ///
    /// Rejected requests come back as a [`clipsift_core::ValidationError`]
    /// inside the `anyhow::Error`.
    pub async fn run(
        &mut self,
        request: RunRequest,
        output: Option<&OutputTarget>,
    ) -> anyhow::Result<RunSummary> {
        let run_id = self.start(request, interrupted()).await?;

        if let Some(target) = output.filter(|t| t.format.is_streaming()) {
            match target.open() {
                Ok(sink) => self
                    .presenter
                    .set_stream(ResultWriter::new(sink, target.format, target.pretty)),
                Err(e) => {
                    self.controller.cancel();
                    self.drive(run_id).await;
                    return Err(anyhow::anyhow!("Cannot open output: {e}"));
                }
            }
        }

        let summary = self.drive(run_id).await;
        self.presenter.finish_stream()?;

        if let Some(target) = output.filter(|t| !t.format.is_streaming()) {
            let gallery = self.presenter.gallery();
            let mut writer = ResultWriter::new(target.open()?, target.format, target.pretty);
            writer.write_all(gallery.results(), gallery.summary())?;
            writer.flush()?;
        }

        summary.ok_or_else(|| anyhow::anyhow!("Run {run_id} ended without a summary"))
    }

    /// Validate and start a run, giving up if `interrupt` completes first.
    async fn start(
        &mut self,
        request: RunRequest,
        interrupt: impl Future<Output = ()>,
    ) -> anyhow::Result<u64> {
        let spinner = loading_spinner(self.show_progress);
        let started = tokio::select! {
            started = self.controller.start(request) => started,
            () = interrupt => {
                spinner.finish_and_clear();
                anyhow::bail!("Interrupted while loading the model");
            }
        };
        spinner.finish_and_clear();

        match started {
            Ok(StartOutcome::Started { run_id, total }) => {
                tracing::debug!("Run {} started with {} candidate(s)", run_id, total);
                Ok(run_id)
            }
            Ok(StartOutcome::AlreadyRunning) => anyhow::bail!("A run is already in progress"),
            Err(error) => {
                self.drain_ready();
                Err(error.into())
            }
        }
    }

    /// Apply events until the run's `Finished` arrives, cancelling on Ctrl-C.
    async fn drive(&mut self, run_id: u64) -> Option<RunSummary> {
        let mut cancel_requested = false;

        loop {
            tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    let done = matches!(&event, RunEvent::Finished { run_id: id, .. } if *id == run_id);
                    event.dispatch(&mut self.presenter);
                    if done {
                        break;
                    }
                }
                signal = tokio::signal::ctrl_c(), if !cancel_requested => {
                    cancel_requested = true;
                    match signal {
                        Ok(()) => {
                            if self.controller.cancel() {
                                self.presenter.cancelling();
                            }
                        }
                        Err(e) => tracing::warn!("Cannot listen for Ctrl-C: {e}"),
                    }
                }
            }
        }

        self.controller.wait().await
    }

    /// Apply whatever is already queued, without waiting.
    fn drain_ready(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            event.dispatch(&mut self.presenter);
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the signal cannot be watched.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
