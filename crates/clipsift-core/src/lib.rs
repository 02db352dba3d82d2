//! Clipsift Core - zero-shot CLIP classification of image folders.
//!
//! Given a folder, a comma-separated list of labels and a minimum
//! probability, clipsift asks a CLIP model which label fits each image best
//! and keeps the images whose best label is confident enough.
//!
//! # Architecture
//!
//! ```text
//! Discover → Decode → CLIP (image vs. labels) → softmax → argmax → threshold
//! ```
//!
//! A [`RunController`] validates the request, loads the backend and runs
//! the [`ClassificationPipeline`] on a dedicated worker thread. Progress
//! and results come back in order over a single event channel.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use clipsift_core::{ClipLoader, Config, RunController, RunEvent, RunRequest, RunSettings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let loader = Arc::new(ClipLoader::from_config(&config));
//!     let (mut controller, mut events) =
//!         RunController::new(loader, RunSettings::from_config(&config));
//!
//!     controller
//!         .start(RunRequest::new("cat, dog", "90", "./photos"))
//!         .await?;
//!     while let Some(event) = events.recv().await {
//!         if let RunEvent::Result { result, .. } = &event {
//!             println!("{} → {} ({:.4})", result.file_name, result.label, result.probability);
//!         }
//!         if event.is_terminal() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod gallery;
pub mod labels;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod run;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{BackendLoader, ClipBackend, ClipLoader, InferenceBackend};
pub use config::{Config, Device};
pub use error::{
    ClipsiftError, ConfigError, PipelineError, PipelineResult, Result, ValidationError,
};
pub use gallery::{Gallery, Presenter};
pub use labels::LabelSet;
pub use output::{OutputFormat, ResultWriter};
pub use pipeline::{ClassificationPipeline, FileDiscovery, ImageCandidate, MinProbability};
pub use run::{
    CancelFlag, EventReceiver, RunController, RunEvent, RunRequest, RunSettings, StartOutcome,
};
pub use types::{ClassificationResult, ProgressSnapshot, RunState, RunSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
