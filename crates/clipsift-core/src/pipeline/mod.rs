//! Image classification pipeline components.
//!
//! - **discovery**: Find candidate images directly inside a directory
//! - **decode**: Load and decode images with size limits
//! - **threshold**: Parse the minimum probability
//! - **thumbnail**: Generate WebP thumbnails for accepted results
//! - **classify**: The per-candidate classification loop

pub mod classify;
pub mod decode;
pub mod discovery;
pub mod threshold;
pub mod thumbnail;

pub use classify::{ClassificationPipeline, Outcome, PipelineRun, Step};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{FileDiscovery, ImageCandidate};
pub use threshold::MinProbability;
pub use thumbnail::ThumbnailGenerator;
