//! Per-candidate classification loop.
//!
//! [`ClassificationPipeline::run`] returns a lazy iterator: each call to
//! `next()` checks the cancellation flag, decodes one candidate, asks the
//! backend for a probability vector and yields a [`Step`]. Decode and
//! inference failures become [`Outcome::Failed`] steps; they never end the run.

use std::path::PathBuf;
use std::time::Instant;

use crate::backend::InferenceBackend;
use crate::error::PipelineError;
use crate::labels::LabelSet;
use crate::math::argmax;
use crate::run::CancelFlag;
use crate::types::{ClassificationResult, ProgressSnapshot, RunSummary};

use super::decode::ImageDecoder;
use super::discovery::ImageCandidate;
use super::threshold::MinProbability;
use super::thumbnail::ThumbnailGenerator;

/// What happened to one candidate.
#[derive(Debug)]
pub enum Outcome {
    /// Top label cleared the threshold
    Accepted(ClassificationResult),
    /// Classified, but the top label fell short of the threshold
    Rejected { label: String, probability: f32 },
    /// Could not be decoded or classified
    Failed(PipelineError),
}

/// One visited candidate and the progress after it.
#[derive(Debug)]
pub struct Step {
    pub path: PathBuf,
    pub outcome: Outcome,
    pub progress: ProgressSnapshot,
}

/// Classifies candidates against a label set and a minimum probability.
pub struct ClassificationPipeline {
    labels: LabelSet,
    threshold: MinProbability,
    decoder: ImageDecoder,
    thumbnails: Option<ThumbnailGenerator>,
}

impl ClassificationPipeline {
    pub fn new(labels: LabelSet, threshold: MinProbability, decoder: ImageDecoder) -> Self {
        Self {
            labels,
            threshold,
            decoder,
            thumbnails: None,
        }
    }

    /// Attach base64 thumbnails to accepted results.
    pub fn with_thumbnails(mut self, generator: ThumbnailGenerator) -> Self {
        self.thumbnails = generator.is_enabled().then_some(generator);
        self
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn threshold(&self) -> MinProbability {
        self.threshold
    }

    /// Start a pass over `candidates` in the order given.
    pub fn run<'a>(
        &'a self,
        candidates: Vec<ImageCandidate>,
        backend: &'a mut dyn InferenceBackend,
        cancel: CancelFlag,
    ) -> PipelineRun<'a> {
        PipelineRun {
            pipeline: self,
            progress: ProgressSnapshot::start(candidates.len()),
            candidates: candidates.into_iter(),
            backend,
            cancel,
            accepted: 0,
            rejected: 0,
            failed: 0,
            cancelled: false,
            done: false,
            started: Instant::now(),
        }
    }

    fn classify(
        &self,
        candidate: &ImageCandidate,
        backend: &mut dyn InferenceBackend,
        rank: usize,
    ) -> Outcome {
        let path = &candidate.path;

        let decoded = match self.decoder.decode(path) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                return Outcome::Failed(e);
            }
        };

        let probabilities = match backend.classify(&decoded.image, &self.labels, path) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Classification failed for {:?}: {}", path, e);
                return Outcome::Failed(e);
            }
        };

        if probabilities.len() != self.labels.len() {
            return Outcome::Failed(PipelineError::Inference {
                path: path.clone(),
                message: format!(
                    "backend returned {} probabilities for {} labels",
                    probabilities.len(),
                    self.labels.len()
                ),
            });
        }

        let Some((label_index, probability)) = argmax(&probabilities) else {
            return Outcome::Failed(PipelineError::Inference {
                path: path.clone(),
                message: "backend returned no usable probability".to_string(),
            });
        };
        let label = self.labels[label_index].to_string();

        tracing::debug!(
            "{:?}: {} ({:.4}) threshold {}",
            path,
            label,
            probability,
            self.threshold
        );

        if !self.threshold.accepts(probability) {
            return Outcome::Rejected { label, probability };
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Outcome::Accepted(ClassificationResult {
            path: path.clone(),
            file_name,
            label,
            label_index,
            probability,
            rank,
            thumbnail: self
                .thumbnails
                .as_ref()
                .and_then(|t| t.generate(&decoded.image)),
        })
    }
}

/// A pass over one candidate list. Yields one [`Step`] per visited candidate.
pub struct PipelineRun<'a> {
    pipeline: &'a ClassificationPipeline,
    candidates: std::vec::IntoIter<ImageCandidate>,
    backend: &'a mut dyn InferenceBackend,
    cancel: CancelFlag,
    progress: ProgressSnapshot,
    accepted: usize,
    rejected: usize,
    failed: usize,
    cancelled: bool,
    done: bool,
    started: Instant,
}

impl PipelineRun<'_> {
    /// Progress so far.
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress
    }

    /// Counts so far. Final once the iterator has returned `None`.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            processed: self.progress.processed,
            total: self.progress.total,
            accepted: self.accepted,
            rejected: self.rejected,
            failed: self.failed,
            cancelled: self.cancelled,
            elapsed: self.started.elapsed(),
        }
    }
}

impl Iterator for PipelineRun<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.done {
            return None;
        }

        if self.cancel.is_cancelled() {
            tracing::info!(
                "Run cancelled after {}/{} images",
                self.progress.processed,
                self.progress.total
            );
            self.cancelled = true;
            self.done = true;
            return None;
        }

        let Some(candidate) = self.candidates.next() else {
            self.done = true;
            return None;
        };

        let outcome = self
            .pipeline
            .classify(&candidate, &mut *self.backend, self.accepted);

        match &outcome {
            Outcome::Accepted(_) => self.accepted += 1,
            Outcome::Rejected { .. } => self.rejected += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
        self.progress.processed += 1;

        Some(Step {
            path: candidate.path,
            outcome,
            progress: self.progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LimitsConfig, ThumbnailConfig};
    use crate::testing::{candidates_in, write_solid_png, ColourBackend, FixedBackend};

    fn pipeline(labels: &str, percent: &str) -> ClassificationPipeline {
        ClassificationPipeline::new(
            LabelSet::parse(labels).unwrap(),
            MinProbability::parse_percent(percent).unwrap(),
            ImageDecoder::new(LimitsConfig::default()),
        )
    }

    fn accepted(steps: &[Step]) -> Vec<&ClassificationResult> {
        steps
            .iter()
            .filter_map(|s| match &s.outcome {
                Outcome::Accepted(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_cat_dog() {
        let dir = tempfile::tempdir().unwrap();
        write_solid_png(&dir.path().join("image1.png"), [255, 0, 0]);
        write_solid_png(&dir.path().join("image2.png"), [0, 255, 0]);
        write_solid_png(&dir.path().join("image3.png"), [0, 0, 255]);

        // Fix the order so the expected result sequence is deterministic
        let mut candidates = candidates_in(dir.path());
        candidates.sort_by(|a, b| a.path.cmp(&b.path));

        let pipeline = pipeline("cat, dog", "90");
        let mut backend = ColourBackend;
        let mut run = pipeline.run(candidates, &mut backend, CancelFlag::new());
        let steps: Vec<Step> = run.by_ref().collect();

        let results = accepted(&steps);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].file_name, "image1.png");
        assert_eq!(results[0].label, "cat");
        assert!((results[0].probability - 0.95).abs() < 1e-6);
        assert_eq!(results[0].rank, 0);
        assert_eq!(results[1].file_name, "image3.png");
        assert_eq!(results[1].label, "dog");
        assert!((results[1].probability - 0.98).abs() < 1e-6);
        assert_eq!(results[1].rank, 1);

        assert!(matches!(steps[1].outcome, Outcome::Rejected { .. }));
        assert_eq!(steps.last().unwrap().progress, ProgressSnapshot { processed: 3, total: 3 });

        let summary = run.summary();
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 1);
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_tie_goes_to_first_label() {
        let dir = tempfile::tempdir().unwrap();
        write_solid_png(&dir.path().join("tie.png"), [10, 10, 10]);

        let pipeline = pipeline("a, b", "50");
        let mut backend = FixedBackend(vec![0.5, 0.5]);
        let steps: Vec<Step> = pipeline
            .run(candidates_in(dir.path()), &mut backend, CancelFlag::new())
            .collect();

        let results = accepted(&steps);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "a");
        assert_eq!(results[0].label_index, 0);
    }

    #[test]
    fn test_decode_failure_does_not_stop_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_broken.png"), b"definitely not a png").unwrap();
        write_solid_png(&dir.path().join("b_red.png"), [255, 0, 0]);

        let mut candidates = candidates_in(dir.path());
        candidates.sort_by(|a, b| a.path.cmp(&b.path));

        let pipeline = pipeline("cat, dog", "90");
        let mut backend = ColourBackend;
        let mut run = pipeline.run(candidates, &mut backend, CancelFlag::new());
        let steps: Vec<Step> = run.by_ref().collect();

        assert_eq!(steps.len(), 2);
        match &steps[0].outcome {
            Outcome::Failed(e) => assert!(e.is_decode_failure()),
            other => panic!("expected decode failure, got {other:?}"),
        }
        assert_eq!(steps[0].progress.processed, 1);
        assert!(matches!(steps[1].outcome, Outcome::Accepted(_)));

        let summary = run.summary();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.processed, 2);
    }

    #[test]
    fn test_cancel_after_k_candidates() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            write_solid_png(&dir.path().join(format!("{i}.png")), [255, 0, 0]);
        }

        let pipeline = pipeline("cat, dog", "0");
        let mut backend = ColourBackend;
        let cancel = CancelFlag::new();
        let mut run = pipeline.run(candidates_in(dir.path()), &mut backend, cancel.clone());

        assert!(run.next().is_some());
        assert!(run.next().is_some());
        cancel.cancel();
        assert!(run.next().is_none());
        assert!(run.next().is_none());

        let summary = run.summary();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.total, 5);
        assert!(summary.cancelled);
    }

    #[test]
    fn test_empty_candidate_list_finishes_immediately() {
        let pipeline = pipeline("cat", "50");
        let mut backend = ColourBackend;
        let mut run = pipeline.run(Vec::new(), &mut backend, CancelFlag::new());

        assert!(run.next().is_none());
        let summary = run.summary();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.total, 0);
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_wrong_length_probability_vector_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_solid_png(&dir.path().join("x.png"), [1, 2, 3]);

        let pipeline = pipeline("a, b, c", "0");
        let mut backend = FixedBackend(vec![1.0]);
        let steps: Vec<Step> = pipeline
            .run(candidates_in(dir.path()), &mut backend, CancelFlag::new())
            .collect();

        assert!(matches!(
            steps[0].outcome,
            Outcome::Failed(PipelineError::Inference { .. })
        ));
    }

    #[test]
    fn test_thumbnails_attached_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        write_solid_png(&dir.path().join("red.png"), [255, 0, 0]);

        let pipeline = pipeline("cat, dog", "90").with_thumbnails(ThumbnailGenerator::new(
            ThumbnailConfig {
                enabled: true,
                size: 16,
            },
        ));
        let mut backend = ColourBackend;
        let steps: Vec<Step> = pipeline
            .run(candidates_in(dir.path()), &mut backend, CancelFlag::new())
            .collect();

        let results = accepted(&steps);
        assert!(results[0].thumbnail.as_deref().is_some_and(|t| !t.is_empty()));
    }
}
