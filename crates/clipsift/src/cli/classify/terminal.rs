//! Terminal presenter: progress bar, one line per match, summary table.

use std::io::{self, Write};
use std::path::Path;

use clipsift_core::{
    ClassificationResult, Gallery, Presenter, ProgressSnapshot, ResultWriter, RunSummary,
    ValidationError,
};
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Renders run events on stderr and keeps the [`Gallery`] for later use.
pub struct TerminalPresenter {
    gallery: Gallery,
    show_progress: bool,
    bar: ProgressBar,
    stream: Option<ResultWriter<Box<dyn Write>>>,
    stream_error: Option<io::Error>,
}

impl TerminalPresenter {
    pub fn new(show_progress: bool) -> Self {
        Self {
            gallery: Gallery::default(),
            show_progress,
            bar: ProgressBar::hidden(),
            stream: None,
            stream_error: None,
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// Write each match to `writer` as it arrives.
    pub fn set_stream(&mut self, writer: ResultWriter<Box<dyn Write>>) {
        self.stream = Some(writer);
    }

    /// Flush and drop the stream, reporting the first write error seen.
    pub fn finish_stream(&mut self) -> io::Result<()> {
        if let Some(error) = self.stream_error.take() {
            self.stream = None;
            return Err(error);
        }
        match self.stream.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }

    /// Show that a stop was requested; the current image still finishes.
    pub fn cancelling(&mut self) {
        self.gallery.mark_cancelling();
        self.bar
            .set_message("stopping after the current image (Ctrl-C again is ignored)");
    }

    fn is_current(&self, run_id: u64) -> bool {
        self.gallery.run_id() == Some(run_id)
    }
}

impl Presenter for TerminalPresenter {
    fn on_run_started(&mut self, run_id: u64, total: usize) {
        self.gallery.on_run_started(run_id, total);
        self.bar = if self.show_progress {
            create_progress_bar(total as u64)
        } else {
            ProgressBar::hidden()
        };
    }

    fn on_progress(&mut self, run_id: u64, progress: ProgressSnapshot) {
        if self.is_current(run_id) {
            self.bar.set_position(progress.processed as u64);
        }
        self.gallery.on_progress(run_id, progress);
    }

    fn on_result(&mut self, run_id: u64, result: ClassificationResult) {
        if !self.is_current(run_id) {
            return;
        }

        self.bar.println(format_match(&result));

        if let Some(writer) = &mut self.stream {
            if let Err(e) = writer.write(&result) {
                tracing::error!("Failed to write result: {e}");
                self.stream_error.get_or_insert(e);
                self.stream = None;
            }
        }

        self.gallery.on_result(run_id, result);
    }

    fn on_image_failed(&mut self, run_id: u64, path: &Path, message: &str) {
        if self.is_current(run_id) {
            tracing::debug!("Unreadable image {:?}: {}", path, message);
        }
        self.gallery.on_image_failed(run_id, path, message);
    }

    fn on_finished(&mut self, run_id: u64, summary: &RunSummary) {
        self.gallery.on_finished(run_id, summary);
        if self.is_current(run_id) {
            self.bar.finish_and_clear();
            if self.show_progress {
                print_summary(summary);
            }
        }
    }

    fn on_validation_error(&mut self, error: &ValidationError) {
        self.gallery.on_validation_error(error);
    }
}

/// One match, as shown above the progress bar.
fn format_match(result: &ClassificationResult) -> String {
    let ok = Style::new().for_stderr().green();
    let bold = Style::new().for_stderr().bold();
    format!(
        "  {} {:<40} {} {:.4}",
        ok.apply_to("✓"),
        result.file_name,
        bold.apply_to(&result.label),
        result.probability
    )
}

/// Create a progress bar for a run.
fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

/// Spinner shown while the model loads.
pub fn loading_spinner(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_message("Loading CLIP model...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a formatted summary table after a run.
fn print_summary(summary: &RunSummary) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Matched:      {:>8}", summary.accepted);
    eprintln!("    Below min:    {:>8}", summary.rejected);
    if summary.failed > 0 {
        eprintln!("    Unreadable:   {:>8}", summary.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!(
        "    Processed:    {:>8} of {}",
        summary.processed, summary.total
    );
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", summary.rate());
    if summary.cancelled {
        eprintln!("    Cancelled before the end of the folder");
    }
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipsift_core::OutputFormat;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Shared in-memory sink so the test can read what the presenter wrote.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn result(name: &str, rank: usize) -> ClassificationResult {
        ClassificationResult {
            path: PathBuf::from(name),
            file_name: name.to_string(),
            label: "dog".to_string(),
            label_index: 1,
            probability: 0.98,
            rank,
            thumbnail: None,
        }
    }

    #[test]
    fn test_streams_current_run_results_only() {
        let buffer = SharedBuffer::default();
        let mut presenter = TerminalPresenter::new(false);

        presenter.on_run_started(3, 2);
        let sink: Box<dyn Write> = Box::new(buffer.clone());
        presenter.set_stream(ResultWriter::new(sink, OutputFormat::JsonLines, false));
        presenter.on_result(2, result("stale.png", 0));
        presenter.on_result(3, result("fresh.png", 0));
        presenter.on_progress(3, ProgressSnapshot { processed: 2, total: 2 });
        presenter.on_finished(
            3,
            &RunSummary {
                processed: 2,
                total: 2,
                accepted: 1,
                rejected: 1,
                ..RunSummary::default()
            },
        );
        presenter.finish_stream().unwrap();

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.contains("fresh.png"));
        assert_eq!(presenter.gallery().results().len(), 1);
        assert_eq!(presenter.gallery().progress().processed, 2);
    }

    #[test]
    fn test_format_match_shows_probability_to_four_places() {
        let line = console::strip_ansi_codes(&format_match(&result("a.png", 0))).into_owned();
        assert!(line.contains("a.png"));
        assert!(line.contains("dog 0.9800"));
    }
}
