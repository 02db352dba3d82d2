//! Guided classification flow.
//!
//! Labels → minimum probability → folder → run → pick matches to open.
//! Answers are remembered as defaults for the next run in the same session.

use std::path::PathBuf;

use clipsift_core::pipeline::FileDiscovery;
use clipsift_core::{ClassificationResult, Config, LabelSet, MinProbability, RunRequest};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};

use crate::cli::classify::ClassifySession;
use crate::cli::open::open_in_viewer;

use super::theme::{clipsift_theme, note, warn};

/// What to do after browsing the matches of a run.
enum NextStep {
    RunAgain,
    Back,
}

/// Guided mode state that outlives a single run.
pub struct GuidedSession {
    config: Config,
    session: ClassifySession,
    labels: String,
    min_probability: String,
    folder: Option<String>,
}

impl GuidedSession {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            session: ClassifySession::new(config, true),
            labels: config.classify.labels.clone(),
            min_probability: config.classify.min_probability.to_string(),
            folder: None,
        }
    }

    /// Prompt, run, and browse until the user goes back to the menu.
    pub async fn guided_classify(&mut self) -> anyhow::Result<()> {
        let theme = clipsift_theme();

        loop {
            if !super::models::ensure_model(&self.config).await? {
                return Ok(());
            }

            let Some(request) = self.prompt_request(&theme)? else {
                return Ok(());
            };

            eprintln!();
            note("Press Ctrl-C to stop after the current image.");
            if let Err(e) = self.session.run(request, None).await {
                warn(format!("Run not started: {e}"));
                eprintln!();
                continue;
            }
            eprintln!();

            match self.browse_results(&theme)? {
                NextStep::RunAgain => continue,
                NextStep::Back => return Ok(()),
            }
        }
    }

    /// Ask for labels, threshold and folder. `None` on Ctrl-C.
    fn prompt_request(&mut self, theme: &ColorfulTheme) -> anyhow::Result<Option<RunRequest>> {
        let Some(labels) = super::handle_interrupt(
            Input::<String>::with_theme(theme)
                .with_prompt("Labels (comma separated)")
                .default(self.labels.clone())
                .validate_with(|input: &String| -> Result<(), String> {
                    LabelSet::parse(input).map(|_| ()).map_err(|e| e.to_string())
                })
                .interact_text(),
        )?
        else {
            return Ok(None);
        };

        let Some(min_probability) = super::handle_interrupt(
            Input::<String>::with_theme(theme)
                .with_prompt("Minimum probability (%)")
                .default(self.min_probability.clone())
                .validate_with(|input: &String| -> Result<(), String> {
                    MinProbability::parse_percent(input)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text(),
        )?
        else {
            return Ok(None);
        };

        let mut folder_input = Input::<String>::with_theme(theme)
            .with_prompt("Folder")
            .validate_with(|input: &String| -> Result<(), String> {
                resolve_folder(input).map(|_| ())
            });
        if let Some(previous) = &self.folder {
            folder_input = folder_input.default(previous.clone());
        }
        let Some(folder) = super::handle_interrupt(folder_input.interact_text())? else {
            return Ok(None);
        };
        let directory = match resolve_folder(&folder) {
            Ok(directory) => directory,
            Err(message) => {
                warn(message);
                return Ok(None);
            }
        };

        if let Ok(found) =
            FileDiscovery::new(self.config.processing.clone()).discover(&directory)
        {
            let total_size = FileDiscovery::total_size(&found);
            note(format!(
                "Found {} image(s) ({:.1} MB)",
                found.len(),
                total_size as f64 / 1_000_000.0
            ));
        }

        self.labels = labels.clone();
        self.min_probability = min_probability.clone();
        self.folder = Some(folder);

        Ok(Some(RunRequest::new(labels, min_probability, directory)))
    }

    /// Let the user open matches until they choose to run again or leave.
    fn browse_results(&self, theme: &ColorfulTheme) -> anyhow::Result<NextStep> {
        loop {
            let gallery = self.session.gallery();
            let results = gallery.results();

            note(gallery.status_line());
            if results.is_empty() {
                note("No images matched.");
            }

            let mut items: Vec<String> = results.iter().map(result_item).collect();
            items.push("Run again".to_string());
            items.push("Back to main menu".to_string());

            let choice = Select::with_theme(theme)
                .with_prompt("Open a match")
                .items(&items)
                .default(0)
                .max_length(15)
                .interact_opt()?;

            match choice {
                Some(i) if i < results.len() => {
                    if let Err(e) = open_in_viewer(&results[i].path) {
                        warn(e);
                    }
                }
                Some(i) if i == results.len() => return Ok(NextStep::RunAgain),
                _ => return Ok(NextStep::Back),
            }
        }
    }
}

/// One picker row: file, label and probability.
fn result_item(result: &ClassificationResult) -> String {
    format!(
        "{:<40} {:<20} {:.4}",
        result.file_name, result.label, result.probability
    )
}

/// Expand `~` and check the folder exists.
fn resolve_folder(raw: &str) -> Result<PathBuf, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Enter a folder path".to_string());
    }
    let path = PathBuf::from(shellexpand::tilde(trimmed).into_owned());
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("Not a folder: {}", path.display()))
    }
}
