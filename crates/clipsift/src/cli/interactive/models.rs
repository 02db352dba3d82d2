//! Guided model management: check install status and offer a download.

use crate::cli::models::{check_installed, download_model, InstalledModel};
use clipsift_core::Config;
use console::Style;
use dialoguer::Select;

use super::theme::{clipsift_theme, note, success};

/// Show installed model status and offer download options.
pub async fn guided_models(config: &Config) -> anyhow::Result<()> {
    let theme = clipsift_theme();

    loop {
        let status = check_installed(config);
        print_status(&status, config);

        let mut items: Vec<&str> = Vec::new();
        let mut actions: Vec<ModelAction> = Vec::new();

        if !status.can_classify() {
            items.push("Download missing CLIP files");
            actions.push(ModelAction::Download { force: false });
        } else {
            items.push("Re-download CLIP files");
            actions.push(ModelAction::Download { force: true });
        }
        items.push("Show model directory");
        actions.push(ModelAction::ShowPath);
        items.push("Back");
        actions.push(ModelAction::Back);

        let selection = Select::with_theme(&theme)
            .with_prompt("Model management")
            .items(&items)
            .default(0)
            .interact_opt()?;

        match selection.map(|idx| &actions[idx]) {
            Some(ModelAction::Download { force }) => {
                let client = reqwest::Client::new();
                download_model(config, &client, *force).await?;
                eprintln!();
                success("Downloads complete.");
                eprintln!();
            }
            Some(ModelAction::ShowPath) => {
                note(config.model_path().display());
                eprintln!();
            }
            Some(ModelAction::Back) | None => break,
        }
    }

    Ok(())
}

/// Make sure the model is on disk, offering a download when it is not.
///
/// Returns `false` if the user declined or the files are still missing.
pub async fn ensure_model(config: &Config) -> anyhow::Result<bool> {
    if check_installed(config).can_classify() {
        return Ok(true);
    }

    super::theme::warn("The CLIP model is not installed.");
    let install = dialoguer::Confirm::with_theme(&clipsift_theme())
        .with_prompt("Download it now (~600 MB)?")
        .default(true)
        .interact_opt()?;

    if install != Some(true) {
        return Ok(false);
    }

    let client = reqwest::Client::new();
    download_model(config, &client, false).await?;
    Ok(check_installed(config).can_classify())
}

/// Print the current install status of each model file.
fn print_status(status: &InstalledModel, config: &Config) {
    let ok = Style::new().for_stderr().green();
    let missing = Style::new().for_stderr().red();
    let dim = Style::new().for_stderr().dim();

    let check = |installed: bool, label: &str, detail: &str| {
        let mark = if installed {
            ok.apply_to("✓")
        } else {
            missing.apply_to("✗")
        };
        let detail = if installed { detail } else { "not installed" };
        eprintln!("  {} {:<26} {}", mark, label, dim.apply_to(detail));
    };

    eprintln!();
    note(format!("Model: {}", config.model_path().display()));
    eprintln!();

    check(status.vision, "Vision encoder", "vision_model.onnx ~350 MB");
    check(status.text, "Text encoder", "text_model.onnx ~250 MB");
    check(status.tokenizer, "Tokenizer", "tokenizer.json ~2 MB");
    eprintln!();
}

/// Internal action type for the model menu.
enum ModelAction {
    Download { force: bool },
    ShowPath,
    Back,
}
