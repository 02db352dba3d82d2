//! Interactive CLI mode: guided experience for bare `clipsift` invocation.
//!
//! When `clipsift` is invoked with no subcommand on a TTY, this module asks
//! for labels, a minimum probability and a folder, runs the classification
//! through the same session as `clipsift classify`, and lets the user open
//! matches in the system viewer.

pub mod classify;
pub mod models;
pub mod theme;

use clipsift_core::Config;
use console::Style;
use dialoguer::Select;

/// Convert a dialoguer result into `Ok(Some(value))` on success, `Ok(None)` on
/// interrupt (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
///
/// Use this to wrap `interact_text()` / `interact()` calls that lack an `_opt`
/// variant, so interrupts exit the current flow cleanly instead of panicking.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Main menu options presented to the user.
const MENU_ITEMS: &[&str] = &[
    "Classify a folder",
    "Download / manage models",
    "Show settings",
    "Exit",
];

/// Entry point for interactive mode.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    theme::print_banner();

    let theme = theme::clipsift_theme();
    let mut session = classify::GuidedSession::new(config);

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(MENU_ITEMS)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => session.guided_classify().await?,
            Some(1) => models::guided_models(config).await?,
            Some(2) => show_config(config),
            _ => break, // Exit or Ctrl+C / Esc
        }
    }

    Ok(())
}

/// Summary of the settings guided mode runs with.
fn show_config(config: &Config) {
    let dim = Style::new().for_stderr().dim();
    let cyan = Style::new().for_stderr().cyan();
    let label = Style::new().for_stderr().bold();

    eprintln!();
    eprintln!("  {}", cyan.apply_to("Current configuration:"));
    eprintln!();

    let config_path = Config::default_path();
    let path_note = if config_path.exists() {
        "(exists)"
    } else {
        "(using defaults)"
    };

    eprintln!(
        "    {:<20} {} {}",
        label.apply_to("Config file:"),
        config_path.display(),
        dim.apply_to(path_note)
    );
    eprintln!(
        "    {:<20} {}",
        label.apply_to("Model:"),
        config.model_path().display()
    );
    eprintln!(
        "    {:<20} {:?}",
        label.apply_to("Device:"),
        config.model.device
    );
    eprintln!(
        "    {:<20} {}",
        label.apply_to("Default labels:"),
        config.classify.labels
    );
    eprintln!(
        "    {:<20} {}%",
        label.apply_to("Default minimum:"),
        config.classify.min_probability
    );
    eprintln!(
        "    {:<20} {}",
        label.apply_to("Formats:"),
        config.processing.supported_formats.join(", ")
    );
    eprintln!(
        "    {:<20} {}",
        label.apply_to("Log level:"),
        config.logging.level
    );
    eprintln!();
    eprintln!(
        "  {}",
        dim.apply_to("Edit the config file or run `clipsift config init` to change these.")
    );
    eprintln!();
}
