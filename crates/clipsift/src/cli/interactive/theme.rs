//! Dialoguer theme and banner for clipsift's guided mode.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// Returns the `ColorfulTheme` used by every prompt in guided mode.
///
/// - Prompt prefix: cyan `?`
/// - Active item indicator: cyan `▸`
/// - Success prefix: green `✓`
/// - Error prefix: red `✗`
pub fn clipsift_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().cyan(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        active_item_prefix: style("▸".to_string()).for_stderr().cyan(),
        active_item_style: Style::new().for_stderr().cyan(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Prints the clipsift banner to stderr.
pub fn print_banner() {
    let version_line = format!("clipsift v{}", clipsift_core::VERSION);
    let tagline = "sort your photos by whatever you can describe";

    let inner_width = tagline.len() + 4;

    let top = format!("  ╔{:═<width$}╗", "", width = inner_width);
    let mid1 = format!("  ║{:^width$}║", version_line, width = inner_width);
    let mid2 = format!("  ║{:^width$}║", tagline, width = inner_width);
    let bot = format!("  ╚{:═<width$}╝", "", width = inner_width);

    let cyan = Style::new().for_stderr().cyan();

    eprintln!();
    eprintln!("{}", cyan.apply_to(&top));
    eprintln!("{}", cyan.apply_to(&mid1));
    eprintln!("{}", cyan.apply_to(&mid2));
    eprintln!("{}", cyan.apply_to(&bot));
    eprintln!();
}

/// Yellow line on stderr for recoverable problems.
pub fn warn(message: impl std::fmt::Display) {
    let yellow = Style::new().for_stderr().yellow();
    eprintln!("  {}", yellow.apply_to(message));
}

/// Dimmed line on stderr for context.
pub fn note(message: impl std::fmt::Display) {
    let dim = Style::new().for_stderr().dim();
    eprintln!("  {}", dim.apply_to(message));
}

/// Green line on stderr for completed steps.
pub fn success(message: impl std::fmt::Display) {
    let green = Style::new().for_stderr().green();
    eprintln!("  {}", green.apply_to(message));
}
