//! Logging setup for the `clipsift` binary.
//!
//! Logs go to stderr through `tracing-subscriber`, either human-readable or
//! as JSON lines. Progress bars and results share stderr, data goes to stdout.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `level` - Default level directive (`info`, `debug`, `warn`, ...).
/// * `json_format` - If true, outputs structured JSON logs; otherwise pretty-printed.
///
/// # Notes
///
/// - Log output goes to stderr (stdout is reserved for data output)
/// - The RUST_LOG environment variable can override the log level
pub fn init(level: &str, json_format: bool) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    if json_format {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging with configuration from Config.
///
/// This variant reads settings from the clipsift configuration file.
pub fn init_from_config(
    config: &clipsift_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = if verbose_override {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

/// Filter for `level`, keeping ONNX Runtime's own chatter at warn.
fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("{level},ort=warn")).unwrap_or_else(|_| EnvFilter::new("info"))
}
