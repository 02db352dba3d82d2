//! CLI enum types for the classify command.

use clap::ValueEnum;
use clipsift_core::OutputFormat as CoreOutputFormat;

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON array of matches, written when the run ends
    Json,
    /// One JSON object per match, written as matches are found
    Jsonl,
    /// HTML gallery page with thumbnails, written when the run ends
    Html,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Html => write!(f, "html"),
        }
    }
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
            OutputFormat::Html => CoreOutputFormat::Html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_through_core_parse() {
        for format in [OutputFormat::Json, OutputFormat::Jsonl, OutputFormat::Html] {
            assert_eq!(
                CoreOutputFormat::parse(&format.to_string()),
                Some(format.into())
            );
        }
    }
}
