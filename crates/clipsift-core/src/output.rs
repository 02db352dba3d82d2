//! Output formatting for JSON, JSONL and HTML gallery output.
//!
//! JSON and JSONL go through [`ResultWriter`]; the HTML gallery is rendered
//! in one go once a run has finished.

use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use url::Url;

use crate::types::{ClassificationResult, RunSummary};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
    /// Self-contained HTML page with a thumbnail grid
    Html,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// Whether records can be written as they arrive.
    pub fn is_streaming(self) -> bool {
        self == Self::JsonLines
    }
}

/// A writer that serializes items to JSON or JSONL format.
pub struct ResultWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> ResultWriter<W> {
    /// Create a new result writer.
    ///
    /// `pretty` only affects JSON. HTML is written as a gallery page by
    /// [`ResultWriter::write_all`].
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single record. JSONL writes one line per record.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json | OutputFormat::Html => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, item)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                }
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
            }
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write the results of a finished run.
    ///
    /// JSON writes an array, JSONL one line per result, HTML a gallery page.
    pub fn write_all(
        &mut self,
        results: &[ClassificationResult],
        summary: Option<&RunSummary>,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, results)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, results).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.items_written += results.len();
            }
            OutputFormat::JsonLines => {
                for result in results {
                    self.write(result)?;
                }
            }
            OutputFormat::Html => {
                self.writer
                    .write_all(render_gallery(results, summary).as_bytes())?;
                self.items_written += results.len();
            }
        }
        Ok(())
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Render accepted results as a 3-column HTML gallery.
///
/// Each tile links to its source file; tiles without a thumbnail show the
/// file name instead.
pub fn render_gallery(results: &[ClassificationResult], summary: Option<&RunSummary>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>clipsift results</title>\n<style>\n\
         body { font-family: sans-serif; margin: 1.5em; }\n\
         .grid { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1em; }\n\
         .tile { text-align: center; }\n\
         .tile img { max-width: 100%; }\n\
         .caption { font-size: 0.85em; word-break: break-all; }\n\
         </style>\n</head>\n<body>\n",
    );

    if let Some(summary) = summary {
        let _ = writeln!(
            html,
            "<p>{} of {} images matched{}.</p>",
            summary.accepted,
            summary.total,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
    }

    html.push_str("<div class=\"grid\">\n");
    for result in results {
        let href = file_href(&result.path);
        let preview = match &result.thumbnail {
            Some(data) => format!(
                "<img src=\"data:image/webp;base64,{}\" alt=\"{}\">",
                data,
                escape(&result.file_name)
            ),
            None => escape(&result.file_name),
        };
        let _ = writeln!(
            html,
            "<div class=\"tile\"><a href=\"{}\">{}</a>\
             <div class=\"caption\">{} / {} / {:.4}</div></div>",
            escape(&href),
            preview,
            escape(&result.file_name),
            escape(&result.label),
            result.probability
        );
    }
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// `file://` URL for `path`, with each segment percent-encoded.
fn file_href(path: &Path) -> String {
    std::path::absolute(path)
        .ok()
        .and_then(|absolute| Url::from_file_path(absolute).ok())
        .map(String::from)
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(name: &str, label: &str, probability: f32, rank: usize) -> ClassificationResult {
        ClassificationResult {
            path: PathBuf::from(format!("/photos/{name}")),
            file_name: name.to_string(),
            label: label.to_string(),
            label_index: 0,
            probability,
            rank,
            thumbnail: None,
        }
    }

    #[test]
    fn test_write_json_array() {
        let mut buffer = Vec::new();
        let mut writer = ResultWriter::new(&mut buffer, OutputFormat::Json, false);

        let results = vec![result("a.png", "cat", 0.95, 0), result("b.png", "dog", 0.98, 1)];
        writer.write_all(&results, None).unwrap();
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with('['));
        assert!(output.contains("\"label\":\"cat\""));
        assert!(!output.contains("thumbnail"));
    }

    #[test]
    fn test_write_jsonl_streams_one_line_per_result() {
        let mut buffer = Vec::new();
        let mut writer = ResultWriter::new(&mut buffer, OutputFormat::JsonLines, true);

        writer.write(&result("a.png", "cat", 0.95, 0)).unwrap();
        writer.write(&result("b.png", "dog", 0.98, 1)).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
        let parsed: ClassificationResult = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.rank, 1);
    }

    #[test]
    fn test_html_gallery() {
        let mut with_thumb = result("a.png", "cat", 0.95, 0);
        with_thumb.thumbnail = Some("AAAA".to_string());
        let results = vec![with_thumb, result("b.png", "dog", 0.98, 1)];
        let summary = RunSummary {
            processed: 3,
            total: 3,
            accepted: 2,
            rejected: 1,
            ..RunSummary::default()
        };

        let html = render_gallery(&results, Some(&summary));
        assert!(html.contains("repeat(3, 1fr)"));
        assert!(html.contains("2 of 3 images matched."));
        assert!(html.contains("data:image/webp;base64,AAAA"));
        assert!(html.contains("a.png / cat / 0.9500"));
        assert!(html.contains("b.png / dog / 0.9800"));
        assert!(html.contains("href=\"file:///photos/a.png\""));
    }

    #[cfg(unix)]
    #[test]
    fn test_html_links_percent_encode_file_names() {
        let results = vec![result("cat #1 50%?.png", "cat", 0.9, 0)];
        let html = render_gallery(&results, None);
        assert!(html.contains("href=\"file:///photos/cat%20%231%2050%25%3F.png\""));
        assert!(!html.contains("href=\"file:///photos/cat #1"));
    }

    #[test]
    fn test_html_escapes_labels() {
        let results = vec![result("x.png", "<b>cats & dogs</b>", 0.5, 0)];
        let html = render_gallery(&results, None);
        assert!(html.contains("&lt;b&gt;cats &amp; dogs&lt;/b&gt;"));
        assert!(!html.contains("<b>cats"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("html"), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::parse("csv"), None);
        assert!(OutputFormat::JsonLines.is_streaming());
        assert!(!OutputFormat::Html.is_streaming());
    }
}
