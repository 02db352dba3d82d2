//! Image discovery in a single directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::ValidationError;

/// Lists the supported images directly inside a directory.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// A file picked up by discovery. Not yet known to be a decodable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover supported images directly inside `dir`.
    ///
    /// Subdirectories are not descended into. Candidates come back in
    /// filesystem listing order, which is not necessarily alphabetical.
    pub fn discover(&self, dir: &Path) -> Result<Vec<ImageCandidate>, ValidationError> {
        let unavailable = |message: String| ValidationError::DirectoryUnavailable {
            path: dir.to_path_buf(),
            message,
        };

        let meta = std::fs::metadata(dir).map_err(|e| unavailable(e.to_string()))?;
        if !meta.is_dir() {
            return Err(unavailable("not a directory".to_string()));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                // The directory itself could not be listed
                Err(e) if e.depth() == 0 => return Err(unavailable(e.to_string())),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !self.is_supported(path) {
                continue;
            }

            match entry.metadata() {
                Ok(meta) => files.push(ImageCandidate {
                    path: path.to_path_buf(),
                    size: meta.len(),
                }),
                Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
            }
        }

        tracing::debug!("Discovered {} candidate(s) in {:?}", files.len(), dir);
        Ok(files)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[ImageCandidate]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
