//! Example image discovery.

use crate::constants::EXAMPLE_EXTENSIONS;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Demonstration images offered on the upload page.
///
/// Only files discovered at startup can be served, so request paths never
/// reach the filesystem directly.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    dir: PathBuf,
    names: Vec<String>,
}

impl Gallery {
    /// Scan `dir` for example images, sorted by file name.
    ///
    /// A missing or unreadable directory yields an empty gallery.
    pub fn discover(dir: &Path) -> Self {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("No example images loaded from {}: {e}", dir.display());
                return Self {
                    dir: dir.to_path_buf(),
                    names: Vec::new(),
                };
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_example_image(name))
            .collect();
        names.sort();

        debug!("Found {} example image(s) in {}", names.len(), dir.display());

        Self {
            dir: dir.to_path_buf(),
            names,
        }
    }

    /// Example file names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether the gallery has no examples.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Filesystem path of a known example.
    pub fn path_of(&self, name: &str) -> Option<PathBuf> {
        self.names
            .iter()
            .any(|n| n == name)
            .then(|| self.dir.join(name))
    }
}

/// MIME type for an example image name.
pub fn content_type(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn is_example_image(name: &str) -> bool {
    extension(name).is_some_and(|ext| EXAMPLE_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
