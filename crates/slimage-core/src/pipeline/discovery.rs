//! File discovery for the directory-of-images variant.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use crate::error::SetupError;

/// Discovers image files directly inside a directory.
pub struct FileDiscovery {
    config: DiscoveryConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// List supported image files in `dir`, sorted by path.
    ///
    /// Subdirectories are not entered.
    pub fn discover(&self, dir: &Path) -> Result<Vec<DiscoveredFile>, SetupError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|e| SetupError::InputUnreadable {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
            let entry_path = entry.path();
            if entry_path.is_file() && self.is_supported(entry_path) {
                match entry.metadata() {
                    Ok(meta) => files.push(DiscoveredFile {
                        path: entry_path.to_path_buf(),
                        size: meta.len(),
                    }),
                    Err(e) => tracing::warn!("Cannot stat {:?}: {}", entry_path, e),
                }
            }
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Where the transcoded copy of `input` goes: same stem, normalized extension.
    pub fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input.file_stem().unwrap_or_else(|| input.as_os_str());
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(&self.config.output_extension);
        output_dir.join(name)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        let discovery = FileDiscovery::new(DiscoveryConfig::default());

        assert!(discovery.is_supported(Path::new("test.jpg")));
        assert!(discovery.is_supported(Path::new("test.JPG")));
        assert!(discovery.is_supported(Path::new("test.jpeg")));
        assert!(discovery.is_supported(Path::new("test.png")));
        assert!(!discovery.is_supported(Path::new("test.txt")));
        assert!(!discovery.is_supported(Path::new("test")));
    }

    #[test]
    fn test_output_path_normalizes_extension() {
        let discovery = FileDiscovery::new(DiscoveryConfig::default());
        let out = Path::new("/out");

        assert_eq!(
            discovery.output_path(Path::new("/in/bache_19.4_-99.1.png"), out),
            PathBuf::from("/out/bache_19.4_-99.1.jpg")
        );
        assert_eq!(
            discovery.output_path(Path::new("/in/photo.JPEG"), out),
            PathBuf::from("/out/photo.jpg")
        );
    }

    #[test]
    fn test_discover_is_flat_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"12").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.png"), b"1").unwrap();

        let discovery = FileDiscovery::new(DiscoveryConfig::default());
        let files = discovery.discover(dir.path()).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.jpg", "b.png"]);
        assert_eq!(FileDiscovery::total_size(&files), 3);
    }

    #[test]
    fn test_discover_missing_directory_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = FileDiscovery::new(DiscoveryConfig::default());
        let err = discovery.discover(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, SetupError::InputUnreadable { .. }));
    }
}
