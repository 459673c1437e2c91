//! Loader configuration.

use sni_content::front_matter::DEFAULT_MAX_FILE_SIZE;

/// Options for [`crate::load_all`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LoaderConfig {
    /// Maximum file size in bytes (default: 10 MB). Larger files abort the load.
    pub max_file_size: u64,
    /// Exclude patterns (glob format), matched against the file name and the
    /// full path.
    pub exclude: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            exclude: Vec::new(),
        }
    }
}
