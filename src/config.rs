use std::path::{Path, PathBuf};

/// Where the example template lands, relative to the base directory.
pub const TEMPLATE_PATH: &str = "config-repo/common-templates/templates/example.xlsx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub base_dir: PathBuf,
    pub relative_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::in_dir(".")
    }
}

impl OutputConfig {
    pub fn in_dir(base_dir: impl AsRef<Path>) -> Self {
        OutputConfig {
            base_dir: base_dir.as_ref().to_path_buf(),
            relative_path: PathBuf::from(TEMPLATE_PATH),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.base_dir.join(&self.relative_path)
    }
}
