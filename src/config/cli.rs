use crate::core::ArtifactSink;
use crate::utils::error::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// tfvars file on local disk, only ever opened in append mode.
#[derive(Debug, Clone)]
pub struct LocalArtifact {
    path: PathBuf,
}

impl LocalArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArtifactSink for LocalArtifact {
    fn append(&self, fragment: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // single write call so the fragment lands contiguously
        file.write_all(fragment.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
