use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{VidfxError, VidfxResult};

/// Per-job scratch directory, removed with everything in it when dropped.
#[derive(Debug)]
pub struct JobScratch {
    dir: tempfile::TempDir,
}

impl JobScratch {
    pub fn new(parent: Option<&Path>) -> VidfxResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vidfx-job-");
        let dir = match parent {
            Some(p) => {
                std::fs::create_dir_all(p).map_err(|e| {
                    VidfxError::validation(format!("temp dir '{}': {e}", p.display()))
                })?;
                builder.tempdir_in(p)
            }
            None => builder.tempdir(),
        }
        .context("failed to create job scratch dir")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write the job input under a fixed name with the caller's extension.
    pub fn write_input(&self, bytes: &[u8], extension: &str) -> VidfxResult<PathBuf> {
        if bytes.is_empty() {
            return Err(VidfxError::validation("input video is empty"));
        }
        let path = self.file(&format!("input.{}", sanitize_extension(extension)?));
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write job input '{}'", path.display()))?;
        Ok(path)
    }
}

/// Container extension without the dot, restricted to ASCII alphanumerics.
pub fn sanitize_extension(ext: &str) -> VidfxResult<String> {
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(VidfxError::validation(format!(
            "invalid container extension '{ext}'"
        )));
    }
    Ok(ext)
}

#[cfg(test)]
#[path = "../../tests/unit/job/scratch.rs"]
mod tests;
