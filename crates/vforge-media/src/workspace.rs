//! Job-scoped ephemeral workspaces.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::MediaResult;

/// A write-once-read-many staging directory scoped to one job.
///
/// Created at the start of stitching and destroyed unconditionally at the
/// end, success or failure. `cleanup()` is the preferred path; `Drop` is a
/// best-effort backstop so an early return or panic cannot leak the
/// directory.
#[derive(Debug)]
pub struct JobWorkspace {
    root: PathBuf,
    cleaned: bool,
}

impl JobWorkspace {
    /// Create the workspace directory under `base_dir` for the given job.
    pub async fn create(base_dir: impl AsRef<Path>, job_id: &str) -> MediaResult<Self> {
        // uuid suffix keeps re-runs of the same job from colliding
        let root = base_dir
            .as_ref()
            .join(format!("{}-{}", job_id, uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&root).await?;
        debug!("Created job workspace at {}", root.display());
        Ok(Self {
            root,
            cleaned: false,
        })
    }

    /// Path of the workspace root.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Remove the workspace and everything in it.
    pub async fn cleanup(mut self) -> MediaResult<()> {
        self.cleaned = true;
        tokio::fs::remove_dir_all(&self.root).await?;
        debug!("Removed job workspace at {}", self.root.display());
        Ok(())
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if !self.cleaned {
            if let Err(e) = std::fs::remove_dir_all(&self.root) {
                warn!(
                    "Failed to remove leaked workspace {}: {}",
                    self.root.display(),
                    e
                );
            }
        }
    }
}
