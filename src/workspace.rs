//! Ephemeral build workspace

use crate::error::Result;
use rand::distr::{Alphanumeric, SampleString};
use std::path::{Path, PathBuf};

/// Prefix of every workspace directory name
pub const WORKSPACE_PREFIX: &str = "SecretWindow_";

/// Uniquely named directory owning all intermediate build files of one run
///
/// Created empty under a root directory, removed by [`BuildWorkspace::cleanup`].
/// If the owner never gets to call `cleanup` (panic, dropped future) the
/// directory is removed on drop instead.
///
/// # Example
/// ```no_run
/// # async fn demo() -> secret_window_forge::error::Result<()> {
/// use secret_window_forge::workspace::BuildWorkspace;
///
/// let workspace = BuildWorkspace::create(&std::env::temp_dir()).await?;
/// // ... build inside workspace.path() ...
/// workspace.cleanup().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BuildWorkspace {
    path: PathBuf,
    released: bool,
}

impl BuildWorkspace {
    /// Create a fresh workspace directory under `root`.
    ///
    /// The leaf directory is created with `create_dir`, so an existing
    /// directory of the same name is an error rather than shared.
    pub async fn create(root: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(root).await?;

        let name = format!(
            "{WORKSPACE_PREFIX}{}",
            Alphanumeric.sample_string(&mut rand::rng(), 32)
        );
        let path = root.join(name);
        tokio::fs::create_dir(&path).await?;

        tracing::debug!(workspace = %path.display(), "created build workspace");

        Ok(Self {
            path,
            released: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Output directory for the publish step
    #[must_use]
    pub fn publish_dir(&self) -> PathBuf {
        self.path.join("publish")
    }

    /// Remove the workspace recursively (best-effort, never fails)
    pub async fn cleanup(mut self) {
        crate::cleanup_path(&self.path, "build workspace").await;
        self.released = true;
    }
}

impl Drop for BuildWorkspace {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
