//! Generate a standalone windowed executable that displays a secret, and
//! optionally sign it with an ephemeral self-signed code-signing certificate.
//!
//! # Error Handling Strategy
//!
//! **Pipeline operations** propagate errors with `?`: tool invocations,
//! workspace and destination I/O, key generation and export. The first
//! failure ends the run and reaches the caller unchanged.
//!
//! **Release of ephemeral resources** (workspace directory, certificate file)
//! is best-effort: failures are reported as warnings and never replace the
//! outcome of the run.

#[macro_use]
pub mod prompts;

pub mod build_helper;
pub mod certificate;
pub mod config;
pub mod error;
pub mod integrity;
pub mod pipeline;
pub mod process;
pub mod signing;
pub mod template;
pub mod workspace;

pub use config::GeneratorConfig;
pub use error::{GenerateError, Result};
pub use pipeline::{GenerationReport, GenerationRequest, Generator};

/// Attempt to remove a file or directory, warning on failure.
///
/// - Succeeds silently when cleanup works or the path is already gone
/// - Prints a warning with a suggestion when removal fails
/// - Never panics or returns errors
///
/// # Arguments
///
/// * `path` - Path to file or directory to remove
/// * `description` - Human-readable description of what's being cleaned up
pub async fn cleanup_path<P: AsRef<std::path::Path>>(path: P, description: &str) {
    let path = path.as_ref();

    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        // Nothing to clean up
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!("Failed to cleanup {description}\n   Path: {}\n   Error: {e}", path.display());
            return;
        }
    };

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Ok(()) => tracing::debug!(path = %path.display(), "removed {description}"),
        // Removed concurrently
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            let suggestion = match e.kind() {
                std::io::ErrorKind::PermissionDenied => format!(
                    "Check file permissions or remove it manually: {}",
                    path.display()
                ),
                std::io::ErrorKind::DirectoryNotEmpty => {
                    "Directory may contain locked files".to_string()
                }
                _ => "Manual cleanup may be needed".to_string(),
            };
            warn!(
                "Failed to cleanup {description}\n   Path: {}\n   Error: {e}\n   Suggestion: {suggestion}",
                path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cleanup_removes_files_and_directories() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("cert.pfx");
        let dir = root.path().join("ws");
        std::fs::write(&file, b"x").unwrap();
        std::fs::create_dir_all(dir.join("publish")).unwrap();
        std::fs::write(dir.join("publish").join("App.exe"), b"x").unwrap();

        cleanup_path(&file, "certificate").await;
        cleanup_path(&dir, "workspace").await;

        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn cleanup_of_missing_path_is_silent() {
        let root = tempfile::tempdir().unwrap();
        cleanup_path(root.path().join("never-created"), "nothing").await;
    }
}
