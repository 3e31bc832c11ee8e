//! SHA-256 integrity hash for generated executables

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Path of the hash file written next to `artifact` (`<artifact>.sha256`)
#[must_use]
pub fn hash_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Hex-encoded SHA-256 of the file at `path`
pub async fn digest_file(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    let digest = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok(hex::encode(hasher.finalize()))
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(digest)
}

/// Record the digest of a finished executable in `<artifact>.sha256`.
///
/// Run after signing, so the hash covers the signed bytes.
pub async fn write_integrity_hash(artifact: &Path) -> Result<String> {
    let digest = digest_file(artifact).await?;
    tokio::fs::write(hash_path(artifact), &digest).await?;
    tracing::debug!(artifact = %artifact.display(), sha256 = %digest, "wrote integrity hash");
    Ok(digest)
}
