//! `signtool sign` invocation

use super::locate::ToolResolver;
use crate::config::SigningConfig;
use crate::error::{GenerateError, Result};
use crate::process::{command_line, run_tool_as};
use std::ffi::OsString;
use std::path::Path;

const REDACTED: &str = "********";

/// Arguments for `signtool sign` with a PKCS#12 file.
///
/// `/p <password>` is left out when the password is empty.
#[must_use]
pub fn sign_args(
    artifact: &Path,
    certificate: &Path,
    password: &str,
    timestamp_url: &str,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["sign".into(), "/f".into(), certificate.into()];

    if !password.is_empty() {
        args.push("/p".into());
        args.push(password.into());
    }

    args.push("/t".into());
    args.push(timestamp_url.into());
    args.push("/v".into());
    args.push(artifact.into());
    args
}

/// Sign `artifact` in place with the PKCS#12 `certificate`.
///
/// The tool runs from the artifact's directory. The password never appears
/// in logs or error messages.
///
/// # Returns
/// * `Ok(())` - Signing succeeded
/// * `Err(GenerateError::ToolNotFound)` - No strategy located the signing tool
/// * `Err(GenerateError::FileNotFound)` - Artifact or certificate is missing
/// * `Err(GenerateError::Toolchain)` - The tool could not start or exited non-zero
pub async fn sign(
    artifact: &Path,
    certificate: &Path,
    password: &str,
    signing: &SigningConfig,
    resolver: &ToolResolver,
) -> Result<()> {
    let tool = resolver.require()?;

    let artifact = std::path::absolute(artifact)?;
    let certificate = std::path::absolute(certificate)?;

    if !tokio::fs::try_exists(&artifact).await? {
        return Err(GenerateError::missing("Executable", artifact));
    }
    if !tokio::fs::try_exists(&certificate).await? {
        return Err(GenerateError::missing("Certificate", certificate));
    }

    let cwd = artifact
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let args = sign_args(&artifact, &certificate, password, &signing.timestamp_url);
    let shown = sign_args(&artifact, &certificate, redact(password), &signing.timestamp_url);

    run_tool_as(&tool, &args, cwd, command_line(&tool, &shown)).await?;

    success!("Signed: {}", artifact.display());
    Ok(())
}

fn redact(password: &str) -> &str {
    if password.is_empty() { "" } else { REDACTED }
}
