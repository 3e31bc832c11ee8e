//! End-to-end generation: render, build, copy, optionally sign
//!
//! Each run owns a fresh [`BuildWorkspace`] and, when signing, a fresh
//! [`CertificateFile`]. Both are released on every exit path. Release
//! failures are only reported, so the caller always sees the error of the
//! stage that actually failed.

use crate::build_helper;
use crate::certificate::{CertificateFile, issue_code_signing_certificate};
use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};
use crate::integrity::write_integrity_hash;
use crate::signing::{ToolResolver, sign};
use crate::template;
use crate::workspace::BuildWorkspace;
use serde::Serialize;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Characters the destination file name may not contain
const FORBIDDEN_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Inputs of one generation run
#[derive(Clone)]
pub struct GenerationRequest {
    /// Folder receiving the executable (created if missing)
    pub destination: PathBuf,
    /// Executable name without extension; also the window title and certificate CN
    pub file_name: String,
    /// Text shown in the window
    pub secret: String,
    pub sign: bool,
    /// Certificate password; the configured default is used when `None`
    pub certificate_password: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("destination", &self.destination)
            .field("file_name", &self.file_name)
            .field("secret_chars", &self.secret.chars().count())
            .field("sign", &self.sign)
            .field("certificate_password", &self.certificate_password.as_ref().map(|_| "********"))
            .finish()
    }
}

impl GenerationRequest {
    /// Unsigned request
    #[must_use]
    pub fn new(
        destination: impl Into<PathBuf>,
        file_name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            file_name: file_name.into(),
            secret: secret.into(),
            sign: false,
            certificate_password: None,
        }
    }

    /// Request signing, optionally with an explicit certificate password
    #[must_use]
    pub fn signed(mut self, password: Option<String>) -> Self {
        self.sign = true;
        self.certificate_password = password.map(Zeroizing::new);
        self
    }

    /// Check the destination and file name before anything touches disk
    pub fn validate(&self) -> Result<()> {
        if self.destination.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(GenerateError::InvalidRequest(
                "Destination folder is empty".to_string(),
            ));
        }

        let name = self.file_name.trim();
        if name.is_empty() {
            return Err(GenerateError::InvalidRequest("File name is empty".to_string()));
        }
        if name == "." || name == ".." {
            return Err(GenerateError::InvalidRequest(format!(
                "File name '{name}' is not a file name"
            )));
        }
        if let Some(c) = self.file_name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c) || c.is_control()) {
            return Err(GenerateError::InvalidRequest(format!(
                "File name '{}' contains forbidden character {c:?}",
                self.file_name
            )));
        }
        // Windows silently strips these, so the file written would not be the one reported
        if self.file_name.ends_with(['.', ' ']) {
            return Err(GenerateError::InvalidRequest(format!(
                "File name '{}' ends with a dot or space",
                self.file_name
            )));
        }

        Ok(())
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// The only durable output
    pub artifact: PathBuf,
    pub signed: bool,
    pub secret_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Runs the generation pipeline with one configuration
pub struct Generator {
    config: GeneratorConfig,
    resolver: ToolResolver,
}

impl Generator {
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let resolver = ToolResolver::from_config(&config.signing);
        Self { config, resolver }
    }

    /// Replace the signing tool discovery chain
    #[must_use]
    pub fn with_resolver(mut self, resolver: ToolResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate `<destination>/<file_name>.<ext>` and sign it if requested.
    ///
    /// Independent calls may run concurrently; each uses its own workspace and
    /// certificate file. The first failing stage's error is returned as is.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationReport> {
        request.validate()?;

        let destination = std::path::absolute(&request.destination)?;
        tokio::fs::create_dir_all(&destination).await?;

        let workspace = BuildWorkspace::create(&self.config.workspace_root()).await?;
        let outcome = self.run(request, &destination, &workspace).await;
        workspace.cleanup().await;

        match &outcome {
            Ok(report) => tracing::info!(
                artifact = %report.artifact.display(),
                signed = report.signed,
                "generated executable"
            ),
            Err(e) => tracing::debug!(error = %e, "generation failed"),
        }

        outcome
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        destination: &Path,
        workspace: &BuildWorkspace,
    ) -> Result<GenerationReport> {
        let source = template::render_with(&request.file_name, &request.secret, self.config.window);
        let built = build_helper::build(&source, workspace, &self.config.toolchain).await?;

        let target = destination.join(self.config.toolchain.executable_file_name(&request.file_name));
        build_helper::copy_artifact(&built, &target).await?;
        tracing::debug!(artifact = %target.display(), "copied executable to destination");

        if request.sign {
            let password = self.certificate_password(request);
            let certificate = issue_code_signing_certificate(
                &request.file_name,
                &password,
                &self.config.certificate_dir(),
            )
            .await?;

            let signed = self.sign_with(&target, &certificate, &password).await;
            certificate.cleanup().await;
            signed?;
        }

        let sha256 = if self.config.integrity_hash {
            Some(write_integrity_hash(&target).await?)
        } else {
            None
        };

        Ok(GenerationReport {
            artifact: target,
            signed: request.sign,
            secret_chars: request.secret.chars().count(),
            sha256,
        })
    }

    async fn sign_with(&self, target: &Path, certificate: &CertificateFile, password: &str) -> Result<()> {
        if !tokio::fs::try_exists(certificate.path()).await? {
            return Err(GenerateError::missing("Certificate", certificate.path()));
        }
        sign(target, certificate.path(), password, &self.config.signing, &self.resolver).await
    }

    fn certificate_password(&self, request: &GenerationRequest) -> Zeroizing<String> {
        match &request.certificate_password {
            Some(password) => password.clone(),
            None => {
                warn!("No certificate password given, using the built-in default password");
                Zeroizing::new(self.config.signing.default_password.clone())
            }
        }
    }
}
