//! Configuration structures for executable generation and signing.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Password used for the ephemeral certificate when the caller supplies none.
pub const DEFAULT_CERTIFICATE_PASSWORD: &str = "password";

/// Default RFC 3161 / Authenticode timestamp authority
pub const DEFAULT_TIMESTAMP_URL: &str = "http://timestamp.digicert.com";

/// Windows SDK locations checked before falling back to `PATH`.
pub const KNOWN_SIGNTOOL_PATHS: &[&str] = &[
    r"C:\Program Files (x86)\Windows Kits\10\bin\10.0.19041.0\x64\signtool.exe",
    r"C:\Program Files (x86)\Windows Kits\10\bin\10.0.18362.0\x64\signtool.exe",
    r"C:\Program Files (x86)\Windows Kits\10\bin\x64\signtool.exe",
    r"C:\Program Files (x86)\Microsoft SDKs\Windows\v10.0A\bin\NETFX 4.8 Tools\x64\signtool.exe",
    r"C:\Program Files (x86)\Microsoft SDKs\ClickOnce\SignTool\signtool.exe",
];

/// Directory name used under the user's config dir
pub const CONFIG_DIR_NAME: &str = "secret-window-forge";

/// Top-level generator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub toolchain: ToolchainConfig,
    pub window: WindowConfig,
    pub signing: SigningConfig,

    /// Parent directory for build workspaces (system temp dir when unset)
    pub workspace_root: Option<PathBuf>,

    /// Directory for the exported certificate (system temp dir when unset)
    pub certificate_dir: Option<PathBuf>,

    /// Write `<artifact>.sha256` next to the final executable
    pub integrity_hash: bool,
}

/// External build toolchain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub program: PathBuf,
    pub project_name: String,
    pub target_framework: String,
    pub runtime: String,
    pub configuration: String,
    pub self_contained: bool,
    pub single_file: bool,
    pub executable_extension: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("dotnet"),
            project_name: "App".to_string(),
            target_framework: "net8.0-windows".to_string(),
            runtime: "win-x64".to_string(),
            configuration: "Release".to_string(),
            self_contained: false,
            single_file: true,
            executable_extension: "exe".to_string(),
        }
    }
}

impl ToolchainConfig {
    /// File name of an executable called `stem` for the target platform
    #[must_use]
    pub fn executable_file_name(&self, stem: &str) -> String {
        if self.executable_extension.is_empty() {
            stem.to_string()
        } else {
            format!("{stem}.{}", self.executable_extension)
        }
    }
}

/// Size of the generated window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
        }
    }
}

/// Signing utility discovery and invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub timestamp_url: String,

    /// Explicit signing tool, tried before every other location
    pub signtool_path: Option<PathBuf>,

    /// File name looked up on `PATH`
    pub signtool_name: String,

    pub known_paths: Vec<PathBuf>,

    /// Scan `PATH` after the known locations
    pub search_path: bool,

    pub default_password: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            timestamp_url: DEFAULT_TIMESTAMP_URL.to_string(),
            signtool_path: None,
            signtool_name: "signtool".to_string(),
            known_paths: KNOWN_SIGNTOOL_PATHS.iter().map(PathBuf::from).collect(),
            search_path: true,
            default_password: DEFAULT_CERTIFICATE_PASSWORD.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a TOML configuration document
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&content)
    }

    /// Default config file location (`<config_dir>/secret-window-forge/config.toml`)
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
    }

    #[must_use]
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    #[must_use]
    pub fn certificate_dir(&self) -> PathBuf {
        self.certificate_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
