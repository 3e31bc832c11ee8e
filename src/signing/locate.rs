//! Signing tool discovery
//!
//! A [`ToolResolver`] asks a ranked list of [`ToolLocator`]s in turn and takes
//! the first hit. No version or capability check is made on the result.

use crate::config::SigningConfig;
use crate::error::{GenerateError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Filesystem view used by locators that check fixed paths
pub trait FileProbe: Send + Sync {
    fn is_file(&self, path: &Path) -> bool;
}

/// The host filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileProbe for RealFs {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// One discovery strategy
pub trait ToolLocator: Send + Sync {
    /// Short label used in logs
    fn source(&self) -> &str;

    fn locate(&self) -> Option<PathBuf>;
}

/// Fixed list of candidate paths, checked in order
pub struct KnownPaths<P = RealFs> {
    label: String,
    candidates: Vec<PathBuf>,
    probe: P,
}

impl KnownPaths<RealFs> {
    #[must_use]
    pub fn new(label: impl Into<String>, candidates: Vec<PathBuf>) -> Self {
        Self::with_probe(label, candidates, RealFs)
    }
}

impl<P: FileProbe> KnownPaths<P> {
    #[must_use]
    pub fn with_probe(label: impl Into<String>, candidates: Vec<PathBuf>, probe: P) -> Self {
        Self {
            label: label.into(),
            candidates,
            probe,
        }
    }
}

impl<P: FileProbe> ToolLocator for KnownPaths<P> {
    fn source(&self) -> &str {
        &self.label
    }

    fn locate(&self) -> Option<PathBuf> {
        self.candidates
            .iter()
            .find(|candidate| self.probe.is_file(candidate))
            .cloned()
    }
}

/// Executable search path scan for a tool name
pub struct SearchPath {
    tool_name: String,
    paths: Option<OsString>,
}

impl SearchPath {
    /// Scan the current process `PATH`
    #[must_use]
    pub fn from_env(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            paths: std::env::var_os("PATH"),
        }
    }

    /// Scan an explicit `PATH`-style list
    #[must_use]
    pub fn with_paths(tool_name: impl Into<String>, paths: impl Into<OsString>) -> Self {
        Self {
            tool_name: tool_name.into(),
            paths: Some(paths.into()),
        }
    }
}

impl ToolLocator for SearchPath {
    fn source(&self) -> &str {
        "PATH"
    }

    fn locate(&self) -> Option<PathBuf> {
        let paths = self.paths.as_ref()?;
        let cwd = std::env::current_dir().ok()?;
        which::which_in(&self.tool_name, Some(paths), cwd).ok()
    }
}

/// Ranked chain of locators for one tool
pub struct ToolResolver {
    tool: String,
    locators: Vec<Box<dyn ToolLocator>>,
}

impl ToolResolver {
    /// Resolver with no strategies; add them with [`ToolResolver::with_locator`]
    #[must_use]
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            locators: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_locator(mut self, locator: impl ToolLocator + 'static) -> Self {
        self.locators.push(Box::new(locator));
        self
    }

    /// Standard chain: configured path, known SDK paths, then `PATH`
    #[must_use]
    pub fn from_config(signing: &SigningConfig) -> Self {
        let mut resolver = Self::new(signing.signtool_name.clone());

        if let Some(explicit) = &signing.signtool_path {
            resolver = resolver.with_locator(KnownPaths::new("configured", vec![explicit.clone()]));
        }

        resolver = resolver.with_locator(KnownPaths::new(
            "known install path",
            signing.known_paths.clone(),
        ));

        if signing.search_path {
            resolver = resolver.with_locator(SearchPath::from_env(signing.signtool_name.clone()));
        }

        resolver
    }

    /// First location reported by any strategy
    #[must_use]
    pub fn resolve(&self) -> Option<PathBuf> {
        self.locators.iter().find_map(|locator| {
            let found = locator.locate()?;
            tracing::debug!(tool = %self.tool, source = locator.source(), path = %found.display(), "located tool");
            Some(found)
        })
    }

    /// Like [`ToolResolver::resolve`] but a miss is [`GenerateError::ToolNotFound`]
    pub fn require(&self) -> Result<PathBuf> {
        self.resolve().ok_or_else(|| {
            let searched: Vec<&str> = self.locators.iter().map(|l| l.source()).collect();
            GenerateError::ToolNotFound(format!(
                "{} not found (searched: {}).\n\
                 \n\
                 Install the Windows SDK:\n\
                 https://developer.microsoft.com/en-us/windows/downloads/windows-sdk/\n\
                 \n\
                 Or point `signing.signtool_path` in the config file at signtool.exe.",
                self.tool,
                if searched.is_empty() {
                    "nothing".to_string()
                } else {
                    searched.join(", ")
                }
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    struct FakeFs(HashSet<PathBuf>);

    impl FakeFs {
        fn with(paths: &[&str]) -> Self {
            Self(paths.iter().map(PathBuf::from).collect())
        }
    }

    impl FileProbe for FakeFs {
        fn is_file(&self, path: &Path) -> bool {
            self.0.contains(path)
        }
    }

    fn candidates(paths: &[&str]) -> Vec<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn known_paths_returns_first_existing_candidate() {
        let locator = KnownPaths::with_probe(
            "sdk",
            candidates(&["/sdk/a/signtool.exe", "/sdk/b/signtool.exe", "/sdk/c/signtool.exe"]),
            FakeFs::with(&["/sdk/c/signtool.exe", "/sdk/b/signtool.exe"]),
        );
        assert_eq!(locator.locate(), Some(PathBuf::from("/sdk/b/signtool.exe")));
    }

    #[test]
    fn known_paths_misses_when_nothing_exists() {
        let locator = KnownPaths::with_probe("sdk", candidates(&["/sdk/a"]), FakeFs::with(&[]));
        assert_eq!(locator.locate(), None);
    }

    #[test]
    fn resolver_prefers_earlier_strategies() {
        let resolver = ToolResolver::new("signtool")
            .with_locator(KnownPaths::with_probe(
                "first",
                candidates(&["/missing"]),
                FakeFs::with(&["/elsewhere"]),
            ))
            .with_locator(KnownPaths::with_probe(
                "second",
                candidates(&["/second/signtool.exe"]),
                FakeFs::with(&["/second/signtool.exe"]),
            ))
            .with_locator(KnownPaths::with_probe(
                "third",
                candidates(&["/third/signtool.exe"]),
                FakeFs::with(&["/third/signtool.exe"]),
            ));

        assert_eq!(resolver.resolve(), Some(PathBuf::from("/second/signtool.exe")));
    }

    #[test]
    fn empty_resolver_reports_tool_not_found() {
        let err = ToolResolver::new("signtool").require().unwrap_err();
        assert!(matches!(err, GenerateError::ToolNotFound(_)));
        assert!(err.to_string().contains("searched: nothing"));
    }

    #[test]
    fn config_without_search_path_only_checks_fixed_locations() {
        let signing = SigningConfig {
            known_paths: candidates(&["/definitely/not/here/signtool.exe"]),
            search_path: false,
            ..SigningConfig::default()
        };
        let err = ToolResolver::from_config(&signing).require().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("known install path"), "{message}");
        assert!(!message.contains("PATH,"), "{message}");
    }

    #[cfg(unix)]
    #[test]
    fn search_path_scans_each_directory() {
        use std::os::unix::fs::PermissionsExt;

        let empty = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();
        let tool = bin.path().join("signtool");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let paths = std::env::join_paths([empty.path(), bin.path()]).unwrap();
        let locator = SearchPath::with_paths("signtool", paths);
        assert_eq!(locator.locate(), Some(tool));

        let paths = std::env::join_paths([empty.path()]).unwrap();
        assert_eq!(SearchPath::with_paths("signtool", paths).locate(), None);
    }
}
