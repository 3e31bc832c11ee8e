//! Sandboxed directories and fake external tools for pipeline tests.

#![allow(dead_code)]

use secret_window_forge::GeneratorConfig;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Stand-in for `dotnet`: `new` writes a console scaffold, `publish` checks
/// the project was patched and "compiles" Program.cs by copying it to
/// `<out>/App.exe`.
pub const FAKE_DOTNET: &str = r#"#!/bin/sh
case "$1" in
  new)
    cat > App.csproj <<'XML'
<Project Sdk="Microsoft.NET.Sdk">

  <PropertyGroup>
    <OutputType>Exe</OutputType>
    <TargetFramework>net8.0</TargetFramework>
    <ImplicitUsings>enable</ImplicitUsings>
    <Nullable>enable</Nullable>
  </PropertyGroup>

</Project>
XML
    echo 'Console.WriteLine("Hello, World!");' > Program.cs
    ;;
  publish)
    out=""
    while [ $# -gt 0 ]; do
      if [ "$1" = "-o" ]; then out="$2"; fi
      shift
    done
    grep -q "<OutputType>WinExe</OutputType>" App.csproj || { echo "error: not a WinExe project" >&2; exit 3; }
    grep -q "<UseWindowsForms>true</UseWindowsForms>" App.csproj || { echo "error: forms disabled" >&2; exit 3; }
    mkdir -p "$out"
    cp Program.cs "$out/App.exe"
    echo "App -> $out/App.exe"
    ;;
  *)
    echo "unknown command $1" >&2
    exit 1
    ;;
esac
"#;

/// `dotnet` that fails while scaffolding
pub const BROKEN_DOTNET: &str = r#"#!/bin/sh
echo "Restoring packages..."
echo "error NETSDK1045: scaffold exploded" >&2
exit 4
"#;

/// Per-test directory layout
pub struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        for dir in ["out", "workspaces", "certs", "tools", "logs"] {
            std::fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        Self { root }
    }

    pub fn destination(&self) -> PathBuf {
        self.root.path().join("out")
    }

    pub fn workspaces(&self) -> PathBuf {
        self.root.path().join("workspaces")
    }

    pub fn certs(&self) -> PathBuf {
        self.root.path().join("certs")
    }

    pub fn log(&self, name: &str) -> PathBuf {
        self.root.path().join("logs").join(name)
    }

    /// Write an executable script into the tools directory
    pub fn tool(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root.path().join("tools").join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Fake signtool that records its arguments and working directory, then
    /// appends a marker to the artifact (its last argument)
    pub fn signtool(&self) -> PathBuf {
        let body = format!(
            r#"#!/bin/sh
printf '%s\n' "$@" > "{args}"
pwd > "{cwd}"
[ -f "$3" ] || {{ echo "SignTool Error: certificate missing: $3" >&2; exit 2; }}
for last; do :; done
printf '\n// SIGNED\n' >> "$last"
echo "Successfully signed: $last"
"#,
            args = self.log("signtool.args").display(),
            cwd = self.log("signtool.cwd").display(),
        );
        self.tool("signtool", &body)
    }

    /// Fake signtool that always fails
    pub fn failing_signtool(&self) -> PathBuf {
        self.tool(
            "signtool",
            "#!/bin/sh\necho \"SignTool Error: No certificates were found that met all the given criteria.\" >&2\nexit 1\n",
        )
    }

    /// Config pointing every ephemeral directory into the sandbox, with no
    /// signing tool discoverable
    pub fn config(&self, toolchain: &Path) -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        config.toolchain.program = toolchain.to_path_buf();
        config.workspace_root = Some(self.workspaces());
        config.certificate_dir = Some(self.certs());
        config.signing.known_paths.clear();
        config.signing.search_path = false;
        config
    }

    pub fn signing_config(&self, toolchain: &Path, signtool: &Path) -> GeneratorConfig {
        let mut config = self.config(toolchain);
        config.signing.signtool_path = Some(signtool.to_path_buf());
        config
    }

    pub fn signtool_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.log("signtool.args"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Sorted entry names of a directory
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
