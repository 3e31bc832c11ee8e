//! Windowed executable build through the external toolchain
//!
//! Scaffolds a console project inside a [`BuildWorkspace`], turns it into a
//! Windows Forms `WinExe` project, drops the rendered source in as the entry
//! point and publishes a single-file executable.

use crate::config::ToolchainConfig;
use crate::error::{GenerateError, Result};
use crate::process::run_tool;
use crate::workspace::BuildWorkspace;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static TARGET_FRAMEWORK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<TargetFramework>.*?</TargetFramework>").expect("static regex is valid")
});

static PROPERTY_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<PropertyGroup>.*?</PropertyGroup>").expect("static regex is valid")
});

static OUTPUT_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<OutputType>.*?</OutputType>").expect("static regex is valid")
});

/// Entry point file written over the scaffold default
pub const ENTRY_POINT: &str = "Program.cs";

/// Build `source` into a windowed executable inside `workspace`.
///
/// # Returns
/// * `Ok(PathBuf)` - Path of the published executable inside the workspace
/// * `Err(GenerateError::Toolchain)` - The toolchain is missing or a step exited non-zero
/// * `Err(GenerateError::Io)` - Reading or writing workspace files failed
/// * `Err(GenerateError::FileNotFound)` - Publish succeeded but produced no executable
pub async fn build(
    source: &str,
    workspace: &BuildWorkspace,
    toolchain: &ToolchainConfig,
) -> Result<PathBuf> {
    let dir = workspace.path();

    // Scaffold
    run_tool(
        &toolchain.program,
        &["new", "console", "-n", toolchain.project_name.as_str(), "-o", "."],
        dir,
    )
    .await?;

    // Windowed target
    let descriptor_path = dir.join(format!("{}.csproj", toolchain.project_name));
    if !tokio::fs::try_exists(&descriptor_path).await? {
        return Err(GenerateError::missing("Project descriptor", descriptor_path));
    }
    let descriptor = tokio::fs::read_to_string(&descriptor_path).await?;
    let patched = patch_project_descriptor(&descriptor, &toolchain.target_framework)?;
    tokio::fs::write(&descriptor_path, patched).await?;

    tokio::fs::write(dir.join(ENTRY_POINT), source).await?;

    // Publish
    let publish_dir = workspace.publish_dir();
    run_tool(&toolchain.program, &publish_args(toolchain, &publish_dir), dir).await?;

    let artifact = publish_dir.join(toolchain.executable_file_name(&toolchain.project_name));
    if !tokio::fs::try_exists(&artifact).await? {
        return Err(GenerateError::missing("Published executable", artifact));
    }

    tracing::debug!(artifact = %artifact.display(), "publish produced executable");
    Ok(artifact)
}

/// Copy the built executable to `destination`, replacing any existing file
pub async fn copy_artifact(artifact: &Path, destination: &Path) -> Result<()> {
    tokio::fs::copy(artifact, destination).await?;
    Ok(())
}

/// Arguments of the publish invocation
#[must_use]
pub fn publish_args(toolchain: &ToolchainConfig, publish_dir: &Path) -> Vec<String> {
    let mut args = vec![
        "publish".to_string(),
        "-c".to_string(),
        toolchain.configuration.clone(),
        "-r".to_string(),
        toolchain.runtime.clone(),
        "--self-contained".to_string(),
        toolchain.self_contained.to_string(),
    ];

    if toolchain.single_file {
        args.push("-p:PublishSingleFile=true".to_string());
    }

    args.push("-o".to_string());
    args.push(publish_dir.to_string_lossy().into_owned());
    args
}

/// Force a scaffolded project descriptor into a windowed Windows Forms build.
///
/// Sets `<TargetFramework>` to `target_framework`, and in the property group
/// that declares it sets `<OutputType>WinExe</OutputType>` (replacing a console
/// `Exe`) and enables `<UseWindowsForms>`.
pub fn patch_project_descriptor(descriptor: &str, target_framework: &str) -> Result<String> {
    if !TARGET_FRAMEWORK.is_match(descriptor) {
        return Err(GenerateError::Toolchain(
            "Scaffolded project descriptor has no <TargetFramework> element".to_string(),
        ));
    }

    let framework = format!("<TargetFramework>{target_framework}</TargetFramework>");
    let text = TARGET_FRAMEWORK.replace_all(descriptor, regex::NoExpand(&framework));

    let patched = PROPERTY_GROUP.replace_all(&text, |caps: &regex::Captures<'_>| {
        let group = &caps[0];
        if !group.contains("<TargetFramework>") {
            return group.to_string();
        }

        let mut extra = Vec::new();
        let mut group = if OUTPUT_TYPE.is_match(group) {
            OUTPUT_TYPE
                .replace(group, "<OutputType>WinExe</OutputType>")
                .into_owned()
        } else {
            extra.push("<OutputType>WinExe</OutputType>");
            group.to_string()
        };

        if !group.contains("<UseWindowsForms>") {
            extra.push("<UseWindowsForms>true</UseWindowsForms>");
        }

        if !extra.is_empty() {
            let insert: String = extra.iter().map(|line| format!("  {line}\n  ")).collect();
            group = group.replacen("</PropertyGroup>", &format!("{insert}</PropertyGroup>"), 1);
        }
        group
    });

    Ok(patched.into_owned())
}
