use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use secret_window_forge::{GenerationRequest, Generator, GeneratorConfig, error, success};

// ============================================================================
// ERROR HANDLING STRATEGY
// ============================================================================
//
// Setup failures (bad config file, unreadable secret file) bubble out of
// main as anyhow errors.
//
// A failed generation is printed verbatim as one red error line, including
// any captured tool output, and the process exits with status 1.
//
// Terminal coloring is decorative: every termcolor write result is ignored.
// ============================================================================

#[derive(Parser)]
#[command(name = "swforge")]
#[command(
    version,
    about = "Build a standalone windowed executable that shows a secret, optionally code-signed"
)]
struct Cli {
    /// Destination folder (created if missing)
    #[arg(long, short = 'f')]
    folder: PathBuf,

    /// Executable name without extension (also the window title)
    #[arg(long, short = 'n')]
    name: String,

    /// Secret text to display; use "-" to read it from stdin
    #[arg(long, short = 's', required_unless_present = "secret_file", conflicts_with = "secret_file")]
    secret: Option<String>,

    /// Read the secret text from a file
    #[arg(long)]
    secret_file: Option<PathBuf>,

    /// Sign the executable with an ephemeral self-signed certificate
    #[arg(long)]
    sign: bool,

    /// Password protecting the ephemeral certificate (ignored without --sign)
    #[arg(long, env = "SWFORGE_CERT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Explicit path to signtool.exe
    #[arg(long, requires = "sign")]
    signtool: Option<PathBuf>,

    /// Timestamp authority URL used when signing
    #[arg(long, requires = "sign")]
    timestamp_url: Option<String>,

    /// Build toolchain executable (defaults to `dotnet`)
    #[arg(long, env = "SWFORGE_TOOLCHAIN")]
    toolchain: Option<PathBuf>,

    /// Also write <name>.<ext>.sha256 next to the executable
    #[arg(long)]
    integrity_hash: bool,

    /// Path to config file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Print the generation report as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging (otherwise controlled by RUST_LOG)
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref()).await?;
    if let Some(program) = &cli.toolchain {
        config.toolchain.program.clone_from(program);
    }
    if let Some(signtool) = &cli.signtool {
        config.signing.signtool_path = Some(signtool.clone());
    }
    if let Some(url) = &cli.timestamp_url {
        config.signing.timestamp_url.clone_from(url);
    }
    if cli.integrity_hash {
        config.integrity_hash = true;
    }

    let secret = read_secret(cli.secret.as_deref(), cli.secret_file.as_deref()).await?;
    if secret.trim().is_empty() {
        anyhow::bail!("Secret text is empty");
    }

    let mut request = GenerationRequest::new(&cli.folder, &cli.name, secret);
    if cli.sign {
        request = request.signed(cli.password.clone());
    }

    let generator = Generator::new(config);
    match generator.generate(&request).await {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                success!(
                    "Created {} at {}.\n  {} symbols{}",
                    report
                        .artifact
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    cli.folder.display(),
                    report.secret_chars,
                    if report.signed { ", signed" } else { "" }
                );
                if let Some(hash) = &report.sha256 {
                    success!("SHA256: {hash}");
                }
            }
            Ok(())
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn load_config(explicit: Option<&Path>) -> Result<GeneratorConfig> {
    if let Some(path) = explicit {
        return GeneratorConfig::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    match GeneratorConfig::default_path() {
        Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => {
            tracing::debug!(path = %path.display(), "using default config file");
            GeneratorConfig::load(&path)
                .await
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        _ => Ok(GeneratorConfig::default()),
    }
}

async fn read_secret(inline: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (inline, file) {
        (Some("-"), _) => {
            let mut secret = String::new();
            tokio::io::stdin()
                .read_to_string(&mut secret)
                .await
                .context("Failed to read secret from stdin")?;
            Ok(strip_line_ending(&secret).to_string())
        }
        (Some(secret), _) => Ok(secret.to_string()),
        (None, Some(path)) => {
            let secret = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read secret file {}", path.display()))?;
            Ok(strip_line_ending(&secret).to_string())
        }
        (None, None) => anyhow::bail!("No secret given (use --secret or --secret-file)"),
    }
}

/// Drop the single trailing newline that editors and shell pipes append
fn strip_line_ending(secret: &str) -> &str {
    let secret = secret.strip_suffix('\n').unwrap_or(secret);
    secret.strip_suffix('\r').unwrap_or(secret)
}
