//! CLI binary for iocscope.
//!
//! Every command writes JSON to stdout. All tracing output goes to stderr
//! so that stdout can be piped straight into other tools.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use iocscope::{IocScope, ScopeConfig, ScopeError};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Exit code when at least one indicator could not be classified.
const EXIT_UNCLASSIFIED: u8 = 2;

/// iocscope: multi-source threat-intelligence verdicts for IOCs.
#[derive(Parser)]
#[command(name = "iocscope", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Analyze one or more indicators.
    Analyze {
        /// URLs, domains, IP addresses, file hashes or email addresses.
        #[arg(required = true)]
        indicators: Vec<String>,
    },

    /// Analyze indicators read one per line from a file or stdin.
    Batch {
        /// Input file (default: stdin). Blank lines and `#` comments are skipped.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show registered providers and whether they have credentials.
    Providers,

    /// Write a default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// JSON shape of an indicator that failed to classify.
#[derive(Serialize)]
struct ClassificationFailure<'a> {
    indicator: &'a str,
    error: &'static str,
    message: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Command::InitConfig { force } = cli.command {
        return init_config(cli.config.as_deref(), force);
    }

    let config = ScopeConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let service = IocScope::from_config(config).context("invalid configuration")?;

    match cli.command {
        Command::Analyze { indicators } => analyze(&service, &indicators).await,
        Command::Batch { file } => batch(&service, file.as_deref()).await,
        Command::Providers => {
            print_json(&service.provider_status())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::InitConfig { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("iocscope=info,ioc_intel=info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn analyze(service: &IocScope, indicators: &[String]) -> anyhow::Result<ExitCode> {
    let mut documents = Vec::with_capacity(indicators.len());
    let mut unclassified = false;

    for raw in indicators {
        match service.analyze(raw).await {
            Ok(report) => documents.push(serde_json::to_value(&report)?),
            Err(ScopeError::Classification(err)) => {
                unclassified = true;
                tracing::warn!(error = %err, "indicator could not be classified");
                documents.push(serde_json::to_value(ClassificationFailure {
                    indicator: raw,
                    error: err.code(),
                    message: err.to_string(),
                })?);
            }
            Err(other) => return Err(other.into()),
        }
    }

    match documents.as_slice() {
        [single] => print_json(single)?,
        _ => print_json(&documents)?,
    }

    Ok(if unclassified {
        ExitCode::from(EXIT_UNCLASSIFIED)
    } else {
        ExitCode::SUCCESS
    })
}

async fn batch(service: &IocScope, file: Option<&Path>) -> anyhow::Result<ExitCode> {
    let input = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?,
    };
    let indicators = parse_batch_input(&input);

    let report = service.analyze_batch(indicators).await?;
    print_json(&report)?;

    Ok(if report.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_UNCLASSIFIED)
    })
}

fn init_config(explicit: Option<&Path>, force: bool) -> anyhow::Result<ExitCode> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(ScopeConfig::default_config_path);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    ScopeConfig::default().save_to_file(&path)?;
    tracing::info!(path = %path.display(), "wrote default configuration");
    print_json(&serde_json::json!({ "written": path }))?;
    Ok(ExitCode::SUCCESS)
}

/// One indicator per line; blank lines and `#` comments are skipped.
fn parse_batch_input(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_input_skips_blanks_and_comments() {
        let input = "# feed export\n8.8.8.8\n\n   \n  evil.example.com  \n#disabled.example\n";
        assert_eq!(parse_batch_input(input), ["8.8.8.8", "evil.example.com"]);
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["iocscope", "analyze", "8.8.8.8", "--json-logs"])
            .expect("parse");
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Command::Analyze { ref indicators } if indicators.len() == 1));
    }

    #[test]
    fn analyze_requires_an_indicator() {
        assert!(Cli::try_parse_from(["iocscope", "analyze"]).is_err());
    }

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").expect("write");

        assert!(init_config(Some(&path), false).is_err());
        assert!(init_config(Some(&path), true).is_ok());
        assert!(ScopeConfig::from_file(&path).is_ok());
    }
}
