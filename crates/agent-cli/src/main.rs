//! litewiki
//!
//! Analyzes one directory with the tool-calling agent and prints the
//! Markdown report. Logs go to stderr so stdout carries only the report.

mod cli;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use agent_core::Agent;
use agent_runtime::{build_provider, ProviderConfig};
use repo_analyst::{standard_tools, DEFAULT_EXTENSIONS, DEFAULT_SYSTEM_PROMPT};

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("litewiki: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("   caused by: {cause}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = cli.apply(ProviderConfig::from_env());
    let provider = build_provider(&config)?;
    let model = config.model()?;

    let cwd = resolve_input_dir(cli.dir.as_deref()).await?;
    let (system_prompt, mut extensions) = match &cli.prompt_file {
        Some(path) => (read_text(path).await?, Vec::new()),
        None => (
            DEFAULT_SYSTEM_PROMPT.to_string(),
            DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
        ),
    };
    extensions.extend(cli.extensions.iter().cloned());

    let mut builder = Agent::builder()
        .provider(provider)
        .tools(standard_tools())
        .cwd(&cwd)
        .system_prompt(system_prompt)
        .extensions(extensions)
        .model(&model)
        .max_iterations(cli.max_iterations);
    if let Some(path) = &cli.prior_report {
        builder = builder.prior_report(read_text(path).await?);
    }
    let agent = builder.build()?;

    info!(provider = %config.kind, model = %model, dir = %cwd.display(), "analyzing");
    let report = match agent.run().await {
        Ok(report) => report,
        Err(e) => {
            let hint = e.user_message();
            return Err(anyhow::Error::new(e).context(hint));
        }
    };

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, &report)
                .await
                .with_context(|| format!("failed to write report to '{}'", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{report}"),
    }
    Ok(())
}

/// Absolute, existing directory to analyze; defaults to the current one
async fn resolve_input_dir(raw: Option<&Path>) -> Result<PathBuf> {
    let raw = raw.filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let abs = tokio::fs::canonicalize(raw)
        .await
        .with_context(|| format!("cannot access '{}'", raw.display()))?;
    if !tokio::fs::metadata(&abs).await?.is_dir() {
        bail!("Not a directory: {}", abs.display());
    }
    Ok(abs)
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))
}
