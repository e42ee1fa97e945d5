//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

use agent_runtime::{ProviderConfig, ProviderKind};

#[derive(Debug, Parser)]
#[command(name = "litewiki", version, about = "Analyze a directory with an LLM agent and print a Markdown report")]
pub struct Cli {
    /// Directory to analyze (default: current directory)
    pub dir: Option<PathBuf>,

    /// Provider: openai, anthropic, google, custom (legacy names accepted)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model id (default depends on the provider)
    #[arg(long)]
    pub model: Option<String>,

    /// Full endpoint URL; Gemini URLs may contain `{model}`
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key (overrides LITEWIKI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Maximum reasoning iterations
    #[arg(long, default_value_t = agent_core::reasoning::DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// File whose content replaces the default system prompt and style lines
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,

    /// Extra prompt line; repeatable
    #[arg(long = "extension", value_name = "LINE")]
    pub extensions: Vec<String>,

    /// Previous report to update incrementally
    #[arg(long)]
    pub prior_report: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Layer the flags over the environment configuration
    pub fn apply(&self, mut config: ProviderConfig) -> ProviderConfig {
        if let Some(provider) = &self.provider {
            config.kind = ProviderKind::parse(provider);
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(url) = &self.base_url {
            config.base_url = Some(url.clone());
        }
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(secs) = self.timeout.filter(|s| *s > 0) {
            config.timeout = Some(std::time::Duration::from_secs(secs));
        }
        config
    }
}
