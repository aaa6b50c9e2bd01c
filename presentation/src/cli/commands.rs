//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for parley
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about = "Streaming terminal chat with DeepSeek, OpenAI and Anthropic models")]
#[command(long_about = r#"
Parley is a terminal chat client. Replies stream in as they are generated,
and every message is appended to a JSON Lines history file that is replayed
the next time you start.

Press Ctrl-C while a reply is streaming to stop it; the partial reply is kept.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./parley.toml       Project-level config
3. ~/.config/parley/config.toml   Global config

API keys are read from --api-key, the config file, or the provider's
environment variable (DEEPSEEK_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY).

Example:
  parley
  parley --model gpt-4o
  parley --provider anthropic --history ./notes.jsonl
"#)]
pub struct Cli {
    /// Provider to use: deepseek, openai or anthropic (inferred from the model if omitted)
    #[arg(short, long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model to chat with
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// API key (overrides config file and environment)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// History file to replay and append to
    #[arg(long, value_name = "PATH", conflicts_with = "no_history")]
    pub history: Option<PathBuf>,

    /// Keep this conversation in memory only
    #[arg(long)]
    pub no_history: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the progress spinner
    #[arg(short, long)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
