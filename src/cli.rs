//! Command-line interface definitions for News Digest.
//!
//! Every option can be given as a flag; mail credentials and recipients are
//! normally supplied through the environment (or a `.env` file).

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the News Digest application.
///
/// # Examples
///
/// ```sh
/// # Process every source in ./configs with the default history file
/// news_digest
///
/// # A single source, custom paths, faster pacing for a local model
/// news_digest -c ./sources -H /var/lib/news_digest/history.txt \
///     --source "Commercial Times" --rate-limit-secs 2
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory containing one YAML file per news source
    #[arg(short, long, default_value = "configs")]
    pub config_dir: PathBuf,

    /// File recording the URLs already delivered
    #[arg(short = 'H', long, default_value = "history.txt")]
    pub history_file: PathBuf,

    /// Only run sources with these display names (repeatable)
    #[arg(short, long = "source")]
    pub sources: Vec<String>,

    /// Path to the awful_aj config.yaml (defaults to awful_aj's config dir)
    #[arg(long, env = "AJ_CONFIG")]
    pub aj_config: Option<PathBuf>,

    /// Name of the awful_aj chat template used for summaries
    #[arg(long, env = "AJ_TEMPLATE", default_value = "news_digest")]
    pub template: String,

    /// Seconds to wait between two summarizer calls
    #[arg(long, default_value_t = crate::enrich::RATE_LIMIT_DELAY.as_secs())]
    pub rate_limit_secs: u64,

    /// HTTP timeout for page fetches, in seconds
    #[arg(long, default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Accept invalid TLS certificates when fetching pages
    #[arg(long)]
    pub insecure: bool,

    /// SMTP relay host (implicit TLS)
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP relay port
    #[arg(long, env = "SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,

    /// Sender account, also used as SMTP login
    #[arg(long, env = "GMAIL_USER")]
    pub smtp_user: String,

    /// SMTP password (app password for Gmail)
    #[arg(long, env = "GMAIL_APP_PASSWORD", hide_env_values = true)]
    pub smtp_password: String,

    /// Comma-separated recipient addresses, sent as BCC
    #[arg(long, env = "TARGET_EMAIL", default_value = "")]
    pub recipients: String,
}
