use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "transcriptor",
    about = "Transcript Scraper - Fetch YouTube caption transcripts without an API key",
    version,
    long_about = "Fetches the caption transcript of YouTube videos the way a browser does: it scrapes a session key from the watch page, lists the caption tracks through the internal player API and decodes the selected track."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators and informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the transcript of one or more videos
    Transcript {
        /// Video IDs or YouTube URLs
        #[arg(value_name = "VIDEO", required = true)]
        videos: Vec<String>,

        /// Comma-separated language codes in order of preference (e.g. "en,es")
        #[arg(short, long, value_name = "LANGS")]
        languages: Option<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Include timestamps in text output (srt/vtt formats always include timestamps)
        #[arg(long)]
        timestamps: bool,

        /// Keep going when a video fails and report the error in its place
        #[arg(long)]
        continue_on_error: bool,

        /// Number of videos fetched at the same time
        #[arg(short, long, value_name = "COUNT")]
        jobs: Option<usize>,

        #[command(flatten)]
        network: NetworkArgs,
    },

    /// List the caption languages available for a video
    Languages {
        /// Video ID or YouTube URL
        #[arg(value_name = "VIDEO")]
        video: String,

        /// Also show track names and whether they are auto-generated
        #[arg(short, long)]
        detailed: bool,

        #[command(flatten)]
        network: NetworkArgs,
    },

    /// Show or write the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

/// Flags that override the `http` and `innertube` config sections
#[derive(Args, Debug, Clone, Default)]
pub struct NetworkArgs {
    /// Forward proxy for every request (http://, https://, socks5://, socks5h://)
    #[arg(long, env = "TRANSCRIPTOR_PROXY", value_name = "URL")]
    pub proxy: Option<String>,

    /// Web client version sent to the player endpoint
    #[arg(long, env = "TRANSCRIPTOR_CLIENT_VERSION", value_name = "VERSION")]
    pub client_version: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with snippets
    Json,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
