use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Token accounting for chat-style LLM requests", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Model id (overrides `default_model` from config)
    #[arg(long, global = true, env = "TALLY_MODEL")]
    pub model: Option<String>,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count tokens in a piece of text
    Text {
        /// Text to count (read from stdin when omitted)
        text: Option<String>,
    },

    /// Count prompt tokens for a JSON array of chat messages
    Messages {
        /// Path to the messages file (`-` for stdin)
        file: PathBuf,

        /// Known image size, as URL=WIDTHxHEIGHT (repeatable)
        #[arg(long = "image", value_name = "URL=WxH")]
        images: Vec<String>,

        /// Completion text; prints a usage block instead of the prompt breakdown
        #[arg(long)]
        completion: Option<String>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate the token cost of an inline image
    Image {
        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// low, high, or auto (default from config)
        #[arg(long)]
        detail: Option<String>,
    },

    /// Clip text to a token budget
    Truncate {
        /// Text to clip (read from stdin when omitted)
        text: Option<String>,

        /// Token budget (default from config)
        #[arg(long)]
        max_tokens: Option<usize>,
    },
}
