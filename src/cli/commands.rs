use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idol")]
#[command(about = "Raise a virtual idol trainee through conversation")]
#[command(version)]
pub struct Args {
    /// Data directory for config and saved state
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Chat backend base URL (overrides config and IDOL_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer the trainee quiz to set the starting stats
    Onboard {
        /// Scripted answers, one zero-based option index per question
        #[arg(long, value_delimiter = ',')]
        answers: Option<Vec<usize>>,
    },
    /// Talk to the trainee
    Chat {
        /// Send a single message instead of starting a conversation
        #[arg(short, long)]
        message: Option<String>,
        /// Skip the backend and use the offline responder
        #[arg(long)]
        offline: bool,
        /// Ask for whole replies instead of a stream
        #[arg(long)]
        no_stream: bool,
    },
    /// Show current stats and persona
    Status,
    /// Show stat history and persona changes
    Report,
    /// Print the debut card
    Card {
        /// Name printed on the card
        #[arg(long)]
        name: Option<String>,
    },
    /// Nudge stats by hand
    Adjust {
        #[arg(long, allow_hyphen_values = true)]
        bond: Option<i32>,
        #[arg(long, allow_hyphen_values = true)]
        kindness: Option<i32>,
        #[arg(long, allow_hyphen_values = true)]
        confidence: Option<i32>,
    },
    /// Check whether the chat backend is reachable
    Health,
    /// Erase all saved progress
    Reset {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}
