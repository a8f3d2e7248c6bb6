mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Args, Commands};
use idol_trainee::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::new(args.data_dir)?.with_api_url_override(args.api_url);

    match args.command {
        Commands::Onboard { answers } => cli::handle_onboard(&config, answers).await,
        Commands::Chat { message, offline, no_stream } => {
            cli::handle_chat(&config, message, offline, no_stream).await
        }
        Commands::Status => cli::handle_status(&config).await,
        Commands::Report => cli::handle_report(&config).await,
        Commands::Card { name } => cli::handle_card(&config, name).await,
        Commands::Adjust { bond, kindness, confidence } => {
            cli::handle_adjust(&config, bond, kindness, confidence).await
        }
        Commands::Health => cli::handle_health(&config).await,
        Commands::Reset { yes } => cli::handle_reset(&config, yes).await,
    }
}
