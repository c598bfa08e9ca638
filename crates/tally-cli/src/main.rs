mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tally_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = commands::Context::new(config, cli.model)?;

    match cli.command {
        cli::Commands::Text { text } => commands::count::text(&ctx, text),
        cli::Commands::Messages {
            file,
            images,
            completion,
            json,
        } => commands::count::messages(&ctx, file, images, completion, json).await,
        cli::Commands::Image {
            width,
            height,
            detail,
        } => commands::image::handle(&ctx, width, height, detail),
        cli::Commands::Truncate { text, max_tokens } => {
            commands::truncate::handle(&ctx, text, max_tokens)
        }
    }
}
