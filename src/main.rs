// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! campaign-tag-sync CLI
//!
//! Syncs Klaviyo campaign tags into a warehouse table

use campaign_tag_sync::cli::{Cli, Runner};
use campaign_tag_sync::config::load_dotenv;
use clap::Parser;

#[tokio::main]
async fn main() {
    let dotenv_file = load_dotenv();
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Some(path) = dotenv_file {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
