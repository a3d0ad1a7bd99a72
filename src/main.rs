// ABOUTME: Main entry point for the openab command-line front end
// ABOUTME: Initializes logging and .env, parses arguments and runs one command

use anyhow::Result;
use clap::Parser;
use openab::cli::{self, Cli};
use openab_core::Env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so stdout carries only replies and listings
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let mut stdout = std::io::stdout().lock();
    cli::execute(args.command, Env::from_process(), &mut stdout).await
}
