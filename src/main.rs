//! wotc executable entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wotc::cli::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = cli.execute() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
