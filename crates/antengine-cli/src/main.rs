//! AntEngine CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use antengine_core::config::{AppConfig, LoggingConfig};
use commands::Cli;

/// Exit status when an error requires the host to stop serving.
const EXIT_FATAL: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = AppConfig::load(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();
    init_tracing(&logging);

    if let Err(e) = cli.execute().await {
        output::print_error(&e.to_string());
        let code = if e.is_fatal() { EXIT_FATAL } else { 1 };
        std::process::exit(code);
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
