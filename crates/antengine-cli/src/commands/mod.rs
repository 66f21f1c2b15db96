//! CLI command definitions and dispatch.

pub mod apps;
pub mod config;
pub mod trigger;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use antengine_apps::manager::AppEngine;
use antengine_apps::registry::AppFactoryRegistry;
use antengine_core::config::AppConfig;
use antengine_core::error::AppError;
use antengine_settings::SettingsManager;
use app_test::TestAppFactory;

/// AntEngine: hook-driven app engine
#[derive(Debug, Parser)]
#[command(name = "antengine", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Engine verbosity (0-15), overrides the configuration
    #[arg(short, long)]
    pub verbosity: Option<u8>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// App management
    Apps(apps::AppsArgs),
    /// Fire a hook across the enabled apps
    Trigger(trigger::TriggerArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Apps(args) => apps::execute(args, self).await,
            Commands::Trigger(args) => trigger::execute(args, self).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: build an engine with every compiled-in app and activate the
/// enabled ones
pub async fn build_engine(cli: &Cli) -> Result<AppEngine, AppError> {
    let config = load_config(&cli.config)?;
    let settings = SettingsManager::new(&config.settings)?;

    let factories = Arc::new(AppFactoryRegistry::new());
    factories.register(Arc::new(TestAppFactory::new())).await?;

    let engine = AppEngine::new(config.engine, Arc::new(settings), factories);
    if let Some(level) = cli.verbosity {
        engine.set_verbosity(level).await;
    }
    engine.reload().await?;
    Ok(engine)
}
