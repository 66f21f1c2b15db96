//! Configuration CLI commands.

use std::path::Path;

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use antengine_core::config::AppConfig;
use antengine_core::error::AppError;
use antengine_settings::SettingsManager;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the merged configuration
    Show,
    /// Check that the configuration can drive the engine
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path).inspect_err(|e| {
        output::print_error(&format!("Configuration '{config_path}' cannot be loaded: {e}"));
    })?;

    match &args.command {
        ConfigCommand::Show => output::print_value(&serde_json::to_value(&config)?, format),
        ConfigCommand::Validate => validate(&config, config_path)?,
    }

    Ok(())
}

fn validate(config: &AppConfig, config_path: &str) -> Result<(), AppError> {
    SettingsManager::new(&config.settings)?;

    if config.engine.verbosity > 15 {
        return Err(AppError::validation(format!(
            "engine.verbosity must be between 0 and 15, got {}",
            config.engine.verbosity
        )));
    }

    output::print_success(&format!("Configuration '{config_path}' is valid"));
    output::print_kv("App root", &config.engine.app_root);
    output::print_kv("Enabled apps key", &config.engine.enabled_apps_key);
    output::print_kv("Settings", &format!("{} ({})", config.settings.provider, config.settings.path));
    output::print_kv("Log level", &config.logging.level);

    if !Path::new(&config.engine.app_root).is_dir() {
        output::print_warning("App root does not exist yet; no app will be discovered");
    }
    Ok(())
}
