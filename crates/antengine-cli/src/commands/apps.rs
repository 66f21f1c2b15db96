//! App management CLI commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output;
use antengine_apps::manager::AppEngine;
use antengine_core::error::AppError;

use super::Cli;

/// Arguments for app commands
#[derive(Debug, Args)]
pub struct AppsArgs {
    /// App subcommand
    #[command(subcommand)]
    pub command: AppsCommand,
}

/// App subcommands
#[derive(Debug, Subcommand)]
pub enum AppsCommand {
    /// List discovered apps
    List,
    /// Enable a discovered app
    Enable {
        /// App name as declared in its manifest
        name: String,
    },
    /// Disable an app
    Disable {
        /// App name
        name: String,
    },
    /// Read a manifest field
    Meta {
        /// App name
        name: String,
        /// Field name (`name`, `description`, `version` or `custom`)
        field: String,
        /// Regular expression applied to the manifest for `custom`
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// List the actions a manifest declares
    Actions {
        /// App name
        name: String,
    },
}

/// One row of `apps list`
#[derive(Debug, Serialize, Tabled)]
struct AppRow {
    name: String,
    version: String,
    enabled: bool,
    status: String,
    path: String,
}

/// Execute app commands
pub async fn execute(args: &AppsArgs, cli: &Cli) -> Result<(), AppError> {
    let engine = super::build_engine(cli).await?;

    match &args.command {
        AppsCommand::List => {
            let available = engine.discover().await?;
            let enabled = engine.enabled_apps().await?;

            let mut rows = Vec::with_capacity(available.len());
            for (name, path) in &available {
                let version = engine
                    .app_meta(path, "version", None)?
                    .unwrap_or_default();
                let status = engine.app_status(name).await.unwrap_or("Available");
                rows.push(AppRow {
                    name: name.clone(),
                    version,
                    enabled: enabled.contains_key(name),
                    status: status.to_string(),
                    path: path.display().to_string(),
                });
            }

            output::print_rows(&rows, cli.format);
        }
        AppsCommand::Enable { name } => {
            let path = manifest_path(&engine, name).await?;
            if engine.enable_app(name, &path).await? {
                output::print_success(&format!("App '{name}' enabled"));
            } else {
                output::print_warning(&format!("App '{name}' was already enabled"));
            }
        }
        AppsCommand::Disable { name } => {
            if engine.disable_app(name).await? {
                output::print_success(&format!("App '{name}' disabled"));
            } else {
                output::print_warning(&format!("App '{name}' was not enabled"));
            }
        }
        AppsCommand::Meta {
            name,
            field,
            pattern,
        } => {
            let path = manifest_path(&engine, name).await?;
            match engine.app_meta(&path, field, pattern.as_deref())? {
                Some(value) => output::print_kv(field, &value),
                None => output::print_warning(&format!("Field '{field}' not found for '{name}'")),
            }
        }
        AppsCommand::Actions { name } => {
            let path = manifest_path(&engine, name).await?;
            let actions = engine.app_actions(&path)?;
            output::print_value(&serde_json::json!(actions), cli.format);
        }
    }

    Ok(())
}

async fn manifest_path(engine: &AppEngine, name: &str) -> Result<PathBuf, AppError> {
    engine
        .discover()
        .await?
        .remove(name)
        .ok_or_else(|| AppError::not_found(format!("App '{name}' not found under the app root")))
}
