//! Hook trigger CLI command.

use clap::Args;
use serde_json::Value;
use uuid::Uuid;

use crate::output;
use antengine_apps::hooks::definitions::DispatchContext;
use antengine_core::error::AppError;
use antengine_core::types::{CurrentUser, RequestInfo, Role};

use super::Cli;

/// Arguments for the trigger command
#[derive(Debug, Args)]
pub struct TriggerArgs {
    /// Hook name
    pub hook: String,

    /// Request URI used for URI filtering
    #[arg(long, default_value = "/")]
    pub uri: String,

    /// GET variable as key=value (repeatable)
    #[arg(long = "get", value_parser = parse_pair)]
    pub get_vars: Vec<(String, String)>,

    /// POST variable as key=value (repeatable)
    #[arg(long = "post", value_parser = parse_pair)]
    pub post_vars: Vec<(String, String)>,

    /// Caller arguments as a JSON document
    #[arg(long)]
    pub args: Option<String>,

    /// Username of the current user
    #[arg(long)]
    pub user: Option<String>,

    /// Give the current user the administrator role
    #[arg(long, requires = "user")]
    pub admin: bool,
}

/// Execute the trigger command
pub async fn execute(args: &TriggerArgs, cli: &Cli) -> Result<(), AppError> {
    let engine = super::build_engine(cli).await?;

    let mut request = RequestInfo::new(&args.uri);
    for (name, value) in &args.get_vars {
        request = request.with_get(name, value);
    }
    for (name, value) in &args.post_vars {
        request = request.with_post(name, value);
    }

    let mut ctx = DispatchContext::new(request);
    if let Some(raw) = &args.args {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|e| AppError::validation(format!("--args is not valid JSON: {e}")))?;
        ctx = ctx.with_args(parsed);
    }
    if let Some(username) = &args.user {
        let role = if args.admin { Role::Administrator } else { Role::User };
        ctx = ctx.with_user(CurrentUser::new(Uuid::new_v4(), username, role));
    }

    let result = engine.trigger(&args.hook, &ctx).await?;
    output::print_value(&Value::Object(result), cli.format);

    output::print_journal(&engine.logs().await, cli.format);

    Ok(())
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("mode=a=b").unwrap(),
            ("mode".to_string(), "a=b".to_string())
        );
        assert!(parse_pair("novalue").is_err());
    }
}
