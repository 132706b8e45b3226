//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig, CONFIG_NAMES, ENV_WEBHOOK_SECRET};
use crate::context::{find_config_path, Context};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Get { key } => get_config(&key, ctx),
        ConfigCommand::Set { key, value } => set_config(&key, &value, ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    if let Some(path) = find_config_path(&ctx.cwd) {
        ctx.output.debug(&format!("file: {}", path.display()));
    }

    ctx.output.info("[backend]");
    ctx.output.kv("url", &ctx.config.backend.url);

    ctx.output.info("[site]");
    ctx.output.kv("origin", &ctx.config.site.origin);

    ctx.output.info("[storage]");
    ctx.output.kv("dir", &ctx.config.storage_dir().display().to_string());

    ctx.output.info("[webhook]");
    ctx.output.kv("tolerance_secs", &ctx.config.webhook.tolerance_secs.to_string());
    let secret = if ctx.config.webhook.secret.is_some() {
        "set"
    } else {
        "not set"
    };
    ctx.output.kv("secret", secret);

    Ok(())
}

fn get_config(key: &str, ctx: &Context) -> Result<()> {
    let value = ctx.config.get(key)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

fn set_config(key: &str, value: &str, ctx: &Context) -> Result<()> {
    let Some(path) = find_config_path(&ctx.cwd) else {
        bail!("No config file found. Run `shop config init` to create one.");
    };
    let path = path.to_string_lossy().to_string();

    // Reload from disk so environment overrides are not written back
    let mut config = CliConfig::load(&path)?;
    config.set(key, value)?;
    config.save(&path)?;

    ctx.output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));
    ctx.output.info(&format!(
        "Set {} in the environment or a .env file to verify webhooks.",
        ENV_WEBHOOK_SECRET
    ));
    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let errors = ctx.config.validate();
    let mut warnings: Vec<String> = Vec::new();

    if ctx.config.webhook.secret.is_none() {
        warnings.push(format!("{} is not set; webhook verify will need --secret", ENV_WEBHOOK_SECRET));
    }
    if ctx.config.webhook.tolerance().is_none() {
        warnings.push("webhook.tolerance_secs is 0; signature age is not checked".to_string());
    }

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }
    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");
    Ok(())
}
