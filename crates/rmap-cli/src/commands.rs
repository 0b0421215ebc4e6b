use std::collections::BTreeMap;

use anyhow::{bail, Context};
use colored::Colorize;
use rmap_engine::{HashStore, Mapper, StoreConfig, CLASS_KEY};
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = effective_config(&cli)?;
    let format = cli.format;
    let output = match cli.command {
        Command::Config => cmd_config(&config, format)?,
        Command::Keys(args) => cmd_keys(&mut connect(&config)?, &args.pattern, format)?,
        Command::Show(args) => cmd_show(&mut connect(&config)?, &args.key, format)?,
        Command::Delete(args) => cmd_delete(&mut connect(&config)?, &args.key, format)?,
    };
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Defaults, then the config file, then command-line flags.
pub fn effective_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.database = db;
    }
    Ok(config)
}

fn connect(config: &StoreConfig) -> anyhow::Result<Mapper<rmap_engine::RedisHashStore>> {
    tracing::debug!(url = %config.url(), "connecting");
    Mapper::open(config).with_context(|| format!("cannot connect to {}", config.url()))
}

fn cmd_config(config: &StoreConfig, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Text => config.to_toml_string()?.trim_end().to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
    })
}

fn cmd_keys<S: HashStore>(
    mapper: &mut Mapper<S>,
    pattern: &str,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let keys = mapper.list_keys(pattern)?;
    Ok(match format {
        OutputFormat::Text => keys.into_iter().collect::<Vec<_>>().join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(&keys)?,
    })
}

#[derive(Serialize)]
struct RecordView<'a> {
    key: &'a str,
    class: Option<&'a str>,
    fields: BTreeMap<&'a str, &'a str>,
}

fn cmd_show<S: HashStore>(
    mapper: &mut Mapper<S>,
    key: &str,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let record = mapper.store_mut().hgetall(key)?;
    if record.is_empty() {
        bail!("no record at key {key}");
    }
    let view = RecordView {
        key,
        class: record.get(CLASS_KEY).map(String::as_str),
        fields: record
            .iter()
            .filter(|(field, _)| field.as_str() != CLASS_KEY)
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect(),
    };

    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&view)?);
    }
    let mut lines = vec![format!(
        "{} = {}",
        CLASS_KEY.dimmed(),
        view.class.unwrap_or("(none)").cyan()
    )];
    for (field, value) in &view.fields {
        lines.push(format!("{} = {}", field.bold(), value));
    }
    Ok(lines.join("\n"))
}

fn cmd_delete<S: HashStore>(
    mapper: &mut Mapper<S>,
    key: &str,
    format: OutputFormat,
) -> anyhow::Result<String> {
    if !mapper.delete_key(key)? {
        bail!("no record at key {key}");
    }
    Ok(match format {
        OutputFormat::Text => format!("{} Deleted {}", "✓".green(), key.yellow()),
        OutputFormat::Json => serde_json::json!({ "deleted": key }).to_string(),
    })
}
