//! Show and sources subcommands.

use crate::config::{REDACTED, ResolvedSettings, SourceChain};
use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};
use std::io::Write;

/// Arguments for the show subcommand
#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Print secret values instead of masking them
    #[arg(long)]
    pub reveal: bool,
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "(none)".to_string(),
        other => other.to_string(),
    }
}

/// Write resolved settings with the origin of each value.
pub fn run_show(settings: &ResolvedSettings, args: &ShowArgs, out: &mut impl Write) -> Result<()> {
    if args.json {
        let values = if args.reveal {
            settings.to_value()
        } else {
            settings.to_redacted_value()
        };
        let origins: serde_json::Map<String, Value> = settings
            .iter()
            .map(|f| (f.name.to_ascii_lowercase(), json!(f.origin.to_string())))
            .collect();
        let doc = json!({
            "schema": settings.schema_name(),
            "values": values,
            "origins": origins,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
        return Ok(());
    }

    let width = settings.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for field in settings.iter() {
        let value = if field.secret && !args.reveal && !field.value.is_null() {
            REDACTED.to_string()
        } else {
            display_value(&field.value)
        };
        writeln!(
            out,
            "{:width$} = {}  [{}]",
            field.name,
            value,
            field.origin,
            width = width
        )?;
    }
    Ok(())
}

/// Write the source chain, highest priority first.
pub fn run_sources(chain: &SourceChain, out: &mut impl Write) -> Result<()> {
    for (i, origin) in chain.origins().iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, origin)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvSnapshot, FieldSpec, Schema, SettingsLoader};
    use tempfile::TempDir;

    fn resolved(temp: &TempDir) -> ResolvedSettings {
        let schema = Schema::new("demo")
            .field(FieldSpec::string("name").default("demo"))
            .field(FieldSpec::string("token").secret())
            .field(FieldSpec::integer("workers").optional());
        SettingsLoader::new()
            .with_env([("TOKEN", "hunter2")].into_iter().collect::<EnvSnapshot>())
            .default_file(temp.path().join(".env"))
            .resolve(&schema)
            .unwrap()
    }

    #[test]
    fn test_show_masks_secrets() {
        let temp = TempDir::new().unwrap();
        let mut out = Vec::new();
        run_show(&resolved(&temp), &ShowArgs::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("name    = demo  [declared default]"));
        assert!(text.contains(&format!("token   = {}  [environment]", REDACTED)));
        assert!(text.contains("workers = (none)  [unset]"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_show_json_reveal() {
        let temp = TempDir::new().unwrap();
        let mut out = Vec::new();
        let args = ShowArgs {
            json: true,
            reveal: true,
        };
        run_show(&resolved(&temp), &args, &mut out).unwrap();
        let doc: Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(doc["schema"], "demo");
        assert_eq!(doc["values"]["token"], "hunter2");
        assert_eq!(doc["origins"]["token"], "environment");
        assert_eq!(doc["values"]["workers"], Value::Null);
    }

    #[test]
    fn test_sources_listing() {
        let temp = TempDir::new().unwrap();
        let env: EnvSnapshot = [("CONFIG_FILES", "base.env,local.env")].into_iter().collect();
        let chain = SettingsLoader::new()
            .with_env(env)
            .default_file(temp.path().join(".env"))
            .chain();

        let mut out = Vec::new();
        run_sources(&chain, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "1. explicit value");
        assert_eq!(lines[1], "2. environment");
        assert_eq!(lines[2], "3. config file local.env");
        assert_eq!(lines[3], "4. config file base.env");
        assert!(lines[4].starts_with("5. default file"));
    }
}
