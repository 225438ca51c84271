//! Check subcommand: open the stores described by the settings and ping them.

use crate::context::AppContext;
use crate::settings::AppSettings;
use anyhow::{Result, bail};
use clap::Args;
use std::io::Write;

/// Arguments for the check subcommand
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// SQL file with table definitions, applied when debug is enabled
    #[arg(long, value_name = "FILE")]
    pub schema: Option<std::path::PathBuf>,
}

/// Connect, ping both stores, report and close. Fails if either ping fails.
pub fn run_check(settings: &AppSettings, args: &CheckArgs, out: &mut impl Write) -> Result<()> {
    let ddl = match args.schema {
        Some(ref path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    let models: Vec<&str> = ddl.as_deref().into_iter().collect();

    let ctx = AppContext::initialize(settings, &models)?;
    let kv_ok = ctx.ping_kv();
    let db_ok = ctx.ping_db();
    writeln!(out, "key-value store: {}", if kv_ok { "ok" } else { "unreachable" })?;
    writeln!(out, "database: {}", if db_ok { "ok" } else { "unreachable" })?;
    ctx.close()?;

    if !(kv_ok && db_ok) {
        bail!("store check failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvSnapshot, SettingsLoader};
    use tempfile::TempDir;

    #[test]
    fn test_check_in_memory_stores() {
        let temp = TempDir::new().unwrap();
        let schema = temp.path().join("schema.sql");
        std::fs::write(&schema, "CREATE TABLE items (id INTEGER PRIMARY KEY);").unwrap();

        let env: EnvSnapshot = [
            ("SECRET_KEY", "k"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("KV_URL", "memory://"),
            ("DEBUG", "1"),
        ]
        .into_iter()
        .collect();
        let settings: AppSettings = SettingsLoader::new()
            .with_env(env)
            .default_file(temp.path().join(".env"))
            .load()
            .unwrap();

        let mut out = Vec::new();
        let args = CheckArgs {
            schema: Some(schema),
        };
        run_check(&settings, &args, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("key-value store: ok"));
        assert!(text.contains("database: ok"));
    }
}
