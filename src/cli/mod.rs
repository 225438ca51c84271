//! CLI command definitions for backend-settings
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod check;
pub mod show;

use crate::config::SettingsLoader;
use clap::{Parser, Subcommand};
use check::CheckArgs;
use show::ShowArgs;
use std::path::PathBuf;

/// Inspect and verify layered application settings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Default dotenv file, consulted after the CONFIG_FILES list
    #[arg(long, value_name = "FILE", global = true)]
    pub env_file: Option<PathBuf>,

    /// Directory with one file per secret field (lowest priority)
    #[arg(long, value_name = "DIR", global = true)]
    pub secrets_dir: Option<PathBuf>,

    /// Prefix expected on environment variable names
    #[arg(long, value_name = "PREFIX", global = true)]
    pub env_prefix: Option<String>,

    /// Explicit override with the highest priority (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment, global = true)]
    pub overrides: Vec<(String, String)>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print resolved settings and where each value came from (default)
    Show(ShowArgs),

    /// List the configuration sources in priority order
    Sources,

    /// Connect to the configured stores and ping them
    Check(CheckArgs),
}

impl Cli {
    /// Loader reading the process environment, with CLI overrides applied.
    pub fn loader(&self) -> SettingsLoader {
        let mut loader = SettingsLoader::new();
        if let Some(ref path) = self.env_file {
            loader = loader.default_file(path);
        }
        if let Some(ref dir) = self.secrets_dir {
            loader = loader.secrets_dir(dir);
        }
        if let Some(ref prefix) = self.env_prefix {
            loader = loader.env_prefix(prefix);
        }
        loader.set_all(self.overrides.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Parse a `KEY=VALUE` pair. The value may itself contain `=`.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
