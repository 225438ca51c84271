//! backend-settings
//!
//! Resolves the application settings from explicit overrides, the
//! environment, cascading dotenv files and a secrets directory, then prints
//! or verifies them.

use anyhow::{Context, Result};
use backend_settings::cli::check::run_check;
use backend_settings::cli::show::{ShowArgs, run_show, run_sources};
use backend_settings::cli::{Cli, Command};
use backend_settings::config::{Settings, SettingsLoader};
use backend_settings::logging::{LogTarget, init_logging};
use backend_settings::settings::AppSettings;
use clap::Parser;
use std::io::Write;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let target: LogTarget = cli.log.parse()?;
    init_logging(&target, cli.verbose).context("failed to initialize logging")?;

    let loader = cli.loader();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Some(Command::Sources) => run_sources(&loader.chain(), &mut stdout),
        Some(Command::Check(ref args)) => {
            let settings: AppSettings = loader.load().context("failed to load settings")?;
            debug!(environment = %settings.environment, "Settings loaded");
            run_check(&settings, args, &mut stdout)
        }
        Some(Command::Show(ref args)) => show(&loader, args, &mut stdout),
        None => show(&loader, &ShowArgs::default(), &mut stdout),
    }
}

fn show(loader: &SettingsLoader, args: &ShowArgs, out: &mut impl Write) -> Result<()> {
    let resolved = loader
        .resolve(&AppSettings::schema())
        .context("failed to load settings")?;
    run_show(&resolved, args, out)
}
