mod app;
mod backend;
mod cli;
mod config;
mod consts;
mod error;
mod import;
mod output;
mod range;
mod refresh;
mod settings;
mod utils;

use clap::Parser;
use std::process::ExitCode;

use app::{CommandContext, run};
use cli::Cli;
use config::{Config, resolve_data_dir};
use error::AppError;
use utils::{Timezone, init_logging, parse_date};

fn main() -> ExitCode {
    let (config, load_report) = Config::load();
    let cli = Cli::parse().with_config(&config);

    init_logging(cli.debug);
    load_report.log();

    match execute(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli, config: &Config) -> Result<(), AppError> {
    let timezone = Timezone::parse(cli.timezone.as_deref())?;
    let today = match cli.today.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => timezone.today(),
    };
    let ctx = CommandContext {
        cli,
        config,
        data_dir: resolve_data_dir(cli.data_dir.as_deref(), config),
        timezone,
        today,
        today_pinned: cli.today.is_some(),
    };
    tracing::debug!(
        event = "dashboard.cli.context",
        data_dir = %ctx.data_dir.display(),
        today = %ctx.today,
    );
    run(cli.command.as_ref(), &ctx)
}
