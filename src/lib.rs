pub mod cli;
pub mod core;

use crate::cli::report::ReportRequest;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Report(ReportRequest),
}

pub fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Tallybook starting...");

    let config = match config_path {
        Some(path) => crate::core::config::AppConfig::load_from_path(path)?,
        None => crate::core::config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Report(request) => cli::report::run(&config, &request),
    }
}
