//! Chain scanner entry point.
//!
//! Loads a scanner configuration, starts the scan service and stops it cleanly
//! on Ctrl+C. With `--validate` the configuration is only checked.

use chain_scanner::{
	bootstrap::{create_rules, create_scan_service, http_config, load_config, Result},
	utils::logging::setup_logging,
};

use clap::{Arg, Command};
use dotenvy::dotenv;
use std::{
	env::{set_var, var},
	path::PathBuf,
};
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config/scanner.json";

#[tokio::main]
async fn main() -> Result<()> {
	let matches = Command::new("chain-scanner")
		.version(env!("CARGO_PKG_VERSION"))
		.about(
			"Polls a blockchain block by block and runs monitoring rules against every \
			 transaction.",
		)
		.arg(
			Arg::new("config")
				.long("config")
				.help("Path to the scanner configuration file")
				.value_name("PATH")
				.default_value(DEFAULT_CONFIG_PATH),
		)
		.arg(
			Arg::new("log-file")
				.long("log-file")
				.help("Write logs to file instead of stdout")
				.action(clap::ArgAction::SetTrue),
		)
		.arg(
			Arg::new("log-level")
				.long("log-level")
				.help("Set log level (trace, debug, info, warn, error)")
				.value_name("LEVEL"),
		)
		.arg(
			Arg::new("log-path")
				.long("log-path")
				.help("Path to store log files (default: logs/)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("log-max-size")
				.long("log-max-size")
				.help("Maximum log file size in bytes before rolling (default: 1GB)")
				.value_name("BYTES"),
		)
		.arg(
			Arg::new("validate")
				.long("validate")
				.help("Validate the configuration and exit")
				.action(clap::ArgAction::SetTrue),
		)
		.get_matches();

	dotenv().ok();

	// CLI options never override variables that are already set
	if matches.get_flag("log-file") && var("LOG_MODE").is_err() {
		set_var("LOG_MODE", "file");
	}
	for (arg, env_key) in [
		("log-level", "LOG_LEVEL"),
		("log-path", "LOG_DATA_DIR"),
		("log-max-size", "LOG_MAX_SIZE"),
	] {
		if let Some(value) = matches.get_one::<String>(arg) {
			if var(env_key).is_err() {
				set_var(env_key, value);
			}
		}
	}

	setup_logging().unwrap_or_else(|e| {
		eprintln!("Failed to setup logging: {}", e);
	});

	let config_path = matches
		.get_one::<String>("config")
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
	let config = load_config(&config_path)?;

	if matches.get_flag("validate") {
		create_rules(&config, &http_config(&config))?;
		info!(path = %config_path.display(), "Configuration is valid");
		return Ok(());
	}

	let mut service = create_scan_service(&config)?;
	service.start().await?;

	info!("Scanner started. Press Ctrl+C to shutdown");
	if let Err(e) = tokio::signal::ctrl_c().await {
		error!("Error waiting for Ctrl+C: {}", e);
	}
	info!("Shutdown signal received, stopping scanner...");

	if let Err(e) = service.stop().await {
		error!("Error during shutdown: {}", e);
	}
	info!("Shutdown complete");
	Ok(())
}
