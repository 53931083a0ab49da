//! Logging setup driven by environment variables.
//!
//! - `LOG_MODE`: `stdout` (default) or `file`
//! - `LOG_LEVEL`: `trace`, `debug`, `info` (default), `warn` or `error`
//! - `LOG_DATA_DIR`: directory for log files, default `logs/`
//! - `LOG_MAX_SIZE`: size in bytes after which a new file index is used, default 1 GiB

pub mod error;

use chrono::Utc;
use regex::Regex;
use std::{env, fs, path::Path, sync::LazyLock};
use tracing::{info, Subscriber};
use tracing_subscriber::{
	filter::EnvFilter,
	fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
	prelude::*,
	registry::LookupSpan,
};

const DEFAULT_LOG_DIR: &str = "logs/";
const DEFAULT_MAX_SIZE: u64 = 1_073_741_824;
const LOG_FILE_NAME: &str = "scanner.log";

static ANSI_ESCAPE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").ok());

/// Where log events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
	Stdout,
	File,
}

/// Logging settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	pub mode: LogMode,
	pub level: tracing::Level,
	pub data_dir: String,
	pub max_size: u64,
}

impl LoggingConfig {
	/// Reads the `LOG_*` variables. An unparsable `LOG_MAX_SIZE` is an error.
	pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
		let mode = match env::var("LOG_MODE")
			.unwrap_or_default()
			.to_lowercase()
			.as_str()
		{
			"file" => LogMode::File,
			_ => LogMode::Stdout,
		};

		let level = match env::var("LOG_LEVEL")
			.unwrap_or_default()
			.to_lowercase()
			.as_str()
		{
			"trace" => tracing::Level::TRACE,
			"debug" => tracing::Level::DEBUG,
			"warn" => tracing::Level::WARN,
			"error" => tracing::Level::ERROR,
			_ => tracing::Level::INFO,
		};

		let data_dir = env::var("LOG_DATA_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());

		let max_size = match env::var("LOG_MAX_SIZE") {
			Ok(raw) => raw
				.parse::<u64>()
				.map_err(|e| format!("LOG_MAX_SIZE must be a valid u64 if set: {}", e))?,
			Err(_) => DEFAULT_MAX_SIZE,
		};

		Ok(Self {
			mode,
			level,
			data_dir,
			max_size,
		})
	}
}

/// Wraps a formatter and removes colour codes before writing to a file.
struct StripAnsiFormatter<T> {
	inner: T,
}

impl<S, N, T> FormatEvent<S, N> for StripAnsiFormatter<T>
where
	S: Subscriber + for<'a> LookupSpan<'a>,
	N: for<'a> FormatFields<'a> + 'static,
	T: FormatEvent<S, N>,
{
	fn format_event(
		&self,
		ctx: &FmtContext<'_, S, N>,
		mut writer: Writer<'_>,
		event: &tracing::Event<'_>,
	) -> std::fmt::Result {
		let mut buf = String::new();
		self.inner.format_event(ctx, Writer::new(&mut buf), event)?;
		write!(writer, "{}", strip_ansi_escapes(&buf))
	}
}

fn strip_ansi_escapes(s: &str) -> String {
	match ANSI_ESCAPE.as_ref() {
		Some(re) => re.replace_all(s, "").into_owned(),
		None => s.to_string(),
	}
}

/// `logs/scanner.log` + `2024-01-01` + 2 -> `logs/scanner-2024-01-01.2.log`
pub fn compute_rolled_file_path(base_file_path: &str, date_str: &str, index: u32) -> String {
	let stem = base_file_path
		.strip_suffix(".log")
		.unwrap_or(base_file_path);
	format!("{}-{}.{}.log", stem, date_str, index)
}

/// Returns the first indexed path for `date_str` whose file is absent or below `max_size`.
pub fn space_based_rolling(base_file_path: &str, date_str: &str, max_size: u64) -> String {
	let mut index = 1;
	let mut path = compute_rolled_file_path(base_file_path, date_str, index);
	while let Ok(meta) = fs::metadata(&path) {
		if meta.len() <= max_size {
			break;
		}
		index += 1;
		path = compute_rolled_file_path(base_file_path, date_str, index);
	}
	path
}

fn log_format(with_ansi: bool) -> fmt::format::Format<fmt::format::Compact> {
	fmt::format()
		.with_level(true)
		.with_target(true)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_ansi(with_ansi)
		.compact()
}

/// Installs the global subscriber according to `LoggingConfig::from_env`.
pub fn setup_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let config = LoggingConfig::from_env()?;
	let subscriber =
		tracing_subscriber::registry().with(EnvFilter::new(config.level.to_string()));

	match config.mode {
		LogMode::File => {
			let log_dir = format!("{}/", config.data_dir.trim_end_matches('/'));
			fs::create_dir_all(&log_dir)?;

			let base_file_path = format!("{}{}", log_dir, LOG_FILE_NAME);
			let date_str = Utc::now().format("%Y-%m-%d").to_string();
			let final_path = space_based_rolling(&base_file_path, &date_str, config.max_size);

			let path = Path::new(&final_path);
			let appender = tracing_appender::rolling::never(
				path.parent().unwrap_or(Path::new(".")),
				path.file_name().unwrap_or_default(),
			);

			subscriber
				.with(
					fmt::layer()
						.event_format(StripAnsiFormatter {
							inner: log_format(false),
						})
						.with_writer(appender),
				)
				.try_init()?;
			info!(path = %final_path, "Logging to file");
		}
		LogMode::Stdout => {
			subscriber
				.with(fmt::layer().event_format(log_format(true)))
				.try_init()?;
		}
	}

	info!(level = %config.level, mode = ?config.mode, "Logging configured");
	Ok(())
}
