//! Logger
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`).
//! An optional log file receives a second, more verbose, stream
//! filtered by `RUST_LOG_FILE` (default `debug`).

// Imports
use {
	std::{
		fs,
		io,
		path::Path,
		sync::Mutex,
	},
	tracing::metadata::LevelFilter,
	tracing_subscriber::{fmt, prelude::*, EnvFilter},
};

/// Messages logged before the logger is initialized
pub mod pre_init {
	// Imports
	use std::sync::{Mutex, PoisonError};

	/// Pending message level
	#[derive(Clone, Copy, Debug)]
	enum Level {
		Debug,
		Warn,
	}

	/// Pending messages
	static PENDING: Mutex<Vec<(Level, String)>> = Mutex::new(vec![]);

	/// Queues a debug message
	pub fn debug(msg: impl Into<String>) {
		self::push(Level::Debug, msg.into());
	}

	/// Queues a warning message
	pub fn warn(msg: impl Into<String>) {
		self::push(Level::Warn, msg.into());
	}

	fn push(level: Level, msg: String) {
		PENDING.lock().unwrap_or_else(PoisonError::into_inner).push((level, msg));
	}

	/// Emits all pending messages through `tracing`
	pub(super) fn flush() {
		let pending = std::mem::take(&mut *PENDING.lock().unwrap_or_else(PoisonError::into_inner));
		for (level, msg) in pending {
			match level {
				Level::Debug => tracing::debug!(target: "madvbench::pre_init", "{msg}"),
				Level::Warn => tracing::warn!(target: "madvbench::pre_init", "{msg}"),
			}
		}
	}
}

/// Initializes the global logger.
///
/// If a global subscriber was already installed, it's kept and only a warning is emitted.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let term_layer = fmt::layer().with_writer(io::stderr).with_filter(
		EnvFilter::builder()
			.with_default_directive(LevelFilter::INFO.into())
			.from_env_lossy(),
	);

	let file_layer = log_file
		.and_then(|path| match self::open_log_file(path, log_file_append) {
			Ok(file) => Some(file),
			Err(err) => {
				pre_init::warn(format!("Unable to open log file {path:?}: {err}"));
				None
			},
		})
		.map(|file| {
			fmt::layer().with_ansi(false).with_writer(Mutex::new(file)).with_filter(
				EnvFilter::builder()
					.with_env_var("RUST_LOG_FILE")
					.with_default_directive(LevelFilter::DEBUG.into())
					.from_env_lossy(),
			)
		});

	let res = tracing_subscriber::registry().with(term_layer).with(file_layer).try_init();
	pre_init::flush();
	if let Err(err) = res {
		tracing::warn!(?err, "Logger was already initialized");
	}
}

/// Opens the log file, truncating it unless `append` is set
fn open_log_file(path: &Path, append: bool) -> Result<fs::File, io::Error> {
	fs::OpenOptions::new()
		.create(true)
		.write(true)
		.append(append)
		.truncate(!append)
		.open(path)
}
