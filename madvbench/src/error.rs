//! Errors
//!
//! Failures are split into two families, which decide the process exit code:
//! [`ValidationError`]s (bad input, exit code `2`) and [`OsError`]s (the
//! operating system refused a required operation, exit code `1`).
//! Advisory failures are never errors, they're only logged.

// Imports
use std::io;

/// Validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
	#[error("Size ratio must be a positive, finite, number, found {0:?}")]
	SizeRatio(String),

	#[error("Pattern must be `seq`, `rand` or `stride:<N>`, found {0:?}")]
	Pattern(String),

	#[error("Invalid stride {0:?}, expected a non-negative integer number of pages")]
	Stride(String),

	#[error("Advice must be `none`, `seq` or `rand`, found {0:?}")]
	Advice(String),

	#[error("Temperature must be `hot`, `cold` or `none`, found {0:?}")]
	Temperature(String),

	#[error("Repeat count must be at least 1")]
	ZeroRepeat,

	#[error("Hot runs discard their first trial as a warm-up, so `--repeat` must be at least 2")]
	HotWarmUpOnly,

	#[error("File is empty")]
	EmptyFile,

	#[error(
		"Mapping length is zero (ratio {size_ratio} of {ram_limit} bytes, file of {file_size} bytes, page size \
		 {page_size})"
	)]
	ZeroMapLen {
		size_ratio: f64,
		ram_limit:  u64,
		file_size:  u64,
		page_size:  u64,
	},
}

/// Operating system error on a required operation
#[derive(Debug, thiserror::Error)]
#[error("Unable to {op}")]
pub struct OsError {
	/// Operation that failed
	pub op: &'static str,

	/// Underlying error
	#[source]
	pub source: io::Error,
}

impl OsError {
	/// Creates an os error from the last `errno`
	pub fn last(op: &'static str) -> Self {
		Self {
			op,
			source: io::Error::last_os_error(),
		}
	}

	/// Returns a closure that wraps an `io::Error` for `op`
	pub fn with_op(op: &'static str) -> impl FnOnce(io::Error) -> Self {
		move |source| Self { op, source }
	}
}

/// Ram limit probe error
#[derive(Debug, thiserror::Error)]
#[error("Unable to determine available memory: neither the cgroup limit nor the physical memory size are known")]
pub struct ProbeError;

/// Exit code for an error chain
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ExitKind {
	/// Operating system failure
	Os,

	/// Validation failure
	Validation,
}

impl ExitKind {
	/// Classifies an error by looking through its whole chain
	pub fn of(err: &anyhow::Error) -> Self {
		match err.chain().any(|err| err.is::<ValidationError>()) {
			true => Self::Validation,
			false => Self::Os,
		}
	}

	/// Returns the process exit code
	pub fn code(self) -> u8 {
		match self {
			Self::Os => 1,
			Self::Validation => 2,
		}
	}
}

#[cfg(test)]
mod tests {
	use {super::*, anyhow::Context};

	#[test]
	fn validation_in_chain_exits_2() {
		let err = Err::<(), _>(ValidationError::EmptyFile)
			.context("Unable to size mapping")
			.context("Unable to set up benchmark")
			.unwrap_err();
		assert_eq!(ExitKind::of(&err), ExitKind::Validation);
		assert_eq!(ExitKind::of(&err).code(), 2);
	}

	#[test]
	fn os_errors_exit_1() {
		let err = anyhow::Error::new(OsError {
			op:     "open file",
			source: io::Error::from(io::ErrorKind::NotFound),
		})
		.context("Unable to set up benchmark");
		assert_eq!(ExitKind::of(&err), ExitKind::Os);
		assert_eq!(ExitKind::of(&err).code(), 1);
	}
}
