//! Configuration

// Imports
use {
	crate::error::ValidationError,
	std::{fmt, path::PathBuf, str::FromStr},
};

/// Access pattern
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Pattern {
	/// Pages in ascending order
	Sequential,

	/// Seeded random permutation of all pages
	Random,

	/// Residue classes modulo the stride, concatenated.
	///
	/// A stride of `0` is treated as `1`.
	Stride(u64),
}

impl Pattern {
	/// Returns the stride, in pages, if this is a stride pattern
	pub fn stride_pages(self) -> Option<u64> {
		match self {
			Self::Stride(pages) => Some(pages),
			Self::Sequential | Self::Random => None,
		}
	}
}

impl FromStr for Pattern {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"seq" => Ok(Self::Sequential),
			"rand" => Ok(Self::Random),
			_ => match s.strip_prefix("stride:") {
				Some(stride) => stride
					.parse::<u64>()
					.map(Self::Stride)
					.map_err(|_| ValidationError::Stride(stride.to_owned())),
				None => Err(ValidationError::Pattern(s.to_owned())),
			},
		}
	}
}

impl fmt::Display for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Sequential => f.pad("seq"),
			Self::Random => f.pad("rand"),
			Self::Stride(pages) => f.pad(&format!("stride:{pages}")),
		}
	}
}

/// Memory advice applied to the mapping
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Advice {
	/// No advice, kernel defaults
	None,

	/// `MADV_SEQUENTIAL`
	Sequential,

	/// `MADV_RANDOM`
	Random,
}

impl FromStr for Advice {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"none" => Ok(Self::None),
			"seq" => Ok(Self::Sequential),
			"rand" => Ok(Self::Random),
			_ => Err(ValidationError::Advice(s.to_owned())),
		}
	}
}

impl fmt::Display for Advice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(match self {
			Self::None => "none",
			Self::Sequential => "seq",
			Self::Random => "rand",
		})
	}
}

/// Page cache temperature between trials
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Temperature {
	/// Evict and remap before every trial
	Cold,

	/// Prefetch once, discard the first trial as a warm-up
	Hot,

	/// Leave the cache alone
	None,
}

impl FromStr for Temperature {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"cold" => Ok(Self::Cold),
			"hot" => Ok(Self::Hot),
			"none" => Ok(Self::None),
			_ => Err(ValidationError::Temperature(s.to_owned())),
		}
	}
}

impl fmt::Display for Temperature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(match self {
			Self::Cold => "cold",
			Self::Hot => "hot",
			Self::None => "none",
		})
	}
}

/// Parses a size ratio, which must be a positive, finite, number
pub fn parse_size_ratio(s: &str) -> Result<f64, ValidationError> {
	match s.parse::<f64>() {
		Ok(ratio) if ratio.is_finite() && ratio > 0.0 => Ok(ratio),
		_ => Err(ValidationError::SizeRatio(s.to_owned())),
	}
}

/// Mapping configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct MappingConfig {
	/// File to map
	pub file: PathBuf,

	/// Fraction of the ram limit to map
	pub size_ratio: f64,

	/// Access pattern
	pub pattern: Pattern,

	/// Advice
	pub advice: Advice,

	/// Seed for [`Pattern::Random`]
	pub seed: u64,

	/// Number of trials to execute
	pub repeat: usize,

	/// Cache temperature
	pub temperature: Temperature,
}

impl MappingConfig {
	/// Default seed
	pub const DEFAULT_SEED: u64 = 1;
	/// Default number of trials
	pub const DEFAULT_REPEAT: usize = 5;

	/// Validates this configuration
	pub fn validate(&self) -> Result<(), ValidationError> {
		if !self.size_ratio.is_finite() || self.size_ratio <= 0.0 {
			return Err(ValidationError::SizeRatio(self.size_ratio.to_string()));
		}

		match (self.temperature, self.repeat) {
			(_, 0) => Err(ValidationError::ZeroRepeat),
			(Temperature::Hot, 1) => Err(ValidationError::HotWarmUpOnly),
			_ => Ok(()),
		}
	}

	/// Returns the number of trials that will be recorded
	pub fn recorded_trials(&self) -> usize {
		match self.temperature {
			Temperature::Hot => self.repeat.saturating_sub(1),
			Temperature::Cold | Temperature::None => self.repeat,
		}
	}

	/// Returns whether statistics should be aggregated over the trials
	pub fn aggregates(&self) -> bool {
		self.repeat > 1
	}
}
