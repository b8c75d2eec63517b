//! Arguments

// Imports
use {
	madvbench::{config, Advice, MappingConfig, Pattern, Temperature},
	std::{
		convert::Infallible,
		fs,
		io::{self, BufWriter, Write},
		path::PathBuf,
		str::FromStr,
	},
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
#[clap(about = "Measures page faults and throughput when reading a memory-mapped file")]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// File to map
	#[clap(long = "file")]
	pub file: PathBuf,

	/// Fraction of the available memory to map
	#[clap(long = "size-ratio", value_parser = config::parse_size_ratio)]
	pub size_ratio: f64,

	/// Access pattern: `seq`, `rand` or `stride:<N>`
	#[clap(long = "pattern")]
	pub pattern: Pattern,

	/// Memory advice: `none`, `seq` or `rand`
	#[clap(long = "madv")]
	pub advice: Advice,

	/// Seed for the random pattern
	#[clap(long = "seed", default_value_t = MappingConfig::DEFAULT_SEED)]
	pub seed: u64,

	/// Number of trials
	#[clap(long = "repeat", default_value_t = MappingConfig::DEFAULT_REPEAT)]
	pub repeat: usize,

	/// Cache temperature: `hot`, `cold` or `none`
	#[clap(long = "temp", default_value = "none")]
	pub temperature: Temperature,

	/// Csv output.
	///
	/// Writes one row per recorded trial to stdout when given alone, or as
	/// `--csv yes` / `--csv -`. Any other value is a file to write to.
	/// The human-readable output is then moved to stderr.
	#[clap(long = "csv", num_args = 0..=1, default_missing_value = "-")]
	pub csv: Option<CsvOutput>,

	/// Json output.
	///
	/// Writes the whole report, including the aggregate, to this file.
	#[clap(long = "json")]
	pub json: Option<PathBuf>,

	/// Memory limit, in bytes.
	///
	/// Overrides the cgroup / physical memory limit.
	#[clap(long = "ram-limit")]
	pub ram_limit: Option<u64>,
}

impl Args {
	/// Returns the mapping configuration
	pub fn mapping_config(&self) -> MappingConfig {
		MappingConfig {
			file:        self.file.clone(),
			size_ratio:  self.size_ratio,
			pattern:     self.pattern,
			advice:      self.advice,
			seed:        self.seed,
			repeat:      self.repeat,
			temperature: self.temperature,
		}
	}
}

/// Csv output destination
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum CsvOutput {
	/// Standard output
	Stdout,

	/// File
	File(PathBuf),
}

impl CsvOutput {
	/// Creates the writer for this destination
	pub fn create(&self) -> Result<Box<dyn Write>, io::Error> {
		match self {
			Self::Stdout => Ok(Box::new(io::stdout())),
			Self::File(path) => fs::File::create(path).map(|file| Box::new(BufWriter::new(file)) as Box<dyn Write>),
		}
	}
}

impl FromStr for CsvOutput {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"-" | "yes" => Ok(Self::Stdout),
			path => Ok(Self::File(PathBuf::from(path))),
		}
	}
}
