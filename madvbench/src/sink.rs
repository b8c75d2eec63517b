//! Result sinks

// Imports
use {
	crate::{
		config::MappingConfig,
		ram::RamLimit,
		sampler::RunSample,
		sizer::MappingSize,
		stats::AggregateStats,
	},
	anyhow::Context,
	madvbench_util::DisplayWrapper,
	std::{borrow::Cow, io},
};

/// Everything about a run that doesn't change between trials
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RunContext {
	/// Configuration
	pub config: MappingConfig,

	/// Mapping geometry
	pub size: MappingSize,

	/// Backing file size
	pub file_size: u64,

	/// Ram limit the mapping was sized against
	pub ram_limit: RamLimit,
}

/// A recorded trial
#[derive(Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TrialRecord {
	/// Trial index, counting discarded trials
	pub trial_idx: usize,

	/// Sample
	pub sample: RunSample,
}

/// Output of a whole run
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RunReport {
	/// Context
	pub context: RunContext,

	/// Recorded trials
	pub trials: Vec<TrialRecord>,

	/// Aggregate, if more than a single trial was requested
	pub stats: Option<AggregateStats>,
}

/// Result sink
pub trait ResultSink {
	/// Called once, before any trial
	fn begin(&mut self, context: &RunContext) -> Result<(), anyhow::Error>;

	/// Called for each recorded trial
	fn record(&mut self, context: &RunContext, trial: &TrialRecord) -> Result<(), anyhow::Error>;

	/// Called once, after all trials
	fn finish(&mut self, report: &RunReport) -> Result<(), anyhow::Error>;
}

impl<S: ResultSink> ResultSink for Option<S> {
	fn begin(&mut self, context: &RunContext) -> Result<(), anyhow::Error> {
		self.as_mut().map_or(Ok(()), |sink| sink.begin(context))
	}

	fn record(&mut self, context: &RunContext, trial: &TrialRecord) -> Result<(), anyhow::Error> {
		self.as_mut().map_or(Ok(()), |sink| sink.record(context, trial))
	}

	fn finish(&mut self, report: &RunReport) -> Result<(), anyhow::Error> {
		self.as_mut().map_or(Ok(()), |sink| sink.finish(report))
	}
}

impl<A: ResultSink, B: ResultSink> ResultSink for (A, B) {
	fn begin(&mut self, context: &RunContext) -> Result<(), anyhow::Error> {
		self.0.begin(context)?;
		self.1.begin(context)
	}

	fn record(&mut self, context: &RunContext, trial: &TrialRecord) -> Result<(), anyhow::Error> {
		self.0.record(context, trial)?;
		self.1.record(context, trial)
	}

	fn finish(&mut self, report: &RunReport) -> Result<(), anyhow::Error> {
		self.0.finish(report)?;
		self.1.finish(report)
	}
}

/// Human-readable sink
#[derive(Debug)]
pub struct TextSink<W> {
	/// Writer
	writer: W,
}

impl<W: io::Write> TextSink<W> {
	/// Creates a new text sink
	pub fn new(writer: W) -> Self {
		Self { writer }
	}

	/// Returns the inner writer
	pub fn into_inner(self) -> W {
		self.writer
	}
}

impl<W: io::Write> ResultSink for TextSink<W> {
	fn begin(&mut self, context: &RunContext) -> Result<(), anyhow::Error> {
		let RunContext {
			config,
			size,
			file_size,
			ram_limit,
		} = context;

		writeln!(
			self.writer,
			"---- EXP DETAILS ----\nfile = {}, size_ratio = {}\npattern = {}, madv = {}, seed = {}, repeat = {}, temp = \
			 {}\nmap_len = {} ({} pages of {} bytes), file_size = {}, avail_ram = {} ({:?})\n",
			config.file.display(),
			config.size_ratio,
			config.pattern,
			config.advice,
			config.seed,
			config.repeat,
			config.temperature,
			size.map_len,
			size.npages,
			size.page_size,
			file_size,
			ram_limit.bytes,
			ram_limit.source,
		)
		.context("Unable to write experiment details")
	}

	fn record(&mut self, _context: &RunContext, trial: &TrialRecord) -> Result<(), anyhow::Error> {
		let TrialRecord { trial_idx, sample } = trial;
		writeln!(
			self.writer,
			"run {trial_idx}: time_s={} throughput_MiBps={} minflt={} majflt={}",
			sample.elapsed_secs, sample.throughput_mibps, sample.minor_faults, sample.major_faults
		)
		.context("Unable to write trial")
	}

	fn finish(&mut self, report: &RunReport) -> Result<(), anyhow::Error> {
		let config = &report.context.config;
		let Some(stats) = &report.stats else {
			return self.writer.flush().context("Unable to flush output");
		};

		writeln!(
			self.writer,
			"\nSummary\n pattern={}\n madvise={}\n temp={}\n repeat={}\n recorded={}\n time_s_p10={}\n time_s_p50={}\n \
			 time_s_p90={}\n thr_MiBps_p10={}\n thr_MiBps_p50={}\n thr_MiBps_p90={}\n minflt_p50={}\n majflt_p50={}\n",
			config.pattern,
			config.advice,
			config.temperature,
			config.repeat,
			stats.samples,
			stats.time_secs.p10,
			stats.time_secs.p50,
			stats.time_secs.p90,
			stats.throughput_mibps.p10,
			stats.throughput_mibps.p50,
			stats.throughput_mibps.p90,
			stats.minor_faults_p50,
			stats.major_faults_p50,
		)
		.context("Unable to write summary")?;

		let faults = |f: fn(&RunSample) -> i64| {
			DisplayWrapper::new(move |fmt| {
				report
					.trials
					.iter()
					.try_for_each(|trial| write!(fmt, "{} ", f(&trial.sample)))
			})
		};
		writeln!(
			self.writer,
			"minflts: {}\nmajflts: {}",
			faults(|sample| sample.minor_faults),
			faults(|sample| sample.major_faults)
		)
		.context("Unable to write fault counts")?;

		self.writer.flush().context("Unable to flush output")
	}
}

/// Csv sink, one row per recorded trial
#[derive(Debug)]
pub struct CsvSink<W> {
	/// Writer
	writer: W,
}

impl<W: io::Write> CsvSink<W> {
	/// Csv header
	pub const HEADER: &'static str = "file,size_ratio,pattern,stride_pages,madv,temp,repeat_idx,time_s,throughput_mibps,\
	                                  minflt,majflt,npages,pagesz,map_len,file_size,avail_ram,seed";

	/// Creates a new csv sink
	pub fn new(writer: W) -> Self {
		Self { writer }
	}

	/// Returns the inner writer
	pub fn into_inner(self) -> W {
		self.writer
	}
}

impl<W: io::Write> ResultSink for CsvSink<W> {
	fn begin(&mut self, _context: &RunContext) -> Result<(), anyhow::Error> {
		writeln!(self.writer, "{}", Self::HEADER).context("Unable to write csv header")
	}

	fn record(&mut self, context: &RunContext, trial: &TrialRecord) -> Result<(), anyhow::Error> {
		let RunContext {
			config,
			size,
			file_size,
			ram_limit,
		} = context;
		let stride_pages = config
			.pattern
			.stride_pages()
			.map_or(-1, i128::from);

		writeln!(
			self.writer,
			"{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
			self::csv_field(&config.file.to_string_lossy()),
			config.size_ratio,
			config.pattern,
			stride_pages,
			config.advice,
			config.temperature,
			trial.trial_idx,
			trial.sample.elapsed_secs,
			trial.sample.throughput_mibps,
			trial.sample.minor_faults,
			trial.sample.major_faults,
			size.npages,
			size.page_size,
			size.map_len,
			file_size,
			ram_limit.bytes,
			config.seed,
		)
		.context("Unable to write csv row")
	}

	fn finish(&mut self, _report: &RunReport) -> Result<(), anyhow::Error> {
		self.writer.flush().context("Unable to flush csv output")
	}
}

/// Quotes a csv field if needed
fn csv_field(field: &str) -> Cow<'_, str> {
	match field.contains([',', '"', '\n', '\r']) {
		true => Cow::Owned(format!("\"{}\"", field.replace('"', "\"\""))),
		false => Cow::Borrowed(field),
	}
}
