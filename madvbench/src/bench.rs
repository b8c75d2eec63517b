//! Benchmark pipeline

// Imports
use {
	crate::{
		config::MappingConfig,
		mapper::{BackingFile, MemoryMapper},
		order::AccessOrder,
		ram::RamLimit,
		sampler::RunSample,
		sink::{ResultSink, RunContext, RunReport, TrialRecord},
		sizer::MappingSize,
		stats::AggregateStats,
		temperature::{CacheStateController, TrialKind},
	},
	anyhow::Context,
};

/// Benchmark.
///
/// Owns the mapping for its whole lifetime, so it's released exactly once,
/// whenever the benchmark is dropped.
#[derive(Debug)]
pub struct Bench {
	/// Run context
	context: RunContext,

	/// Access order
	order: AccessOrder,

	/// Mapper
	mapper: MemoryMapper,

	/// Cache state controller
	controller: CacheStateController,
}

impl Bench {
	/// Opens, sizes and maps the file in `config`.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid, the file is empty or too
	/// small, or if unable to open or map the file.
	pub fn setup(config: MappingConfig, ram_limit: RamLimit, page_size: u64) -> Result<Self, anyhow::Error> {
		config.validate().context("Invalid configuration")?;

		let backing = BackingFile::open(&config.file).with_context(|| format!("Unable to open {:?}", config.file))?;
		let file_size = backing.size();
		let size = MappingSize::compute(config.size_ratio, ram_limit.bytes, file_size, page_size)
			.context("Unable to compute mapping size")?;
		tracing::debug!(?size, file_size, ?ram_limit, "Computed mapping size");

		let mapper = MemoryMapper::new(backing, size.map_len, config.advice)
			.with_context(|| format!("Unable to map {:?}", config.file))?;

		let order = AccessOrder::generate(config.pattern, config.seed, size.npages);
		tracing::debug!(pattern = %config.pattern, seed = config.seed, npages = order.len(), "Generated access order");

		let controller = CacheStateController::new(config.temperature, page_size);
		Ok(Self {
			context: RunContext {
				config,
				size,
				file_size: mapper.file_size(),
				ram_limit,
			},
			order,
			mapper,
			controller,
		})
	}

	/// Runs all trials, reporting recorded ones to `sink`
	pub fn run<S: ResultSink>(&mut self, sink: &mut S) -> Result<RunReport, anyhow::Error> {
		let context = &self.context;
		let config = &context.config;
		sink.begin(context).context("Unable to begin output")?;

		let mut trials = Vec::with_capacity(config.recorded_trials());
		for trial_idx in 0..config.repeat {
			let kind = self
				.controller
				.prepare(&mut self.mapper, trial_idx)
				.context("Unable to prepare trial")?;

			let sample = RunSample::measure(self.mapper.region(), &self.order, context.size.page_size);
			match kind {
				TrialKind::WarmUp => tracing::debug!(trial_idx, ?sample, "Discarding warm-up trial"),
				TrialKind::Recorded => {
					tracing::debug!(trial_idx, ?sample, "Recorded trial");
					let trial = TrialRecord { trial_idx, sample };
					sink.record(context, &trial).context("Unable to output trial")?;
					trials.push(trial);
				},
			}
		}

		let stats = match config.aggregates() {
			true => AggregateStats::new(&trials.iter().map(|trial| trial.sample).collect::<Vec<_>>()),
			false => None,
		};
		let report = RunReport {
			context: context.clone(),
			trials,
			stats,
		};
		sink.finish(&report).context("Unable to finish output")?;

		Ok(report)
	}

	/// Returns the run context
	pub fn context(&self) -> &RunContext {
		&self.context
	}

	/// Returns the access order
	pub fn order(&self) -> &AccessOrder {
		&self.order
	}
}
