//! Memory-mapped read benchmark (`madvbench`)

// Modules
mod args;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	madvbench::{ram::RamLimitSource, sizer, Bench, CsvSink, ExitKind, RamLimit, TextSink},
	madvbench_util::logger,
	std::{
		fs,
		io::{self, BufWriter, Write},
		process::ExitCode,
	},
};

fn main() -> ExitCode {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	match self::run(&args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			let exit_kind = ExitKind::of(&err);
			tracing::error!(?exit_kind, "{err:?}");
			ExitCode::from(exit_kind.code())
		},
	}
}

fn run(args: &Args) -> Result<(), anyhow::Error> {
	// Get the memory limit
	let ram_limit = match args.ram_limit {
		Some(bytes) => RamLimit {
			bytes,
			source: RamLimitSource::Override,
		},
		None => RamLimit::probe().context("Unable to probe memory limit")?,
	};
	tracing::info!(bytes = ram_limit.bytes, source = ?ram_limit.source, "Memory limit");

	// Note: We set up everything before creating any outputs, so validation
	//       errors never leave partial results behind.
	let mut bench = Bench::setup(args.mapping_config(), ram_limit, sizer::page_size())
		.context("Unable to set up benchmark")?;

	// With csv output, the human-readable output moves out of its way
	let csv_sink = args
		.csv
		.as_ref()
		.map(|output| output.create().map(CsvSink::new))
		.transpose()
		.context("Unable to create csv output")?;
	let text_writer: Box<dyn Write> = match csv_sink.is_some() {
		true => Box::new(io::stderr()),
		false => Box::new(io::stdout()),
	};
	let mut sink = (TextSink::new(text_writer), csv_sink);

	let report = bench.run(&mut sink).context("Unable to run benchmark")?;
	if let Some(stats) = &report.stats {
		tracing::info!(
			"Throughput {:.2} ± {:.2} MiB/s ({:.2}..{:.2}), time {:.6} ± {:.6}s",
			stats.throughput_mibps.mean,
			stats.throughput_mibps.mean_error,
			stats.throughput_mibps.min,
			stats.throughput_mibps.max,
			stats.time_secs.mean,
			stats.time_secs.mean_error,
		);
	}

	if let Some(json_path) = &args.json {
		let json_file = fs::File::create(json_path).context("Unable to create json output")?;
		serde_json::to_writer_pretty(BufWriter::new(json_file), &report).context("Unable to write json output")?;
	}

	Ok(())
}
