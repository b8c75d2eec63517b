//! End-to-end benchmark runs over scratch files

// Imports
use {
	madvbench::{
		ram::RamLimitSource,
		sink::RunReport,
		sizer,
		Advice,
		Bench,
		CsvSink,
		ExitKind,
		MappingConfig,
		Pattern,
		RamLimit,
		Temperature,
		TextSink,
		ValidationError,
	},
	madvbench_util::ByteUnits,
	std::{io::Write, path::Path},
};

/// Ram limit large enough to never clip the scratch files
const RAM_LIMIT: RamLimit = RamLimit {
	bytes:  1 << 40,
	source: RamLimitSource::Override,
};

fn scratch_file(len: u64) -> tempfile::NamedTempFile {
	let mut file = tempfile::NamedTempFile::new().expect("Unable to create scratch file");
	let contents = (0..len).map(|idx| idx as u8).collect::<Vec<_>>();
	file.write_all(&contents).expect("Unable to write scratch file");
	file.flush().expect("Unable to flush scratch file");
	file
}

fn config(file: &Path, pattern: Pattern, temperature: Temperature, repeat: usize) -> MappingConfig {
	MappingConfig {
		file: file.to_path_buf(),
		size_ratio: 1.0,
		pattern,
		advice: Advice::None,
		seed: MappingConfig::DEFAULT_SEED,
		repeat,
		temperature,
	}
}

fn run(config: MappingConfig) -> RunReport {
	let mut bench = Bench::setup(config, RAM_LIMIT, sizer::page_size()).expect("Unable to set up benchmark");
	bench.run(&mut None::<CsvSink<Vec<u8>>>).expect("Unable to run benchmark")
}

#[test]
fn sequential_four_pages() {
	let page_size = sizer::page_size();
	let file = scratch_file(4 * page_size);
	let config = config(file.path(), Pattern::Sequential, Temperature::None, 1);

	let mut bench = Bench::setup(config, RAM_LIMIT, page_size).unwrap();
	assert_eq!(bench.order().pages(), [0, 1, 2, 3]);
	assert_eq!(bench.context().size.map_len, 4 * page_size);

	let report = bench.run(&mut None::<CsvSink<Vec<u8>>>).unwrap();
	assert!(report.stats.is_none());
	assert_eq!(report.trials.len(), 1);

	let sample = report.trials[0].sample;
	assert!(sample.elapsed_secs > 0.0);
	assert_eq!(sample.throughput_mibps, (4 * page_size).as_mib() / sample.elapsed_secs);
}

#[test]
fn stride_five_pages() {
	let page_size = sizer::page_size();
	let file = scratch_file(5 * page_size);
	let bench = Bench::setup(
		config(file.path(), Pattern::Stride(2), Temperature::None, 1),
		RAM_LIMIT,
		page_size,
	)
	.unwrap();
	assert_eq!(bench.order().pages(), [0, 2, 4, 1, 3]);
}

#[test]
fn partial_trailing_page_is_not_mapped() {
	let page_size = sizer::page_size();
	let file = scratch_file(3 * page_size + page_size / 2);
	let bench = Bench::setup(
		config(file.path(), Pattern::Random, Temperature::None, 1),
		RAM_LIMIT,
		page_size,
	)
	.unwrap();
	assert_eq!(bench.context().size.npages, 3);
	assert_eq!(bench.context().file_size, 3 * page_size + page_size / 2);
}

#[test]
fn none_records_every_trial() {
	let page_size = sizer::page_size();
	let file = scratch_file(8 * page_size);
	let report = run(config(file.path(), Pattern::Random, Temperature::None, 4));

	assert_eq!(
		report.trials.iter().map(|trial| trial.trial_idx).collect::<Vec<_>>(),
		[0, 1, 2, 3]
	);
	assert_eq!(report.stats.expect("Missing aggregate").samples, 4);
}

#[test]
fn hot_discards_warm_up() {
	let page_size = sizer::page_size();
	let file = scratch_file(8 * page_size);
	let report = run(config(file.path(), Pattern::Sequential, Temperature::Hot, 3));

	assert_eq!(
		report.trials.iter().map(|trial| trial.trial_idx).collect::<Vec<_>>(),
		[1, 2]
	);
	assert_eq!(report.stats.expect("Missing aggregate").samples, 2);
}

#[test]
fn hot_single_trial_is_rejected() {
	let page_size = sizer::page_size();
	let file = scratch_file(8 * page_size);
	let err = Bench::setup(
		config(file.path(), Pattern::Sequential, Temperature::Hot, 1),
		RAM_LIMIT,
		page_size,
	)
	.unwrap_err();

	assert_eq!(ExitKind::of(&err), ExitKind::Validation);
	assert!(matches!(
		err.downcast_ref::<ValidationError>(),
		Some(ValidationError::HotWarmUpOnly)
	));
}

#[test]
fn cold_trials_fault() {
	let page_size = sizer::page_size();
	let file = scratch_file(16 * page_size);
	let report = run(config(file.path(), Pattern::Stride(4), Temperature::Cold, 3));

	assert_eq!(report.trials.len(), 3);
	for trial in &report.trials {
		let faults = trial.sample.minor_faults + trial.sample.major_faults;
		assert!(faults > 0, "Trial {} had no faults", trial.trial_idx);
	}
}

#[test]
fn empty_file_is_a_validation_error() {
	let file = scratch_file(0);
	let err = Bench::setup(
		config(file.path(), Pattern::Sequential, Temperature::None, 1),
		RAM_LIMIT,
		sizer::page_size(),
	)
	.unwrap_err();
	assert_eq!(ExitKind::of(&err), ExitKind::Validation);
}

#[test]
fn tiny_ratio_is_a_validation_error() {
	let page_size = sizer::page_size();
	let file = scratch_file(4 * page_size);
	let mut config = config(file.path(), Pattern::Sequential, Temperature::None, 1);
	config.size_ratio = 0.5;

	let ram_limit = RamLimit {
		bytes:  page_size,
		source: RamLimitSource::Override,
	};
	let err = Bench::setup(config, ram_limit, page_size).unwrap_err();
	assert!(matches!(
		err.downcast_ref::<ValidationError>(),
		Some(ValidationError::ZeroMapLen { .. })
	));
}

#[test]
fn missing_file_is_an_os_error() {
	let dir = tempfile::tempdir().unwrap();
	let err = Bench::setup(
		config(&dir.path().join("missing.dat"), Pattern::Sequential, Temperature::None, 1),
		RAM_LIMIT,
		sizer::page_size(),
	)
	.unwrap_err();
	assert_eq!(ExitKind::of(&err), ExitKind::Os);
}

#[test]
fn csv_and_text_outputs() {
	let page_size = sizer::page_size();
	let file = scratch_file(4 * page_size);
	let mut bench = Bench::setup(
		config(file.path(), Pattern::Stride(3), Temperature::Hot, 4),
		RAM_LIMIT,
		page_size,
	)
	.unwrap();

	let mut sink = (TextSink::new(vec![]), CsvSink::new(vec![]));
	bench.run(&mut sink).unwrap();
	let (text, csv) = sink;

	let csv = String::from_utf8(csv.into_inner()).unwrap();
	let rows = csv.lines().skip(1).collect::<Vec<_>>();
	assert_eq!(rows.len(), 3);
	for (row, trial_idx) in rows.iter().zip(1..) {
		let fields = row.split(',').collect::<Vec<_>>();
		assert_eq!(fields.len(), 17);
		assert_eq!(fields[2], "stride:3");
		assert_eq!(fields[3], "3");
		assert_eq!(fields[5], "hot");
		assert_eq!(fields[6], trial_idx.to_string());
		assert_eq!(fields[11], "4");
	}

	let text = String::from_utf8(text.into_inner()).unwrap();
	assert!(!text.contains("run 0:"));
	assert!(text.contains("Summary"));
}
