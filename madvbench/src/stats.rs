//! Statistics

// Imports
use {crate::sampler::RunSample, itertools::Itertools};

/// Returns the `p`-th percentile of `values`, interpolating linearly between
/// the two closest ranks.
///
/// Returns `NaN` if `values` is empty.
pub fn percentile(values: &[f64], p: f64) -> f64 {
	let sorted = self::sorted(values);
	let Some(&last) = sorted.last() else {
		return f64::NAN;
	};

	let pos = (p / 100.0) * (sorted.len() - 1) as f64;
	let lower_idx = pos.floor() as usize;
	let frac = pos - lower_idx as f64;
	match (sorted.get(lower_idx), sorted.get(lower_idx + 1)) {
		(Some(&lower), _) if frac == 0.0 => lower,
		(Some(&lower), Some(&upper)) => self::lerp(lower, upper, frac),
		_ => last,
	}
}

/// Returns the median of `values`.
///
/// Returns `NaN` if `values` is empty.
pub fn median(values: &[f64]) -> f64 {
	let sorted = self::sorted(values);
	let len = sorted.len();
	match len {
		0 => f64::NAN,
		_ if len % 2 == 1 => sorted[len / 2],
		_ => self::lerp(sorted[len / 2 - 1], sorted[len / 2], 0.5),
	}
}

// Note: Both `percentile` and `median` must go through this for the
//       50th percentile to be bit-identical to the median.
fn lerp(lower: f64, upper: f64, frac: f64) -> f64 {
	(1.0 - frac) * lower + frac * upper
}

fn sorted(values: &[f64]) -> Vec<f64> {
	let mut sorted = values.to_vec();
	sorted.sort_by(f64::total_cmp);
	sorted
}

/// p10 / p50 / p90 of a metric
#[derive(PartialEq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Percentiles {
	pub p10: f64,
	pub p50: f64,
	pub p90: f64,

	// Mean and its standard error
	pub mean:       f64,
	pub mean_error: f64,

	// Range
	pub min: f64,
	pub max: f64,
}

impl Percentiles {
	/// Computes the percentiles of `values`
	pub fn new(values: &[f64]) -> Self {
		let variance = values.iter().copied().collect::<average::Variance>();
		let (min, max) = values
			.iter()
			.copied()
			.minmax_by(f64::total_cmp)
			.into_option()
			.unwrap_or((f64::NAN, f64::NAN));

		Self {
			p10: self::percentile(values, 10.0),
			p50: self::median(values),
			p90: self::percentile(values, 90.0),
			mean: variance.mean(),
			mean_error: variance.error(),
			min,
			max,
		}
	}
}

/// Aggregate statistics over all recorded trials
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct AggregateStats {
	/// Number of samples aggregated
	pub samples: usize,

	/// Elapsed time, in seconds
	pub time_secs: Percentiles,

	/// Throughput, in MiB/s
	pub throughput_mibps: Percentiles,

	/// Median minor faults, rounded
	pub minor_faults_p50: i64,

	/// Median major faults, rounded
	pub major_faults_p50: i64,
}

impl AggregateStats {
	/// Aggregates `samples`.
	///
	/// Returns `None` if there are no samples.
	pub fn new(samples: &[RunSample]) -> Option<Self> {
		if samples.is_empty() {
			return None;
		}

		let collect = |f: fn(&RunSample) -> f64| samples.iter().map(f).collect::<Vec<_>>();
		let times = collect(|sample| sample.elapsed_secs);
		let throughputs = collect(|sample| sample.throughput_mibps);
		let minor_faults = collect(|sample| sample.minor_faults as f64);
		let major_faults = collect(|sample| sample.major_faults as f64);

		Some(Self {
			samples:          samples.len(),
			time_secs:        Percentiles::new(&times),
			throughput_mibps: Percentiles::new(&throughputs),
			minor_faults_p50: self::median(&minor_faults).round() as i64,
			major_faults_p50: self::median(&major_faults).round() as i64,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample(elapsed_secs: f64, minor_faults: i64, major_faults: i64) -> RunSample {
		RunSample {
			elapsed_secs,
			throughput_mibps: 1.0 / elapsed_secs,
			minor_faults,
			major_faults,
		}
	}

	#[test]
	fn percentile_interpolates() {
		let values = [4.0, 1.0, 3.0, 2.0, 5.0];
		assert_eq!(percentile(&values, 0.0), 1.0);
		assert_eq!(percentile(&values, 25.0), 2.0);
		assert_eq!(percentile(&values, 100.0), 5.0);
		assert!((percentile(&values, 10.0) - 1.4).abs() < 1e-12);
		assert!((percentile(&values, 90.0) - 4.6).abs() < 1e-12);
	}

	#[test]
	fn percentile_clamps_at_end() {
		assert_eq!(percentile(&[1.0, 2.0], 100.0), 2.0);
		assert_eq!(percentile(&[3.0], 90.0), 3.0);
		assert!(percentile(&[], 50.0).is_nan());
	}

	#[test]
	fn median_odd_and_even() {
		assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
		assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
		assert_eq!(median(&[7.0]), 7.0);
		assert!(median(&[]).is_nan());
	}

	#[test]
	fn p50_is_median() {
		let collections: [&[f64]; 6] = [
			&[0.1],
			&[0.1, 0.2],
			&[0.3, 0.1, 0.2],
			&[1e-9, 3.7e-3, 0.1, 12.5],
			&[0.1, 0.7, 0.3, 0.30000000000000004, 1e300, 1e-300],
			&[f64::INFINITY, 2.0, 1.0],
		];
		for values in collections {
			assert_eq!(
				percentile(values, 50.0).to_bits(),
				median(values).to_bits(),
				"{values:?}"
			);
		}
	}

	#[test]
	fn aggregate_rounds_fault_medians() {
		let samples = [sample(0.5, 10, 1), sample(0.25, 11, 2), sample(1.0, 20, 2), sample(2.0, 21, 3)];
		let stats = AggregateStats::new(&samples).unwrap();

		assert_eq!(stats.samples, 4);
		assert_eq!(stats.time_secs.p50, 0.75);
		assert_eq!(stats.time_secs.min, 0.25);
		assert_eq!(stats.time_secs.max, 2.0);
		assert_eq!(stats.minor_faults_p50, 16);
		assert_eq!(stats.major_faults_p50, 2);
	}

	#[test]
	fn aggregate_single_sample() {
		let stats = AggregateStats::new(&[sample(0.5, 3, 0)]).unwrap();
		assert_eq!(stats.time_secs.p10, 0.5);
		assert_eq!(stats.time_secs.p50, 0.5);
		assert_eq!(stats.time_secs.p90, 0.5);
		assert_eq!(stats.throughput_mibps.p50, 2.0);
		assert_eq!(stats.minor_faults_p50, 3);
	}

	#[test]
	fn aggregate_empty() {
		assert!(AggregateStats::new(&[]).is_none());
	}
}
