//! Trial sampling

// Imports
use {
	crate::error::OsError,
	madvbench_util::ByteUnits,
	std::{hint, mem, ptr, time::Instant},
};

/// Page fault counters of this process
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct FaultCounters {
	/// Minor faults
	pub minor: i64,

	/// Major faults
	pub major: i64,
}

impl FaultCounters {
	/// Reads the current counters
	pub fn current() -> Result<Self, OsError> {
		// SAFETY: `rusage` is a plain C struct, all zeroes is a valid value.
		let mut usage = unsafe { mem::zeroed::<libc::rusage>() };

		// SAFETY: `usage` is a valid, writable, `rusage`.
		if unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) } != 0 {
			return Err(OsError::last("get resource usage"));
		}

		Ok(Self {
			minor: i64::from(usage.ru_minflt),
			major: i64::from(usage.ru_majflt),
		})
	}

	/// Reads the current counters, logging and returning zeroes on failure
	fn current_or_zero(when: &'static str) -> Self {
		Self::current().unwrap_or_else(|err| {
			tracing::warn!(when, %err, "Unable to read page fault counters, fault deltas will be wrong");
			Self::default()
		})
	}
}

/// Sample of a single trial
#[derive(PartialEq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RunSample {
	/// Duration of the traversal, in seconds
	pub elapsed_secs: f64,

	/// Throughput, in MiB/s
	pub throughput_mibps: f64,

	/// Minor faults during the trial
	pub minor_faults: i64,

	/// Major faults during the trial
	pub major_faults: i64,
}

impl RunSample {
	/// Measures one pass over `order` in `region`.
	///
	/// Only the traversal is timed, reading the fault counters isn't.
	pub fn measure(region: &[u8], order: &[u64], page_size: u64) -> Self {
		let before = FaultCounters::current_or_zero("before");

		let start = Instant::now();
		let touched = self::touch_pages(region, order, page_size);
		let elapsed_secs = start.elapsed().as_secs_f64();

		let after = FaultCounters::current_or_zero("after");
		tracing::trace!(touched, elapsed_secs, ?before, ?after, "Measured trial");

		let mib = (order.len() as u64 * page_size).as_mib();
		Self {
			elapsed_secs,
			throughput_mibps: mib / elapsed_secs,
			minor_faults: after.minor - before.minor,
			major_faults: after.major - before.major,
		}
	}
}

/// Loads the first byte of each page in `order`, in order.
///
/// Pages starting outside of `region` are skipped.
/// Returns the number of pages touched.
#[inline(never)]
pub fn touch_pages(region: &[u8], order: &[u64], page_size: u64) -> usize {
	let mut sink = 0u8;
	let mut touched = 0;
	for &page in order {
		let Some(byte) = page
			.checked_mul(page_size)
			.and_then(|offset| usize::try_from(offset).ok())
			.and_then(|offset| region.get(offset))
		else {
			continue;
		};

		// SAFETY: `byte` is a valid reference into `region`.
		// Note: The read must happen to fault the page in, so it can't be elided
		sink ^= unsafe { ptr::read_volatile(byte) };
		touched += 1;
	}
	hint::black_box(sink);

	touched
}
