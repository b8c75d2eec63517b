//! Cache state control between trials

// Imports
use {
	crate::{config::Temperature, error::OsError, mapper::MemoryMapper},
	tracing::Level,
};

/// Actions to take before a trial
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TrialPlan {
	/// Tear down the mapping, evict the range and remap
	pub reset: bool,

	/// Request read-ahead of the whole range
	pub prefetch: bool,

	/// Whether the trial's sample is kept
	pub kind: TrialKind,
}

/// Trial kind
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TrialKind {
	/// Sample is recorded
	Recorded,

	/// Sample is discarded
	WarmUp,
}

impl TrialPlan {
	/// Returns the plan for trial `trial_idx` under `temperature`
	pub fn new(temperature: Temperature, trial_idx: usize) -> Self {
		match (temperature, trial_idx) {
			(Temperature::Cold, _) => Self {
				reset:    true,
				prefetch: false,
				kind:     TrialKind::Recorded,
			},
			(Temperature::Hot, 0) => Self {
				reset:    false,
				prefetch: true,
				kind:     TrialKind::WarmUp,
			},
			(Temperature::Hot, _) | (Temperature::None, _) => Self {
				reset:    false,
				prefetch: false,
				kind:     TrialKind::Recorded,
			},
		}
	}
}

/// Cache state controller
#[derive(Debug)]
pub struct CacheStateController {
	/// Temperature
	temperature: Temperature,

	/// Page size, for residency reports
	page_size: u64,
}

impl CacheStateController {
	/// Creates a new controller
	pub fn new(temperature: Temperature, page_size: u64) -> Self {
		Self { temperature, page_size }
	}

	/// Transitions the cache state before trial `trial_idx`.
	///
	/// Eviction and prefetch failures are only logged, since the kernel treats
	/// both as hints anyway.
	///
	/// # Errors
	/// Returns an error if unable to remap the file.
	pub fn prepare(&mut self, mapper: &mut MemoryMapper, trial_idx: usize) -> Result<TrialKind, OsError> {
		let plan = TrialPlan::new(self.temperature, trial_idx);
		tracing::trace!(trial_idx, ?plan, "Preparing trial");

		if plan.reset {
			// Note: Pages still mapped can't be dropped from the cache, so
			//       we unmap before evicting.
			mapper.unmap();
			if let Err(err) = mapper.evict() {
				tracing::warn!(trial_idx, %err, "Unable to evict cached pages");
			}
			mapper.remap()?;
		}

		if plan.prefetch {
			if let Err(err) = mapper.prefetch() {
				tracing::warn!(trial_idx, %err, "Unable to prefetch mapped range");
			}
		}

		if (plan.reset || plan.prefetch) && tracing::enabled!(Level::DEBUG) {
			match mapper.resident_pages(self.page_size) {
				Ok(resident) => tracing::debug!(
					trial_idx,
					temperature = %self.temperature,
					resident,
					npages = mapper.map_len().div_ceil(self.page_size),
					"Page residency after cache transition"
				),
				Err(err) => tracing::debug!(trial_idx, %err, "Unable to query page residency"),
			}
		}

		Ok(plan.kind)
	}
}
