//! Mapping sizing

// Imports
use crate::error::ValidationError;

/// Mapping geometry
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct MappingSize {
	/// Mapping length, in bytes.
	///
	/// Always a non-zero multiple of `page_size`.
	pub map_len: u64,

	/// Page size
	pub page_size: u64,

	/// Number of pages in the mapping
	pub npages: u64,
}

impl MappingSize {
	/// Computes the mapping size for mapping `size_ratio` of `ram_limit` out of a file of `file_size` bytes.
	///
	/// The requested length is clipped to the file and rounded down to a page boundary.
	///
	/// # Errors
	/// Returns an error if the file is empty or if the resulting length is zero.
	///
	/// # Panics
	/// Panics if `page_size` is zero.
	pub fn compute(size_ratio: f64, ram_limit: u64, file_size: u64, page_size: u64) -> Result<Self, ValidationError> {
		assert!(page_size > 0, "Page size must be non-zero");
		if file_size == 0 {
			return Err(ValidationError::EmptyFile);
		}

		// Note: `as` saturates, so huge ratios simply clip to the file
		let target = (size_ratio * ram_limit as f64).floor() as u64;
		let aligned = target.min(file_size) / page_size * page_size;
		let file_clip = file_size / page_size * page_size;
		let map_len = aligned.min(file_clip);

		if map_len == 0 {
			return Err(ValidationError::ZeroMapLen {
				size_ratio,
				ram_limit,
				file_size,
				page_size,
			});
		}

		Ok(Self {
			map_len,
			page_size,
			npages: map_len.div_ceil(page_size),
		})
	}
}

/// Page size assumed when the system doesn't report one
pub const FALLBACK_PAGE_SIZE: u64 = 4096;

/// Returns the system page size
pub fn page_size() -> u64 {
	// SAFETY: `sysconf` has no preconditions.
	let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
	self::page_size_or_fallback(page_size)
}

/// Validates a page size reported by `sysconf`, falling back to [`FALLBACK_PAGE_SIZE`]
fn page_size_or_fallback(page_size: libc::c_long) -> u64 {
	match u64::try_from(page_size).ok().filter(|&size| size > 0) {
		Some(size) => size,
		None => {
			tracing::warn!(
				page_size,
				fallback = FALLBACK_PAGE_SIZE,
				"Unable to get the system page size, assuming the fallback"
			);
			FALLBACK_PAGE_SIZE
		},
	}
}
