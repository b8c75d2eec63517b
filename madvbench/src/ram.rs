//! Ram limit probing
//!
//! The effective memory ceiling is the process' cgroup v2 `memory.max`, when
//! it's set to a finite, non-zero, value, otherwise the physical memory size.

// Imports
use {
	crate::error::ProbeError,
	std::{
		fs,
		path::{Path, PathBuf},
	},
};

/// Default cgroup v2 mount point
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Where the limit came from
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum RamLimitSource {
	/// cgroup v2 `memory.max`
	Cgroup,

	/// Physical memory
	Physical,

	/// Set explicitly by the user
	Override,
}

/// Ram limit
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RamLimit {
	/// Limit, in bytes
	pub bytes: u64,

	/// Source
	pub source: RamLimitSource,
}

impl RamLimit {
	/// Probes the ram limit of the current process
	pub fn probe() -> Result<Self, ProbeError> {
		let proc_cgroup = fs::read_to_string("/proc/self/cgroup").ok();
		Self::probe_with(Path::new(CGROUP_ROOT), proc_cgroup.as_deref(), self::physical_memory())
	}

	/// Probes the ram limit given the cgroup mount, the contents of
	/// `/proc/self/cgroup` and the physical memory size.
	pub fn probe_with(cgroup_root: &Path, proc_cgroup: Option<&str>, physical: Option<u64>) -> Result<Self, ProbeError> {
		let cgroup_limit = proc_cgroup
			.and_then(self::parse_cgroup_path)
			.and_then(|cgroup_path| {
				let memory_max_path = self::memory_max_path(cgroup_root, cgroup_path);
				match fs::read_to_string(&memory_max_path) {
					Ok(contents) => Some(contents),
					Err(err) => {
						tracing::debug!(?memory_max_path, ?err, "Unable to read cgroup memory limit");
						None
					},
				}
			})
			.and_then(|contents| self::parse_memory_max(&contents));

		match (cgroup_limit, physical) {
			(Some(bytes), _) => Ok(Self {
				bytes,
				source: RamLimitSource::Cgroup,
			}),
			(None, Some(bytes)) if bytes > 0 => Ok(Self {
				bytes,
				source: RamLimitSource::Physical,
			}),
			_ => Err(ProbeError),
		}
	}
}

/// Returns the cgroup v2 path from the contents of `/proc/self/cgroup`.
///
/// The unified hierarchy entry has the form `0::<path>`.
pub fn parse_cgroup_path(proc_cgroup: &str) -> Option<&str> {
	proc_cgroup
		.lines()
		.find_map(|line| line.strip_prefix("0::"))
		.map(str::trim)
		.filter(|path| !path.is_empty())
}

/// Parses a `memory.max` value.
///
/// Returns `None` for `max`, `0` or anything non-numeric.
pub fn parse_memory_max(contents: &str) -> Option<u64> {
	contents.trim().parse::<u64>().ok().filter(|&bytes| bytes > 0)
}

/// Returns the path of `memory.max` for a cgroup path
fn memory_max_path(cgroup_root: &Path, cgroup_path: &str) -> PathBuf {
	cgroup_root
		.join(cgroup_path.trim_start_matches('/'))
		.join("memory.max")
}

/// Returns the physical memory size, in bytes
pub fn physical_memory() -> Option<u64> {
	// SAFETY: `sysconf` has no preconditions.
	let (pages, page_size) = unsafe { (libc::sysconf(libc::_SC_PHYS_PAGES), libc::sysconf(libc::_SC_PAGESIZE)) };
	let pages = u64::try_from(pages).ok()?;
	let page_size = u64::try_from(page_size).ok()?;
	pages.checked_mul(page_size).filter(|&bytes| bytes > 0)
}
