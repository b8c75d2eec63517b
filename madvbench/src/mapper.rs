//! Memory mapper
//!
//! Owns the backing file and its mapping. Both are released exactly once,
//! when the mapper is dropped, on every exit path.

// Imports
use {
	crate::{config::Advice, error::OsError},
	memmap2::{Mmap, MmapOptions},
	std::{
		fs,
		io,
		os::unix::{fs::OpenOptionsExt, io::AsRawFd},
		path::Path,
	},
};

/// Backing file, opened but not yet mapped
#[derive(Debug)]
pub struct BackingFile {
	/// File
	file: fs::File,

	/// Size, in bytes
	size: u64,
}

impl BackingFile {
	/// Opens a file for mapping
	pub fn open(path: &Path) -> Result<Self, OsError> {
		let file = match self::open_no_atime(path) {
			Ok(file) => file,

			// Note: `O_NOATIME` is only allowed for the file owner, so retry without it.
			Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
				tracing::debug!(?path, ?err, "Unable to open file with `O_NOATIME`, retrying without it");
				fs::File::open(path).map_err(OsError::with_op("open file"))?
			},
			Err(err) => {
				return Err(OsError {
					op:     "open file",
					source: err,
				})
			},
		};

		let size = file.metadata().map_err(OsError::with_op("stat file"))?.len();

		Ok(Self { file, size })
	}

	/// Returns the file size
	pub fn size(&self) -> u64 {
		self.size
	}
}

fn open_no_atime(path: &Path) -> Result<fs::File, io::Error> {
	fs::OpenOptions::new()
		.read(true)
		.custom_flags(libc::O_NOATIME)
		.open(path)
}

/// Memory mapper
#[derive(Debug)]
pub struct MemoryMapper {
	/// Backing file
	backing: BackingFile,

	/// Mapping length
	map_len: usize,

	/// Advice re-applied on every mapping
	advice: Advice,

	/// Current mapping.
	///
	/// Only `None` between [`Self::unmap`] and [`Self::remap`].
	mmap: Option<Mmap>,
}

impl MemoryMapper {
	/// Maps the first `map_len` bytes of `backing` read-only and applies `advice`.
	///
	/// # Errors
	/// Returns an error if unable to map the file. Failing to apply the advice
	/// is only logged.
	pub fn new(backing: BackingFile, map_len: u64, advice: Advice) -> Result<Self, OsError> {
		let map_len = usize::try_from(map_len).map_err(|_| OsError {
			op:     "map file",
			source: io::Error::new(io::ErrorKind::InvalidInput, "mapping length doesn't fit in the address space"),
		})?;

		let mut mapper = Self {
			backing,
			map_len,
			advice,
			mmap: None,
		};
		mapper.remap()?;

		Ok(mapper)
	}

	/// Tears down the current mapping, if any
	pub fn unmap(&mut self) {
		if self.mmap.take().is_some() {
			tracing::trace!(map_len = self.map_len, "Unmapped file");
		}
	}

	/// Replaces the current mapping with a fresh one and re-applies the advice.
	pub fn remap(&mut self) -> Result<(), OsError> {
		self.unmap();

		// SAFETY: The mapping is read-only and we never hand out references that
		//         outlive it. Concurrent truncation of the file by another process
		//         would fault, which this benchmark doesn't guard against.
		let mmap = unsafe { MmapOptions::new().len(self.map_len).map(&self.backing.file) }
			.map_err(OsError::with_op("map file"))?;
		tracing::trace!(map_len = self.map_len, addr = ?mmap.as_ptr(), "Mapped file");

		if let Some(advice) = self::madvise_advice(self.advice) {
			if let Err(err) = mmap.advise(advice) {
				tracing::warn!(advice = %self.advice, %err, "Unable to apply memory advice, proceeding unadvised");
			}
		}

		self.mmap = Some(mmap);
		Ok(())
	}

	/// Requests the kernel to drop the cached pages of the mapped range
	pub fn evict(&self) -> Result<(), io::Error> {
		let len = libc::off_t::try_from(self.map_len).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;

		// SAFETY: `posix_fadvise` only inspects the descriptor, which we own.
		match unsafe { libc::posix_fadvise(self.backing.file.as_raw_fd(), 0, len, libc::POSIX_FADV_DONTNEED) } {
			0 => Ok(()),
			errno => Err(io::Error::from_raw_os_error(errno)),
		}
	}

	/// Requests the kernel to read ahead the whole mapped range
	pub fn prefetch(&self) -> Result<(), io::Error> {
		match &self.mmap {
			Some(mmap) => mmap.advise(memmap2::Advice::WillNeed),
			None => Err(io::Error::new(io::ErrorKind::NotConnected, "file isn't mapped")),
		}
	}

	/// Returns the number of resident pages of the current mapping
	pub fn resident_pages(&self, page_size: u64) -> Result<u64, OsError> {
		let Some(mmap) = &self.mmap else {
			return Ok(0);
		};

		let npages = (self.map_len as u64).div_ceil(page_size);
		let mut residency = vec![0u8; npages as usize];

		// SAFETY: The address is our page-aligned mapping of `map_len` bytes and
		//         `residency` has one byte per page of it.
		let res = unsafe { libc::mincore(mmap.as_ptr() as *mut libc::c_void, self.map_len, residency.as_mut_ptr()) };
		if res != 0 {
			return Err(OsError::last("query page residency"));
		}

		Ok(residency.iter().filter(|&&page| page & 0b1 != 0).count() as u64)
	}

	/// Returns the mapped bytes
	pub fn region(&self) -> &[u8] {
		self.mmap.as_deref().unwrap_or(&[])
	}

	/// Returns the mapping length
	pub fn map_len(&self) -> u64 {
		self.map_len as u64
	}

	/// Returns the backing file size
	pub fn file_size(&self) -> u64 {
		self.backing.size
	}
}

/// Returns the `madvise` advice for `advice`
fn madvise_advice(advice: Advice) -> Option<memmap2::Advice> {
	match advice {
		Advice::None => None,
		Advice::Sequential => Some(memmap2::Advice::Sequential),
		Advice::Random => Some(memmap2::Advice::Random),
	}
}
