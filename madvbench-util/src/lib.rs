//! Utilities

// Modules
pub mod logger;

// Imports
use std::{cell::RefCell, fmt};

/// Number of bytes per mebibyte
pub const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Extension trait to express byte counts in larger units
#[extend::ext(name = ByteUnits)]
pub impl u64 {
	/// Returns this byte count in mebibytes
	fn as_mib(self) -> f64 {
		self as f64 / BYTES_PER_MIB
	}
}

/// [`fmt::Display`] helper to display using a `FnMut(&mut fmt::Formatter)`
pub struct DisplayWrapper<F: FnMut(&mut fmt::Formatter) -> fmt::Result>(RefCell<F>);

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> DisplayWrapper<F> {
	/// Creates a new display wrapper
	#[must_use]
	pub const fn new(func: F) -> Self {
		Self(RefCell::new(func))
	}
}


impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> fmt::Display for DisplayWrapper<F> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// Note: `f` cannot be re-entrant, so this cannot fail
		self.0.borrow_mut()(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mib_conversion() {
		assert_eq!(4096u64.as_mib(), 4096.0 / BYTES_PER_MIB);
		assert_eq!((3 * 1024 * 1024u64).as_mib(), 3.0);
	}

	#[test]
	fn display_wrapper_forwards() {
		let value = 42;
		let wrapper = DisplayWrapper::new(|f| write!(f, "value={value}"));
		assert_eq!(wrapper.to_string(), "value=42");
	}
}
