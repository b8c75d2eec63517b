//! Access order generation

// Imports
use {
	crate::config::Pattern,
	rand::{rngs::StdRng, seq::SliceRandom, SeedableRng},
	std::ops::Deref,
};

/// Access order.
///
/// A permutation of all page indices `0..npages`.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct AccessOrder(Vec<u64>);

impl AccessOrder {
	/// Generates the access order of `npages` pages for `pattern`.
	///
	/// `seed` is only used by [`Pattern::Random`], for which the order is a
	/// pure function of `(seed, npages)`.
	pub fn generate(pattern: Pattern, seed: u64, npages: u64) -> Self {
		let order = match pattern {
			Pattern::Sequential => (0..npages).collect(),
			Pattern::Random => {
				let mut order = (0..npages).collect::<Vec<_>>();
				order.shuffle(&mut StdRng::seed_from_u64(seed));
				order
			},
			Pattern::Stride(stride) => {
				// Note: Each residue class is walked in full before the next one starts,
				//       there is no wrap-around walk.
				let stride = stride.max(1);
				(0..stride.min(npages))
					.flat_map(|start| (start..npages).step_by(self::step(stride)))
					.collect()
			},
		};

		Self(order)
	}

	/// Returns the page indices
	pub fn pages(&self) -> &[u64] {
		&self.0
	}
}

impl Deref for AccessOrder {
	type Target = [u64];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Converts a stride to a step, saturating if it doesn't fit a `usize`.
fn step(stride: u64) -> usize {
	usize::try_from(stride).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
	use {super::*, itertools::Itertools};

	fn is_permutation(order: &AccessOrder, npages: u64) -> bool {
		order.len() as u64 == npages && order.iter().copied().sorted().eq(0..npages)
	}

	#[test]
	fn sequential() {
		assert_eq!(AccessOrder::generate(Pattern::Sequential, 1, 4).pages(), [0, 1, 2, 3]);
		assert!(AccessOrder::generate(Pattern::Sequential, 1, 0).is_empty());
	}

	#[test]
	fn stride_concatenates_residue_classes() {
		assert_eq!(AccessOrder::generate(Pattern::Stride(2), 1, 5).pages(), [0, 2, 4, 1, 3]);
		assert_eq!(AccessOrder::generate(Pattern::Stride(3), 1, 7).pages(), [0, 3, 6, 1, 4, 2, 5]);
	}

	#[test]
	fn stride_zero_is_sequential() {
		assert_eq!(
			AccessOrder::generate(Pattern::Stride(0), 1, 6),
			AccessOrder::generate(Pattern::Sequential, 1, 6)
		);
	}

	#[test]
	fn stride_larger_than_pages() {
		assert_eq!(AccessOrder::generate(Pattern::Stride(64), 1, 3).pages(), [0, 1, 2]);
		assert_eq!(AccessOrder::generate(Pattern::Stride(u64::MAX), 1, 3).pages(), [0, 1, 2]);
	}

	#[test]
	fn stride_is_permutation() {
		for npages in 1..=40 {
			for stride in 1..=npages + 2 {
				let order = AccessOrder::generate(Pattern::Stride(stride), 1, npages);
				assert!(is_permutation(&order, npages), "stride {stride} over {npages} pages");
			}
		}
	}

	#[test]
	fn random_is_deterministic_permutation() {
		let first = AccessOrder::generate(Pattern::Random, 7, 1000);
		let second = AccessOrder::generate(Pattern::Random, 7, 1000);
		assert_eq!(first, second);
		assert!(is_permutation(&first, 1000));

		let other_seed = AccessOrder::generate(Pattern::Random, 8, 1000);
		assert_ne!(first, other_seed);
		assert!(is_permutation(&other_seed, 1000));
	}
}
