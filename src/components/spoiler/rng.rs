//! Seeded linear-congruential generator.
//!
//! The particle model re-seeds one of these per particle on every evaluation,
//! so identical seeds always replay the same sequence of draws. Never swap this
//! for a system random source: the renderer keeps no per-particle state and
//! relies on replaying the exact same draws each frame.

/// Multiplier from Numerical Recipes' 32-bit LCG.
const MULTIPLIER: u32 = 1_664_525;
/// Increment from Numerical Recipes' 32-bit LCG.
const INCREMENT: u32 = 1_013_904_223;
/// `2^32`, used to map the state into `[0, 1)`.
const MODULUS: f64 = 4_294_967_296.0;

/// Deterministic pseudo-random float source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lcg {
	state: u32,
}

impl Lcg {
	/// Generator starting at `seed`.
	pub const fn new(seed: u32) -> Self {
		Self { state: seed }
	}

	/// Current generator state; feeding it back into [`Lcg::new`] resumes the sequence.
	pub const fn state(&self) -> u32 {
		self.state
	}

	/// Next value in `[0, 1)`.
	pub fn next_unit(&mut self) -> f64 {
		self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
		f64::from(self.state) / MODULUS
	}

	/// Next value in `[a, b)`. Returns `a` every time when `a == b`.
	///
	/// The state still advances for a degenerate range so the position of
	/// later draws in the sequence does not depend on the range bounds.
	pub fn next_range(&mut self, a: f64, b: f64) -> f64 {
		let u = self.next_unit();
		if a == b {
			return a;
		}
		a + (b - a) * u
	}
}

/// Pure step: `(value in [a, b), next seed state)`.
pub fn next(seed_state: u32, a: f64, b: f64) -> (f64, u32) {
	let mut rng = Lcg::new(seed_state);
	let value = rng.next_range(a, b);
	(value, rng.state())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn same_seed_replays_same_sequence() {
		let mut a = Lcg::new(42);
		let mut b = Lcg::new(42);
		for _ in 0..100 {
			assert_eq!(a.next_unit().to_bits(), b.next_unit().to_bits());
		}
	}

	#[test]
	fn different_seeds_diverge() {
		let mut a = Lcg::new(1);
		let mut b = Lcg::new(2);
		assert_ne!(a.next_unit(), b.next_unit());
	}

	#[test]
	fn unit_values_stay_in_half_open_range() {
		let mut rng = Lcg::new(7);
		for _ in 0..10_000 {
			let v = rng.next_unit();
			assert!((0.0..1.0).contains(&v), "{v} escaped [0, 1)");
		}
	}

	#[test]
	fn range_values_respect_bounds() {
		let mut rng = Lcg::new(99);
		for _ in 0..10_000 {
			let v = rng.next_range(-3.0, 5.0);
			assert!((-3.0..5.0).contains(&v));
		}
	}

	#[test]
	fn degenerate_range_is_constant() {
		let mut rng = Lcg::new(3);
		for _ in 0..10 {
			assert_eq!(rng.next_range(2.5, 2.5), 2.5);
		}
	}

	#[test]
	fn pure_step_matches_stateful_generator() {
		let mut rng = Lcg::new(1234);
		let (v1, s1) = next(1234, 0.0, 1.0);
		let (v2, _) = next(s1, 10.0, 20.0);
		assert_eq!(v1, rng.next_unit());
		assert_eq!(v2, rng.next_range(10.0, 20.0));
	}
}
