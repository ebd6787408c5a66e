//! Polar conversion and toroidal wrapping with edge mirroring on top of
//! [`glam::DVec2`].

/// A 2D vector in simulation (device pixel) space.
pub type Vec2 = glam::DVec2;

/// Polar to cartesian conversion.
pub fn polar_to_cartesian(magnitude: f64, angle: f64) -> Vec2 {
	Vec2::from_angle(angle) * magnitude
}

/// Wraps `value` into `[0, size)`, correcting the sign of `%` for negatives.
pub fn cycle(value: f64, size: f64) -> f64 {
	if size <= 0.0 {
		return 0.0;
	}
	let wrapped = ((value % size) + size) % size;
	// `(-tiny % size) + size` can round up to exactly `size`.
	if wrapped >= size { 0.0 } else { wrapped }
}

/// Offset that moves a coordinate near an edge to the opposite side.
fn mirror(value: f64, size: f64, radius: f64) -> f64 {
	if value < radius {
		size
	} else if value > size - radius {
		-size
	} else {
		0.0
	}
}

/// One or two positions at which a particle must be drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawPositions {
	/// The wrapped position, inside `[0, size)` on both axes.
	pub primary: Vec2,
	/// Twin on the opposite side when the primary straddles an edge.
	pub mirror: Option<Vec2>,
}

impl DrawPositions {
	/// The primary position, then the mirror if there is one.
	pub fn iter(&self) -> impl Iterator<Item = Vec2> {
		std::iter::once(self.primary).chain(self.mirror)
	}
}

/// Wraps `position` onto the torus of `size`, and adds a mirrored twin if the
/// wrapped point lies within `mirror_radius` of any edge.
pub fn wrap_toroidal_with_mirror(position: Vec2, size: Vec2, mirror_radius: f64) -> DrawPositions {
	let primary = Vec2::new(cycle(position.x, size.x), cycle(position.y, size.y));
	let offset = Vec2::new(
		mirror(primary.x, size.x, mirror_radius),
		mirror(primary.y, size.y, mirror_radius),
	);
	let mirror = (offset != Vec2::ZERO).then(|| primary + offset);
	DrawPositions { primary, mirror }
}

#[cfg(test)]
mod tests {
	use std::f64::consts::FRAC_PI_2;

	use proptest::prelude::*;

	use super::*;

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-9
	}

	#[test]
	fn polar_conversion() {
		let v = polar_to_cartesian(2.0, FRAC_PI_2);
		assert!(close(v.x, 0.0));
		assert!(close(v.y, 2.0));
	}

	#[test]
	fn normalize_zero_vector_is_zero() {
		assert_eq!(Vec2::ZERO.normalize_or_zero(), Vec2::ZERO);
	}

	#[test]
	fn cycle_handles_negatives_and_overflow() {
		assert!(close(cycle(-1.0, 10.0), 9.0));
		assert!(close(cycle(25.0, 10.0), 5.0));
		assert!(close(cycle(10.0, 10.0), 0.0));
		assert_eq!(cycle(-1e-20, 10.0), 0.0);
	}

	#[test]
	fn interior_point_draws_once() {
		let p = wrap_toroidal_with_mirror(Vec2::new(50.0, 50.0), Vec2::new(100.0, 100.0), 2.0);
		assert_eq!(p.mirror, None);
		assert_eq!(p.primary, Vec2::new(50.0, 50.0));
	}

	#[test]
	fn left_edge_mirrors_to_right() {
		let size = Vec2::new(100.0, 80.0);
		let p = wrap_toroidal_with_mirror(Vec2::new(-99.5, 40.0), size, 1.0);
		let twin = p.mirror.unwrap();
		assert!(close(twin.x - p.primary.x, size.x));
		assert!(close(twin.y, p.primary.y));
	}

	#[test]
	fn corner_mirrors_on_both_axes() {
		let size = Vec2::new(100.0, 80.0);
		let p = wrap_toroidal_with_mirror(Vec2::new(99.5, 0.5), size, 1.0);
		let twin = p.mirror.unwrap();
		assert!(close(p.primary.x - twin.x, size.x));
		assert!(close(twin.y - p.primary.y, size.y));
		assert_eq!(p.iter().count(), 2);
	}

	fn expected_offset(value: f64, size: f64, radius: f64) -> f64 {
		if value < radius {
			size
		} else if value > size - radius {
			-size
		} else {
			0.0
		}
	}

	proptest! {
		#[test]
		fn cycle_lands_in_range(value in -1e6f64..1e6, size in 0.5f64..5000.0) {
			let c = cycle(value, size);
			prop_assert!((0.0..size).contains(&c));
		}

		#[test]
		fn wrap_mirrors_exactly_across_near_edges(
			x in -5000.0f64..5000.0,
			y in -5000.0f64..5000.0,
			w in 20.0f64..1000.0,
			h in 20.0f64..1000.0,
			radius in 0.0f64..5.0,
		) {
			let size = Vec2::new(w, h);
			let p = wrap_toroidal_with_mirror(Vec2::new(x, y), size, radius);
			prop_assert!((0.0..w).contains(&p.primary.x));
			prop_assert!((0.0..h).contains(&p.primary.y));

			let dx = expected_offset(p.primary.x, w, radius);
			let dy = expected_offset(p.primary.y, h, radius);
			match p.mirror {
				None => prop_assert!(dx == 0.0 && dy == 0.0),
				Some(twin) => {
					prop_assert!(dx != 0.0 || dy != 0.0);
					prop_assert!(((twin.x - p.primary.x) - dx).abs() < 1e-6);
					prop_assert!(((twin.y - p.primary.y) - dy).abs() < 1e-6);
					prop_assert_eq!(p.iter().count(), 2);
				}
			}
		}

		#[test]
		fn near_edge_positions_always_mirror(
			along in 0.0f64..1.0,
			inset in 0.0f64..0.99,
			corner in any::<bool>(),
			right in any::<bool>(),
		) {
			let size = Vec2::new(200.0, 120.0);
			let radius = 2.0;
			let edge_x = if right { size.x - inset * radius } else { inset * radius };
			let y = if corner { inset * radius } else { 10.0 + along * 100.0 };
			let p = wrap_toroidal_with_mirror(Vec2::new(edge_x, y), size, radius);
			let twin = p.mirror.unwrap();
			prop_assert!(((twin.x - p.primary.x).abs() - size.x).abs() < 1e-9);
			if corner {
				prop_assert!(((twin.y - p.primary.y) - size.y).abs() < 1e-9);
			} else {
				prop_assert_eq!(twin.y, p.primary.y);
			}
		}
	}
}
