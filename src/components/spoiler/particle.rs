//! Stateless particle lifecycle model.
//!
//! Every particle is a pure function of `(index, world time, surface config)`.
//! Nothing is stored between frames: each evaluation re-seeds an [`Lcg`] for
//! the particle and replays its draws in a fixed order, then reconstructs the
//! particle's age, position, size and opacity from the global clock alone.
//!
//! Draw order per particle (changing it changes every frame ever rendered):
//! origin x, origin y, speed, size jitter, lightness factor, launch angle,
//! shape, lifetime, respawn gap, phase.

use std::f64::consts::TAU;

use super::color::Hsl;
use super::rng::Lcg;
use super::vector::{DrawPositions, Vec2, polar_to_cartesian, wrap_toroidal_with_mirror};

/// Upper bound on particles per surface, regardless of area.
pub const MAX_PARTICLES: usize = 4000;
/// Length of the size ramp at birth and at death, in seconds.
pub const FADE_WINDOW: f64 = 0.2;

const BASE_SEED: u32 = 0x2545_f491;
const SEED_STRIDE: u32 = 0x9e37_79b9;

// Device pixels (per second).
const MIN_SPEED: f64 = 2.0;
const MAX_SPEED: f64 = 12.0;
const BASE_SIZE: f64 = 1.0;
const SIZE_JITTER: f64 = 1.5;

const CIRCLE_CHANCE: f64 = 0.4;
const MIN_LIFETIME: f64 = 0.6;
const MAX_LIFETIME: f64 = 2.4;
const MAX_RESPAWN_GAP: f64 = 0.8;

/// Immutable description of one paint surface.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceConfig {
	/// Logical width.
	pub width: f64,
	/// Logical height.
	pub height: f64,
	/// Logical inset kept clear on each side (x, y).
	pub gap: Vec2,
	/// Logical square pixels per particle.
	pub density: f64,
	/// Base color before per-particle lightness.
	pub accent: Hsl,
	/// Device pixels per logical pixel.
	pub device_scale: f64,
}

impl SurfaceConfig {
	/// Top-left of the particle field, in device pixels.
	pub fn field_origin(&self) -> Vec2 {
		self.gap * self.device_scale
	}

	/// Size of the particle field (the surface minus its gaps), in device pixels.
	pub fn field_size(&self) -> Vec2 {
		Vec2::new(
			(self.width - 2.0 * self.gap.x).max(0.0),
			(self.height - 2.0 * self.gap.y).max(0.0),
		) * self.device_scale
	}

	/// Number of particles on this surface. Depends only on the config, never on time.
	pub fn particle_count(&self) -> usize {
		if !(self.density.is_finite() && self.density > 0.0) {
			return 0;
		}
		let area = (self.width - 2.0 * self.gap.x).max(0.0) * (self.height - 2.0 * self.gap.y).max(0.0);
		let n = (area / self.density).floor();
		if n >= MAX_PARTICLES as f64 {
			MAX_PARTICLES
		} else {
			n as usize
		}
	}
}

/// Fill primitive for a particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
	/// Axis-aligned square centered on the position.
	Square,
	/// Disc centered on the position.
	Circle,
}

/// Everything that is fixed about a particle for its whole existence.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleSpec {
	/// Position in the surface's particle sequence.
	pub index: usize,
	/// Generator seed derived from the index.
	pub seed: u32,
	/// Launch position inside the field, device pixels.
	pub origin: Vec2,
	/// Initial velocity, device pixels per second.
	pub velocity: Vec2,
	/// Seconds the particle is alive per cycle.
	pub lifetime: f64,
	/// Seconds it stays gone before respawning.
	pub respawn_gap: f64,
	/// Offset into the cycle, in `[0, cycle_length)`.
	pub phase: f64,
	/// Size shared by every particle, device pixels.
	pub base_size: f64,
	/// Extra size drawn for this particle, device pixels.
	pub size_jitter: f64,
	/// Fill primitive.
	pub shape: Shape,
	/// Fraction of the accent lightness, in `[0.5, 1.0)`.
	pub lightness: f64,
}

fn particle_seed(index: usize) -> u32 {
	// Index is bounded by MAX_PARTICLES.
	let mut x = BASE_SEED ^ (index as u32).wrapping_mul(SEED_STRIDE);
	x ^= x >> 16;
	x = x.wrapping_mul(0x7feb_352d);
	x ^= x >> 15;
	x = x.wrapping_mul(0x846c_a68b);
	x ^ (x >> 16)
}

impl ParticleSpec {
	/// Replays the seeded draws for particle `index` on `config`.
	pub fn derive(index: usize, config: &SurfaceConfig) -> Self {
		let seed = particle_seed(index);
		let mut rng = Lcg::new(seed);
		let field = config.field_size();

		let origin = Vec2::new(rng.next_range(0.0, field.x), rng.next_range(0.0, field.y));
		let speed = rng.next_range(MIN_SPEED, MAX_SPEED);
		let size_jitter = rng.next_range(0.0, SIZE_JITTER);
		let lightness = 0.5 + 0.5 * rng.next_unit();
		let angle = rng.next_range(0.0, TAU);
		let shape = if rng.next_unit() < CIRCLE_CHANCE {
			Shape::Circle
		} else {
			Shape::Square
		};
		let lifetime = rng.next_range(MIN_LIFETIME, MAX_LIFETIME);
		let respawn_gap = rng.next_range(0.0, MAX_RESPAWN_GAP);
		let phase = rng.next_range(0.0, lifetime + respawn_gap);

		Self {
			index,
			seed,
			origin,
			velocity: polar_to_cartesian(speed, angle),
			lifetime,
			respawn_gap,
			phase,
			base_size: BASE_SIZE,
			size_jitter,
			shape,
			lightness,
		}
	}

	/// Lifetime plus respawn gap.
	pub fn cycle_length(&self) -> f64 {
		self.lifetime + self.respawn_gap
	}

	/// Age within the current cycle, capped at the lifetime.
	pub fn local_age(&self, world_t: f64) -> f64 {
		(world_t + self.phase)
			.rem_euclid(self.cycle_length())
			.min(self.lifetime)
	}
}

/// Size envelope: linear ramp up over [`FADE_WINDOW`], hold, linear ramp down
/// over the last [`FADE_WINDOW`] of the lifetime. Always in `[0, 1]`.
pub fn visibility_envelope(t: f64, lifetime: f64) -> f64 {
	let rise = t / FADE_WINDOW;
	let fall = (lifetime - t) / FADE_WINDOW;
	rise.min(fall).clamp(0.0, 1.0)
}

/// Linear opacity decay over the lifetime, in `[0, 1]`.
pub fn opacity(t: f64, lifetime: f64) -> f64 {
	if lifetime <= 0.0 {
		return 0.0;
	}
	(1.0 - t / lifetime).clamp(0.0, 1.0)
}

/// What to draw for one particle in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
	/// Device pixel centers, already offset by the field origin.
	pub positions: DrawPositions,
	/// Edge length or diameter, device pixels.
	pub size: f64,
	/// Opacity in `[0, 1]`.
	pub alpha: f64,
	/// Fill primitive.
	pub shape: Shape,
	/// Fill color without alpha.
	pub color: Hsl,
}

/// Motion parameters shared by every particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleModel {
	/// Linear deceleration along the launch direction. Zero keeps velocity constant.
	pub friction: f64,
}

impl Default for ParticleModel {
	fn default() -> Self {
		Self { friction: 0.0 }
	}
}

impl ParticleModel {
	/// Velocity `t` seconds after launch, slowed by friction.
	pub fn velocity_at(&self, spec: &ParticleSpec, t: f64) -> Vec2 {
		spec.velocity - spec.velocity.normalize_or_zero() * (0.5 * self.friction * t)
	}

	/// Render state of `spec` at `world_t`, or `None` while it is between
	/// death and respawn.
	pub fn render_state(
		&self,
		spec: &ParticleSpec,
		world_t: f64,
		config: &SurfaceConfig,
	) -> Option<RenderState> {
		let t = spec.local_age(world_t);
		if t >= spec.lifetime {
			return None;
		}

		let position = spec.origin + self.velocity_at(spec, t) * t;
		let size = (spec.base_size + spec.size_jitter) * visibility_envelope(t, spec.lifetime);
		let accent = config.accent;
		let color = Hsl::new(accent.h, accent.s, accent.l * spec.lightness);

		let wrapped = wrap_toroidal_with_mirror(position, config.field_size(), size / 2.0);
		let origin = config.field_origin();
		let positions = DrawPositions {
			primary: wrapped.primary + origin,
			mirror: wrapped.mirror.map(|m| m + origin),
		};

		Some(RenderState {
			positions,
			size,
			alpha: opacity(t, spec.lifetime),
			shape: spec.shape,
			color,
		})
	}

	/// [`render_state`](Self::render_state) for the particle at `index`.
	pub fn evaluate(&self, index: usize, world_t: f64, config: &SurfaceConfig) -> Option<RenderState> {
		self.render_state(&ParticleSpec::derive(index, config), world_t, config)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	use super::*;

	fn torus_distance(a: f64, b: f64, size: f64) -> f64 {
		let d = (a - b).abs();
		d.min((size - d).abs())
	}

	fn config() -> SurfaceConfig {
		SurfaceConfig {
			width: 300.0,
			height: 100.0,
			gap: Vec2::new(6.0, 6.0),
			density: 8.0,
			accent: Hsl::new(210.0, 40.0, 60.0),
			device_scale: 2.0,
		}
	}

	#[test]
	fn evaluation_is_deterministic() {
		let model = ParticleModel::default();
		let cfg = config();
		for i in 0..200 {
			for &t in &[0.0, 0.37, 5.123, 1000.5] {
				assert_eq!(model.evaluate(i, t, &cfg), model.evaluate(i, t, &cfg));
			}
		}
	}

	#[test]
	fn particles_differ_from_each_other() {
		let cfg = config();
		let a = ParticleSpec::derive(0, &cfg);
		let b = ParticleSpec::derive(1, &cfg);
		assert_ne!(a.origin, b.origin);
		assert_ne!(a.phase, b.phase);
	}

	#[test]
	fn spec_fields_fall_in_their_ranges() {
		let cfg = config();
		let field = cfg.field_size();
		for i in 0..500 {
			let s = ParticleSpec::derive(i, &cfg);
			assert!((0.0..field.x).contains(&s.origin.x));
			assert!((0.0..field.y).contains(&s.origin.y));
			assert!((MIN_LIFETIME..MAX_LIFETIME).contains(&s.lifetime));
			assert!((0.0..s.cycle_length()).contains(&s.phase));
			assert!((0.5..1.0).contains(&s.lightness));
			let speed = s.velocity.length();
			assert!(speed >= MIN_SPEED - 1e-9 && speed < MAX_SPEED + 1e-9);
		}
	}

	#[test]
	fn launches_are_desynchronized() {
		let cfg = config();
		let phases: Vec<f64> = (0..50).map(|i| ParticleSpec::derive(i, &cfg).phase).collect();
		let first = phases[0];
		assert!(phases.iter().any(|&p| (p - first).abs() > 0.1));
	}

	#[test]
	fn alpha_and_envelope_stay_in_unit_range() {
		for step in 0..=1000 {
			let lifetime = 1.3;
			let t = lifetime * f64::from(step) / 1000.0;
			let e = visibility_envelope(t, lifetime);
			let a = opacity(t, lifetime);
			assert!((0.0..=1.0).contains(&e), "envelope {e} at {t}");
			assert!((0.0..=1.0).contains(&a), "alpha {a} at {t}");
		}
	}

	#[test]
	fn short_lifetimes_clamp_overlapping_ramps() {
		let lifetime = 0.1;
		for step in 0..=100 {
			let t = lifetime * f64::from(step) / 100.0;
			let e = visibility_envelope(t, lifetime);
			assert!((0.0..=1.0).contains(&e));
		}
		assert!(visibility_envelope(0.05, lifetime) < 1.0);
	}

	#[test]
	fn envelope_is_trapezoidal() {
		assert_eq!(visibility_envelope(0.0, 2.0), 0.0);
		assert!((visibility_envelope(0.1, 2.0) - 0.5).abs() < 1e-12);
		assert_eq!(visibility_envelope(1.0, 2.0), 1.0);
		assert!((visibility_envelope(1.9, 2.0) - 0.5).abs() < 1e-9);
	}

	#[test]
	fn dead_particles_are_skipped() {
		let model = ParticleModel::default();
		let cfg = config();
		let spec = (0..100)
			.map(|i| ParticleSpec::derive(i, &cfg))
			.find(|s| s.respawn_gap > 0.1)
			.unwrap();
		// Middle of the respawn gap.
		let world_t = 10.0 * spec.cycle_length() - spec.phase + spec.lifetime + spec.respawn_gap / 2.0;
		assert_eq!(spec.local_age(world_t), spec.lifetime);
		assert!(model.render_state(&spec, world_t, &cfg).is_none());
	}

	#[test]
	fn state_repeats_every_cycle() {
		let model = ParticleModel::default();
		let cfg = config();
		for i in 0..20 {
			let spec = ParticleSpec::derive(i, &cfg);
			let cycle = spec.cycle_length();
			let world_t = 3.0 * cycle - spec.phase + spec.lifetime / 2.0;
			let base = model.render_state(&spec, world_t, &cfg).unwrap();
			for k in 1..5 {
				let later = model
					.render_state(&spec, world_t + f64::from(k) * cycle, &cfg)
					.unwrap();
				assert!((later.positions.primary.x - base.positions.primary.x).abs() < 1e-6);
				assert!((later.positions.primary.y - base.positions.primary.y).abs() < 1e-6);
				assert!((later.alpha - base.alpha).abs() < 1e-9);
				assert!((later.size - base.size).abs() < 1e-9);
			}
		}
	}

	#[test]
	fn positions_stay_inside_field_plus_gap() {
		let model = ParticleModel::default();
		let cfg = config();
		let origin = cfg.field_origin();
		let field = cfg.field_size();
		for i in 0..300 {
			if let Some(state) = model.evaluate(i, 42.0, &cfg) {
				let p = state.positions.primary;
				assert!(p.x >= origin.x && p.x < origin.x + field.x);
				assert!(p.y >= origin.y && p.y < origin.y + field.y);
			}
		}
	}

	#[test]
	fn color_keeps_hue_and_saturation() {
		let model = ParticleModel::default();
		let cfg = config();
		let state = (0..100).find_map(|i| model.evaluate(i, 1.0, &cfg)).unwrap();
		assert_eq!(state.color.h, 210.0);
		assert_eq!(state.color.s, 40.0);
		assert!(state.color.l >= 30.0 && state.color.l < 60.0);
	}

	#[test]
	fn friction_slows_particles() {
		let cfg = config();
		let spec = ParticleSpec::derive(0, &cfg);
		let still = ParticleModel::default().velocity_at(&spec, 0.5);
		let braked = ParticleModel { friction: 4.0 }.velocity_at(&spec, 0.5);
		assert_eq!(still, spec.velocity);
		assert!((spec.velocity.length() - braked.length() - 1.0).abs() < 1e-9);
	}

	#[test]
	fn particle_count_uses_area_and_cap() {
		let cfg = config();
		// (300 - 12) * (100 - 12) / 8
		assert_eq!(cfg.particle_count(), 3168);

		let big = SurfaceConfig {
			width: 2000.0,
			height: 2000.0,
			..config()
		};
		assert_eq!(big.particle_count(), MAX_PARTICLES);

		let broken = SurfaceConfig {
			density: 0.0,
			..config()
		};
		assert_eq!(broken.particle_count(), 0);
	}

	proptest! {
		#[test]
		fn any_particle_evaluates_identically_twice(index in 0usize..3168, world_t in 0.0f64..1e5) {
			let model = ParticleModel::default();
			let cfg = config();
			prop_assert_eq!(model.evaluate(index, world_t, &cfg), model.evaluate(index, world_t, &cfg));
		}

		#[test]
		fn envelope_and_alpha_bounded_over_lifetime(lifetime in 0.05f64..3.0, frac in 0.0f64..1.0) {
			let t = lifetime * frac;
			prop_assert!((0.0..=1.0).contains(&visibility_envelope(t, lifetime)));
			prop_assert!((0.0..=1.0).contains(&opacity(t, lifetime)));
		}

		#[test]
		fn rendered_alpha_and_size_bounded(index in 0usize..3168, world_t in 0.0f64..1e4) {
			let cfg = config();
			let spec = ParticleSpec::derive(index, &cfg);
			match ParticleModel::default().render_state(&spec, world_t, &cfg) {
				Some(state) => {
					prop_assert!(spec.local_age(world_t) < spec.lifetime);
					prop_assert!((0.0..=1.0).contains(&state.alpha));
					prop_assert!(state.size >= 0.0 && state.size <= BASE_SIZE + SIZE_JITTER);
				}
				None => prop_assert_eq!(spec.local_age(world_t), spec.lifetime),
			}
		}

		#[test]
		fn state_repeats_after_any_number_of_cycles(
			index in 0usize..3168,
			start_cycle in 0u32..100,
			k in 0u32..50,
			within in 0.05f64..0.95,
		) {
			let model = ParticleModel::default();
			let cfg = config();
			let field = cfg.field_size();
			let spec = ParticleSpec::derive(index, &cfg);
			let cycle = spec.cycle_length();
			let world_t = f64::from(start_cycle) * cycle - spec.phase + within * spec.lifetime;
			let base = model.render_state(&spec, world_t, &cfg).unwrap();
			let later = model.render_state(&spec, world_t + f64::from(k) * cycle, &cfg).unwrap();

			prop_assert!(torus_distance(later.positions.primary.x, base.positions.primary.x, field.x) < 1e-6);
			prop_assert!(torus_distance(later.positions.primary.y, base.positions.primary.y, field.y) < 1e-6);
			prop_assert!((later.alpha - base.alpha).abs() < 1e-9);
			prop_assert!((later.size - base.size).abs() < 1e-9);
			prop_assert_eq!(later.shape, base.shape);
		}
	}
}
