//! Paints the particle field for one clock value.
//!
//! Rendering is stateless: every paint re-reads the channel, clears the
//! surface and re-evaluates every particle from scratch. Painting twice with
//! the same inputs issues exactly the same draw calls.
//!
//! Simulation runs in device pixels. A surface that already works in device
//! pixels (a canvas backing store sized by the pixel ratio) draws them 1:1; a
//! surface in logical pixels gets coordinates divided by the device pixel
//! ratio.

use std::f64::consts::TAU;

use web_sys::CanvasRenderingContext2d;

use super::channel::{ChannelSource, ChannelValues};
use super::color::{Hsl, Hsla};
use super::particle::{ParticleModel, RenderState, Shape, SurfaceConfig};
use super::policy::Layout;
use super::vector::Vec2;

/// Units a surface's drawing coordinates are expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelSpace {
	/// Physical pixels; simulation coordinates map 1:1.
	Device,
	/// CSS pixels; simulation coordinates are divided by the pixel ratio.
	Logical,
}

/// 2D raster target.
pub trait Surface {
	/// Units the other methods take.
	fn pixel_space(&self) -> PixelSpace;
	/// Clears `size` from the top-left corner.
	fn clear(&mut self, size: Vec2);
	/// Fills an axis-aligned rectangle.
	fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Hsla);
	/// Fills a disc.
	fn fill_circle(&mut self, center: Vec2, radius: f64, color: Hsla);
}

impl Surface for CanvasRenderingContext2d {
	fn pixel_space(&self) -> PixelSpace {
		PixelSpace::Device
	}

	fn clear(&mut self, size: Vec2) {
		self.clear_rect(0.0, 0.0, size.x, size.y);
	}

	fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Hsla) {
		self.set_fill_style_str(&color.to_string());
		CanvasRenderingContext2d::fill_rect(self, origin.x, origin.y, size.x, size.y);
	}

	fn fill_circle(&mut self, center: Vec2, radius: f64, color: Hsla) {
		self.set_fill_style_str(&color.to_string());
		self.begin_path();
		let _ = self.arc(center.x, center.y, radius, 0.0, TAU);
		self.fill();
	}
}

/// Divisor from simulation (device) pixels to surface units.
pub fn effective_ratio(space: PixelSpace, device_scale: f64) -> f64 {
	match space {
		PixelSpace::Device => 1.0,
		PixelSpace::Logical if device_scale.is_finite() && device_scale > 0.0 => device_scale,
		PixelSpace::Logical => 1.0,
	}
}

/// Global multiplier for the hide fade-in and the reveal fade-out.
pub fn transition_alpha(values: &ChannelValues) -> f64 {
	let fade_in = |t: f64| {
		if values.fade > 0.0 {
			(t / values.fade).clamp(0.0, 1.0)
		} else {
			1.0
		}
	};
	match values.t_stop {
		None => fade_in(values.t),
		Some(_) if values.fade <= 0.0 => 0.0,
		Some(stop) => {
			let fade_out = (1.0 - (values.t - stop) / values.fade).clamp(0.0, 1.0);
			fade_in(stop) * fade_out
		}
	}
}

impl SurfaceConfig {
	/// Config for a surface of the given logical size, taking everything else from the channel.
	pub fn from_channel(size: Vec2, values: &ChannelValues, device_scale: f64) -> Self {
		Self {
			width: size.x,
			height: size.y,
			gap: values.gap,
			density: values.density,
			accent: values.accent,
			device_scale,
		}
	}
}

/// Every live particle of one tile at `world_t`.
///
/// The tiles of a layout are identical, so a frame evaluates this once and
/// replays the result at each tile origin; cost stays bounded by
/// [`MAX_PARTICLES`](super::particle::MAX_PARTICLES) whatever the tile count.
pub fn field_states(config: &SurfaceConfig, model: &ParticleModel, world_t: f64) -> Vec<RenderState> {
	(0..config.particle_count())
		.filter_map(|i| model.evaluate(i, world_t, config))
		.collect()
}

/// Draws precomputed particle states with the tile's top-left at `origin`
/// (logical pixels), scaled by the global transition `alpha`. Returns the
/// number of fills issued.
pub fn draw_states(
	surface: &mut impl Surface,
	states: &[RenderState],
	device_scale: f64,
	origin: Vec2,
	alpha: f64,
) -> usize {
	let ratio = effective_ratio(surface.pixel_space(), device_scale);
	let offset = origin * device_scale;
	let mut fills = 0;

	for state in states {
		let color = state.color.with_alpha(state.alpha * alpha);
		let size = state.size / ratio;
		for position in state.positions.iter() {
			let center = (position + offset) * (1.0 / ratio);
			match state.shape {
				Shape::Square => surface.fill_rect(
					center - Vec2::new(size / 2.0, size / 2.0),
					Vec2::new(size, size),
					color,
				),
				Shape::Circle => surface.fill_circle(center, size / 2.0, color),
			}
			fills += 1;
		}
	}
	fills
}

/// Clears the surface and paints a single surface-sized field at `values.t`.
/// Returns the number of particles drawn.
pub fn render(surface: &mut impl Surface, config: &SurfaceConfig, values: &ChannelValues) -> usize {
	let ratio = effective_ratio(surface.pixel_space(), config.device_scale);
	surface.clear(Vec2::new(config.width, config.height) * (config.device_scale / ratio));
	let alpha = transition_alpha(values);
	if alpha <= 0.0 {
		return 0;
	}
	let states = field_states(config, &ParticleModel::default(), values.t);
	draw_states(surface, &states, config.device_scale, Vec2::ZERO, alpha);
	states.len()
}

/// Paint callback entry point: surface dimensions and pixel ratio from the
/// host, everything else read fresh from the channel.
pub fn paint(
	surface: &mut impl Surface,
	source: &impl ChannelSource,
	size: Vec2,
	device_scale: f64,
) -> usize {
	let values = ChannelValues::read(source);
	let config = SurfaceConfig::from_channel(size, &values, device_scale);
	render(surface, &config, &values)
}

/// Clears the whole layout extent and paints every tile. Particles are
/// evaluated once per call; the return value is that count, not the number
/// of tiles times it.
pub fn paint_layout(
	surface: &mut impl Surface,
	source: &impl ChannelSource,
	layout: &Layout,
	device_scale: f64,
) -> usize {
	let values = ChannelValues::read(source);
	let config = SurfaceConfig::from_channel(layout.tile_size(), &values, device_scale);
	let ratio = effective_ratio(surface.pixel_space(), device_scale);
	surface.clear(layout.extent() * (device_scale / ratio));

	let alpha = transition_alpha(&values);
	if alpha <= 0.0 {
		return 0;
	}
	let states = field_states(&config, &ParticleModel::default(), values.t);
	for origin in layout.tile_origins() {
		draw_states(surface, &states, device_scale, origin, alpha);
	}
	states.len()
}

/// Non-animated cover used when the particle field is unavailable.
pub fn paint_static(surface: &mut impl Surface, extent: Vec2, accent: Hsl, device_scale: f64) {
	let ratio = effective_ratio(surface.pixel_space(), device_scale);
	let size = extent * (device_scale / ratio);
	surface.clear(size);
	surface.fill_rect(Vec2::ZERO, size, accent.with_alpha(1.0));
}
