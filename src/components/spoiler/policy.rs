//! Activation policy: how a spoiler is laid out, whether it animates at all,
//! and when it is suspended.
//!
//! # Layouts
//!
//! - [`Layout::Full`]: small block regions get a single surface with edge gaps.
//! - [`Layout::Tiled`]: oversized block regions repeat a fixed-size tile and
//!   drop the gap, since a gap would show as a grid of seams.
//! - [`Layout::TextRows`]: inline content repeats a tile one text line tall,
//!   with a vertical gap only so particles stay off the line spacing.
//!
//! Gaps are capped to `min(tile width, tile height) / GAP_RATIO` so they never
//! swallow a small region.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use super::vector::Vec2;

/// Largest tile edge, in logical pixels.
pub const MAX_TILE_SIZE: f64 = 256.0;
/// Divisor applied to the smaller tile edge to get the largest allowed gap.
pub const GAP_RATIO: f64 = 5.0;

/// How the target element flows in the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayKind {
	/// Block-level box, covered as one region.
	Block,
	/// Inline text, covered line by line.
	Inline,
}

/// Measured target element, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementGeometry {
	/// Box width.
	pub width: f64,
	/// Box height.
	pub height: f64,
	/// Block or inline flow.
	pub display: DisplayKind,
	/// Computed line height, when the element has text.
	pub line_height: Option<f64>,
}

impl ElementGeometry {
	/// A block-level box without text metrics.
	pub const fn block(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			display: DisplayKind::Block,
			line_height: None,
		}
	}

	/// An inline run of text with the given line height.
	pub const fn inline(width: f64, height: f64, line_height: f64) -> Self {
		Self {
			width,
			height,
			display: DisplayKind::Inline,
			line_height: Some(line_height),
		}
	}
}

/// How the particle surface covers an element. See the module docs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Layout {
	/// One surface the size of the element.
	Full {
		/// Element size.
		extent: Vec2,
		/// Capped edge gap on each axis.
		gap: Vec2,
	},
	/// Fixed-size tiles repeated over a large block.
	Tiled {
		/// Element size.
		extent: Vec2,
		/// Size of one tile.
		tile: Vec2,
	},
	/// One-line tiles repeated over inline text.
	TextRows {
		/// Element size.
		extent: Vec2,
		/// Size of one tile, one line tall.
		tile: Vec2,
		/// Capped vertical gap.
		gap_y: f64,
	},
}

fn sane(v: f64) -> f64 {
	if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Caps each gap component to the smaller tile dimension over [`GAP_RATIO`].
pub fn cap_gap(requested: Vec2, tile: Vec2) -> Vec2 {
	let cap = sane(tile.x.min(tile.y) / GAP_RATIO);
	Vec2::new(sane(requested.x).min(cap), sane(requested.y).min(cap))
}

/// Picks the layout for an element.
pub fn choose_layout(geometry: &ElementGeometry, requested_gap: Vec2) -> Layout {
	let extent = Vec2::new(sane(geometry.width), sane(geometry.height));
	match geometry.display {
		DisplayKind::Inline => {
			let line = geometry
				.line_height
				.map(sane)
				.filter(|lh| *lh > 0.0)
				.unwrap_or(extent.y);
			let tile = Vec2::new(extent.x.min(MAX_TILE_SIZE), line);
			Layout::TextRows {
				extent,
				tile,
				gap_y: cap_gap(Vec2::new(0.0, requested_gap.y), tile).y,
			}
		}
		DisplayKind::Block if extent.x > MAX_TILE_SIZE || extent.y > MAX_TILE_SIZE => Layout::Tiled {
			extent,
			tile: Vec2::new(extent.x.min(MAX_TILE_SIZE), extent.y.min(MAX_TILE_SIZE)),
		},
		DisplayKind::Block => Layout::Full {
			extent,
			gap: cap_gap(requested_gap, extent),
		},
	}
}

impl Layout {
	/// Size of the whole covered region.
	pub fn extent(&self) -> Vec2 {
		match *self {
			Self::Full { extent, .. } | Self::Tiled { extent, .. } | Self::TextRows { extent, .. } => extent,
		}
	}

	/// Size of the surface the particle field is evaluated on.
	pub fn tile_size(&self) -> Vec2 {
		match *self {
			Self::Full { extent, .. } => extent,
			Self::Tiled { tile, .. } | Self::TextRows { tile, .. } => tile,
		}
	}

	/// Gap actually in force for each tile.
	pub fn gap(&self) -> Vec2 {
		match *self {
			Self::Full { gap, .. } => gap,
			Self::Tiled { .. } => Vec2::ZERO,
			Self::TextRows { gap_y, .. } => Vec2::new(0.0, gap_y),
		}
	}

	/// Whether the field repeats over more than one tile.
	pub fn is_tiled(&self) -> bool {
		!matches!(self, Self::Full { .. })
	}

	/// Top-left corner of every tile needed to cover the extent.
	pub fn tile_origins(&self) -> Vec<Vec2> {
		let extent = self.extent();
		let tile = self.tile_size();
		if tile.x <= 0.0 || tile.y <= 0.0 {
			return Vec::new();
		}
		let cols = (extent.x / tile.x).ceil() as usize;
		let rows = (extent.y / tile.y).ceil() as usize;
		let mut origins = Vec::with_capacity(cols * rows);
		for row in 0..rows {
			for col in 0..cols {
				origins.push(Vec2::new(col as f64 * tile.x, row as f64 * tile.y));
			}
		}
		origins
	}
}

/// Whether the host can draw the animated surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderCapability {
	/// A 2D canvas context can be created.
	Canvas2d,
	/// No drawing surface.
	Unavailable,
}

/// What actually draws the cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
	/// Particle field driven by the clock.
	Animated,
	/// Flat accent-colored cover, no animation.
	Static,
}

/// Animated when the host can draw and the fallback was not forced.
pub fn choose_backend(capability: RenderCapability, force_fallback: bool) -> Backend {
	match capability {
		RenderCapability::Canvas2d if !force_fallback => Backend::Animated,
		_ => Backend::Static,
	}
}

/// Facts about the host, decided once at startup and passed in explicitly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostEnvironment {
	/// Drawing support.
	pub capability: RenderCapability,
	/// `prefers-reduced-motion: reduce` is set.
	pub reduced_motion: bool,
	/// Raw device pixel ratio; see [`pixel_ratio`](Self::pixel_ratio).
	pub device_pixel_ratio: f64,
}

impl Default for HostEnvironment {
	fn default() -> Self {
		Self {
			capability: RenderCapability::Canvas2d,
			reduced_motion: false,
			device_pixel_ratio: 1.0,
		}
	}
}

impl HostEnvironment {
	/// Device pixel ratio, or 1.0 when the host reported nonsense.
	pub fn pixel_ratio(&self) -> f64 {
		if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
			self.device_pixel_ratio
		} else {
			1.0
		}
	}
}

/// Handle that ends a visibility subscription when dropped.
pub struct Subscription {
	cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
	/// Runs `cancel` once, when the handle is dropped.
	pub fn new(cancel: impl FnOnce() + 'static) -> Self {
		Self {
			cancel: Some(Box::new(cancel)),
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.cancel.is_some())
			.finish()
	}
}

/// Reports when the target region enters or leaves the viewport.
pub trait VisibilitySource {
	/// Registers the two callbacks until the returned handle is dropped.
	fn subscribe(&mut self, on_visible: Box<dyn FnMut()>, on_hidden: Box<dyn FnMut()>) -> Subscription;
}

/// Something that can be paused while off-screen.
pub trait Suspendable {
	/// Pauses work while off-screen.
	fn suspend(&mut self);
	/// Picks up again after [`suspend`](Self::suspend).
	fn resume(&mut self);
}

/// Suspends `target` while the source reports it off-screen.
pub fn bind_visibility<V, T>(source: &mut V, target: &Rc<RefCell<T>>) -> Subscription
where
	V: VisibilitySource + ?Sized,
	T: Suspendable + 'static,
{
	let (on_visible, on_hidden) = (Rc::clone(target), Rc::clone(target));
	source.subscribe(
		Box::new(move || match on_visible.try_borrow_mut() {
			Ok(mut t) => t.resume(),
			Err(_) => warn!("spoiler: visibility change while busy, ignoring"),
		}),
		Box::new(move || match on_hidden.try_borrow_mut() {
			Ok(mut t) => t.suspend(),
			Err(_) => warn!("spoiler: visibility change while busy, ignoring"),
		}),
	)
}

type Listener = Rc<RefCell<(Box<dyn FnMut()>, Box<dyn FnMut()>)>>;

/// Visibility driven by explicit calls, for headless hosts and tests.
#[derive(Clone, Default)]
pub struct ManualVisibility {
	listeners: Rc<RefCell<Vec<(u32, Listener)>>>,
	next_id: Rc<RefCell<u32>>,
}

impl ManualVisibility {
	/// A source with no listeners.
	pub fn new() -> Self {
		Self::default()
	}

	/// Notifies every listener. Callbacks may subscribe or unsubscribe while
	/// this runs; the change applies from the next call.
	pub fn set_visible(&self, visible: bool) {
		let listeners: Vec<Listener> = self.listeners.borrow().iter().map(|(_, l)| Rc::clone(l)).collect();
		for listener in listeners {
			let Ok(mut callbacks) = listener.try_borrow_mut() else {
				warn!("spoiler: visibility listener re-entered, skipping");
				continue;
			};
			let (on_visible, on_hidden) = &mut *callbacks;
			if visible {
				on_visible();
			} else {
				on_hidden();
			}
		}
	}

	/// Number of live subscriptions.
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}
}

impl VisibilitySource for ManualVisibility {
	fn subscribe(&mut self, on_visible: Box<dyn FnMut()>, on_hidden: Box<dyn FnMut()>) -> Subscription {
		let id = {
			let mut next = self.next_id.borrow_mut();
			*next += 1;
			*next
		};
		self.listeners
			.borrow_mut()
			.push((id, Rc::new(RefCell::new((on_visible, on_hidden)))));
		let listeners = Rc::clone(&self.listeners);
		Subscription::new(move || match listeners.try_borrow_mut() {
			Ok(mut list) => list.retain(|(l, _)| *l != id),
			Err(_) => warn!("spoiler: listener list busy, subscription {id} not removed"),
		})
	}
}
