//! Browser adapters for the host-agnostic core: `requestAnimationFrame`
//! scheduling, custom properties as the channel, viewport visibility, and
//! environment probing.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, CssStyleDeclaration, Element, HtmlCanvasElement, HtmlElement,
	IntersectionObserver, IntersectionObserverEntry, Window,
};

use super::channel::{ChannelKey, ChannelSink, ChannelSource, parse_length};
use super::clock::{FrameHandle, FrameScheduler};
use super::error::SpoilerError;
use super::policy::{
	DisplayKind, ElementGeometry, HostEnvironment, RenderCapability, Subscription, VisibilitySource,
};

type FrameClosure = Closure<dyn FnMut(f64)>;

/// [`FrameScheduler`] backed by `window.requestAnimationFrame`.
///
/// The callback is installed after construction with [`set_callback`](Self::set_callback),
/// since it usually needs a handle to the controller that owns this scheduler.
pub struct RafScheduler {
	window: Window,
	callback: Rc<RefCell<Option<FrameClosure>>>,
}

impl RafScheduler {
	/// Scheduler with no callback installed yet.
	pub fn new(window: Window) -> Self {
		Self {
			window,
			callback: Rc::new(RefCell::new(None)),
		}
	}

	/// Installs the frame callback. It receives the rAF timestamp in milliseconds.
	pub fn set_callback(&self, callback: impl FnMut(f64) + 'static) {
		match self.callback.try_borrow_mut() {
			Ok(mut slot) => *slot = Some(Closure::wrap(Box::new(callback) as Box<dyn FnMut(f64)>)),
			Err(_) => warn!("spoiler: frame callback replaced while running, ignoring"),
		}
	}
}

impl FrameScheduler for RafScheduler {
	fn request_frame(&mut self) -> Option<FrameHandle> {
		let slot = self.callback.borrow();
		let Some(cb) = slot.as_ref() else {
			warn!("spoiler: frame requested before a callback was installed");
			return None;
		};
		match self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
			Ok(id) => Some(FrameHandle(id)),
			Err(e) => {
				warn!("spoiler: requestAnimationFrame failed: {e:?}");
				None
			}
		}
	}

	fn cancel_frame(&mut self, handle: FrameHandle) {
		let _ = self.window.cancel_animation_frame(handle.0);
	}

	fn release(&mut self) {
		// Breaks the closure -> controller -> scheduler cycle.
		match self.callback.try_borrow_mut() {
			Ok(mut slot) => {
				slot.take();
			}
			Err(_) => warn!("spoiler: scheduler released from inside its own frame"),
		}
	}
}

/// Channel on an element's inline style, as CSS custom properties.
#[derive(Clone)]
pub struct StyleChannel(CssStyleDeclaration);

impl StyleChannel {
	/// Publishes onto `style`, usually the wrapper element's inline style.
	pub fn new(style: CssStyleDeclaration) -> Self {
		Self(style)
	}
}

impl ChannelSink for StyleChannel {
	fn publish(&mut self, key: ChannelKey, value: &str) {
		if let Err(e) = self.0.set_property(key.property_name(), value) {
			warn!("spoiler: could not set {}: {e:?}", key.property_name());
		}
	}

	fn retract(&mut self, key: ChannelKey) {
		if let Err(e) = self.0.remove_property(key.property_name()) {
			warn!("spoiler: could not remove {}: {e:?}", key.property_name());
		}
	}
}

impl ChannelSource for StyleChannel {
	fn read(&self, key: ChannelKey) -> Option<String> {
		self.0
			.get_property_value(key.property_name())
			.ok()
			.map(|v| v.trim().to_string())
			.filter(|v| !v.is_empty())
	}
}

/// Viewport visibility of one element, via `IntersectionObserver`.
pub struct IntersectionVisibility {
	target: Element,
}

impl IntersectionVisibility {
	/// Watches `target`.
	pub fn new(target: Element) -> Self {
		Self { target }
	}
}

impl VisibilitySource for IntersectionVisibility {
	fn subscribe(&mut self, mut on_visible: Box<dyn FnMut()>, mut on_hidden: Box<dyn FnMut()>) -> Subscription {
		let callback = Closure::wrap(Box::new(move |entries: Array| {
			// Only the latest entry matters when several queue up.
			let Some(entry) = entries.iter().last() else {
				return;
			};
			if entry.unchecked_into::<IntersectionObserverEntry>().is_intersecting() {
				on_visible();
			} else {
				on_hidden();
			}
		}) as Box<dyn FnMut(Array)>);

		let observer = match IntersectionObserver::new(callback.as_ref().unchecked_ref()) {
			Ok(observer) => observer,
			Err(e) => {
				warn!("spoiler: IntersectionObserver unavailable ({e:?}), never suspending");
				return Subscription::new(|| {});
			}
		};
		observer.observe(&self.target);
		Subscription::new(move || {
			observer.disconnect();
			drop(callback);
		})
	}
}

/// Probes device pixel ratio, reduced-motion preference and 2D canvas support.
pub fn detect_environment(window: &Window) -> HostEnvironment {
	let reduced_motion = window
		.match_media("(prefers-reduced-motion: reduce)")
		.ok()
		.flatten()
		.is_some_and(|query| query.matches());

	let capability = window
		.document()
		.and_then(|doc| doc.create_element("canvas").ok())
		.and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
		.and_then(|canvas| canvas.get_context("2d").ok().flatten())
		.map_or(RenderCapability::Unavailable, |_| RenderCapability::Canvas2d);

	let env = HostEnvironment {
		capability,
		reduced_motion,
		device_pixel_ratio: window.device_pixel_ratio(),
	};
	debug!("spoiler: host environment {env:?}");
	env
}

/// Measures an element's box, display kind and line height in logical pixels.
pub fn measure_geometry(window: &Window, element: &HtmlElement) -> ElementGeometry {
	let rect = element.get_bounding_client_rect();
	let style = window.get_computed_style(element).ok().flatten();
	let property = |name: &str| {
		style
			.as_ref()
			.and_then(|s| s.get_property_value(name).ok())
			.unwrap_or_default()
	};

	let display = if property("display").trim() == "inline" {
		DisplayKind::Inline
	} else {
		DisplayKind::Block
	};
	// "normal" has no numeric value; the layout falls back to the element height.
	let line_height = parse_length(&property("line-height"));

	ElementGeometry {
		width: rect.width(),
		height: rect.height(),
		display,
		line_height,
	}
}

/// The 2D context of a canvas, or why there is none.
pub fn canvas_context(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, SpoilerError> {
	canvas
		.get_context("2d")
		.map_err(|e| SpoilerError::SurfaceUnavailable(format!("{e:?}")))?
		.ok_or_else(|| SpoilerError::SurfaceUnavailable("no 2d context".into()))?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| SpoilerError::SurfaceUnavailable("context is not 2d".into()))
}
