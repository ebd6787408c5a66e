//! Public face of one spoiler: construct, update, hide, reveal, destroy.
//!
//! Wraps the [`ClockController`] and adds everything decided from the element
//! and options: layout, backend, accent, and the config values published on
//! the channel next to the clock.

use log::{debug, warn};

use super::channel::{ChannelKey, ChannelSink};
use super::clock::{ClockController, FrameScheduler, ManualScheduler};
use super::color::{ColorResolver, CssColorResolver, Hsl};
use super::error::SpoilerError;
use super::options::{DEFAULT_ACCENT, SpoilerOptions, TransitionOptions};
use super::policy::{Backend, ElementGeometry, HostEnvironment, Layout, Suspendable, choose_backend, choose_layout};

/// One spoiler: clock, layout, backend and accent for a single element.
pub struct SpoilerController<S, C> {
	clock: ClockController<S, C>,
	geometry: ElementGeometry,
	options: SpoilerOptions,
	env: HostEnvironment,
	layout: Layout,
	backend: Backend,
	accent: Hsl,
	resolver: Box<dyn ColorResolver>,
}

impl<S: FrameScheduler, C: ChannelSink> std::fmt::Debug for SpoilerController<S, C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SpoilerController")
			.field("layout", &self.layout)
			.field("backend", &self.backend)
			.field("accent", &self.accent)
			.field("clock", &self.clock.clock())
			.field("state", &self.clock.state())
			.finish_non_exhaustive()
	}
}

fn resolve_accent(resolver: &dyn ColorResolver, accent: &str) -> Hsl {
	resolver.resolve(accent).unwrap_or_else(|| {
		warn!("spoiler: unrecognized accent {accent:?}, using {DEFAULT_ACCENT}");
		resolver.resolve(DEFAULT_ACCENT).unwrap_or_default()
	})
}

impl<S: FrameScheduler, C: ChannelSink> SpoilerController<S, C> {
	/// Builds a revealed spoiler with the built-in CSS color resolver.
	pub fn new(
		geometry: ElementGeometry,
		options: SpoilerOptions,
		env: HostEnvironment,
		scheduler: S,
		channel: C,
	) -> Self {
		Self::with_resolver(geometry, options, env, scheduler, channel, Box::new(CssColorResolver))
	}

	/// Like [`new`](Self::new) with a host-supplied color resolver.
	pub fn with_resolver(
		geometry: ElementGeometry,
		options: SpoilerOptions,
		env: HostEnvironment,
		scheduler: S,
		channel: C,
		resolver: Box<dyn ColorResolver>,
	) -> Self {
		let options = options.sanitized();
		let backend = choose_backend(env.capability, options.force_fallback);
		let clock = ClockController::new(
			scheduler,
			channel,
			Self::max_fps_for(backend, &options),
			env.reduced_motion,
		);
		let mut controller = Self {
			clock,
			layout: choose_layout(&geometry, options.gap),
			accent: resolve_accent(resolver.as_ref(), &options.accent),
			geometry,
			options,
			env,
			backend,
			resolver,
		};
		controller.publish_config();
		debug!(
			"spoiler: created {:?} layout, {:?} backend",
			controller.layout, controller.backend
		);
		controller
	}

	fn max_fps_for(backend: Backend, options: &SpoilerOptions) -> f64 {
		match backend {
			Backend::Animated => options.max_fps,
			Backend::Static => 0.0,
		}
	}

	fn publish_config(&mut self) {
		let gap = self.layout.gap();
		let density = self.options.density;
		let accent = self.accent.to_tokens();
		let words = self.options.words;
		let channel = self.clock.channel_mut();
		channel.publish(ChannelKey::Gap, &format!("{}px {}px", gap.x, gap.y));
		channel.publish(ChannelKey::Density, &density.to_string());
		channel.publish(ChannelKey::Accent, &accent);
		channel.publish(ChannelKey::Words, if words { "true" } else { "false" });
	}

	fn ensure_alive(&self, operation: &'static str) -> Result<(), SpoilerError> {
		if self.clock.is_destroyed() {
			warn!("spoiler: {operation} called after destroy");
			return Err(SpoilerError::Destroyed { operation });
		}
		Ok(())
	}

	/// Applies new options, recomputing layout, backend and published config.
	pub fn update(&mut self, options: SpoilerOptions) -> Result<(), SpoilerError> {
		self.ensure_alive("update")?;
		self.options = options.sanitized();
		self.backend = choose_backend(self.env.capability, self.options.force_fallback);
		self.layout = choose_layout(&self.geometry, self.options.gap);
		self.accent = resolve_accent(self.resolver.as_ref(), &self.options.accent);
		self.publish_config();
		self.clock
			.configure(Self::max_fps_for(self.backend, &self.options), self.env.reduced_motion)
	}

	/// Re-measures the element (after a resize).
	pub fn resize(&mut self, geometry: ElementGeometry) -> Result<(), SpoilerError> {
		self.ensure_alive("resize")?;
		self.geometry = geometry;
		self.layout = choose_layout(&self.geometry, self.options.gap);
		self.publish_config();
		Ok(())
	}

	/// Covers the content. See [`ClockController::hide`].
	pub fn hide(&mut self, transition: &TransitionOptions) -> Result<(), SpoilerError> {
		self.clock.hide(transition)
	}

	/// Fades the cover out. See [`ClockController::reveal`].
	pub fn reveal(&mut self, transition: &TransitionOptions) -> Result<(), SpoilerError> {
		self.clock.reveal(transition)
	}

	/// Host frame callback.
	pub fn on_frame(&mut self, now_ms: f64) -> Result<(), SpoilerError> {
		self.clock.on_frame(now_ms)
	}

	/// Resumes a suspended animation.
	pub fn start_animation(&mut self) -> Result<(), SpoilerError> {
		self.clock.start_animation()
	}

	/// Suspends the animation, keeping the clock.
	pub fn stop_animation(&mut self) -> Result<(), SpoilerError> {
		self.clock.stop_animation()
	}

	/// Cancels the frame chain and clears the channel. Later calls fail.
	pub fn destroy(&mut self) -> Result<(), SpoilerError> {
		self.clock.destroy()
	}

	/// Whether the content is logically hidden.
	pub fn is_hidden(&self) -> bool {
		self.clock.is_hidden()
	}

	/// Whether a frame is outstanding.
	pub fn is_animating(&self) -> bool {
		self.clock.is_animating()
	}

	/// Whether anything should be on screen: hidden, or still fading out.
	pub fn is_covering(&self) -> bool {
		self.is_hidden() || self.is_animating()
	}

	/// Layout chosen from the last measured geometry.
	pub fn layout(&self) -> &Layout {
		&self.layout
	}

	/// Animated field or static cover.
	pub fn backend(&self) -> Backend {
		self.backend
	}

	/// Resolved accent color.
	pub fn accent(&self) -> Hsl {
		self.accent
	}

	/// Host facts the spoiler was built with.
	pub fn environment(&self) -> &HostEnvironment {
		&self.env
	}

	/// The underlying clock.
	pub fn clock(&self) -> &ClockController<S, C> {
		&self.clock
	}
}

impl<C: ChannelSink> SpoilerController<ManualScheduler, C> {
	/// Fires the pending frame, if any. See [`ClockController::advance_frame`].
	pub fn advance_frame(&mut self, now_ms: f64) -> Result<bool, SpoilerError> {
		self.clock.advance_frame(now_ms)
	}
}

impl<S: FrameScheduler, C: ChannelSink> Suspendable for SpoilerController<S, C> {
	fn suspend(&mut self) {
		if let Err(e) = self.stop_animation() {
			warn!("spoiler: suspend failed: {e}");
		}
	}

	fn resume(&mut self) {
		if let Err(e) = self.start_animation() {
			warn!("spoiler: resume failed: {e}");
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use pretty_assertions::assert_eq;

	use super::super::channel::{ChannelSource, ChannelValues, PropertyChannel};
	use super::super::policy::{ManualVisibility, RenderCapability, bind_visibility};
	use super::super::vector::Vec2;
	use super::*;

	fn build(
		geometry: ElementGeometry,
		options: SpoilerOptions,
		env: HostEnvironment,
	) -> (SpoilerController<ManualScheduler, PropertyChannel>, PropertyChannel) {
		let channel = PropertyChannel::new();
		let controller = SpoilerController::new(geometry, options, env, ManualScheduler::new(), channel.clone());
		(controller, channel)
	}

	#[test]
	fn construction_publishes_config() {
		let options = SpoilerOptions {
			accent: "#ff0000".into(),
			density: 5.0,
			..SpoilerOptions::default()
		};
		let (ctrl, channel) = build(ElementGeometry::block(300.0, 100.0), options, HostEnvironment::default());
		let values = ChannelValues::read(&channel);
		assert_eq!(values.gap, Vec2::new(6.0, 6.0));
		assert_eq!(values.density, 5.0);
		assert_eq!(values.accent, Hsl::new(0.0, 100.0, 50.0));
		assert_eq!(values.t, 0.0);
		assert_eq!(ctrl.backend(), Backend::Animated);
	}

	#[test]
	fn unknown_accent_falls_back() {
		let options = SpoilerOptions {
			accent: "not-a-color".into(),
			..SpoilerOptions::default()
		};
		let (ctrl, _) = build(ElementGeometry::block(100.0, 50.0), options, HostEnvironment::default());
		assert_eq!(ctrl.accent(), CssColorResolver.resolve(DEFAULT_ACCENT).unwrap());
	}

	#[test]
	fn static_backend_never_animates() {
		let env = HostEnvironment {
			capability: RenderCapability::Unavailable,
			..HostEnvironment::default()
		};
		let (mut ctrl, _) = build(ElementGeometry::block(100.0, 50.0), SpoilerOptions::default(), env);
		assert_eq!(ctrl.backend(), Backend::Static);
		ctrl.hide(&TransitionOptions::default()).unwrap();
		assert!(ctrl.is_hidden());
		assert!(!ctrl.is_animating());
	}

	#[test]
	fn update_switches_to_fallback_and_back() {
		let (mut ctrl, channel) =
			build(ElementGeometry::block(300.0, 100.0), SpoilerOptions::default(), HostEnvironment::default());
		ctrl.hide(&TransitionOptions::default()).unwrap();
		assert!(ctrl.is_animating());

		ctrl.update(SpoilerOptions {
			force_fallback: true,
			..SpoilerOptions::default()
		})
		.unwrap();
		assert_eq!(ctrl.backend(), Backend::Static);
		assert!(!ctrl.is_animating());

		ctrl.update(SpoilerOptions {
			gap: Vec2::new(2.0, 3.0),
			..SpoilerOptions::default()
		})
		.unwrap();
		assert!(ctrl.is_animating());
		assert_eq!(channel.read(ChannelKey::Gap).as_deref(), Some("2px 3px"));
	}

	#[test]
	fn resize_recomputes_layout() {
		let (mut ctrl, channel) =
			build(ElementGeometry::block(300.0, 100.0), SpoilerOptions::default(), HostEnvironment::default());
		ctrl.resize(ElementGeometry::block(900.0, 400.0)).unwrap();
		assert!(ctrl.layout().is_tiled());
		assert_eq!(channel.read(ChannelKey::Gap).as_deref(), Some("0px 0px"));
	}

	#[test]
	fn covering_until_reveal_finishes() {
		let (mut ctrl, _) =
			build(ElementGeometry::block(300.0, 100.0), SpoilerOptions::default(), HostEnvironment::default());
		assert!(!ctrl.is_covering());
		ctrl.hide(&TransitionOptions::default()).unwrap();
		ctrl.advance_frame(0.0).unwrap();
		ctrl.advance_frame(100.0).unwrap();
		ctrl.reveal(&TransitionOptions::default()).unwrap();
		assert!(ctrl.is_covering());
		let mut now = 100.0;
		while ctrl.advance_frame(now).unwrap() {
			now += 50.0;
		}
		assert!(!ctrl.is_covering());
	}

	#[test]
	fn visibility_suspends_and_resumes() {
		let (ctrl, _) =
			build(ElementGeometry::block(300.0, 100.0), SpoilerOptions::default(), HostEnvironment::default());
		let ctrl = Rc::new(RefCell::new(ctrl));
		let mut visibility = ManualVisibility::new();
		let _sub = bind_visibility(&mut visibility, &ctrl);

		ctrl.borrow_mut().hide(&TransitionOptions::default()).unwrap();
		visibility.set_visible(false);
		assert!(!ctrl.borrow().is_animating());
		visibility.set_visible(true);
		assert!(ctrl.borrow().is_animating());
	}

	#[test]
	fn update_after_destroy_fails() {
		let (mut ctrl, _) =
			build(ElementGeometry::block(300.0, 100.0), SpoilerOptions::default(), HostEnvironment::default());
		ctrl.destroy().unwrap();
		assert_eq!(
			ctrl.update(SpoilerOptions::default()),
			Err(SpoilerError::Destroyed { operation: "update" })
		);
		assert!(ctrl.resize(ElementGeometry::block(1.0, 1.0)).is_err());
		assert!(ctrl.hide(&TransitionOptions::default()).is_err());
	}
}
