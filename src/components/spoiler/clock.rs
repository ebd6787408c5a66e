//! Authoritative animation clock.
//!
//! The controller owns the elapsed-time value, advances it from host frame
//! callbacks at a capped rate, and republishes it (plus the stop mark and fade
//! length) on the channel. Scheduling is injected through [`FrameScheduler`]:
//! the host calls [`ClockController::on_frame`] whenever a requested frame
//! fires. At most one frame request is outstanding at any time.

use log::{debug, warn};

use super::channel::{ChannelKey, ChannelSink, format_seconds};
use super::error::SpoilerError;
use super::options::TransitionOptions;

/// Identifies an outstanding frame request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

/// Host "request next frame" capability.
pub trait FrameScheduler {
	/// Asks for one callback on the next frame. `None` if the host cannot schedule.
	fn request_frame(&mut self) -> Option<FrameHandle>;

	/// Withdraws a request that has not fired yet.
	fn cancel_frame(&mut self, handle: FrameHandle);

	/// Drops host resources once the controller is destroyed.
	fn release(&mut self) {}
}

/// Host-driven scheduler: frames only fire when the host calls
/// [`ManualScheduler::fire`]. Used for headless hosts and tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
	next_id: i32,
	pending: Option<FrameHandle>,
	released: bool,
}

impl ManualScheduler {
	/// A scheduler with nothing pending.
	pub fn new() -> Self {
		Self::default()
	}

	/// The outstanding request, if any.
	pub fn pending(&self) -> Option<FrameHandle> {
		self.pending
	}

	/// Consumes the pending request, as the host does right before invoking the callback.
	pub fn fire(&mut self) -> Option<FrameHandle> {
		self.pending.take()
	}

	/// Whether [`FrameScheduler::release`] has run.
	pub fn is_released(&self) -> bool {
		self.released
	}
}

impl FrameScheduler for ManualScheduler {
	fn request_frame(&mut self) -> Option<FrameHandle> {
		self.next_id += 1;
		let handle = FrameHandle(self.next_id);
		self.pending = Some(handle);
		Some(handle)
	}

	fn cancel_frame(&mut self, handle: FrameHandle) {
		if self.pending == Some(handle) {
			self.pending = None;
		}
	}

	fn release(&mut self) {
		self.pending = None;
		self.released = true;
	}
}

/// Where the clock is in its hide/reveal cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
	/// Clock frozen, no frame pending.
	Idle,
	/// Clock advancing.
	Running,
	/// Clock advancing until it passes `stop mark + fade`.
	StoppingForReveal,
}

/// Drives the global clock for one spoiler.
#[derive(Debug)]
pub struct ClockController<S, C> {
	scheduler: S,
	channel: C,
	clock: f64,
	stop_mark: Option<f64>,
	fade: f64,
	max_fps: f64,
	reduced_motion: bool,
	state: ClockState,
	pending: Option<FrameHandle>,
	/// Host timestamp (ms) of the last frame that advanced the clock.
	last_frame_ms: Option<f64>,
	hidden: bool,
	destroyed: bool,
}

impl<S: FrameScheduler, C: ChannelSink> ClockController<S, C> {
	/// Idle clock at zero; publishes the initial values on `channel`.
	pub fn new(scheduler: S, channel: C, max_fps: f64, reduced_motion: bool) -> Self {
		let mut clock = Self {
			scheduler,
			channel,
			clock: 0.0,
			stop_mark: None,
			fade: 0.0,
			max_fps,
			reduced_motion,
			state: ClockState::Idle,
			pending: None,
			last_frame_ms: None,
			hidden: false,
			destroyed: false,
		};
		clock.set_clock(0.0);
		clock.set_stop_mark(None);
		clock.set_fade(0.0);
		clock
	}

	fn ensure_alive(&self, operation: &'static str) -> Result<(), SpoilerError> {
		if self.destroyed {
			warn!("spoiler: {operation} called after destroy");
			return Err(SpoilerError::Destroyed { operation });
		}
		Ok(())
	}

	fn set_clock(&mut self, seconds: f64) {
		self.clock = seconds;
		self.channel.publish(ChannelKey::Time, &format_seconds(seconds));
	}

	fn set_stop_mark(&mut self, mark: Option<f64>) {
		self.stop_mark = mark;
		match mark {
			Some(m) => self.channel.publish(ChannelKey::StopTime, &format_seconds(m)),
			None => self.channel.retract(ChannelKey::StopTime),
		}
	}

	fn set_fade(&mut self, seconds: f64) {
		self.fade = seconds;
		self.channel.publish(ChannelKey::Fade, &format_seconds(seconds));
	}

	/// Frame cap actually in force; zero under reduced motion.
	pub fn effective_max_fps(&self) -> f64 {
		if self.reduced_motion || !(self.max_fps.is_finite() && self.max_fps > 0.0) {
			0.0
		} else {
			self.max_fps
		}
	}

	/// Applies a new frame cap and reduced-motion preference.
	pub fn configure(&mut self, max_fps: f64, reduced_motion: bool) -> Result<(), SpoilerError> {
		self.ensure_alive("configure")?;
		self.max_fps = max_fps;
		self.reduced_motion = reduced_motion;
		if self.effective_max_fps() == 0.0 {
			if self.stop_mark.is_some() {
				self.finish_reveal();
			} else {
				self.halt();
			}
			Ok(())
		} else {
			self.start_animation()
		}
	}

	/// Resets the clock and starts animating the hidden state.
	pub fn hide(&mut self, transition: &TransitionOptions) -> Result<(), SpoilerError> {
		self.ensure_alive("hide")?;
		self.set_stop_mark(None);
		self.set_clock(0.0);
		self.set_fade(transition.fade_duration(self.reduced_motion));
		self.hidden = true;
		if self.pending.is_some() {
			self.state = ClockState::Running;
		} else {
			self.start_animation()?;
		}
		debug!("spoiler: hide (fade {:.3}s)", self.fade);
		Ok(())
	}

	/// Marks the current clock as the stop point and animates the fade out.
	pub fn reveal(&mut self, transition: &TransitionOptions) -> Result<(), SpoilerError> {
		self.ensure_alive("reveal")?;
		self.set_fade(transition.fade_duration(self.reduced_motion));
		self.set_stop_mark(Some(self.clock));
		self.hidden = false;
		debug!("spoiler: reveal at {:.3}s (fade {:.3}s)", self.clock, self.fade);

		if self.fade <= 0.0 || self.effective_max_fps() == 0.0 {
			self.finish_reveal();
			return Ok(());
		}
		if self.pending.is_some() {
			self.state = ClockState::StoppingForReveal;
			Ok(())
		} else {
			self.start_animation()
		}
	}

	/// Frame callback. `now_ms` is the host's frame timestamp in milliseconds.
	pub fn on_frame(&mut self, now_ms: f64) -> Result<(), SpoilerError> {
		self.ensure_alive("advance the clock")?;
		// The request that fired is spent.
		self.pending = None;
		if self.state == ClockState::Idle {
			return Ok(());
		}
		// Schedule first so a stop during this tick cancels the right request.
		self.pending = self.scheduler.request_frame();

		let elapsed = self.last_frame_ms.map_or(0.0, |last| now_ms - last);
		let min_interval = 1000.0 / self.effective_max_fps();
		if elapsed < 0.0 {
			self.last_frame_ms = Some(now_ms);
		} else if elapsed == 0.0 || elapsed >= min_interval {
			self.set_clock(self.clock + elapsed / 1000.0);
			self.last_frame_ms = Some(now_ms);
		}

		if let Some(stop) = self.stop_mark {
			if self.clock > stop + self.fade {
				self.finish_reveal();
			}
		}
		if self.pending.is_none() && self.state != ClockState::Idle {
			warn!("spoiler: host refused a frame request, animation stalled");
			self.state = ClockState::Idle;
		}
		Ok(())
	}

	/// Suspends animation without touching the clock or stop mark. Idempotent.
	pub fn stop_animation(&mut self) -> Result<(), SpoilerError> {
		self.ensure_alive("stop animation")?;
		self.halt();
		Ok(())
	}

	/// Resumes animation from the current clock value. Idempotent, and a no-op
	/// when there is nothing to animate.
	pub fn start_animation(&mut self) -> Result<(), SpoilerError> {
		self.ensure_alive("start animation")?;
		if self.pending.is_some() || self.effective_max_fps() == 0.0 {
			return Ok(());
		}
		self.state = if self.stop_mark.is_some() {
			ClockState::StoppingForReveal
		} else if self.hidden {
			ClockState::Running
		} else {
			return Ok(());
		};
		self.last_frame_ms = None;
		self.pending = self.scheduler.request_frame();
		if self.pending.is_none() {
			warn!("spoiler: host refused a frame request");
			self.state = ClockState::Idle;
		}
		Ok(())
	}

	/// Cancels everything, clears the channel and refuses all later calls.
	pub fn destroy(&mut self) -> Result<(), SpoilerError> {
		self.ensure_alive("destroy")?;
		self.halt();
		for key in ChannelKey::ALL {
			self.channel.retract(key);
		}
		self.scheduler.release();
		self.destroyed = true;
		debug!("spoiler: destroyed");
		Ok(())
	}

	fn halt(&mut self) {
		if let Some(handle) = self.pending.take() {
			self.scheduler.cancel_frame(handle);
		}
		self.state = ClockState::Idle;
	}

	fn finish_reveal(&mut self) {
		self.halt();
		self.set_stop_mark(None);
		debug!("spoiler: reveal finished at {:.3}s", self.clock);
	}

	/// Elapsed animation seconds.
	pub fn clock(&self) -> f64 {
		self.clock
	}

	/// Clock value at which the current reveal started.
	pub fn stop_mark(&self) -> Option<f64> {
		self.stop_mark
	}

	/// Length of the current transition in seconds.
	pub fn fade(&self) -> f64 {
		self.fade
	}

	/// Current phase.
	pub fn state(&self) -> ClockState {
		self.state
	}

	/// Whether the content is logically hidden.
	pub fn is_hidden(&self) -> bool {
		self.hidden
	}

	/// Whether a frame is outstanding.
	pub fn is_animating(&self) -> bool {
		self.state != ClockState::Idle
	}

	/// Whether [`destroy`](Self::destroy) has run.
	pub fn is_destroyed(&self) -> bool {
		self.destroyed
	}

	/// The injected scheduler.
	pub fn scheduler(&self) -> &S {
		&self.scheduler
	}

	/// Write access for values the clock does not own.
	pub fn channel_mut(&mut self) -> &mut C {
		&mut self.channel
	}
}

impl<C: ChannelSink> ClockController<ManualScheduler, C> {
	/// Fires the pending frame, if any, at `now_ms`. Returns whether one fired.
	pub fn advance_frame(&mut self, now_ms: f64) -> Result<bool, SpoilerError> {
		self.ensure_alive("advance the clock")?;
		if self.scheduler.fire().is_none() {
			return Ok(false);
		}
		self.on_frame(now_ms)?;
		Ok(true)
	}
}
