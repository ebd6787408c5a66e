//! One-way, last-write-wins channel from the controller to the renderer.
//!
//! Values travel as strings keyed by CSS custom property names, the same way
//! they would reach a paint callback running in another context. The
//! controller only writes ([`ChannelSink`]); the renderer only reads
//! ([`ChannelSource`]) and re-reads everything on every paint.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;

use super::color::Hsl;
use super::options::{DEFAULT_DENSITY, DEFAULT_GAP};
use super::vector::Vec2;

/// A published value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKey {
	/// Elapsed animation seconds.
	Time,
	/// Clock value at which a reveal was requested. Absent when unset.
	StopTime,
	/// Seconds the current transition takes.
	Fade,
	/// Edge gap, one or two CSS lengths.
	Gap,
	/// Logical px² per particle.
	Density,
	/// Accent as space-separated HSL tokens.
	Accent,
	/// Reserved for a word-shaped mode; carried but not interpreted.
	Words,
}

impl ChannelKey {
	/// Every key, in publishing order.
	pub const ALL: [Self; 7] = [
		Self::Time,
		Self::StopTime,
		Self::Fade,
		Self::Gap,
		Self::Density,
		Self::Accent,
		Self::Words,
	];

	/// CSS custom property the key is published under.
	pub const fn property_name(self) -> &'static str {
		match self {
			Self::Time => "--t",
			Self::StopTime => "--t-stop",
			Self::Fade => "--fade",
			Self::Gap => "--gap",
			Self::Density => "--density",
			Self::Accent => "--accent",
			Self::Words => "--words",
		}
	}
}

/// Write side of the channel.
pub trait ChannelSink {
	/// Sets `key`, replacing any earlier value.
	fn publish(&mut self, key: ChannelKey, value: &str);
	/// Removes `key`.
	fn retract(&mut self, key: ChannelKey);
}

/// Read side of the channel.
pub trait ChannelSource {
	/// Current value of `key`, if set.
	fn read(&self, key: ChannelKey) -> Option<String>;
}

/// In-memory channel. Clones share storage, so one clone can be handed to
/// the controller and another to the renderer.
#[derive(Clone, Debug, Default)]
pub struct PropertyChannel {
	values: Rc<RefCell<HashMap<ChannelKey, String>>>,
}

impl PropertyChannel {
	/// An empty channel.
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether nothing is published.
	pub fn is_empty(&self) -> bool {
		self.values.borrow().is_empty()
	}
}

impl ChannelSink for PropertyChannel {
	fn publish(&mut self, key: ChannelKey, value: &str) {
		self.values.borrow_mut().insert(key, value.to_owned());
	}

	fn retract(&mut self, key: ChannelKey) {
		self.values.borrow_mut().remove(&key);
	}
}

impl ChannelSource for PropertyChannel {
	fn read(&self, key: ChannelKey) -> Option<String> {
		self.values.borrow().get(&key).cloned()
	}
}

/// Fixed three-decimal encoding used for all time values.
pub fn format_seconds(seconds: f64) -> String {
	format!("{seconds:.3}")
}

/// Parses a CSS length such as `"6px"` or `"6"`.
pub fn parse_length(value: &str) -> Option<f64> {
	let v = value.trim();
	let v = v.strip_suffix("px").unwrap_or(v).trim();
	v.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses one or two lengths (`"6px"`, `"6px 4px"`). A single length applies to both axes.
pub fn parse_gap(value: &str) -> Option<Vec2> {
	let mut parts = value.split_whitespace();
	let x = parse_length(parts.next()?)?;
	let y = match parts.next() {
		Some(p) => parse_length(p)?,
		None => x,
	};
	if parts.next().is_some() {
		return None;
	}
	Some(Vec2::new(x, y))
}

fn parse_flag(value: &str) -> Option<bool> {
	match value.trim() {
		"1" | "true" => Some(true),
		"0" | "false" => Some(false),
		_ => None,
	}
}

/// Decoded snapshot of everything on the channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelValues {
	/// Clock seconds.
	pub t: f64,
	/// Clock value of the pending reveal.
	pub t_stop: Option<f64>,
	/// Transition length in seconds.
	pub fade: f64,
	/// Requested edge gap.
	pub gap: Vec2,
	/// Logical px² per particle.
	pub density: f64,
	/// Particle base color.
	pub accent: Hsl,
	/// Word-shaped mode flag, carried through unused.
	pub words: bool,
}

impl Default for ChannelValues {
	fn default() -> Self {
		Self {
			t: 0.0,
			t_stop: None,
			fade: 0.0,
			gap: DEFAULT_GAP,
			density: DEFAULT_DENSITY,
			accent: Hsl::default(),
			words: false,
		}
	}
}

fn decode<T>(
	source: &impl ChannelSource,
	key: ChannelKey,
	parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
	let raw = source.read(key)?;
	let parsed = parse(&raw);
	if parsed.is_none() {
		warn!(
			"spoiler: ignoring malformed {} value {:?}",
			key.property_name(),
			raw
		);
	}
	parsed
}

fn non_negative(value: &str) -> Option<f64> {
	value
		.trim()
		.parse::<f64>()
		.ok()
		.filter(|v| v.is_finite() && *v >= 0.0)
}

impl ChannelValues {
	/// Reads every value, substituting defaults for anything missing or malformed.
	pub fn read(source: &impl ChannelSource) -> Self {
		let defaults = Self::default();
		Self {
			t: decode(source, ChannelKey::Time, non_negative).unwrap_or(defaults.t),
			t_stop: decode(source, ChannelKey::StopTime, non_negative),
			fade: decode(source, ChannelKey::Fade, non_negative).unwrap_or(defaults.fade),
			gap: decode(source, ChannelKey::Gap, parse_gap).unwrap_or(defaults.gap),
			density: decode(source, ChannelKey::Density, |v| {
				non_negative(v).filter(|d| *d > 0.0)
			})
			.unwrap_or(defaults.density),
			accent: decode(source, ChannelKey::Accent, Hsl::from_tokens).unwrap_or(defaults.accent),
			words: decode(source, ChannelKey::Words, parse_flag).unwrap_or(defaults.words),
		}
	}

	/// Writes every value; an unset stop time is retracted rather than written.
	pub fn write(&self, sink: &mut impl ChannelSink) {
		sink.publish(ChannelKey::Time, &format_seconds(self.t));
		match self.t_stop {
			Some(stop) => sink.publish(ChannelKey::StopTime, &format_seconds(stop)),
			None => sink.retract(ChannelKey::StopTime),
		}
		sink.publish(ChannelKey::Fade, &format_seconds(self.fade));
		sink.publish(
			ChannelKey::Gap,
			&format!("{}px {}px", self.gap.x, self.gap.y),
		);
		sink.publish(ChannelKey::Density, &self.density.to_string());
		sink.publish(ChannelKey::Accent, &self.accent.to_tokens());
		sink.publish(ChannelKey::Words, if self.words { "true" } else { "false" });
	}
}
