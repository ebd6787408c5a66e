//! Caller-facing configuration.
//!
//! Options usually arrive as JSON from the page (a `data-spoiler` attribute or
//! a script element). This layer is cosmetic, so nothing here is allowed to
//! fail: malformed fields keep their defaults and are logged.

use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::channel::parse_gap;
use super::vector::Vec2;

/// Frame cap when none is given.
pub const DEFAULT_MAX_FPS: f64 = 24.0;
/// Logical square pixels per particle.
pub const DEFAULT_DENSITY: f64 = 8.0;
/// Edge gap in logical pixels when none is given.
pub const DEFAULT_GAP: Vec2 = Vec2::new(6.0, 6.0);
/// Accent used when none is given or it cannot be resolved.
pub const DEFAULT_ACCENT: &str = "#808080";
/// Seconds used when a transition asks for animation without a duration.
pub const DEFAULT_FADE: f64 = 0.3;

/// Visual and timing options for one spoiler.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpoilerOptions {
	/// Any CSS color; resolved to an HSL accent.
	pub accent: String,
	/// Logical square pixels per particle; larger is sparser.
	pub density: f64,
	/// Requested edge gap `[x, y]` in logical pixels, before capping.
	#[serde(deserialize_with = "deserialize_gap")]
	pub gap: Vec2,
	/// Frame-rate cap for clock advancement. Zero disables animation.
	pub max_fps: f64,
	/// Skip the animated surface and use the static fallback.
	pub force_fallback: bool,
	/// Word-shaped mode flag, passed through to the channel.
	pub words: bool,
}

impl Default for SpoilerOptions {
	fn default() -> Self {
		Self {
			accent: DEFAULT_ACCENT.to_owned(),
			density: DEFAULT_DENSITY,
			gap: DEFAULT_GAP,
			max_fps: DEFAULT_MAX_FPS,
			force_fallback: false,
			words: false,
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GapInput {
	Pair([f64; 2]),
	Single(f64),
	Css(String),
}

impl GapInput {
	fn into_vec2(self) -> Option<Vec2> {
		match self {
			Self::Pair([x, y]) => Some(Vec2::new(x, y)),
			Self::Single(v) => Some(Vec2::new(v, v)),
			Self::Css(s) => parse_gap(&s),
		}
	}
}

fn deserialize_gap<'de, D>(deserializer: D) -> Result<Vec2, D::Error>
where
	D: serde::Deserializer<'de>,
{
	GapInput::deserialize(deserializer)?
		.into_vec2()
		.ok_or_else(|| serde::de::Error::custom("expected a gap like [6, 4] or \"6px 4px\""))
}

fn field<T: for<'de> Deserialize<'de>>(map: &Map<String, Value>, name: &str, fallback: T) -> T {
	let Some(value) = map.get(name) else {
		return fallback;
	};
	match T::deserialize(value) {
		Ok(v) => v,
		Err(e) => {
			warn!("spoiler: ignoring option {name}: {e}");
			fallback
		}
	}
}

#[derive(Deserialize)]
struct GapField(#[serde(deserialize_with = "deserialize_gap")] Vec2);

fn valid(value: f64, min_exclusive: Option<f64>) -> bool {
	value.is_finite() && value >= 0.0 && min_exclusive.is_none_or(|m| value > m)
}

impl SpoilerOptions {
	/// Parses options field by field. Never fails.
	pub fn from_json(json: &str) -> Self {
		let defaults = Self::default();
		let map = match serde_json::from_str::<Value>(json) {
			Ok(Value::Object(map)) => map,
			Ok(other) => {
				warn!("spoiler: options must be a JSON object, got {other}");
				return defaults;
			}
			Err(e) => {
				warn!("spoiler: unreadable options ({e}), using defaults");
				return defaults;
			}
		};

		Self {
			accent: field(&map, "accent", defaults.accent),
			density: field(&map, "density", defaults.density),
			gap: field(&map, "gap", GapField(defaults.gap)).0,
			max_fps: field(&map, "maxFps", defaults.max_fps),
			force_fallback: field(&map, "forceFallback", defaults.force_fallback),
			words: field(&map, "words", defaults.words),
		}
		.sanitized()
	}

	/// Replaces out-of-range numbers with defaults.
	pub fn sanitized(self) -> Self {
		let defaults = Self::default();
		let pick = |name: &str, value: f64, fallback: f64, min: Option<f64>| {
			if valid(value, min) {
				value
			} else {
				warn!("spoiler: option {name} = {value} out of range, using {fallback}");
				fallback
			}
		};
		Self {
			density: pick("density", self.density, defaults.density, Some(0.0)),
			max_fps: pick("maxFps", self.max_fps, defaults.max_fps, None),
			gap: Vec2::new(
				pick("gap", self.gap.x, defaults.gap.x, None),
				pick("gap", self.gap.y, defaults.gap.y, None),
			),
			..self
		}
	}
}

/// How a hide or reveal should animate.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Animate {
	/// `true` uses the default fade, `false` switches instantly.
	Enabled(bool),
	/// Explicit duration in seconds.
	Seconds(f64),
}

impl Default for Animate {
	fn default() -> Self {
		Self::Enabled(true)
	}
}

/// Per-call options for hide and reveal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransitionOptions {
	/// Whether and how long to animate.
	pub animate: Animate,
}

impl TransitionOptions {
	/// Switch without a fade.
	pub const fn instant() -> Self {
		Self {
			animate: Animate::Enabled(false),
		}
	}

	/// Fade over `seconds`.
	pub const fn seconds(seconds: f64) -> Self {
		Self {
			animate: Animate::Seconds(seconds),
		}
	}

	/// Fade length in seconds. Reduced motion always yields zero.
	pub fn fade_duration(&self, reduced_motion: bool) -> f64 {
		if reduced_motion {
			return 0.0;
		}
		match self.animate {
			Animate::Enabled(true) => DEFAULT_FADE,
			Animate::Enabled(false) => 0.0,
			Animate::Seconds(s) if s.is_finite() && s >= 0.0 => s,
			Animate::Seconds(s) => {
				warn!("spoiler: invalid fade duration {s}, using {DEFAULT_FADE}");
				DEFAULT_FADE
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_json_is_default() {
		assert_eq!(SpoilerOptions::from_json("{}"), SpoilerOptions::default());
	}

	#[test]
	fn reads_camel_case_fields() {
		let opts = SpoilerOptions::from_json(
			r##"{"accent": "#ff0000", "density": 4, "gap": "3px 2px", "maxFps": 30, "forceFallback": true}"##,
		);
		assert_eq!(opts.accent, "#ff0000");
		assert_eq!(opts.density, 4.0);
		assert_eq!(opts.gap, Vec2::new(3.0, 2.0));
		assert_eq!(opts.max_fps, 30.0);
		assert!(opts.force_fallback);
	}

	#[test]
	fn gap_accepts_arrays_and_numbers() {
		assert_eq!(SpoilerOptions::from_json(r#"{"gap": [1, 2]}"#).gap, Vec2::new(1.0, 2.0));
		assert_eq!(SpoilerOptions::from_json(r#"{"gap": 5}"#).gap, Vec2::new(5.0, 5.0));
	}

	#[test]
	fn malformed_fields_keep_defaults() {
		let opts = SpoilerOptions::from_json(
			r#"{"density": "lots", "gap": "wide", "maxFps": -3, "accent": "blue"}"#,
		);
		assert_eq!(opts.density, DEFAULT_DENSITY);
		assert_eq!(opts.gap, DEFAULT_GAP);
		assert_eq!(opts.max_fps, DEFAULT_MAX_FPS);
		assert_eq!(opts.accent, "blue");
	}

	#[test]
	fn garbage_json_is_default() {
		assert_eq!(SpoilerOptions::from_json("not json"), SpoilerOptions::default());
		assert_eq!(SpoilerOptions::from_json("[1, 2]"), SpoilerOptions::default());
	}

	#[test]
	fn zero_fps_is_allowed() {
		assert_eq!(SpoilerOptions::from_json(r#"{"maxFps": 0}"#).max_fps, 0.0);
	}

	#[test]
	fn strict_serde_path_also_works() {
		let opts: SpoilerOptions = serde_json::from_str(r#"{"gap": [2, 3], "words": true}"#).unwrap();
		assert_eq!(opts.gap, Vec2::new(2.0, 3.0));
		assert!(opts.words);
		assert_eq!(opts.max_fps, DEFAULT_MAX_FPS);
	}

	#[test]
	fn fade_durations() {
		assert_eq!(TransitionOptions::default().fade_duration(false), DEFAULT_FADE);
		assert_eq!(TransitionOptions::instant().fade_duration(false), 0.0);
		assert_eq!(TransitionOptions::seconds(1.0).fade_duration(false), 1.0);
		assert_eq!(TransitionOptions::seconds(f64::NAN).fade_duration(false), DEFAULT_FADE);
		assert_eq!(TransitionOptions::seconds(1.0).fade_duration(true), 0.0);
	}

	#[test]
	fn transition_options_deserialize() {
		let t: TransitionOptions = serde_json::from_str(r#"{"animate": 1.5}"#).unwrap();
		assert_eq!(t.animate, Animate::Seconds(1.5));
		let t: TransitionOptions = serde_json::from_str(r#"{"animate": false}"#).unwrap();
		assert_eq!(t, TransitionOptions::instant());
	}
}
