//! Accent colors for the noise field.
//!
//! The core only ever consumes an [`Hsl`] accent; turning an arbitrary CSS
//! color string into one is delegated to a [`ColorResolver`].

use std::fmt;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha in `[0, 1]`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with explicit alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Converts to hue (degrees), saturation and lightness (percent).
	pub fn to_hsl(self) -> Hsl {
		let (r, g, b) = (
			f64::from(self.r) / 255.0,
			f64::from(self.g) / 255.0,
			f64::from(self.b) / 255.0,
		);
		let max = r.max(g).max(b);
		let min = r.min(g).min(b);
		let l = (max + min) / 2.0;
		let d = max - min;

		if d == 0.0 {
			return Hsl::new(0.0, 0.0, l * 100.0);
		}

		let s = if l > 0.5 {
			d / (2.0 - max - min)
		} else {
			d / (max + min)
		};
		let h = if max == r {
			((g - b) / d).rem_euclid(6.0)
		} else if max == g {
			(b - r) / d + 2.0
		} else {
			(r - g) / d + 4.0
		};

		Hsl::new(h * 60.0, s * 100.0, l * 100.0)
	}
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
	/// Hue, degrees.
	pub h: f64,
	/// Saturation, percent.
	pub s: f64,
	/// Lightness, percent.
	pub l: f64,
}

impl Hsl {
	/// Builds a color from hue, saturation and lightness.
	pub const fn new(h: f64, s: f64, l: f64) -> Self {
		Self { h, s, l }
	}

	/// Adds an alpha component.
	pub fn with_alpha(self, a: f64) -> Hsla {
		Hsla {
			h: self.h,
			s: self.s,
			l: self.l,
			a,
		}
	}

	/// Channel encoding: `"<hue> <sat>% <light>%"`.
	pub fn to_tokens(self) -> String {
		format!("{:.1} {:.1}% {:.1}%", self.h, self.s, self.l)
	}

	/// Inverse of [`Hsl::to_tokens`]; `None` on anything malformed.
	pub fn from_tokens(tokens: &str) -> Option<Self> {
		let mut parts = tokens.split_whitespace();
		let h = parts.next()?.parse::<f64>().ok()?;
		let s = parts.next()?.trim_end_matches('%').parse::<f64>().ok()?;
		let l = parts.next()?.trim_end_matches('%').parse::<f64>().ok()?;
		if parts.next().is_some() || !(h.is_finite() && s.is_finite() && l.is_finite()) {
			return None;
		}
		Some(Self::new(h, s, l))
	}
}

impl Default for Hsl {
	fn default() -> Self {
		Color::rgb(128, 128, 128).to_hsl()
	}
}

/// A fully specified particle fill color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsla {
	/// Hue, degrees.
	pub h: f64,
	/// Saturation, percent.
	pub s: f64,
	/// Lightness, percent.
	pub l: f64,
	/// Alpha in `[0, 1]`.
	pub a: f64,
}

impl fmt::Display for Hsla {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"hsla({:.1}, {:.1}%, {:.1}%, {:.3})",
			self.h, self.s, self.l, self.a
		)
	}
}

/// Resolves an arbitrary color string into an accent.
pub trait ColorResolver {
	/// The accent for `color`, or `None` if it is not understood.
	fn resolve(&self, color: &str) -> Option<Hsl>;
}

/// Resolves hex (`#rgb`, `#rrggbb`), `rgb()`/`rgba()` and `hsl()` notation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CssColorResolver;

impl ColorResolver for CssColorResolver {
	fn resolve(&self, color: &str) -> Option<Hsl> {
		let color = color.trim();
		if color.starts_with("hsl") {
			return parse_hsl_function(color);
		}
		parse_color(color).map(Color::to_hsl)
	}
}

fn function_args(color_str: &str) -> Vec<&str> {
	let inner = color_str
		.split_once('(')
		.map_or("", |(_, rest)| rest.trim_end_matches(')'));
	inner
		.split([',', ' ', '/'])
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.collect()
}

fn parse_hsl_function(color_str: &str) -> Option<Hsl> {
	let nums = function_args(color_str);
	let h = nums.first()?.trim_end_matches("deg").parse().ok()?;
	let s = nums.get(1)?.trim_end_matches('%').parse().ok()?;
	let l = nums.get(2)?.trim_end_matches('%').parse().ok()?;
	Some(Hsl::new(h, s, l))
}

/// Parses a CSS color string into a [`Color`].
/// Supports hex (`#RGB`, `#RRGGBB`) and `rgb()`/`rgba()` functional notation.
pub fn parse_color(color_str: &str) -> Option<Color> {
	if let Some(hex) = color_str.strip_prefix('#') {
		if !hex.is_ascii() {
			return None;
		}
		let channel = |s: &str| u8::from_str_radix(s, 16).ok();
		return match hex.len() {
			3 => {
				let expand = |i: usize| channel(&hex[i..=i].repeat(2));
				Some(Color::rgb(expand(0)?, expand(1)?, expand(2)?))
			}
			6 => Some(Color::rgb(
				channel(&hex[0..2])?,
				channel(&hex[2..4])?,
				channel(&hex[4..6])?,
			)),
			_ => None,
		};
	}
	if color_str.starts_with("rgb") {
		let nums = function_args(color_str);
		let r = nums.first()?.parse().ok()?;
		let g = nums.get(1)?.parse().ok()?;
		let b = nums.get(2)?.parse().ok()?;
		let a = nums.get(3).and_then(|s| s.parse().ok()).unwrap_or(1.0);
		return Some(Color::rgba(r, g, b, a));
	}
	None
}
