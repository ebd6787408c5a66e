//! Errors surfaced by the spoiler controller and its browser adapters.

use thiserror::Error;

/// Errors that can occur while driving a spoiler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpoilerError {
	/// An operation was attempted after `destroy()`.
	#[error("spoiler already destroyed, refusing to {operation}")]
	Destroyed {
		/// The rejected operation.
		operation: &'static str,
	},

	/// The host could not provide a 2D drawing surface.
	#[error("drawing surface unavailable: {0}")]
	SurfaceUnavailable(String),
}
