//! Spoiler particle-noise component.
//!
//! Hides content behind a field of drifting particles and reveals it with a
//! cross-fade:
//! - Stateless particles: position, size and opacity are pure functions of
//!   particle index and elapsed time
//! - One authoritative clock per spoiler, published as CSS custom properties
//! - Frame-capped scheduling that suspends while off-screen
//! - Tiled layouts for oversized regions and lines of text, with a static
//!   cover when no drawing surface is available
//!
//! # Example
//!
//! ```ignore
//! use spoiler_noise::{Spoiler, SpoilerOptions};
//!
//! let options = SpoilerOptions { accent: "#c0c0ff".into(), ..Default::default() };
//!
//! view! { <Spoiler options=options>"Snape kills Dumbledore."</Spoiler> }
//! ```

pub mod channel;
pub mod clock;
pub mod color;
mod component;
pub mod controller;
mod error;
pub mod options;
pub mod particle;
pub mod policy;
pub mod render;
pub mod rng;
pub mod vector;
pub mod web;

pub use channel::{ChannelKey, ChannelSink, ChannelSource, ChannelValues, PropertyChannel};
pub use clock::{ClockState, FrameScheduler, ManualScheduler};
pub use component::Spoiler;
pub use controller::SpoilerController;
pub use error::SpoilerError;
pub use options::{Animate, SpoilerOptions, TransitionOptions};
pub use policy::{Backend, ElementGeometry, HostEnvironment, Layout, RenderCapability};
