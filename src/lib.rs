//! spoiler-noise: Animated particle-noise spoilers for web pages.
//!
//! This crate provides a WASM-based component that covers content with a
//! time-animated field of particles, reveals it on click with a cross-fade,
//! and keeps all particle state stateless and deterministic.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::spoiler::{Spoiler, SpoilerController, SpoilerError, SpoilerOptions, TransitionOptions};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("spoiler-noise: logging initialized");
}

/// Load page-wide spoiler options from a script element with id="spoiler-options".
/// Expected format: JSON object with any of { accent, density, gap, maxFps, forceFallback, words }
fn load_options() -> Option<SpoilerOptions> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("spoiler-options")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	let options = SpoilerOptions::from_json(&json_text);
	info!("spoiler-noise: loaded options {options:?}");
	Some(options)
}

/// Main application component.
/// Loads options from the DOM and renders a few spoilers.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let options = load_options().unwrap_or_default();
	let words = SpoilerOptions {
		words: true,
		..options.clone()
	};
	let fallback = SpoilerOptions {
		force_fallback: true,
		..options.clone()
	};

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Spoiler Noise" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<main class="spoiler-demo">
			<h1>"Spoiler Noise"</h1>
			<p class="subtitle">"Click a spoiler to reveal it. Click again to hide it."</p>
			<p>
				"The butler did it, and the twist is that "
				<Spoiler options=words>"the detective was the butler all along"</Spoiler>
				"."
			</p>
			<Spoiler options=options>
				<img src="ending.png" alt="Final scene" width="480" height="270" />
			</Spoiler>
			<p>
				"Without animation: "
				<Spoiler options=fallback>"it was a dream"</Spoiler>
			</p>
		</main>
	}
}
