//! Leptos component wrapping content in a spoiler.
//!
//! The component renders the children inside a positioned wrapper with a
//! canvas laid over them. On mount it measures the wrapper, builds a
//! [`SpoilerController`] that publishes its clock as custom properties on the
//! wrapper, and hides the content. A click toggles between hidden and
//! revealed. Each `requestAnimationFrame` callback advances the clock and
//! repaints the canvas from the custom properties; the content cross-fades
//! against the particle field.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info, warn};
use send_wrapper::SendWrapper;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, MouseEvent, Window};

use super::channel::{ChannelSink, ChannelValues};
use super::clock::FrameScheduler;
use super::controller::SpoilerController;
use super::options::{SpoilerOptions, TransitionOptions};
use super::policy::{Backend, RenderCapability, Subscription, bind_visibility};
use super::render;
use super::web::{
	IntersectionVisibility, RafScheduler, StyleChannel, canvas_context, detect_environment,
	measure_geometry,
};

type Controller = SpoilerController<RafScheduler, StyleChannel>;

/// Everything a repaint touches besides the controller.
struct SpoilerView {
	canvas: HtmlCanvasElement,
	surface: Option<CanvasRenderingContext2d>,
	content: HtmlElement,
	channel: StyleChannel,
	dpr: f64,
}

impl SpoilerView {
	fn draw(&self, controller: &Controller) {
		let layout = controller.layout();
		let cover_alpha = if !controller.is_covering() {
			match &self.surface {
				Some(ctx) => {
					let size = layout.extent() * self.dpr;
					ctx.clear_rect(0.0, 0.0, size.x, size.y);
				}
				None => {
					let _ = HtmlElement::style(&self.canvas).remove_property("background-color");
				}
			}
			0.0
		} else {
			match (&self.surface, controller.backend()) {
				(Some(ctx), Backend::Animated) => {
					render::paint_layout(&mut ctx.clone(), &self.channel, layout, self.dpr);
					render::transition_alpha(&ChannelValues::read(&self.channel))
				}
				(Some(ctx), Backend::Static) => {
					render::paint_static(&mut ctx.clone(), layout.extent(), controller.accent(), self.dpr);
					1.0
				}
				(None, _) => {
					// No drawing surface: the canvas background is the cover.
					let _ = HtmlElement::style(&self.canvas).set_property(
						"background-color",
						&controller.accent().with_alpha(1.0).to_string(),
					);
					1.0
				}
			}
		};

		let _ = HtmlElement::style(&self.content).set_property("opacity", &format!("{:.3}", 1.0 - cover_alpha));
	}
}

/// A mounted spoiler: the shared controller, what it paints, and the
/// visibility subscription keeping it suspended while off-screen.
struct Mounted {
	controller: Rc<RefCell<Controller>>,
	view: Rc<SpoilerView>,
	_visibility: Subscription,
}

/// Destroys the controller: cancels the pending frame, clears the custom
/// properties and lets the scheduler drop its frame callback, which breaks the
/// callback -> controller -> scheduler cycle.
fn teardown<S: FrameScheduler, C: ChannelSink>(controller: &RefCell<SpoilerController<S, C>>) {
	match controller.try_borrow_mut() {
		Ok(mut ctrl) => {
			if let Err(e) = ctrl.destroy() {
				warn!("spoiler: {e}");
			}
		}
		Err(_) => warn!("spoiler: unmounted while busy, controller left running"),
	}
}

fn mount(
	window: &Window,
	wrapper: HtmlElement,
	canvas: HtmlCanvasElement,
	content: HtmlElement,
	options: SpoilerOptions,
	hidden: bool,
) -> Mounted {
	let mut env = detect_environment(window);
	let surface = match canvas_context(&canvas) {
		Ok(ctx) => Some(ctx),
		Err(e) => {
			warn!("spoiler: {e}, using static cover");
			env.capability = RenderCapability::Unavailable;
			None
		}
	};
	let dpr = env.pixel_ratio();
	let geometry = measure_geometry(window, &wrapper);
	let channel = StyleChannel::new(HtmlElement::style(&wrapper));

	let controller = SpoilerController::new(
		geometry,
		options,
		env,
		RafScheduler::new(window.clone()),
		channel.clone(),
	);
	let extent = controller.layout().extent() * dpr;
	canvas.set_width(extent.x.ceil() as u32);
	canvas.set_height(extent.y.ceil() as u32);
	info!(
		"spoiler: mounted {:.0}x{:.0} ({:?}, {:?})",
		geometry.width,
		geometry.height,
		controller.layout(),
		controller.backend()
	);

	let controller = Rc::new(RefCell::new(controller));
	let view = Rc::new(SpoilerView {
		canvas,
		surface,
		content,
		channel,
		dpr,
	});

	let (controller_frame, view_frame) = (Rc::clone(&controller), Rc::clone(&view));
	controller
		.borrow()
		.clock()
		.scheduler()
		.set_callback(move |now_ms: f64| {
			let Ok(mut ctrl) = controller_frame.try_borrow_mut() else {
				warn!("spoiler: frame fired while busy, skipping");
				return;
			};
			match ctrl.on_frame(now_ms) {
				Ok(()) => view_frame.draw(&ctrl),
				Err(e) => warn!("spoiler: {e}"),
			}
		});

	let mut visibility = IntersectionVisibility::new(wrapper.into());
	let subscription = bind_visibility(&mut visibility, &controller);

	{
		let mut ctrl = controller.borrow_mut();
		if hidden {
			if let Err(e) = ctrl.hide(&TransitionOptions::instant()) {
				warn!("spoiler: {e}");
			}
		}
		view.draw(&ctrl);
	}

	Mounted {
		controller,
		view,
		_visibility: subscription,
	}
}

/// Hides its children behind animated particle noise until clicked.
///
/// `options` tunes the field (accent, density, gap, frame cap, fallback).
/// Set `hidden = false` to start revealed.
#[component]
pub fn Spoiler(
	/// Content to cover.
	children: Children,
	/// Field options; defaults when omitted.
	#[prop(optional)]
	options: Option<SpoilerOptions>,
	/// Whether the content starts hidden.
	#[prop(default = true)]
	hidden: bool,
) -> impl IntoView {
	let wrapper_ref = NodeRef::<leptos::html::Span>::new();
	let content_ref = NodeRef::<leptos::html::Span>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let mounted: Rc<RefCell<Option<Mounted>>> = Rc::new(RefCell::new(None));
	let words = options.as_ref().is_some_and(|o| o.words);
	let mounted_init = Rc::clone(&mounted);

	Effect::new(move |_| {
		let (Some(wrapper), Some(content), Some(canvas)) =
			(wrapper_ref.get(), content_ref.get(), canvas_ref.get())
		else {
			return;
		};
		if mounted_init.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			warn!("spoiler: no window, leaving content visible");
			return;
		};
		let state = mount(
			&window,
			wrapper.into(),
			canvas.into(),
			content.into(),
			options.clone().unwrap_or_default(),
			hidden,
		);
		*mounted_init.borrow_mut() = Some(state);
	});

	let mounted_cleanup = SendWrapper::new(Rc::clone(&mounted));
	on_cleanup(move || {
		if let Some(m) = mounted_cleanup.borrow_mut().take() {
			teardown(&m.controller);
			debug!("spoiler: unmounted");
		}
	});

	let mounted_click = Rc::clone(&mounted);
	let on_click = move |_: MouseEvent| {
		let slot = mounted_click.borrow();
		let Some(m) = slot.as_ref() else {
			return;
		};
		let Ok(mut ctrl) = m.controller.try_borrow_mut() else {
			return;
		};
		let result = if ctrl.is_hidden() {
			ctrl.reveal(&TransitionOptions::default())
		} else {
			ctrl.hide(&TransitionOptions::default())
		};
		if let Err(e) = result {
			warn!("spoiler: {e}");
		}
		m.view.draw(&ctrl);
	};

	let display = if words { "inline" } else { "inline-block" };

	view! {
		<span
			node_ref=wrapper_ref
			class="spoiler"
			on:click=on_click
			style=format!("position: relative; display: {display}; cursor: pointer;")
		>
			<span node_ref=content_ref class="spoiler-content">
				{children()}
			</span>
			<canvas
				node_ref=canvas_ref
				class="spoiler-noise"
				style="position: absolute; inset: 0; width: 100%; height: 100%; pointer-events: none;"
			/>
		</span>
	}
}

#[cfg(test)]
mod tests {
	use super::super::channel::PropertyChannel;
	use super::super::clock::ManualScheduler;
	use super::super::policy::{ElementGeometry, HostEnvironment};
	use super::*;

	#[test]
	fn teardown_stops_a_running_spoiler() {
		let channel = PropertyChannel::new();
		let controller = RefCell::new(SpoilerController::new(
			ElementGeometry::block(300.0, 100.0),
			SpoilerOptions::default(),
			HostEnvironment::default(),
			ManualScheduler::new(),
			channel.clone(),
		));
		controller.borrow_mut().hide(&TransitionOptions::default()).unwrap();
		assert!(controller.borrow().clock().scheduler().pending().is_some());

		teardown(&controller);
		let ctrl = controller.borrow();
		assert!(ctrl.clock().is_destroyed());
		assert!(!ctrl.is_animating());
		assert_eq!(ctrl.clock().scheduler().pending(), None);
		assert!(ctrl.clock().scheduler().is_released());
		assert!(channel.is_empty());
	}

	#[test]
	fn teardown_twice_only_warns() {
		let controller = RefCell::new(SpoilerController::new(
			ElementGeometry::block(100.0, 40.0),
			SpoilerOptions::default(),
			HostEnvironment::default(),
			ManualScheduler::new(),
			PropertyChannel::new(),
		));
		teardown(&controller);
		teardown(&controller);
		assert!(controller.borrow().clock().is_destroyed());
	}
}
