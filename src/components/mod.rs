//! Leptos components.


pub mod spoiler;
