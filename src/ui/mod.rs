//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - [`viewport`]: Scroll position and visible range management
//! - [`style`]: Colors for preview and editor text

pub mod style;
pub mod viewport;

mod overlays;
mod render;
mod status;

pub use render::{ScreenLayout, line_number_width, render, screen_layout};

#[cfg(test)]
mod tests;
