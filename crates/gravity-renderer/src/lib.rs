//! # Gravity Renderer
//!
//! Draws the current particle buffer set and the mass markers.

pub mod mass_renderer;
pub mod programs;
pub mod renderer;
pub mod view;

pub use mass_renderer::*;
pub use programs::*;
pub use renderer::*;
pub use view::*;
