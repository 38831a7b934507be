//! Renderable item types and their draw implementations.
//!
//! Each item lives in its own module with its struct definition and
//! `Draw` implementation side by side.

mod entity;
mod information;
pub mod route;
mod step;

pub use entity::Entity;
pub use information::Information;
pub use step::AnimationStep;

use crate::surface::Surface;

/// Draw an item onto the surface as it looks at `timeline_ms`.
pub trait Draw {
    fn draw(&self, timeline_ms: u64, surface: &mut Surface);
}
