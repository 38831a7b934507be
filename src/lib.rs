//! Data-flow animations authored as code, rendered live in the terminal.
//!
//! A [`Dataflow`] definition registers entities, information overlays and
//! animation steps into an [`Engine`]. The [`Renderer`] drives the frame
//! loop against a [`Backend`](backend::Backend) and rebuilds the animation
//! whenever its sources change, without ever taking the loop down.

pub mod animation;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod renderer;
pub mod script;
pub mod surface;
pub mod types;
pub mod watcher;

pub use animation::{Animation, Dataflow};
pub use config::{Config, ConfigStore};
pub use engine::Engine;
pub use renderer::{Renderer, RendererState};
