//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers never mutate camera state.
//! - Render state derives from the camera and a fixed projection.
//!
//! Backends consume a [`RenderView`] and the static room [`Mesh`]. The
//! [`DebugTextRenderer`] implements the same trait without a GPU.

pub mod mesh;
mod projection;
mod renderer;

pub use mesh::{ColorVertex, Mesh, MeshVariant, TexturedVertex, room_colored, room_textured};
pub use projection::Projection;
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "boxroom-render v0.1.0"
}
