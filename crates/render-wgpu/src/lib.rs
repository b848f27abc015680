//! wgpu render backend for the box room.
//!
//! Draws one static room mesh, vertex-colored or textured, with a single
//! model-view-projection uniform per draw.
//!
//! # Invariants
//! - The renderer never mutates camera state.
//! - The room mesh is uploaded once, at creation.
//! - Shader build failures are handled according to [`ShaderPolicy`].

mod gpu;
mod shaders;
mod texture;

pub use gpu::{ProgramStatus, RenderError, RoomMaterial, ShaderPolicy, WgpuRenderer, check_program};
pub use texture::{RoomTexture, check_texture_size};
