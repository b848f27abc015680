//! First-person camera and movement model.
//!
//! One [`Camera`] is updated once per frame from an
//! [`boxroom_input::InputSnapshot`] and read once per frame to build the view
//! matrix. Two movement policies share the same camera state: free-fly and
//! grounded with gravity.
//!
//! # Invariants
//! - Pitch stays within [-89, 89] degrees after every update.
//! - With the grounded policy, eye height never ends an update below the floor.
//! - The forward vector is unit length before it reaches the view matrix.
//! - The update is total: no input produces an error.

pub mod camera;
pub mod movement;

pub use camera::{Camera, PITCH_LIMIT};
pub use movement::{CameraController, ConfigError, MovementConfig, MovementPolicy};

pub fn crate_info() -> &'static str {
    "boxroom-camera v0.1.0"
}
