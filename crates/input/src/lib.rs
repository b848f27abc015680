//! Input: backend key codes mapped to a fixed set of named actions.
//!
//! # Invariants
//! - The camera model only ever sees [`Action`]s and [`InputSnapshot`]s.
//! - Input is sampled once per frame: events are drained into a
//!   [`FrameInput`], then a snapshot is taken before the camera update.

pub mod action;
pub mod bindings;
pub mod frame;

pub use action::{Action, ActionState};
pub use bindings::Bindings;
pub use frame::{FrameInput, InputSnapshot};

pub fn crate_info() -> &'static str {
    "boxroom-input v0.1.0"
}
