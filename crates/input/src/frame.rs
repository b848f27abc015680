use crate::action::{Action, ActionState};
use glam::{DVec2, IVec2};

/// Everything the camera model needs from one frame of input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Seconds since the previous update.
    pub elapsed_seconds: f32,
    /// Mouse motion accumulated over every motion event of the frame.
    pub mouse_delta: IVec2,
    /// Actions held when the snapshot was taken.
    pub actions: ActionState,
}

impl InputSnapshot {
    pub fn new(elapsed_seconds: f32) -> Self {
        Self {
            elapsed_seconds,
            ..Self::default()
        }
    }

    pub fn with_mouse(mut self, dx: i32, dy: i32) -> Self {
        self.mouse_delta = IVec2::new(dx, dy);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.press(action);
        self
    }

    pub fn is_down(&self, action: Action) -> bool {
        self.actions.is_down(action)
    }
}

/// Collects input events between two frames.
///
/// Key state persists across frames. Mouse motion is summed per frame; only
/// whole units are handed out and the fractional remainder carries over.
#[derive(Debug, Default)]
pub struct FrameInput {
    actions: ActionState,
    mouse: DVec2,
}

impl FrameInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_action(&mut self, action: Action, down: bool) {
        self.actions.set(action, down);
    }

    pub fn is_down(&self, action: Action) -> bool {
        self.actions.is_down(action)
    }

    pub fn add_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse += DVec2::new(dx, dy);
    }

    /// Drop all held actions, e.g. on focus loss.
    pub fn release_all(&mut self) {
        self.actions.clear();
    }

    /// Take the snapshot for this frame and start accumulating the next one.
    pub fn snapshot(&mut self, elapsed_seconds: f32) -> InputSnapshot {
        let whole = self.mouse.trunc();
        self.mouse -= whole;
        let mouse_delta = whole.as_ivec2();
        if mouse_delta != IVec2::ZERO {
            tracing::trace!(dx = mouse_delta.x, dy = mouse_delta.y, "mouse delta");
        }
        InputSnapshot {
            elapsed_seconds,
            mouse_delta,
            actions: self.actions.clone(),
        }
    }
}
