use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A logical action the camera model understands.
///
/// The camera consumes actions, never raw key codes. Backends translate their
/// own key enumeration through [`crate::Bindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Walk or fly along the view direction.
    Forward,
    /// Walk or fly against the view direction.
    Back,
    /// Strafe left.
    Left,
    /// Strafe right.
    Right,
    /// Jump when grounded, ascend when flying.
    JumpOrUp,
    /// Descend when flying.
    CrouchOrDown,
    /// Leave the main loop.
    Quit,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Forward,
        Action::Back,
        Action::Left,
        Action::Right,
        Action::JumpOrUp,
        Action::CrouchOrDown,
        Action::Quit,
    ];
}

/// Set of actions currently held down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionState {
    held: HashSet<Action>,
}

impl ActionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    pub fn set(&mut self, action: Action, down: bool) {
        if down {
            self.press(action);
        } else {
            self.release(action);
        }
    }

    pub fn is_down(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl FromIterator<Action> for ActionState {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            held: iter.into_iter().collect(),
        }
    }
}
