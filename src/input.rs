//! Keyboard input
//!
//! Hosts feed raw `KeyboardEvent.key` strings in; the tick reads a
//! `TickInput` snapshot out. Raw keys are tracked individually, so with
//! both `ArrowLeft` and `a` down, releasing one keeps move-left held.

use std::collections::HashSet;

use crate::sim::TickInput;

/// Logical game action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
}

impl Action {
    /// Map a `KeyboardEvent.key` value to an action
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" | "A" => Some(Action::MoveLeft),
            "ArrowRight" | "d" | "D" => Some(Action::MoveRight),
            " " | "Spacebar" | "ArrowUp" | "w" | "W" => Some(Action::Jump),
            _ => None,
        }
    }
}

/// Set of currently held raw keys
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns true when the key is mapped, so the host
    /// knows to suppress the browser default (page scroll on space/arrows).
    pub fn key_down(&mut self, key: &str) -> bool {
        if Action::from_key(key).is_none() {
            return false;
        }
        self.held.insert(key.to_string());
        true
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.held.remove(key)
    }

    /// Drop everything (window blur, level transitions)
    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held
            .iter()
            .any(|key| Action::from_key(key) == Some(action))
    }

    pub fn snapshot(&self) -> TickInput {
        TickInput {
            left: self.is_held(Action::MoveLeft),
            right: self.is_held(Action::MoveRight),
            jump: self.is_held(Action::Jump),
        }
    }
}
