//! Rotation of the displayed item within each category.
//!
//! [`RotationState::advanced`] is the pure transition; [`RotationController`]
//! owns the current state and swaps it wholesale on each tick so readers
//! never observe a half-advanced set of indices.

use std::sync::RwLock;

use crate::lock::{rw_read, rw_write};
use crate::source::Category;

/// Current display index per category, each in `[0, len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationState {
    indices: [usize; Category::ALL.len()],
}

impl RotationState {
    pub fn index(&self, category: Category) -> usize {
        self.indices[category.index()]
    }

    /// Every index moved forward by one, wrapping at `len`.
    pub fn advanced(self, len: usize) -> Self {
        let len = len.max(1);
        Self {
            indices: self.indices.map(|i| (i + 1) % len),
        }
    }
}

pub struct RotationController {
    state: RwLock<RotationState>,
    len: usize,
}

impl RotationController {
    /// All indices start at zero and wrap at `len` (items per category).
    pub fn new(len: usize) -> Self {
        Self {
            state: RwLock::new(RotationState::default()),
            len,
        }
    }

    pub fn state(&self) -> RotationState {
        *rw_read(&self.state, "rotation.state")
    }

    /// Advance every category by one.  Returns the new state.
    pub fn tick(&self) -> RotationState {
        let mut state = rw_write(&self.state, "rotation.tick");
        *state = state.advanced(self.len);
        tracing::trace!(indices = ?state.indices, "rotation tick");
        *state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let controller = RotationController::new(5);
        for category in Category::ALL {
            assert_eq!(controller.state().index(category), 0);
        }
    }

    #[test]
    fn each_tick_advances_by_exactly_one_and_wraps() {
        let controller = RotationController::new(5);
        let mut seen = Vec::new();
        for _ in 0..12 {
            seen.push(controller.tick().index(Category::Trivia));
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 0, 1, 2, 3, 4, 0, 1, 2]);
    }

    #[test]
    fn all_categories_move_together() {
        let controller = RotationController::new(3);
        controller.tick();
        let state = controller.tick();
        for category in Category::ALL {
            assert_eq!(state.index(category), 2);
        }
    }

    #[test]
    fn single_item_rotation_stays_put() {
        let state = RotationState::default().advanced(1).advanced(1);
        assert_eq!(state.index(Category::Word), 0);
    }

    #[test]
    fn transition_is_pure() {
        let before = RotationState::default();
        let after = before.advanced(5);
        assert_eq!(before.index(Category::Quote), 0);
        assert_eq!(after.index(Category::Quote), 1);
    }
}
