//! Per-class numbering lock state.
//!
//! The numbers themselves live on the blocks (`Block::numbering`); this only
//! records how each class reacts to structural change.

use crate::id::BlockId;
use scriptory_templates::NumberingClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockState {
    /// Renumbered from 1 after every structural change
    #[default]
    Unlocked,

    /// Existing numbers are frozen
    Locked,

    /// Numbers of the blocks from `first` to `last` (document order) are frozen
    PartiallyLocked { first: BlockId, last: BlockId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingState {
    #[serde(default)]
    classes: BTreeMap<NumberingClass, LockState>,
}

impl NumberingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, class: NumberingClass) -> LockState {
        self.classes.get(&class).copied().unwrap_or_default()
    }

    /// Set a class's state; returns the previous one.
    pub fn set(&mut self, class: NumberingClass, state: LockState) -> LockState {
        let previous = self.state(class);
        if state == LockState::Unlocked {
            self.classes.remove(&class);
        } else {
            self.classes.insert(class, state);
        }
        previous
    }

    pub fn is_locked(&self, class: NumberingClass) -> bool {
        self.state(class) != LockState::Unlocked
    }

    /// Classes with a non-default state
    pub fn locked_classes(&self) -> impl Iterator<Item = (NumberingClass, LockState)> + '_ {
        self.classes.iter().map(|(class, state)| (*class, *state))
    }
}

/// Letter suffix for the n-th (1-based) insertion after a locked number:
/// A..Z, then AA, AB and so on.
pub fn suffix_letters(mut n: u32) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Position of a suffix in the `suffix_letters` sequence (0 for none)
pub fn suffix_index(suffix: Option<&str>) -> u32 {
    suffix
        .map(|s| {
            s.chars()
                .filter(char::is_ascii_uppercase)
                .fold(0u32, |acc, c| acc * 26 + (c as u32 - 'A' as u32 + 1))
        })
        .unwrap_or(0)
}
