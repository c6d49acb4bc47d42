//! Player progress on top of a key/value store

use super::{KEY_HIGHEST_UNLOCKED, KEY_TUTORIAL_SHOWN, KeyValueStore};
use crate::levels;

/// Typed view of the persisted progress keys
#[derive(Debug, Clone, Default)]
pub struct Progress<S> {
    store: S,
}

impl<S: KeyValueStore> Progress<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Highest level index the player may enter (level 1 is always open)
    pub fn highest_unlocked_level_index(&self) -> usize {
        usize::try_from(self.store.get_int(KEY_HIGHEST_UNLOCKED)).unwrap_or(0)
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        levels::is_unlocked(index, self.highest_unlocked_level_index())
    }

    /// Record completion of `current_level_index`.
    ///
    /// Only ever raises the stored index, so replaying a cleared level is a no-op.
    /// Returns true if a new level was unlocked.
    pub fn unlock_next_level(&mut self, current_level_index: usize) -> bool {
        let next = current_level_index + 1;
        if next > self.highest_unlocked_level_index() {
            self.store.set_int(KEY_HIGHEST_UNLOCKED, next as i64);
            log::info!("Unlocked level index {}", next);
            true
        } else {
            false
        }
    }

    /// Explicit wipe; the only way the unlock index goes down
    pub fn reset_progress(&mut self) {
        self.store.set_int(KEY_HIGHEST_UNLOCKED, 0);
        log::info!("Progress reset");
    }

    pub fn has_shown_tutorial(&self) -> bool {
        self.store.get_bool(KEY_TUTORIAL_SHOWN)
    }

    pub fn mark_tutorial_shown(&mut self) {
        self.store.set_bool(KEY_TUTORIAL_SHOWN, true);
    }
}
