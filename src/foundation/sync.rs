use std::sync::{PoisonError, RwLock};

/// Thread-safe cell holding one value shared between the control and render contexts.
///
/// Reads take the shared lock and clone the value out; writes take the exclusive lock and replace
/// it wholesale. Neither side ever holds the lock across other work, so a reader cannot observe a
/// torn value and a writer waits at most for one in-progress clone.
///
/// Poisoning is ignored: every write stores a complete value, so the guarded data stays valid
/// even if a holder panicked.
#[derive(Debug, Default)]
pub struct SyncCell<T> {
    inner: RwLock<T>,
}

impl<T: Clone> SyncCell<T> {
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the stored value.
    pub fn set(&self, value: T) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// Replace the stored value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, value)
    }

    /// Apply `f` and store its result under one exclusive lock.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let next = f(&guard);
        *guard = next.clone();
        next
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/sync.rs"]
mod tests;
