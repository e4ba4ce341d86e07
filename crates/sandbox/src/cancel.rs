//! Per-surface cancellation tokens.
//!
//! Each preview surface has at most one live boot lifecycle. Registering a
//! new lifecycle for a surface cancels the token of the one it replaces, so
//! a stale lifecycle stops at its next suspension point.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Token handed to one lifecycle. `generation` identifies it within the
/// registry so a replaced lifecycle cannot unregister its successor.
#[derive(Debug, Clone)]
pub struct SurfaceToken {
    pub generation: u64,
    pub token: CancellationToken,
}

#[derive(Default)]
struct Inner {
    next_generation: u64,
    tokens: HashMap<String, SurfaceToken>,
}

#[derive(Default)]
pub struct SurfaceRegistry {
    inner: Mutex<Inner>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the token for a new lifecycle on `surface`, cancelling any
    /// previous one.
    pub fn register(&self, surface: &str) -> SurfaceToken {
        let mut inner = self.inner.lock();
        inner.next_generation += 1;
        let entry = SurfaceToken {
            generation: inner.next_generation,
            token: CancellationToken::new(),
        };
        if let Some(previous) = inner.tokens.insert(surface.to_owned(), entry.clone()) {
            tracing::debug!(surface, generation = previous.generation, "replacing active lifecycle");
            previous.token.cancel();
        }
        entry
    }

    /// Cancel the lifecycle on `surface`. Returns true if one was registered.
    pub fn cancel(&self, surface: &str) -> bool {
        match self.inner.lock().tokens.get(surface) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop the entry for `surface` if it is still `generation`.
    pub fn remove(&self, surface: &str, generation: u64) {
        let mut inner = self.inner.lock();
        if inner
            .tokens
            .get(surface)
            .is_some_and(|current| current.generation == generation)
        {
            inner.tokens.remove(surface);
        }
    }

    /// True when `surface` has a registered, uncancelled lifecycle.
    pub fn is_active(&self, surface: &str) -> bool {
        self.inner
            .lock()
            .tokens
            .get(surface)
            .is_some_and(|entry| !entry.token.is_cancelled())
    }

    /// Cancel every registered lifecycle.
    pub fn cancel_all(&self) {
        for entry in self.inner.lock().tokens.values() {
            entry.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_cancel() {
        let reg = SurfaceRegistry::new();
        let entry = reg.register("preview-1");
        assert!(reg.is_active("preview-1"));
        assert!(reg.cancel("preview-1"));
        assert!(entry.token.is_cancelled());
        assert!(!reg.is_active("preview-1"));
    }

    #[test]
    fn cancel_unknown_surface() {
        let reg = SurfaceRegistry::new();
        assert!(!reg.cancel("nope"));
    }

    #[test]
    fn second_register_cancels_first() {
        let reg = SurfaceRegistry::new();
        let first = reg.register("s");
        let second = reg.register("s");
        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        assert!(second.generation > first.generation);
        assert!(reg.is_active("s"));
    }

    #[test]
    fn stale_remove_keeps_successor() {
        let reg = SurfaceRegistry::new();
        let first = reg.register("s");
        let second = reg.register("s");
        reg.remove("s", first.generation);
        assert!(reg.is_active("s"));
        reg.remove("s", second.generation);
        assert!(!reg.is_active("s"));
    }

    #[test]
    fn surfaces_are_independent() {
        let reg = SurfaceRegistry::new();
        let a = reg.register("a");
        let b = reg.register("b");
        reg.cancel("a");
        assert!(a.token.is_cancelled());
        assert!(!b.token.is_cancelled());
    }

    #[test]
    fn cancel_all_reaches_every_surface() {
        let reg = SurfaceRegistry::new();
        let a = reg.register("a");
        let b = reg.register("b");
        reg.cancel_all();
        assert!(a.token.is_cancelled() && b.token.is_cancelled());
    }
}
