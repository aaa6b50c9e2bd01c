//! Shared cancellation flag for an in-flight turn.
//!
//! A [`CancelSignal`] is cloned out of the session and handed to whatever
//! observes the user (a Ctrl-C handler, a UI button). Setting it stops the
//! current stream at the next chunk boundary, or immediately if the session
//! is waiting for the provider.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Cloneable cancel flag backed by a replaceable [`CancellationToken`].
///
/// A `CancellationToken` can't be un-cancelled, so clearing the flag swaps a
/// fresh token into the shared slot. Every clone sees the swap.
#[derive(Clone, Default)]
pub struct CancelSignal {
    slot: Arc<Mutex<CancellationToken>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the in-flight turn to stop. Safe to call from any task.
    pub fn request_cancel(&self) {
        self.lock().cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.lock().is_cancelled()
    }

    /// Resolves once a cancel is requested on the current token.
    pub async fn cancelled(&self) {
        let token = self.lock().clone();
        token.cancelled().await;
    }

    /// Clear the flag.
    pub fn reset(&self) {
        *self.lock() = CancellationToken::new();
    }

    /// Clear the flag and return the token the next turn should watch.
    pub(crate) fn arm(&self) -> CancellationToken {
        let mut slot = self.lock();
        *slot = CancellationToken::new();
        slot.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CancellationToken> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelSignal")
            .field("requested", &self.is_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_seen_by_clones() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_requested());

        signal.request_cancel();
        assert!(observer.is_requested());
    }

    #[test]
    fn reset_clears_for_every_clone() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        signal.request_cancel();

        observer.reset();
        assert!(!signal.is_requested());
    }

    #[tokio::test]
    async fn armed_token_fires_on_request() {
        let signal = CancelSignal::new();
        signal.request_cancel();

        // Arming discards the stale request
        let token = signal.arm();
        assert!(!token.is_cancelled());

        let remote = signal.clone();
        tokio::spawn(async move { remote.request_cancel() });
        signal.cancelled().await;
        assert!(token.is_cancelled());
    }
}
