//! Out-of-band signals a host can raise while a statement is running:
//! interrupt requests the reducer polls between statements.
//!
//! A trait object so a REPL can wire a real `Ctrl-C` handler while tests
//! wire a deterministic stand-in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Polled by the reducer between statements; `true` means "stop at the next
/// safe point and raise `INTERRUPT`".
pub trait AttentionSource: Send + Sync {
    fn interrupted(&self) -> bool;
}

#[derive(Default)]
pub struct AtomicAttention(AtomicBool);

impl AtomicAttention {
    pub fn new() -> Self {
        AtomicAttention(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AttentionSource for AtomicAttention {
    fn interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Never interrupted; the default for hosts that don't offer cancellation.
pub struct NeverInterrupted;

impl AttentionSource for NeverInterrupted {
    fn interrupted(&self) -> bool {
        false
    }
}

pub fn default_attention() -> Arc<dyn AttentionSource> {
    Arc::new(NeverInterrupted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_attention_round_trips() {
        let a = AtomicAttention::new();
        assert!(!a.interrupted());
        a.raise();
        assert!(a.interrupted());
        a.clear();
        assert!(!a.interrupted());
    }
}
