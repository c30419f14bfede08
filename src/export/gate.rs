//! Single-export gate and cooperative cancellation.

use crate::foundation::error::{ReelError, ReelResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared cancellation flag. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Honored at the next checkpoint.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` if cancellation was requested.
    pub fn checkpoint(&self, phase: &str) -> ReelResult<()> {
        if self.is_cancelled() {
            return Err(ReelError::cancelled(format!("export cancelled during {phase}")));
        }
        Ok(())
    }
}

/// Admits at most one export at a time. Try-acquire only; requests are never queued.
#[derive(Debug, Default)]
pub struct ExportGate {
    active: Mutex<Option<CancelToken>>,
}

impl ExportGate {
    fn slot(&self) -> MutexGuard<'_, Option<CancelToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the gate, or `None` if an export is already running.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ExportPermit> {
        let mut slot = self.slot();
        if slot.is_some() {
            return None;
        }
        let token = CancelToken::new();
        *slot = Some(token.clone());
        Some(ExportPermit {
            gate: Arc::clone(self),
            token,
        })
    }

    pub fn is_active(&self) -> bool {
        self.slot().is_some()
    }

    /// Cancel the running export. Returns `false` when nothing is running.
    pub fn cancel_active(&self) -> bool {
        match self.slot().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Proof of holding the gate. Dropping it reopens the gate whatever the export outcome.
#[derive(Debug)]
pub struct ExportPermit {
    gate: Arc<ExportGate>,
    token: CancelToken,
}

impl ExportPermit {
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Drop for ExportPermit {
    fn drop(&mut self) {
        *self.gate.slot() = None;
    }
}
