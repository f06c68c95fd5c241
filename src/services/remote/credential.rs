//! Privileged credential with a one-shot expiry timer.
//!
//! `set` stores the secret and spawns a sleep task that clears it once the
//! TTL elapses. Each `set` bumps a generation counter so a timer left over
//! from an earlier secret never clears a newer one. `get` also checks the
//! deadline, so an expired secret is unusable even if the timer task has not
//! run yet. `clear` is idempotent.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Default)]
struct Slot {
    secret: Option<String>,
    generation: u64,
    deadline: Option<Instant>,
}

/// Shared handle to the sudo password.
#[derive(Clone, Default)]
pub struct CredentialSlot {
    inner: Arc<Mutex<Slot>>,
}

impl std::fmt::Debug for CredentialSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSlot")
            .field("set", &self.lock().secret.is_some())
            .finish()
    }
}

impl CredentialSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `secret` for `ttl`. Must be called inside a tokio runtime.
    pub fn set(&self, secret: String, ttl: Duration) {
        let generation = {
            let mut slot = self.lock();
            slot.generation = slot.generation.wrapping_add(1);
            slot.secret = Some(secret);
            slot.deadline = Some(Instant::now() + ttl);
            slot.generation
        };

        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let mut slot = inner.lock().unwrap_or_else(|p| p.into_inner());
            if slot.generation == generation && slot.secret.is_some() {
                slot.secret = None;
                slot.deadline = None;
                tracing::info!("[Credential] sudo password expired");
            }
        });
    }

    /// The secret if set and not past its deadline.
    pub fn get(&self) -> Option<String> {
        let mut slot = self.lock();
        match slot.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                slot.secret = None;
                slot.deadline = None;
                None
            }
            _ => slot.secret.clone(),
        }
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    /// Forget the secret. Safe to call when already empty.
    pub fn clear(&self) {
        let mut slot = self.lock();
        slot.secret = None;
        slot.deadline = None;
    }
}
