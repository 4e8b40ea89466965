//! In-memory one-time-code registry for pending signups.
//!
//! Keyed by normalized email. Each entry carries the hashed candidate
//! credentials so no user row exists until the code is verified. Expiry is
//! checked on every `consume`; the periodic sweep only bounds memory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

use super::state::AuthState;

/// A signup awaiting code verification. Never exposed to clients.
#[derive(Clone, Debug)]
pub struct PendingSignup {
    pub code: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    expires_at: Instant,
}

pub struct OtpRegistry {
    ttl: Duration,
    entries: Mutex<HashMap<String, PendingSignup>>,
}

impl OtpRegistry {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Park a pending signup, overwriting any prior entry for the email.
    pub async fn store(
        &self,
        email: &str,
        code: String,
        password_hash: String,
        first_name: String,
        last_name: String,
    ) {
        let entry = PendingSignup {
            code,
            password_hash,
            first_name,
            last_name,
            expires_at: Instant::now() + self.ttl,
        };
        let mut entries = self.entries.lock().await;
        entries.insert(email.to_string(), entry);
    }

    /// One-shot consume: returns the pending signup only when an entry exists,
    /// has not expired, and the code matches exactly.
    ///
    /// A wrong code leaves the entry in place so a subsequent correct attempt
    /// within the TTL still succeeds; an expired entry is dropped on sight.
    pub async fn consume(&self, email: &str, code: &str) -> Option<PendingSignup> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(email)?;
        if Instant::now() >= entry.expires_at {
            entries.remove(email);
            return None;
        }
        if entry.code != code {
            return None;
        }
        entries.remove(email)
    }

    /// Drop all expired entries. Maintenance only; `consume` re-checks expiry.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Run `sweep` on a fixed interval for as long as the server lives.
pub fn spawn_otp_sweeper(state: Arc<AuthState>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;
            let removed = state.otp().sweep().await;
            if removed > 0 {
                debug!(removed, "swept expired pending signups");
            }
        }
    });
}
