//! Notification delivery abstractions.
//!
//! The core never sends real email; it calls a `Notifier` and reacts to the
//! outcome. Signup treats a failed `send_code` as fatal (the pending signup is
//! not stored and the caller sees a delivery error), while a failed
//! `send_status_change` is logged and never blocks the status transition.
//!
//! The default implementation for local dev is `LogNotifier`, which logs the
//! payload and reports success. Production deployments implement `Notifier`
//! against their delivery channel (SMTP, provider API, queue).

use anyhow::Result;
use tracing::info;

/// Outbound notification channel used by the auth and report engines.
pub trait Notifier: Send + Sync {
    /// Deliver a one-time signup code or return an error to abort the signup.
    ///
    /// # Errors
    /// Returns an error if the code could not be delivered.
    fn send_code(&self, email: &str, code: &str, display_name: &str) -> Result<()>;

    /// Notify a report owner about a status change. Best effort.
    ///
    /// # Errors
    /// Returns an error if the notice could not be delivered.
    fn send_status_change(
        &self,
        email: &str,
        display_name: &str,
        report_title: &str,
        old_status: &str,
        new_status: &str,
    ) -> Result<()>;
}

/// Local dev notifier that logs instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_code(&self, email: &str, code: &str, display_name: &str) -> Result<()> {
        info!(
            to_email = %email,
            display_name = %display_name,
            code = %code,
            "signup code send stub"
        );
        Ok(())
    }

    fn send_status_change(
        &self,
        email: &str,
        display_name: &str,
        report_title: &str,
        old_status: &str,
        new_status: &str,
    ) -> Result<()> {
        info!(
            to_email = %email,
            display_name = %display_name,
            report_title = %report_title,
            old_status = %old_status,
            new_status = %new_status,
            "status change send stub"
        );
        Ok(())
    }
}

/// Test double for the notifier. Lives in the library (not behind
/// `cfg(test)`) so the integration suite in `tests/` can observe deliveries
/// and flip the channel into a failing state.
#[doc(hidden)]
pub mod test_support {
    use super::Notifier;
    use anyhow::{Result, anyhow};
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    /// Records sent codes and can be flipped into a failing channel.
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent_codes: Mutex<Vec<(String, String)>>,
        fail: AtomicBool,
    }

    impl RecordingNotifier {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Turn delivery failures on or off for subsequent sends.
        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        #[must_use]
        pub fn last_code_for(&self, email: &str) -> Option<String> {
            self.sent_codes
                .lock()
                .ok()?
                .iter()
                .rev()
                .find(|(to, _)| to == email)
                .map(|(_, code)| code.clone())
        }
    }

    impl Notifier for RecordingNotifier {
        fn send_code(&self, email: &str, code: &str, _display_name: &str) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("delivery channel down"));
            }
            if let Ok(mut sent) = self.sent_codes.lock() {
                sent.push((email.to_string(), code.to_string()));
            }
            Ok(())
        }

        fn send_status_change(
            &self,
            _email: &str,
            _display_name: &str,
            _report_title: &str,
            _old_status: &str,
            _new_status: &str,
        ) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("delivery channel down"));
            }
            Ok(())
        }
    }
}
