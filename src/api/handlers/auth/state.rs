//! Auth state and configuration.

use std::sync::Arc;

use crate::api::notify::Notifier;

use super::otp::OtpRegistry;
use super::token::TokenService;
use super::utils::normalize_email;

const DEFAULT_OTP_TTL_SECONDS: u64 = 10 * 60;
const DEFAULT_OTP_SWEEP_SECONDS: u64 = 5 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    otp_ttl_seconds: u64,
    otp_sweep_seconds: u64,
    admin_emails: Vec<String>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            otp_sweep_seconds: DEFAULT_OTP_SWEEP_SECONDS,
            admin_emails: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: u64) -> Self {
        self.otp_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_otp_sweep_seconds(mut self, seconds: u64) -> Self {
        self.otp_sweep_seconds = seconds;
        self
    }

    /// Set the administrative allow-list. Entries are normalized once here so
    /// the predicate is a plain comparison.
    #[must_use]
    pub fn with_admin_emails(mut self, emails: Vec<String>) -> Self {
        self.admin_emails = emails
            .iter()
            .map(|email| normalize_email(email))
            .collect();
        self
    }

    /// Elevation rule: only emails on the configured allow-list become admins
    /// at verification time. Configuration, not code.
    #[must_use]
    pub fn is_administrative_identity(&self, email_normalized: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin == email_normalized)
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn otp_ttl_seconds(&self) -> u64 {
        self.otp_ttl_seconds
    }

    #[must_use]
    pub fn otp_sweep_seconds(&self) -> u64 {
        self.otp_sweep_seconds
    }
}

pub struct AuthState {
    config: AuthConfig,
    otp: OtpRegistry,
    tokens: TokenService,
    notifier: Arc<dyn Notifier>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        otp: OtpRegistry,
        tokens: TokenService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            otp,
            tokens,
            notifier,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn otp(&self) -> &OtpRegistry {
        &self.otp
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new("https://ripoti.dev".to_string());

        assert_eq!(config.frontend_base_url(), "https://ripoti.dev");
        assert_eq!(config.otp_ttl_seconds(), super::DEFAULT_OTP_TTL_SECONDS);
        assert_eq!(config.otp_sweep_seconds(), super::DEFAULT_OTP_SWEEP_SECONDS);

        let config = config
            .with_otp_ttl_seconds(120)
            .with_otp_sweep_seconds(30);

        assert_eq!(config.otp_ttl_seconds(), 120);
        assert_eq!(config.otp_sweep_seconds(), 30);
    }

    #[test]
    fn admin_allow_list_is_normalized() {
        let config = AuthConfig::new("https://ripoti.dev".to_string())
            .with_admin_emails(vec![" Admin@Ripoti.DEV ".to_string()]);

        assert!(config.is_administrative_identity("admin@ripoti.dev"));
        assert!(!config.is_administrative_identity("user@ripoti.dev"));
    }

    #[test]
    fn empty_allow_list_elevates_nobody() {
        let config = AuthConfig::new("https://ripoti.dev".to_string());
        assert!(!config.is_administrative_identity("admin@ripoti.dev"));
    }
}
