use crate::api::{
    self,
    handlers::auth::{AuthConfig, AuthState, OtpRegistry, TokenService},
    notify::LogNotifier,
};
use anyhow::Result;
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub token_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub otp_ttl_seconds: u64,
    pub otp_sweep_seconds: u64,
    pub admin_emails: Vec<String>,
    pub frontend_base_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = AuthConfig::new(args.frontend_base_url)
        .with_otp_ttl_seconds(args.otp_ttl_seconds)
        .with_otp_sweep_seconds(args.otp_sweep_seconds)
        .with_admin_emails(args.admin_emails);

    let tokens = TokenService::new(args.token_secret, args.token_ttl_seconds);
    let otp = OtpRegistry::new(Duration::from_secs(config.otp_ttl_seconds()));
    let state = Arc::new(AuthState::new(config, otp, tokens, Arc::new(LogNotifier)));

    api::new(args.port, args.dsn, state).await
}
