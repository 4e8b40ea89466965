//! Auth-related CLI arguments: token signing, one-time-code TTLs, and the
//! administrative email allow-list.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_OTP_TTL_SECONDS: &str = "otp-ttl-seconds";
pub const ARG_OTP_SWEEP_SECONDS: &str = "otp-sweep-seconds";
pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long("token-secret")
                .help("Secret used to sign session tokens")
                .env("RIPOTI_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long("token-ttl-seconds")
                .help("Session token TTL in seconds")
                .env("RIPOTI_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_OTP_TTL_SECONDS)
                .long("otp-ttl-seconds")
                .help("One-time signup code TTL in seconds")
                .env("RIPOTI_OTP_TTL_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_OTP_SWEEP_SECONDS)
                .long("otp-sweep-seconds")
                .help("Interval between expired-code sweeps in seconds")
                .env("RIPOTI_OTP_SWEEP_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long("admin-email")
                .help("Email granted the admin role on verification (repeatable)")
                .env("RIPOTI_ADMIN_EMAILS")
                .value_delimiter(',')
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long("frontend-base-url")
                .help("Frontend base URL allowed for CORS")
                .env("RIPOTI_FRONTEND_BASE_URL")
                .default_value("https://ripoti.dev"),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub token_secret: String,
    pub token_ttl_seconds: i64,
    pub otp_ttl_seconds: u64,
    pub otp_sweep_seconds: u64,
    pub admin_emails: Vec<String>,
    pub frontend_base_url: String,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let token_secret = matches
            .get_one::<String>(ARG_TOKEN_SECRET)
            .cloned()
            .context("missing required argument: --token-secret")?;
        let token_ttl_seconds = matches
            .get_one::<i64>(ARG_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(86_400);
        let otp_ttl_seconds = matches
            .get_one::<u64>(ARG_OTP_TTL_SECONDS)
            .copied()
            .unwrap_or(600);
        let otp_sweep_seconds = matches
            .get_one::<u64>(ARG_OTP_SWEEP_SECONDS)
            .copied()
            .unwrap_or(300);
        let admin_emails = matches
            .get_many::<String>(ARG_ADMIN_EMAIL)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .context("missing argument: --frontend-base-url")?;

        Ok(Self {
            token_secret,
            token_ttl_seconds,
            otp_ttl_seconds,
            otp_sweep_seconds,
            admin_emails,
            frontend_base_url,
        })
    }
}
