//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        token_secret: SecretString::from(auth_opts.token_secret),
        token_ttl_seconds: auth_opts.token_ttl_seconds,
        otp_ttl_seconds: auth_opts.otp_ttl_seconds,
        otp_sweep_seconds: auth_opts.otp_sweep_seconds,
        admin_emails: auth_opts.admin_emails,
        frontend_base_url: auth_opts.frontend_base_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn server_args_from_matches() {
        temp_env::with_vars(
            [
                ("RIPOTI_PORT", None::<&str>),
                ("RIPOTI_ADMIN_EMAILS", Some("admin@ripoti.dev")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "ripoti",
                    "--dsn",
                    "postgres://user@localhost:5432/ripoti",
                    "--token-secret",
                    "sekret",
                ]);
                let action = handler(&matches).expect("action");
                let Action::Server(args) = action;
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/ripoti");
                assert_eq!(args.token_secret.expose_secret(), "sekret");
                assert_eq!(args.admin_emails, vec!["admin@ripoti.dev"]);
            },
        );
    }
}
