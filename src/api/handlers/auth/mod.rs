//! Account pipeline: signup with code verification, login, and stateless
//! session tokens.

pub(crate) mod login;
pub(crate) mod otp;
pub(crate) mod principal;
pub(crate) mod session;
pub(crate) mod signup;
pub(crate) mod state;
pub(crate) mod storage;
pub(crate) mod token;
pub(crate) mod types;
pub(crate) mod utils;

pub use otp::{OtpRegistry, spawn_otp_sweeper};
pub use principal::{Principal, require_auth};
pub use state::{AuthConfig, AuthState};
pub use token::TokenService;
pub use types::Role;
