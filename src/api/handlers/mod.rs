//! API handlers for Ripoti.
//!
//! `auth` owns the account pipeline (signup, one-time-code verification,
//! login, tokens) and `reports` owns the report lifecycle and its
//! authorization rules.

pub mod auth;
pub mod health;
pub mod reports;
pub mod root;
