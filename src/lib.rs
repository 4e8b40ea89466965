//! # Ripoti
//!
//! `ripoti` is the backend core for a citizen reporting platform. Citizens
//! submit corruption ("red-flag") or service-intervention reports, track their
//! status, and administrators triage them.
//!
//! ## Accounts
//!
//! Accounts are created through signup with email one-time-code verification:
//! a signup request only parks a pending entry (hashed password + 6-digit
//! code) in an in-memory registry and delivers the code; the user row is
//! inserted on the first successful verification. Sessions are stateless
//! signed bearer tokens carrying `{user id, email, role}`.
//!
//! ## Reports
//!
//! Every report starts in `draft`. The owner may edit or delete it only while
//! it stays in `draft`; once an administrator moves it to
//! `under-investigation`, `rejected`, or `resolved` the content is frozen for
//! everyone, and only administrators may keep re-assigning the status.
//!
//! The role embedded in a token is a cache of the role at issuance time;
//! authorization-sensitive paths re-read the role from the database.

pub mod api;
pub mod cli;
