//! Shared domain types for Able Connect.
//!
//! Accounts, two-party conversations, messages, and their error and
//! configuration types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod account;
pub mod chat;
pub mod config;
pub mod error;
