//! Infrastructure layer for Able Connect.
//!
//! Contains implementations of the repository traits defined in `able-core`
//! (SQLite storage with split reader/writer pools) plus configuration and
//! data directory resolution.

pub mod config;
pub mod sqlite;
