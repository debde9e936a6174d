//! Business logic and repository trait definitions for Able Connect chat.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, plus the services built on them. It depends only on
//! `able-types` -- never on `able-infra` or any database/IO crate.

pub mod chat;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
