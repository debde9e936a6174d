//! Two-party chat: persistence port and the service that owns the
//! conversation/message lifecycle rules.

pub mod repository;
pub mod service;
