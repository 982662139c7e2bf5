//! Credential scheme identifiers and per-scheme configuration models.

pub mod scheme;

pub use scheme::*;
