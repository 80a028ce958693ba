//! Mapping document configuration.
//!
//! # Responsibility
//! - Load declared types and type maps from JSON into ready-to-share values.
//!
//! # Invariants
//! - Loading is the only place declarations are validated; resolution
//!   assumes a valid configuration.

pub mod document;
