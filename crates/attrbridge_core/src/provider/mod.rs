//! Host pipeline hooks.
//!
//! # Responsibility
//! - Intercept the host's metadata and validator construction seams.
//! - Hand the host factory the merged attribute set instead of the declared one.
//!
//! # Invariants
//! - Adapters only borrow the shared configuration; nothing here mutates it.

pub mod metadata;
pub mod validator;
