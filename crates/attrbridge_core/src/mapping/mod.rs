//! Read-only mapping configuration consumed by attribute resolution.
//!
//! Property maps are always declared explicitly; there is no naming
//! convention engine, flattening or projection here.

pub mod configuration;
pub mod type_map;
