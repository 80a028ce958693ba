//! Attribute resolution over a read-only mapping configuration.

pub mod attribute_resolver;
