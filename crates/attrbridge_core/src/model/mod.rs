//! Typed model of declared types, members and their attributes.
//!
//! # Responsibility
//! - Replace runtime annotation discovery with explicit, typed declarations.
//! - Keep attribute identity (`AttributeKind`) separate from parameters.
//!
//! # Invariants
//! - Member attributes are resolved when a `MemberRef` is built, never per query.

pub mod attribute;
pub mod catalog;
