//! The fixed-up type system consumed by the usage scanners.
//!
//! This is deliberately a data model, not a semantic analyzer: the external module
//! loader resolves raw metadata into these entries once, and everything downstream
//! (scanners, locators, result assembly) only reads them.
//!
//! # Key Types
//! - [`TypeEntry`] - one candidate scope entry with members and base types
//! - [`MethodEntry`] / [`FieldEntry`] / [`PropertyEntry`] / [`EventEntry`] - members
//! - [`TypeSig`] - structural type reference with [`TypeSig::contains`]
//! - [`AttributeEntry`] / [`AttributeValue`] - attribute arguments, nested arrays included
//! - [`MemberKind`] - tag for the few, fixed member kinds

mod entry;
mod sig;

pub use entry::{
    AttributeEntry, AttributeValue, EventEntry, FieldEntry, MemberKind, MethodBody, MethodEntry,
    MethodSig, PropertyEntry, TypeEntry,
};
pub use sig::TypeSig;

use std::sync::Arc;

/// Shared reference to a type entry
pub type TypeEntryRc = Arc<TypeEntry>;
/// Shared reference to a method entry
pub type MethodEntryRc = Arc<MethodEntry>;
/// Shared reference to a field entry
pub type FieldEntryRc = Arc<FieldEntry>;
/// Shared reference to a property entry
pub type PropertyEntryRc = Arc<PropertyEntry>;
/// Shared reference to an event entry
pub type EventEntryRc = Arc<EventEntry>;
