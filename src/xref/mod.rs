//! Cross-reference queries over decompiled binaries.
//!
//! This is the crate's outward face. [`finder::UsagesFinder`] runs the full
//! pipeline (scan, group, decompile, locate), [`locators`] maps entities to text
//! spans inside rendered trees, [`usage`] defines the result records and their
//! ordering, and [`path`] the `$metadata$` virtual document scheme.

pub mod finder;
pub mod locators;
pub mod path;
pub mod usage;

pub use finder::UsagesFinder;
pub use usage::{sort_usages, Usage};
