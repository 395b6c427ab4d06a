//! Metadata model: tokens, handles, modules and the fixed-up type system.
//!
//! # Key Types
//! - [`token::Token`] - raw 32-bit metadata token
//! - [`handle::EntityHandle`] - module-scoped entity identity
//! - [`module::Module`] - one loaded binary with its entity tables
//! - [`registry::ModuleRegistry`] - process-wide module owner
//! - [`typesystem`] - the entries the usage scanners walk

pub mod handle;
pub mod module;
pub mod registry;
pub mod token;
pub mod typesystem;
