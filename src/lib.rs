// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
//#![deny(unsafe_code)]
// - 'metadata/registry.rs' uses mmap to map a module file into memory

//! # cilxref
//!
//! A cross-reference engine for compiled .NET binaries. `cilxref` answers
//! "find usages" style questions about entities that exist only in binary form:
//! which methods call this method, which bodies read or write this field, which
//! declarations mention this type. Results are positioned inside decompiled
//! source text so an editor can navigate to them, even though no source file
//! ever existed.
//!
//! ## Features
//!
//! - **Bytecode usage scanning** - Direct CIL instruction decoding finds call
//!   sites, field accesses and type mentions without rendering source
//! - **Virtual-dispatch awareness** - Querying an override also finds `callvirt`
//!   sites bound to the base slot
//! - **Decompilation caching** - Each root declaration is rendered at most once
//!   per process and shared across queries
//! - **Bounded parallelism** - Hit groups decompile on a capped worker pool, so
//!   memory stays flat on large result sets
//! - **Virtual document paths** - Usages in decompiled text are addressed with
//!   a `$metadata$` scheme a host can round-trip
//!
//! ## Quick Start
//!
//! Add `cilxref` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cilxref = "0.1"
//! ```
//!
//! The host supplies two collaborators: a [`metadata::module::ModuleLoader`]
//! that parses raw module bytes into fixed-up entries, and a
//! [`decompiler::Decompiler`] that renders a root declaration into annotated
//! text. With those in hand:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cilxref::prelude::*;
//!
//! fn run(loader: &dyn ModuleLoader, decompiler: Arc<dyn Decompiler>) -> cilxref::Result<()> {
//!     let registry = Arc::new(ModuleRegistry::new());
//!     let module = registry.open(std::path::Path::new("bin/App.dll"), loader)?;
//!
//!     let target = EntityHandle::new(module.id(), Token::new(0x0600_0042));
//!     let finder = UsagesFinder::new(registry.clone(), decompiler, "App");
//!     let scope = RegistryScope::new(registry);
//!
//!     for usage in finder.find_method_usages(target, &scope, &QueryOptions::default())? {
//!         println!("{}:{}: {}", usage.file, usage.span.start.line, usage.excerpt);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! A query flows through four stages:
//!
//! 1. **Scan** ([`analysis`]) - walk the candidate scope's method bodies and
//!    signatures, decoding IL on the fly, and collect the members that use the
//!    target
//! 2. **Group** ([`xref::finder`]) - bucket hits by the root type declaration
//!    that contains them, since one root decompiles into one document
//! 3. **Decompile** ([`decompiler`]) - render each root once through the shared
//!    cache
//! 4. **Locate** ([`xref::locators`]) - map every hit to a text span in its
//!    rendered tree and emit sorted [`xref::usage::Usage`] records
//!
//! ## Thread Safety
//!
//! All shared state ([`metadata::registry::ModuleRegistry`],
//! [`decompiler::cache::DecompilationCache`]) is lock-free or sharded and safe
//! to use from any number of threads. Queries themselves fan out on a private
//! rayon pool and never block each other.

pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use cilxref::prelude::*;
///
/// let registry = ModuleRegistry::new();
/// assert!(registry.is_empty());
/// ```
pub mod prelude;

/// Usage scanners over decoded CIL and member signatures.
///
/// The scanners answer one question each about a target entity:
///
/// - [`analysis::method::MethodUsageScanner`] - which bodies call, construct or
///   take the address of a method
/// - [`analysis::field::FieldUsageScanner`] - which bodies read, write or take
///   the address of a field
/// - [`analysis::property::AccessorUsageScanner`] - which bodies go through a
///   property's or event's accessors
/// - [`analysis::types::TypeUsageScanner`] - which declarations mention a type
///   anywhere a type can be named
///
/// Scanning is pure metadata work; no decompilation happens here.
pub mod analysis;

/// Decompiled units, annotated syntax trees and the process-wide cache.
///
/// The actual rendering is behind the [`decompiler::Decompiler`] trait; this
/// module owns what comes back: the flat-arena [`decompiler::ast::SyntaxTree`]
/// with entity annotations, the rendered text, and the
/// [`decompiler::cache::DecompilationCache`] keyed by `(module, root)`.
pub mod decompiler;

/// CIL instruction decoding primitives.
///
/// A minimal single-pass decoder: the full one- and two-byte opcode tables with
/// operand widths, and [`disassembler::IlCursor`] for walking a raw method body.
/// The scanners only ever need mnemonics, operand widths and token operands, so
/// there is no operand materialization or control-flow analysis here.
pub mod disassembler;

/// Module identity, entity handles and the fixed-up type system.
///
/// Entities are addressed by [`metadata::handle::EntityHandle`], the pair of a
/// registry-assigned module id and the entity's metadata token. Two handles are
/// the same entity only if both parts match; tokens are meaningless across
/// modules. The [`metadata::registry::ModuleRegistry`] loads and deduplicates
/// modules, and [`metadata::typesystem`] holds the loader-produced entries the
/// scanners walk.
pub mod metadata;

/// Cross-reference queries: the finder, span locators, usage records and
/// virtual document paths.
pub mod xref;

/// `cilxref` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. Used consistently throughout the crate for all fallible
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `cilxref` Error type
///
/// The main error type for all operations in this crate. Query-level failures
/// (module loading, decompilation, cancellation) surface here; per-body decode
/// problems are recovered internally and never abort a scan.
pub use error::Error;

/// Main entry point for cross-reference queries.
///
/// See [`xref::finder::UsagesFinder`] for the full query surface.
pub use xref::finder::UsagesFinder;

/// Loaded-module registry, the identity authority for entity handles.
pub use metadata::registry::ModuleRegistry;

/// Handle of one entity in one loaded module.
pub use metadata::handle::EntityHandle;

/// A raw metadata token, table id plus row index.
pub use metadata::token::Token;
