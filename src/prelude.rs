//! # cilxref Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and
//! traits from the cilxref library. Import this module to get quick access to the
//! essential types for cross-reference queries.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilxref operations
pub use crate::Error;

/// The result type used throughout cilxref
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Query entry point: find usages, declarations and implementations
pub use crate::xref::finder::UsagesFinder;

/// Loaded-module registry and identity authority
pub use crate::metadata::registry::ModuleRegistry;

// ================================================================================================
// Metadata System - Core Types
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Module identity and entity addressing
pub use crate::metadata::handle::{EntityHandle, ModuleId};

/// Loader-facing module data model
pub use crate::metadata::module::{EntityRef, Module, ModuleData, ModuleLoader};

// ================================================================================================
// Type System
// ================================================================================================

/// Fixed-up entries the scanners walk
pub use crate::metadata::typesystem::{
    AttributeEntry, AttributeValue, EventEntry, EventEntryRc, FieldEntry, FieldEntryRc,
    MemberKind, MethodBody, MethodEntry, MethodEntryRc, MethodSig, PropertyEntry, PropertyEntryRc,
    TypeEntry, TypeEntryRc, TypeSig,
};

// ================================================================================================
// Analysis and Queries
// ================================================================================================

/// Query configuration and scope
pub use crate::analysis::{
    CancellationToken, FieldAccess, QueryOptions, RegistryScope, ScopeProvider,
};

/// Usage records and their ordering
pub use crate::xref::usage::{sort_usages, Usage};

/// Virtual document paths for decompiled sources
pub use crate::xref::path::{is_metadata_path, metadata_file_path};

// ================================================================================================
// Decompilation
// ================================================================================================

/// Decompiled units and the renderer trait
pub use crate::decompiler::{Decompilation, Decompiler};

/// Process-wide decompilation cache
pub use crate::decompiler::cache::DecompilationCache;

/// Annotated syntax trees and text positions
pub use crate::decompiler::ast::{
    AstNode, NodeId, NodeKind, SyntaxTree, TextLocation, TextSpan,
};
