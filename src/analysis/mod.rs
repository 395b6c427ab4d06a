//! Usage scanners over decoded CIL and member signatures.
//!
//! Each scanner answers one question about a target entity - which methods call it,
//! which methods touch a field, which declarations mention a type - by walking a
//! candidate scope of type entries and testing their members. Scanners never look at
//! decompiled text; they operate purely on metadata entries and raw instruction
//! streams, which is what makes them cheap enough to run over every loaded module.
//!
//! # Architecture
//!
//! - [`AnalyzerContext`] carries the registry plus a memo table for virtual-dispatch
//!   resolution, shared by all scanners of one query.
//! - [`ScopeProvider`] abstracts where candidate types come from. The workspace host
//!   supplies one; [`RegistryScope`] enumerates every registered module and is what
//!   the finder uses by default.
//! - The per-kind scanners live in [`method`], [`field`], [`property`] and [`types`].
//!
//! # Error recovery
//!
//! A malformed method body never aborts a scan. Decode errors are swallowed at the
//! body boundary (the body simply produces no hits) so one bad member cannot hide
//! usages elsewhere in scope. Cancellation, by contrast, propagates as
//! [`crate::Error::Cancelled`].

pub mod field;
pub mod method;
pub mod property;
pub mod types;

#[cfg(test)]
pub(crate) mod tests_support;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use bitflags::bitflags;
use dashmap::DashMap;

use crate::metadata::{
    handle::EntityHandle,
    registry::ModuleRegistry,
    typesystem::{
        EventEntryRc, FieldEntryRc, MemberKind, MethodEntryRc, PropertyEntryRc, TypeEntryRc,
    },
};

/// Longest override chain the resolver will follow before assuming a cycle
/// in malformed metadata.
const MAX_OVERRIDE_DEPTH: usize = 64;

/// Cooperative cancellation flag shared between a query and its caller.
///
/// Clones observe the same flag. Scanners poll it between candidate types and
/// a set flag surfaces as [`crate::Error::Cancelled`] from the query.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that is never cancelled unless [`CancellationToken::cancel`] is called
    #[must_use]
    pub fn new() -> Self {
        CancellationToken::default()
    }

    /// Requests cancellation. Irrevocable for this token and all its clones.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// True once [`CancellationToken::cancel`] has been called
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

bitflags! {
    /// Which field access directions a field-usage query reports.
    ///
    /// Address-of instructions (`ldflda`, `ldsflda`) always match regardless of
    /// these flags, since a taken address can be used for either direction.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct FieldAccess: u8 {
        /// Report field loads (`ldfld`, `ldsfld`)
        const READ = 0b01;
        /// Report field stores (`stfld`, `stsfld`)
        const WRITE = 0b10;
    }
}

impl Default for FieldAccess {
    fn default() -> Self {
        FieldAccess::READ | FieldAccess::WRITE
    }
}

/// Per-query knobs shared by all usage queries.
#[derive(Clone, Debug)]
pub struct QueryOptions {
    /// Field access filter, only consulted by field-usage queries
    pub field_access: FieldAccess,
    /// Whether type-usage queries scan method bodies in addition to
    /// signatures and base lists
    pub scan_bodies: bool,
    /// Upper bound on root-declaration groups decompiled in parallel
    pub max_parallel_groups: usize,
    /// Cancellation flag polled throughout the query
    pub cancellation: CancellationToken,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            field_access: FieldAccess::default(),
            scan_bodies: true,
            // Decompilation dominates the cost and is memory hungry, so the
            // group fan-out stays narrow regardless of core count.
            max_parallel_groups: 3,
            cancellation: CancellationToken::new(),
        }
    }
}

/// Source of candidate types for a scan.
///
/// The scope decides which declarations can possibly be reported as usages.
/// Implementations must be cheap to call; scanners snapshot the scope once per
/// query.
pub trait ScopeProvider: Send + Sync {
    /// Every type entry the scan should consider, nested types included
    fn scope_types(&self) -> Vec<TypeEntryRc>;
}

/// Scope covering every type of every module in a registry.
pub struct RegistryScope {
    registry: Arc<ModuleRegistry>,
}

impl RegistryScope {
    /// Creates a scope over `registry`
    #[must_use]
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        RegistryScope { registry }
    }
}

impl ScopeProvider for RegistryScope {
    fn scope_types(&self) -> Vec<TypeEntryRc> {
        self.registry
            .modules()
            .iter()
            .flat_map(|module| module.types())
            .collect()
    }
}

/// Shared state for the scanners of a single query.
pub struct AnalyzerContext {
    registry: Arc<ModuleRegistry>,
    /// Memo of method handle -> base-most override, including the identity
    /// mapping for methods that override nothing.
    overrides: DashMap<EntityHandle, EntityHandle>,
}

impl AnalyzerContext {
    /// Creates a context over `registry`
    #[must_use]
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        AnalyzerContext {
            registry,
            overrides: DashMap::new(),
        }
    }

    /// The registry this context resolves against
    #[must_use]
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Resolves `method` to the base-most member of its override chain.
    ///
    /// A method that overrides nothing resolves to itself, as does a handle whose
    /// entry cannot be found (the chain is simply cut there). Chains longer than
    /// [`MAX_OVERRIDE_DEPTH`] are treated as cyclic and stop at the last resolved
    /// member.
    pub fn base_most_override(&self, method: EntityHandle) -> EntityHandle {
        if let Some(found) = self.overrides.get(&method) {
            return *found;
        }

        let mut current = method;
        for _ in 0..MAX_OVERRIDE_DEPTH {
            let Some(entry) = self.registry.method_entry(current) else {
                break;
            };
            match entry.overridden {
                Some(parent) if parent != current => current = parent,
                _ => break,
            }
        }

        self.overrides.insert(method, current);
        current
    }
}

/// One usage hit: the scope member that uses the target.
///
/// Accessor bodies report their owning property or event, not the raw accessor
/// method, so results line up with what a reader sees in decompiled source.
#[derive(Clone)]
pub enum Hit {
    /// A type uses the target (base list or attributes)
    Type(TypeEntryRc),
    /// A method body or signature uses the target
    Method(MethodEntryRc),
    /// A field signature uses the target
    Field(FieldEntryRc),
    /// A property signature or accessor body uses the target
    Property(PropertyEntryRc),
    /// An event signature or accessor body uses the target
    Event(EventEntryRc),
}

impl Hit {
    /// Handle of the reported member
    #[must_use]
    pub fn handle(&self) -> EntityHandle {
        match self {
            Hit::Type(entry) => entry.handle,
            Hit::Method(entry) => entry.handle,
            Hit::Field(entry) => entry.handle,
            Hit::Property(entry) => entry.handle,
            Hit::Event(entry) => entry.handle,
        }
    }

    /// Simple name of the reported member
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Hit::Type(entry) => &entry.name,
            Hit::Method(entry) => &entry.name,
            Hit::Field(entry) => &entry.name,
            Hit::Property(entry) => &entry.name,
            Hit::Event(entry) => &entry.name,
        }
    }

    /// Kind tag of the reported member
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        match self {
            Hit::Type(_) => MemberKind::Type,
            Hit::Method(_) => MemberKind::Method,
            Hit::Field(_) => MemberKind::Field,
            Hit::Property(_) => MemberKind::Property,
            Hit::Event(_) => MemberKind::Event,
        }
    }

    /// Handle of the type declaring the reported member. For a type hit this is
    /// the type itself.
    #[must_use]
    pub fn declaring_type(&self) -> EntityHandle {
        match self {
            Hit::Type(entry) => entry.handle,
            Hit::Method(entry) => entry.declaring_type,
            Hit::Field(entry) => entry.declaring_type,
            Hit::Property(entry) => entry.declaring_type,
            Hit::Event(entry) => entry.declaring_type,
        }
    }
}

impl std::fmt::Debug for Hit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.name())
    }
}
