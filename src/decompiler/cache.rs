//! Process-wide decompilation memoization.
//!
//! Decompiling a root declaration is by far the most expensive step of a
//! cross-reference query, and the same root is revisited for every hit inside it. The
//! cache maps `(module, root declaration)` to the reconstructed tree and text, keyed by
//! [`crate::metadata::handle::ModuleId`] (the registry has already canonicalized paths)
//! and the root's token.
//!
//! # Concurrency
//!
//! Writers racing on the same key both perform the (wasted) decompilation, then the
//! first one to insert wins and the loser discards its result - after all writers
//! complete, exactly one value is ever observed for a key. This trades duplicate work
//! under contention for never holding a lock across a decompilation. Failed
//! decompilations are not cached, so a retry will attempt the work again.
//!
//! Once written, an entry is immutable for the process lifetime: module bytes are
//! read-only, so a cached unit can never go stale.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;

use crate::{
    decompiler::{Decompilation, Decompiler},
    metadata::{handle::ModuleId, module::Module, token::Token},
    Result,
};

/// Cache of decompiled root declarations, shared by all queries.
#[derive(Default)]
pub struct DecompilationCache {
    entries: SkipMap<(u32, u32), Arc<Decompilation>>,
}

impl DecompilationCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        DecompilationCache::default()
    }

    /// Returns the cached unit for `(module, root)`, decompiling on a miss.
    ///
    /// `root` must denote a root declaration (no enclosing declaring type); callers
    /// resolve nested types first. The returned `Arc` is shared with every other
    /// caller of the same key.
    ///
    /// # Errors
    /// Propagates the decompiler's [`crate::Error::Decompilation`]; the failure is
    /// not cached.
    pub fn get_or_decompile(
        &self,
        module: &Module,
        root: Token,
        decompiler: &dyn Decompiler,
    ) -> Result<Arc<Decompilation>> {
        let key = (module.id().0, root.value());

        if let Some(entry) = self.entries.get(&key) {
            return Ok(entry.value().clone());
        }

        // Decompile outside any lock; on a race the first insert wins and this
        // result is dropped.
        let unit = Arc::new(decompiler.decompile(module, root)?);
        let entry = self.entries.get_or_insert(key, unit);
        Ok(entry.value().clone())
    }

    /// Returns the cached unit for `(module, root)` without decompiling
    #[must_use]
    pub fn get(&self, module: ModuleId, root: Token) -> Option<Arc<Decompilation>> {
        self.entries
            .get(&(module.0, root.value()))
            .map(|e| e.value().clone())
    }

    /// Number of cached units
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been cached yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for DecompilationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecompilationCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
