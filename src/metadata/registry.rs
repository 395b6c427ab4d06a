//! Process-wide module ownership and lookup.
//!
//! The [`ModuleRegistry`] is the arena that owns every loaded [`Module`] for the
//! lifetime of the process. Decompiled trees, cached text and usage records all hold
//! back-references (via [`ModuleId`]) into the registry, so modules are never unloaded;
//! a changed binary on disk requires a new process (or at least a new registry).
//!
//! Loading is idempotent: modules are keyed by canonical, case-insensitively compared
//! file path, and opening the same path twice returns the same `Arc<Module>` instance.
//! Concurrent readers never block each other; the registry is append-only.

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use dashmap::{mapref::entry::Entry, DashMap};
use memmap2::Mmap;

use crate::{
    metadata::{
        handle::{EntityHandle, ModuleId},
        module::{Module, ModuleData, ModuleLoader},
        typesystem::{
            EventEntryRc, FieldEntryRc, MethodEntryRc, PropertyEntryRc, TypeEntryRc,
        },
    },
    Error, Result,
};

/// Owner of all loaded modules, shared across every query.
///
/// Constructed once at process start, read and written throughout, torn down at
/// process exit - deliberately an explicit shared object rather than ambient global
/// state.
///
/// # Thread Safety
///
/// All operations are safe under concurrency: lookups are lock-free reads of the
/// underlying maps, and concurrent `open` calls for the same path converge on one
/// module instance (losers discard their load).
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// Module storage by id
    modules: DashMap<ModuleId, Arc<Module>>,
    /// Canonical lowercased path -> module id
    by_path: DashMap<String, ModuleId>,
    /// Next id to hand out; ids are never reused
    next_id: AtomicU32,
}

impl ModuleRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    /// Opens the module at `path`, memory-mapping its bytes and handing them to
    /// `loader` for fixing up. Idempotent: a second open of the same (canonical,
    /// case-insensitive) path returns the already-loaded instance without invoking
    /// the loader again, except under a benign race where the duplicate load is
    /// discarded.
    ///
    /// # Errors
    /// [`Error::ModuleLoad`] if the file is missing or unreadable; any error the
    /// loader returns for malformed content.
    pub fn open(&self, path: &Path, loader: &dyn ModuleLoader) -> Result<Arc<Module>> {
        let canonical = std::fs::canonicalize(path).map_err(|source| Error::ModuleLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let key = path_key(&canonical);

        if let Some(id) = self.by_path.get(&key) {
            if let Some(module) = self.modules.get(&*id) {
                return Ok(module.clone());
            }
        }

        let file = File::open(&canonical).map_err(|source| Error::ModuleLoad {
            path: canonical.clone(),
            source,
        })?;
        // SAFETY: the mapping is read-only and the registry keeps no further file
        // handle; module bytes are treated as immutable for the process lifetime.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| Error::ModuleLoad {
            path: canonical.clone(),
            source,
        })?;

        let id = ModuleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let data = loader.load(id, &canonical, &mmap)?;
        let module = Arc::new(Module::from_data(id, canonical, data));

        Ok(self.publish(key, module))
    }

    /// Registers a module from already fixed-up data, bypassing file access.
    ///
    /// Used by hosts that hold module bytes themselves (and by tests). The
    /// builder receives the assigned [`ModuleId`] so entry handles can embed it.
    /// Idempotent by path like [`ModuleRegistry::open`].
    pub fn insert(
        &self,
        path: impl Into<PathBuf>,
        build: impl FnOnce(ModuleId) -> ModuleData,
    ) -> Arc<Module> {
        let path = path.into();
        let key = path_key(&path);

        if let Some(id) = self.by_path.get(&key) {
            if let Some(module) = self.modules.get(&*id) {
                return module.clone();
            }
        }

        let id = ModuleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let module = Arc::new(Module::from_data(id, path, build(id)));
        self.publish(key, module)
    }

    /// Publishes a freshly built module unless another writer won the path race,
    /// in which case the existing instance is returned and ours is dropped.
    fn publish(&self, key: String, module: Arc<Module>) -> Arc<Module> {
        match self.by_path.entry(key) {
            Entry::Occupied(existing) => self
                .modules
                .get(existing.get())
                .map(|m| m.clone())
                .unwrap_or(module),
            Entry::Vacant(slot) => {
                self.modules.insert(module.id(), module.clone());
                slot.insert(module.id());
                module
            }
        }
    }

    /// Snapshot of every registered module, in no particular order
    #[must_use]
    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.modules.iter().map(|m| m.value().clone()).collect()
    }

    /// Looks up a module by id
    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<Arc<Module>> {
        self.modules.get(&id).map(|m| m.clone())
    }

    /// Looks up a module by path (canonical or not, case-insensitive)
    #[must_use]
    pub fn module_by_path(&self, path: &Path) -> Option<Arc<Module>> {
        let key = std::fs::canonicalize(path)
            .map(|p| path_key(&p))
            .unwrap_or_else(|_| path_key(path));
        let id = *self.by_path.get(&key)?;
        self.module(id)
    }

    /// Number of loaded modules
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True if no module has been loaded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Resolves a type entry across modules
    #[must_use]
    pub fn type_entry(&self, handle: EntityHandle) -> Option<TypeEntryRc> {
        self.module(handle.module)?.type_entry(handle.token)
    }

    /// Resolves a method entry across modules
    #[must_use]
    pub fn method_entry(&self, handle: EntityHandle) -> Option<MethodEntryRc> {
        self.module(handle.module)?.method_entry(handle.token)
    }

    /// Resolves a field entry across modules
    #[must_use]
    pub fn field_entry(&self, handle: EntityHandle) -> Option<FieldEntryRc> {
        self.module(handle.module)?.field_entry(handle.token)
    }

    /// Resolves a property entry across modules
    #[must_use]
    pub fn property_entry(&self, handle: EntityHandle) -> Option<PropertyEntryRc> {
        self.module(handle.module)?.property_entry(handle.token)
    }

    /// Resolves an event entry across modules
    #[must_use]
    pub fn event_entry(&self, handle: EntityHandle) -> Option<EventEntryRc> {
        self.module(handle.module)?.event_entry(handle.token)
    }
}

/// Case-insensitive path key
fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}
