//! A loaded binary module.
//!
//! A [`Module`] is the fixed-up view of one binary: its canonical file path, assembly
//! name, token-indexed entity tables and the IL resolution table. The resolution table
//! is the boundary to the external metadata reader: every token that can appear in an
//! instruction operand (method defs, member refs, method specs, type refs/specs,
//! standalone signatures) is pre-resolved to its *member definition* - generic
//! instantiations are already stripped, so the scanners only ever compare definitions.
//!
//! Modules are immutable once built and shared via `Arc`; they are owned by the
//! [`crate::metadata::registry::ModuleRegistry`] for the lifetime of the process, since
//! cached decompilations and usage records keep referring back to them.

use std::path::{Path, PathBuf};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    metadata::{
        handle::{EntityHandle, ModuleId},
        token::Token,
        typesystem::{
            EventEntryRc, FieldEntryRc, MethodEntryRc, PropertyEntryRc, TypeEntryRc, TypeSig,
        },
    },
    Result,
};

/// Resolution of a token that appeared in an instruction operand.
///
/// Member resolutions point at the member *definition* (instantiations stripped);
/// type resolutions carry the full structural reference, since a constructed type
/// mentions its definition and all argument definitions.
#[derive(Clone, Debug)]
pub enum EntityRef {
    /// The token denotes a method; the handle is the method definition
    Method(EntityHandle),
    /// The token denotes a field; the handle is the field definition
    Field(EntityHandle),
    /// The token denotes a type
    Type(TypeSig),
    /// The token denotes a standalone signature; the types it mentions
    Signature(Vec<TypeSig>),
}

/// Everything the external loader produces for one module.
///
/// The registry assigns the [`ModuleId`] before invoking the loader so that the
/// entries' handles can embed it.
#[derive(Debug, Default)]
pub struct ModuleData {
    /// Assembly name of the module (e.g. `Foo.Bar.Core`)
    pub assembly_name: String,
    /// Fixed-up candidate scope entries
    pub types: Vec<TypeEntryRc>,
    /// IL token resolutions, see [`EntityRef`]
    pub resolutions: Vec<(Token, EntityRef)>,
}

/// External collaborator that turns raw module bytes into [`ModuleData`].
///
/// Implementations own all raw metadata parsing (PE container, tables, heaps,
/// signatures); this crate never interprets the bytes itself.
pub trait ModuleLoader: Send + Sync {
    /// Builds the fixed-up data for the module at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] (or any structural error) if the bytes
    /// cannot be interpreted as a module.
    fn load(&self, id: ModuleId, path: &Path, bytes: &[u8]) -> Result<ModuleData>;
}

/// One loaded binary, immutable after construction.
#[derive(Debug)]
pub struct Module {
    id: ModuleId,
    path: PathBuf,
    assembly_name: String,
    /// Primary type storage, token-ordered
    types: SkipMap<Token, TypeEntryRc>,
    /// Member tables, token-ordered
    methods: SkipMap<Token, MethodEntryRc>,
    fields: SkipMap<Token, FieldEntryRc>,
    properties: SkipMap<Token, PropertyEntryRc>,
    events: SkipMap<Token, EventEntryRc>,
    /// IL token resolution table
    resolutions: DashMap<Token, EntityRef>,
}

impl Module {
    /// Builds a module from loader output, indexing all entries by token.
    pub(crate) fn from_data(id: ModuleId, path: PathBuf, data: ModuleData) -> Self {
        let module = Module {
            id,
            path,
            assembly_name: data.assembly_name,
            types: SkipMap::new(),
            methods: SkipMap::new(),
            fields: SkipMap::new(),
            properties: SkipMap::new(),
            events: SkipMap::new(),
            resolutions: DashMap::new(),
        };

        for ty in data.types {
            for method in &ty.methods {
                module.methods.insert(method.handle.token, method.clone());
            }
            for field in &ty.fields {
                module.fields.insert(field.handle.token, field.clone());
            }
            for property in &ty.properties {
                module
                    .properties
                    .insert(property.handle.token, property.clone());
            }
            for event in &ty.events {
                module.events.insert(event.handle.token, event.clone());
            }
            module.types.insert(ty.handle.token, ty);
        }

        for (token, entity) in data.resolutions {
            module.resolutions.insert(token, entity);
        }

        module
    }

    /// The registry-assigned id of this module
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Canonical file path of the module
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Assembly name of the module
    #[must_use]
    pub fn assembly_name(&self) -> &str {
        &self.assembly_name
    }

    /// All type entries of this module, in token order
    #[must_use]
    pub fn types(&self) -> Vec<TypeEntryRc> {
        self.types.iter().map(|e| e.value().clone()).collect()
    }

    /// Looks up a type entry by token
    #[must_use]
    pub fn type_entry(&self, token: Token) -> Option<TypeEntryRc> {
        self.types.get(&token).map(|e| e.value().clone())
    }

    /// Looks up a method entry by token
    #[must_use]
    pub fn method_entry(&self, token: Token) -> Option<MethodEntryRc> {
        self.methods.get(&token).map(|e| e.value().clone())
    }

    /// Looks up a field entry by token
    #[must_use]
    pub fn field_entry(&self, token: Token) -> Option<FieldEntryRc> {
        self.fields.get(&token).map(|e| e.value().clone())
    }

    /// Looks up a property entry by token
    #[must_use]
    pub fn property_entry(&self, token: Token) -> Option<PropertyEntryRc> {
        self.properties.get(&token).map(|e| e.value().clone())
    }

    /// Looks up an event entry by token
    #[must_use]
    pub fn event_entry(&self, token: Token) -> Option<EventEntryRc> {
        self.events.get(&token).map(|e| e.value().clone())
    }

    /// Resolves an IL operand token to the entity it denotes.
    ///
    /// Returns `None` for tokens the loader could not resolve (forwarded or missing
    /// references); scanners treat that as "no match".
    #[must_use]
    pub fn resolve(&self, token: Token) -> Option<EntityRef> {
        self.resolutions.get(&token).map(|e| e.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::TypeEntry;
    use std::sync::Arc;

    fn empty_type(id: ModuleId, token: u32, name: &str) -> TypeEntryRc {
        Arc::new(TypeEntry {
            handle: EntityHandle::new(id, Token::new(token)),
            namespace: "Test".into(),
            name: name.into(),
            declaring_type: None,
            constructed: false,
            base_types: Vec::new(),
            attributes: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
        })
    }

    #[test]
    fn from_data_indexes_types() {
        let id = ModuleId(0);
        let data = ModuleData {
            assembly_name: "Test.Assembly".into(),
            types: vec![
                empty_type(id, 0x02000002, "B"),
                empty_type(id, 0x02000001, "A"),
            ],
            resolutions: Vec::new(),
        };
        let module = Module::from_data(id, PathBuf::from("/tmp/test.dll"), data);

        assert_eq!(module.assembly_name(), "Test.Assembly");
        assert!(module.type_entry(Token::new(0x02000001)).is_some());
        assert!(module.type_entry(Token::new(0x02000003)).is_none());

        // Token-ordered iteration
        let names: Vec<_> = module.types().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn unresolved_token_yields_none() {
        let module = Module::from_data(
            ModuleId(0),
            PathBuf::from("/tmp/test.dll"),
            ModuleData::default(),
        );
        assert!(module.resolve(Token::new(0x0A000001)).is_none());
    }
}
