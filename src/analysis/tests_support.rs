//! In-memory module fixtures shared by the scanner tests.

use std::sync::Arc;

use crate::metadata::{
    handle::{EntityHandle, ModuleId},
    module::{EntityRef, ModuleData},
    registry::ModuleRegistry,
    token::Token,
    typesystem::{
        AttributeEntry, EventEntry, FieldEntry, MethodBody, MethodEntry, MethodSig, PropertyEntry,
        TypeEntry, TypeEntryRc, TypeSig,
    },
};

/// Builds a single-module registry with one `Holder` type carrying the
/// configured members, plus any extra standalone types.
pub(crate) struct ModuleBuilder {
    methods: Vec<Arc<MethodEntry>>,
    fields: Vec<Arc<FieldEntry>>,
    properties: Vec<Arc<PropertyEntry>>,
    events: Vec<Arc<EventEntry>>,
    base_types: Vec<TypeSig>,
    attributes: Vec<AttributeEntry>,
    extra_types: Vec<TypeEntry>,
    resolutions: Vec<(Token, EntityRef)>,
}

/// Token of the implicit `Holder` type every builder produces.
pub(crate) const HOLDER_TOKEN: u32 = 0x02000001;

impl ModuleBuilder {
    pub(crate) fn new() -> Self {
        ModuleBuilder {
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            base_types: Vec::new(),
            attributes: Vec::new(),
            extra_types: Vec::new(),
            resolutions: Vec::new(),
        }
    }

    pub(crate) fn method(
        mut self,
        handle: EntityHandle,
        name: &str,
        overridden: Option<EntityHandle>,
        params: Vec<TypeSig>,
    ) -> Self {
        self.methods.push(Arc::new(MethodEntry {
            handle,
            name: name.into(),
            declaring_type: holder_handle(handle.module),
            signature: MethodSig {
                params,
                ..MethodSig::default()
            },
            attributes: Vec::new(),
            body: None,
            overridden,
        }));
        self
    }

    pub(crate) fn method_with_body(
        mut self,
        handle: EntityHandle,
        name: &str,
        il: Vec<u8>,
        locals: Vec<TypeSig>,
    ) -> Self {
        self.methods.push(Arc::new(MethodEntry {
            handle,
            name: name.into(),
            declaring_type: holder_handle(handle.module),
            signature: MethodSig::default(),
            attributes: Vec::new(),
            body: Some(MethodBody {
                il: il.into(),
                locals,
            }),
            overridden: None,
        }));
        self
    }

    pub(crate) fn field(mut self, handle: EntityHandle, name: &str, field_type: TypeSig) -> Self {
        self.fields.push(Arc::new(FieldEntry {
            handle,
            name: name.into(),
            declaring_type: holder_handle(handle.module),
            field_type,
            attributes: Vec::new(),
        }));
        self
    }

    pub(crate) fn property(
        mut self,
        handle: EntityHandle,
        name: &str,
        getter: Option<EntityHandle>,
        setter: Option<EntityHandle>,
    ) -> Self {
        self.properties.push(Arc::new(PropertyEntry {
            handle,
            name: name.into(),
            declaring_type: holder_handle(handle.module),
            property_type: TypeSig::opaque(),
            params: Vec::new(),
            getter,
            setter,
            attributes: Vec::new(),
        }));
        self
    }

    pub(crate) fn event(
        mut self,
        handle: EntityHandle,
        name: &str,
        add: Option<EntityHandle>,
        remove: Option<EntityHandle>,
    ) -> Self {
        self.events.push(Arc::new(EventEntry {
            handle,
            name: name.into(),
            declaring_type: holder_handle(handle.module),
            event_type: TypeSig::opaque(),
            add,
            remove,
            raise: None,
            attributes: Vec::new(),
        }));
        self
    }

    pub(crate) fn base_type(mut self, base: TypeSig) -> Self {
        self.base_types.push(base);
        self
    }

    pub(crate) fn attribute(mut self, attribute: AttributeEntry) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub(crate) fn extra_type(mut self, entry: TypeEntry) -> Self {
        self.extra_types.push(entry);
        self
    }

    pub(crate) fn resolve_method(mut self, token: u32, def: EntityHandle) -> Self {
        self.resolutions
            .push((Token::new(token), EntityRef::Method(def)));
        self
    }

    pub(crate) fn resolve_field(mut self, token: u32, def: EntityHandle) -> Self {
        self.resolutions
            .push((Token::new(token), EntityRef::Field(def)));
        self
    }

    pub(crate) fn resolve_type(mut self, token: u32, sig: TypeSig) -> Self {
        self.resolutions
            .push((Token::new(token), EntityRef::Type(sig)));
        self
    }

    pub(crate) fn resolve_signature(mut self, token: u32, types: Vec<TypeSig>) -> Self {
        self.resolutions
            .push((Token::new(token), EntityRef::Signature(types)));
        self
    }

    pub(crate) fn build(self) -> (Arc<ModuleRegistry>, Vec<TypeEntryRc>) {
        let registry = Arc::new(ModuleRegistry::new());
        let module = registry.insert("/virtual/scan.dll", |id| {
            let holder = TypeEntry {
                handle: holder_handle(id),
                namespace: "Test".into(),
                name: "Holder".into(),
                declaring_type: None,
                constructed: false,
                base_types: self.base_types,
                attributes: self.attributes,
                methods: self.methods,
                fields: self.fields,
                properties: self.properties,
                events: self.events,
            };
            let mut types: Vec<TypeEntryRc> = vec![Arc::new(holder)];
            types.extend(self.extra_types.into_iter().map(Arc::new));
            ModuleData {
                assembly_name: "Test.Scan".into(),
                types,
                resolutions: self.resolutions,
            }
        });
        let scope = module.types();
        (registry, scope)
    }
}

fn holder_handle(module: ModuleId) -> EntityHandle {
    EntityHandle::new(module, Token::new(HOLDER_TOKEN))
}

/// Literal IL encoders for the instructions the scanners care about.
pub(crate) mod il {
    fn with_token(lead: &[u8], token: u32) -> Vec<u8> {
        let mut bytes = lead.to_vec();
        bytes.extend_from_slice(&token.to_le_bytes());
        bytes
    }

    pub(crate) fn call(token: u32) -> Vec<u8> {
        with_token(&[0x28], token)
    }

    pub(crate) fn callvirt(token: u32) -> Vec<u8> {
        with_token(&[0x6F], token)
    }

    pub(crate) fn newobj(token: u32) -> Vec<u8> {
        with_token(&[0x73], token)
    }

    pub(crate) fn ldtoken(token: u32) -> Vec<u8> {
        with_token(&[0xD0], token)
    }

    pub(crate) fn ldftn(token: u32) -> Vec<u8> {
        with_token(&[0xFE, 0x06], token)
    }

    pub(crate) fn ldfld(token: u32) -> Vec<u8> {
        with_token(&[0x7B], token)
    }

    pub(crate) fn ldflda(token: u32) -> Vec<u8> {
        with_token(&[0x7C], token)
    }

    pub(crate) fn stfld(token: u32) -> Vec<u8> {
        with_token(&[0x7D], token)
    }

    pub(crate) fn ldsfld(token: u32) -> Vec<u8> {
        with_token(&[0x7E], token)
    }

    pub(crate) fn stsfld(token: u32) -> Vec<u8> {
        with_token(&[0x80], token)
    }

    /// Concatenates instruction fragments into one body.
    pub(crate) fn seq(parts: &[Vec<u8>]) -> Vec<u8> {
        parts.iter().flatten().copied().collect()
    }
}
