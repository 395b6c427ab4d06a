//! Shared workspace fixture for the query integration tests.
//!
//! Builds an in-memory registry with two modules and a fixture decompiler that
//! renders deterministic text and trees, so every pipeline stage runs for real
//! without touching a binary on disk.
//!
//! Module `Acme.Core` contains:
//! - `Widget`: virtual `Render`, field `_count`, property `Count`, event `Changed`
//! - `Consumer`: one method per usage pattern (call, field read/write, property
//!   get, event subscribe), with bodies of real encoded IL
//! - `Fancy`: derives from `Widget`
//! - a constructed generic type whose method also calls `Render`, to exercise
//!   the no-addressable-root path
//!
//! Module `Other` reuses `Widget`'s raw token values for its own members, which
//! is what makes the cross-module identity tests meaningful.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use cilxref::prelude::*;

pub struct Fixture {
    pub registry: Arc<ModuleRegistry>,
    pub decompiler: Arc<FixtureDecompiler>,
    pub finder: UsagesFinder,
    pub scope: RegistryScope,

    pub widget: EntityHandle,
    pub consumer: EntityHandle,
    pub render: EntityHandle,
    pub count_field: EntityHandle,
    pub count_property: EntityHandle,
    pub changed_event: EntityHandle,
    pub other_render: EntityHandle,
}

const WIDGET: u32 = 0x02000001;
const CONSUMER: u32 = 0x02000002;
const FANCY: u32 = 0x02000003;
const CLOSED_GENERIC: u32 = 0x02000004;

const RENDER: u32 = 0x06000001;
const GETTER: u32 = 0x06000002;
const SETTER: u32 = 0x06000003;
const ADD_CHANGED: u32 = 0x06000004;
const USE_RENDER: u32 = 0x06000010;
const READ_COUNT: u32 = 0x06000011;
const WRITE_COUNT: u32 = 0x06000012;
const USE_PROPERTY: u32 = 0x06000013;
const SUBSCRIBE: u32 = 0x06000014;
const USES_RENDER_GENERIC: u32 = 0x06000020;

const COUNT_FIELD: u32 = 0x04000001;
const COUNT_PROPERTY: u32 = 0x17000001;
const CHANGED_EVENT: u32 = 0x14000001;

const REF_RENDER: u32 = 0x0A000001;
const REF_COUNT: u32 = 0x0A000002;
const REF_GETTER: u32 = 0x0A000003;
const REF_ADD: u32 = 0x0A000004;

pub fn fixture() -> Fixture {
    let registry = Arc::new(ModuleRegistry::new());

    let acme = registry.insert("/virtual/Acme.Core.dll", |id| acme_module(id));
    let other = registry.insert("/virtual/Other.dll", |id| other_module(id));

    let decompiler = Arc::new(FixtureDecompiler {
        acme: acme.id(),
        other: other.id(),
        calls: AtomicUsize::new(0),
    });
    let finder = UsagesFinder::new(registry.clone(), decompiler.clone(), "Acme");
    let scope = RegistryScope::new(registry.clone());

    Fixture {
        widget: EntityHandle::new(acme.id(), Token::new(WIDGET)),
        consumer: EntityHandle::new(acme.id(), Token::new(CONSUMER)),
        render: EntityHandle::new(acme.id(), Token::new(RENDER)),
        count_field: EntityHandle::new(acme.id(), Token::new(COUNT_FIELD)),
        count_property: EntityHandle::new(acme.id(), Token::new(COUNT_PROPERTY)),
        changed_event: EntityHandle::new(acme.id(), Token::new(CHANGED_EVENT)),
        other_render: EntityHandle::new(other.id(), Token::new(RENDER)),
        registry,
        decompiler,
        finder,
        scope,
    }
}

fn handle(id: ModuleId, token: u32) -> EntityHandle {
    EntityHandle::new(id, Token::new(token))
}

fn method(
    id: ModuleId,
    token: u32,
    name: &str,
    declaring: u32,
    params: Vec<TypeSig>,
    il: Option<Vec<u8>>,
) -> Arc<MethodEntry> {
    Arc::new(MethodEntry {
        handle: handle(id, token),
        name: name.into(),
        declaring_type: handle(id, declaring),
        signature: MethodSig {
            params,
            ..MethodSig::default()
        },
        attributes: Vec::new(),
        body: il.map(|bytes| MethodBody {
            il: bytes.into(),
            locals: Vec::new(),
        }),
        overridden: None,
    })
}

fn bare_type(id: ModuleId, token: u32, namespace: &str, name: &str) -> TypeEntry {
    TypeEntry {
        handle: handle(id, token),
        namespace: namespace.into(),
        name: name.into(),
        declaring_type: None,
        constructed: false,
        base_types: Vec::new(),
        attributes: Vec::new(),
        methods: Vec::new(),
        fields: Vec::new(),
        properties: Vec::new(),
        events: Vec::new(),
    }
}

fn acme_module(id: ModuleId) -> ModuleData {
    let mut widget = bare_type(id, WIDGET, "Acme.Core", "Widget");
    widget.methods = vec![
        method(id, RENDER, "Render", WIDGET, Vec::new(), None),
        method(id, GETTER, "get_Count", WIDGET, Vec::new(), None),
        method(id, SETTER, "set_Count", WIDGET, Vec::new(), None),
        method(id, ADD_CHANGED, "add_Changed", WIDGET, Vec::new(), None),
    ];
    widget.fields = vec![Arc::new(FieldEntry {
        handle: handle(id, COUNT_FIELD),
        name: "_count".into(),
        declaring_type: handle(id, WIDGET),
        field_type: TypeSig::opaque(),
        attributes: Vec::new(),
    })];
    widget.properties = vec![Arc::new(PropertyEntry {
        handle: handle(id, COUNT_PROPERTY),
        name: "Count".into(),
        declaring_type: handle(id, WIDGET),
        property_type: TypeSig::opaque(),
        params: Vec::new(),
        getter: Some(handle(id, GETTER)),
        setter: Some(handle(id, SETTER)),
        attributes: Vec::new(),
    })];
    widget.events = vec![Arc::new(EventEntry {
        handle: handle(id, CHANGED_EVENT),
        name: "Changed".into(),
        declaring_type: handle(id, WIDGET),
        event_type: TypeSig::opaque(),
        add: Some(handle(id, ADD_CHANGED)),
        remove: None,
        raise: None,
        attributes: Vec::new(),
    })];

    let widget_sig = TypeSig::definition(handle(id, WIDGET));

    let mut consumer = bare_type(id, CONSUMER, "Acme.Core", "Consumer");
    consumer.methods = vec![
        method(
            id,
            USE_RENDER,
            "UseRender",
            CONSUMER,
            vec![widget_sig.clone()],
            Some(il::callvirt(REF_RENDER)),
        ),
        method(
            id,
            READ_COUNT,
            "ReadCount",
            CONSUMER,
            Vec::new(),
            Some(il::ldfld(REF_COUNT)),
        ),
        method(
            id,
            WRITE_COUNT,
            "WriteCount",
            CONSUMER,
            Vec::new(),
            Some(il::stfld(REF_COUNT)),
        ),
        method(
            id,
            USE_PROPERTY,
            "UseProperty",
            CONSUMER,
            Vec::new(),
            Some(il::callvirt(REF_GETTER)),
        ),
        method(
            id,
            SUBSCRIBE,
            "Subscribe",
            CONSUMER,
            Vec::new(),
            Some(il::call(REF_ADD)),
        ),
    ];

    let mut fancy = bare_type(id, FANCY, "Acme.Core", "Fancy");
    fancy.base_types = vec![widget_sig];

    let mut closed = bare_type(id, CLOSED_GENERIC, "Acme.Core", "Holder`1");
    closed.constructed = true;
    closed.methods = vec![method(
        id,
        USES_RENDER_GENERIC,
        "UsesRender",
        CLOSED_GENERIC,
        Vec::new(),
        Some(il::callvirt(REF_RENDER)),
    )];

    ModuleData {
        assembly_name: "Acme.Core".into(),
        types: vec![
            Arc::new(widget),
            Arc::new(consumer),
            Arc::new(fancy),
            Arc::new(closed),
        ],
        resolutions: vec![
            (Token::new(REF_RENDER), EntityRef::Method(handle(id, RENDER))),
            (
                Token::new(REF_COUNT),
                EntityRef::Field(handle(id, COUNT_FIELD)),
            ),
            (Token::new(REF_GETTER), EntityRef::Method(handle(id, GETTER))),
            (Token::new(REF_ADD), EntityRef::Method(handle(id, ADD_CHANGED))),
        ],
    }
}

/// A second module whose members reuse the raw token values of `Acme.Core`.
fn other_module(id: ModuleId) -> ModuleData {
    let mut other = bare_type(id, WIDGET, "Other", "Gadget");
    other.methods = vec![
        method(id, RENDER, "Render", WIDGET, Vec::new(), None),
        method(
            id,
            GETTER,
            "CallsOwnRender",
            WIDGET,
            Vec::new(),
            Some(il::call(REF_RENDER)),
        ),
    ];

    ModuleData {
        assembly_name: "Other".into(),
        types: vec![Arc::new(other)],
        resolutions: vec![(
            Token::new(REF_RENDER),
            EntityRef::Method(handle(id, RENDER)),
        )],
    }
}

/// Renders the fixed documents for each fixture root and counts invocations.
pub struct FixtureDecompiler {
    acme: ModuleId,
    other: ModuleId,
    calls: AtomicUsize,
}

impl FixtureDecompiler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decompiler for FixtureDecompiler {
    fn decompile(&self, module: &Module, root: Token) -> cilxref::Result<Decompilation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = module.id();
        match (id == self.acme, id == self.other, root.value()) {
            (true, _, WIDGET) => Ok(widget_unit(id)),
            (true, _, CONSUMER) => Ok(consumer_unit(id)),
            (true, _, FANCY) => Ok(fancy_unit(id)),
            (_, true, WIDGET) => Ok(gadget_unit(id)),
            _ => Err(Error::Decompilation {
                module: id,
                token: root,
                message: "unknown fixture root".into(),
            }),
        }
    }
}

fn span(sl: u32, sc: u32, el: u32, ec: u32) -> TextSpan {
    TextSpan::new(TextLocation::new(sl, sc), TextLocation::new(el, ec))
}

fn widget_unit(id: ModuleId) -> Decompilation {
    let text = "\
class Widget
{
    public virtual void Render()
    {
    }
}
";
    let mut tree = SyntaxTree::new();
    let class = tree.push(
        None,
        AstNode::new(NodeKind::TypeDeclaration, span(1, 1, 6, 2))
            .with_entity(handle(id, WIDGET)),
    );
    tree.push(
        Some(class),
        AstNode::new(NodeKind::Identifier, span(1, 7, 1, 13)).with_name("Widget"),
    );
    let render = tree.push(
        Some(class),
        AstNode::new(NodeKind::MemberDeclaration, span(3, 5, 5, 6))
            .with_entity(handle(id, RENDER)),
    );
    tree.push(
        Some(render),
        AstNode::new(NodeKind::Identifier, span(3, 25, 3, 31)).with_name("Render"),
    );
    Decompilation {
        tree,
        text: text.into(),
    }
}

fn consumer_unit(id: ModuleId) -> Decompilation {
    let text = "\
class Consumer
{
    void UseRender(Widget w)
    {
        w.Render();
    }
    int ReadCount()
    {
        return _count;
    }
    void WriteCount()
    {
        _count = 1;
    }
    int UseProperty()
    {
        return widget.Count;
    }
    void Subscribe()
    {
        widget.Changed += OnChanged;
    }
}
";
    let mut tree = SyntaxTree::new();
    let class = tree.push(
        None,
        AstNode::new(NodeKind::TypeDeclaration, span(1, 1, 23, 2))
            .with_entity(handle(id, CONSUMER)),
    );
    tree.push(
        Some(class),
        AstNode::new(NodeKind::Identifier, span(1, 7, 1, 15)).with_name("Consumer"),
    );

    // void UseRender(Widget w) { w.Render(); }
    let use_render = tree.push(
        Some(class),
        AstNode::new(NodeKind::MemberDeclaration, span(3, 5, 6, 6))
            .with_entity(handle(id, USE_RENDER)),
    );
    tree.push(
        Some(use_render),
        AstNode::new(NodeKind::Identifier, span(3, 10, 3, 19)).with_name("UseRender"),
    );
    tree.push(
        Some(use_render),
        AstNode::new(NodeKind::ParameterType, span(3, 20, 3, 26))
            .with_resolved_type(handle(id, WIDGET)),
    );
    let body = tree.push(Some(use_render), AstNode::new(NodeKind::Body, span(4, 5, 6, 6)));
    let stmt = tree.push(Some(body), AstNode::new(NodeKind::Statement, span(5, 9, 5, 20)));
    tree.push(
        Some(stmt),
        AstNode::new(NodeKind::Expression, span(5, 9, 5, 19)).with_entity(handle(id, RENDER)),
    );

    // int ReadCount() { return _count; }
    let read_count = tree.push(
        Some(class),
        AstNode::new(NodeKind::MemberDeclaration, span(7, 5, 10, 6))
            .with_entity(handle(id, READ_COUNT)),
    );
    tree.push(
        Some(read_count),
        AstNode::new(NodeKind::Identifier, span(7, 9, 7, 18)).with_name("ReadCount"),
    );
    let body = tree.push(Some(read_count), AstNode::new(NodeKind::Body, span(8, 5, 10, 6)));
    let stmt = tree.push(Some(body), AstNode::new(NodeKind::Statement, span(9, 9, 9, 23)));
    tree.push(
        Some(stmt),
        AstNode::new(NodeKind::Expression, span(9, 16, 9, 22))
            .with_entity(handle(id, COUNT_FIELD)),
    );

    // void WriteCount() { _count = 1; }
    let write_count = tree.push(
        Some(class),
        AstNode::new(NodeKind::MemberDeclaration, span(11, 5, 14, 6))
            .with_entity(handle(id, WRITE_COUNT)),
    );
    let body = tree.push(Some(write_count), AstNode::new(NodeKind::Body, span(12, 5, 14, 6)));
    let stmt = tree.push(Some(body), AstNode::new(NodeKind::Statement, span(13, 9, 13, 20)));
    tree.push(
        Some(stmt),
        AstNode::new(NodeKind::Expression, span(13, 9, 13, 15))
            .with_entity(handle(id, COUNT_FIELD)),
    );

    // int UseProperty() { return widget.Count; }
    let use_property = tree.push(
        Some(class),
        AstNode::new(NodeKind::MemberDeclaration, span(15, 5, 18, 6))
            .with_entity(handle(id, USE_PROPERTY)),
    );
    let body = tree.push(Some(use_property), AstNode::new(NodeKind::Body, span(16, 5, 18, 6)));
    let stmt = tree.push(Some(body), AstNode::new(NodeKind::Statement, span(17, 9, 17, 29)));
    tree.push(
        Some(stmt),
        AstNode::new(NodeKind::Expression, span(17, 16, 17, 28)).with_entity(handle(id, GETTER)),
    );

    // void Subscribe() { widget.Changed += OnChanged; }
    let subscribe = tree.push(
        Some(class),
        AstNode::new(NodeKind::MemberDeclaration, span(19, 5, 22, 6))
            .with_entity(handle(id, SUBSCRIBE)),
    );
    let body = tree.push(Some(subscribe), AstNode::new(NodeKind::Body, span(20, 5, 22, 6)));
    let stmt = tree.push(Some(body), AstNode::new(NodeKind::Statement, span(21, 9, 21, 37)));
    tree.push(
        Some(stmt),
        AstNode::new(NodeKind::Expression, span(21, 9, 21, 23))
            .with_entity(handle(id, ADD_CHANGED)),
    );

    Decompilation {
        tree,
        text: text.into(),
    }
}

fn fancy_unit(id: ModuleId) -> Decompilation {
    let text = "\
class Fancy : Widget
{
}
";
    let mut tree = SyntaxTree::new();
    let class = tree.push(
        None,
        AstNode::new(NodeKind::TypeDeclaration, span(1, 1, 3, 2)).with_entity(handle(id, FANCY)),
    );
    tree.push(
        Some(class),
        AstNode::new(NodeKind::Identifier, span(1, 7, 1, 12)).with_name("Fancy"),
    );
    let bases = tree.push(Some(class), AstNode::new(NodeKind::BaseTypeList, span(1, 15, 1, 21)));
    tree.push(
        Some(bases),
        AstNode::new(NodeKind::TypeReference, span(1, 15, 1, 21))
            .with_resolved_type(handle(id, WIDGET)),
    );
    Decompilation {
        tree,
        text: text.into(),
    }
}

fn gadget_unit(id: ModuleId) -> Decompilation {
    let text = "\
class Gadget
{
}
";
    let mut tree = SyntaxTree::new();
    let class = tree.push(
        None,
        AstNode::new(NodeKind::TypeDeclaration, span(1, 1, 3, 2)).with_entity(handle(id, WIDGET)),
    );
    tree.push(
        Some(class),
        AstNode::new(NodeKind::Identifier, span(1, 7, 1, 13)).with_name("Gadget"),
    );
    Decompilation {
        tree,
        text: text.into(),
    }
}

/// Literal IL encoders, mirroring the layouts the decoder expects.
pub mod il {
    fn with_token(lead: &[u8], token: u32) -> Vec<u8> {
        let mut bytes = lead.to_vec();
        bytes.extend_from_slice(&token.to_le_bytes());
        bytes
    }

    pub fn call(token: u32) -> Vec<u8> {
        with_token(&[0x28], token)
    }

    pub fn callvirt(token: u32) -> Vec<u8> {
        with_token(&[0x6F], token)
    }

    pub fn ldfld(token: u32) -> Vec<u8> {
        with_token(&[0x7B], token)
    }

    pub fn stfld(token: u32) -> Vec<u8> {
        with_token(&[0x7D], token)
    }
}
