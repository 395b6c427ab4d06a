//! Annotated syntax trees with preserved text locations.
//!
//! The external decompiler reconstructs source text from a root declaration and hands
//! back a tree whose nodes carry 1-based (line, column) spans into that text, plus
//! optional annotations resolving a node back to a binary entity. The tree is a flat
//! arena: nodes are stored in one `Vec`, addressed by [`NodeId`], with explicit
//! parent/child links. All walks over it are iterative - decompiled source can nest
//! deeply, and locators must not risk stack exhaustion.

use crate::metadata::handle::EntityHandle;

/// A 1-based position in rendered source text.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct TextLocation {
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    pub column: u32,
}

impl TextLocation {
    /// Creates a location from 1-based line and column
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        TextLocation { line, column }
    }
}

/// A half-open span `[start, end)` in rendered source text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TextSpan {
    /// Start of the span, inclusive
    pub start: TextLocation,
    /// End of the span, exclusive
    pub end: TextLocation,
}

impl TextSpan {
    /// Creates a span from inclusive start to exclusive end
    #[must_use]
    pub fn new(start: TextLocation, end: TextLocation) -> Self {
        TextSpan { start, end }
    }

    /// Convenience constructor from raw line/column quadruples
    #[must_use]
    pub fn from_positions(
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        TextSpan::new(
            TextLocation::new(start_line, start_column),
            TextLocation::new(end_line, end_column),
        )
    }

    /// True if `position` lies inside the span
    #[must_use]
    pub fn contains(&self, position: TextLocation) -> bool {
        self.start <= position && position < self.end
    }
}

/// The role a tree node plays, as far as the locators care.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    /// A type declaration (class, struct, interface, enum, delegate)
    TypeDeclaration,
    /// A member declaration (method, constructor, field, property, event, accessor)
    MemberDeclaration,
    /// A named identifier
    Identifier,
    /// The body of a method, constructor or accessor
    Body,
    /// A statement inside a body
    Statement,
    /// An expression
    Expression,
    /// The base-type list of a type declaration
    BaseTypeList,
    /// A parameter type position in a member signature
    ParameterType,
    /// The return type position of a member signature
    ReturnType,
    /// Any other reference to a type
    TypeReference,
}

/// Index of a node within its [`SyntaxTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub u32);

/// One node of an annotated syntax tree.
#[derive(Clone, Debug)]
pub struct AstNode {
    /// Role of the node
    pub kind: NodeKind,
    /// Text span of the node in the rendered source
    pub span: TextSpan,
    /// The binary entity this node declares or references, if resolved
    pub entity: Option<EntityHandle>,
    /// The type this node resolves to, for type-bearing positions
    pub resolved_type: Option<EntityHandle>,
    /// Identifier text, for [`NodeKind::Identifier`] nodes
    pub name: Option<String>,
    /// Local-variable slot, for references to locals inside a body
    pub local_slot: Option<u32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl AstNode {
    /// Creates an unannotated node
    #[must_use]
    pub fn new(kind: NodeKind, span: TextSpan) -> Self {
        AstNode {
            kind,
            span,
            entity: None,
            resolved_type: None,
            name: None,
            local_slot: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Attaches an entity annotation
    #[must_use]
    pub fn with_entity(mut self, entity: EntityHandle) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Attaches a resolved-type annotation
    #[must_use]
    pub fn with_resolved_type(mut self, ty: EntityHandle) -> Self {
        self.resolved_type = Some(ty);
        self
    }

    /// Attaches identifier text
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a local-variable slot annotation
    #[must_use]
    pub fn with_local_slot(mut self, slot: u32) -> Self {
        self.local_slot = Some(slot);
        self
    }
}

/// A flat-arena syntax tree.
#[derive(Clone, Debug, Default)]
pub struct SyntaxTree {
    nodes: Vec<AstNode>,
}

impl SyntaxTree {
    /// Creates an empty tree
    #[must_use]
    pub fn new() -> Self {
        SyntaxTree::default()
    }

    /// Appends a node under `parent` (or as a root when `None`) and returns its id.
    ///
    /// Nodes must be pushed parent-first; the id of a node never changes.
    pub fn push(&mut self, parent: Option<NodeId>, node: AstNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        let mut node = node;
        node.parent = parent;
        self.nodes.push(node);
        if let Some(parent) = parent {
            self.nodes[parent.0 as usize].children.push(id);
        }
        id
    }

    /// The node behind an id
    #[must_use]
    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0 as usize]
    }

    /// Parent of a node, `None` for roots
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of a node, in document order
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// The first root node, if the tree is non-empty
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    /// Number of nodes in the tree
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterative pre-order walk of the subtree rooted at `from`, including `from`
    /// itself. Pre-order equals document order because children are stored in
    /// document order.
    pub fn walk(&self, from: NodeId) -> Walk<'_> {
        Walk {
            tree: self,
            pending: vec![from],
        }
    }
}

/// Iterator state of [`SyntaxTree::walk`].
pub struct Walk<'a> {
    tree: &'a SyntaxTree,
    pending: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.pending.pop()?;
        // Push children reversed so the leftmost child is visited first.
        self.pending
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
