//! Span locators over annotated syntax trees.
//!
//! A scanner hit names a member; these locators turn that member into concrete
//! text spans inside the decompiled source of its containing root. Every locator is a
//! plain tree walk and returns nothing rather than guessing when the tree carries
//! no matching annotation, so a renderer that drops annotations degrades to
//! file-level results instead of wrong spans. Spans come back in document order.

use crate::{
    decompiler::ast::{NodeId, NodeKind, SyntaxTree, TextLocation, TextSpan},
    metadata::handle::EntityHandle,
};

/// Finds the name span of the declaration of `entity`.
///
/// The span is the identifier of the matching type or member declaration, or the
/// whole declaration when the renderer emitted no identifier node.
#[must_use]
pub fn find_declaration(tree: &SyntaxTree, entity: EntityHandle) -> Option<TextSpan> {
    let declaration = declaration_node(tree, entity)?;
    Some(identifier_span(tree, declaration))
}

/// Finds every statement in the body of `member` that references `target`.
///
/// Each span covers the whole enclosing statement, matching what an editor
/// highlights for a usage, and the spans follow document order. A statement
/// that references `target` more than once is reported once. Returns an empty
/// vector when `member` has no body in this tree or its body never references
/// `target`.
#[must_use]
pub fn find_in_body(tree: &SyntaxTree, member: EntityHandle, target: EntityHandle) -> Vec<TextSpan> {
    let Some(declaration) = declaration_node(tree, member) else {
        return Vec::new();
    };

    // One pre-order pass carrying an "inside a body" flag, so a body nested in
    // another body (a lambda, a local function) is visited exactly once.
    let mut spans = Vec::new();
    let mut pending = vec![(declaration, false)];
    while let Some((id, inherited)) = pending.pop() {
        let node = tree.node(id);
        let in_body = inherited || node.kind == NodeKind::Body;
        if in_body && node.entity == Some(target) && node.kind != NodeKind::MemberDeclaration {
            spans.push(statement_span(tree, id));
        }
        for &child in tree.children(id).iter().rev() {
            pending.push((child, in_body));
        }
    }
    spans.dedup();
    spans
}

/// Finds the spans where the signature of `member` names `target` as a type.
///
/// Searches parameter, return and other type positions of the declaration,
/// skipping body subtrees so a statement-level mention is never mistaken for a
/// signature mention.
#[must_use]
pub fn find_in_signature(
    tree: &SyntaxTree,
    member: EntityHandle,
    target: EntityHandle,
) -> Vec<TextSpan> {
    let Some(declaration) = declaration_node(tree, member) else {
        return Vec::new();
    };
    find_type_mentions(tree, declaration, target, true)
}

/// Finds every span in the declaration of `member` that names `target` as a
/// type, body included.
///
/// Fallback for type-usage hits whose mention sits in a statement rather than
/// the signature (a cast, a `typeof`, an object creation).
#[must_use]
pub fn find_type_anywhere(
    tree: &SyntaxTree,
    member: EntityHandle,
    target: EntityHandle,
) -> Vec<TextSpan> {
    let Some(declaration) = declaration_node(tree, member) else {
        return Vec::new();
    };
    find_type_mentions(tree, declaration, target, false)
}

/// Finds the spans in the base-type list of the type declaration `declaring`
/// that name `target`.
#[must_use]
pub fn find_in_base_list(
    tree: &SyntaxTree,
    declaring: EntityHandle,
    target: EntityHandle,
) -> Vec<TextSpan> {
    let Some(declaration) = declaration_node(tree, declaring) else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    for id in tree.walk(declaration) {
        if tree.node(id).kind != NodeKind::BaseTypeList {
            continue;
        }
        for inner in tree.walk(id) {
            let node = tree.node(inner);
            if node.resolved_type == Some(target) {
                spans.push(node.span);
            }
        }
    }
    spans
}

/// Finds the local-variable slot and identifier span at a text position.
///
/// Used to seed a local-usage query from a caret position in decompiled source.
#[must_use]
pub fn find_local_at(tree: &SyntaxTree, position: TextLocation) -> Option<(u32, TextSpan)> {
    let root = tree.root()?;
    let mut found = None;
    for id in tree.walk(root) {
        let node = tree.node(id);
        if !node.span.contains(position) {
            continue;
        }
        if let Some(slot) = node.local_slot {
            // Keep descending; the innermost containing node wins.
            found = Some((slot, node.span));
        }
    }
    found
}

/// All spans inside the body of `member` that reference the local slot `slot`.
#[must_use]
pub fn find_local_usages(tree: &SyntaxTree, member: EntityHandle, slot: u32) -> Vec<TextSpan> {
    let Some(declaration) = declaration_node(tree, member) else {
        return Vec::new();
    };
    tree.walk(declaration)
        .filter(|&id| tree.node(id).local_slot == Some(slot))
        .map(|id| tree.node(id).span)
        .collect()
}

/// The declaration node annotated with `entity`, if the tree has one.
fn declaration_node(tree: &SyntaxTree, entity: EntityHandle) -> Option<NodeId> {
    let root = tree.root()?;
    tree.walk(root).find(|&id| {
        let node = tree.node(id);
        matches!(
            node.kind,
            NodeKind::TypeDeclaration | NodeKind::MemberDeclaration
        ) && node.entity == Some(entity)
    })
}

/// The identifier span of a declaration, or the declaration's own span.
fn identifier_span(tree: &SyntaxTree, declaration: NodeId) -> TextSpan {
    tree.children(declaration)
        .iter()
        .map(|&c| tree.node(c))
        .find(|n| n.kind == NodeKind::Identifier)
        .map_or(tree.node(declaration).span, |n| n.span)
}

/// Nearest enclosing statement span of a node, or the node's own span.
fn statement_span(tree: &SyntaxTree, mut id: NodeId) -> TextSpan {
    loop {
        if tree.node(id).kind == NodeKind::Statement {
            return tree.node(id).span;
        }
        match tree.parent(id) {
            Some(parent) => id = parent,
            None => return tree.node(id).span,
        }
    }
}

/// Depth-first collection of `resolved_type` mentions under `from`, optionally
/// refusing to descend into body subtrees. Yields spans in document order.
fn find_type_mentions(
    tree: &SyntaxTree,
    from: NodeId,
    target: EntityHandle,
    skip_bodies: bool,
) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut pending = vec![from];
    while let Some(id) = pending.pop() {
        let node = tree.node(id);
        if skip_bodies && node.kind == NodeKind::Body {
            continue;
        }
        if node.resolved_type == Some(target) {
            spans.push(node.span);
        }
        for &child in tree.children(id).iter().rev() {
            pending.push(child);
        }
    }
    spans
}
