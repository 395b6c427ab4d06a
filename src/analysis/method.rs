//! Method-usage scanning over raw instruction streams.
//!
//! A method is "used" by every body that calls it, takes its address, or loads its
//! runtime handle. Virtual dispatch complicates the picture: the IL of a `callvirt`
//! site names the slot that is statically visible there, which for an override is
//! usually a base member. A query for the override therefore also matches `callvirt`
//! sites whose resolved definition is the base-most member of the override chain.

use std::sync::Arc;

use crate::{
    analysis::{AnalyzerContext, CancellationToken, Hit},
    disassembler::{IlCursor, OperandKind, CALLVIRT},
    metadata::{
        handle::EntityHandle,
        module::{EntityRef, Module},
        typesystem::{MethodBody, TypeEntryRc},
    },
    Error, Result,
};

/// Finds the scope members whose bodies reference a target method.
pub struct MethodUsageScanner<'a> {
    context: &'a AnalyzerContext,
}

impl<'a> MethodUsageScanner<'a> {
    /// Creates a scanner resolving through `context`
    #[must_use]
    pub fn new(context: &'a AnalyzerContext) -> Self {
        MethodUsageScanner { context }
    }

    /// Scans `scope` for members whose bodies use `target`.
    ///
    /// Accessor bodies report their owning property or event. A malformed body
    /// contributes whatever hits were decoded before the error and is otherwise
    /// skipped.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if `cancel` fires mid-scan.
    pub fn scan(
        &self,
        target: EntityHandle,
        scope: &[TypeEntryRc],
        cancel: &CancellationToken,
    ) -> Result<Vec<Hit>> {
        scan_bodies(self.context, scope, cancel, |module, body| {
            body_references_any(self.context, module, body, &[target])
        })
    }
}

/// Walks every member body in `scope`, reporting the members whose body
/// satisfies `matches`. Shared by the method, field, property and event
/// scanners.
pub(crate) fn scan_bodies(
    context: &AnalyzerContext,
    scope: &[TypeEntryRc],
    cancel: &CancellationToken,
    matches: impl Fn(&Module, &MethodBody) -> bool,
) -> Result<Vec<Hit>> {
    let mut hits = Vec::new();

    for candidate in scope {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(module) = context.registry().module(candidate.handle.module) else {
            continue;
        };

        // Accessor methods surface as their owning property or event.
        let mut owner_reported: Vec<EntityHandle> = Vec::new();
        for property in &candidate.properties {
            for accessor in property.accessors() {
                if accessor_matches(&module, candidate, accessor, &matches)
                    && !owner_reported.contains(&property.handle)
                {
                    owner_reported.push(property.handle);
                    hits.push(Hit::Property(property.clone()));
                }
            }
        }
        for event in &candidate.events {
            for accessor in event.accessors() {
                if accessor_matches(&module, candidate, accessor, &matches)
                    && !owner_reported.contains(&event.handle)
                {
                    owner_reported.push(event.handle);
                    hits.push(Hit::Event(event.clone()));
                }
            }
        }

        let accessor_handles: Vec<EntityHandle> = candidate
            .properties
            .iter()
            .flat_map(|p| p.accessors())
            .chain(candidate.events.iter().flat_map(|e| e.accessors()))
            .collect();

        for method in &candidate.methods {
            if accessor_handles.contains(&method.handle) {
                continue;
            }
            if let Some(body) = &method.body {
                if matches(&module, body) {
                    hits.push(Hit::Method(method.clone()));
                }
            }
        }
    }

    Ok(hits)
}

fn accessor_matches(
    module: &Arc<Module>,
    candidate: &TypeEntryRc,
    accessor: EntityHandle,
    matches: &impl Fn(&Module, &MethodBody) -> bool,
) -> bool {
    candidate
        .methods
        .iter()
        .find(|m| m.handle == accessor)
        .and_then(|m| m.body.as_ref())
        .is_some_and(|body| matches(module, body))
}

/// True if `body` references any of `targets` through a member-bearing
/// instruction.
///
/// `callvirt` sites additionally match when their resolved definition is the
/// base-most override of a target, so querying an override finds dispatch
/// through the base slot. Decode errors end the walk without matching.
pub(crate) fn body_references_any(
    context: &AnalyzerContext,
    module: &Module,
    body: &MethodBody,
    targets: &[EntityHandle],
) -> bool {
    let mut cursor = IlCursor::new(&body.il);

    loop {
        let op = match cursor.next_opcode() {
            Ok(Some(op)) => op,
            Ok(None) | Err(_) => return false,
        };

        if op.references_member() {
            let Ok(token) = cursor.read_token() else {
                return false;
            };
            // ldtoken can carry a type or signature token; only member-kind
            // tokens go through resolution.
            if !token.is_member_kind() {
                continue;
            }
            let Some(EntityRef::Method(def)) = module.resolve(token) else {
                continue;
            };
            for &target in targets {
                if def == target {
                    return true;
                }
                if op == CALLVIRT && def == context.base_most_override(target) {
                    return true;
                }
            }
        } else if op.operand() != OperandKind::None && cursor.skip_operand(op).is_err() {
            return false;
        }
    }
}
