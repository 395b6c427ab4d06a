//! Type-usage and implementation scanning.
//!
//! A type is "used by" a declaration when it appears anywhere the declaration could
//! name a type: base lists, custom attributes, member signatures, local-variable
//! signatures, or a type-bearing instruction operand in a body. Each reason is
//! checked in that order and the first match wins per member, so a member is never
//! reported twice no matter how many places mention the type.

use crate::{
    analysis::{AnalyzerContext, CancellationToken, Hit},
    disassembler::{IlCursor, OperandKind},
    metadata::{
        handle::EntityHandle,
        module::{EntityRef, Module},
        typesystem::{MethodBody, TypeEntryRc},
    },
    Error, Result,
};

/// Finds the scope declarations that mention a target type.
pub struct TypeUsageScanner<'a> {
    context: &'a AnalyzerContext,
}

impl<'a> TypeUsageScanner<'a> {
    /// Creates a scanner resolving through `context`
    #[must_use]
    pub fn new(context: &'a AnalyzerContext) -> Self {
        TypeUsageScanner { context }
    }

    /// Scans `scope` for declarations mentioning `target`.
    ///
    /// The target type's own declaration and members are never reported; a type
    /// trivially mentions itself everywhere. With `scan_bodies` false the scan
    /// stops at declared surfaces (base lists, attributes and member
    /// signatures) and never touches method bodies, which trades recall for
    /// speed on large scopes.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if `cancel` fires mid-scan.
    pub fn scan(
        &self,
        target: EntityHandle,
        scope: &[TypeEntryRc],
        scan_bodies: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();

        for candidate in scope {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if candidate.handle == target {
                continue;
            }
            let Some(module) = self.context.registry().module(candidate.handle.module) else {
                continue;
            };

            if candidate.base_types.iter().any(|b| b.contains(target))
                || candidate.attributes.iter().any(|a| a.mentions(target))
            {
                hits.push(Hit::Type(candidate.clone()));
            }

            for method in &candidate.methods {
                // Signature checks come first; the bytecode walk only runs
                // when the cheap surfaces found nothing.
                let used = method.signature.mentions(target)
                    || method.attributes.iter().any(|a| a.mentions(target))
                    || (scan_bodies
                        && method.body.as_ref().is_some_and(|body| {
                            body.locals.iter().any(|l| l.contains(target))
                                || body_mentions_type(self.context, &module, body, target)
                        }));
                if used {
                    hits.push(Hit::Method(method.clone()));
                }
            }

            for field in &candidate.fields {
                if field.field_type.contains(target)
                    || field.attributes.iter().any(|a| a.mentions(target))
                {
                    hits.push(Hit::Field(field.clone()));
                }
            }

            for property in &candidate.properties {
                if property.property_type.contains(target)
                    || property.params.iter().any(|p| p.contains(target))
                    || property.attributes.iter().any(|a| a.mentions(target))
                {
                    hits.push(Hit::Property(property.clone()));
                }
            }

            for event in &candidate.events {
                if event.event_type.contains(target)
                    || event.attributes.iter().any(|a| a.mentions(target))
                {
                    hits.push(Hit::Event(event.clone()));
                }
            }
        }

        Ok(hits)
    }
}

/// Finds the scope types that derive from or implement a target type, and the
/// methods that override a target method.
pub struct ImplementationScanner<'a> {
    context: &'a AnalyzerContext,
}

impl<'a> ImplementationScanner<'a> {
    /// Creates a scanner resolving through `context`
    #[must_use]
    pub fn new(context: &'a AnalyzerContext) -> Self {
        ImplementationScanner { context }
    }

    /// Scans `scope` for types whose direct base list mentions `target`.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if `cancel` fires mid-scan.
    pub fn scan_type(
        &self,
        target: EntityHandle,
        scope: &[TypeEntryRc],
        cancel: &CancellationToken,
    ) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        for candidate in scope {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if candidate.handle == target {
                continue;
            }
            if candidate.base_types.iter().any(|b| b.contains(target)) {
                hits.push(Hit::Type(candidate.clone()));
            }
        }
        Ok(hits)
    }

    /// Scans `scope` for methods whose override chain reaches `target`.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if `cancel` fires mid-scan.
    pub fn scan_method(
        &self,
        target: EntityHandle,
        scope: &[TypeEntryRc],
        cancel: &CancellationToken,
    ) -> Result<Vec<Hit>> {
        let base = self.context.base_most_override(target);
        let mut hits = Vec::new();
        for candidate in scope {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            for method in &candidate.methods {
                if method.handle != target
                    && method.overridden.is_some()
                    && self.context.base_most_override(method.handle) == base
                {
                    hits.push(Hit::Method(method.clone()));
                }
            }
        }
        Ok(hits)
    }
}

/// True if a type-bearing operand in `body` mentions `target`.
///
/// Member operands count through their declaring type, matching how a reference
/// to `Widget.M` textually names `Widget`. Decode errors end the walk.
fn body_mentions_type(
    context: &AnalyzerContext,
    module: &Module,
    body: &MethodBody,
    target: EntityHandle,
) -> bool {
    let mut cursor = IlCursor::new(&body.il);

    loop {
        let op = match cursor.next_opcode() {
            Ok(Some(op)) => op,
            Ok(None) | Err(_) => return false,
        };

        if op.operand() == OperandKind::Token {
            let Ok(token) = cursor.read_token() else {
                return false;
            };
            // ldstr and friends also carry 4-byte tokens; only type-bearing
            // token kinds go through resolution.
            if !token.is_type_kind() && !token.is_member_kind() && !token.is_signature_kind() {
                continue;
            }
            let mentioned = match module.resolve(token) {
                Some(EntityRef::Type(sig)) => sig.contains(target),
                Some(EntityRef::Signature(types)) => types.iter().any(|t| t.contains(target)),
                Some(EntityRef::Method(def)) => context
                    .registry()
                    .method_entry(def)
                    .is_some_and(|m| m.declaring_type == target),
                Some(EntityRef::Field(def)) => context
                    .registry()
                    .field_entry(def)
                    .is_some_and(|f| f.declaring_type == target),
                None => false,
            };
            if mentioned {
                return true;
            }
        } else if op.operand() != OperandKind::None && cursor.skip_operand(op).is_err() {
            return false;
        }
    }
}
