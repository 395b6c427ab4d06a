//! Field-usage scanning.
//!
//! Field usages are the load, store and address-of instructions whose operand
//! resolves to the target field definition. The query filters by direction through
//! [`FieldAccess`], except that address-of sites always match: once the address
//! escapes, the direction is unknowable from the site alone.

use crate::{
    analysis::{method::scan_bodies, AnalyzerContext, CancellationToken, FieldAccess, Hit},
    disassembler::{IlCursor, OperandKind},
    metadata::{
        handle::EntityHandle,
        module::{EntityRef, Module},
        typesystem::{MethodBody, TypeEntryRc},
    },
    Result,
};

/// Finds the scope members whose bodies access a target field.
pub struct FieldUsageScanner<'a> {
    context: &'a AnalyzerContext,
}

impl<'a> FieldUsageScanner<'a> {
    /// Creates a scanner resolving through `context`
    #[must_use]
    pub fn new(context: &'a AnalyzerContext) -> Self {
        FieldUsageScanner { context }
    }

    /// Scans `scope` for members whose bodies access `target` in one of the
    /// `access` directions.
    ///
    /// # Errors
    /// Returns [`crate::Error::Cancelled`] if `cancel` fires mid-scan.
    pub fn scan(
        &self,
        target: EntityHandle,
        access: FieldAccess,
        scope: &[TypeEntryRc],
        cancel: &CancellationToken,
    ) -> Result<Vec<Hit>> {
        scan_bodies(self.context, scope, cancel, |module, body| {
            body_accesses_field(module, body, target, access)
        })
    }
}

/// True if `body` touches `target` with an instruction permitted by `access`.
fn body_accesses_field(
    module: &Module,
    body: &MethodBody,
    target: EntityHandle,
    access: FieldAccess,
) -> bool {
    let mut cursor = IlCursor::new(&body.il);

    loop {
        let op = match cursor.next_opcode() {
            Ok(Some(op)) => op,
            Ok(None) | Err(_) => return false,
        };

        let wanted = op.is_field_address()
            || (op.is_field_read() && access.contains(FieldAccess::READ))
            || (op.is_field_write() && access.contains(FieldAccess::WRITE));
        let field_op = op.is_field_read() || op.is_field_write() || op.is_field_address();

        if field_op {
            let Ok(token) = cursor.read_token() else {
                return false;
            };
            if !wanted {
                continue;
            }
            if let Some(EntityRef::Field(def)) = module.resolve(token) {
                if def == target {
                    return true;
                }
            }
        } else if op.operand() != OperandKind::None && cursor.skip_operand(op).is_err() {
            return false;
        }
    }
}
