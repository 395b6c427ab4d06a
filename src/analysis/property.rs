//! Property and event usage scanning.
//!
//! Compiled code never references a property or event directly; every use goes
//! through an accessor method. A usage of the property is therefore any body that
//! references one of its accessors, with the same virtual-dispatch rule as plain
//! method usage.

use crate::{
    analysis::{
        method::{body_references_any, scan_bodies},
        AnalyzerContext, CancellationToken, Hit,
    },
    metadata::{handle::EntityHandle, typesystem::TypeEntryRc},
    Error, Result,
};

/// Finds the scope members whose bodies use a target property or event.
pub struct AccessorUsageScanner<'a> {
    context: &'a AnalyzerContext,
}

impl<'a> AccessorUsageScanner<'a> {
    /// Creates a scanner resolving through `context`
    #[must_use]
    pub fn new(context: &'a AnalyzerContext) -> Self {
        AccessorUsageScanner { context }
    }

    /// Scans `scope` for members whose bodies call an accessor of the property
    /// `target`.
    ///
    /// # Errors
    /// [`Error::UnresolvedEntity`] if `target` is not a known property;
    /// [`Error::Cancelled`] if `cancel` fires.
    pub fn scan_property(
        &self,
        target: EntityHandle,
        scope: &[TypeEntryRc],
        cancel: &CancellationToken,
    ) -> Result<Vec<Hit>> {
        let entry = self
            .context
            .registry()
            .property_entry(target)
            .ok_or(Error::UnresolvedEntity(target.token))?;
        self.scan_accessors(&entry.accessors().collect::<Vec<_>>(), scope, cancel)
    }

    /// Scans `scope` for members whose bodies call an accessor of the event
    /// `target`.
    ///
    /// # Errors
    /// [`Error::UnresolvedEntity`] if `target` is not a known event;
    /// [`Error::Cancelled`] if `cancel` fires.
    pub fn scan_event(
        &self,
        target: EntityHandle,
        scope: &[TypeEntryRc],
        cancel: &CancellationToken,
    ) -> Result<Vec<Hit>> {
        let entry = self
            .context
            .registry()
            .event_entry(target)
            .ok_or(Error::UnresolvedEntity(target.token))?;
        self.scan_accessors(&entry.accessors().collect::<Vec<_>>(), scope, cancel)
    }

    fn scan_accessors(
        &self,
        accessors: &[EntityHandle],
        scope: &[TypeEntryRc],
        cancel: &CancellationToken,
    ) -> Result<Vec<Hit>> {
        if accessors.is_empty() {
            return Ok(Vec::new());
        }
        scan_bodies(self.context, scope, cancel, |module, body| {
            body_references_any(self.context, module, body, accessors)
        })
    }
}
