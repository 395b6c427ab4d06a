//! Usage records, the final output of a cross-reference query.

use std::cmp::Ordering;

use crate::{
    decompiler::ast::TextSpan,
    metadata::{handle::EntityHandle, typesystem::MemberKind},
};

/// One resolved usage: a place in (possibly virtual) source text that uses the
/// queried entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Usage {
    /// Name of the assembly the usage was found in
    pub assembly: String,
    /// Name of the project the query ran for
    pub project: String,
    /// Path of the document containing the usage. For decompiled binaries this
    /// is a `$metadata$` virtual path, see [`crate::xref::path`].
    pub file: String,
    /// Span of the usage in that document
    pub span: TextSpan,
    /// Namespace-qualified name of the root declaration the usage sits in
    pub containing_type: String,
    /// Handle of that root declaration, for follow-up queries
    pub containing_type_handle: EntityHandle,
    /// Kind of the member containing the usage
    pub kind: MemberKind,
    /// Display name of the member containing the usage
    pub member: String,
    /// The usage's source line, trimmed, for display in result lists
    pub excerpt: String,
}

/// Orders usages by document, then by position within the document.
///
/// Queries collect hits from parallel groups in nondeterministic order; sorting
/// makes the result stable across runs.
pub fn sort_usages(usages: &mut [Usage]) {
    usages.sort_by(|a, b| match a.file.cmp(&b.file) {
        Ordering::Equal => a.span.start.cmp(&b.span.start),
        other => other,
    });
}
