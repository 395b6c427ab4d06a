//! Virtual document paths for decompiled sources.
//!
//! Decompiled text has no file on disk, so usages inside it are addressed with a
//! `$metadata$` scheme the editor integration resolves back to a (project,
//! assembly, type) triple. The layout is fixed; consumers parse these paths, so
//! every segment rule here is load-bearing.

/// Scheme prefix of all virtual documents.
pub const METADATA_PREFIX: &str = "$metadata$";

/// Builds the virtual path for the decompiled source of a root type.
///
/// Dotted names are folderized: each `.` becomes a path separator, so
/// `Foo.Bar` contributes the segments `Foo/Bar`. The final segment is the
/// type's simple name with a `.cs` extension. Nested types resolve through
/// their root declaration and share its document.
#[must_use]
pub fn metadata_file_path(project: &str, assembly: &str, type_simple_name: &str) -> String {
    format!(
        "{METADATA_PREFIX}/Project/{}/Assembly/{}/Symbol/{}.cs",
        folderize(project),
        folderize(assembly),
        folderize(type_simple_name),
    )
}

/// True if `path` addresses a virtual decompiled document.
#[must_use]
pub fn is_metadata_path(path: &str) -> bool {
    path.starts_with(METADATA_PREFIX)
}

/// Splits a dotted name into path segments.
fn folderize(name: &str) -> String {
    name.replace('.', "/")
}
