use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::{handle::ModuleId, token::Token};

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The taxonomy distinguishes failures that propagate out of a cross-reference query from
/// anomalies that are recovered locally by the usage scanners. Only module loading,
/// whole-declaration decompilation and cancellation ever surface to the caller of a query
/// entry point; everything else degrades to "not found" so that one bad member never voids
/// an entire query.
///
/// # Error Categories
///
/// ## Query-fatal errors
/// - [`Error::ModuleLoad`] - The starting module is missing or unreadable
/// - [`Error::Decompilation`] - A root declaration could not be decompiled
/// - [`Error::Cancelled`] - The caller's cancellation token fired mid-query
///
/// ## Locally recovered anomalies
/// - [`Error::InstructionDecode`] - One member's instruction stream is malformed; the
///   scanner reports that member as "not used" and continues
/// - [`Error::UnresolvedEntity`] - A token resolves to nothing (forwarded or missing
///   reference); treated as "no match"
/// - [`Error::NoAddressableRoot`] - A candidate's containing declaration is a constructed
///   type with no definition root; the candidate is skipped
///
/// ## Structural errors
/// - [`Error::Malformed`] - Corrupted metadata outside an instruction stream
/// - [`Error::OutOfBounds`] - A read past the end of a byte stream was attempted
#[derive(Error, Debug)]
pub enum Error {
    /// The module file is missing or unreadable.
    ///
    /// Fatal for the query that needed it; the path is the one handed to
    /// [`crate::metadata::registry::ModuleRegistry::open`].
    #[error("Failed to load module '{path}': {source}")]
    ModuleLoad {
        /// Path of the module that could not be loaded
        path: PathBuf,
        /// The underlying I/O failure
        source: std::io::Error,
    },

    /// Decompilation of a root declaration failed.
    ///
    /// The underlying bytecode is structurally malformed at the root-declaration level.
    /// This failure is never cached, so a retry will attempt decompilation again.
    #[error("Decompilation of {token} in module {module} failed: {message}")]
    Decompilation {
        /// The module owning the root declaration
        module: ModuleId,
        /// Token of the root declaration that failed to decompile
        token: Token,
        /// Description of the decompilation failure
        message: String,
    },

    /// A member's instruction stream is malformed.
    ///
    /// Recovered locally by the usage scanners: the affected member is reported as
    /// "not used" and the scan continues over the remaining scope.
    #[error("Instruction decode failed at offset {offset}: {message}")]
    InstructionDecode {
        /// Byte offset into the instruction stream where decoding failed
        offset: usize,
        /// Description of the decode failure
        message: String,
    },

    /// A metadata token did not resolve to any entity.
    ///
    /// Recovered locally: the referencing instruction is treated as "no match".
    #[error("Token {0} does not resolve to an entity")]
    UnresolvedEntity(Token),

    /// The containing declaration of a candidate is a parameterized/constructed type
    /// with no definition root, so it cannot be mapped to a stable file path.
    ///
    /// Recovered locally: the candidate is skipped.
    #[error("Containing declaration is not an addressable root")]
    NoAddressableRoot,

    /// The query's cancellation token fired before the scan completed.
    ///
    /// Long scans poll the token between scope entries; no partial member scan is
    /// cancelled mid-instruction-stream.
    #[error("The query was cancelled before completion")]
    Cancelled,

    /// The metadata is damaged and could not be interpreted.
    #[error("Malformed - {0}")]
    Malformed(String),

    /// An out of bound access was attempted while reading a byte stream.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,
}
