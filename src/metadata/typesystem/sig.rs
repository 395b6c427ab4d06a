//! Structural type references.
//!
//! Signatures, base-type lists, attribute arguments and local-variable tables all refer
//! to types structurally: a reference may be a plain definition (`Widget`), a constructed
//! generic (`List<Widget>`), an array (`Widget[]`, modeled as a construction) or a type
//! with no addressable definition at all (primitives, generic parameters). [`TypeSig`]
//! captures that shape, and [`TypeSig::contains`] answers the one question the usage
//! scanners ask: does this reference mention a given type definition anywhere inside it?

use crate::metadata::handle::EntityHandle;

/// A structural reference to a type, as it appears in signatures and metadata.
///
/// `definition` is the handle of the underlying type definition when one exists;
/// references to generic parameters or primitives carry `None`. `args` holds the
/// type arguments of a constructed generic (or the element type of an array),
/// nested arbitrarily deep.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TypeSig {
    /// Handle of the underlying type definition, if the reference has one
    pub definition: Option<EntityHandle>,
    /// Type arguments of a constructed generic, empty for plain references
    pub args: Vec<TypeSig>,
}

impl TypeSig {
    /// A plain reference to a type definition
    #[must_use]
    pub fn definition(handle: EntityHandle) -> Self {
        TypeSig {
            definition: Some(handle),
            args: Vec::new(),
        }
    }

    /// A constructed generic: `definition<args...>`
    #[must_use]
    pub fn generic(handle: EntityHandle, args: Vec<TypeSig>) -> Self {
        TypeSig {
            definition: Some(handle),
            args,
        }
    }

    /// A reference with no addressable definition (primitive, generic parameter)
    #[must_use]
    pub fn opaque() -> Self {
        TypeSig::default()
    }

    /// Returns true if this reference mentions `target` anywhere - as its own
    /// definition or inside any (nested) type argument.
    ///
    /// The walk is iterative; deeply nested constructions cannot exhaust the stack.
    #[must_use]
    pub fn contains(&self, target: EntityHandle) -> bool {
        let mut pending = vec![self];
        while let Some(sig) = pending.pop() {
            if sig.definition == Some(target) {
                return true;
            }
            pending.extend(sig.args.iter());
        }
        false
    }
}
