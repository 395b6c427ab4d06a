//! Module-scoped entity identity.
//!
//! A metadata token is only meaningful relative to the module whose tables it indexes.
//! [`EntityHandle`] pairs a token with the id of its owning module, giving a uniform,
//! process-wide identifier for types, methods, fields, properties and events. Two handles
//! denote the same program entity iff both the token and the owning module are equal -
//! a scanner must never treat equal raw tokens from different modules as the same entity.

use std::fmt;

use crate::metadata::token::Token;

/// Identifier of a loaded module, assigned by the
/// [`crate::metadata::registry::ModuleRegistry`] when the module is first opened.
///
/// Ids are process-unique and never reused; since the registry canonicalizes file
/// paths before assigning ids, id equality coincides with path equality.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ModuleId(pub u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Uniform identifier for a program entity in a loaded binary.
///
/// Handles are opaque: they are compared, hashed and carried around, but never
/// interpreted arithmetically outside instruction decoding. Equality requires both
/// the owning module and the raw token to match.
///
/// # Examples
///
/// ```rust
/// use cilxref::metadata::{handle::{EntityHandle, ModuleId}, token::Token};
///
/// let a = EntityHandle::new(ModuleId(0), Token::new(0x06000001));
/// let b = EntityHandle::new(ModuleId(1), Token::new(0x06000001));
/// // Same raw token, different module: different entities.
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityHandle {
    /// Id of the module whose metadata tables the token indexes
    pub module: ModuleId,
    /// The raw metadata token
    pub token: Token,
}

impl EntityHandle {
    /// Creates a handle from an owning module id and a raw token
    #[must_use]
    pub fn new(module: ModuleId, token: Token) -> Self {
        EntityHandle { module, token }
    }

    /// Returns true if the underlying token is null
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.token.is_null()
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({}:{})", self.module, self.token)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.token)
    }
}
