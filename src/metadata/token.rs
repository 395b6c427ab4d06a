//! Metadata token representation and table-kind classification.

use std::fmt;

/// A metadata token representing a reference to a metadata table entry.
///
/// Tokens consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
///
/// Tokens are opaque identifiers; outside instruction decoding they are never
/// interpreted arithmetically. A token alone does not identify a program entity -
/// it must be paired with its owning module (see
/// [`crate::metadata::handle::EntityHandle`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

/// Table id of the `TypeRef` table
pub const TABLE_TYPE_REF: u8 = 0x01;
/// Table id of the `TypeDef` table
pub const TABLE_TYPE_DEF: u8 = 0x02;
/// Table id of the `Field` table
pub const TABLE_FIELD: u8 = 0x04;
/// Table id of the `MethodDef` table
pub const TABLE_METHOD_DEF: u8 = 0x06;
/// Table id of the `MemberRef` table
pub const TABLE_MEMBER_REF: u8 = 0x0A;
/// Table id of the `StandAloneSig` table
pub const TABLE_STANDALONE_SIG: u8 = 0x11;
/// Table id of the `Event` table
pub const TABLE_EVENT: u8 = 0x14;
/// Table id of the `Property` table
pub const TABLE_PROPERTY: u8 = 0x17;
/// Table id of the `TypeSpec` table
pub const TABLE_TYPE_SPEC: u8 = 0x1B;
/// Table id of the `MethodSpec` table
pub const TABLE_METHOD_SPEC: u8 = 0x2B;

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the token's table can denote a member (method, field,
    /// property, event, member reference or generic method instantiation).
    ///
    /// Mirrors the member-kind check performed before resolving an instruction
    /// operand: tokens of other tables are skipped by the member scanners.
    #[must_use]
    pub fn is_member_kind(&self) -> bool {
        matches!(
            self.table(),
            TABLE_FIELD
                | TABLE_METHOD_DEF
                | TABLE_MEMBER_REF
                | TABLE_EVENT
                | TABLE_PROPERTY
                | TABLE_METHOD_SPEC
        )
    }

    /// Returns true if the token's table denotes a type (definition, reference
    /// or instantiated type specification).
    #[must_use]
    pub fn is_type_kind(&self) -> bool {
        matches!(
            self.table(),
            TABLE_TYPE_REF | TABLE_TYPE_DEF | TABLE_TYPE_SPEC
        )
    }

    /// Returns true if the token denotes a standalone signature (e.g. the
    /// function-pointer signature of a `calli`).
    #[must_use]
    pub fn is_signature_kind(&self) -> bool {
        self.table() == TABLE_STANDALONE_SIG
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
