//! CIL instruction decoding primitives for the usage scanners.
//!
//! This is deliberately not a full disassembler: the scanners only need to walk a
//! method body instruction by instruction, read the token operand of the few opcodes
//! that can reference the analyzed entity, and skip everything else without losing
//! stream synchronization.
//!
//! # Key Types
//! - [`Op`] - opcode identity with scanner-facing classification helpers
//! - [`OperandKind`] - operand width classes
//! - [`IlCursor`] - bounds-checked decode cursor
//!
//! # Example
//! ```rust
//! use cilxref::disassembler::IlCursor;
//!
//! let bytecode = [0x00, 0x2A]; // nop, ret
//! let mut cursor = IlCursor::new(&bytecode);
//! let op = cursor.next_opcode()?.unwrap();
//! assert_eq!(op.mnemonic(), "nop");
//! # Ok::<(), cilxref::Error>(())
//! ```

mod cursor;
mod opcodes;

pub use cursor::IlCursor;
pub use opcodes::{
    Op, OpCodeInfo, OperandKind, CALL, CALLVIRT, LDFLD, LDFLDA, LDFTN, LDSFLD, LDSFLDA, LDTOKEN,
    LDVIRTFTN, NEWOBJ, OPCODES, OPCODES_FE, STFLD, STSFLD,
};
