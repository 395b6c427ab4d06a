//! CIL opcode tables.
//!
//! One entry per opcode of the one-byte map and the 0xFE-prefixed map, carrying the
//! mnemonic and the operand width class. The scanners only ever need two things from
//! an opcode: whether it is one of the few they care about, and how wide its operand
//! is so the decode cursor can skip it and stay synchronized. Reserved slots carry an
//! empty mnemonic and are rejected during decoding.

use std::fmt;

/// Operand width classes of CIL instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand present
    None,
    /// Signed 8-bit inline value (short branch target, small constant)
    Int8,
    /// Unsigned 8-bit inline value (short local/argument index)
    UInt8,
    /// Unsigned 16-bit inline value (local/argument index)
    UInt16,
    /// Signed 32-bit inline value (branch target, constant)
    Int32,
    /// Signed 64-bit inline value
    Int64,
    /// 32-bit floating point inline value
    Float32,
    /// 64-bit floating point inline value
    Float64,
    /// Metadata token reference
    Token,
    /// Switch table: a count followed by that many 32-bit targets
    Switch,
}

impl OperandKind {
    /// Size in bytes of the operand, or `None` for variable-size operands
    /// (`Switch` reads its target count from the stream).
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        match self {
            OperandKind::None => Some(0),
            OperandKind::Int8 | OperandKind::UInt8 => Some(1),
            OperandKind::UInt16 => Some(2),
            OperandKind::Int32 | OperandKind::Float32 | OperandKind::Token => Some(4),
            OperandKind::Int64 | OperandKind::Float64 => Some(8),
            OperandKind::Switch => None,
        }
    }
}

/// Static description of one opcode slot.
#[derive(Debug, Clone, Copy)]
pub struct OpCodeInfo {
    /// Mnemonic, empty for reserved slots
    pub mnemonic: &'static str,
    /// Operand width class
    pub operand: OperandKind,
}

/// A decoded opcode identity: the optional 0xFE prefix plus the code byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Op {
    /// 0xFE for extended opcodes, 0 otherwise
    pub prefix: u8,
    /// The opcode byte
    pub code: u8,
}

impl Op {
    /// Table entry for this opcode; out-of-range codes map to a reserved entry
    #[must_use]
    pub fn info(&self) -> &'static OpCodeInfo {
        if self.prefix == 0xFE {
            OPCODES_FE.get(self.code as usize).unwrap_or(&RESERVED)
        } else {
            &OPCODES[self.code as usize]
        }
    }

    /// Mnemonic of this opcode
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        self.info().mnemonic
    }

    /// Operand width class of this opcode
    #[must_use]
    pub fn operand(&self) -> OperandKind {
        self.info().operand
    }

    /// True for the opcodes that reference a member and count for
    /// method-usage scanning: `call`, `callvirt`, `ldtoken`, `ldftn`,
    /// `ldvirtftn`, `newobj`.
    #[must_use]
    pub fn references_member(&self) -> bool {
        matches!(
            *self,
            CALL | CALLVIRT | LDTOKEN | LDFTN | LDVIRTFTN | NEWOBJ
        )
    }

    /// True for field read opcodes (`ldfld`, `ldsfld`)
    #[must_use]
    pub fn is_field_read(&self) -> bool {
        matches!(*self, LDFLD | LDSFLD)
    }

    /// True for field write opcodes (`stfld`, `stsfld`)
    #[must_use]
    pub fn is_field_write(&self) -> bool {
        matches!(*self, STFLD | STSFLD)
    }

    /// True for field address-taking opcodes (`ldflda`, `ldsflda`), which imply
    /// potential read-and-write access
    #[must_use]
    pub fn is_field_address(&self) -> bool {
        matches!(*self, LDFLDA | LDSFLDA)
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix == 0xFE {
            write!(f, "Op(FE {:02X} {})", self.code, self.mnemonic())
        } else {
            write!(f, "Op({:02X} {})", self.code, self.mnemonic())
        }
    }
}

/// `call` - method call through a method token
pub const CALL: Op = Op {
    prefix: 0,
    code: 0x28,
};
/// `callvirt` - virtual method call through a method token
pub const CALLVIRT: Op = Op {
    prefix: 0,
    code: 0x6F,
};
/// `newobj` - object construction through a constructor token
pub const NEWOBJ: Op = Op {
    prefix: 0,
    code: 0x73,
};
/// `ldtoken` - load a runtime handle for a metadata token
pub const LDTOKEN: Op = Op {
    prefix: 0,
    code: 0xD0,
};
/// `ldftn` - load a function pointer
pub const LDFTN: Op = Op {
    prefix: 0xFE,
    code: 0x06,
};
/// `ldvirtftn` - load a virtual function pointer
pub const LDVIRTFTN: Op = Op {
    prefix: 0xFE,
    code: 0x07,
};
/// `ldfld` - load an instance field
pub const LDFLD: Op = Op {
    prefix: 0,
    code: 0x7B,
};
/// `ldflda` - load an instance field address
pub const LDFLDA: Op = Op {
    prefix: 0,
    code: 0x7C,
};
/// `stfld` - store an instance field
pub const STFLD: Op = Op {
    prefix: 0,
    code: 0x7D,
};
/// `ldsfld` - load a static field
pub const LDSFLD: Op = Op {
    prefix: 0,
    code: 0x7E,
};
/// `ldsflda` - load a static field address
pub const LDSFLDA: Op = Op {
    prefix: 0,
    code: 0x7F,
};
/// `stsfld` - store a static field
pub const STSFLD: Op = Op {
    prefix: 0,
    code: 0x80,
};

const fn op(mnemonic: &'static str, operand: OperandKind) -> OpCodeInfo {
    OpCodeInfo { mnemonic, operand }
}

const RESERVED: OpCodeInfo = op("", OperandKind::None);

/// One-byte opcode map (0x00 - 0xFF); 0xFE itself is the extended-map prefix
/// and is marked reserved here.
pub static OPCODES: [OpCodeInfo; 256] = {
    use OperandKind::*;
    let mut table = [RESERVED; 256];
    table[0x00] = op("nop", None);
    table[0x01] = op("break", None);
    table[0x02] = op("ldarg.0", None);
    table[0x03] = op("ldarg.1", None);
    table[0x04] = op("ldarg.2", None);
    table[0x05] = op("ldarg.3", None);
    table[0x06] = op("ldloc.0", None);
    table[0x07] = op("ldloc.1", None);
    table[0x08] = op("ldloc.2", None);
    table[0x09] = op("ldloc.3", None);
    table[0x0A] = op("stloc.0", None);
    table[0x0B] = op("stloc.1", None);
    table[0x0C] = op("stloc.2", None);
    table[0x0D] = op("stloc.3", None);
    table[0x0E] = op("ldarg.s", UInt8);
    table[0x0F] = op("ldarga.s", UInt8);
    table[0x10] = op("starg.s", UInt8);
    table[0x11] = op("ldloc.s", UInt8);
    table[0x12] = op("ldloca.s", UInt8);
    table[0x13] = op("stloc.s", UInt8);
    table[0x14] = op("ldnull", None);
    table[0x15] = op("ldc.i4.m1", None);
    table[0x16] = op("ldc.i4.0", None);
    table[0x17] = op("ldc.i4.1", None);
    table[0x18] = op("ldc.i4.2", None);
    table[0x19] = op("ldc.i4.3", None);
    table[0x1A] = op("ldc.i4.4", None);
    table[0x1B] = op("ldc.i4.5", None);
    table[0x1C] = op("ldc.i4.6", None);
    table[0x1D] = op("ldc.i4.7", None);
    table[0x1E] = op("ldc.i4.8", None);
    table[0x1F] = op("ldc.i4.s", Int8);
    table[0x20] = op("ldc.i4", Int32);
    table[0x21] = op("ldc.i8", Int64);
    table[0x22] = op("ldc.r4", Float32);
    table[0x23] = op("ldc.r8", Float64);
    table[0x25] = op("dup", None);
    table[0x26] = op("pop", None);
    table[0x27] = op("jmp", Token);
    table[0x28] = op("call", Token);
    table[0x29] = op("calli", Token);
    table[0x2A] = op("ret", None);
    table[0x2B] = op("br.s", Int8);
    table[0x2C] = op("brfalse.s", Int8);
    table[0x2D] = op("brtrue.s", Int8);
    table[0x2E] = op("beq.s", Int8);
    table[0x2F] = op("bge.s", Int8);
    table[0x30] = op("bgt.s", Int8);
    table[0x31] = op("ble.s", Int8);
    table[0x32] = op("blt.s", Int8);
    table[0x33] = op("bne.un.s", Int8);
    table[0x34] = op("bge.un.s", Int8);
    table[0x35] = op("bgt.un.s", Int8);
    table[0x36] = op("ble.un.s", Int8);
    table[0x37] = op("blt.un.s", Int8);
    table[0x38] = op("br", Int32);
    table[0x39] = op("brfalse", Int32);
    table[0x3A] = op("brtrue", Int32);
    table[0x3B] = op("beq", Int32);
    table[0x3C] = op("bge", Int32);
    table[0x3D] = op("bgt", Int32);
    table[0x3E] = op("ble", Int32);
    table[0x3F] = op("blt", Int32);
    table[0x40] = op("bne.un", Int32);
    table[0x41] = op("bge.un", Int32);
    table[0x42] = op("bgt.un", Int32);
    table[0x43] = op("ble.un", Int32);
    table[0x44] = op("blt.un", Int32);
    table[0x45] = op("switch", Switch);
    table[0x46] = op("ldind.i1", None);
    table[0x47] = op("ldind.u1", None);
    table[0x48] = op("ldind.i2", None);
    table[0x49] = op("ldind.u2", None);
    table[0x4A] = op("ldind.i4", None);
    table[0x4B] = op("ldind.u4", None);
    table[0x4C] = op("ldind.i8", None);
    table[0x4D] = op("ldind.i", None);
    table[0x4E] = op("ldind.r4", None);
    table[0x4F] = op("ldind.r8", None);
    table[0x50] = op("ldind.ref", None);
    table[0x51] = op("stind.ref", None);
    table[0x52] = op("stind.i1", None);
    table[0x53] = op("stind.i2", None);
    table[0x54] = op("stind.i4", None);
    table[0x55] = op("stind.i8", None);
    table[0x56] = op("stind.r4", None);
    table[0x57] = op("stind.r8", None);
    table[0x58] = op("add", None);
    table[0x59] = op("sub", None);
    table[0x5A] = op("mul", None);
    table[0x5B] = op("div", None);
    table[0x5C] = op("div.un", None);
    table[0x5D] = op("rem", None);
    table[0x5E] = op("rem.un", None);
    table[0x5F] = op("and", None);
    table[0x60] = op("or", None);
    table[0x61] = op("xor", None);
    table[0x62] = op("shl", None);
    table[0x63] = op("shr", None);
    table[0x64] = op("shr.un", None);
    table[0x65] = op("neg", None);
    table[0x66] = op("not", None);
    table[0x67] = op("conv.i1", None);
    table[0x68] = op("conv.i2", None);
    table[0x69] = op("conv.i4", None);
    table[0x6A] = op("conv.i8", None);
    table[0x6B] = op("conv.r4", None);
    table[0x6C] = op("conv.r8", None);
    table[0x6D] = op("conv.u4", None);
    table[0x6E] = op("conv.u8", None);
    table[0x6F] = op("callvirt", Token);
    table[0x70] = op("cpobj", Token);
    table[0x71] = op("ldobj", Token);
    table[0x72] = op("ldstr", Token);
    table[0x73] = op("newobj", Token);
    table[0x74] = op("castclass", Token);
    table[0x75] = op("isinst", Token);
    table[0x76] = op("conv.r.un", None);
    table[0x79] = op("unbox", Token);
    table[0x7A] = op("throw", None);
    table[0x7B] = op("ldfld", Token);
    table[0x7C] = op("ldflda", Token);
    table[0x7D] = op("stfld", Token);
    table[0x7E] = op("ldsfld", Token);
    table[0x7F] = op("ldsflda", Token);
    table[0x80] = op("stsfld", Token);
    table[0x81] = op("stobj", Token);
    table[0x82] = op("conv.ovf.i1.un", None);
    table[0x83] = op("conv.ovf.i2.un", None);
    table[0x84] = op("conv.ovf.i4.un", None);
    table[0x85] = op("conv.ovf.i8.un", None);
    table[0x86] = op("conv.ovf.u1.un", None);
    table[0x87] = op("conv.ovf.u2.un", None);
    table[0x88] = op("conv.ovf.u4.un", None);
    table[0x89] = op("conv.ovf.u8.un", None);
    table[0x8A] = op("conv.ovf.i.un", None);
    table[0x8B] = op("conv.ovf.u.un", None);
    table[0x8C] = op("box", Token);
    table[0x8D] = op("newarr", Token);
    table[0x8E] = op("ldlen", None);
    table[0x8F] = op("ldelema", Token);
    table[0x90] = op("ldelem.i1", None);
    table[0x91] = op("ldelem.u1", None);
    table[0x92] = op("ldelem.i2", None);
    table[0x93] = op("ldelem.u2", None);
    table[0x94] = op("ldelem.i4", None);
    table[0x95] = op("ldelem.u4", None);
    table[0x96] = op("ldelem.i8", None);
    table[0x97] = op("ldelem.i", None);
    table[0x98] = op("ldelem.r4", None);
    table[0x99] = op("ldelem.r8", None);
    table[0x9A] = op("ldelem.ref", None);
    table[0x9B] = op("stelem.i", None);
    table[0x9C] = op("stelem.i1", None);
    table[0x9D] = op("stelem.i2", None);
    table[0x9E] = op("stelem.i4", None);
    table[0x9F] = op("stelem.i8", None);
    table[0xA0] = op("stelem.r4", None);
    table[0xA1] = op("stelem.r8", None);
    table[0xA2] = op("stelem.ref", None);
    table[0xA3] = op("ldelem", Token);
    table[0xA4] = op("stelem", Token);
    table[0xA5] = op("unbox.any", Token);
    table[0xB3] = op("conv.ovf.i1", None);
    table[0xB4] = op("conv.ovf.u1", None);
    table[0xB5] = op("conv.ovf.i2", None);
    table[0xB6] = op("conv.ovf.u2", None);
    table[0xB7] = op("conv.ovf.i4", None);
    table[0xB8] = op("conv.ovf.u4", None);
    table[0xB9] = op("conv.ovf.i8", None);
    table[0xBA] = op("conv.ovf.u8", None);
    table[0xC2] = op("refanyval", Token);
    table[0xC3] = op("ckfinite", None);
    table[0xC6] = op("mkrefany", Token);
    table[0xD0] = op("ldtoken", Token);
    table[0xD1] = op("conv.u2", None);
    table[0xD2] = op("conv.u1", None);
    table[0xD3] = op("conv.i", None);
    table[0xD4] = op("conv.ovf.i", None);
    table[0xD5] = op("conv.ovf.u", None);
    table[0xD6] = op("add.ovf", None);
    table[0xD7] = op("add.ovf.un", None);
    table[0xD8] = op("mul.ovf", None);
    table[0xD9] = op("mul.ovf.un", None);
    table[0xDA] = op("sub.ovf", None);
    table[0xDB] = op("sub.ovf.un", None);
    table[0xDC] = op("endfinally", None);
    table[0xDD] = op("leave", Int32);
    table[0xDE] = op("leave.s", Int8);
    table[0xDF] = op("stind.i", None);
    table[0xE0] = op("conv.u", None);
    table
};

/// Extended (0xFE-prefixed) opcode map.
pub static OPCODES_FE: [OpCodeInfo; 0x1F] = {
    use OperandKind::*;
    let mut table = [RESERVED; 0x1F];
    table[0x00] = op("arglist", None);
    table[0x01] = op("ceq", None);
    table[0x02] = op("cgt", None);
    table[0x03] = op("cgt.un", None);
    table[0x04] = op("clt", None);
    table[0x05] = op("clt.un", None);
    table[0x06] = op("ldftn", Token);
    table[0x07] = op("ldvirtftn", Token);
    table[0x09] = op("ldarg", UInt16);
    table[0x0A] = op("ldarga", UInt16);
    table[0x0B] = op("starg", UInt16);
    table[0x0C] = op("ldloc", UInt16);
    table[0x0D] = op("ldloca", UInt16);
    table[0x0E] = op("stloc", UInt16);
    table[0x0F] = op("localloc", None);
    table[0x11] = op("endfilter", None);
    table[0x12] = op("unaligned.", UInt8);
    table[0x13] = op("volatile.", None);
    table[0x14] = op("tail.", None);
    table[0x15] = op("initobj", Token);
    table[0x16] = op("constrained.", Token);
    table[0x17] = op("cpblk", None);
    table[0x18] = op("initblk", None);
    table[0x19] = op("no.", UInt8);
    table[0x1A] = op("rethrow", None);
    table[0x1C] = op("sizeof", Token);
    table[0x1D] = op("refanytype", None);
    table[0x1E] = op("readonly.", None);
    table
};
