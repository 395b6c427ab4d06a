//! Bounds-checked decode cursor over a raw IL instruction stream.
//!
//! The usage scanners drive this cursor through a method body: read the next opcode,
//! read its token operand if the opcode is one they care about, otherwise skip the
//! operand. Skipping respects the operand width of every opcode - including the
//! variable-width `switch` - so the cursor never falls out of sync with instruction
//! boundaries. Any truncation or reserved opcode surfaces as an error; the scanners
//! recover from it by reporting the affected member as "not used".

use crate::{
    disassembler::opcodes::{Op, OperandKind},
    metadata::token::Token,
    Error, Result,
};

/// A cursor over one method body's IL bytes.
pub struct IlCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> IlCursor<'a> {
    /// Creates a cursor at the start of `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        IlCursor { data, pos: 0 }
    }

    /// Current byte offset into the stream
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes remaining in the stream
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Decodes the next opcode, or returns `Ok(None)` at end of stream.
    ///
    /// # Errors
    /// [`Error::InstructionDecode`] for a reserved opcode;
    /// [`Error::OutOfBounds`] if the stream ends inside a 0xFE prefix.
    pub fn next_opcode(&mut self) -> Result<Option<Op>> {
        if self.remaining() == 0 {
            return Ok(None);
        }

        let offset = self.pos;
        let first = self.read_u8()?;
        let op = if first == 0xFE {
            Op {
                prefix: 0xFE,
                code: self.read_u8()?,
            }
        } else {
            Op {
                prefix: 0,
                code: first,
            }
        };

        if op.mnemonic().is_empty() {
            return Err(Error::InstructionDecode {
                offset,
                message: if op.prefix == 0xFE {
                    format!("invalid opcode: FE {:02X}", op.code)
                } else {
                    format!("invalid opcode: {:02X}", op.code)
                },
            });
        }

        Ok(Some(op))
    }

    /// Reads a 4-byte little-endian metadata token operand
    pub fn read_token(&mut self) -> Result<Token> {
        Ok(Token::new(self.read_u32()?))
    }

    /// Skips the operand of `op`, however wide it is.
    ///
    /// For `switch` the target count is read from the stream first.
    pub fn skip_operand(&mut self, op: Op) -> Result<()> {
        match op.operand() {
            OperandKind::Switch => {
                let count = self.read_u32()? as usize;
                self.advance(count.checked_mul(4).ok_or(Error::OutOfBounds)?)
            }
            kind => {
                // Every non-switch operand has a fixed size.
                let size = kind.size().unwrap_or(0);
                self.advance(size)
            }
        }
    }

    fn advance(&mut self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(Error::OutOfBounds);
        }
        self.pos += count;
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(Error::OutOfBounds)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_u32(&mut self) -> Result<u32> {
        if self.remaining() < 4 {
            return Err(Error::OutOfBounds);
        }
        let bytes = [
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ];
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes))
    }
}
