// This file is part of minicc, a compiler.
// Copyright 2026 Jeffrey Sharp
//
// minicc is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// minicc is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with minicc.  If not, see <http://www.gnu.org/licenses/>.

//! The bytecode emitter: an append-only stream of 32-bit code words plus a
//! cursor, and the opcode numbering.

use crate::diagnostics::{fatal, Result};
use crate::lang::token::Token;

/// Code-stream capacity, in words.
pub const CODE_CAPACITY: usize = 4096;

/// Named opcodes. Numbered from 256 up so they never collide with an
/// operator token reused as a 0-arity opcode (see [`operator_opcode`]).
pub mod op {
    pub const DEREF: i32 = 256;
    pub const CONST: i32 = 257;
    pub const CALL: i32 = 258;
    pub const SCALL: i32 = 259;
    pub const GETAG: i32 = 260;
    pub const GETAL: i32 = 261;
    pub const GETAA: i32 = 262;
    pub const ALLOC: i32 = 263;
    pub const RETURN: i32 = 264;
    pub const JMP: i32 = 265;
    pub const JZ: i32 = 266;
    pub const JNZ: i32 = 267;
    pub const DROP: i32 = 268;
    pub const NEG: i32 = 269;
}

/// Maps a binary operator token to the opcode value emitted for it. Operator
/// tokens are reused directly as 0-arity opcodes rather than routed through
/// a separate enumeration, matching the wire format of the host VM.
pub fn operator_opcode(tok: Token) -> i32 {
    match tok {
        Token::Assign => 1,
        Token::BitOr => 2,
        Token::BitAnd => 3,
        Token::Add => 4,
        Token::Sub => 5,
        Token::Mul => 6,
        Token::Div => 7,
        Token::LogOr => 8,
        Token::LogAnd => 9,
        Token::Mod => 10,
        Token::Lt => 11,
        Token::Gt => 12,
        Token::LtEqu => 13,
        Token::GtEqu => 14,
        Token::Equ => 15,
        Token::Nequ => 16,
        _ => unreachable!("{tok:?} is not a binary operator"),
    }
}

/// Returns the mnemonic for a raw code word, along with its arity (0 or 1),
/// for use by the disassembler. Handles both named opcodes and operator
/// tokens reused as opcodes, since the disassembler cannot otherwise tell
/// them apart.
pub fn mnemonic(word: i32) -> (&'static str, usize) {
    match word {
        op::DEREF => ("DEREF", 0),
        op::CONST => ("CONST", 1),
        op::CALL => ("CALL", 1),
        op::SCALL => ("SCALL", 1),
        op::GETAG => ("GETAG", 1),
        op::GETAL => ("GETAL", 1),
        op::GETAA => ("GETAA", 1),
        op::ALLOC => ("ALLOC", 1),
        op::RETURN => ("RETURN", 1),
        op::JMP => ("JMP", 1),
        op::JZ => ("JZ", 1),
        op::JNZ => ("JNZ", 1),
        op::DROP => ("DROP", 0),
        op::NEG => ("NEG", 0),
        1 => ("ASSIGN", 0),
        2 => ("BITOR", 0),
        3 => ("BITAND", 0),
        4 => ("ADD", 0),
        5 => ("SUB", 0),
        6 => ("MUL", 0),
        7 => ("DIV", 0),
        8 => ("LOGOR", 0),
        9 => ("LOGAND", 0),
        10 => ("MOD", 0),
        11 => ("LT", 0),
        12 => ("GT", 0),
        13 => ("LTEQU", 0),
        14 => ("GTEQU", 0),
        15 => ("EQU", 0),
        16 => ("NEQU", 0),
        _ => ("?", 0),
    }
}

/// An append-only code buffer with a write cursor. A function's entry
/// address is simply whatever `pos()` reads at the moment its header is
/// recorded; no separate bookkeeping is needed.
pub struct Emitter {
    pub code: Vec<i32>,
}

impl Emitter {
    pub fn new() -> Self {
        Self { code: Vec::with_capacity(CODE_CAPACITY) }
    }

    /// The position the next emitted word will occupy.
    pub fn pos(&self) -> i32 {
        self.code.len() as i32
    }

    /// Writes one word, failing if the code stream is full.
    pub fn emit0(&mut self, word: i32, line: u32) -> Result<()> {
        if self.code.len() >= CODE_CAPACITY {
            fatal!(line, "code stream overflow");
        }
        self.code.push(word);
        Ok(())
    }

    /// Writes an opcode followed by its operand, returning the operand's
    /// position so it can later be patched.
    pub fn emit1(&mut self, op: i32, operand: i32, line: u32) -> Result<i32> {
        self.emit0(op, line)?;
        let loc = self.pos();
        self.emit0(operand, line)?;
        Ok(loc)
    }

    /// Overwrites the word at `loc`, typically a forward-jump sentinel.
    pub fn patch(&mut self, loc: i32, value: i32) {
        self.code[loc as usize] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit1_returns_operand_position() {
        let mut e = Emitter::new();
        let loc = e.emit1(op::JZ, -1, 1).unwrap();
        assert_eq!(e.code, vec![op::JZ, -1]);
        assert_eq!(loc, 1);
        e.patch(loc, 42);
        assert_eq!(e.code, vec![op::JZ, 42]);
    }

    #[test]
    fn emit0_overflow_is_fatal() {
        let mut e = Emitter { code: vec![0; CODE_CAPACITY] };
        assert!(e.emit0(0, 1).is_err());
    }

    #[test]
    fn pos_tracks_cursor() {
        let mut e = Emitter::new();
        assert_eq!(e.pos(), 0);
        e.emit0(op::DROP, 1).unwrap();
        assert_eq!(e.pos(), 1);
        e.emit1(op::CONST, 5, 1).unwrap();
        assert_eq!(e.pos(), 3);
    }
}
