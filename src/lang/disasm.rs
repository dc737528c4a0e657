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

//! A minimal disassembler. The host VM that actually executes the emitted
//! code is an external collaborator; this exists only so the emitted
//! stream has a human-readable form for tests and debugging.

use crate::lang::emit::mnemonic;

/// Renders `code` as one line per instruction: `<offset>  <MNEMONIC> [operand]`.
pub fn disassemble(code: &[i32]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < code.len() {
        let (name, arity) = mnemonic(code[i]);
        match arity {
            0 => out.push_str(&format!("{:2}  {:<6}\n", i, name)),
            _ => out.push_str(&format!("{:2}  {:<6} {}\n", i, name, code[i + 1])),
        }
        i += 1 + arity;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::emit::op;

    #[test]
    fn disassemble_mixes_named_and_operator_opcodes() {
        let code = vec![op::CONST, 1, op::CONST, 2, 4 /* ADD */, op::DROP];
        let text = disassemble(&code);
        assert_eq!(
            text,
            " 0  CONST  1\n 2  CONST  2\n 4  ADD   \n 5  DROP  \n"
        );
    }
}
