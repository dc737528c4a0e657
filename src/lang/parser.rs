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

//! Recursive-descent parser, precedence-climbing expressions, and
//! immediate code generation.
//!
//! There is no AST: every grammar rule below emits directly into the
//! [`Emitter`] as it recognizes it. [`Compiler`] is the single context
//! bundling the lexer, symbol tables, and emitter that the original
//! module-level globals were re-architected into.

use crate::diagnostics::{fatal, Fatal, Result};
use crate::lang::emit::{op, operator_opcode, Emitter};
use crate::lang::lexer::Lexer;
use crate::lang::symbols::{Name, SymbolTable};
use crate::lang::token::Token;

/// One unary prefix operator, consumed before a primary expression.
#[derive(Clone, Copy)]
enum UnaryOp {
    Deref,
    AddrOf,
    Neg,
}

/// Binding power of each binary operator, per the precedence table.
/// Returns `None` for tokens that are not operators.
fn precedence(tok: Token) -> Option<u8> {
    Some(match tok {
        Token::Assign => 1,
        Token::LogOr => 2,
        Token::LogAnd => 3,
        Token::BitOr => 4,
        Token::BitAnd => 5,
        Token::Equ | Token::Nequ => 6,
        Token::Lt | Token::Gt | Token::LtEqu | Token::GtEqu => 7,
        Token::Add | Token::Sub => 8,
        Token::Mul | Token::Div | Token::Mod => 9,
        _ => return None,
    })
}

/// The full compiler state for one translation unit.
pub struct Compiler<'a> {
    lexer: Lexer<'a>,
    pub syms: SymbolTable,
    pub emit: Emitter,
}

impl<'a> Compiler<'a> {
    pub fn new(source: &'a [u8]) -> Result<Self> {
        Ok(Self {
            lexer: Lexer::new(source),
            syms: SymbolTable::new()?,
            emit: Emitter::new(),
        })
    }

    fn next(&mut self) -> Result<Token> {
        self.lexer.next(&mut self.syms)
    }

    fn peek(&mut self) -> Result<Token> {
        self.lexer.peek(&mut self.syms)
    }

    fn expect(&mut self, kind: Token) -> Result<()> {
        self.lexer.expect(kind, &mut self.syms)
    }

    fn found(&mut self, kind: Token) -> Result<bool> {
        self.lexer.found(kind, &mut self.syms)
    }

    fn is_type(&mut self) -> Result<bool> {
        self.lexer.is_type(&mut self.syms)
    }

    fn line(&self) -> u32 {
        self.lexer.line
    }

    fn expect_symbol(&mut self) -> Result<Name> {
        match self.next()? {
            Token::Symbol(name) => Ok(name),
            other => fatal!(self.line(), "expected identifier, found {other:?}"),
        }
    }

    /// Consumes a type: a keyword (`char`/`int`/`void`) followed by any
    /// number of `*`. Pointer depth is counted only by consuming the
    /// tokens; like the source this generalizes, no type checking is done.
    fn parse_type(&mut self) -> Result<()> {
        if !self.is_type()? {
            fatal!(self.line(), "expected a type");
        }
        self.next()?;
        while self.found(Token::Mul)? {}
        Ok(())
    }

    // ---- Driver (§ top-level compile) -------------------------------------

    /// Compiles the whole translation unit, including the program prologue
    /// (`ALLOC globalsSize; CALL mainEntry`), which is emitted before
    /// parsing and patched once the globals and `main` are known.
    pub fn compile(&mut self) -> Result<()> {
        let line = self.line();
        let alloc_globals = self.emit.emit1(op::ALLOC, -1, line)?;
        let call_main = self.emit.emit1(op::CALL, -1, line)?;

        self.parse_translation_unit()?;

        self.emit.patch(alloc_globals, self.syms.data_size as i32);

        let main = self.syms.main;
        let entry = self
            .syms
            .find_function(main)
            .ok_or_else(|| Fatal::new(self.line(), "no definition for main"))?
            .code_offset;
        self.emit.patch(call_main, entry);

        Ok(())
    }

    fn parse_translation_unit(&mut self) -> Result<()> {
        while self.peek()? != Token::Eof {
            self.parse_type()?;
            let name = self.expect_symbol()?;
            if self.found(Token::LParen)? {
                self.parse_function(name)?;
            } else {
                self.parse_global(name)?;
            }
        }
        Ok(())
    }

    fn parse_global(&mut self, name: Name) -> Result<()> {
        let line = self.line();
        let mut size = 0u32;
        if self.found(Token::LBrack)? {
            size = match self.next()? {
                Token::Literal(v) if v > 0 => v as u32,
                other => fatal!(self.line(), "expected a positive array size, found {other:?}"),
            };
            self.expect(Token::RBrack)?;
        }
        self.expect(Token::Semi)?;
        self.syms.add_global(name, size, line)
    }

    fn parse_function(&mut self, name: Name) -> Result<()> {
        let line = self.line();
        self.syms.args.clear();
        self.syms.locals.clear();

        if !self.found(Token::RParen)? {
            loop {
                self.parse_type()?;
                let pname = self.expect_symbol()?;
                self.syms.add_argument(pname, self.line())?;
                if !self.found(Token::Comma)? {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }

        let code_offset = self.emit.pos();
        self.syms.add_function(name, code_offset, self.syms.args.len() as u32, line)?;

        if name == self.syms.main && !self.syms.args.is_empty() {
            fatal!(line, "main must take no arguments");
        }

        self.expect(Token::LBrace)?;

        while self.is_type()? {
            self.parse_local()?;
        }
        if !self.syms.locals.is_empty() {
            self.emit.emit1(op::ALLOC, self.syms.locals.len() as i32, self.line())?;
        }

        while !self.found(Token::RBrace)? {
            self.stmt()?;
        }

        let end_line = self.line();
        self.emit.emit1(op::CONST, 0, end_line)?;
        self.emit.emit1(op::RETURN, self.syms.args.len() as i32, end_line)?;
        Ok(())
    }

    fn parse_local(&mut self) -> Result<()> {
        self.parse_type()?;
        loop {
            let line = self.line();
            let name = self.expect_symbol()?;
            self.syms.add_local(name, line)?;
            if !self.found(Token::Comma)? {
                break;
            }
        }
        self.expect(Token::Semi)
    }

    // ---- Statements --------------------------------------------------------

    pub fn stmt(&mut self) -> Result<()> {
        let line = self.line();

        if self.found(Token::LBrace)? {
            while !self.found(Token::RBrace)? {
                self.stmt()?;
            }
            return Ok(());
        }

        if self.found(Token::If)? {
            self.expect(Token::LParen)?;
            self.expr(1, true)?;
            self.expect(Token::RParen)?;
            let tf = self.emit.emit1(op::JZ, -1, line)?;
            self.stmt()?;
            if self.found(Token::Else)? {
                let te = self.emit.emit1(op::JMP, -1, line)?;
                self.emit.patch(tf, self.emit.pos());
                self.stmt()?;
                self.emit.patch(te, self.emit.pos());
            } else {
                self.emit.patch(tf, self.emit.pos());
            }
            return Ok(());
        }

        if self.found(Token::While)? {
            let top = self.emit.pos();
            self.expect(Token::LParen)?;
            self.expr(1, true)?;
            self.expect(Token::RParen)?;
            let tf = self.emit.emit1(op::JZ, -1, line)?;
            self.stmt()?;
            self.emit.emit1(op::JMP, top, line)?;
            self.emit.patch(tf, self.emit.pos());
            return Ok(());
        }

        if self.found(Token::Do)? {
            let top = self.emit.pos();
            self.stmt()?;
            self.expect(Token::While)?;
            self.expect(Token::LParen)?;
            self.expr(1, true)?;
            self.expect(Token::RParen)?;
            self.expect(Token::Semi)?;
            self.emit.emit1(op::JNZ, top, line)?;
            return Ok(());
        }

        if self.found(Token::For)? {
            return self.stmt_for(line);
        }

        if self.found(Token::Return)? {
            self.expr(1, true)?;
            self.expect(Token::Semi)?;
            self.emit.emit1(op::RETURN, self.syms.args.len() as i32, line)?;
            return Ok(());
        }

        if self.found(Token::Semi)? {
            return Ok(());
        }

        self.expr(1, true)?;
        self.expect(Token::Semi)?;
        self.emit.emit0(op::DROP, line)?;
        Ok(())
    }

    /// `for ( init? ; cond? ; step? ) stmt`, with an absent condition
    /// synthesized as `CONST 1`. Has no precedent in the original: the
    /// body/end jump-pair generalizes the `if`/`while` patch idiom, and the
    /// init/step clauses are treated like discarded expression-statements.
    fn stmt_for(&mut self, line: u32) -> Result<()> {
        self.expect(Token::LParen)?;

        if !self.found(Token::Semi)? {
            self.expr(1, true)?;
            self.emit.emit0(op::DROP, line)?;
            self.expect(Token::Semi)?;
        }

        let cond_pos = self.emit.pos();
        if self.found(Token::Semi)? {
            self.emit.emit1(op::CONST, 1, line)?;
        } else {
            self.expr(1, true)?;
            self.expect(Token::Semi)?;
        }

        let body_jump = self.emit.emit1(op::JNZ, -1, line)?;
        let end_jump = self.emit.emit1(op::JMP, -1, line)?;
        let step_pos = self.emit.pos();

        if !self.found(Token::RParen)? {
            self.expr(1, true)?;
            self.emit.emit0(op::DROP, line)?;
            self.expect(Token::RParen)?;
        }
        self.emit.emit1(op::JMP, cond_pos, line)?;

        self.emit.patch(body_jump, self.emit.pos());
        self.stmt()?;
        self.emit.emit1(op::JMP, step_pos, line)?;

        self.emit.patch(end_jump, self.emit.pos());
        Ok(())
    }

    // ---- Expressions --------------------------------------------------------

    /// Precedence-climbing entry point. Returns whether the parsed
    /// expression is an lvalue (its code left an *address*, not a value,
    /// on the evaluation stack).
    pub fn expr(&mut self, min_prec: u8, rvalue_required: bool) -> Result<bool> {
        let mut lvalue = self.parse_unary_and_primary()?;

        loop {
            let tok = self.peek()?;
            let prec = match precedence(tok) {
                Some(p) if p >= min_prec => p,
                _ => break,
            };
            let line = self.line();
            self.next()?;

            if tok == Token::Assign {
                if !lvalue {
                    fatal!(line, "assignment requires an lvalue");
                }
            } else if lvalue {
                self.emit.emit0(op::DEREF, line)?;
            }

            // Recurse at the operator's own precedence: left-associative
            // climbing applied uniformly, including to `=`, matching this
            // component's own description and the original source's final
            // iteration (see DESIGN.md).
            self.expr(prec, true)?;
            self.emit.emit0(operator_opcode(tok), line)?;
            lvalue = false;
        }

        if lvalue && rvalue_required {
            self.emit.emit0(op::DEREF, self.line())?;
            lvalue = false;
        }
        Ok(lvalue)
    }

    fn parse_unary_and_primary(&mut self) -> Result<bool> {
        let unary = match self.peek()? {
            Token::Mul => {
                self.next()?;
                Some(UnaryOp::Deref)
            }
            Token::BitAnd => {
                self.next()?;
                Some(UnaryOp::AddrOf)
            }
            Token::Sub => {
                self.next()?;
                Some(UnaryOp::Neg)
            }
            _ => None,
        };

        let mut lvalue = self.parse_primary()?;

        if self.found(Token::LBrack)? {
            let line = self.line();
            if lvalue {
                self.emit.emit0(op::DEREF, line)?;
            }
            self.expr(1, true)?;
            self.expect(Token::RBrack)?;
            self.emit.emit0(operator_opcode(Token::Add), line)?;
            lvalue = true;
        }

        if let Some(u) = unary {
            lvalue = self.apply_unary(u, lvalue)?;
        }

        Ok(lvalue)
    }

    fn apply_unary(&mut self, u: UnaryOp, lvalue: bool) -> Result<bool> {
        let line = self.line();
        match u {
            UnaryOp::Deref => {
                if lvalue {
                    self.emit.emit0(op::DEREF, line)?;
                }
                Ok(true)
            }
            UnaryOp::AddrOf => {
                if !lvalue {
                    fatal!(line, "address-of requires an lvalue");
                }
                Ok(false)
            }
            UnaryOp::Neg => {
                if lvalue {
                    self.emit.emit0(op::DEREF, line)?;
                }
                self.emit.emit0(op::NEG, line)?;
                Ok(false)
            }
        }
    }

    fn parse_primary(&mut self) -> Result<bool> {
        let line = self.line();
        match self.next()? {
            Token::LParen => {
                let lvalue = self.expr(1, false)?;
                self.expect(Token::RParen)?;
                Ok(lvalue)
            }
            Token::Literal(v) => {
                self.emit.emit1(op::CONST, v, line)?;
                Ok(false)
            }
            Token::Symbol(sym) => {
                if self.found(Token::LParen)? {
                    self.parse_call(sym, line)?;
                    Ok(false)
                } else {
                    self.push_symbol(sym, line)
                }
            }
            other => fatal!(line, "expected literal or identifier, found {other:?}"),
        }
    }

    /// Resolves an identifier use against locals, then arguments, then
    /// globals (first match wins; shadowing). Arrays decay to their
    /// address, which makes the reference an rvalue rather than an lvalue.
    fn push_symbol(&mut self, sym: Name, line: u32) -> Result<bool> {
        if let Some(i) = self.syms.locals.iter().position(|e| e.name == sym) {
            self.emit.emit1(op::GETAL, i as i32, line)?;
            return Ok(true);
        }
        if let Some(i) = self.syms.args.iter().position(|e| e.name == sym) {
            let n = self.syms.args.len() as i32;
            self.emit.emit1(op::GETAA, n - 1 - i as i32, line)?;
            return Ok(true);
        }
        if let Some(g) = self.syms.globals.iter().find(|e| e.name == sym) {
            let offset = g.offset as i32;
            let is_array = g.size > 0;
            self.emit.emit1(op::GETAG, offset, line)?;
            return Ok(!is_array);
        }
        fatal!(line, "unknown identifier");
    }

    fn parse_call(&mut self, sym: Name, line: u32) -> Result<()> {
        let mut argc = 0u32;
        if !self.found(Token::RParen)? {
            loop {
                self.expr(1, true)?;
                argc += 1;
                if !self.found(Token::Comma)? {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }

        if sym == self.syms.putchar {
            self.emit.emit1(op::SCALL, sym.as_i32(), line)?;
        } else {
            let f = self
                .syms
                .find_function(sym)
                .ok_or_else(|| Fatal::new(line, "unknown function"))?;
            if f.arg_count != argc {
                fatal!(line, "wrong number of arguments");
            }
            let addr = f.code_offset;
            self.emit.emit1(op::CALL, addr, line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::emit::op;

    fn compile(src: &str) -> Vec<i32> {
        let mut c = Compiler::new(src.as_bytes()).unwrap();
        c.compile().unwrap();
        c.emit.code
    }

    #[test]
    fn scenario_return_literal() {
        let code = compile("int main(){ return 1; }");
        assert_eq!(
            &code[2..],
            &[op::CONST, 1, op::RETURN, 0, op::CONST, 0, op::RETURN, 0]
        );
    }

    #[test]
    fn scenario_local_assignment() {
        let code = compile("int main(){ int a; a = 1; }");
        assert_eq!(
            &code[2..],
            &[
                op::ALLOC, 1,
                op::GETAL, 0, op::CONST, 1, 1 /* ASSIGN */, op::DROP,
                op::CONST, 0, op::RETURN, 0,
            ]
        );
    }

    #[test]
    fn scenario_global_roundtrips_through_getag() {
        let code = compile("int g; int main(){ g = 5; return g; }");
        assert_eq!(code[1], 1);
        assert!(code.contains(&op::GETAG));
    }

    #[test]
    fn scenario_array_global_patches_alloc_to_its_size() {
        let code = compile("int prime[33]; int main(){ return 0; }");
        assert_eq!(code[1], 33);
    }

    #[test]
    fn main_with_arguments_is_rejected() {
        let mut c = Compiler::new(b"int main(int a){ return a; }").unwrap();
        assert!(c.compile().is_err());
    }

    #[test]
    fn putchar_emits_scall_not_call() {
        let code = compile("int main(){ putchar(65); return 0; }");
        assert!(code.contains(&op::SCALL));
        assert!(!code[2..].contains(&op::CALL));
    }

    #[test]
    fn if_else_patches_both_branches() {
        let code = compile("int main(){ if (1) { return 1; } else { return 2; } return 0; }");
        assert!(!code.contains(&-1));
    }

    #[test]
    fn for_loop_has_no_unpatched_sentinels() {
        let code = compile("int main(){ int i; for (i = 0; i < 10; i = i + 1) { putchar(i); } return 0; }");
        assert!(!code.contains(&-1));
    }

    #[test]
    fn empty_for_synthesizes_const_one_condition() {
        let code = compile("int main(){ for (;;) { putchar(1); } }");
        let jnz_pos = code.iter().position(|&w| w == op::JNZ).unwrap();
        assert_eq!(code[jnz_pos - 2], op::CONST);
        assert_eq!(code[jnz_pos - 1], 1);
    }

    #[test]
    fn wrong_arity_call_is_fatal() {
        let mut c = Compiler::new(b"int f(int a){ return a; } int main(){ f(1, 2); return 0; }").unwrap();
        assert!(c.compile().is_err());
    }

    #[test]
    fn duplicate_global_is_fatal() {
        let mut c = Compiler::new(b"int a; int a; int main(){ return 0; }").unwrap();
        assert!(c.compile().is_err());
    }

    #[test]
    fn address_of_non_lvalue_is_fatal() {
        let mut c = Compiler::new(b"int main(){ return &1; }").unwrap();
        assert!(c.compile().is_err());
    }

    #[test]
    fn array_subscript_emits_add() {
        let code = compile("int prime[33]; int main(){ prime[0] = 2; return 0; }");
        assert!(code.contains(&operator_opcode(Token::Add)));
    }
}
