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

mod diagnostics;
mod lang;

use std::env::args;
use std::io::{self, Write};
use std::process::ExitCode;

/// The name of the compiler, used nowhere in diagnostics since the required
/// format is line-prefixed only, but kept for parity with the rest of the
/// CLI surface.
pub const PROGRAM_NAME: &str = "minicc";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run() -> Result<(), u8> {
    let path = args().nth(1).ok_or_else(|| {
        eprintln!("usage: {PROGRAM_NAME} <source-file>");
        1u8
    })?;

    let source = std::fs::read(&path).map_err(|e| {
        eprintln!("{path}: cannot open input: {e}");
        1u8
    })?;

    let mut compiler = lang::parser::Compiler::new(&source).map_err(|e| {
        eprintln!("{e}");
        1u8
    })?;

    compiler.compile().map_err(|e| {
        eprintln!("{e}");
        1u8
    })?;

    write_output(&compiler.emit.code).map_err(|_| 1u8)
}

/// Writes the code array to standard output as a stream of raw
/// host-endian 32-bit words. Byte order is an interoperation concern with
/// whatever external virtual machine executes the code, not with this
/// compiler.
fn write_output(code: &[i32]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for &word in code {
        out.write_all(&word.to_ne_bytes())?;
    }
    out.flush()
}
