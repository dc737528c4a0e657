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

pub mod disasm;
pub mod emit;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod token;
