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

//! Compiler diagnostics.
//!
//! Every diagnostic is terminal: the compiler has no error-recovery mode,
//! so there is only one severity worth modeling, not the warning/error/
//! fatal ladder a tool that keeps going after an error would need.

use colored::Colorize;
use std::fmt::{self, Display, Formatter};

/// A fatal compiler diagnostic, carrying the source line it was raised at.
#[derive(Clone, Debug)]
pub struct Fatal {
    pub line: u32,
    pub message: String,
}

impl Fatal {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

impl Display for Fatal {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}{}", self.line, "error: ".red(), self.message)
    }
}

impl std::error::Error for Fatal {}

pub type Result<T> = std::result::Result<T, Fatal>;

/// Builds and returns a [`Fatal`] from the current scope, for use at the end
/// of a `match` arm or similar non-`?` site.
macro_rules! fatal_diag {
    ($line:expr, $($arg:tt)*) => {
        $crate::diagnostics::Fatal::new($line, format!($($arg)*))
    };
}

/// Returns early with a [`Fatal`] built from a line number and a
/// `format!`-style message. The only escape hatch a statement or expression
/// parser needs, since there is no recovery to perform.
macro_rules! fatal {
    ($line:expr, $($arg:tt)*) => {
        return Err($crate::diagnostics::fatal_diag!($line, $($arg)*))
    };
}

pub(crate) use fatal;
pub(crate) use fatal_diag;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_display_is_line_prefixed() {
        let f = Fatal::new(7, "unexpected character 'q'");
        let text = format!("{f}");
        assert!(text.ends_with("unexpected character 'q'"));
        assert!(text.starts_with("7: "));
    }
}
