//! Compiler error type
//!
//! Every stage either succeeds and hands its artifact to the next, or
//! terminates the pipeline with one of these. The driver maps the variant
//! to the process exit code: syntax-level failures exit 2, everything else
//! exits 1.

use rexion_core::target::Target;
use rexion_core::token::TokenKind;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CompileError {
    /// Cannot open, read, or write a file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The parser found something other than what the grammar requires.
    Syntax {
        expected: TokenKind,
        found: TokenKind,
        lexeme: String,
        line: usize,
        column: usize,
    },
    /// A visibility modifier must be followed by `func` or `define`.
    VisibilityTarget {
        found: TokenKind,
        line: usize,
        column: usize,
    },
    /// Class bodies cannot contain further classes.
    NestedClass { name: String },
    /// The symbol table ran out of registers.
    SymbolCapacity { limit: usize },
    /// The selected backend has no implementation.
    UnsupportedTarget(Target),
    /// Macro metadata problem that cannot be reduced to a warning
    /// (e.g. exporting a bundle with no backing metadata file).
    Metadata { path: PathBuf, message: String },
}

impl CompileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure: 2 for syntax-level errors,
    /// 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Syntax { .. }
            | CompileError::VisibilityTarget { .. }
            | CompileError::NestedClass { .. } => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Io { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            CompileError::Syntax {
                expected,
                found,
                lexeme,
                line,
                column,
            } => write!(
                f,
                "syntax error at {}:{}: expected {}, found {} '{}'",
                line + 1,
                column + 1,
                expected,
                found,
                lexeme
            ),
            CompileError::VisibilityTarget {
                found,
                line,
                column,
            } => write!(
                f,
                "syntax error at {}:{}: expected function or variable after visibility modifier, found {}",
                line + 1,
                column + 1,
                found
            ),
            CompileError::NestedClass { name } => {
                write!(f, "nested class '{}' is not supported", name)
            }
            CompileError::SymbolCapacity { limit } => {
                write!(f, "symbol table capacity exceeded (limit {})", limit)
            }
            CompileError::UnsupportedTarget(target) => {
                write!(f, "unsupported architecture: {}", target)
            }
            CompileError::Metadata { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<rexion_core::symtab::CapacityError> for CompileError {
    fn from(e: rexion_core::symtab::CapacityError) -> Self {
        CompileError::SymbolCapacity { limit: e.limit }
    }
}
