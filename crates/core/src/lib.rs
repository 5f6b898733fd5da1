//! Rexion Core
//!
//! Shared data model for the Rexion compiler and its tools:
//!
//! - [`token`]: token kinds, the fixed keyword table, and the token record
//! - [`ir`]: the register-oriented IR record and its textual forms
//! - [`symtab`]: per-compilation symbol table and virtual register allocator
//! - [`target`]: emission target tag
//!
//! This crate carries no policy: lexing, parsing, lowering, and emission
//! live in `rexion-compiler`, which consumes these types.

pub mod ir;
pub mod symtab;
pub mod target;
pub mod token;

pub use ir::{IrInstruction, IrOp, format_ir_text, parse_ir_text};
pub use symtab::{CapacityError, Symbol, SymbolTable};
pub use target::Target;
pub use token::{KEYWORDS, Token, TokenKind, kind_of, name_of};
