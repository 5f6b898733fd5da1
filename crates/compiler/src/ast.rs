//! Abstract syntax tree for Rexion
//!
//! A tagged sum over the statement forms the grammar admits. Class
//! inheritance in the source language is just a sequence of base names on
//! the `Class` node; order is preserved.

use rexion_core::token::TokenKind;

/// Member visibility inside a class body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        }
    }

    /// Map a visibility keyword token to its modifier.
    pub fn from_kind(kind: TokenKind) -> Option<Visibility> {
        match kind {
            TokenKind::Public => Some(Visibility::Public),
            TokenKind::Private => Some(Visibility::Private),
            TokenKind::Protected => Some(Visibility::Protected),
            _ => None,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `define name : type;`
    Define { name: String, type_name: String },
    /// `func name() { body }`
    Func { name: String, body: Vec<Statement> },
    /// `print ident;`
    Print { ident: String },
    /// `class Name extends/inherit Base1, Base2 { members }`
    ///
    /// At least one base follows `extends`/`inherit` when the clause is
    /// present; multiple bases are legal and kept in source order.
    Class {
        name: String,
        bases: Vec<String>,
        members: Vec<Statement>,
    },
    /// `public|private|protected` followed by a `func` or `define`.
    Visibility {
        visibility: Visibility,
        inner: Box<Statement>,
    },
    /// `new Type();`
    New { type_name: String },
    /// `super.method();`
    SuperCall { method: String },
    /// `this;`, `this.member;`, or `this.method();`
    ThisAccess {
        member: Option<String>,
        is_call: bool,
    },
    /// `eval(operand);` where the operand is an identifier, number, or
    /// string literal.
    Eval { expr: String },
    /// A feature keyword statement (raytracing, morphing, ...). Parsed and
    /// recorded; carries no semantics beyond a pass-through annotation.
    Feature { kind: TokenKind, lexeme: String },
}

/// A parsed compilation unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}

/// Stable tree serialization, one node per line with two-space indentation.
/// Two parses of the same token sequence render byte-identically.
impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Program")?;
        for statement in &self.statements {
            fmt_statement(f, statement, 1)?;
        }
        Ok(())
    }
}

fn fmt_statement(
    f: &mut std::fmt::Formatter<'_>,
    statement: &Statement,
    depth: usize,
) -> std::fmt::Result {
    let pad = "  ".repeat(depth);
    match statement {
        Statement::Define { name, type_name } => {
            writeln!(f, "{}Define {} : {}", pad, name, type_name)
        }
        Statement::Func { name, body } => {
            writeln!(f, "{}Func {}()", pad, name)?;
            for inner in body {
                fmt_statement(f, inner, depth + 1)?;
            }
            Ok(())
        }
        Statement::Print { ident } => writeln!(f, "{}Print {}", pad, ident),
        Statement::Class {
            name,
            bases,
            members,
        } => {
            if bases.is_empty() {
                writeln!(f, "{}Class {}", pad, name)?;
            } else {
                writeln!(f, "{}Class {} : {}", pad, name, bases.join(", "))?;
            }
            for member in members {
                fmt_statement(f, member, depth + 1)?;
            }
            Ok(())
        }
        Statement::Visibility { visibility, inner } => {
            writeln!(f, "{}{}", pad, visibility)?;
            fmt_statement(f, inner, depth + 1)
        }
        Statement::New { type_name } => writeln!(f, "{}New {}", pad, type_name),
        Statement::SuperCall { method } => writeln!(f, "{}Super .{}()", pad, method),
        Statement::ThisAccess { member, is_call } => match (member, is_call) {
            (Some(member), true) => writeln!(f, "{}This .{}()", pad, member),
            (Some(member), false) => writeln!(f, "{}This .{}", pad, member),
            _ => writeln!(f, "{}This", pad),
        },
        Statement::Eval { expr } => writeln!(f, "{}Eval {}", pad, expr),
        Statement::Feature { lexeme, .. } => writeln!(f, "{}Feature {}", pad, lexeme),
    }
}
