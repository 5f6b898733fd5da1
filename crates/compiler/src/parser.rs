//! Recursive-descent parser for Rexion
//!
//! Consumes the token sequence from [`crate::lexer::lex`] and builds a
//! [`Program`]. A failed `expect` produces a structured syntax error that
//! propagates to the driver (which maps it to exit code 2). An unknown
//! statement start is not fatal: the parser logs a warning, skips one token,
//! and resynchronizes on the next statement.
//!
//! Grammar (essential productions):
//!
//! ```text
//! Program   := Statement*
//! Statement := Define | Func | Print | Class | Visibility
//!            | New | Super | This | Eval | FeatureStmt
//! Define    := 'define' IDENT ':' IDENT ';'
//! Func      := 'func' IDENT '(' ')' '{' Statement* '}'
//! Print     := 'print' IDENT ';'
//! Class     := 'class' IDENT ( ('extends'|'inherit') IDENT (',' IDENT)* )?
//!              '{' Statement* '}'
//! Visibility:= ('public'|'private'|'protected') (Func | Define)
//! New       := 'new' IDENT '(' ')' ';'
//! Super     := 'super' '.' IDENT '(' ')' ';'
//! This      := 'this' ( '.' IDENT ( '(' ')' )? )? ';'
//! Eval      := 'eval' '(' (IDENT|NUMBER|STRING) ')' ';'
//! FeatureStmt := FeatureKeyword ';'?
//! ```
//!
//! `extends` and `inherit` are interchangeable for base lists.

use crate::ast::{Program, Statement, Visibility};
use crate::error::CompileError;
use rexion_core::token::{Token, TokenKind};
use tracing::warn;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// The token sequence should end in `EOF` (the lexer guarantees this);
    /// a terminal `EOF` is appended if missing.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.column))
                .unwrap_or((0, 0));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        Parser { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, CompileError> {
        let mut program = Program::new();
        while !self.at_end() {
            if let Some(statement) = self.parse_statement()? {
                program.statements.push(statement);
            }
        }
        Ok(program)
    }

    fn peek(&self) -> &Token {
        // The sequence ends in EOF and advance() never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consume a token of the expected kind or produce a syntax error.
    fn expect(&mut self, expected: TokenKind) -> Result<Token, CompileError> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(CompileError::Syntax {
                expected,
                found: found.kind,
                lexeme: found.text.clone(),
                line: found.line,
                column: found.column,
            })
        }
    }

    /// Parse one statement. Returns `None` when an unknown statement start
    /// was skipped (resync) so the caller just continues.
    fn parse_statement(&mut self) -> Result<Option<Statement>, CompileError> {
        let kind = self.peek().kind;
        let statement = match kind {
            TokenKind::Define => self.parse_define()?,
            TokenKind::Func => self.parse_func()?,
            TokenKind::Print => self.parse_print()?,
            TokenKind::Class => self.parse_class()?,
            TokenKind::Public | TokenKind::Private | TokenKind::Protected => {
                self.parse_visibility()?
            }
            TokenKind::New => self.parse_new()?,
            TokenKind::Super => self.parse_super()?,
            TokenKind::This => self.parse_this()?,
            TokenKind::Eval => self.parse_eval()?,
            _ if kind.is_feature() => self.parse_feature()?,
            _ => {
                let tok = self.advance();
                warn!(
                    "unknown statement start {} '{}' at {}:{}, skipping",
                    tok.kind,
                    tok.text,
                    tok.line + 1,
                    tok.column + 1
                );
                return Ok(None);
            }
        };
        Ok(Some(statement))
    }

    fn parse_define(&mut self) -> Result<Statement, CompileError> {
        self.expect(TokenKind::Define)?;
        let name = self.expect(TokenKind::Ident)?.text;
        self.expect(TokenKind::Colon)?;
        let type_name = self.expect(TokenKind::Ident)?.text;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Define { name, type_name })
    }

    fn parse_func(&mut self) -> Result<Statement, CompileError> {
        self.expect(TokenKind::Func)?;
        let name = self.expect(TokenKind::Ident)?.text;
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        let body = self.parse_block()?;
        self.expect(TokenKind::RBrace)?;
        Ok(Statement::Func { name, body })
    }

    fn parse_print(&mut self) -> Result<Statement, CompileError> {
        self.expect(TokenKind::Print)?;
        let ident = self.expect(TokenKind::Ident)?.text;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Print { ident })
    }

    fn parse_class(&mut self) -> Result<Statement, CompileError> {
        self.expect(TokenKind::Class)?;
        let name = self.expect(TokenKind::Ident)?.text;

        // 'extends' and 'inherit' are accepted interchangeably; bases are
        // comma-separated and order is preserved.
        let mut bases = Vec::new();
        if self.check(TokenKind::Extends) || self.check(TokenKind::Inherit) {
            self.advance();
            bases.push(self.expect(TokenKind::Ident)?.text);
            while self.check(TokenKind::Comma) {
                self.advance();
                bases.push(self.expect(TokenKind::Ident)?.text);
            }
        }

        self.expect(TokenKind::LBrace)?;
        let members = self.parse_block()?;
        self.expect(TokenKind::RBrace)?;
        Ok(Statement::Class {
            name,
            bases,
            members,
        })
    }

    /// Statements until a closing brace or EOF (func bodies, class bodies).
    fn parse_block(&mut self) -> Result<Vec<Statement>, CompileError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            if let Some(statement) = self.parse_statement()? {
                statements.push(statement);
            }
        }
        Ok(statements)
    }

    fn parse_visibility(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance();
        let visibility = match Visibility::from_kind(tok.kind) {
            Some(v) => v,
            None => {
                // parse_statement only dispatches here on visibility kinds.
                return Err(CompileError::VisibilityTarget {
                    found: tok.kind,
                    line: tok.line,
                    column: tok.column,
                });
            }
        };
        let inner = match self.peek().kind {
            TokenKind::Func => self.parse_func()?,
            TokenKind::Define => self.parse_define()?,
            other => {
                let found = self.peek();
                return Err(CompileError::VisibilityTarget {
                    found: other,
                    line: found.line,
                    column: found.column,
                });
            }
        };
        Ok(Statement::Visibility {
            visibility,
            inner: Box::new(inner),
        })
    }

    fn parse_new(&mut self) -> Result<Statement, CompileError> {
        self.expect(TokenKind::New)?;
        let type_name = self.expect(TokenKind::Ident)?.text;
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::New { type_name })
    }

    fn parse_super(&mut self) -> Result<Statement, CompileError> {
        self.expect(TokenKind::Super)?;
        self.expect(TokenKind::Dot)?;
        let method = self.expect(TokenKind::Ident)?.text;
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::SuperCall { method })
    }

    fn parse_this(&mut self) -> Result<Statement, CompileError> {
        self.expect(TokenKind::This)?;
        let mut member = None;
        let mut is_call = false;
        if self.check(TokenKind::Dot) {
            self.advance();
            member = Some(self.expect(TokenKind::Ident)?.text);
            if self.check(TokenKind::LParen) {
                self.advance();
                self.expect(TokenKind::RParen)?;
                is_call = true;
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(Statement::ThisAccess { member, is_call })
    }

    fn parse_eval(&mut self) -> Result<Statement, CompileError> {
        self.expect(TokenKind::Eval)?;
        self.expect(TokenKind::LParen)?;
        let expr = match self.peek().kind {
            TokenKind::Ident | TokenKind::Number | TokenKind::Str => self.advance().text,
            _ => {
                // The operand must be an identifier, number, or string.
                let found = self.peek();
                return Err(CompileError::Syntax {
                    expected: TokenKind::Ident,
                    found: found.kind,
                    lexeme: found.text.clone(),
                    line: found.line,
                    column: found.column,
                });
            }
        };
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Eval { expr })
    }

    fn parse_feature(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance();
        // The trailing semicolon is optional for feature statements.
        if self.check(TokenKind::Semi) {
            self.advance();
        }
        Ok(Statement::Feature {
            kind: tok.kind,
            lexeme: tok.text,
        })
    }
}

/// Lex and parse in one step.
pub fn parse_source(source: &str) -> Result<Program, CompileError> {
    Parser::new(crate::lexer::lex(source)).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rexion_core::token::TokenKind;

    fn parse(source: &str) -> Program {
        parse_source(source).expect("source should parse")
    }

    #[test]
    fn test_define_and_print() {
        let program = parse("define x : int;\nprint x;\n");
        assert_eq!(
            program.statements,
            vec![
                Statement::Define {
                    name: "x".to_string(),
                    type_name: "int".to_string(),
                },
                Statement::Print {
                    ident: "x".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_func_with_body() {
        let program = parse("func main() { print x; }");
        match &program.statements[0] {
            Statement::Func { name, body } => {
                assert_eq!(name, "main");
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected func, got {:?}", other),
        }
    }

    #[test]
    fn test_class_with_multiple_bases() {
        let program = parse("class Dog inherit Animal, Pet { public func speak() {} }");
        match &program.statements[0] {
            Statement::Class {
                name,
                bases,
                members,
            } => {
                assert_eq!(name, "Dog");
                assert_eq!(bases, &["Animal".to_string(), "Pet".to_string()]);
                assert_eq!(members.len(), 1);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_extends_and_inherit_are_interchangeable() {
        let a = parse("class Dog extends Animal {}");
        let b = parse("class Dog inherit Animal {}");
        assert_eq!(a, b);
    }

    #[test]
    fn test_base_order_is_preserved() {
        let program = parse("class C inherit B3, B1, B2 {}");
        match &program.statements[0] {
            Statement::Class { bases, .. } => {
                assert_eq!(bases, &["B3", "B1", "B2"]);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_visibility_wraps_define_and_func() {
        let program = parse("class C { private define breed : String; public func speak() {} }");
        match &program.statements[0] {
            Statement::Class { members, .. } => {
                assert!(matches!(
                    &members[0],
                    Statement::Visibility {
                        visibility: Visibility::Private,
                        ..
                    }
                ));
                assert!(matches!(
                    &members[1],
                    Statement::Visibility {
                        visibility: Visibility::Public,
                        ..
                    }
                ));
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_visibility_requires_func_or_define() {
        let err = parse_source("public print x;").unwrap_err();
        assert!(matches!(err, CompileError::VisibilityTarget { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_new_super_this() {
        let program = parse("new Dog();\nsuper.speak();\nthis.fetch();\nthis.name;\nthis;\n");
        assert_eq!(
            program.statements,
            vec![
                Statement::New {
                    type_name: "Dog".to_string(),
                },
                Statement::SuperCall {
                    method: "speak".to_string(),
                },
                Statement::ThisAccess {
                    member: Some("fetch".to_string()),
                    is_call: true,
                },
                Statement::ThisAccess {
                    member: Some("name".to_string()),
                    is_call: false,
                },
                Statement::ThisAccess {
                    member: None,
                    is_call: false,
                },
            ]
        );
    }

    #[test]
    fn test_eval_operands() {
        let program = parse("eval(x);\neval(42);\neval(\"s\");\n");
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(&program.statements[1], Statement::Eval { expr } if expr == "42"));
    }

    #[test]
    fn test_eval_requires_operand() {
        assert!(parse_source("eval();").is_err());
    }

    #[test]
    fn test_feature_statement_with_and_without_semi() {
        let program = parse("raytracing;\nmorphing\n");
        assert_eq!(
            program.statements,
            vec![
                Statement::Feature {
                    kind: TokenKind::Raytracing,
                    lexeme: "raytracing".to_string(),
                },
                Statement::Feature {
                    kind: TokenKind::Morphing,
                    lexeme: "morphing".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_unknown_statement_start_is_skipped() {
        // The stray number and '@' are skipped; parsing continues.
        let program = parse("42 @ print x;");
        assert_eq!(
            program.statements,
            vec![Statement::Print {
                ident: "x".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_semi_is_a_syntax_error() {
        let err = parse_source("print x").unwrap_err();
        match err {
            CompileError::Syntax {
                expected, found, ..
            } => {
                assert_eq!(expected, TokenKind::Semi);
                assert_eq!(found, TokenKind::Eof);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_class_body_reports_rbrace() {
        let err = parse_source("class C { define x : int;").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Syntax {
                expected: TokenKind::RBrace,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "class Dog inherit Animal, Pet { public func speak() { print x; } }\n\
                      define x : int;\neval(3);\nraytracing;";
        let a = format!("{:?}", parse(source));
        let b = format!("{:?}", parse(source));
        assert_eq!(a, b);
    }
}
