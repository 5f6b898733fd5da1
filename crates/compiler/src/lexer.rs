//! Lexer for `.r4` source text
//!
//! A single-pass scan that never fails: every non-whitespace byte run maps
//! to exactly one token, unknown characters become `UNKNOWN` tokens, and
//! the sequence always ends with `EOF`. Structural errors are the parser's
//! problem.
//!
//! Two deliberate quirks of the language's lexical definition:
//!
//! - string literals have no escape processing, and an unterminated string
//!   at end of input yields a `STRING` token with the partial body;
//! - `NUMBER` accepts digit runs only, so `3.14` lexes as
//!   `NUMBER DOT NUMBER`.

use rexion_core::token::{Token, TokenKind, kind_of, name_of};

/// Tokenize `source` into a finite sequence ending in `EOF`.
pub fn lex(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 0;
    let mut column = 0;

    // Advance one char, tracking line/column.
    fn step(pos: &mut usize, line: &mut usize, column: &mut usize, chars: &[char]) {
        if chars[*pos] == '\n' {
            *line += 1;
            *column = 0;
        } else {
            *column += 1;
        }
        *pos += 1;
    }

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            step(&mut pos, &mut line, &mut column, &chars);
            continue;
        }

        let start_line = line;
        let start_column = column;

        // Identifiers and keywords
        if c.is_ascii_alphabetic() || c == '_' {
            let mut text = String::new();
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                text.push(chars[pos]);
                step(&mut pos, &mut line, &mut column, &chars);
            }
            let kind = kind_of(&text);
            tokens.push(Token::new(kind, text, start_line, start_column));
            continue;
        }

        // Integer literals (digit runs only)
        if c.is_ascii_digit() {
            let mut text = String::new();
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                text.push(chars[pos]);
                step(&mut pos, &mut line, &mut column, &chars);
            }
            tokens.push(Token::new(TokenKind::Number, text, start_line, start_column));
            continue;
        }

        // String literals: everything up to the closing quote, verbatim.
        // No escapes; a missing closing quote ends the literal at EOF.
        if c == '"' {
            step(&mut pos, &mut line, &mut column, &chars);
            let mut text = String::new();
            while pos < chars.len() && chars[pos] != '"' {
                text.push(chars[pos]);
                step(&mut pos, &mut line, &mut column, &chars);
            }
            if pos < chars.len() {
                step(&mut pos, &mut line, &mut column, &chars); // closing quote
            }
            tokens.push(Token::new(TokenKind::Str, text, start_line, start_column));
            continue;
        }

        let kind = match c {
            '=' => TokenKind::Assign,
            ';' => TokenKind::Semi,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            _ => TokenKind::Unknown,
        };
        tokens.push(Token::new(kind, c.to_string(), start_line, start_column));
        step(&mut pos, &mut line, &mut column, &chars);
    }

    tokens.push(Token::new(TokenKind::Eof, "", line, column));
    tokens
}

/// Render the `--tokens` debug dump.
pub fn dump(tokens: &[Token]) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- Token Dump ({} tokens) ---\n", tokens.len()));
    for (i, tok) in tokens.iter().enumerate() {
        out.push_str(&format!(
            "[{:03}] {:<22} -> '{}'\n",
            i,
            name_of(tok.kind),
            tok.text
        ));
    }
    out.push_str("-----------------------------\n");
    out
}
