//! Tokenizer for the surface syntax.
//!
//! The language is token-oriented: whitespace and `#` comments separate
//! tokens, brackets and parens are always their own tokens, and symbolic
//! operators lex with maximal munch (`>**` before `>*` before `>>` before
//! `>=` before `>`). Every token carries its (line, column) so parse errors
//! can point at the offending input.

use crate::error::{Error, Result};

/// One lexed token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    /// String literal. `doc` is set when the literal carried the `d` affix
    /// (a docstring candidate when it opens a word body).
    Str { value: String, doc: bool },
    True,
    False,
    None,
    Import,
    Ident(String),
    /// Dotted identifier path (`mod.word`).
    Dotted(String),
    /// `@` array-backend path (`@linalg.norm`, stored without the `@`).
    ArrayPath(String),
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    /// A symbolic builtin name (`+`, `>=`, `>**`, …).
    Operator(&'static str),
}

impl TokenKind {
    /// Short rendering used in parse error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Int(i) => format!("token {i}"),
            Self::Float(x) => format!("token {x}"),
            Self::Str { value, .. } => format!("string {value:?}"),
            Self::True => "token True".into(),
            Self::False => "token False".into(),
            Self::None => "token None".into(),
            Self::Import => "token import".into(),
            Self::Ident(s) | Self::Dotted(s) => format!("token {s}"),
            Self::ArrayPath(s) => format!("token @{s}"),
            Self::Colon => "token :".into(),
            Self::LParen => "token (".into(),
            Self::RParen => "token )".into(),
            Self::LBracket => "token [".into(),
            Self::RBracket => "token ]".into(),
            Self::Operator(op) => format!("token {op}"),
        }
    }
}

/// Longest-match first. Order matters.
const OPERATORS: &[&str] = &[
    ">**", ">*", ">>", ">=", "<<", "<=", "==", "!=", "**", "//", "++", "--", "+", "-", "*", "/",
    "%", "<", ">", "~", "&", "|", "^",
];

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

/// Tokenize a whole source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer {
        src: source.as_bytes(),
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> Error {
        Error::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.bump();
            } else if c == b'#' {
                while let Some(c) = self.peek() {
                    if c == b'\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_trivia();
        let (line, column) = (self.line, self.column);
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            b'(' => {
                self.bump();
                TokenKind::LParen
            }
            b')' => {
                self.bump();
                TokenKind::RParen
            }
            b'[' => {
                self.bump();
                TokenKind::LBracket
            }
            b']' => {
                self.bump();
                TokenKind::RBracket
            }
            b':' => {
                self.bump();
                TokenKind::Colon
            }
            b'@' => {
                self.bump();
                let path = self.lex_dotted_path(line, column)?;
                TokenKind::ArrayPath(path)
            }
            b'\'' | b'"' => self.lex_string("", line, column)?,
            b'0'..=b'9' => self.lex_number(line, column)?,
            b'+' | b'-' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                self.lex_number(line, column)?
            }
            c if c.is_ascii_alphabetic() || c == b'_' => self.lex_word(line, column)?,
            _ => self.lex_operator(line, column)?,
        };

        Ok(Some(Token { kind, line, column }))
    }

    fn lex_operator(&mut self, line: usize, column: usize) -> Result<TokenKind> {
        let rest = &self.src[self.pos..];
        for op in OPERATORS {
            if rest.starts_with(op.as_bytes()) {
                for _ in 0..op.len() {
                    self.bump();
                }
                return Ok(TokenKind::Operator(op));
            }
        }
        let c = self.src[self.pos] as char;
        Err(self.error(line, column, format!("character {c:?}")))
    }

    fn lex_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.bump();
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn lex_dotted_path(&mut self, line: usize, column: usize) -> Result<String> {
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == b'_') {
            return Err(self.error(line, column, "character '@'".to_string()));
        }
        let mut path = self.lex_ident();
        while self.peek() == Some(b'.')
            && self
                .peek_at(1)
                .is_some_and(|c| c.is_ascii_alphabetic() || c == b'_')
        {
            self.bump();
            path.push('.');
            path.push_str(&self.lex_ident());
        }
        Ok(path)
    }

    fn lex_word(&mut self, line: usize, column: usize) -> Result<TokenKind> {
        let ident = self.lex_ident();

        // A run of affix letters directly against a quote is a prefixed
        // string literal (`d"..."`, `rb'...'`, ...).
        if !ident.is_empty()
            && ident.len() <= 3
            && ident.bytes().all(|c| matches!(c, b'd' | b'b' | b'r'))
            && matches!(self.peek(), Some(b'\'' | b'"'))
        {
            return self.lex_string(&ident, line, column);
        }

        Ok(match ident.as_str() {
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            "import" => TokenKind::Import,
            _ => {
                if self.peek() == Some(b'.')
                    && self
                        .peek_at(1)
                        .is_some_and(|c| c.is_ascii_alphabetic() || c == b'_')
                {
                    let mut path = ident;
                    while self.peek() == Some(b'.')
                        && self
                            .peek_at(1)
                            .is_some_and(|c| c.is_ascii_alphabetic() || c == b'_')
                    {
                        self.bump();
                        path.push('.');
                        path.push_str(&self.lex_ident());
                    }
                    TokenKind::Dotted(path)
                } else {
                    TokenKind::Ident(ident)
                }
            }
        })
    }

    fn lex_string(&mut self, affixes: &str, line: usize, column: usize) -> Result<TokenKind> {
        let raw = affixes.contains('r');
        let doc = affixes.contains('d');
        let quote = self.bump().expect("caller checked the opening quote");
        let mut value = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error(line, column, "end of input in string".to_string()));
            };
            match c {
                c if c == quote => break,
                b'\\' if !raw => {
                    let Some(esc) = self.bump() else {
                        return Err(self.error(line, column, "end of input in string".to_string()));
                    };
                    match esc {
                        b'n' => value.push('\n'),
                        b't' => value.push('\t'),
                        b'r' => value.push('\r'),
                        b'0' => value.push('\0'),
                        b'\\' => value.push('\\'),
                        b'\'' => value.push('\''),
                        b'"' => value.push('"'),
                        other => {
                            value.push('\\');
                            value.push(other as char);
                        }
                    }
                }
                _ => {
                    // Re-assemble multi-byte characters that bump() split.
                    if c < 0x80 {
                        value.push(c as char);
                    } else {
                        let start = self.pos - 1;
                        let mut end = self.pos;
                        while end < self.src.len() && (self.src[end] & 0xC0) == 0x80 {
                            end += 1;
                            self.bump();
                        }
                        value.push_str(&String::from_utf8_lossy(&self.src[start..end]));
                    }
                }
            }
        }
        Ok(TokenKind::Str { value, doc })
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Result<TokenKind> {
        let start = self.pos;
        let negative = match self.peek() {
            Some(b'-') => {
                self.bump();
                true
            }
            Some(b'+') => {
                self.bump();
                false
            }
            _ => false,
        };

        // Radix-prefixed integer literals.
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B')) {
            self.bump();
            let radix = match self.bump().expect("prefix checked") {
                b'x' | b'X' => 16,
                b'o' | b'O' => 8,
                _ => 2,
            };
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
                self.bump();
            }
            let digits = std::str::from_utf8(&self.src[digits_start..self.pos]).unwrap_or("");
            let magnitude = i64::from_str_radix(digits, radix)
                .map_err(|_| self.error(line, column, format!("number literal {digits:?}")))?;
            return Ok(TokenKind::Int(if negative { -magnitude } else { magnitude }));
        }

        let mut is_float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit() || c.is_ascii_whitespace()) {
            is_float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), Some(b'+' | b'-')) {
                lookahead = 2;
            }
            if self.peek_at(lookahead).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..=lookahead {
                    self.bump();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }

        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.error(line, column, format!("number literal {text:?}")))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| self.error(line, column, format!("number literal {text:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1 -2 0x1f 0o17 0b101 2.5 1e3 -1.5e-2"),
            vec![
                TokenKind::Int(1),
                TokenKind::Int(-2),
                TokenKind::Int(31),
                TokenKind::Int(15),
                TokenKind::Int(5),
                TokenKind::Float(2.5),
                TokenKind::Float(1000.0),
                TokenKind::Float(-0.015),
            ]
        );
    }

    #[test]
    fn operators_maximal_munch() {
        assert_eq!(
            kinds(">** >* >> >= > ** * // / ++ --"),
            vec![
                TokenKind::Operator(">**"),
                TokenKind::Operator(">*"),
                TokenKind::Operator(">>"),
                TokenKind::Operator(">="),
                TokenKind::Operator(">"),
                TokenKind::Operator("**"),
                TokenKind::Operator("*"),
                TokenKind::Operator("//"),
                TokenKind::Operator("/"),
                TokenKind::Operator("++"),
                TokenKind::Operator("--"),
            ]
        );
    }

    #[test]
    fn strings_and_affixes() {
        assert_eq!(
            kinds(r#"'a' "b\n" r'c\n' d'doc'"#),
            vec![
                TokenKind::Str { value: "a".into(), doc: false },
                TokenKind::Str { value: "b\n".into(), doc: false },
                TokenKind::Str { value: "c\\n".into(), doc: false },
                TokenKind::Str { value: "doc".into(), doc: true },
            ]
        );
    }

    #[test]
    fn idents_keywords_paths() {
        assert_eq!(
            kinds("dup True None import std.sq @linalg.norm :x"),
            vec![
                TokenKind::Ident("dup".into()),
                TokenKind::True,
                TokenKind::None,
                TokenKind::Import,
                TokenKind::Dotted("std.sq".into()),
                TokenKind::ArrayPath("linalg.norm".into()),
                TokenKind::Colon,
                TokenKind::Ident("x".into()),
            ]
        );
    }

    #[test]
    fn comments_and_positions() {
        let tokens = tokenize("1 # one\n  2").unwrap();
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].column, 3);
    }

    #[test]
    fn rejects_stray_characters() {
        assert!(tokenize("a $ b").is_err());
        assert!(tokenize("'unterminated").is_err());
    }
}
