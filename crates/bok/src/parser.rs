//! Parser: token stream → parse tree.
//!
//! Recursive descent over the productions
//!
//! ```text
//! start     := statement*
//! statement := import | worddef | expr
//! import    := 'import' STRING
//! worddef   := '(' IDENT DOCSTR? (worddef | expr)* ')'
//! expr      := atom | list | call | var | dot | operator | array
//! list      := '[' expr* ']'
//! ```
//!
//! The tree is purely syntactic; names are rewritten by the scope pass and
//! resolved during lowering.

use crate::error::{Error, Result};
use crate::lexer::{self, Token, TokenKind};

/// One parse tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Node>),
    /// Bare identifier reference.
    Call(String),
    /// Dotted (qualified) reference.
    Dot(String),
    /// `:name` variable assignment.
    Var(String),
    /// Symbolic builtin.
    Operator(&'static str),
    /// `@path` array-backend reference.
    Array(String),
    Word {
        name: String,
        doc: Option<String>,
        body: Vec<Node>,
    },
    Import(String),
}

/// Parse a whole program into a list of top-level nodes.
pub fn parse(source: &str) -> Result<Vec<Node>> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut nodes = Vec::new();
    while !parser.at_end() {
        nodes.push(parser.statement()?);
    }
    Ok(nodes)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, token: &Token) -> Error {
        Error::Parse {
            line: token.line,
            column: token.column,
            message: token.kind.describe(),
        }
    }

    fn end_of_input(&self) -> Error {
        let (line, column) = self
            .tokens
            .last()
            .map_or((1, 1), |t| (t.line, t.column));
        Error::Parse {
            line,
            column,
            message: "end of input".to_string(),
        }
    }

    fn statement(&mut self) -> Result<Node> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Import) => {
                self.bump();
                match self.bump() {
                    Some(Token {
                        kind: TokenKind::Str { value, .. },
                        ..
                    }) => Ok(Node::Import(value)),
                    Some(token) => Err(self.unexpected(&token)),
                    None => Err(self.end_of_input()),
                }
            }
            Some(TokenKind::LParen) => self.worddef(),
            _ => self.expr(),
        }
    }

    fn worddef(&mut self) -> Result<Node> {
        self.bump(); // '('
        let name = match self.bump() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => name,
            Some(token) => return Err(self.unexpected(&token)),
            None => return Err(self.end_of_input()),
        };

        // A d-affixed string in the first body position is the docstring.
        let doc = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Str { value, doc: true }) => {
                let doc = value.clone();
                self.bump();
                Some(doc)
            }
            _ => Option::None,
        };

        let mut body = Vec::new();
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::RParen) => {
                    self.bump();
                    break;
                }
                Some(TokenKind::LParen) => body.push(self.worddef()?),
                Some(_) => body.push(self.expr()?),
                None => return Err(self.end_of_input()),
            }
        }
        Ok(Node::Word { name, doc, body })
    }

    fn list(&mut self) -> Result<Node> {
        self.bump(); // '['
        let mut items = Vec::new();
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::RBracket) => {
                    self.bump();
                    break;
                }
                Some(_) => items.push(self.expr()?),
                None => return Err(self.end_of_input()),
            }
        }
        Ok(Node::List(items))
    }

    fn expr(&mut self) -> Result<Node> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.end_of_input());
        };
        match token.kind {
            TokenKind::LBracket => self.list(),
            TokenKind::Int(i) => {
                self.bump();
                Ok(Node::Int(i))
            }
            TokenKind::Float(x) => {
                self.bump();
                Ok(Node::Float(x))
            }
            TokenKind::Str { value, .. } => {
                self.bump();
                Ok(Node::Str(value))
            }
            TokenKind::True => {
                self.bump();
                Ok(Node::Bool(true))
            }
            TokenKind::False => {
                self.bump();
                Ok(Node::Bool(false))
            }
            TokenKind::None => {
                self.bump();
                Ok(Node::None)
            }
            TokenKind::Ident(name) => {
                self.bump();
                Ok(Node::Call(name))
            }
            TokenKind::Dotted(name) => {
                self.bump();
                Ok(Node::Dot(name))
            }
            TokenKind::ArrayPath(path) => {
                self.bump();
                Ok(Node::Array(path))
            }
            TokenKind::Operator(op) => {
                self.bump();
                Ok(Node::Operator(op))
            }
            TokenKind::Colon => {
                self.bump();
                match self.bump() {
                    Some(Token {
                        kind: TokenKind::Ident(name),
                        ..
                    }) => Ok(Node::Var(name)),
                    Some(token) => Err(self.unexpected(&token)),
                    None => Err(self.end_of_input()),
                }
            }
            TokenKind::LParen | TokenKind::RParen | TokenKind::RBracket | TokenKind::Import => {
                Err(self.unexpected(&token))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals_and_calls() {
        let nodes = parse("1 2.5 'hi' True None dup std.sq :x +").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Int(1),
                Node::Float(2.5),
                Node::Str("hi".into()),
                Node::Bool(true),
                Node::None,
                Node::Call("dup".into()),
                Node::Dot("std.sq".into()),
                Node::Var("x".into()),
                Node::Operator("+"),
            ]
        );
    }

    #[test]
    fn parses_word_with_docstring() {
        let nodes = parse("(square d'( x -- x*x )' :x x x *)").unwrap();
        let Node::Word { name, doc, body } = &nodes[0] else {
            panic!("expected word definition");
        };
        assert_eq!(name, "square");
        assert_eq!(doc.as_deref(), Some("( x -- x*x )"));
        assert_eq!(body.len(), 4);
    }

    #[test]
    fn plain_first_string_is_not_a_docstring() {
        let nodes = parse("(greet 'hello' println)").unwrap();
        let Node::Word { doc, body, .. } = &nodes[0] else {
            panic!("expected word definition");
        };
        assert!(doc.is_none());
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn parses_nested_lists_and_words() {
        let nodes = parse("(outer (inner 1) [1 [2]] inner)").unwrap();
        let Node::Word { body, .. } = &nodes[0] else {
            panic!("expected word definition");
        };
        assert!(matches!(body[0], Node::Word { .. }));
        assert!(matches!(body[1], Node::List(_)));
    }

    #[test]
    fn rejects_unbalanced_input() {
        assert!(parse("[1 2").is_err());
        assert!(parse("(word").is_err());
        assert!(parse(")").is_err());
        assert!(parse("import").is_err());
    }
}
