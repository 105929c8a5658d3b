use crate::ast::Position;
use crate::lexer::{Lexer, Token, TokenType};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A literal value as written in a generated script.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(String),
    Bool(bool),
    None,
    Name(String),
    List(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub pos: Position,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (line {}, column {})", self.message, self.pos.line, self.pos.column)
    }
}

impl Error for ParseError {}

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.typ != TokenType::Comment)
            .collect();
        Self { tokens, index: 0 }
    }

    /// Parses exactly one literal followed by the end of input.
    pub fn parse_single_literal(&mut self) -> Result<Literal, ParseError> {
        self.skip_newlines();
        let literal = self.parse_literal()?;
        self.skip_newlines();
        if !self.at_end() {
            return self.error_here("Unexpected trailing input after literal.");
        }
        Ok(literal)
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let token = self.current().clone();
        match token.typ {
            TokenType::String => {
                self.index += 1;
                let mut value = token.value;
                // Adjacent string literals concatenate.
                while self.current().typ == TokenType::String {
                    value.push_str(&self.current().value);
                    self.index += 1;
                }
                Ok(Literal::Str(value))
            }
            TokenType::Number => {
                self.index += 1;
                Ok(Literal::Number(token.value))
            }
            TokenType::Op if token.value == "-" => {
                self.index += 1;
                let next = self.current().clone();
                if next.typ != TokenType::Number {
                    return self.error_here("Expected a number after '-'.");
                }
                self.index += 1;
                Ok(Literal::Number(format!("-{}", next.value)))
            }
            TokenType::Keyword => {
                self.index += 1;
                match token.value.as_str() {
                    "True" => Ok(Literal::Bool(true)),
                    "False" => Ok(Literal::Bool(false)),
                    "None" => Ok(Literal::None),
                    other => Err(ParseError {
                        message: format!("Keyword '{}' is not a literal.", other),
                        pos: token.pos,
                    }),
                }
            }
            TokenType::Ident => {
                self.index += 1;
                Ok(Literal::Name(token.value))
            }
            TokenType::LBracket => {
                self.index += 1;
                let items = self.parse_items(TokenType::RBracket, |p| p.parse_literal())?;
                Ok(Literal::List(items))
            }
            TokenType::LBrace => {
                self.index += 1;
                let entries = self.parse_items(TokenType::RBrace, |p| {
                    let key = p.parse_literal()?;
                    p.expect(TokenType::Colon, "Expected ':' in dict literal.")?;
                    let value = p.parse_literal()?;
                    Ok((key, value))
                })?;
                Ok(Literal::Dict(entries))
            }
            _ => self.error_here("Expected a literal."),
        }
    }

    fn parse_items<T>(
        &mut self,
        close: TokenType,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.current().typ == close {
                self.index += 1;
                return Ok(items);
            }
            items.push(item(self)?);
            if self.current().typ == TokenType::Comma {
                self.index += 1;
                continue;
            }
            if self.current().typ == close {
                self.index += 1;
                return Ok(items);
            }
            return self.error_here("Expected ',' or a closing bracket.");
        }
    }

    fn expect(&mut self, typ: TokenType, message: &str) -> Result<(), ParseError> {
        if self.current().typ == typ {
            self.index += 1;
            Ok(())
        } else {
            self.error_here(message)
        }
    }

    fn skip_newlines(&mut self) {
        while self.current().typ == TokenType::Newline {
            self.index += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.current().typ == TokenType::Eof
    }

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.index.min(last)]
    }

    fn error_here<T>(&self, message: &str) -> Result<T, ParseError> {
        Err(ParseError {
            message: message.to_string(),
            pos: self.current().pos,
        })
    }
}

/// Lexes and parses `source` as a single literal.
pub fn parse_literal(source: &str) -> Result<Literal, ParseError> {
    let tokens = Lexer::new(source).tokenize().map_err(|e| ParseError {
        message: e.message,
        pos: e.pos,
    })?;
    Parser::new(tokens).parse_single_literal()
}

/// Returns the decoded text when `source` is exactly one string literal.
pub fn parse_string_literal(source: &str) -> Option<String> {
    match parse_literal(source).ok()? {
        Literal::Str(value) => Some(value),
        _ => None,
    }
}
