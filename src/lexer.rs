use crate::ast::Position;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenType {
    Keyword,
    Ident,
    Number,
    String,
    Op,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Comment,
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub typ: TokenType,
    /// Decoded text for strings, raw text for everything else.
    pub value: String,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub struct LexerError {
    pub message: String,
    pub pos: Position,
}

impl Display for LexerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (line {}, column {})",
            self.message, self.pos.line, self.pos.column
        )
    }
}

impl Error for LexerError {}

/// Tokenizer for the subset of the runtime's Python dialect that generated
/// scripts use.
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
    keywords: HashSet<&'static str>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
            keywords: keyword_set(),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        // Newlines inside brackets are insignificant.
        let mut depth = 0usize;
        while !self.at_end() {
            let ch = self.peek();
            if is_ignorable_format_char(ch) {
                self.advance();
                continue;
            }
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
                continue;
            }
            if ch == '\\' && self.peek_at(1) == '\n' {
                self.advance();
                self.advance();
                continue;
            }
            if ch == '\n' {
                let pos = self.pos();
                self.advance();
                if depth == 0 {
                    tokens.push(Token {
                        typ: TokenType::Newline,
                        value: "\n".to_string(),
                        pos,
                    });
                }
                continue;
            }
            if ch == '#' {
                tokens.push(self.read_comment());
                continue;
            }
            if ch == '"' || ch == '\'' {
                tokens.push(self.read_string()?);
                continue;
            }
            if ch.is_ascii_digit() || (ch == '.' && self.peek_at(1).is_ascii_digit()) {
                tokens.push(self.read_number()?);
                continue;
            }
            if ch.is_alphabetic() || ch == '_' {
                tokens.push(self.read_identifier());
                continue;
            }
            let pos = self.pos();
            let typ = match ch {
                '(' => Some(TokenType::LParen),
                ')' => Some(TokenType::RParen),
                '[' => Some(TokenType::LBracket),
                ']' => Some(TokenType::RBracket),
                '{' => Some(TokenType::LBrace),
                '}' => Some(TokenType::RBrace),
                ',' => Some(TokenType::Comma),
                ':' => Some(TokenType::Colon),
                '.' => Some(TokenType::Dot),
                _ => None,
            };
            if let Some(typ) = typ {
                match typ {
                    TokenType::LParen | TokenType::LBracket | TokenType::LBrace => depth += 1,
                    TokenType::RParen | TokenType::RBracket | TokenType::RBrace => {
                        depth = depth.saturating_sub(1)
                    }
                    _ => {}
                }
                self.advance();
                tokens.push(Token {
                    typ,
                    value: ch.to_string(),
                    pos,
                });
                continue;
            }
            match ch {
                '+' | '-' | '*' | '/' | '%' => {
                    self.advance();
                    tokens.push(Token {
                        typ: TokenType::Op,
                        value: ch.to_string(),
                        pos,
                    });
                }
                '=' | '!' | '<' | '>' => {
                    tokens.push(self.read_operator());
                }
                _ => {
                    return Err(LexerError {
                        message: format!("Unexpected character {:?}", ch),
                        pos,
                    });
                }
            }
        }
        tokens.push(Token {
            typ: TokenType::Eof,
            value: String::new(),
            pos: self.pos(),
        });
        Ok(tokens)
    }

    fn read_operator(&mut self) -> Token {
        let pos = self.pos();
        let ch = self.advance();
        let mut value = ch.to_string();
        if self.peek() == '=' {
            value.push(self.advance());
        }
        Token {
            typ: TokenType::Op,
            value,
            pos,
        }
    }

    fn read_identifier(&mut self) -> Token {
        let pos = self.pos();
        let mut text = String::new();
        text.push(self.advance());
        while !self.at_end() {
            let ch = self.peek();
            if ch.is_alphanumeric() || ch == '_' {
                text.push(self.advance());
            } else {
                break;
            }
        }
        let typ = if self.keywords.contains(text.as_str()) {
            TokenType::Keyword
        } else {
            TokenType::Ident
        };
        Token {
            typ,
            value: text,
            pos,
        }
    }

    fn read_number(&mut self) -> Result<Token, LexerError> {
        let pos = self.pos();
        let mut text = String::new();
        let mut seen_dot = false;
        let mut seen_exp = false;
        while !self.at_end() {
            let ch = self.peek();
            if ch.is_ascii_digit() || ch == '_' {
                text.push(self.advance());
                continue;
            }
            if ch == '.' && !seen_dot && !seen_exp {
                seen_dot = true;
                text.push(self.advance());
                continue;
            }
            if matches!(ch, 'e' | 'E') && !seen_exp {
                let next = self.peek_at(1);
                let after_sign = self.peek_at(2);
                if next.is_ascii_digit() || (matches!(next, '+' | '-') && after_sign.is_ascii_digit())
                {
                    seen_exp = true;
                    text.push(self.advance());
                    if matches!(self.peek(), '+' | '-') {
                        text.push(self.advance());
                    }
                    continue;
                }
            }
            break;
        }
        // Decimal integers other than zero cannot start with 0.
        let digits = text.replace('_', "");
        if !seen_dot && !seen_exp && digits.starts_with('0') && digits.contains(|c: char| c != '0') {
            return Err(LexerError {
                message: format!("Leading zeros in integer literal {:?}", text),
                pos,
            });
        }
        Ok(Token {
            typ: TokenType::Number,
            value: text,
            pos,
        })
    }

    fn read_string(&mut self) -> Result<Token, LexerError> {
        let pos = self.pos();
        let quote = self.advance();
        let triple = self.peek() == quote && self.peek_at(1) == quote;
        if triple {
            self.advance();
            self.advance();
        }
        let mut out = String::new();
        while !self.at_end() {
            let ch = self.advance();
            if ch == quote {
                if !triple {
                    return Ok(self.string_token(out, pos));
                }
                if self.peek() == quote && self.peek_at(1) == quote {
                    self.advance();
                    self.advance();
                    return Ok(self.string_token(out, pos));
                }
                out.push(ch);
                continue;
            }
            if ch == '\\' {
                if self.at_end() {
                    break;
                }
                self.read_escape(&mut out, pos)?;
                continue;
            }
            if ch == '\n' && !triple {
                return Err(LexerError {
                    message: "Unterminated string literal".to_string(),
                    pos,
                });
            }
            out.push(ch);
        }
        Err(LexerError {
            message: "Unterminated string literal".to_string(),
            pos,
        })
    }

    fn read_escape(&mut self, out: &mut String, pos: Position) -> Result<(), LexerError> {
        let esc = self.advance();
        match esc {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '0' => out.push('\0'),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            'x' => out.push(self.read_hex_escape(2, pos)?),
            'u' => out.push(self.read_hex_escape(4, pos)?),
            'U' => out.push(self.read_hex_escape(8, pos)?),
            other => {
                // Unknown escapes keep their backslash.
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn read_hex_escape(&mut self, digits: usize, pos: Position) -> Result<char, LexerError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self.peek().to_digit(16).ok_or_else(|| LexerError {
                message: "Truncated hex escape in string literal".to_string(),
                pos,
            })?;
            self.advance();
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| LexerError {
            message: format!("Invalid code point \\x{:x} in string literal", code),
            pos,
        })
    }

    fn string_token(&self, value: String, pos: Position) -> Token {
        Token {
            typ: TokenType::String,
            value,
            pos,
        }
    }

    fn read_comment(&mut self) -> Token {
        let pos = self.pos();
        let mut text = String::new();
        while !self.at_end() && self.peek() != '\n' {
            text.push(self.advance());
        }
        Token {
            typ: TokenType::Comment,
            value: text,
            pos,
        }
    }

    fn at_end(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> char {
        self.chars.get(self.index + offset).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.index];
        self.index += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

fn keyword_set() -> HashSet<&'static str> {
    [
        "True", "False", "None", "and", "or", "not", "if", "else", "elif", "in", "is", "def",
        "return", "import", "from", "as", "lambda",
    ]
    .into_iter()
    .collect()
}

fn is_ignorable_format_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{feff}' // BOM / zero width no-break space
            | '\u{200b}' // zero width space
            | '\u{200c}' // zero width non-joiner
            | '\u{200d}' // zero width joiner
            | '\u{2060}' // word joiner
    )
}
