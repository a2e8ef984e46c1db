//! Tokenizer. String literals may span lines, which plain script forbids.

use crate::ast::Span;
use crate::error::ParseError;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Number(f64),
    /// Cooked string value. `multiline` is set when the raw text held a line break.
    Str { value: String, multiline: bool },
    Ident(String),
    Punct(&'static str),
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Local byte span (without the parser base).
    pub span: Span,
    /// A line terminator appeared between this token and the previous one.
    pub newline_before: bool,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(q) if q == p)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(n) if n == name)
    }
}

// Longest first so that prefix matching picks `===` over `==`.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=",
    "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-", "*", "/", "%", "!", "?", ":",
    ".", "=",
];

pub fn tokenize(source: &str, base: usize) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        base,
    };
    let mut tokens = Vec::new();
    loop {
        let newline_before = lexer.skip_trivia()?;
        let start = lexer.pos;
        if start >= lexer.bytes.len() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
                newline_before,
            });
            return Ok(tokens);
        }
        let kind = lexer.token()?;
        tokens.push(Token {
            kind,
            span: Span::new(start, lexer.pos),
            newline_before,
        });
    }
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl Lexer<'_> {
    fn error(&self, at: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(self.source, at, self.base, message)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// Skip whitespace and comments; report whether a line break was crossed.
    fn skip_trivia(&mut self) -> Result<bool, ParseError> {
        let mut newline = false;
        while let Some(c) = self.peek(0) {
            match c {
                b'\n' | b'\r' => {
                    newline = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => {
                    while let Some(c) = self.peek(0) {
                        if c == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match self.peek(0) {
                            None => return Err(self.error(start, "unterminated comment")),
                            Some(b'*') if self.peek(1) == Some(b'/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(c) => {
                                newline |= c == b'\n';
                                self.pos += 1;
                            }
                        }
                    }
                }
                c if c >= 0x80 => {
                    let ch = self.source[self.pos..].chars().next().unwrap_or(' ');
                    if ch.is_whitespace() {
                        newline |= ch == '\u{2028}' || ch == '\u{2029}';
                        self.pos += ch.len_utf8();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(newline)
    }

    fn token(&mut self) -> Result<TokenKind, ParseError> {
        let c = self.bytes[self.pos];
        if c == b'"' || c == b'\'' {
            return self.string(c);
        }
        if c.is_ascii_digit() || (c == b'.' && self.peek(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.number();
        }
        let rest = &self.source[self.pos..];
        let ch = rest.chars().next().unwrap_or('\0');
        if ch == '_' || ch == '$' || ch.is_alphabetic() {
            let len = rest
                .char_indices()
                .find(|(_, c)| !(*c == '_' || *c == '$' || c.is_alphanumeric()))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            self.pos += len;
            return Ok(TokenKind::Ident(rest[..len].to_string()));
        }
        for p in PUNCTUATORS {
            if rest.starts_with(p) {
                self.pos += p.len();
                return Ok(TokenKind::Punct(p));
            }
        }
        Err(self.error(self.pos, format!("unexpected character '{ch}'")))
    }

    fn number(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'x' | b'X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek(0).is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let digits = &self.source[digits_start..self.pos];
            return u64::from_str_radix(digits, 16)
                .map(|v| TokenKind::Number(v as f64))
                .map_err(|_| self.error(start, "malformed hex literal"));
        }
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek(0) == Some(b'.') {
            self.pos += 1;
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(0), Some(b'e' | b'E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek(0), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = save;
            }
        }
        self.source[start..self.pos]
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(start, "malformed number"))
    }

    fn string(&mut self, quote: u8) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut multiline = false;
        loop {
            let rest = &self.source[self.pos..];
            let Some(ch) = rest.chars().next() else {
                return Err(self.error(start, "unterminated string literal"));
            };
            self.pos += ch.len_utf8();
            match ch {
                c if c as u32 == quote as u32 => break,
                '\n' | '\r' => {
                    multiline = true;
                    value.push(ch);
                }
                '\\' => {
                    let Some(esc) = self.source[self.pos..].chars().next() else {
                        return Err(self.error(start, "unterminated string literal"));
                    };
                    self.pos += esc.len_utf8();
                    match esc {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'v' => value.push('\u{b}'),
                        '0' => value.push('\0'),
                        // Line continuation.
                        '\n' => {}
                        '\r' => {
                            if self.peek(0) == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        'x' => value.push(self.hex_escape(2, start)?),
                        'u' => value.push(self.hex_escape(4, start)?),
                        other => value.push(other),
                    }
                }
                other => value.push(other),
            }
        }
        Ok(TokenKind::Str { value, multiline })
    }

    fn hex_escape(&mut self, digits: usize, start: usize) -> Result<char, ParseError> {
        let text = self
            .source
            .get(self.pos..self.pos + digits)
            .ok_or_else(|| self.error(start, "malformed escape sequence"))?;
        let code = u32::from_str_radix(text, 16)
            .map_err(|_| self.error(start, "malformed escape sequence"))?;
        self.pos += digits;
        Ok(char::from_u32(code).unwrap_or('\u{fffd}'))
    }
}
