// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Lexer for Skald source code.
//!
//! Tokens are produced on demand with up to two tokens of lookahead (the
//! ring holds four for headroom). Newlines become end-of-line tokens unless
//! the lexer is inside an open parenthesis; `;` forces one and collapses
//! with following `;` and whitespace; `#` starts a comment that acts as a
//! newline.
//!
//! A `(` that immediately follows an expression token (no whitespace in
//! between) is emitted as [`TokenKind::OpenParenNs`], which the parser
//! treats as the start of a call rather than a grouped expression.

use crate::io::PeekReader;
use crate::value::Word;
use std::io::Read;
use tracing::trace;

/// Inline capacity of a small token string.
const SMALL_LEN: usize = 15;

/// A token's string payload, stored inline when it fits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStr {
    /// Up to [`SMALL_LEN`] bytes stored in the token itself.
    Small {
        /// Number of live bytes.
        len: u8,
        /// Byte storage.
        data: [u8; SMALL_LEN],
    },
    /// Spilled to the heap.
    Heap(Vec<u8>),
}

impl TokenStr {
    /// Create an empty small string.
    #[must_use]
    pub fn new() -> Self {
        Self::Small {
            len: 0,
            data: [0; SMALL_LEN],
        }
    }

    /// Append one byte, spilling to the heap when the inline space is full.
    pub fn push(&mut self, b: u8) {
        match self {
            Self::Small { len, data } => {
                if (*len as usize) < SMALL_LEN {
                    data[*len as usize] = b;
                    *len += 1;
                } else {
                    let mut spilled = data.to_vec();
                    spilled.push(b);
                    *self = Self::Heap(spilled);
                }
            }
            Self::Heap(bytes) => bytes.push(b),
        }
    }

    /// The bytes of the string.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Small { len, data } => &data[..*len as usize],
            Self::Heap(bytes) => bytes,
        }
    }

    /// The string as UTF-8; invalid bytes yield an empty string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("")
    }

    /// Whether the payload is stored inline.
    #[must_use]
    pub fn is_small(&self) -> bool {
        matches!(self, Self::Small { .. })
    }
}

impl Default for TokenStr {
    fn default() -> Self {
        Self::new()
    }
}

/// Token kinds, with payloads where applicable.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `(` immediately following an expression token: starts a call.
    OpenParenNs,
    /// `(` starting a grouped expression.
    OpenParen,
    /// `)`
    CloseParen,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `'` introducing an atom.
    Quote,
    /// `,`
    Comma,
    /// `.`
    Period,
    /// `.N` positional access.
    DotNumber(Word),
    /// `:`
    Colon,
    /// `:=`
    ColonEq,
    /// `=`
    Equals,
    /// `|`
    Pipe,
    /// End of line (or `;`, or a comment).
    Eol,
    /// End of input.
    Eof,
    /// Number literal.
    Number(f64),
    /// String literal (contents, escapes resolved).
    String(TokenStr),
    /// Identifier.
    Ident(TokenStr),
    /// Lexical error.
    Error(String),
}

impl TokenKind {
    /// Name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenParenNs => "open-paren-ns",
            Self::OpenParen => "open-paren",
            Self::CloseParen => "close-paren",
            Self::OpenBrace => "open-brace",
            Self::CloseBrace => "close-brace",
            Self::OpenBracket => "open-bracket",
            Self::CloseBracket => "close-bracket",
            Self::Quote => "single-quote",
            Self::Comma => "comma",
            Self::Period => "period",
            Self::DotNumber(_) => "dot-number",
            Self::Colon => "colon",
            Self::ColonEq => "colon-equals",
            Self::Equals => "equals",
            Self::Pipe => "pipe",
            Self::Eol => "end-of-line",
            Self::Eof => "end-of-file",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Ident(_) => "ident",
            Self::Error(_) => "error",
        }
    }

    /// Whether a `(` directly after this token starts a call. `.` is in the
    /// set so that `.(expr)` dynamic access lexes as a call paren.
    fn is_expr(&self) -> bool {
        matches!(
            self,
            Self::CloseParen
                | Self::CloseBrace
                | Self::CloseBracket
                | Self::Period
                | Self::DotNumber(_)
                | Self::Number(_)
                | Self::String(_)
                | Self::Ident(_)
        )
    }
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// 1-based source line.
    pub line: u32,
    /// 1-based column.
    pub ch: u32,
    /// The kind, with payload.
    pub kind: TokenKind,
}

impl Default for Token {
    fn default() -> Self {
        Self {
            line: 0,
            ch: 0,
            kind: TokenKind::Eof,
        }
    }
}

/// The lexer: a token ring over a peeking byte reader.
pub struct Lexer<'r> {
    reader: PeekReader<'r>,
    toks: [Token; 4],
    tokidx: usize,
    line: u32,
    ch: u32,
    parens: i32,
    prev_tok_is_expr: bool,
}

impl<'r> Lexer<'r> {
    /// Create a lexer over a byte source.
    pub fn new(r: &'r mut dyn Read) -> Self {
        Self {
            reader: PeekReader::new(r),
            toks: std::array::from_fn(|_| Token::default()),
            tokidx: 0,
            line: 1,
            ch: 1,
            parens: 0,
            prev_tok_is_expr: false,
        }
    }

    /// Peek at the `count`-th upcoming token (1 = next) without consuming.
    pub fn peek(&mut self, count: usize) -> &Token {
        debug_assert!(count >= 1 && count <= self.toks.len());
        let offset = count - 1;
        while offset >= self.tokidx {
            let tok = self.read_tok();
            trace!(
                line = tok.line,
                ch = tok.ch,
                kind = tok.kind.name(),
                "token"
            );
            self.toks[self.tokidx] = tok;
            self.tokidx += 1;
        }
        &self.toks[offset]
    }

    /// Consume and return the next token.
    pub fn consume(&mut self) -> Token {
        if self.tokidx == 0 {
            self.peek(1);
        }
        let tok = std::mem::take(&mut self.toks[0]);
        self.toks.rotate_left(1);
        self.tokidx -= 1;
        tok
    }

    /// Consume the next token if it is an end-of-line.
    pub fn skip_opt_eol(&mut self) {
        if self.peek(1).kind == TokenKind::Eol {
            self.consume();
        }
    }

    /// Consume the next token if it is a comma.
    pub fn skip_opt_comma(&mut self) {
        if self.peek(1).kind == TokenKind::Comma {
            self.consume();
        }
    }

    fn peek_ch(&mut self) -> Option<u8> {
        self.reader.peek(1)
    }

    fn read_ch(&mut self) -> Option<u8> {
        let ch = self.reader.get();
        if let Some(c) = ch {
            self.ch += 1;
            if c == b'\n' {
                self.ch = 1;
                self.line += 1;
            }
        }
        ch
    }

    /// Skip whitespace and comments. Returns `(saw_newline, saw_anything)`.
    fn skip_whitespace(&mut self) -> (bool, bool) {
        let mut nl = false;
        let mut any = false;
        loop {
            while let Some(c) = self.peek_ch() {
                if !is_whitespace(c) {
                    break;
                }
                any = true;
                if self.read_ch() == Some(b'\n') {
                    nl = true;
                }
            }

            if self.peek_ch() == Some(b'#') {
                nl = true;
                any = true;
                loop {
                    match self.read_ch() {
                        Some(b'\n') | None => break,
                        Some(_) => {}
                    }
                }
            } else {
                break;
            }
        }

        (nl, any)
    }

    fn read_tok(&mut self) -> Token {
        let line = self.line;
        let ch = self.ch;
        let (nl, saw_ws) = self.skip_whitespace();

        let tok = |kind: TokenKind| Token { line, ch, kind };

        if nl && self.parens == 0 {
            self.prev_tok_is_expr = false;
            return tok(TokenKind::Eol);
        }

        let Some(c) = self.peek_ch() else {
            self.prev_tok_is_expr = false;
            return tok(TokenKind::Eof);
        };

        let kind = match c {
            b'(' => {
                self.read_ch();
                self.parens += 1;
                if self.prev_tok_is_expr && !saw_ws {
                    TokenKind::OpenParenNs
                } else {
                    TokenKind::OpenParen
                }
            }
            b')' => {
                self.read_ch();
                self.parens -= 1;
                TokenKind::CloseParen
            }
            b'{' => {
                self.read_ch();
                TokenKind::OpenBrace
            }
            b'}' => {
                self.read_ch();
                TokenKind::CloseBrace
            }
            b'[' => {
                self.read_ch();
                TokenKind::OpenBracket
            }
            b']' => {
                self.read_ch();
                TokenKind::CloseBracket
            }
            b';' => {
                // A forced end-of-line; collapses with whitespace and
                // further semicolons.
                loop {
                    self.read_ch();
                    self.skip_whitespace();
                    if self.peek_ch() != Some(b';') {
                        break;
                    }
                }
                TokenKind::Eol
            }
            b'\'' => {
                self.read_ch();
                TokenKind::Quote
            }
            b',' => {
                self.read_ch();
                TokenKind::Comma
            }
            b'.' => {
                self.read_ch();
                if self.peek_ch().is_some_and(|c| c.is_ascii_digit()) {
                    TokenKind::DotNumber(self.read_integer())
                } else {
                    TokenKind::Period
                }
            }
            b':' => {
                self.read_ch();
                if self.peek_ch() == Some(b'=') {
                    self.read_ch();
                    TokenKind::ColonEq
                } else {
                    TokenKind::Colon
                }
            }
            b'=' => {
                self.read_ch();
                TokenKind::Equals
            }
            b'|' => {
                self.read_ch();
                TokenKind::Pipe
            }
            b'"' => {
                self.read_ch();
                self.read_string()
            }
            _ => self.read_ident(),
        };

        self.prev_tok_is_expr = kind.is_expr();
        tok(kind)
    }

    fn read_integer(&mut self) -> Word {
        let mut num: Word = 0;
        while let Some(c) = self.peek_ch() {
            if !c.is_ascii_digit() {
                break;
            }
            self.read_ch();
            num = num.wrapping_mul(10).wrapping_add(Word::from(c - b'0'));
        }
        num
    }

    fn read_string(&mut self) -> TokenKind {
        let mut s = TokenStr::new();
        loop {
            match self.read_ch() {
                None => return TokenKind::Error("Unexpected EOF in string".into()),
                Some(b'"') => return TokenKind::String(s),
                Some(b'\\') => match self.read_ch() {
                    None => return TokenKind::Error("Unexpected EOF in string".into()),
                    Some(b'n') => s.push(b'\n'),
                    Some(b'r') => s.push(b'\r'),
                    Some(b't') => s.push(b'\t'),
                    Some(c) => s.push(c),
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn read_ident(&mut self) -> TokenKind {
        let mut s = TokenStr::new();
        loop {
            let Some(c) = self.peek_ch() else {
                break;
            };
            if is_whitespace(c) || is_structural(c) {
                break;
            }
            self.read_ch();
            s.push(c);
        }

        // An identifier that is a non-negative decimal number is a number.
        let bytes = s.as_bytes();
        if !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit) {
            if let Ok(num) = s.as_str().parse::<f64>() {
                return TokenKind::Number(num);
            }
        }

        TokenKind::Ident(s)
    }
}

fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\r' | b'\n' | b'\t')
}

fn is_structural(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')' | b'{' | b'}' | b'[' | b']' | b'\'' | b',' | b'.' | b':' | b'=' | b';' | b'|'
    )
}
