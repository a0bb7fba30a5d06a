// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the lexer.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::lexer::{Lexer, TokenKind, TokenStr};

fn tokens(src: &str) -> Vec<TokenKind> {
    let mut bytes = src.as_bytes();
    let mut lexer = Lexer::new(&mut bytes);
    let mut out = Vec::new();
    loop {
        let tok = lexer.consume();
        let done = tok.kind == TokenKind::Eof;
        out.push(tok.kind);
        if done {
            return out;
        }
    }
}

fn ident(s: &str) -> TokenKind {
    let mut t = TokenStr::new();
    for b in s.bytes() {
        t.push(b);
    }
    TokenKind::Ident(t)
}

fn string(s: &str) -> TokenKind {
    let mut t = TokenStr::new();
    for b in s.bytes() {
        t.push(b);
    }
    TokenKind::String(t)
}

#[test]
fn assignment_tokens() {
    assert_eq!(
        tokens("x := 10"),
        vec![
            ident("x"),
            TokenKind::ColonEq,
            TokenKind::Number(10.0),
            TokenKind::Eof
        ]
    );
}

#[test]
fn colon_and_equals_are_distinct() {
    assert_eq!(
        tokens("a: b = c"),
        vec![
            ident("a"),
            TokenKind::Colon,
            ident("b"),
            TokenKind::Equals,
            ident("c"),
            TokenKind::Eof
        ]
    );
}

#[test]
fn newline_becomes_eol() {
    assert_eq!(
        tokens("a\nb"),
        vec![ident("a"), TokenKind::Eol, ident("b"), TokenKind::Eof]
    );
}

#[test]
fn blank_lines_collapse_into_one_eol() {
    assert_eq!(
        tokens("a\n\n\nb"),
        vec![ident("a"), TokenKind::Eol, ident("b"), TokenKind::Eof]
    );
}

#[test]
fn newlines_inside_parens_are_whitespace() {
    assert_eq!(
        tokens("(a\nb)"),
        vec![
            TokenKind::OpenParen,
            ident("a"),
            ident("b"),
            TokenKind::CloseParen,
            TokenKind::Eof
        ]
    );
}

#[test]
fn semicolon_is_a_forced_eol_and_collapses() {
    assert_eq!(
        tokens("a;;  ; b"),
        vec![ident("a"), TokenKind::Eol, ident("b"), TokenKind::Eof]
    );
}

#[test]
fn comments_act_as_newlines() {
    assert_eq!(
        tokens("a # comment\nb"),
        vec![ident("a"), TokenKind::Eol, ident("b"), TokenKind::Eof]
    );
}

#[test]
fn comment_at_eof_terminates() {
    assert_eq!(
        tokens("a # trailing"),
        vec![ident("a"), TokenKind::Eol, TokenKind::Eof]
    );
}

#[test]
fn call_paren_requires_adjacency() {
    assert_eq!(
        tokens("f(x)"),
        vec![
            ident("f"),
            TokenKind::OpenParenNs,
            ident("x"),
            TokenKind::CloseParen,
            TokenKind::Eof
        ]
    );
    assert_eq!(
        tokens("f (x)"),
        vec![
            ident("f"),
            TokenKind::OpenParen,
            ident("x"),
            TokenKind::CloseParen,
            TokenKind::Eof
        ]
    );
}

#[test]
fn paren_after_close_paren_is_a_call() {
    assert_eq!(
        tokens("f(x)(y)")[4..6],
        [TokenKind::OpenParenNs, ident("y")]
    );
}

#[test]
fn paren_after_period_is_a_call_paren() {
    assert_eq!(
        tokens("o.(k)"),
        vec![
            ident("o"),
            TokenKind::Period,
            TokenKind::OpenParenNs,
            ident("k"),
            TokenKind::CloseParen,
            TokenKind::Eof
        ]
    );
}

#[test]
fn dot_number_lexes_as_one_token() {
    assert_eq!(
        tokens("a.0"),
        vec![ident("a"), TokenKind::DotNumber(0), TokenKind::Eof]
    );
    assert_eq!(
        tokens("a.123"),
        vec![ident("a"), TokenKind::DotNumber(123), TokenKind::Eof]
    );
}

#[test]
fn period_before_ident_stays_a_period() {
    assert_eq!(
        tokens("a.b"),
        vec![ident("a"), TokenKind::Period, ident("b"), TokenKind::Eof]
    );
}

#[test]
fn quote_introduces_an_atom() {
    assert_eq!(
        tokens("'stop"),
        vec![TokenKind::Quote, ident("stop"), TokenKind::Eof]
    );
}

#[test]
fn numeric_identifiers_become_numbers() {
    assert_eq!(tokens("123"), vec![TokenKind::Number(123.0), TokenKind::Eof]);
    assert_eq!(tokens("12a"), vec![ident("12a"), TokenKind::Eof]);
}

#[test]
fn operators_are_identifiers() {
    assert_eq!(
        tokens("1 + 2"),
        vec![
            TokenKind::Number(1.0),
            ident("+"),
            TokenKind::Number(2.0),
            TokenKind::Eof
        ]
    );
}

#[test]
fn string_literal_with_escapes() {
    assert_eq!(
        tokens(r#""a\nb\tc\\d\"e""#),
        vec![string("a\nb\tc\\d\"e"), TokenKind::Eof]
    );
}

#[test]
fn unknown_escape_is_the_character_itself() {
    assert_eq!(tokens(r#""\q""#), vec![string("q"), TokenKind::Eof]);
}

#[test]
fn unterminated_string_is_an_error() {
    let toks = tokens("\"abc");
    assert!(matches!(toks[0], TokenKind::Error(_)));
}

#[test]
fn short_strings_stay_inline() {
    let TokenKind::String(s) = &tokens("\"short\"")[0] else {
        panic!("expected a string");
    };
    assert!(s.is_small());
    assert_eq!(s.as_str(), "short");
}

#[test]
fn long_strings_spill_to_the_heap() {
    let TokenKind::String(s) = &tokens("\"sixteen bytes !!\"")[0] else {
        panic!("expected a string");
    };
    assert!(!s.is_small());
    assert_eq!(s.as_str(), "sixteen bytes !!");
}

#[test]
fn token_positions_are_one_based() {
    let mut bytes: &[u8] = b"a\n  b";
    let mut lexer = Lexer::new(&mut bytes);
    let a = lexer.consume();
    assert_eq!((a.line, a.ch), (1, 1));
    lexer.consume(); // EOL
    let b = lexer.consume();
    assert_eq!(b.line, 2);
}

#[test]
fn two_tokens_of_lookahead() {
    let mut bytes: &[u8] = b"a b c";
    let mut lexer = Lexer::new(&mut bytes);
    assert_eq!(lexer.peek(1).kind, ident("a"));
    assert_eq!(lexer.peek(2).kind, ident("b"));
    assert_eq!(lexer.consume().kind, ident("a"));
    assert_eq!(lexer.peek(2).kind, ident("c"));
}
