// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Recursive-descent parser for Skald.
//!
//! The parser consumes tokens and drives the code generator directly; the
//! only state it keeps is the lexer's lookahead. Statement-level calls
//! collect arguments until an end token; inside an argument list, an infix
//! identifier after the first value switches to infix mode, which is how
//! the language encodes binary operators.

use super::ParseError;
use super::lexer::{Lexer, Token, TokenKind, TokenStr};
use crate::codegen::Generator;
use crate::value::Word;
use tracing::trace_span;

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a whole program, emitting bytecode into `generator`.
///
/// A trailing `HALT` is emitted even when parsing fails, so partial
/// bytecode stays well-formed. Relocations are left for the caller to
/// apply once the full program size is known.
pub fn parse_program(lexer: &mut Lexer<'_>, generator: &mut Generator<'_>) -> Result<()> {
    let _span = trace_span!("program").entered();
    let result = parse_statements(lexer, generator);
    generator.halt();
    result
}

fn parse_statements(lexer: &mut Lexer<'_>, generator: &mut Generator<'_>) -> Result<()> {
    loop {
        lexer.skip_opt_eol();
        if lexer.peek(1).kind == TokenKind::Eof {
            return Ok(());
        }

        parse_expression(lexer, generator)?;
        generator.discard();
    }
}

fn tok_is_end(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::CloseBrace
            | TokenKind::CloseBracket
            | TokenKind::CloseParen
            | TokenKind::Comma
            | TokenKind::Eof
            | TokenKind::Eol
    )
}

fn tok_is_infix(tok: &Token) -> bool {
    let TokenKind::Ident(s) = &tok.kind else {
        return false;
    };
    let bytes = s.as_bytes();

    (bytes.first() == Some(&b'$') && bytes.len() > 1)
        || matches!(
            bytes,
            b"+" | b"-"
                | b"*"
                | b"/"
                | b"=="
                | b"!="
                | b"<"
                | b"<="
                | b">"
                | b">="
                | b"&&"
                | b"||"
                | b"??"
        )
}

fn unexpected(tok: &Token, context: &str) -> ParseError {
    match &tok.kind {
        TokenKind::Error(message) => ParseError::at(tok, message.clone()),
        kind => ParseError::at(tok, format!("{context}{}", kind.name())),
    }
}

fn expect_close_paren(lexer: &mut Lexer<'_>) -> Result<()> {
    if lexer.peek(1).kind == TokenKind::CloseParen {
        lexer.consume();
        Ok(())
    } else {
        Err(unexpected(lexer.peek(1), "Expected ')', got "))
    }
}

fn consume_ident(lexer: &mut Lexer<'_>) -> TokenStr {
    match lexer.consume().kind {
        TokenKind::Ident(s) => s,
        _ => unreachable!("caller peeked an ident"),
    }
}

fn peek_is_ident(lexer: &mut Lexer<'_>, count: usize) -> bool {
    matches!(lexer.peek(count).kind, TokenKind::Ident(_))
}

fn parse_import(lexer: &mut Lexer<'_>, generator: &mut Generator<'_>) -> Result<()> {
    let _span = trace_span!("import").entered();
    lexer.consume(); // ident 'import'

    if !matches!(lexer.peek(1).kind, TokenKind::String(_)) {
        return Err(unexpected(lexer.peek(1), "In import: Expected string, got "));
    }

    let tok = lexer.consume();
    let TokenKind::String(path) = &tok.kind else {
        unreachable!("peeked a string");
    };
    let path = path.as_str();

    // A registered native module compiles to a plain scope lookup.
    if generator.cmodule(path) {
        return Ok(());
    }

    let mut reader = generator
        .open_import(path)
        .map_err(|e| ParseError::at(&tok, format!("'{path}': Import failed: {e}")))?;

    // The imported file becomes an immediately-called function; its last
    // top-level expression is the import's value.
    let reloc_pos = generator.pos() + 1;
    generator.rjmp_placeholder();
    let start = generator.pos();

    let result = {
        let mut nested = Lexer::new(reader.as_mut());
        parse_import_body(&mut nested, generator)
    };
    generator.close_import();
    result.map_err(|e| {
        ParseError::at(&tok, format!("'{path}': {}:{}: {}", e.line, e.ch, e.message))
    })?;

    generator.ret();
    let end = generator.pos();
    generator.function(start);
    generator.add_reloc(reloc_pos, end - start);
    generator.func_call(0);
    Ok(())
}

fn parse_import_body(lexer: &mut Lexer<'_>, generator: &mut Generator<'_>) -> Result<()> {
    let mut first = true;
    loop {
        lexer.skip_opt_eol();
        if lexer.peek(1).kind == TokenKind::Eof {
            break;
        }

        if !first {
            generator.discard();
        }
        parse_expression(lexer, generator)?;
        first = false;
    }

    if first {
        generator.none();
    }
    Ok(())
}

fn parse_object_literal(lexer: &mut Lexer<'_>, generator: &mut Generator<'_>) -> Result<()> {
    let _span = trace_span!("object literal").entered();
    // '{' and an optional EOL are already consumed.

    generator.namespace();

    loop {
        if lexer.peek(1).kind == TokenKind::CloseBrace {
            lexer.consume();
            return Ok(());
        }
        if !peek_is_ident(lexer, 1) {
            return Err(unexpected(
                lexer.peek(1),
                "In object literal: Expected identifier, got ",
            ));
        }

        let key = consume_ident(lexer);

        if lexer.peek(1).kind != TokenKind::Colon {
            return Err(unexpected(
                lexer.peek(1),
                "In object literal: Expected ':', got ",
            ));
        }
        lexer.consume();

        parse_expression(lexer, generator)?;
        generator.namespace_set(key.as_str());
        generator.discard();

        match lexer.peek(1).kind {
            TokenKind::Eol | TokenKind::Comma => {
                lexer.consume();
                lexer.skip_opt_eol();
            }
            TokenKind::CloseBrace => {}
            _ => {
                return Err(unexpected(
                    lexer.peek(1),
                    "In object literal: Expected EOL or '}', got ",
                ));
            }
        }
    }
}

fn parse_function_literal(lexer: &mut Lexer<'_>, generator: &mut Generator<'_>) -> Result<()> {
    let _span = trace_span!("function literal").entered();

    let reloc_pos = generator.pos() + 1;
    generator.rjmp_placeholder();
    let start = generator.pos();

    // '{' and an optional EOL are already consumed.

    let mut first = true;
    loop {
        if lexer.peek(1).kind == TokenKind::CloseBrace {
            lexer.consume();
            break;
        }

        if !first {
            generator.discard();
        }

        parse_expression(lexer, generator)?;
        lexer.skip_opt_eol();
        first = false;
    }

    // Every function puts something on the stack.
    if first {
        generator.none();
    }

    generator.ret();

    let end = generator.pos();
    generator.function(start);
    generator.add_reloc(reloc_pos, end - start);
    Ok(())
}

fn parse_object_or_function_literal(
    lexer: &mut Lexer<'_>,
    generator: &mut Generator<'_>,
) -> Result<()> {
    lexer.consume(); // '{'
    lexer.skip_opt_eol();

    if lexer.peek(1).kind == TokenKind::CloseBrace {
        // Empty object literal.
        lexer.consume();
        generator.namespace();
        return Ok(());
    }

    let is_object = peek_is_ident(lexer, 1) && lexer.peek(2).kind == TokenKind::Colon;
    if is_object {
        parse_object_literal(lexer, generator)
    } else {
        parse_function_literal(lexer, generator)
    }
}

fn parse_array_literal(lexer: &mut Lexer<'_>, generator: &mut Generator<'_>) -> Result<()> {
    let _span = trace_span!("array literal").entered();
    lexer.consume(); // '['
    lexer.skip_opt_eol();

    let mut count: Word = 0;
    loop {
        if lexer.peek(1).kind == TokenKind::CloseBracket {
            lexer.consume();
            break;
        }

        count += 1;
        parse_arg_level_expression(lexer, generator)?;

        lexer.skip_opt_comma();
        lexer.skip_opt_eol();
    }

    generator.array(count);
    Ok(())
}

/// Borrow-free summary of the token that can start a base expression.
enum Base {
    Group,
    Ident,
    Number(f64),
    Str,
    Quote,
    ObjectOrFn,
    Array,
    Other,
}

fn parse_arg_level_expression_base(
    lexer: &mut Lexer<'_>,
    generator: &mut Generator<'_>,
) -> Result<()> {
    let base = match &lexer.peek(1).kind {
        TokenKind::OpenParen => Base::Group,
        TokenKind::Ident(_) => Base::Ident,
        TokenKind::Number(num) => Base::Number(*num),
        TokenKind::String(_) => Base::Str,
        TokenKind::Quote => Base::Quote,
        TokenKind::OpenBrace => Base::ObjectOrFn,
        TokenKind::OpenBracket => Base::Array,
        _ => Base::Other,
    };

    match base {
        Base::Group => {
            lexer.consume();
            parse_expression(lexer, generator)?;
            expect_close_paren(lexer)
        }
        Base::Ident => {
            let ident = consume_ident(lexer);
            if ident.as_bytes() == b"$" {
                generator.stack_frame_get_args();
            } else {
                generator.stack_frame_lookup(ident.as_str());
            }
            Ok(())
        }
        Base::Number(num) => {
            lexer.consume();
            generator.number(num);
            Ok(())
        }
        Base::Str => {
            let TokenKind::String(s) = lexer.consume().kind else {
                unreachable!("peeked a string");
            };
            generator.string(s.as_str());
            Ok(())
        }
        Base::Quote if peek_is_ident(lexer, 2) => {
            lexer.consume(); // '
            let ident = consume_ident(lexer);
            generator.atom(ident.as_str());
            Ok(())
        }
        Base::ObjectOrFn => parse_object_or_function_literal(lexer, generator),
        Base::Array => parse_array_literal(lexer, generator),
        Base::Quote | Base::Other => Err(unexpected(lexer.peek(1), "Unexpected token ")),
    }
}

/// Borrow-free summary of the token that can continue a suffix chain.
enum Suffix {
    Call,
    Period,
    DotNumber(Word),
    Other,
}

/// Parse an argument-level expression: a base plus any number of call,
/// field-access or index suffixes. Returns whether a suffix was applied,
/// which the infix machinery uses to tell an operator from an argument.
fn parse_arg_level_expression(lexer: &mut Lexer<'_>, generator: &mut Generator<'_>) -> Result<bool> {
    parse_arg_level_expression_base(lexer, generator)?;

    let mut had_suffix = false;
    loop {
        let suffix = match &lexer.peek(1).kind {
            TokenKind::OpenParenNs => Suffix::Call,
            TokenKind::Period => Suffix::Period,
            TokenKind::DotNumber(index) => Suffix::DotNumber(*index),
            _ => Suffix::Other,
        };

        match suffix {
            Suffix::Call => {
                lexer.consume();
                if lexer.peek(1).kind == TokenKind::CloseParen {
                    lexer.consume();
                    generator.func_call(0);
                } else {
                    parse_func_call_after_base(lexer, generator, 1)?;
                    expect_close_paren(lexer)?;
                }
            }
            Suffix::Period if peek_is_ident(lexer, 2) => {
                let assigns = lexer.peek(3).kind == TokenKind::Equals;
                lexer.consume(); // '.'
                let ident = consume_ident(lexer);
                if assigns {
                    lexer.consume(); // '='
                    parse_expression(lexer, generator)?;
                    generator.namespace_set(ident.as_str());
                    generator.swap_discard();
                } else {
                    generator.namespace_lookup(ident.as_str());
                }
            }
            Suffix::Period if lexer.peek(2).kind == TokenKind::OpenParenNs => {
                lexer.consume(); // '.'
                lexer.consume(); // '('
                parse_expression(lexer, generator)?;
                expect_close_paren(lexer)?;

                if lexer.peek(1).kind == TokenKind::Equals {
                    lexer.consume();
                    parse_expression(lexer, generator)?;
                    generator.dynamic_set();
                } else {
                    generator.dynamic_lookup();
                }
            }
            Suffix::DotNumber(index) => {
                lexer.consume();
                if lexer.peek(1).kind == TokenKind::Equals {
                    lexer.consume();
                    parse_expression(lexer, generator)?;
                    generator.array_set(index);
                    generator.swap_discard();
                } else {
                    generator.array_lookup(index);
                }
            }
            Suffix::Period | Suffix::Other => break,
        }

        had_suffix = true;
    }

    Ok(had_suffix)
}

/// Parse call arguments after the callee is on the stack. `infix_start` is
/// the argument index from which infix identifiers switch to infix mode: 0
/// at statement position, 1 inside call parentheses.
fn parse_func_call_after_base(
    lexer: &mut Lexer<'_>,
    generator: &mut Generator<'_>,
    infix_start: usize,
) -> Result<()> {
    let _span = trace_span!("call").entered();

    let mut argc: usize = 0;
    loop {
        if argc >= infix_start && tok_is_infix(lexer.peek(1)) {
            // One value (the lhs) is already on the stack; consume
            // <operator> <rhs> pairs.
            let mut aborted = false;
            loop {
                if parse_arg_level_expression(lexer, generator)? {
                    // The "operator" had suffixes, so it was a plain
                    // argument after all.
                    argc += 1;
                    aborted = true;
                    break;
                }

                parse_arg_level_expression(lexer, generator)?;
                generator.func_call_infix();

                if !tok_is_infix(lexer.peek(1)) {
                    break;
                }
            }

            // A pure infix chain in first position is a complete
            // expression, not a call.
            if !aborted && argc == 0 {
                return Ok(());
            }
        } else {
            parse_arg_level_expression(lexer, generator)?;
            argc += 1;
        }

        if tok_is_end(&lexer.peek(1).kind) {
            break;
        }
    }

    generator.func_call(argc as Word);
    Ok(())
}

fn parse_expression(lexer: &mut Lexer<'_>, generator: &mut Generator<'_>) -> Result<()> {
    let _span = trace_span!("expression").entered();

    let first_is_import = matches!(
        &lexer.peek(1).kind,
        TokenKind::Ident(s) if s.as_bytes() == b"import"
    );
    if first_is_import {
        return parse_import(lexer, generator);
    }

    if peek_is_ident(lexer, 1) {
        let introduces = match lexer.peek(2).kind {
            TokenKind::ColonEq => Some(true),
            TokenKind::Equals => Some(false),
            _ => None,
        };

        if let Some(introduces) = introduces {
            let ident = consume_ident(lexer);
            lexer.consume(); // ':=' or '='

            parse_expression(lexer, generator)?;

            if introduces {
                generator.stack_frame_set(ident.as_str());
            } else {
                generator.stack_frame_replace(ident.as_str());
            }
            return Ok(());
        }
    }

    parse_arg_level_expression(lexer, generator)?;
    if !tok_is_end(&lexer.peek(1).kind) {
        parse_func_call_after_base(lexer, generator, 0)?;
    }
    Ok(())
}
