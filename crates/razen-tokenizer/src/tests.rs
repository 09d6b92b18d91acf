use std::sync::Arc;

use expect_test::expect;
use razen_grammar::rule::{choice, lit, repeat, seq, sym};
use razen_grammar::{ConfigurationError, GrammarBuilder, GrammarTable};
use razen_yellow::{KindId, LexMode, TriviaPieceKind};
use text_size::TextSize;

use crate::{Cursor, Lexer, Token, TokenScanner};

struct MiniScanner;

impl TokenScanner for MiniScanner {
    fn tokens(&self) -> &'static [&'static str] {
        &["identifier", "number"]
    }

    fn externals(&self) -> &'static [&'static str] {
        &["content"]
    }

    fn trivia(&self, cursor: &mut Cursor<'_>) -> Option<TriviaPieceKind> {
        match cursor.peek() {
            b' ' => {
                cursor.advance_while(|byte| byte == b' ');
                Some(TriviaPieceKind::Whitespace)
            }
            b'\n' => {
                cursor.advance();
                Some(TriviaPieceKind::Newline)
            }
            b'/' if cursor.second() == b'/' => {
                cursor.advance_while(|byte| byte != b'\n');
                Some(TriviaPieceKind::SingleLineComment)
            }
            _ => None,
        }
    }

    fn scan(&self, cursor: &mut Cursor<'_>) -> Option<usize> {
        match cursor.peek() {
            b'a'..=b'z' => {
                cursor.advance_while(|byte| byte.is_ascii_lowercase());
                Some(0)
            }
            b'0'..=b'9' => {
                cursor.advance_while(|byte| byte.is_ascii_digit());
                Some(1)
            }
            _ => None,
        }
    }

    fn scan_external(&self, cursor: &mut Cursor<'_>, valid: &[bool]) -> Option<usize> {
        if valid[0] && !cursor.is_eof() && cursor.peek() != b'"' {
            cursor.advance_while(|byte| byte != b'"');
            return Some(0);
        }
        None
    }
}

fn table() -> Arc<GrammarTable> {
    let mut builder = GrammarBuilder::new("mini");
    builder
        .token("identifier")
        .token("number")
        .external("content")
        .word("identifier")
        .rule("source", repeat(sym("_statement")))
        .rule(
            "_statement",
            choice([sym("let_statement"), sym("shift_expression"), sym("generic"), sym("string")]),
        )
        .rule(
            "let_statement",
            seq([lit("let"), sym("identifier"), lit("="), sym("number"), lit(";")]),
        )
        .rule("shift_expression", seq([sym("number"), lit(">>"), sym("number"), lit(";")]))
        .rule("generic", seq([lit("<"), sym("identifier"), lit(">")]))
        .rule("string", seq([lit("\""), repeat(sym("content")), lit("\"")]));
    Arc::new(builder.build().unwrap())
}

fn lexer() -> Lexer {
    Lexer::new(table(), Box::new(MiniScanner)).unwrap()
}

fn kind(lexer: &Lexer, name: &str) -> KindId {
    lexer.table().kinds().kind_id(name).unwrap()
}

/// Lex mode of the state reached by shifting `path` from the start state.
fn mode_after(lexer: &Lexer, path: &[&str]) -> LexMode {
    let table = lexer.table();
    let mut state = GrammarTable::START_STATE;
    for name in path {
        state = table.successor(state, kind(lexer, name)).unwrap();
    }
    table.lex_mode(state)
}

fn lex(lexer: &Lexer, text: &str, position: u32, mode: LexMode) -> Token {
    lexer.next_token(text.as_bytes(), TextSize::new(position), mode)
}

fn dump(lexer: &Lexer, text: &str) -> String {
    let mut out = String::new();
    let mut position = TextSize::new(0);
    loop {
        let token = lexer.next_token(text.as_bytes(), position, LexMode::ERROR);
        let name = lexer.table().kinds().name(token.kind);
        out.push_str(&format!("{name} {:?}\n", token.text_range()));
        if token.kind == KindId::END {
            return out;
        }
        position = token.range.end();
    }
}

#[test]
fn error_mode_stream() {
    let lexer = lexer();
    expect![[r#"
        let 0..3
        identifier 4..5
        = 6..7
        number 8..9
        ; 9..10
        number 16..17
        >> 18..20
        number 21..22
        ; 22..23
        end 23..23
    "#]]
    .assert_eq(&dump(&lexer, "let a = 1; // c\n2 >> 3;"));
}

#[test]
fn keywords_are_contextual() {
    let lexer = lexer();
    let keyword = kind(&lexer, "let");
    let identifier = kind(&lexer, "identifier");

    let token = lex(&lexer, "let x", 0, mode_after(&lexer, &[]));
    assert_eq!(token.kind, keyword);
    assert_eq!(u32::from(token.range.end()), 3);
    assert_eq!(token.lookahead_len(), 1);

    assert_eq!(lex(&lexer, "let x", 0, mode_after(&lexer, &["let"])).kind, identifier);
    assert_eq!(lex(&lexer, "let x", 0, LexMode::ERROR).kind, keyword);
    assert_eq!(lex(&lexer, "letter", 0, mode_after(&lexer, &[])).kind, identifier);
}

#[test]
fn maximal_munch_prefers_valid_tokens() {
    let lexer = lexer();

    let inside_generic = mode_after(&lexer, &["<", "identifier"]);
    let token = lex(&lexer, ">>", 0, inside_generic);
    assert_eq!(token.kind, kind(&lexer, ">"));
    assert_eq!(token.range.len(), TextSize::new(1));

    let after_number = mode_after(&lexer, &["number"]);
    assert_eq!(lex(&lexer, ">>", 0, after_number).kind, kind(&lexer, ">>"));
    assert_eq!(lex(&lexer, ">>", 0, LexMode::ERROR).kind, kind(&lexer, ">>"));
    // Nothing valid matches, so the longest candidate wins.
    assert_eq!(lex(&lexer, ">>", 0, mode_after(&lexer, &[])).kind, kind(&lexer, ">>"));
}

#[test]
fn trivia_is_leading() {
    let lexer = lexer();
    let token = lex(&lexer, "  // hi\n x", 0, mode_after(&lexer, &[]));

    assert_eq!(token.kind, kind(&lexer, "identifier"));
    assert_eq!(format!("{:?}", token.range), "0..10");
    assert_eq!(format!("{:?}", token.text_range()), "9..10");
    let pieces: Vec<_> = token.leading.pieces().iter().map(|piece| piece.kind).collect();
    assert_eq!(pieces, [
        TriviaPieceKind::Whitespace,
        TriviaPieceKind::SingleLineComment,
        TriviaPieceKind::Newline,
        TriviaPieceKind::Whitespace,
    ]);

    let green = token.to_green();
    assert_eq!(green.text_len(), TextSize::new(10));
    assert_eq!(green.trimmed_len(), TextSize::new(1));
}

#[test]
fn end_token_carries_trailing_trivia() {
    let lexer = lexer();
    let token = lex(&lexer, "x  ", 1, LexMode::ERROR);

    assert_eq!(token.kind, KindId::END);
    assert_eq!(format!("{:?}", token.range), "1..3");
    assert_eq!(token.leading.len(), TextSize::new(2));
    assert_eq!(u32::from(token.lookahead_end), 4);

    let token = lex(&lexer, "12", 0, mode_after(&lexer, &[]));
    assert_eq!(token.kind, kind(&lexer, "number"));
    assert_eq!(u32::from(token.lookahead_end), 3);
}

#[test]
fn unknown_bytes_become_single_error_tokens() {
    let lexer = lexer();
    let token = lex(&lexer, " $$", 0, LexMode::ERROR);

    assert_eq!(token.kind, KindId::ERROR);
    assert_eq!(format!("{:?}", token.range), "0..2");
    assert_eq!(format!("{:?}", token.text_range()), "1..2");
}

#[test]
fn externals_are_scanned_only_where_valid() {
    let lexer = lexer();
    let text = "\"a b\"";

    let token = lex(&lexer, text, 1, mode_after(&lexer, &["\""]));
    assert_eq!(token.kind, kind(&lexer, "content"));
    assert_eq!(format!("{:?}", token.range), "1..4");
    assert!(token.leading.is_empty());
    assert_eq!(token.lookahead_len(), 1);

    assert_eq!(lex(&lexer, text, 1, LexMode::ERROR).kind, kind(&lexer, "identifier"));
    assert_eq!(lex(&lexer, text, 4, mode_after(&lexer, &["\""])).kind, kind(&lexer, "\""));
}

#[test]
fn scanner_must_cover_declared_tokens() {
    struct Partial;

    impl TokenScanner for Partial {
        fn tokens(&self) -> &'static [&'static str] {
            &["identifier"]
        }

        fn trivia(&self, _: &mut Cursor<'_>) -> Option<TriviaPieceKind> {
            None
        }

        fn scan(&self, cursor: &mut Cursor<'_>) -> Option<usize> {
            cursor.advance_while(|byte| byte.is_ascii_lowercase());
            Some(0)
        }
    }

    let error = Lexer::new(table(), Box::new(Partial)).unwrap_err();
    assert_eq!(error, ConfigurationError::UnscannedToken("number".into()));
}
