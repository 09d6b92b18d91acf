use razen_tokenizer::{Cursor, TokenScanner};
use razen_yellow::TriviaPieceKind;

const IDENTIFIER: usize = 0;
const INTEGER: usize = 1;
const FLOAT: usize = 2;

const STRING_CONTENT: usize = 0;
const FSTRING_CONTENT: usize = 1;
const ESCAPE_SEQUENCE: usize = 2;

/// Trivia, identifiers, numbers and the inside of string literals.
pub(crate) struct RazenScanner;

impl TokenScanner for RazenScanner {
    fn tokens(&self) -> &'static [&'static str] {
        &["identifier", "integer_literal", "float_literal"]
    }

    fn externals(&self) -> &'static [&'static str] {
        &["string_content", "fstring_content", "escape_sequence"]
    }

    fn trivia(&self, cursor: &mut Cursor<'_>) -> Option<TriviaPieceKind> {
        if cursor.is_eof() {
            return None;
        }
        let kind = match (cursor.peek(), cursor.second()) {
            (b'\n', _) => {
                cursor.advance();
                TriviaPieceKind::Newline
            }
            (b'\r', b'\n') => {
                cursor.advance();
                cursor.advance();
                TriviaPieceKind::Newline
            }
            (b'/', b'/') => {
                cursor.advance_while(|byte| byte != b'\n');
                TriviaPieceKind::SingleLineComment
            }
            (b'/', b'*') => {
                block_comment(cursor);
                TriviaPieceKind::MultiLineComment
            }
            (byte, _) if is_whitespace(byte) => {
                cursor.advance_while(is_whitespace);
                TriviaPieceKind::Whitespace
            }
            _ => return None,
        };
        Some(kind)
    }

    fn scan(&self, cursor: &mut Cursor<'_>) -> Option<usize> {
        if cursor.is_eof() {
            return None;
        }
        match cursor.peek() {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                cursor.advance_while(|byte| byte.is_ascii_alphanumeric() || byte == b'_');
                Some(IDENTIFIER)
            }
            b'0'..=b'9' => Some(number(cursor)),
            _ => None,
        }
    }

    fn scan_external(&self, cursor: &mut Cursor<'_>, valid: &[bool]) -> Option<usize> {
        if cursor.is_eof() {
            return None;
        }
        match cursor.peek() {
            b'"' => None,
            b'\\' => (valid[ESCAPE_SEQUENCE] && escape_sequence(cursor)).then_some(ESCAPE_SEQUENCE),
            _ if valid[STRING_CONTENT] => {
                cursor.advance_while(|byte| !matches!(byte, b'"' | b'\\'));
                Some(STRING_CONTENT)
            }
            b'{' => None,
            _ if valid[FSTRING_CONTENT] => {
                cursor.advance_while(|byte| !matches!(byte, b'"' | b'\\' | b'{'));
                Some(FSTRING_CONTENT)
            }
            _ => None,
        }
    }
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\x0b' | b'\x0c')
}

/// `/* ... */`, not nested. An unterminated comment runs to the end.
fn block_comment(cursor: &mut Cursor<'_>) {
    cursor.advance();
    cursor.advance();
    while !cursor.is_eof() {
        if cursor.eat_bytes(b"*/") {
            return;
        }
        cursor.advance();
    }
}

/// Integers with an optional `0x`, `0b` or `0o` radix prefix, and floats
/// with a fraction and an optional exponent. `_` separates digits.
fn number(cursor: &mut Cursor<'_>) -> usize {
    if cursor.peek() == b'0'
        && let Some(is_digit) = radix_digit(cursor.second())
        && is_digit(cursor.nth(2))
    {
        cursor.advance();
        cursor.advance();
        cursor.advance_while(|byte| is_digit(byte) || byte == b'_');
        return INTEGER;
    }

    digits(cursor);
    if !(cursor.matches(b'.') && cursor.second().is_ascii_digit()) {
        return INTEGER;
    }
    cursor.advance();
    digits(cursor);

    let sign = usize::from(matches!(cursor.second(), b'+' | b'-'));
    if matches!(cursor.peek(), b'e' | b'E') && cursor.nth(1 + sign).is_ascii_digit() {
        for _ in 0..=sign {
            cursor.advance();
        }
        cursor.advance_while(|byte| byte.is_ascii_digit());
    }
    FLOAT
}

fn digits(cursor: &mut Cursor<'_>) {
    cursor.advance_while(|byte| byte.is_ascii_digit() || byte == b'_');
}

fn radix_digit(prefix: u8) -> Option<fn(u8) -> bool> {
    match prefix {
        b'x' => Some(|byte| byte.is_ascii_hexdigit()),
        b'b' => Some(|byte| matches!(byte, b'0' | b'1')),
        b'o' => Some(|byte| matches!(byte, b'0'..=b'7')),
        _ => None,
    }
}

/// `\` followed by one of `nrt\'"`, or by `x`, `u` or `U` and two, four or
/// eight hex digits.
fn escape_sequence(cursor: &mut Cursor<'_>) -> bool {
    cursor.advance();
    let hex_digits = match cursor.peek() {
        b'n' | b'r' | b't' | b'\\' | b'\'' | b'"' => 0,
        b'x' => 2,
        b'u' => 4,
        b'U' => 8,
        _ => return false,
    };
    if (1..=hex_digits).any(|n| !cursor.nth(n).is_ascii_hexdigit()) {
        return false;
    }
    for _ in 0..=hex_digits {
        cursor.advance();
    }
    true
}
