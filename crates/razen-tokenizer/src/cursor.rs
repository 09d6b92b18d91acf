use std::cell::Cell;

pub const EOF_BYTE: u8 = b'\0';

/// Byte cursor handed to scanners.
///
/// Every byte read through [`Cursor::peek`] and friends is recorded, so the
/// lexer knows how far past a token the decision to produce it looked.
/// Reading at the end of the text counts as examining one byte past it.
pub struct Cursor<'t> {
    text: &'t [u8],
    pos: usize,
    examined: Cell<usize>,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(text: &'t [u8], pos: usize) -> Self {
        Self { text, pos, examined: Cell::new(pos) }
    }

    #[inline]
    fn examine(&self, index: usize) {
        if index >= self.examined.get() {
            self.examined.set(index + 1);
        }
    }

    pub fn nth(&self, n: usize) -> u8 {
        let index = self.pos + n;
        self.examine(index);
        self.text.get(index).copied().unwrap_or(EOF_BYTE)
    }

    pub fn peek(&self) -> u8 {
        self.nth(0)
    }

    pub fn second(&self) -> u8 {
        self.nth(1)
    }

    pub fn is_eof(&self) -> bool {
        self.examine(self.pos);
        self.pos >= self.text.len()
    }

    /// Whether the next byte is `byte`; never true at the end of the text.
    pub fn matches(&self, byte: u8) -> bool {
        !self.is_eof() && self.peek() == byte
    }

    pub fn advance(&mut self) -> u8 {
        let byte = self.peek();
        if self.pos < self.text.len() {
            self.pos += 1;
        }
        byte
    }

    pub fn advance_while(&mut self, f: impl Fn(u8) -> bool) {
        while !self.is_eof() && f(self.peek()) {
            self.pos += 1;
        }
    }

    pub fn eat(&mut self, byte: u8) -> bool {
        let matches = self.matches(byte);
        if matches {
            self.pos += 1;
        }
        matches
    }

    /// Consumes `bytes` if the text continues with them. Only the bytes up
    /// to the first mismatch count as examined.
    pub fn eat_bytes(&mut self, bytes: &[u8]) -> bool {
        let matches = bytes
            .iter()
            .enumerate()
            .all(|(n, &byte)| self.nth(n) == byte && self.pos + n < self.text.len());
        if matches {
            self.pos += bytes.len();
        }
        matches
    }

    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    /// Moves back to `offset`; what was examined stays examined.
    pub(crate) fn rewind(&mut self, offset: usize) {
        self.pos = offset;
    }

    pub(crate) fn examined(&self) -> usize {
        self.examined.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examined_extent_grows_with_reads() {
        let mut cursor = Cursor::new(b"abc", 0);
        assert_eq!(cursor.examined(), 0);

        assert_eq!(cursor.second(), b'b');
        assert_eq!(cursor.examined(), 2);
        cursor.advance_while(|byte| byte != b'c');
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.examined(), 3);

        cursor.advance();
        assert!(cursor.is_eof());
        assert_eq!(cursor.peek(), EOF_BYTE);
        assert_eq!(cursor.examined(), 4);
    }

    #[test]
    fn eat_bytes_stops_at_mismatch() {
        let mut cursor = Cursor::new(b"a=>b", 1);
        assert!(!cursor.eat_bytes(b"=="));
        assert_eq!(cursor.examined(), 3);
        assert_eq!(cursor.offset(), 1);

        assert!(cursor.eat_bytes(b"=>"));
        assert_eq!(cursor.offset(), 3);

        let mut cursor = Cursor::new(b"=", 0);
        assert!(!cursor.eat_bytes(b"=="));
        assert_eq!(cursor.examined(), 2);
    }
}
