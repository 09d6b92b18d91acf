//! Row/column lookup for byte offsets.

use std::fmt;

use text_size::TextSize;

/// Zero-based row and byte column.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// Start offsets of every line of a text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &[u8]) -> Self {
        let mut line_starts = Vec::with_capacity(text.len() / 32 + 1);
        line_starts.push(TextSize::new(0));
        line_starts
            .extend(memchr::memchr_iter(b'\n', text).map(|index| TextSize::new(index as u32 + 1)));
        Self { line_starts, len: TextSize::new(text.len() as u32) }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Offsets past the end of the text are clamped to it.
    pub fn point(&self, offset: TextSize) -> Point {
        let offset = offset.min(self.len);
        let row = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Point { row: row as u32, column: u32::from(offset - self.line_starts[row]) }
    }

    /// Returns `None` when the point lies beyond the end of its row.
    pub fn offset(&self, point: Point) -> Option<TextSize> {
        let start = *self.line_starts.get(point.row as usize)?;
        let end = self.line_starts.get(point.row as usize + 1).copied().unwrap_or(self.len);
        let offset = start + TextSize::new(point.column);
        (offset <= end).then_some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_use_byte_columns() {
        let index = LineIndex::new("ab\nçd\n\nx".as_bytes());

        assert_eq!(index.line_count(), 4);
        assert_eq!(index.point(0.into()), Point::new(0, 0));
        assert_eq!(index.point(2.into()), Point::new(0, 2));
        assert_eq!(index.point(3.into()), Point::new(1, 0));
        assert_eq!(index.point(6.into()), Point::new(1, 3));
        assert_eq!(index.point(7.into()), Point::new(2, 0));
        assert_eq!(index.point(8.into()), Point::new(3, 0));
        assert_eq!(index.point(100.into()), Point::new(3, 1));
    }

    #[test]
    fn offsets_round_trip_through_points() {
        let text = "fun main() {\n    var x = 1;\n}\n";
        let index = LineIndex::new(text.as_bytes());

        for offset in 0..=text.len() as u32 {
            let point = index.point(offset.into());
            assert_eq!(index.offset(point), Some(offset.into()));
        }
        assert_eq!(index.offset(Point::new(0, 40)), None);
        assert_eq!(index.offset(Point::new(9, 0)), None);
    }
}
