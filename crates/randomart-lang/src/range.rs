use std::fmt::{self, Display, Formatter};

use miette::{SourceOffset, SourceSpan};
use nom_locate::LocatedSpan;

pub type Span<'a> = LocatedSpan<&'a str>;

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash)]
pub struct Position {
    pub line: u32,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Position {
    pub fn new(line: u32, column: usize) -> Self {
        Position { line, column }
    }

    fn offset(&self, source: &str) -> usize {
        SourceOffset::from_location(source, self.line as usize, self.column).offset()
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    /// Byte span of this range in `source`, at least one byte wide.
    pub fn source_span(&self, source: &str) -> SourceSpan {
        let start = self.start.offset(source);
        let end = self.end.offset(source);
        SourceSpan::new(start.into(), std::cmp::max(end.saturating_sub(start), 1))
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}

impl<'a> From<Span<'a>> for Range {
    fn from(span: Span<'a>) -> Self {
        let start = Position::from(span);
        Range {
            end: Position::new(start.line, start.column + span.fragment().chars().count()),
            start,
        }
    }
}

/// Forward-only cursor that turns spans of one source into ranges without
/// rescanning each line from its start.
#[derive(Debug, Clone)]
pub struct Columns<'a> {
    source: &'a str,
    offset: usize,
    position: Position,
}

impl<'a> Columns<'a> {
    pub fn new(source: &'a str) -> Self {
        Columns {
            source,
            offset: 0,
            position: Position::default(),
        }
    }

    /// Position of byte `offset`. Offsets must not decrease between calls.
    pub fn position(&mut self, offset: usize) -> Position {
        let offset = offset.clamp(self.offset, self.source.len());
        for c in self.source[self.offset..offset].chars() {
            if c == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
        self.offset = offset;
        self.position
    }

    pub fn range(&mut self, span: Span<'a>) -> Range {
        let start = self.position(span.location_offset());
        Range {
            end: Position::new(start.line, start.column + span.fragment().chars().count()),
            start,
        }
    }
}

impl<'a> From<Span<'a>> for Position {
    fn from(span: Span<'a>) -> Self {
        Position {
            line: span.location_line(),
            column: span.get_utf8_column(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::first_token("E(x, y, x)", Range::new(Position::new(1, 1), Position::new(1, 2)), (0, 1))]
    #[case::inner_token("E(x, y, x)", Range::new(Position::new(1, 3), Position::new(1, 4)), (2, 1))]
    #[case::empty_range_is_one_byte("E(x", Range::new(Position::new(1, 4), Position::new(1, 4)), (3, 1))]
    #[case::second_line("E(\n  sin(x)", Range::new(Position::new(2, 3), Position::new(2, 6)), (5, 3))]
    fn test_source_span(#[case] source: &str, #[case] range: Range, #[case] expected: (usize, usize)) {
        let span = range.source_span(source);
        assert_eq!((span.offset(), span.len()), expected);
    }

    #[test]
    fn test_columns() {
        let source = "E(x,\n  y, x)";
        let mut columns = Columns::new(source);

        assert_eq!(columns.position(0), Position::new(1, 1));
        assert_eq!(columns.position(2), Position::new(1, 3));
        assert_eq!(columns.position(7), Position::new(2, 3));
        assert_eq!(columns.position(source.len()), Position::new(2, 9));
    }

    #[test]
    fn test_columns_count_chars() {
        let mut columns = Columns::new("äöü x");
        assert_eq!(columns.position("äöü ".len()), Position::new(1, 5));
    }

    #[test]
    fn test_from_span() {
        let span = Span::new("mult");
        assert_eq!(
            Range::from(span),
            Range::new(Position::new(1, 1), Position::new(1, 5))
        );
    }
}
