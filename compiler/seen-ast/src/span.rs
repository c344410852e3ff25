// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Source positions and ranges.
//!
//! Lines and columns are zero-based. Columns count UTF-16 code units so
//! that a [`Position`] can be handed to an LSP client without conversion.

/// Identifies the document a position was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(pub u32);

/// A point in a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Zero-based line
    pub line: u32,
    /// Zero-based column in UTF-16 code units
    pub column: u32,
    /// Byte offset from the start of the document
    pub offset: u32,
    /// Originating document
    pub source: SourceId,
}

impl Position {
    /// Create a position in the default source.
    pub const fn new(line: u32, column: u32, offset: u32) -> Self {
        Self {
            line,
            column,
            offset,
            source: SourceId(0),
        }
    }

    /// A position addressed only by line and column, as sent by editors.
    pub const fn at(line: u32, column: u32) -> Self {
        Self::new(line, column, 0)
    }
}

/// A range between two positions, half-open by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a new range.
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create an empty range at a position.
    pub const fn empty(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }

    /// Check if this range covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// Length of the range in bytes.
    pub const fn len(&self) -> u32 {
        self.end.offset - self.start.offset
    }

    /// Merge two ranges into one that covers both.
    pub fn merge(self, other: Self) -> Self {
        let start = if other.start.offset < self.start.offset {
            other.start
        } else {
            self.start
        };
        let end = if other.end.offset > self.end.offset {
            other.end
        } else {
            self.end
        };
        Self { start, end }
    }

    /// Check whether a line/column position lies within this range.
    ///
    /// Both the start column of the first line and the end column of the
    /// last line count as inside, so a cursor placed just after the final
    /// character of a name still resolves to it.
    pub fn contains(&self, pos: Position) -> bool {
        if pos.line < self.start.line || pos.line > self.end.line {
            return false;
        }
        if pos.line == self.start.line && pos.column < self.start.column {
            return false;
        }
        if pos.line == self.end.line && pos.column > self.end.column {
            return false;
        }
        true
    }

    /// Convert to a byte range for slicing.
    pub fn as_byte_range(&self) -> std::ops::Range<usize> {
        self.start.offset as usize..self.end.offset as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::new(Position::at(sl, sc), Position::at(el, ec))
    }

    #[test]
    fn test_range_contains_inclusive_bounds() {
        let r = range(2, 4, 2, 7);
        assert!(r.contains(Position::at(2, 4)));
        assert!(r.contains(Position::at(2, 5)));
        assert!(r.contains(Position::at(2, 7)));
        assert!(!r.contains(Position::at(2, 8)));
        assert!(!r.contains(Position::at(2, 3)));
        assert!(!r.contains(Position::at(1, 5)));
    }

    #[test]
    fn test_range_contains_multiline() {
        let r = range(1, 10, 3, 1);
        assert!(r.contains(Position::at(2, 0)));
        assert!(r.contains(Position::at(2, 99)));
        assert!(!r.contains(Position::at(1, 9)));
        assert!(!r.contains(Position::at(3, 2)));
    }

    #[test]
    fn test_range_merge() {
        let a = Range::new(Position::new(0, 2, 2), Position::new(0, 5, 5));
        let b = Range::new(Position::new(0, 4, 4), Position::new(1, 3, 9));
        let merged = a.merge(b);
        assert_eq!(merged.start.offset, 2);
        assert_eq!(merged.end.offset, 9);
        assert_eq!(merged.len(), 7);
    }
}
