//! Byte offset <-> line number conversion

use super::Span;

/// Start offsets of every line in a source string
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(index, _)| index + 1));
        Self {
            starts,
            len: source.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// 1-based line containing `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }

    /// Byte range of a 1-based line, without its line break
    pub fn line_span(&self, line: usize) -> Option<Span> {
        if line == 0 || line > self.starts.len() {
            return None;
        }
        let start = self.starts[line - 1];
        let end = self
            .starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        Some(Span::new(start, end))
    }

    /// First and last line touched by `span`
    pub fn lines_of(&self, span: Span) -> (usize, usize) {
        let first = self.line_of(span.start);
        let last = if span.end > span.start {
            self.line_of(span.end - 1)
        } else {
            first
        };
        (first, last)
    }

    /// 1-based column of `offset` within its line, counted in bytes
    pub fn column_of(&self, offset: usize) -> usize {
        let line = self.line_of(offset);
        offset - self.starts[line - 1] + 1
    }

    /// Byte offset of a 1-based line and column, clamped to the line end
    pub fn offset_at(&self, line: usize, column: usize) -> Option<usize> {
        let span = self.line_span(line)?;
        Some((span.start + column.saturating_sub(1)).min(span.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lookup() {
        let index = LineIndex::new("var x = {\n  f: 1\n}\n");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(9), 1);
        assert_eq!(index.line_of(10), 2);
        assert_eq!(index.line_of(17), 3);
        assert_eq!(index.line_span(2), Some(Span::new(10, 16)));
        assert_eq!(index.line_span(5), None);
        assert_eq!(index.lines_of(Span::new(4, 19)), (1, 3));
        assert_eq!(index.column_of(12), 3);
        assert_eq!(index.offset_at(2, 3), Some(12));
        assert_eq!(index.offset_at(2, 99), Some(16));
        assert_eq!(index.offset_at(9, 1), None);
    }
}
