//! Source buffer: owns the text of one translation unit and maps byte
//! offsets back to line/column for diagnostics.

use crate::front::token::Span;

pub struct SourceBuffer {
    name: String,
    text: String,
    file: u32,
    line_starts: Vec<u32>,
}

impl SourceBuffer {
    pub fn new(name: impl Into<String>, text: impl Into<String>, file: u32) -> Self {
        let text = text.into();
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { name: name.into(), text, file, line_starts }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_id(&self) -> u32 {
        self.file
    }

    pub fn span(&self, lo: usize, hi: usize) -> Span {
        Span { file: self.file, lo: lo as u32, hi: hi as u32 }
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[line] + 1;
        (line as u32 + 1, col)
    }

    pub fn slice(&self, span: Span) -> &str {
        &self.text[span.lo as usize..span.hi as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_mapping() {
        let buf = SourceBuffer::new("t.c", "int x;\nint y;\n", 0);
        assert_eq!(buf.line_col(0), (1, 1));
        assert_eq!(buf.line_col(4), (1, 5));
        assert_eq!(buf.line_col(7), (2, 1));
        assert_eq!(buf.line_col(11), (2, 5));
    }

    #[test]
    fn span_slicing() {
        let buf = SourceBuffer::new("t.c", "return 0;", 0);
        let sp = buf.span(7, 8);
        assert_eq!(buf.slice(sp), "0");
    }
}
