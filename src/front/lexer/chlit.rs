use super::*;

impl<'s> Lexer<'s> {
    pub(super) fn read_char_lit(&mut self) -> CompileResult<Token<'s>> {
        let start = self.pos;
        self.bump(); // opening quote
        let mut count = 0usize;
        loop {
            match self.cur() {
                None | Some(b'\n') => return self.make_err(start, "unterminated char literal"),
                Some(b'\'') => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    self.read_escape(start, "char literal")?;
                    count += 1;
                }
                Some(_) => {
                    self.bump();
                    count += 1;
                }
            }
        }
        if count == 0 {
            return self.make_err(start, "empty char literal");
        }
        Ok(self.token_from(K::CharLit, start))
    }
}

/// Decode a char literal lexeme (including its quotes) that the lexer has
/// already validated. Multi-character literals take the first character,
/// as the usual implementations do.
pub fn unescape_char(raw: &str) -> u8 {
    let inner = raw[1..raw.len() - 1].as_bytes();
    if inner[0] == b'\\' {
        super::string::decode_escape(&inner[1..]).0
    } else {
        inner[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front::source::SourceBuffer;

    #[test]
    fn plain_and_escaped() {
        for (src, want) in [("'a'", b'a'), ("'\\n'", b'\n'), ("'\\0'", 0u8), ("'\\x41'", b'A')] {
            let buf = SourceBuffer::new("t.c", src, 0);
            let mut lx = Lexer::new(&buf);
            let t = lx.next_token().unwrap();
            assert_eq!(t.kind, K::CharLit);
            assert_eq!(unescape_char(t.lexeme), want, "{src}");
        }
    }

    #[test]
    fn unterminated_char_is_fatal() {
        let buf = SourceBuffer::new("t.c", "'a", 0);
        let mut lx = Lexer::new(&buf);
        assert!(lx.next_token().is_err());
    }
}
