use super::*;

impl<'s> Lexer<'s> {
    pub(super) fn read_string(&mut self) -> CompileResult<Token<'s>> {
        let start = self.pos;
        self.bump(); // opening quote
        loop {
            match self.cur() {
                None | Some(b'\n') => return self.make_err(start, "unterminated string literal"),
                Some(b'"') => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    self.read_escape(start, "string literal")?;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        Ok(self.token_from(K::StrLit, start))
    }

    /// Validates one escape sequence after the backslash has been consumed.
    pub(super) fn read_escape(&mut self, start: usize, what: &str) -> CompileResult<()> {
        match self.cur() {
            None => self.make_err(start, &format!("unterminated {what}")),
            Some(
                b'\'' | b'"' | b'\\' | b'?' | b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v',
            ) => {
                self.bump();
                Ok(())
            }
            Some(b'x') => {
                self.bump();
                let mut saw = false;
                while let Some(c) = self.cur() {
                    if c.is_ascii_hexdigit() {
                        self.bump();
                        saw = true;
                    } else {
                        break;
                    }
                }
                if !saw {
                    return self.make_err(start, "\\x escape requires at least one hex digit");
                }
                Ok(())
            }
            Some(c) if (b'0'..=b'7').contains(&c) => {
                let mut k = 0;
                while k < 3 {
                    match self.cur() {
                        Some(d) if (b'0'..=b'7').contains(&d) => {
                            self.bump();
                            k += 1;
                        }
                        _ => break,
                    }
                }
                Ok(())
            }
            Some(_) => self.make_err(start, &format!("invalid escape sequence in {what}")),
        }
    }
}

/// Decode a string literal lexeme (including its quotes) that the lexer has
/// already validated.
pub fn unescape_string(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let bytes = inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i] as char);
            i += 1;
            continue;
        }
        i += 1;
        let (ch, used) = decode_escape(&bytes[i..]);
        out.push(ch as char);
        i += used;
    }
    out
}

pub(super) fn decode_escape(bytes: &[u8]) -> (u8, usize) {
    match bytes[0] {
        b'n' => (b'\n', 1),
        b't' => (b'\t', 1),
        b'r' => (b'\r', 1),
        b'a' => (0x07, 1),
        b'b' => (0x08, 1),
        b'f' => (0x0C, 1),
        b'v' => (0x0B, 1),
        b'x' => {
            let mut v: u32 = 0;
            let mut n = 1;
            while n < bytes.len() && bytes[n].is_ascii_hexdigit() {
                v = v.wrapping_mul(16) + (bytes[n] as char).to_digit(16).unwrap();
                n += 1;
            }
            (v as u8, n)
        }
        c @ b'0'..=b'7' => {
            let mut v: u32 = (c - b'0') as u32;
            let mut n = 1;
            while n < 3 && n < bytes.len() && (b'0'..=b'7').contains(&bytes[n]) {
                v = v * 8 + (bytes[n] - b'0') as u32;
                n += 1;
            }
            (v as u8, n)
        }
        c => (c, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front::source::SourceBuffer;

    #[test]
    fn string_with_escapes() {
        let buf = SourceBuffer::new("t.c", r#""a\tb\n\x41\0""#, 0);
        let mut lx = Lexer::new(&buf);
        let t = lx.next_token().unwrap();
        assert_eq!(t.kind, K::StrLit);
        assert_eq!(unescape_string(t.lexeme), "a\tb\nA\0");
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let buf = SourceBuffer::new("t.c", "\"abc", 0);
        let mut lx = Lexer::new(&buf);
        assert!(lx.next_token().is_err());
    }

    #[test]
    fn invalid_escape_is_fatal() {
        let buf = SourceBuffer::new("t.c", r#""\q""#, 0);
        let mut lx = Lexer::new(&buf);
        assert!(lx.next_token().is_err());
    }
}
