use super::*;

/// Integer/floating classification is deferred until the AST node is
/// built; the lexeme is kept intact for that.
pub fn is_float_lexeme(s: &str) -> bool {
    if s.starts_with("0x") || s.starts_with("0X") {
        return false;
    }
    s.contains('.') || s.contains('e') || s.contains('E')
}

impl<'s> Lexer<'s> {
    pub(super) fn read_number(&mut self) -> CompileResult<Token<'s>> {
        let start = self.pos;
        let mut is_float = false;

        if self.cur() == Some(b'0') && matches!(self.peek(1), Some(b'x' | b'X')) {
            // hexadecimal integer constant
            self.bump();
            self.bump();
            let mut saw_hex = false;
            while let Some(b) = self.cur() {
                if b.is_ascii_hexdigit() {
                    self.bump();
                    saw_hex = true;
                } else {
                    break;
                }
            }
            if !saw_hex {
                return self.make_err(start, "missing digits after 0x");
            }
        } else {
            while let Some(b) = self.cur() {
                if b.is_ascii_digit() {
                    self.bump();
                } else {
                    break;
                }
            }
            // optional fractional part (covers `1.`, `.5` arrives here via
            // the dispatch in next_token)
            if self.cur() == Some(b'.') {
                is_float = true;
                self.bump();
                while let Some(b) = self.cur() {
                    if b.is_ascii_digit() {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            // optional exponent
            if matches!(self.cur(), Some(b'e' | b'E')) {
                is_float = true;
                self.bump();
                if matches!(self.cur(), Some(b'+' | b'-')) {
                    self.bump();
                }
                let mut saw_exp = false;
                while let Some(b) = self.cur() {
                    if b.is_ascii_digit() {
                        self.bump();
                        saw_exp = true;
                    } else {
                        break;
                    }
                }
                if !saw_exp {
                    return self.make_err(start, "missing exponent digits");
                }
            }
        }

        // suffixes: u/U, up to two l/L, f/F
        let mut u = false;
        let mut l = 0u8;
        let mut f = false;
        loop {
            match self.cur() {
                Some(b'u' | b'U') => {
                    if u {
                        return self.make_err(start, "duplicate 'u' suffix");
                    }
                    u = true;
                    self.bump();
                }
                Some(b'l' | b'L') => {
                    if l >= 2 {
                        return self.make_err(start, "too many 'l' suffixes");
                    }
                    l += 1;
                    self.bump();
                }
                Some(b'f' | b'F') => {
                    if f {
                        return self.make_err(start, "duplicate 'f' suffix");
                    }
                    f = true;
                    self.bump();
                }
                _ => break,
            }
        }
        if is_float && u {
            return self.make_err(start, "'u' suffix on floating constant");
        }
        if !is_float && f {
            return self.make_err(start, "'f' suffix on integer constant");
        }

        Ok(self.token_from(K::NumLit, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front::source::SourceBuffer;

    fn lex_one(src: &str) -> (K, String) {
        let buf = SourceBuffer::new("t.c", src, 0);
        let mut lx = Lexer::new(&buf);
        let t = lx.next_token().expect("lex");
        (t.kind, t.lexeme.to_string())
    }

    #[test]
    fn integer_forms() {
        for src in ["0", "42", "0x1F", "100u", "7L", "123ull"] {
            let (kind, lexeme) = lex_one(src);
            assert_eq!(kind, K::NumLit);
            assert_eq!(lexeme, src);
            assert!(!is_float_lexeme(&lexeme), "{src}");
        }
    }

    #[test]
    fn floating_forms() {
        for src in ["1.0", "1.", ".5", "3e8", "2.5e-3", "1.0f"] {
            let (kind, lexeme) = lex_one(src);
            assert_eq!(kind, K::NumLit);
            assert!(is_float_lexeme(&lexeme), "{src}");
        }
    }

    #[test]
    fn malformed_exponent() {
        let buf = SourceBuffer::new("t.c", "1e+", 0);
        let mut lx = Lexer::new(&buf);
        assert!(lx.next_token().is_err());
    }
}
