//! Hand-written scanner. Tokens are pulled one at a time; any malformed
//! input is fatal with the offending span.

use crate::error::{CompileError, CompileResult};
use crate::front::source::SourceBuffer;
use crate::front::token::{Token, TokenKind as K};

mod chlit;
mod ident;
mod number;
mod punct;
mod string;

pub use chlit::unescape_char;
pub use number::is_float_lexeme;
pub use string::unescape_string;

pub struct Lexer<'s> {
    buf: &'s SourceBuffer,
    bytes: &'s [u8],
    pos: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(buf: &'s SourceBuffer) -> Self {
        Self { buf, bytes: buf.text().as_bytes(), pos: 0 }
    }

    // --- low-level helpers shared by the submodules ---
    fn eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn cur(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.bytes.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn token_from(&self, kind: K, start: usize) -> Token<'s> {
        Token {
            kind,
            lexeme: &self.buf.text()[start..self.pos],
            span: self.buf.span(start, self.pos),
        }
    }

    fn make_err<T>(&self, start: usize, msg: &str) -> CompileResult<T> {
        Err(CompileError::lex(msg, self.buf.span(start, self.pos.max(start + 1))))
    }

    // predicates
    fn is_ident_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_'
    }

    fn is_ident_continue(b: u8) -> bool {
        Self::is_ident_start(b) || b.is_ascii_digit()
    }

    fn skip_ws_and_comments(&mut self) -> CompileResult<()> {
        loop {
            while let Some(b) = self.cur() {
                if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                    self.bump();
                } else {
                    break;
                }
            }
            // line comments: // to end of line
            if self.cur() == Some(b'/') && self.peek(1) == Some(b'/') {
                while let Some(b) = self.cur() {
                    if b == b'\n' {
                        break;
                    }
                    self.bump();
                }
                continue;
            }
            // block comments /* ... */, non-nesting
            if self.cur() == Some(b'/') && self.peek(1) == Some(b'*') {
                let start = self.pos;
                self.bump();
                self.bump();
                let mut closed = false;
                while let Some(b) = self.cur() {
                    if b == b'*' && self.peek(1) == Some(b'/') {
                        self.bump();
                        self.bump();
                        closed = true;
                        break;
                    }
                    self.bump();
                }
                if !closed {
                    return self.make_err(start, "unterminated block comment");
                }
                continue;
            }
            break;
        }
        Ok(())
    }

    /// Classify and return the next token. After the end of the buffer this
    /// keeps returning `Eof`.
    pub fn next_token(&mut self) -> CompileResult<Token<'s>> {
        self.skip_ws_and_comments()?;
        if self.eof() {
            return Ok(Token {
                kind: K::Eof,
                lexeme: "",
                span: self.buf.span(self.pos, self.pos),
            });
        }
        let b = self.cur().unwrap();

        if Self::is_ident_start(b) {
            return Ok(self.read_ident_or_kw());
        }
        if b.is_ascii_digit() {
            return self.read_number();
        }
        if b == b'.' && self.peek(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
            return self.read_number();
        }
        match b {
            b'"' => self.read_string(),
            b'\'' => self.read_char_lit(),
            _ => self.read_punct(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_kinds(src: &str) -> Vec<K> {
        let buf = SourceBuffer::new("t.c", src, 0);
        let mut lx = Lexer::new(&buf);
        let mut out = Vec::new();
        loop {
            let t = lx.next_token().expect("lex");
            let done = t.kind == K::Eof;
            out.push(t.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            lex_kinds("int main _Bool _Thread_local x1"),
            vec![K::Int, K::Ident, K::Bool, K::ThreadLocal, K::Ident, K::Eof]
        );
    }

    #[test]
    fn longest_match_operators() {
        assert_eq!(
            lex_kinds("<<= << <= < ->++ ..."),
            vec![K::ShlAssign, K::Shl, K::Le, K::Lt, K::Arrow, K::Inc, K::Ellipsis, K::Eof]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            lex_kinds("a // line\n /* block\n still */ b"),
            vec![K::Ident, K::Ident, K::Eof]
        );
    }

    #[test]
    fn eof_is_idempotent() {
        let buf = SourceBuffer::new("t.c", "x", 0);
        let mut lx = Lexer::new(&buf);
        assert_eq!(lx.next_token().unwrap().kind, K::Ident);
        assert_eq!(lx.next_token().unwrap().kind, K::Eof);
        assert_eq!(lx.next_token().unwrap().kind, K::Eof);
        assert_eq!(lx.next_token().unwrap().kind, K::Eof);
    }

    #[test]
    fn unknown_punctuation_is_fatal() {
        let buf = SourceBuffer::new("t.c", "int @", 0);
        let mut lx = Lexer::new(&buf);
        assert_eq!(lx.next_token().unwrap().kind, K::Int);
        assert!(lx.next_token().is_err());
    }

    #[test]
    fn lexeme_round_trip() {
        let src = "int main(void) { return a[1] + 2 * x_3; }";
        let buf = SourceBuffer::new("t.c", src, 0);
        let mut lx = Lexer::new(&buf);
        let mut lexemes = Vec::new();
        loop {
            let t = lx.next_token().unwrap();
            if t.kind == K::Eof {
                break;
            }
            lexemes.push(t.lexeme.to_string());
        }
        let rebuilt = lexemes.join(" ");
        let buf2 = SourceBuffer::new("t.c", rebuilt.clone(), 0);
        let mut lx2 = Lexer::new(&buf2);
        let mut kinds2 = Vec::new();
        loop {
            let t = lx2.next_token().unwrap();
            if t.kind == K::Eof {
                break;
            }
            kinds2.push(t.kind);
        }
        let kinds1 = lex_kinds(src);
        assert_eq!(&kinds1[..kinds1.len() - 1], &kinds2[..]);
    }
}
