//! Token cursor over the lexer: the current token plus a single-slot
//! cache for one-token lookahead.

use crate::error::{CompileError, CompileResult};
use crate::front::lexer::Lexer;
use crate::front::token::{Token, TokenKind as K};

pub struct TokenStream<'s> {
    lexer: Lexer<'s>,
    current: Token<'s>,
    cache: Option<Token<'s>>,
}

impl<'s> TokenStream<'s> {
    pub fn new(mut lexer: Lexer<'s>) -> CompileResult<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current, cache: None })
    }

    pub fn current(&self) -> Token<'s> {
        self.current
    }

    /// Advance, returning the token that was current. Uses the cache if
    /// `peek_next` populated it, else pulls from the lexer.
    pub fn bump(&mut self) -> CompileResult<Token<'s>> {
        let prev = self.current;
        self.current = match self.cache.take() {
            Some(t) => t,
            None => self.lexer.next_token()?,
        };
        Ok(prev)
    }

    /// The token after the current one, without advancing.
    pub fn peek_next(&mut self) -> CompileResult<Token<'s>> {
        if let Some(t) = self.cache {
            return Ok(t);
        }
        let t = self.lexer.next_token()?;
        self.cache = Some(t);
        Ok(t)
    }

    pub fn check(&self, kind: K) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token iff it has the given kind.
    pub fn matches(&mut self, kind: K) -> CompileResult<bool> {
        if self.check(kind) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn expect(&mut self, kind: K) -> CompileResult<Token<'s>> {
        if self.check(kind) {
            self.bump()
        } else {
            Err(CompileError::unexpected(
                format!("expected {}, found {}", kind, self.current.kind),
                self.current.span,
            ))
        }
    }

    /// Recovery helper: advance until the given kind (or end of file).
    pub fn skip_until(&mut self, kind: K, inclusive: bool) -> CompileResult<()> {
        while !self.check(kind) && !self.check(K::Eof) {
            self.bump()?;
        }
        if inclusive && self.check(kind) {
            self.bump()?;
        }
        Ok(())
    }
}
