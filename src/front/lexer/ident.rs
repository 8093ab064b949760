use super::*;

impl<'s> Lexer<'s> {
    pub(super) fn read_ident_or_kw(&mut self) -> Token<'s> {
        let start = self.pos;
        self.bump();
        while let Some(b) = self.cur() {
            if Lexer::is_ident_continue(b) {
                self.bump();
            } else {
                break;
            }
        }
        let lexeme = &self.buf.text()[start..self.pos];
        let kind = K::from_keyword(lexeme).unwrap_or(K::Ident);
        self.token_from(kind, start)
    }
}
