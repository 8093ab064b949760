//! Statement parsing: one subparser per statement keyword, plus compound
//! statements, which open a scope and collect block items.

use super::*;
use crate::front::ast::{Stmt, StmtId, StmtKind};

impl<'s> Parser<'s> {
    pub(crate) fn parse_statement(&mut self) -> CompileResult<StmtId> {
        let t = self.ts.current();
        if t.kind == K::Ident && self.ts.peek_next()?.kind == K::Colon {
            return self.parse_labeled_stmt();
        }
        match t.kind {
            K::LBrace => self.parse_compound_stmt(),
            K::Return => {
                let kw = self.ts.bump()?;
                if self.ts.matches(K::Semicolon)? {
                    return Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::Return(None), span: kw.span }));
                }
                let value = self.parse_expr()?;
                let semi = self.ts.expect(K::Semicolon)?;
                Ok(self.ctx.alloc_stmt(Stmt {
                    kind: StmtKind::Return(Some(value)),
                    span: kw.span.to(semi.span),
                }))
            }
            K::If => self.parse_if_stmt(),
            K::While => self.parse_while_stmt(),
            K::Do => self.parse_do_while_stmt(),
            K::For => self.parse_for_stmt(),
            K::Switch => self.parse_switch_stmt(),
            K::Case => self.parse_case_stmt(),
            K::Default => self.parse_default_stmt(),
            K::Break => {
                let kw = self.ts.bump()?;
                self.ts.expect(K::Semicolon)?;
                Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::Break, span: kw.span }))
            }
            K::Continue => {
                let kw = self.ts.bump()?;
                self.ts.expect(K::Semicolon)?;
                Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::Continue, span: kw.span }))
            }
            K::Goto => Err(CompileError::unimplemented("'goto'", t.span)),
            K::Semicolon => {
                let semi = self.ts.bump()?;
                Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::Empty, span: semi.span }))
            }
            _ => {
                let expr = self.parse_expr()?;
                let semi = self.ts.expect(K::Semicolon)?;
                let span = self.ctx.expr(expr).span.to(semi.span);
                Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::Expr(expr), span }))
            }
        }
    }

    /// Block items are declarations when the current token is a type-token
    /// and the next is not ':' (which would make it a label).
    pub(crate) fn parse_compound_stmt(&mut self) -> CompileResult<StmtId> {
        let l = self.ts.expect(K::LBrace)?;
        self.scoped(|p| {
            let mut stmts = Vec::new();
            while !p.ts.check(K::RBrace) {
                if p.ts.check(K::Eof) {
                    return Err(CompileError::unexpected(
                        "unexpected end of file inside a block",
                        p.ts.current().span,
                    ));
                }
                if p.at_type_token() && p.ts.peek_next()?.kind != K::Colon {
                    stmts.push(p.parse_decl_stmt()?);
                } else {
                    stmts.push(p.parse_statement()?);
                }
            }
            let r = p.ts.expect(K::RBrace)?;
            Ok(p.ctx.alloc_stmt(Stmt { kind: StmtKind::Compound(stmts), span: l.span.to(r.span) }))
        })
    }

    fn parse_if_stmt(&mut self) -> CompileResult<StmtId> {
        let kw = self.ts.expect(K::If)?;
        self.ts.expect(K::LParen)?;
        let cond = self.parse_expr()?;
        self.ts.expect(K::RParen)?;
        let then_stmt = self.parse_statement()?;
        let else_stmt =
            if self.ts.matches(K::Else)? { Some(self.parse_statement()?) } else { None };
        let end = else_stmt.unwrap_or(then_stmt);
        let span = kw.span.to(self.ctx.stmt(end).span);
        Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::If { cond, then_stmt, else_stmt }, span }))
    }

    fn parse_while_stmt(&mut self) -> CompileResult<StmtId> {
        let kw = self.ts.expect(K::While)?;
        self.ts.expect(K::LParen)?;
        let cond = self.parse_expr()?;
        self.ts.expect(K::RParen)?;
        let body = self.parse_statement()?;
        let span = kw.span.to(self.ctx.stmt(body).span);
        Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::While { cond, body }, span }))
    }

    fn parse_do_while_stmt(&mut self) -> CompileResult<StmtId> {
        let kw = self.ts.expect(K::Do)?;
        let body = self.parse_statement()?;
        self.ts.expect(K::While)?;
        self.ts.expect(K::LParen)?;
        let cond = self.parse_expr()?;
        self.ts.expect(K::RParen)?;
        let semi = self.ts.expect(K::Semicolon)?;
        Ok(self.ctx.alloc_stmt(Stmt {
            kind: StmtKind::DoWhile { cond, body },
            span: kw.span.to(semi.span),
        }))
    }

    /// `for ( init-stmt cond-stmt [step] ) body`; the two statement headers
    /// each consume their own ';'. The whole loop gets its own scope so an
    /// init declaration stays local to it.
    fn parse_for_stmt(&mut self) -> CompileResult<StmtId> {
        let kw = self.ts.expect(K::For)?;
        self.ts.expect(K::LParen)?;
        self.scoped(|p| {
            let init = if p.ts.matches(K::Semicolon)? {
                None
            } else if p.at_type_token() {
                Some(p.parse_decl_stmt()?)
            } else {
                let e = p.parse_expr()?;
                let semi = p.ts.expect(K::Semicolon)?;
                let span = p.ctx.expr(e).span.to(semi.span);
                Some(p.ctx.alloc_stmt(Stmt { kind: StmtKind::Expr(e), span }))
            };
            let cond = if p.ts.matches(K::Semicolon)? {
                None
            } else {
                let e = p.parse_expr()?;
                p.ts.expect(K::Semicolon)?;
                Some(e)
            };
            let step = if p.ts.check(K::RParen) { None } else { Some(p.parse_expr()?) };
            p.ts.expect(K::RParen)?;
            let body = p.parse_statement()?;
            let span = kw.span.to(p.ctx.stmt(body).span);
            Ok(p.ctx.alloc_stmt(Stmt { kind: StmtKind::For { init, cond, step, body }, span }))
        })
    }

    /// The switch body must be a braced compound statement.
    fn parse_switch_stmt(&mut self) -> CompileResult<StmtId> {
        let kw = self.ts.expect(K::Switch)?;
        self.ts.expect(K::LParen)?;
        let cond = self.parse_expr()?;
        self.ts.expect(K::RParen)?;
        if !self.ts.check(K::LBrace) {
            return Err(CompileError::unexpected(
                "switch body must be a compound statement",
                self.ts.current().span,
            ));
        }
        let body = self.parse_compound_stmt()?;
        let span = kw.span.to(self.ctx.stmt(body).span);
        Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::Switch { cond, body }, span }))
    }

    fn parse_case_stmt(&mut self) -> CompileResult<StmtId> {
        let kw = self.ts.expect(K::Case)?;
        let value = self.parse_constant_expr()?;
        self.ts.expect(K::Colon)?;
        let body = self.parse_statement()?;
        let span = kw.span.to(self.ctx.stmt(body).span);
        Ok(self.ctx.alloc_stmt(Stmt {
            kind: StmtKind::Case { value: Some(value), body, is_default: false },
            span,
        }))
    }

    fn parse_default_stmt(&mut self) -> CompileResult<StmtId> {
        let kw = self.ts.expect(K::Default)?;
        self.ts.expect(K::Colon)?;
        let body = self.parse_statement()?;
        let span = kw.span.to(self.ctx.stmt(body).span);
        Ok(self.ctx.alloc_stmt(Stmt {
            kind: StmtKind::Case { value: None, body, is_default: true },
            span,
        }))
    }

    fn parse_labeled_stmt(&mut self) -> CompileResult<StmtId> {
        let name_tok = self.ts.expect(K::Ident)?;
        self.ts.expect(K::Colon)?;
        let label = self.ctx.alloc_decl(Decl {
            name: name_tok.lexeme.to_string(),
            kind: DeclKind::Label,
            span: name_tok.span,
        });
        let body = self.parse_statement()?;
        let span = name_tok.span.to(self.ctx.stmt(body).span);
        Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::Labeled { label, body }, span }))
    }
}
