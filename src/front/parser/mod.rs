//! Recursive-descent parser. Drives the lexer, builds the arena AST,
//! resolves names against the scope stack, and annotates every expression
//! with its type.

mod decl;
mod expr;
mod stmt;
mod stream;

#[cfg(test)]
mod test_parser;

pub use stream::TokenStream;

use log::debug;

use crate::error::{CompileError, CompileResult};
use crate::front::ast::{Decl, DeclId, DeclKind, TranslationUnit};
use crate::front::context::AstContext;
use crate::front::lexer::Lexer;
use crate::front::scope::ScopeStack;
use crate::front::source::SourceBuffer;
use crate::front::token::{Span, TokenKind as K};
use crate::front::types::{Sign, Type, TypeId, TypeKind};

pub struct Parser<'s> {
    pub(crate) ts: TokenStream<'s>,
    pub(crate) ctx: AstContext,
    pub(crate) scopes: ScopeStack,
    /// Local variables of the function currently being parsed; block-scope
    /// declarations append here so the emitter can lay out the frame.
    pub(crate) current_locals: Option<Vec<DeclId>>,
    // frequently used types, allocated once per compile
    pub(crate) int_ty: TypeId,
    pub(crate) char_ty: TypeId,
    pub(crate) double_ty: TypeId,
    pub(crate) char_ptr_ty: TypeId,
    pub(crate) ulong_ty: TypeId,
}

impl<'s> Parser<'s> {
    pub fn new(buf: &'s SourceBuffer) -> CompileResult<Self> {
        let ts = TokenStream::new(Lexer::new(buf))?;
        let mut ctx = AstContext::new();
        let int_ty = ctx.alloc_type(Type::new(TypeKind::Int(Sign::None)));
        let char_ty = ctx.alloc_type(Type::new(TypeKind::Char(Sign::None)));
        let double_ty = ctx.alloc_type(Type::new(TypeKind::Double { long: false }));
        let char_ptr_ty = ctx.alloc_type(Type::new(TypeKind::Pointer { base: char_ty }));
        let ulong_ty = ctx.alloc_type(Type::new(TypeKind::Long(Sign::Unsigned)));
        Ok(Self {
            ts,
            ctx,
            scopes: ScopeStack::new(),
            current_locals: None,
            int_ty,
            char_ty,
            double_ty,
            char_ptr_ty,
            ulong_ty,
        })
    }

    pub fn context(&self) -> &AstContext {
        &self.ctx
    }

    pub fn into_context(self) -> AstContext {
        self.ctx
    }

    /// Run `f` inside a fresh scope frame; the frame is popped on every
    /// return path.
    pub(crate) fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        self.scopes.enter();
        let result = f(self);
        self.scopes.exit();
        result
    }

    /// A token opens a declaration when it is a declaration-specifier
    /// keyword or an identifier currently bound as a type name.
    pub(crate) fn is_type_token(&self, kind: K, lexeme: &str) -> bool {
        kind.starts_decl_spec() || (kind == K::Ident && self.scopes.is_type_name(lexeme))
    }

    pub(crate) fn at_type_token(&self) -> bool {
        let t = self.ts.current();
        self.is_type_token(t.kind, t.lexeme)
    }

    pub fn parse_translation_unit(&mut self) -> CompileResult<TranslationUnit> {
        debug!("parsing translation unit");
        let mut decls = Vec::new();
        while !self.ts.check(K::Eof) {
            self.parse_top(&mut decls)?;
        }
        debug!("parsed {} top-level declarations", decls.len());
        Ok(TranslationUnit { decls })
    }

    fn parse_top(&mut self, out: &mut Vec<DeclId>) -> CompileResult<()> {
        let start = self.ts.current().span;
        let dspec = self.parse_decl_spec()?;

        // Tag-only declaration: `struct P { ... };`
        if self.ts.check(K::Semicolon) {
            let semi = self.ts.bump()?;
            let ty = match dspec.override_ty {
                Some(ty) => ty,
                None => {
                    return Err(CompileError::bad_declarator(
                        "declaration declares nothing",
                        semi.span,
                    ))
                }
            };
            let name = self.ctx.ty(ty).name.clone().unwrap_or_default();
            let record = self.ctx.alloc_decl(Decl {
                name,
                kind: DeclKind::Record { ty },
                span: start.to(semi.span),
            });
            out.push(record);
            return Ok(());
        }

        if dspec.is_typedef() {
            let mut typedefs = self.parse_typedef_names(&dspec, start)?;
            out.append(&mut typedefs);
            return Ok(());
        }

        let base = dspec.finish(&mut self.ctx, start)?;
        let declarator = self.parse_declarator_from(base)?;
        if self.ctx.ty(declarator.ty).is_function() {
            out.push(self.parse_function(declarator, start)?);
            return Ok(());
        }
        let mut vars = self.parse_variables_after(base, declarator, start)?;
        out.append(&mut vars);
        Ok(())
    }

    /// Function definition or forward declaration, given a declarator whose
    /// type resolved to `Function`.
    fn parse_function(
        &mut self,
        declarator: crate::front::declspec::Declarator,
        start: Span,
    ) -> CompileResult<DeclId> {
        let (name, name_span) = match declarator.name {
            Some(n) => n,
            None => {
                return Err(CompileError::bad_declarator(
                    "function declarator requires a name",
                    start,
                ))
            }
        };
        if self.scopes.lookup_decl(&name).is_some() {
            return Err(CompileError::redefinition(name, name_span));
        }

        let func = self.ctx.alloc_decl(Decl {
            name: name.clone(),
            kind: DeclKind::Function {
                ty: declarator.ty,
                params: Vec::new(),
                body: None,
                locals: Vec::new(),
            },
            span: start.to(name_span),
        });
        self.scopes.install_decl(&name, func);

        let param_types = match &self.ctx.ty(declarator.ty).kind {
            TypeKind::Function { params, .. } => params.clone(),
            _ => Vec::new(),
        };

        let saved_locals = self.current_locals.replace(Vec::new());
        let result = self.scoped(|p| {
            let params = p.create_params(&param_types, name_span)?;
            match &mut p.ctx.decl_mut(func).kind {
                DeclKind::Function { params: ps, .. } => *ps = params,
                _ => {}
            }
            if p.ts.check(K::LBrace) {
                let body = p.parse_compound_stmt()?;
                match &mut p.ctx.decl_mut(func).kind {
                    DeclKind::Function { body: b, .. } => *b = Some(body),
                    _ => {}
                }
            } else {
                p.ts.expect(K::Semicolon)?;
            }
            Ok(())
        });
        let locals = self.current_locals.take().unwrap_or_default();
        self.current_locals = saved_locals;
        result?;
        match &mut self.ctx.decl_mut(func).kind {
            DeclKind::Function { locals: ls, .. } => *ls = locals,
            _ => {}
        }
        debug!("parsed function '{}'", self.ctx.decl(func).name);
        Ok(func)
    }

    /// One `Var` declaration per parameter, installed in the just-entered
    /// function scope. Parameter names ride on the parameter types, where
    /// the declarator left them.
    fn create_params(&mut self, param_types: &[TypeId], span: Span) -> CompileResult<Vec<DeclId>> {
        let mut params = Vec::new();
        for &pty in param_types {
            let name = self.ctx.ty(pty).name.clone().unwrap_or_default();
            let decl = self.ctx.alloc_decl(Decl {
                name: name.clone(),
                kind: DeclKind::Var { ty: pty, init: None },
                span,
            });
            if !name.is_empty() && !self.scopes.install_decl(&name, decl) {
                return Err(CompileError::redefinition(name, span));
            }
            params.push(decl);
        }
        Ok(params)
    }
}
