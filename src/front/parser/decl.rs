//! Declaration parsing: specifier sequences, declarators (pointers,
//! parenthesised groupings, array and function suffixes), records,
//! typedefs, and initialisers.

use super::*;
use crate::front::ast::{Expr, ExprId, ExprKind, Stmt, StmtId, StmtKind};
use crate::front::declspec::{DeclSpec, Declarator, FunctionSpec, StorageClass, TypeSpecKind, TypeSpecSign};
use crate::front::types::{ArrayLen, Member, RecordKind};

fn tag_key(kind: RecordKind, tag: &str) -> String {
    match kind {
        RecordKind::Struct => format!("struct {tag}"),
        RecordKind::Union => format!("union {tag}"),
    }
}

impl<'s> Parser<'s> {
    /// Accumulate declaration specifiers while the current token is a
    /// type-token. The bag is re-synthesized after each type specifier so
    /// impossible combinations fail on the token that introduces them.
    pub(crate) fn parse_decl_spec(&mut self) -> CompileResult<DeclSpec> {
        let mut spec = DeclSpec::new();
        loop {
            let t = self.ts.current();
            if !self.is_type_token(t.kind, t.lexeme) {
                break;
            }
            match t.kind {
                K::Typedef => {
                    self.ts.bump()?;
                    spec.set_storage_class(StorageClass::Typedef, t.span)?;
                }
                K::Extern => {
                    self.ts.bump()?;
                    spec.set_storage_class(StorageClass::Extern, t.span)?;
                }
                K::Static => {
                    self.ts.bump()?;
                    spec.set_storage_class(StorageClass::Static, t.span)?;
                }
                K::ThreadLocal => {
                    self.ts.bump()?;
                    spec.set_storage_class(StorageClass::ThreadLocal, t.span)?;
                }
                K::Inline => {
                    self.ts.bump()?;
                    spec.set_function_spec(FunctionSpec::Inline, t.span)?;
                }
                // recognised but without effect here
                K::Auto | K::Register | K::Noreturn => {
                    self.ts.bump()?;
                }
                K::Const => {
                    self.ts.bump()?;
                    spec.qualifiers.is_const = true;
                }
                K::Volatile => {
                    self.ts.bump()?;
                    spec.qualifiers.is_volatile = true;
                }
                K::Restrict => {
                    self.ts.bump()?;
                    spec.qualifiers.is_restrict = true;
                }
                K::Atomic => {
                    self.ts.bump()?;
                    if self.ts.matches(K::LParen)? {
                        let ty = self.parse_type_name()?;
                        self.ts.expect(K::RParen)?;
                        spec.set_override(ty, t.span)?;
                    }
                    spec.qualifiers.is_atomic = true;
                }
                K::Alignas => {
                    return Err(CompileError::unimplemented("'_Alignas'", t.span));
                }
                K::Complex => {
                    return Err(CompileError::unimplemented("'_Complex'", t.span));
                }
                K::Enum => {
                    return Err(CompileError::unimplemented("'enum'", t.span));
                }
                K::Struct => {
                    let ty = self.parse_record_specifier(RecordKind::Struct)?;
                    spec.set_override(ty, t.span)?;
                }
                K::Union => {
                    let ty = self.parse_record_specifier(RecordKind::Union)?;
                    spec.set_override(ty, t.span)?;
                }
                K::Void => {
                    self.ts.bump()?;
                    spec.set_kind(TypeSpecKind::Void, t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Bool => {
                    self.ts.bump()?;
                    spec.set_kind(TypeSpecKind::Bool, t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Char => {
                    self.ts.bump()?;
                    spec.set_kind(TypeSpecKind::Char, t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Int => {
                    self.ts.bump()?;
                    spec.set_kind(TypeSpecKind::Int, t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Float => {
                    self.ts.bump()?;
                    spec.set_kind(TypeSpecKind::Float, t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Double => {
                    self.ts.bump()?;
                    spec.set_kind(TypeSpecKind::Double, t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Short => {
                    self.ts.bump()?;
                    spec.set_short(t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Long => {
                    self.ts.bump()?;
                    spec.add_long(t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Signed => {
                    self.ts.bump()?;
                    spec.set_sign(TypeSpecSign::Signed, t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Unsigned => {
                    self.ts.bump()?;
                    spec.set_sign(TypeSpecSign::Unsigned, t.span)?;
                    spec.synthesize_type(t.span)?;
                }
                K::Ident => {
                    // Once any type specifier is present, a following
                    // identifier is the declarator, even if it is bound as
                    // a type name in some scope.
                    if spec.kind != TypeSpecKind::Unspecified
                        || spec.override_ty.is_some()
                        || spec.width != crate::front::declspec::TypeSpecWidth::None
                        || spec.sign != TypeSpecSign::None
                    {
                        break;
                    }
                    let ty = match self.scopes.lookup_type(t.lexeme) {
                        Some(ty) => ty,
                        None => break,
                    };
                    self.ts.bump()?;
                    spec.set_override(ty, t.span)?;
                    break;
                }
                _ => break,
            }
        }
        Ok(spec)
    }

    /// struct/union specifier. A definition installs (or completes) the tag
    /// before its members parse, so self-references resolve to the same
    /// arena handle.
    fn parse_record_specifier(&mut self, kind: RecordKind) -> CompileResult<TypeId> {
        let kw = self.ts.bump()?;
        let tag = if self.ts.check(K::Ident) {
            Some(self.ts.bump()?.lexeme.to_string())
        } else {
            None
        };

        if !self.ts.matches(K::LBrace)? {
            // reference or forward declaration
            let tag = match tag {
                Some(t) => t,
                None => {
                    return Err(CompileError::bad_declarator(
                        "anonymous record requires a definition",
                        kw.span,
                    ))
                }
            };
            let key = tag_key(kind, &tag);
            if let Some(id) = self.scopes.lookup_type(&key) {
                return Ok(id);
            }
            let id = self
                .ctx
                .alloc_type(Type::named(TypeKind::Record { kind, members: Vec::new() }, tag.clone()));
            self.scopes.install_type(&key, id);
            return Ok(id);
        }

        let id = match &tag {
            Some(tag) => {
                let key = tag_key(kind, tag);
                match self.scopes.lookup_type(&key) {
                    Some(existing) => match &self.ctx.ty(existing).kind {
                        TypeKind::Record { members, .. } if members.is_empty() => existing,
                        _ => return Err(CompileError::redefinition(tag.clone(), kw.span)),
                    },
                    None => {
                        let id = self.ctx.alloc_type(Type::named(
                            TypeKind::Record { kind, members: Vec::new() },
                            tag.clone(),
                        ));
                        self.scopes.install_type(&key, id);
                        id
                    }
                }
            }
            None => self.ctx.alloc_type(Type::new(TypeKind::Record { kind, members: Vec::new() })),
        };

        let mut members = Vec::new();
        while !self.ts.check(K::RBrace) {
            let mstart = self.ts.current().span;
            let mspec = self.parse_decl_spec()?;
            if mspec.storage != StorageClass::None {
                return Err(CompileError::type_synthesis(
                    "storage class not allowed on a member",
                    mstart,
                ));
            }
            let mbase = mspec.finish(&mut self.ctx, mstart)?;
            loop {
                let d = self.parse_declarator_from(mbase)?;
                let (mname, msp) = match d.name {
                    Some(n) => n,
                    None => {
                        return Err(CompileError::bad_declarator("member requires a name", mstart))
                    }
                };
                if members.iter().any(|m: &Member| m.name == mname) {
                    return Err(CompileError::redefinition(mname, msp));
                }
                members.push(Member { name: mname, ty: d.ty });
                if !self.ts.matches(K::Comma)? {
                    break;
                }
            }
            self.ts.expect(K::Semicolon)?;
        }
        self.ts.expect(K::RBrace)?;

        self.ctx.ty_mut(id).kind = TypeKind::Record { kind, members };
        Ok(id)
    }

    fn parse_pointers(&mut self, mut ty: TypeId) -> CompileResult<TypeId> {
        while self.ts.matches(K::Star)? {
            ty = self.ctx.alloc_type(Type::new(TypeKind::Pointer { base: ty }));
            // qualifiers binding to the pointer; recognised and dropped
            loop {
                match self.ts.current().kind {
                    K::Const | K::Volatile | K::Restrict | K::Atomic => {
                        self.ts.bump()?;
                    }
                    _ => break,
                }
            }
        }
        Ok(ty)
    }

    /// declarator := pointer* ( '(' declarator ')' | identifier? ) suffix
    ///
    /// A parenthesised declarator parses against a placeholder type; the
    /// outer suffix is then written through the placeholder, which is what
    /// makes `int (*p)[10]` come out as pointer-to-array.
    pub(crate) fn parse_declarator_from(&mut self, base: TypeId) -> CompileResult<Declarator> {
        let ty = self.parse_pointers(base)?;

        if self.ts.check(K::LParen) {
            let next = self.ts.peek_next()?;
            let grouping = match next.kind {
                K::Star | K::LParen => true,
                K::Ident => !self.scopes.is_type_name(next.lexeme),
                _ => false,
            };
            if grouping {
                self.ts.bump()?;
                let hole = self.ctx.alloc_type(Type::new(TypeKind::Void));
                let inner = self.parse_declarator_from(hole)?;
                self.ts.expect(K::RParen)?;
                let outer = self.parse_type_suffix(ty)?;
                let patched = self.ctx.ty(outer).clone();
                *self.ctx.ty_mut(hole) = patched;
                return Ok(inner);
            }
        }

        let name = if self.ts.check(K::Ident) {
            let t = self.ts.bump()?;
            Some((t.lexeme.to_string(), t.span))
        } else {
            None
        };
        let ty = self.parse_type_suffix(ty)?;
        Ok(Declarator { name, ty })
    }

    fn parse_type_suffix(&mut self, ty: TypeId) -> CompileResult<TypeId> {
        if self.ts.matches(K::LParen)? {
            return self.parse_params(ty);
        }
        if self.ts.matches(K::LBracket)? {
            return self.parse_array_dimensions(ty);
        }
        Ok(ty)
    }

    /// Parameter list after '('. Each parameter gets a fresh type carrying
    /// the parameter name; arrays decay to pointers, functions to pointers
    /// to functions.
    fn parse_params(&mut self, ret: TypeId) -> CompileResult<TypeId> {
        // `(void)` declares an empty parameter list
        if self.ts.check(K::Void) && self.ts.peek_next()?.kind == K::RParen {
            self.ts.skip_until(K::RParen, true)?;
            return Ok(self
                .ctx
                .alloc_type(Type::new(TypeKind::Function { ret, params: Vec::new() })));
        }

        let mut params = Vec::new();
        if !self.ts.matches(K::RParen)? {
            loop {
                let t = self.ts.current();
                if t.kind == K::Ellipsis {
                    return Err(CompileError::unimplemented("variadic functions", t.span));
                }
                let pstart = t.span;
                let pspec = self.parse_decl_spec()?;
                let pbase = pspec.finish(&mut self.ctx, pstart)?;
                let d = self.parse_declarator_from(pbase)?;
                let adjusted = match self.ctx.ty(d.ty).kind.clone() {
                    TypeKind::Array { elem, .. } => TypeKind::Pointer { base: elem },
                    TypeKind::Function { .. } => TypeKind::Pointer { base: d.ty },
                    k => k,
                };
                let pname = d.name.map(|(n, _)| n);
                let pid = self.ctx.alloc_type(Type { kind: adjusted, name: pname });
                params.push(pid);
                if self.ts.matches(K::Comma)? {
                    continue;
                }
                self.ts.expect(K::RParen)?;
                break;
            }
        }
        Ok(self.ctx.alloc_type(Type::new(TypeKind::Function { ret, params })))
    }

    /// Array suffix after '['. Remaining dimensions parse first so the
    /// outermost bracket ends up outermost in the type.
    fn parse_array_dimensions(&mut self, ty: TypeId) -> CompileResult<TypeId> {
        let len = if self.ts.check(K::RBracket) {
            ArrayLen::Unknown
        } else {
            let t = self.ts.current();
            if t.kind == K::NumLit && !crate::front::lexer::is_float_lexeme(t.lexeme) {
                let t = self.ts.bump()?;
                ArrayLen::Fixed(self.int_lexeme_value(t.lexeme, t.span)? as u64)
            } else {
                return Err(CompileError::unimplemented(
                    "non-constant array length",
                    t.span,
                ));
            }
        };
        self.ts.expect(K::RBracket)?;
        let elem = self.parse_type_suffix(ty)?;
        Ok(self.ctx.alloc_type(Type::new(TypeKind::Array { elem, len })))
    }

    /// type-name (casts, `sizeof`): specifiers plus an abstract declarator.
    pub(crate) fn parse_type_name(&mut self) -> CompileResult<TypeId> {
        let start = self.ts.current().span;
        let spec = self.parse_decl_spec()?;
        let base = spec.finish(&mut self.ctx, start)?;
        let d = self.parse_declarator_from(base)?;
        if let Some((name, sp)) = d.name {
            return Err(CompileError::bad_declarator(
                format!("unexpected name '{name}' in type name"),
                sp,
            ));
        }
        Ok(d.ty)
    }

    /// One or more typedef declarators; each name becomes a type alias in
    /// the current scope.
    pub(crate) fn parse_typedef_names(
        &mut self,
        dspec: &DeclSpec,
        start: Span,
    ) -> CompileResult<Vec<DeclId>> {
        let base = dspec.finish(&mut self.ctx, start)?;
        let mut decls = Vec::new();
        loop {
            let d = self.parse_declarator_from(base)?;
            let (name, nsp) = match d.name {
                Some(n) => n,
                None => {
                    return Err(CompileError::bad_declarator("typedef requires a name", start))
                }
            };
            if self.ctx.ty(d.ty).name.is_none() {
                self.ctx.ty_mut(d.ty).name = Some(name.clone());
            }
            if !self.scopes.install_type(&name, d.ty) {
                return Err(CompileError::redefinition(name, nsp));
            }
            let id = self.ctx.alloc_decl(Decl {
                name,
                kind: DeclKind::Typedef { ty: d.ty },
                span: start.to(nsp),
            });
            decls.push(id);
            if !self.ts.matches(K::Comma)? {
                break;
            }
        }
        self.ts.expect(K::Semicolon)?;
        Ok(decls)
    }

    /// The rest of a variable declaration once the first declarator is in
    /// hand: initialisers, further comma-separated declarators, semicolon.
    pub(crate) fn parse_variables_after(
        &mut self,
        base: TypeId,
        first: Declarator,
        start: Span,
    ) -> CompileResult<Vec<DeclId>> {
        let mut decls = Vec::new();
        let mut d = first;
        loop {
            let (name, nsp) = match d.name {
                Some(n) => n,
                None => {
                    return Err(CompileError::bad_declarator("declaration requires a name", start))
                }
            };
            let init = if self.ts.matches(K::Assign)? {
                Some(self.parse_initializer(d.ty)?)
            } else {
                None
            };
            let id = self.ctx.alloc_decl(Decl {
                name: name.clone(),
                kind: DeclKind::Var { ty: d.ty, init },
                span: start.to(nsp),
            });
            if !self.scopes.install_decl(&name, id) {
                return Err(CompileError::redefinition(name, nsp));
            }
            if let Some(locals) = &mut self.current_locals {
                locals.push(id);
            }
            decls.push(id);
            if !self.ts.matches(K::Comma)? {
                break;
            }
            d = self.parse_declarator_from(base)?;
        }
        self.ts.expect(K::Semicolon)?;
        Ok(decls)
    }

    /// A full declaration inside a block or a `for` header. Covers
    /// tag-only declarations, typedefs, block-scope prototypes, and
    /// variables.
    pub(crate) fn parse_declaration_many(&mut self) -> CompileResult<Vec<DeclId>> {
        let start = self.ts.current().span;
        let dspec = self.parse_decl_spec()?;

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
            return Ok(vec![self.ctx.alloc_decl(Decl {
                name,
                kind: DeclKind::Record { ty },
                span: start.to(semi.span),
            })]);
        }

        if dspec.is_typedef() {
            return self.parse_typedef_names(&dspec, start);
        }

        let base = dspec.finish(&mut self.ctx, start)?;
        let d = self.parse_declarator_from(base)?;

        if self.ctx.ty(d.ty).is_function() {
            // block-scope prototype
            let (name, nsp) = match d.name {
                Some(n) => n,
                None => {
                    return Err(CompileError::bad_declarator(
                        "function declarator requires a name",
                        start,
                    ))
                }
            };
            let id = self.ctx.alloc_decl(Decl {
                name: name.clone(),
                kind: DeclKind::Function {
                    ty: d.ty,
                    params: Vec::new(),
                    body: None,
                    locals: Vec::new(),
                },
                span: start.to(nsp),
            });
            if !self.scopes.install_decl(&name, id) {
                return Err(CompileError::redefinition(name, nsp));
            }
            self.ts.expect(K::Semicolon)?;
            return Ok(vec![id]);
        }

        self.parse_variables_after(base, d, start)
    }

    /// initialiser := assignment-expression | '{' initialiser-list '}'
    pub(crate) fn parse_initializer(&mut self, target: TypeId) -> CompileResult<ExprId> {
        if !self.ts.check(K::LBrace) {
            return self.parse_assignment_expr();
        }
        let l = self.ts.bump()?;
        let elem_ty = match self.ctx.ty(target).kind {
            TypeKind::Array { elem, .. } => elem,
            _ => target,
        };
        let mut elems = Vec::new();
        if !self.ts.check(K::RBrace) {
            loop {
                let t = self.ts.current();
                if t.kind == K::Dot || t.kind == K::LBracket {
                    return Err(CompileError::unimplemented("designated initialisers", t.span));
                }
                elems.push(self.parse_initializer(elem_ty)?);
                if self.ts.matches(K::Comma)? {
                    if self.ts.check(K::RBrace) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        let r = self.ts.expect(K::RBrace)?;
        Ok(self.ctx.alloc_expr(Expr {
            kind: ExprKind::InitList { elems },
            ty: target,
            span: l.span.to(r.span),
        }))
    }

    /// Declaration statement inside a compound body.
    pub(crate) fn parse_decl_stmt(&mut self) -> CompileResult<StmtId> {
        let start = self.ts.current().span;
        let decls = self.parse_declaration_many()?;
        let end = decls.last().map(|d| self.ctx.decl(*d).span).unwrap_or(start);
        Ok(self.ctx.alloc_stmt(Stmt { kind: StmtKind::Decl(decls), span: start.to(end) }))
    }
}
