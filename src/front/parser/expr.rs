//! Expression parsing by operator-precedence climbing, plus the unary,
//! postfix, and cast productions. Every node is annotated with its type
//! as it is built.

use super::*;
use crate::front::ast::{BinaryOp, Expr, ExprId, ExprKind, UnaryOp};
use crate::front::lexer::{is_float_lexeme, unescape_char, unescape_string};

/// Binary operator precedence, lowest first. `Unknown` marks tokens that
/// do not continue a binary expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PrecLevel {
    Unknown,
    Comma,
    Assignment,
    Conditional,
    LogicalOr,
    LogicalAnd,
    InclusiveOr,
    ExclusiveOr,
    And,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
}

fn bin_op_prec(kind: K) -> PrecLevel {
    use PrecLevel::*;
    match kind {
        K::Comma => Comma,
        K::Assign | K::StarAssign | K::SlashAssign | K::PercentAssign | K::PlusAssign
        | K::MinusAssign | K::ShlAssign | K::ShrAssign | K::AmpAssign | K::CaretAssign
        | K::PipeAssign => Assignment,
        K::Question => Conditional,
        K::PipePipe => LogicalOr,
        K::AmpAmp => LogicalAnd,
        K::Pipe => InclusiveOr,
        K::Caret => ExclusiveOr,
        K::Amp => And,
        K::EqEq | K::Ne => Equality,
        K::Lt | K::Gt | K::Le | K::Ge => Relational,
        K::Shl | K::Shr => Shift,
        K::Plus | K::Minus => Additive,
        K::Star | K::Slash | K::Percent => Multiplicative,
        _ => Unknown,
    }
}

fn binary_op_from(kind: K) -> BinaryOp {
    match kind {
        K::Comma => BinaryOp::Comma,
        K::Assign => BinaryOp::Assign,
        K::StarAssign => BinaryOp::MulAssign,
        K::SlashAssign => BinaryOp::DivAssign,
        K::PercentAssign => BinaryOp::RemAssign,
        K::PlusAssign => BinaryOp::AddAssign,
        K::MinusAssign => BinaryOp::SubAssign,
        K::ShlAssign => BinaryOp::ShlAssign,
        K::ShrAssign => BinaryOp::ShrAssign,
        K::AmpAssign => BinaryOp::AndAssign,
        K::CaretAssign => BinaryOp::XorAssign,
        K::PipeAssign => BinaryOp::OrAssign,
        K::PipePipe => BinaryOp::LogOr,
        K::AmpAmp => BinaryOp::LogAnd,
        K::Pipe => BinaryOp::BitOr,
        K::Caret => BinaryOp::BitXor,
        K::Amp => BinaryOp::BitAnd,
        K::EqEq => BinaryOp::Eq,
        K::Ne => BinaryOp::Ne,
        K::Lt => BinaryOp::Lt,
        K::Gt => BinaryOp::Gt,
        K::Le => BinaryOp::Le,
        K::Ge => BinaryOp::Ge,
        K::Shl => BinaryOp::Shl,
        K::Shr => BinaryOp::Shr,
        K::Plus => BinaryOp::Add,
        K::Minus => BinaryOp::Sub,
        K::Star => BinaryOp::Mul,
        K::Slash => BinaryOp::Div,
        K::Percent => BinaryOp::Rem,
        _ => BinaryOp::Comma,
    }
}

impl<'s> Parser<'s> {
    pub(crate) fn parse_expr(&mut self) -> CompileResult<ExprId> {
        let lhs = self.parse_cast_expr()?;
        self.parse_rhs_of_binary(lhs, PrecLevel::Comma)
    }

    /// No top-level comma operator: call arguments, initialisers.
    pub(crate) fn parse_assignment_expr(&mut self) -> CompileResult<ExprId> {
        let lhs = self.parse_cast_expr()?;
        self.parse_rhs_of_binary(lhs, PrecLevel::Assignment)
    }

    /// Constant expressions (`case` values): conditional and tighter.
    pub(crate) fn parse_constant_expr(&mut self) -> CompileResult<ExprId> {
        let lhs = self.parse_cast_expr()?;
        self.parse_rhs_of_binary(lhs, PrecLevel::Conditional)
    }

    fn parse_rhs_of_binary(&mut self, mut lhs: ExprId, min_prec: PrecLevel) -> CompileResult<ExprId> {
        loop {
            let tok = self.ts.current();
            let tok_prec = bin_op_prec(tok.kind);
            if tok_prec < min_prec {
                return Ok(lhs);
            }
            self.ts.bump()?;

            // lhs ? expr : conditional-expression
            if tok.kind == K::Question {
                let then_expr = self.parse_expr()?;
                self.ts.expect(K::Colon)?;
                let else_first = self.parse_cast_expr()?;
                let else_expr = self.parse_rhs_of_binary(else_first, PrecLevel::Conditional)?;
                let ty = self.ctx.expr(then_expr).ty;
                let span = self.ctx.expr(lhs).span.to(self.ctx.expr(else_expr).span);
                lhs = self.ctx.alloc_expr(Expr {
                    kind: ExprKind::Conditional { cond: lhs, then_expr, else_expr },
                    ty,
                    span,
                });
                continue;
            }

            let mut rhs = self.parse_cast_expr()?;
            let next_prec = bin_op_prec(self.ts.current().kind);
            let right_assoc =
                matches!(tok_prec, PrecLevel::Assignment | PrecLevel::Conditional);
            // the pending operator binds tighter (or equally, for a
            // right-associative level): let it rebuild rhs first
            if next_prec > tok_prec || (next_prec == tok_prec && right_assoc) {
                rhs = self.parse_rhs_of_binary(rhs, tok_prec)?;
            }

            let op = binary_op_from(tok.kind);
            let ty = self.binary_result_type(op, lhs, rhs);
            let span = self.ctx.expr(lhs).span.to(self.ctx.expr(rhs).span);
            lhs = self.ctx.alloc_expr(Expr { kind: ExprKind::Binary { op, lhs, rhs }, ty, span });
        }
    }

    fn binary_result_type(&self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> TypeId {
        if op.is_comparison() || matches!(op, BinaryOp::LogAnd | BinaryOp::LogOr) {
            return self.int_ty;
        }
        if op.is_assignment() {
            return self.ctx.expr(lhs).ty;
        }
        if op == BinaryOp::Comma {
            return self.ctx.expr(rhs).ty;
        }
        let lt = self.ctx.expr(lhs).ty;
        let rt = self.ctx.expr(rhs).ty;
        if self.ctx.ty(lt).is_floating() {
            lt
        } else if self.ctx.ty(rt).is_floating() {
            rt
        } else {
            lt
        }
    }

    /// cast-expression := '(' type-name ')' cast-expression | unary.
    /// A '(' opens a cast only when the token after it is a type-token.
    pub(crate) fn parse_cast_expr(&mut self) -> CompileResult<ExprId> {
        if self.ts.check(K::LParen) {
            let next = self.ts.peek_next()?;
            if self.is_type_token(next.kind, next.lexeme) {
                let lp = self.ts.bump()?;
                let to = self.parse_type_name()?;
                self.ts.expect(K::RParen)?;
                let operand = self.parse_cast_expr()?;
                let span = lp.span.to(self.ctx.expr(operand).span);
                return Ok(self.ctx.alloc_expr(Expr { kind: ExprKind::Cast { operand }, ty: to, span }));
            }
        }
        self.parse_postfix_expr()
    }

    fn parse_postfix_expr(&mut self) -> CompileResult<ExprId> {
        let mut expr = self.parse_unary_expr()?;
        loop {
            let t = self.ts.current();
            expr = match t.kind {
                K::LParen => {
                    self.ts.bump()?;
                    let mut args = Vec::new();
                    if !self.ts.check(K::RParen) {
                        loop {
                            args.push(self.parse_assignment_expr()?);
                            if self.ts.matches(K::Comma)? {
                                continue;
                            }
                            break;
                        }
                    }
                    let r = self.ts.expect(K::RParen)?;
                    let ret = self.return_type_of_callee(expr, t.span)?;
                    let span = self.ctx.expr(expr).span.to(r.span);
                    self.ctx.alloc_expr(Expr {
                        kind: ExprKind::Call { callee: expr, args },
                        ty: ret,
                        span,
                    })
                }
                K::LBracket => {
                    self.ts.bump()?;
                    let index = self.parse_expr()?;
                    let r = self.ts.expect(K::RBracket)?;
                    let base_ty = self.ctx.expr(expr).ty;
                    let elem = match self.ctx.ty(base_ty).kind {
                        TypeKind::Array { elem, .. } => elem,
                        TypeKind::Pointer { base } => base,
                        _ => {
                            return Err(CompileError::semantic(
                                "subscripted value is not an array or pointer",
                                t.span,
                            ))
                        }
                    };
                    let span = self.ctx.expr(expr).span.to(r.span);
                    self.ctx.alloc_expr(Expr {
                        kind: ExprKind::ArraySubscript { base: expr, index },
                        ty: elem,
                        span,
                    })
                }
                K::Dot | K::Arrow => {
                    self.ts.bump()?;
                    let name_tok = self.ts.expect(K::Ident)?;
                    let arrow = t.kind == K::Arrow;
                    let base_ty = self.ctx.expr(expr).ty;
                    let (index, member_ty) =
                        self.resolve_member(base_ty, name_tok.lexeme, arrow, name_tok.span)?;
                    let span = self.ctx.expr(expr).span.to(name_tok.span);
                    self.ctx.alloc_expr(Expr {
                        kind: ExprKind::Member {
                            base: expr,
                            name: name_tok.lexeme.to_string(),
                            index,
                            arrow,
                        },
                        ty: member_ty,
                        span,
                    })
                }
                K::Inc | K::Dec => {
                    self.ts.bump()?;
                    let op = if t.kind == K::Inc { UnaryOp::PostInc } else { UnaryOp::PostDec };
                    let ty = self.ctx.expr(expr).ty;
                    let span = self.ctx.expr(expr).span.to(t.span);
                    self.ctx.alloc_expr(Expr { kind: ExprKind::Unary { op, operand: expr }, ty, span })
                }
                _ => break,
            };
        }
        Ok(expr)
    }

    fn return_type_of_callee(&self, callee: ExprId, span: Span) -> CompileResult<TypeId> {
        let callee_ty = self.ctx.expr(callee).ty;
        let fn_ty = match self.ctx.ty(callee_ty).kind {
            TypeKind::Function { .. } => callee_ty,
            TypeKind::Pointer { base } if self.ctx.ty(base).is_function() => base,
            _ => return Err(CompileError::semantic("called object is not a function", span)),
        };
        match self.ctx.ty(fn_ty).kind {
            TypeKind::Function { ret, .. } => Ok(ret),
            _ => Err(CompileError::semantic("called object is not a function", span)),
        }
    }

    fn resolve_member(
        &self,
        base_ty: TypeId,
        name: &str,
        arrow: bool,
        span: Span,
    ) -> CompileResult<(u32, TypeId)> {
        let rec_ty = if arrow {
            match self.ctx.ty(base_ty).kind {
                TypeKind::Pointer { base } => base,
                _ => {
                    return Err(CompileError::semantic(
                        "'->' requires a pointer to a struct or union",
                        span,
                    ))
                }
            }
        } else {
            base_ty
        };
        match &self.ctx.ty(rec_ty).kind {
            TypeKind::Record { members, .. } => members
                .iter()
                .position(|m| m.name == name)
                .map(|i| (i as u32, members[i].ty))
                .ok_or_else(|| CompileError::semantic(format!("no member named '{name}'"), span)),
            _ => Err(CompileError::semantic(
                "member access requires a struct or union",
                span,
            )),
        }
    }

    fn parse_unary_expr(&mut self) -> CompileResult<ExprId> {
        let t = self.ts.current();
        match t.kind {
            K::NumLit => {
                self.ts.bump()?;
                if is_float_lexeme(t.lexeme) {
                    let value = self.float_lexeme_value(t.lexeme, t.span)?;
                    Ok(self.ctx.alloc_expr(Expr {
                        kind: ExprKind::FloatLit(value),
                        ty: self.double_ty,
                        span: t.span,
                    }))
                } else {
                    let value = self.int_lexeme_value(t.lexeme, t.span)?;
                    Ok(self.ctx.alloc_expr(Expr {
                        kind: ExprKind::IntLit(value),
                        ty: self.int_ty,
                        span: t.span,
                    }))
                }
            }
            K::StrLit => {
                self.ts.bump()?;
                Ok(self.ctx.alloc_expr(Expr {
                    kind: ExprKind::StrLit(unescape_string(t.lexeme)),
                    ty: self.char_ptr_ty,
                    span: t.span,
                }))
            }
            K::CharLit => {
                self.ts.bump()?;
                Ok(self.ctx.alloc_expr(Expr {
                    kind: ExprKind::CharLit(unescape_char(t.lexeme)),
                    ty: self.int_ty,
                    span: t.span,
                }))
            }
            K::Ident => {
                self.ts.bump()?;
                let decl = self.scopes.lookup_decl(t.lexeme).ok_or_else(|| {
                    CompileError::semantic(format!("use of undeclared identifier '{}'", t.lexeme), t.span)
                })?;
                let ty = self.ctx.decl(decl).type_id().ok_or_else(|| {
                    CompileError::semantic(format!("'{}' is not an object", t.lexeme), t.span)
                })?;
                Ok(self.ctx.alloc_expr(Expr { kind: ExprKind::DeclRef(decl), ty, span: t.span }))
            }
            K::Amp => {
                self.ts.bump()?;
                let operand = self.parse_cast_expr()?;
                let ty = self
                    .ctx
                    .alloc_type(Type::new(TypeKind::Pointer { base: self.ctx.expr(operand).ty }));
                let span = t.span.to(self.ctx.expr(operand).span);
                Ok(self.ctx.alloc_expr(Expr {
                    kind: ExprKind::Unary { op: UnaryOp::AddressOf, operand },
                    ty,
                    span,
                }))
            }
            K::Star => {
                self.ts.bump()?;
                let operand = self.parse_cast_expr()?;
                let operand_ty = self.ctx.expr(operand).ty;
                let ty = match self.ctx.ty(operand_ty).kind {
                    TypeKind::Pointer { base } => base,
                    TypeKind::Array { elem, .. } => elem,
                    _ => {
                        return Err(CompileError::semantic(
                            "cannot dereference a non-pointer",
                            t.span,
                        ))
                    }
                };
                let span = t.span.to(self.ctx.expr(operand).span);
                Ok(self.ctx.alloc_expr(Expr {
                    kind: ExprKind::Unary { op: UnaryOp::Deref, operand },
                    ty,
                    span,
                }))
            }
            K::Plus | K::Minus | K::Tilde | K::Not | K::Inc | K::Dec => {
                self.ts.bump()?;
                let op = match t.kind {
                    K::Plus => UnaryOp::Plus,
                    K::Minus => UnaryOp::Minus,
                    K::Tilde => UnaryOp::BitNot,
                    K::Not => UnaryOp::LogNot,
                    K::Inc => UnaryOp::PreInc,
                    _ => UnaryOp::PreDec,
                };
                let operand = self.parse_cast_expr()?;
                let ty = if op == UnaryOp::LogNot { self.int_ty } else { self.ctx.expr(operand).ty };
                let span = t.span.to(self.ctx.expr(operand).span);
                Ok(self.ctx.alloc_expr(Expr { kind: ExprKind::Unary { op, operand }, ty, span }))
            }
            K::Sizeof => self.parse_sizeof(),
            K::LParen => {
                self.ts.bump()?;
                let e = self.parse_expr()?;
                self.ts.expect(K::RParen)?;
                Ok(e)
            }
            _ => Err(CompileError::unexpected(
                format!("expected expression, found {}", t.kind),
                t.span,
            )),
        }
    }

    /// `sizeof unary-expression` or `sizeof ( type-name )`, folded to an
    /// integer constant of unsigned long type.
    fn parse_sizeof(&mut self) -> CompileResult<ExprId> {
        let kw = self.ts.expect(K::Sizeof)?;
        let (target, end) = if self.ts.check(K::LParen) {
            let next = self.ts.peek_next()?;
            if self.is_type_token(next.kind, next.lexeme) {
                self.ts.bump()?;
                let ty = self.parse_type_name()?;
                let r = self.ts.expect(K::RParen)?;
                (ty, r.span)
            } else {
                let e = self.parse_postfix_expr()?;
                (self.ctx.expr(e).ty, self.ctx.expr(e).span)
            }
        } else {
            let e = self.parse_postfix_expr()?;
            (self.ctx.expr(e).ty, self.ctx.expr(e).span)
        };
        let size = self
            .ctx
            .size_of(target)
            .ok_or_else(|| CompileError::semantic("sizeof applied to an incomplete type", kw.span))?;
        Ok(self.ctx.alloc_expr(Expr {
            kind: ExprKind::IntLit(size as i64),
            ty: self.ulong_ty,
            span: kw.span.to(end),
        }))
    }

    pub(crate) fn int_lexeme_value(&self, lexeme: &str, span: Span) -> CompileResult<i64> {
        let digits = lexeme.trim_end_matches(['u', 'U', 'l', 'L']);
        let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else if digits.len() > 1 && digits.starts_with('0') {
            u64::from_str_radix(&digits[1..], 8)
        } else {
            digits.parse::<u64>()
        };
        parsed
            .map(|v| v as i64)
            .map_err(|_| CompileError::semantic("invalid integer constant", span))
    }

    fn float_lexeme_value(&self, lexeme: &str, span: Span) -> CompileResult<f64> {
        let digits = lexeme.trim_end_matches(['f', 'F', 'l', 'L']);
        digits
            .parse::<f64>()
            .map_err(|_| CompileError::semantic("invalid floating constant", span))
    }
}
