#![allow(dead_code)]
//! Textual AST dump, one node per line with two-space indentation.
//! Deterministic: dumping the same tree twice yields identical text.

use crate::front::ast::{DeclId, DeclKind, ExprId, ExprKind, StmtId, StmtKind, TranslationUnit};
use crate::front::context::AstContext;
use crate::front::types::{ArrayLen, RecordKind, Sign, TypeId, TypeKind};

pub fn dump_translation_unit(ctx: &AstContext, tu: &TranslationUnit) -> String {
    let mut d = Dumper { ctx, out: String::new() };
    d.line(0, "TranslationUnit");
    for &decl in &tu.decls {
        d.dump_decl(decl, 1);
    }
    d.out
}

pub fn type_string(ctx: &AstContext, id: TypeId) -> String {
    let ty = ctx.ty(id);
    let sign = |s: Sign, name: &str| match s {
        Sign::Unsigned => format!("unsigned {name}"),
        Sign::Signed => format!("signed {name}"),
        Sign::None => name.to_string(),
    };
    match &ty.kind {
        TypeKind::Void => "void".into(),
        TypeKind::Bool => "_Bool".into(),
        TypeKind::Char(s) => sign(*s, "char"),
        TypeKind::Short(s) => sign(*s, "short"),
        TypeKind::Int(s) => sign(*s, "int"),
        TypeKind::Long(s) => sign(*s, "long"),
        TypeKind::LongLong(s) => sign(*s, "long long"),
        TypeKind::Float => "float".into(),
        TypeKind::Double { long: false } => "double".into(),
        TypeKind::Double { long: true } => "long double".into(),
        TypeKind::Pointer { base } => format!("pointer to {}", type_string(ctx, *base)),
        TypeKind::Array { elem, len } => match len {
            ArrayLen::Fixed(n) => format!("array {n} of {}", type_string(ctx, *elem)),
            ArrayLen::Unknown => format!("array of {}", type_string(ctx, *elem)),
        },
        TypeKind::Function { ret, params } => {
            let ps: Vec<String> = params.iter().map(|p| type_string(ctx, *p)).collect();
            format!("function ({}) returning {}", ps.join(", "), type_string(ctx, *ret))
        }
        TypeKind::Record { kind, .. } => {
            let kw = match kind {
                RecordKind::Struct => "struct",
                RecordKind::Union => "union",
            };
            match &ty.name {
                Some(tag) => format!("{kw} {tag}"),
                None => format!("{kw} <anonymous>"),
            }
        }
    }
}

struct Dumper<'a> {
    ctx: &'a AstContext,
    out: String,
}

impl<'a> Dumper<'a> {
    fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        for _ in 0..indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn dump_decl(&mut self, id: DeclId, indent: usize) {
        let decl = self.ctx.decl(id).clone();
        match decl.kind {
            DeclKind::Var { ty, init } => {
                self.line(indent, format!("Var {} '{}'", decl.name, type_string(self.ctx, ty)));
                if let Some(init) = init {
                    self.dump_expr(init, indent + 1);
                }
            }
            DeclKind::Function { ty, params, body, .. } => {
                self.line(
                    indent,
                    format!("Function {} '{}'", decl.name, type_string(self.ctx, ty)),
                );
                for p in params {
                    self.dump_decl(p, indent + 1);
                }
                if let Some(body) = body {
                    self.dump_stmt(body, indent + 1);
                }
            }
            DeclKind::Record { ty } => {
                self.line(indent, format!("Record '{}'", type_string(self.ctx, ty)));
            }
            DeclKind::Typedef { ty } => {
                self.line(
                    indent,
                    format!("Typedef {} '{}'", decl.name, type_string(self.ctx, ty)),
                );
            }
            DeclKind::Label => {
                self.line(indent, format!("Label {}", decl.name));
            }
        }
    }

    fn dump_stmt(&mut self, id: StmtId, indent: usize) {
        let stmt = self.ctx.stmt(id).clone();
        match stmt.kind {
            StmtKind::Empty => self.line(indent, "Empty"),
            StmtKind::Expr(e) => {
                self.line(indent, "ExprStmt");
                self.dump_expr(e, indent + 1);
            }
            StmtKind::Decl(decls) => {
                self.line(indent, "DeclStmt");
                for d in decls {
                    self.dump_decl(d, indent + 1);
                }
            }
            StmtKind::Compound(stmts) => {
                self.line(indent, "Compound");
                for s in stmts {
                    self.dump_stmt(s, indent + 1);
                }
            }
            StmtKind::If { cond, then_stmt, else_stmt } => {
                self.line(indent, "If");
                self.dump_expr(cond, indent + 1);
                self.dump_stmt(then_stmt, indent + 1);
                if let Some(e) = else_stmt {
                    self.dump_stmt(e, indent + 1);
                }
            }
            StmtKind::While { cond, body } => {
                self.line(indent, "While");
                self.dump_expr(cond, indent + 1);
                self.dump_stmt(body, indent + 1);
            }
            StmtKind::DoWhile { cond, body } => {
                self.line(indent, "DoWhile");
                self.dump_stmt(body, indent + 1);
                self.dump_expr(cond, indent + 1);
            }
            StmtKind::For { init, cond, step, body } => {
                self.line(indent, "For");
                if let Some(s) = init {
                    self.dump_stmt(s, indent + 1);
                }
                if let Some(e) = cond {
                    self.dump_expr(e, indent + 1);
                }
                if let Some(e) = step {
                    self.dump_expr(e, indent + 1);
                }
                self.dump_stmt(body, indent + 1);
            }
            StmtKind::Switch { cond, body } => {
                self.line(indent, "Switch");
                self.dump_expr(cond, indent + 1);
                self.dump_stmt(body, indent + 1);
            }
            StmtKind::Case { value, body, is_default } => {
                self.line(indent, if is_default { "Default" } else { "Case" });
                if let Some(v) = value {
                    self.dump_expr(v, indent + 1);
                }
                self.dump_stmt(body, indent + 1);
            }
            StmtKind::Return(value) => {
                self.line(indent, "Return");
                if let Some(v) = value {
                    self.dump_expr(v, indent + 1);
                }
            }
            StmtKind::Break => self.line(indent, "Break"),
            StmtKind::Continue => self.line(indent, "Continue"),
            StmtKind::Goto { label } => self.line(indent, format!("Goto {label}")),
            StmtKind::Labeled { label, body } => {
                let name = self.ctx.decl(label).name.clone();
                self.line(indent, format!("Labeled {name}"));
                self.dump_stmt(body, indent + 1);
            }
        }
    }

    fn dump_expr(&mut self, id: ExprId, indent: usize) {
        let expr = self.ctx.expr(id).clone();
        let ty = type_string(self.ctx, expr.ty);
        match expr.kind {
            ExprKind::IntLit(v) => self.line(indent, format!("IntLit {v} '{ty}'")),
            ExprKind::FloatLit(v) => self.line(indent, format!("FloatLit {v} '{ty}'")),
            ExprKind::CharLit(c) => self.line(indent, format!("CharLit {c} '{ty}'")),
            ExprKind::StrLit(s) => self.line(indent, format!("StrLit {s:?} '{ty}'")),
            ExprKind::DeclRef(d) => {
                let name = self.ctx.decl(d).name.clone();
                self.line(indent, format!("DeclRef {name} '{ty}'"));
            }
            ExprKind::Unary { op, operand } => {
                self.line(indent, format!("Unary {op:?} '{ty}'"));
                self.dump_expr(operand, indent + 1);
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.line(indent, format!("Binary {op:?} '{ty}'"));
                self.dump_expr(lhs, indent + 1);
                self.dump_expr(rhs, indent + 1);
            }
            ExprKind::Conditional { cond, then_expr, else_expr } => {
                self.line(indent, format!("Conditional '{ty}'"));
                self.dump_expr(cond, indent + 1);
                self.dump_expr(then_expr, indent + 1);
                self.dump_expr(else_expr, indent + 1);
            }
            ExprKind::Call { callee, args } => {
                self.line(indent, format!("Call '{ty}'"));
                self.dump_expr(callee, indent + 1);
                for a in args {
                    self.dump_expr(a, indent + 1);
                }
            }
            ExprKind::Member { base, name, arrow, .. } => {
                let sep = if arrow { "->" } else { "." };
                self.line(indent, format!("Member {sep}{name} '{ty}'"));
                self.dump_expr(base, indent + 1);
            }
            ExprKind::ArraySubscript { base, index } => {
                self.line(indent, format!("ArraySubscript '{ty}'"));
                self.dump_expr(base, indent + 1);
                self.dump_expr(index, indent + 1);
            }
            ExprKind::Cast { operand } => {
                self.line(indent, format!("Cast '{ty}'"));
                self.dump_expr(operand, indent + 1);
            }
            ExprKind::InitList { elems } => {
                self.line(indent, format!("InitList '{ty}'"));
                for e in elems {
                    self.dump_expr(e, indent + 1);
                }
            }
        }
    }
}
