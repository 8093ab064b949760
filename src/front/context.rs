//! The per-translation-unit arena. Every AST node and every type is
//! allocated here and referenced by handle; the whole arena is dropped at
//! the end of a compile.

use cranelift_entity::PrimaryMap;

use crate::front::ast::{Decl, DeclId, Expr, ExprId, Stmt, StmtId};
use crate::front::types::{ArrayLen, RecordKind, Type, TypeId, TypeKind};

pub struct AstContext {
    types: PrimaryMap<TypeId, Type>,
    decls: PrimaryMap<DeclId, Decl>,
    stmts: PrimaryMap<StmtId, Stmt>,
    exprs: PrimaryMap<ExprId, Expr>,
}

impl AstContext {
    pub fn new() -> Self {
        Self {
            types: PrimaryMap::new(),
            decls: PrimaryMap::new(),
            stmts: PrimaryMap::new(),
            exprs: PrimaryMap::new(),
        }
    }

    pub fn alloc_type(&mut self, ty: Type) -> TypeId {
        self.types.push(ty)
    }

    pub fn alloc_decl(&mut self, decl: Decl) -> DeclId {
        self.decls.push(decl)
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.push(stmt)
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        self.exprs.push(expr)
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id]
    }

    pub fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id]
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    // ------------------------------------------------------------ layout
    // x86-64 SysV sizes and alignments.

    pub fn size_of(&self, id: TypeId) -> Option<u64> {
        match &self.ty(id).kind {
            TypeKind::Void | TypeKind::Function { .. } => None,
            TypeKind::Bool | TypeKind::Char(_) => Some(1),
            TypeKind::Short(_) => Some(2),
            TypeKind::Int(_) | TypeKind::Float => Some(4),
            TypeKind::Long(_) | TypeKind::LongLong(_) | TypeKind::Pointer { .. } => Some(8),
            TypeKind::Double { long: false } => Some(8),
            TypeKind::Double { long: true } => Some(16),
            TypeKind::Array { elem, len } => match len {
                ArrayLen::Fixed(n) => Some(self.size_of(*elem)? * n),
                ArrayLen::Unknown => None,
            },
            TypeKind::Record { kind, members } => {
                let mut size = 0u64;
                let mut max_align = 1u64;
                for m in members {
                    let a = self.align_of(m.ty)?;
                    let s = self.size_of(m.ty)?;
                    max_align = max_align.max(a);
                    match kind {
                        RecordKind::Struct => size = align_to(size, a) + s,
                        RecordKind::Union => size = size.max(s),
                    }
                }
                Some(align_to(size, max_align))
            }
        }
    }

    pub fn align_of(&self, id: TypeId) -> Option<u64> {
        match &self.ty(id).kind {
            TypeKind::Void | TypeKind::Function { .. } => None,
            TypeKind::Bool | TypeKind::Char(_) => Some(1),
            TypeKind::Short(_) => Some(2),
            TypeKind::Int(_) | TypeKind::Float => Some(4),
            TypeKind::Long(_) | TypeKind::LongLong(_) | TypeKind::Pointer { .. } => Some(8),
            TypeKind::Double { long: false } => Some(8),
            TypeKind::Double { long: true } => Some(16),
            TypeKind::Array { elem, .. } => self.align_of(*elem),
            TypeKind::Record { members, .. } => {
                let mut max_align = 1u64;
                for m in members {
                    max_align = max_align.max(self.align_of(m.ty)?);
                }
                Some(max_align)
            }
        }
    }

    /// Byte offset of a struct member; unions place every member at 0.
    pub fn member_offset(&self, record: TypeId, index: u32) -> Option<u64> {
        match &self.ty(record).kind {
            TypeKind::Record { kind: RecordKind::Union, .. } => Some(0),
            TypeKind::Record { kind: RecordKind::Struct, members } => {
                let mut offset = 0u64;
                for (i, m) in members.iter().enumerate() {
                    let a = self.align_of(m.ty)?;
                    offset = align_to(offset, a);
                    if i as u32 == index {
                        return Some(offset);
                    }
                    offset += self.size_of(m.ty)?;
                }
                None
            }
            _ => None,
        }
    }
}

impl Default for AstContext {
    fn default() -> Self {
        Self::new()
    }
}

fn align_to(x: u64, a: u64) -> u64 {
    if a == 0 {
        x
    } else {
        (x + a - 1) & !(a - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front::types::{Member, Sign};

    #[test]
    fn scalar_sizes() {
        let mut ctx = AstContext::new();
        let int = ctx.alloc_type(Type::new(TypeKind::Int(Sign::None)));
        let long = ctx.alloc_type(Type::new(TypeKind::Long(Sign::None)));
        let ptr = ctx.alloc_type(Type::new(TypeKind::Pointer { base: int }));
        assert_eq!(ctx.size_of(int), Some(4));
        assert_eq!(ctx.size_of(long), Some(8));
        assert_eq!(ctx.size_of(ptr), Some(8));
    }

    #[test]
    fn struct_layout_with_padding() {
        let mut ctx = AstContext::new();
        let c = ctx.alloc_type(Type::new(TypeKind::Char(Sign::None)));
        let i = ctx.alloc_type(Type::new(TypeKind::Int(Sign::None)));
        let rec = ctx.alloc_type(Type::new(TypeKind::Record {
            kind: RecordKind::Struct,
            members: vec![
                Member { name: "c".into(), ty: c },
                Member { name: "i".into(), ty: i },
            ],
        }));
        assert_eq!(ctx.size_of(rec), Some(8));
        assert_eq!(ctx.member_offset(rec, 0), Some(0));
        assert_eq!(ctx.member_offset(rec, 1), Some(4));
    }

    #[test]
    fn array_size() {
        let mut ctx = AstContext::new();
        let i = ctx.alloc_type(Type::new(TypeKind::Int(Sign::None)));
        let arr = ctx.alloc_type(Type::new(TypeKind::Array { elem: i, len: ArrayLen::Fixed(3) }));
        assert_eq!(ctx.size_of(arr), Some(12));
    }
}
