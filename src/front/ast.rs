//! AST node definitions: declarations, statements, and expressions as
//! three tagged sums. Nodes reference each other by arena handle only;
//! parent-to-child edges make the AST a tree.

use cranelift_entity::entity_impl;

use crate::front::token::Span;
use crate::front::types::TypeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeclId(u32);
entity_impl!(DeclId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StmtId(u32);
entity_impl!(StmtId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExprId(u32);
entity_impl!(ExprId);

#[derive(Clone, Debug)]
pub struct TranslationUnit {
    pub decls: Vec<DeclId>,
}

// ---------------------------------------------------------------- decls

#[derive(Clone, Debug)]
pub struct Decl {
    pub name: String,
    pub kind: DeclKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum DeclKind {
    Var {
        ty: TypeId,
        init: Option<ExprId>,
    },
    Function {
        ty: TypeId,
        params: Vec<DeclId>,
        body: Option<StmtId>,
        /// Block-scope variables, collected so the emitter can lay out the
        /// stack frame without re-walking the body.
        locals: Vec<DeclId>,
    },
    Record {
        ty: TypeId,
    },
    Typedef {
        ty: TypeId,
    },
    Label,
}

impl Decl {
    pub fn type_id(&self) -> Option<TypeId> {
        match self.kind {
            DeclKind::Var { ty, .. }
            | DeclKind::Function { ty, .. }
            | DeclKind::Record { ty }
            | DeclKind::Typedef { ty } => Some(ty),
            DeclKind::Label => None,
        }
    }
}

// ----------------------------------------------------------------- stmts

#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Empty,
    Expr(ExprId),
    Decl(Vec<DeclId>),
    Compound(Vec<StmtId>),
    If { cond: ExprId, then_stmt: StmtId, else_stmt: Option<StmtId> },
    While { cond: ExprId, body: StmtId },
    DoWhile { cond: ExprId, body: StmtId },
    For { init: Option<StmtId>, cond: Option<ExprId>, step: Option<ExprId>, body: StmtId },
    Switch { cond: ExprId, body: StmtId },
    Case { value: Option<ExprId>, body: StmtId, is_default: bool },
    Return(Option<ExprId>),
    Break,
    Continue,
    Goto { label: String },
    Labeled { label: DeclId, body: StmtId },
}

// ----------------------------------------------------------------- exprs

/// Every expression carries its resolved type; no node leaves the parser
/// without one.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: TypeId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    CharLit(u8),
    StrLit(String),
    DeclRef(DeclId),
    Unary { op: UnaryOp, operand: ExprId },
    Binary { op: BinaryOp, lhs: ExprId, rhs: ExprId },
    Conditional { cond: ExprId, then_expr: ExprId, else_expr: ExprId },
    Call { callee: ExprId, args: Vec<ExprId> },
    Member { base: ExprId, name: String, index: u32, arrow: bool },
    ArraySubscript { base: ExprId, index: ExprId },
    /// The target type is the expression's own `ty`.
    Cast { operand: ExprId },
    InitList { elems: Vec<ExprId> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    LogNot,
    AddressOf,
    Deref,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Comma,
    Assign,
    MulAssign,
    DivAssign,
    RemAssign,
    AddAssign,
    SubAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
    LogOr,
    LogAnd,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn is_assignment(self) -> bool {
        use BinaryOp::*;
        matches!(
            self,
            Assign | MulAssign | DivAssign | RemAssign | AddAssign | SubAssign | ShlAssign
                | ShrAssign | AndAssign | XorAssign | OrAssign
        )
    }

    pub fn is_comparison(self) -> bool {
        use BinaryOp::*;
        matches!(self, Eq | Ne | Lt | Gt | Le | Ge)
    }
}
