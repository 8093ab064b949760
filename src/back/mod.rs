//! x86-64 code emission, AT&T syntax. One visitor per declaration,
//! statement, and expression variant; the driver hands over top-level
//! declarations in source order and each visitor traverses its children.
//!
//! Values are computed into %rax; intermediates spill with push/pop, with
//! the depth tracked so the emitter knows its own stack usage. Integer and
//! pointer code is emitted directly; floating-point emission is not wired
//! up yet and reports a clear error.

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{CompileError, CompileResult};
use crate::front::ast::{
    BinaryOp, DeclId, DeclKind, ExprId, ExprKind, StmtId, StmtKind, TranslationUnit, UnaryOp,
};
use crate::front::context::AstContext;
use crate::front::token::Span;
use crate::front::types::{TypeId, TypeKind};

const ARG_REGS: [&str; 6] = ["%rdi", "%rsi", "%rdx", "%rcx", "%r8", "%r9"];

pub fn generate_assembly(ctx: &AstContext, tu: &TranslationUnit) -> CompileResult<String> {
    let mut cg = CodeGen::new(ctx);
    for &decl in &tu.decls {
        cg.emit_top_decl(decl)?;
    }
    Ok(cg.finish())
}

/// Counter for intermediate values spilled to the machine stack.
struct StackDepth {
    depth: usize,
}

impl StackDepth {
    fn push(&mut self) {
        self.depth += 1;
    }

    fn pop(&mut self) {
        self.depth -= 1;
    }
}

struct SwitchCtx {
    case_labels: FxHashMap<StmtId, String>,
    end_label: String,
}

struct CodeGen<'a> {
    ctx: &'a AstContext,
    text: Vec<String>,
    data: Vec<String>,
    rodata: Vec<String>,
    depth: StackDepth,
    label: usize,
    str_index: usize,
    /// %rbp-relative slots of the current function's params and locals.
    locals: FxHashMap<DeclId, i64>,
    epilogue: String,
    continue_stack: Vec<String>,
    break_stack: Vec<String>,
    switch_stack: Vec<SwitchCtx>,
}

impl<'a> CodeGen<'a> {
    fn new(ctx: &'a AstContext) -> Self {
        Self {
            ctx,
            text: Vec::new(),
            data: Vec::new(),
            rodata: Vec::new(),
            depth: StackDepth { depth: 0 },
            label: 0,
            str_index: 0,
            locals: FxHashMap::default(),
            epilogue: String::new(),
            continue_stack: Vec::new(),
            break_stack: Vec::new(),
            switch_stack: Vec::new(),
        }
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.text.push(line.into());
    }

    fn new_label(&mut self) -> String {
        let l = self.label;
        self.label += 1;
        format!(".L{l}")
    }

    fn push(&mut self) {
        self.emit("  push %rax");
        self.depth.push();
    }

    fn pop(&mut self, reg: &str) {
        self.emit(format!("  pop {reg}"));
        self.depth.pop();
    }

    fn finish(self) -> String {
        let mut out = String::new();
        if !self.rodata.is_empty() {
            out.push_str("  .section .rodata\n");
            for l in &self.rodata {
                out.push_str(l);
                out.push('\n');
            }
        }
        for l in &self.data {
            out.push_str(l);
            out.push('\n');
        }
        for l in &self.text {
            out.push_str(l);
            out.push('\n');
        }
        out
    }

    // -------------------------------------------------------------- decls

    fn emit_top_decl(&mut self, id: DeclId) -> CompileResult<()> {
        match &self.ctx.decl(id).kind {
            DeclKind::Function { .. } => self.emit_function_decl(id),
            DeclKind::Var { .. } => self.emit_global_var_decl(id),
            // no code for type-level declarations
            DeclKind::Record { .. } | DeclKind::Typedef { .. } | DeclKind::Label => Ok(()),
        }
    }

    fn emit_function_decl(&mut self, id: DeclId) -> CompileResult<()> {
        let decl = self.ctx.decl(id).clone();
        let (params, body, locals) = match decl.kind {
            DeclKind::Function { params, body, locals, .. } => (params, body, locals),
            _ => return Ok(()),
        };
        let body = match body {
            Some(b) => b,
            // forward declaration, nothing to emit
            None => return Ok(()),
        };
        debug!("emitting function '{}'", decl.name);

        self.locals.clear();
        let mut offset: i64 = 0;
        for &d in params.iter().chain(locals.iter()) {
            let size = self
                .ctx
                .decl(d)
                .type_id()
                .and_then(|t| self.ctx.size_of(t))
                .unwrap_or(8);
            offset -= ((size + 7) & !7) as i64;
            self.locals.insert(d, offset);
        }
        let frame = ((-offset + 15) & !15) as i64;

        self.emit("  .text");
        self.emit(format!("  .globl {}", decl.name));
        self.emit(format!("{}:", decl.name));
        self.emit("  push %rbp");
        self.emit("  mov %rsp, %rbp");
        if frame > 0 {
            self.emit(format!("  sub ${frame}, %rsp"));
        }
        for (i, &p) in params.iter().enumerate() {
            if i >= ARG_REGS.len() {
                return Err(CompileError::unimplemented(
                    "more than six parameters",
                    self.ctx.decl(p).span,
                ));
            }
            let off = self.locals[&p];
            self.emit(format!("  mov {}, {}(%rbp)", ARG_REGS[i], off));
        }

        self.epilogue = self.new_label();
        self.emit_stmt(body)?;
        debug_assert_eq!(self.depth.depth, 0, "unbalanced spill stack");
        self.emit("  mov $0, %rax");
        let epilogue = self.epilogue.clone();
        self.emit(format!("{epilogue}:"));
        self.emit("  mov %rbp, %rsp");
        self.emit("  pop %rbp");
        self.emit("  ret");
        Ok(())
    }

    fn emit_global_var_decl(&mut self, id: DeclId) -> CompileResult<()> {
        let decl = self.ctx.decl(id).clone();
        let (ty, init) = match decl.kind {
            DeclKind::Var { ty, init } => (ty, init),
            _ => return Ok(()),
        };
        let size = self.ctx.size_of(ty).ok_or_else(|| {
            CompileError::semantic(format!("'{}' has incomplete type", decl.name), decl.span)
        })?;
        match init {
            None => {
                self.data.push("  .bss".into());
                self.data.push(format!("  .globl {}", decl.name));
                self.data.push(format!("{}:", decl.name));
                self.data.push(format!("  .zero {size}"));
            }
            Some(init) => {
                self.data.push("  .data".into());
                self.data.push(format!("  .globl {}", decl.name));
                self.data.push(format!("{}:", decl.name));
                self.emit_global_init(ty, init, decl.span)?;
            }
        }
        Ok(())
    }

    fn emit_global_init(&mut self, ty: TypeId, init: ExprId, span: Span) -> CompileResult<()> {
        let kind = self.ctx.expr(init).kind.clone();
        match kind {
            ExprKind::InitList { elems } => {
                let (elem_ty, len) = match self.ctx.ty(ty).kind {
                    TypeKind::Array { elem, len } => (elem, len),
                    _ => {
                        return Err(CompileError::unimplemented(
                            "aggregate initialiser for this global",
                            span,
                        ))
                    }
                };
                for &e in &elems {
                    self.emit_global_init(elem_ty, e, span)?;
                }
                // trailing elements default to zero
                if let crate::front::types::ArrayLen::Fixed(n) = len {
                    let missing = n.saturating_sub(elems.len() as u64);
                    if missing > 0 {
                        let esize = self.ctx.size_of(elem_ty).unwrap_or(8);
                        self.data.push(format!("  .zero {}", esize * missing));
                    }
                }
                Ok(())
            }
            _ => {
                let value = self.eval_const_int(init).ok_or_else(|| {
                    CompileError::semantic("global initialiser is not a constant", span)
                })?;
                let directive = match self.ctx.size_of(ty) {
                    Some(1) => ".byte",
                    Some(2) => ".short",
                    Some(4) => ".long",
                    _ => ".quad",
                };
                self.data.push(format!("  {directive} {value}"));
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------- stmts

    fn emit_stmt(&mut self, id: StmtId) -> CompileResult<()> {
        let stmt = self.ctx.stmt(id).clone();
        match stmt.kind {
            StmtKind::Empty => Ok(()),
            StmtKind::Expr(e) => self.emit_expr(e),
            StmtKind::Compound(stmts) => self.emit_compound_stmt(&stmts),
            StmtKind::Decl(decls) => self.emit_decl_stmt(&decls),
            StmtKind::If { cond, then_stmt, else_stmt } => {
                self.emit_if_stmt(cond, then_stmt, else_stmt)
            }
            StmtKind::While { cond, body } => self.emit_while_stmt(cond, body),
            StmtKind::DoWhile { cond, body } => self.emit_do_stmt(cond, body),
            StmtKind::For { init, cond, step, body } => self.emit_for_stmt(init, cond, step, body),
            StmtKind::Switch { cond, body } => self.emit_switch_stmt(cond, body),
            StmtKind::Case { body, .. } => self.emit_case_stmt(id, body),
            StmtKind::Return(value) => self.emit_return_stmt(value),
            StmtKind::Break => match self.break_stack.last().cloned() {
                Some(l) => {
                    self.emit(format!("  jmp {l}"));
                    Ok(())
                }
                None => Err(CompileError::semantic("'break' outside loop or switch", stmt.span)),
            },
            StmtKind::Continue => match self.continue_stack.last().cloned() {
                Some(l) => {
                    self.emit(format!("  jmp {l}"));
                    Ok(())
                }
                None => Err(CompileError::semantic("'continue' outside loop", stmt.span)),
            },
            StmtKind::Goto { .. } => {
                Err(CompileError::unimplemented("'goto' emission", stmt.span))
            }
            StmtKind::Labeled { body, .. } => {
                let l = self.new_label();
                self.emit(format!("{l}:"));
                self.emit_stmt(body)
            }
        }
    }

    fn emit_compound_stmt(&mut self, stmts: &[StmtId]) -> CompileResult<()> {
        for &s in stmts {
            self.emit_stmt(s)?;
        }
        Ok(())
    }

    fn emit_decl_stmt(&mut self, decls: &[DeclId]) -> CompileResult<()> {
        for &d in decls {
            let decl = self.ctx.decl(d).clone();
            if let DeclKind::Var { ty, init: Some(init) } = decl.kind {
                self.emit_local_init(d, ty, init)?;
            }
        }
        Ok(())
    }

    fn emit_local_init(&mut self, decl: DeclId, ty: TypeId, init: ExprId) -> CompileResult<()> {
        let off = match self.locals.get(&decl) {
            Some(off) => *off,
            None => return Ok(()),
        };
        match self.ctx.expr(init).kind.clone() {
            ExprKind::InitList { elems } => {
                let elem_ty = match self.ctx.ty(ty).kind {
                    TypeKind::Array { elem, .. } => elem,
                    _ => {
                        return Err(CompileError::unimplemented(
                            "aggregate initialiser for this local",
                            self.ctx.expr(init).span,
                        ))
                    }
                };
                let esize = self.ctx.size_of(elem_ty).unwrap_or(8) as i64;
                for (i, e) in elems.iter().enumerate() {
                    self.emit_expr(*e)?;
                    self.emit(format!("  lea {}(%rbp), %rdi", off + i as i64 * esize));
                    self.store(elem_ty);
                }
                Ok(())
            }
            _ => {
                self.emit_expr(init)?;
                self.emit(format!("  lea {off}(%rbp), %rdi"));
                self.store(ty);
                Ok(())
            }
        }
    }

    fn emit_if_stmt(
        &mut self,
        cond: ExprId,
        then_stmt: StmtId,
        else_stmt: Option<StmtId>,
    ) -> CompileResult<()> {
        let else_label = self.new_label();
        let end_label = self.new_label();
        self.emit_expr(cond)?;
        self.emit("  cmp $0, %rax");
        self.emit(format!("  je {else_label}"));
        self.emit_stmt(then_stmt)?;
        self.emit(format!("  jmp {end_label}"));
        self.emit(format!("{else_label}:"));
        if let Some(e) = else_stmt {
            self.emit_stmt(e)?;
        }
        self.emit(format!("{end_label}:"));
        Ok(())
    }

    fn emit_while_stmt(&mut self, cond: ExprId, body: StmtId) -> CompileResult<()> {
        let begin = self.new_label();
        let end = self.new_label();
        self.continue_stack.push(begin.clone());
        self.break_stack.push(end.clone());
        self.emit(format!("{begin}:"));
        self.emit_expr(cond)?;
        self.emit("  cmp $0, %rax");
        self.emit(format!("  je {end}"));
        self.emit_stmt(body)?;
        self.emit(format!("  jmp {begin}"));
        self.emit(format!("{end}:"));
        self.continue_stack.pop();
        self.break_stack.pop();
        Ok(())
    }

    fn emit_do_stmt(&mut self, cond: ExprId, body: StmtId) -> CompileResult<()> {
        let begin = self.new_label();
        let cont = self.new_label();
        let end = self.new_label();
        self.continue_stack.push(cont.clone());
        self.break_stack.push(end.clone());
        self.emit(format!("{begin}:"));
        self.emit_stmt(body)?;
        self.emit(format!("{cont}:"));
        self.emit_expr(cond)?;
        self.emit("  cmp $0, %rax");
        self.emit(format!("  jne {begin}"));
        self.emit(format!("{end}:"));
        self.continue_stack.pop();
        self.break_stack.pop();
        Ok(())
    }

    fn emit_for_stmt(
        &mut self,
        init: Option<StmtId>,
        cond: Option<ExprId>,
        step: Option<ExprId>,
        body: StmtId,
    ) -> CompileResult<()> {
        let begin = self.new_label();
        let cont = self.new_label();
        let end = self.new_label();
        if let Some(init) = init {
            self.emit_stmt(init)?;
        }
        self.continue_stack.push(cont.clone());
        self.break_stack.push(end.clone());
        self.emit(format!("{begin}:"));
        if let Some(cond) = cond {
            self.emit_expr(cond)?;
            self.emit("  cmp $0, %rax");
            self.emit(format!("  je {end}"));
        }
        self.emit_stmt(body)?;
        self.emit(format!("{cont}:"));
        if let Some(step) = step {
            self.emit_expr(step)?;
        }
        self.emit(format!("  jmp {begin}"));
        self.emit(format!("{end}:"));
        self.continue_stack.pop();
        self.break_stack.pop();
        Ok(())
    }

    /// Collect the case statements reachable as direct children of the
    /// switch body, give each a label, then emit the dispatch chain.
    fn emit_switch_stmt(&mut self, cond: ExprId, body: StmtId) -> CompileResult<()> {
        let end = self.new_label();
        let mut cases: Vec<(Option<i64>, StmtId)> = Vec::new();
        self.collect_cases(body, &mut cases)?;

        self.emit_expr(cond)?;
        let mut ctx = SwitchCtx { case_labels: FxHashMap::default(), end_label: end.clone() };
        let mut default_label: Option<String> = None;
        let mut compares: Vec<String> = Vec::new();
        for (value, stmt) in &cases {
            let l = self.new_label();
            ctx.case_labels.insert(*stmt, l.clone());
            match value {
                Some(v) => {
                    compares.push(format!("  cmp ${v}, %rax"));
                    compares.push(format!("  je {l}"));
                }
                None => default_label = Some(l),
            }
        }
        for line in compares {
            self.emit(line);
        }
        match default_label {
            Some(l) => self.emit(format!("  jmp {l}")),
            None => self.emit(format!("  jmp {end}")),
        }

        self.switch_stack.push(ctx);
        self.break_stack.push(end.clone());
        self.emit_stmt(body)?;
        self.break_stack.pop();
        self.switch_stack.pop();
        self.emit(format!("{end}:"));
        Ok(())
    }

    fn collect_cases(
        &self,
        body: StmtId,
        out: &mut Vec<(Option<i64>, StmtId)>,
    ) -> CompileResult<()> {
        let stmt = self.ctx.stmt(body).clone();
        let children: Vec<StmtId> = match stmt.kind {
            StmtKind::Compound(stmts) => stmts,
            _ => vec![body],
        };
        for s in children {
            let child = self.ctx.stmt(s).clone();
            if let StmtKind::Case { value, body: inner, is_default } = child.kind {
                let v = match value {
                    Some(e) => Some(self.eval_const_int(e).ok_or_else(|| {
                        CompileError::semantic("case value is not an integer constant", child.span)
                    })?),
                    None => None,
                };
                debug_assert_eq!(v.is_none(), is_default);
                out.push((v, s));
                // `case 1: case 2:` chains nest in the statement
                self.collect_cases(inner, out)?;
            }
        }
        Ok(())
    }

    fn emit_case_stmt(&mut self, id: StmtId, body: StmtId) -> CompileResult<()> {
        let label = self.switch_stack.last().and_then(|c| c.case_labels.get(&id).cloned());
        if let Some(l) = label {
            self.emit(format!("{l}:"));
        }
        self.emit_stmt(body)
    }

    fn emit_return_stmt(&mut self, value: Option<ExprId>) -> CompileResult<()> {
        if let Some(v) = value {
            self.emit_expr(v)?;
        }
        let epilogue = self.epilogue.clone();
        self.emit(format!("  jmp {epilogue}"));
        Ok(())
    }

    // -------------------------------------------------------------- exprs

    /// Leave the address of an lvalue in %rax.
    fn emit_addr(&mut self, e: ExprId) -> CompileResult<()> {
        let expr = self.ctx.expr(e).clone();
        match expr.kind {
            ExprKind::DeclRef(d) => {
                match self.locals.get(&d) {
                    Some(off) => self.emit(format!("  lea {off}(%rbp), %rax")),
                    None => {
                        let name = self.ctx.decl(d).name.clone();
                        self.emit(format!("  lea {name}(%rip), %rax"));
                    }
                }
                Ok(())
            }
            ExprKind::Unary { op: UnaryOp::Deref, operand } => self.emit_expr(operand),
            ExprKind::Member { base, index, arrow, .. } => {
                let base_ty = self.ctx.expr(base).ty;
                let rec_ty = if arrow {
                    match self.ctx.ty(base_ty).kind {
                        TypeKind::Pointer { base } => base,
                        _ => base_ty,
                    }
                } else {
                    base_ty
                };
                if arrow {
                    self.emit_expr(base)?;
                } else {
                    self.emit_addr(base)?;
                }
                let off = self.ctx.member_offset(rec_ty, index).unwrap_or(0);
                if off != 0 {
                    self.emit(format!("  add ${off}, %rax"));
                }
                Ok(())
            }
            ExprKind::ArraySubscript { base, index } => {
                let base_ty = self.ctx.expr(base).ty;
                let elem = match self.ctx.ty(base_ty).kind {
                    TypeKind::Array { elem, .. } => elem,
                    TypeKind::Pointer { base } => base,
                    _ => base_ty,
                };
                let esize = self.ctx.size_of(elem).unwrap_or(1);
                self.emit_expr(index)?;
                self.push();
                if self.ctx.ty(base_ty).is_array() {
                    self.emit_addr(base)?;
                } else {
                    self.emit_expr(base)?;
                }
                self.pop("%rdi");
                if esize != 1 {
                    self.emit(format!("  imul ${esize}, %rdi"));
                }
                self.emit("  add %rdi, %rax");
                Ok(())
            }
            _ => Err(CompileError::semantic("expression is not addressable", expr.span)),
        }
    }

    /// Sign-extending load through the address in %rax.
    fn load(&mut self, ty: TypeId) {
        match self.ctx.ty(ty).kind {
            // arrays and functions decay to their address
            TypeKind::Array { .. } | TypeKind::Function { .. } | TypeKind::Record { .. } => {}
            _ => match self.ctx.size_of(ty) {
                Some(1) => self.emit("  movsbq (%rax), %rax"),
                Some(2) => self.emit("  movswq (%rax), %rax"),
                Some(4) => self.emit("  movslq (%rax), %rax"),
                _ => self.emit("  mov (%rax), %rax"),
            },
        }
    }

    /// Store %rax through the address in %rdi.
    fn store(&mut self, ty: TypeId) {
        match self.ctx.size_of(ty) {
            Some(1) => self.emit("  mov %al, (%rdi)"),
            Some(2) => self.emit("  mov %ax, (%rdi)"),
            Some(4) => self.emit("  mov %eax, (%rdi)"),
            _ => self.emit("  mov %rax, (%rdi)"),
        }
    }

    fn emit_expr(&mut self, e: ExprId) -> CompileResult<()> {
        let expr = self.ctx.expr(e).clone();
        if self.ctx.ty(expr.ty).is_floating() {
            return Err(CompileError::unimplemented(
                "floating-point code generation",
                expr.span,
            ));
        }
        match expr.kind {
            ExprKind::IntLit(v) => {
                self.emit(format!("  mov ${v}, %rax"));
                Ok(())
            }
            ExprKind::CharLit(c) => {
                self.emit(format!("  mov ${}, %rax", c as i64));
                Ok(())
            }
            ExprKind::FloatLit(_) => Err(CompileError::unimplemented(
                "floating-point code generation",
                expr.span,
            )),
            ExprKind::StrLit(s) => {
                let label = format!(".Lstr{}", self.str_index);
                self.str_index += 1;
                self.rodata.push(format!("{label}:"));
                self.rodata.push(format!("  .asciz {:?}", s));
                self.emit(format!("  lea {label}(%rip), %rax"));
                Ok(())
            }
            ExprKind::DeclRef(_) | ExprKind::Member { .. } | ExprKind::ArraySubscript { .. } => {
                self.emit_addr(e)?;
                self.load(expr.ty);
                Ok(())
            }
            ExprKind::Unary { op, operand } => self.emit_unary_expr(op, operand, expr.ty),
            ExprKind::Binary { op, lhs, rhs } => self.emit_binary_expr(op, lhs, rhs, expr.span),
            ExprKind::Conditional { cond, then_expr, else_expr } => {
                let else_label = self.new_label();
                let end_label = self.new_label();
                self.emit_expr(cond)?;
                self.emit("  cmp $0, %rax");
                self.emit(format!("  je {else_label}"));
                self.emit_expr(then_expr)?;
                self.emit(format!("  jmp {end_label}"));
                self.emit(format!("{else_label}:"));
                self.emit_expr(else_expr)?;
                self.emit(format!("{end_label}:"));
                Ok(())
            }
            ExprKind::Call { callee, args } => self.emit_call_expr(callee, &args),
            ExprKind::Cast { operand } => {
                self.emit_expr(operand)?;
                // integer casts renormalise the value to the target width
                match self.ctx.size_of(expr.ty) {
                    Some(1) => self.emit("  movsbq %al, %rax"),
                    Some(2) => self.emit("  movswq %ax, %rax"),
                    Some(4) => self.emit("  movslq %eax, %rax"),
                    _ => {}
                }
                Ok(())
            }
            ExprKind::InitList { .. } => Err(CompileError::semantic(
                "initialiser list used outside a declaration",
                expr.span,
            )),
        }
    }

    fn emit_unary_expr(&mut self, op: UnaryOp, operand: ExprId, ty: TypeId) -> CompileResult<()> {
        match op {
            UnaryOp::Plus => self.emit_expr(operand),
            UnaryOp::Minus => {
                self.emit_expr(operand)?;
                self.emit("  neg %rax");
                Ok(())
            }
            UnaryOp::BitNot => {
                self.emit_expr(operand)?;
                self.emit("  not %rax");
                Ok(())
            }
            UnaryOp::LogNot => {
                self.emit_expr(operand)?;
                self.emit("  cmp $0, %rax");
                self.emit("  sete %al");
                self.emit("  movzb %al, %rax");
                Ok(())
            }
            UnaryOp::AddressOf => self.emit_addr(operand),
            UnaryOp::Deref => {
                self.emit_expr(operand)?;
                self.load(ty);
                Ok(())
            }
            UnaryOp::PreInc | UnaryOp::PreDec => {
                let operand_ty = self.ctx.expr(operand).ty;
                self.emit_addr(operand)?;
                self.push();
                self.load(operand_ty);
                self.emit(if op == UnaryOp::PreInc { "  add $1, %rax" } else { "  sub $1, %rax" });
                self.pop("%rdi");
                self.store(operand_ty);
                Ok(())
            }
            UnaryOp::PostInc | UnaryOp::PostDec => {
                let operand_ty = self.ctx.expr(operand).ty;
                self.emit_addr(operand)?;
                self.push();
                self.load(operand_ty);
                self.emit("  mov %rax, %rcx");
                self.emit(if op == UnaryOp::PostInc { "  add $1, %rax" } else { "  sub $1, %rax" });
                self.pop("%rdi");
                self.store(operand_ty);
                self.emit("  mov %rcx, %rax");
                Ok(())
            }
        }
    }

    fn emit_binary_expr(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        span: Span,
    ) -> CompileResult<()> {
        if op.is_assignment() {
            return self.emit_assign_expr(op, lhs, rhs);
        }
        match op {
            BinaryOp::Comma => {
                self.emit_expr(lhs)?;
                self.emit_expr(rhs)
            }
            BinaryOp::LogAnd | BinaryOp::LogOr => {
                let short = self.new_label();
                let end = self.new_label();
                let (jump, early, late) =
                    if op == BinaryOp::LogAnd { ("je", 0, 1) } else { ("jne", 1, 0) };
                self.emit_expr(lhs)?;
                self.emit("  cmp $0, %rax");
                self.emit(format!("  {jump} {short}"));
                self.emit_expr(rhs)?;
                self.emit("  cmp $0, %rax");
                self.emit(format!("  {jump} {short}"));
                self.emit(format!("  mov ${late}, %rax"));
                self.emit(format!("  jmp {end}"));
                self.emit(format!("{short}:"));
                self.emit(format!("  mov ${early}, %rax"));
                self.emit(format!("{end}:"));
                Ok(())
            }
            _ => {
                self.emit_expr(rhs)?;
                self.push();
                self.emit_expr(lhs)?;
                self.pop("%rdi");
                match op {
                    BinaryOp::Add => self.emit("  add %rdi, %rax"),
                    BinaryOp::Sub => self.emit("  sub %rdi, %rax"),
                    BinaryOp::Mul => self.emit("  imul %rdi, %rax"),
                    BinaryOp::Div => {
                        self.emit("  cqo");
                        self.emit("  idiv %rdi");
                    }
                    BinaryOp::Rem => {
                        self.emit("  cqo");
                        self.emit("  idiv %rdi");
                        self.emit("  mov %rdx, %rax");
                    }
                    BinaryOp::BitAnd => self.emit("  and %rdi, %rax"),
                    BinaryOp::BitOr => self.emit("  or %rdi, %rax"),
                    BinaryOp::BitXor => self.emit("  xor %rdi, %rax"),
                    BinaryOp::Shl => {
                        self.emit("  mov %rdi, %rcx");
                        self.emit("  shl %cl, %rax");
                    }
                    BinaryOp::Shr => {
                        self.emit("  mov %rdi, %rcx");
                        self.emit("  sar %cl, %rax");
                    }
                    BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le
                    | BinaryOp::Ge => {
                        self.emit("  cmp %rdi, %rax");
                        let set = match op {
                            BinaryOp::Eq => "sete",
                            BinaryOp::Ne => "setne",
                            BinaryOp::Lt => "setl",
                            BinaryOp::Gt => "setg",
                            BinaryOp::Le => "setle",
                            _ => "setge",
                        };
                        self.emit(format!("  {set} %al"));
                        self.emit("  movzb %al, %rax");
                    }
                    _ => {
                        return Err(CompileError::unimplemented(
                            "operator emission for this expression",
                            span,
                        ))
                    }
                }
                Ok(())
            }
        }
    }

    fn emit_assign_expr(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> CompileResult<()> {
        let lhs_ty = self.ctx.expr(lhs).ty;
        self.emit_addr(lhs)?;
        self.push();
        self.emit_expr(rhs)?;
        self.pop("%rdi");
        if op != BinaryOp::Assign {
            // fetch the old value into %rcx, combine into %rax
            match self.ctx.size_of(lhs_ty) {
                Some(1) => self.emit("  movsbq (%rdi), %rcx"),
                Some(2) => self.emit("  movswq (%rdi), %rcx"),
                Some(4) => self.emit("  movslq (%rdi), %rcx"),
                _ => self.emit("  mov (%rdi), %rcx"),
            }
            match op {
                BinaryOp::AddAssign => self.emit("  add %rcx, %rax"),
                BinaryOp::MulAssign => self.emit("  imul %rcx, %rax"),
                BinaryOp::AndAssign => self.emit("  and %rcx, %rax"),
                BinaryOp::OrAssign => self.emit("  or %rcx, %rax"),
                BinaryOp::XorAssign => self.emit("  xor %rcx, %rax"),
                BinaryOp::SubAssign => {
                    self.emit("  sub %rax, %rcx");
                    self.emit("  mov %rcx, %rax");
                }
                BinaryOp::DivAssign | BinaryOp::RemAssign => {
                    self.emit("  mov %rax, %r8");
                    self.emit("  mov %rcx, %rax");
                    self.emit("  cqo");
                    self.emit("  idiv %r8");
                    if op == BinaryOp::RemAssign {
                        self.emit("  mov %rdx, %rax");
                    }
                }
                BinaryOp::ShlAssign | BinaryOp::ShrAssign => {
                    self.emit("  mov %rax, %r8");
                    self.emit("  mov %rcx, %rax");
                    self.emit("  mov %r8, %rcx");
                    if op == BinaryOp::ShlAssign {
                        self.emit("  shl %cl, %rax");
                    } else {
                        self.emit("  sar %cl, %rax");
                    }
                }
                _ => {}
            }
        }
        self.store(lhs_ty);
        Ok(())
    }

    fn emit_call_expr(&mut self, callee: ExprId, args: &[ExprId]) -> CompileResult<()> {
        let span = self.ctx.expr(callee).span;
        if args.len() > ARG_REGS.len() {
            return Err(CompileError::unimplemented("more than six call arguments", span));
        }
        for &a in args {
            self.emit_expr(a)?;
            self.push();
        }
        for reg in ARG_REGS.iter().take(args.len()).rev() {
            self.pop(reg);
        }
        let direct = match &self.ctx.expr(callee).kind {
            ExprKind::DeclRef(d) => {
                let decl = self.ctx.decl(*d);
                match decl.kind {
                    DeclKind::Function { .. } => Some(decl.name.clone()),
                    _ => None,
                }
            }
            _ => None,
        };
        match direct {
            Some(name) => self.emit(format!("  call {name}")),
            None => {
                self.emit_expr(callee)?;
                self.emit("  call *%rax");
            }
        }
        Ok(())
    }

    /// Minimal integer constant folding for case values and global
    /// initialisers.
    fn eval_const_int(&self, e: ExprId) -> Option<i64> {
        match &self.ctx.expr(e).kind {
            ExprKind::IntLit(v) => Some(*v),
            ExprKind::CharLit(c) => Some(*c as i64),
            ExprKind::Cast { operand } => self.eval_const_int(*operand),
            ExprKind::Unary { op, operand } => {
                let v = self.eval_const_int(*operand)?;
                match op {
                    UnaryOp::Plus => Some(v),
                    UnaryOp::Minus => Some(-v),
                    UnaryOp::BitNot => Some(!v),
                    UnaryOp::LogNot => Some((v == 0) as i64),
                    _ => None,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let a = self.eval_const_int(*lhs)?;
                let b = self.eval_const_int(*rhs)?;
                match op {
                    BinaryOp::Add => Some(a.wrapping_add(b)),
                    BinaryOp::Sub => Some(a.wrapping_sub(b)),
                    BinaryOp::Mul => Some(a.wrapping_mul(b)),
                    BinaryOp::Div if b != 0 => Some(a / b),
                    BinaryOp::Rem if b != 0 => Some(a % b),
                    BinaryOp::Shl => Some(a.wrapping_shl(b as u32)),
                    BinaryOp::Shr => Some(a.wrapping_shr(b as u32)),
                    BinaryOp::BitAnd => Some(a & b),
                    BinaryOp::BitOr => Some(a | b),
                    BinaryOp::BitXor => Some(a ^ b),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front::parser::Parser;
    use crate::front::source::SourceBuffer;

    fn compile(src: &str) -> String {
        let buf = SourceBuffer::new("t.c", src, 0);
        let mut parser = Parser::new(&buf).unwrap();
        let tu = parser.parse_translation_unit().unwrap();
        let ctx = parser.into_context();
        generate_assembly(&ctx, &tu).unwrap()
    }

    #[test]
    fn emits_prologue_and_return() {
        let asm = compile("int main(void) { return 42; }");
        assert!(asm.contains(".globl main"));
        assert!(asm.contains("main:"));
        assert!(asm.contains("mov $42, %rax"));
        assert!(asm.contains("ret"));
    }

    #[test]
    fn emits_global_storage() {
        let asm = compile("int x = 7; int y;");
        assert!(asm.contains("x:"));
        assert!(asm.contains(".long 7"));
        assert!(asm.contains(".zero 4"));
    }

    #[test]
    fn emits_branches_for_if() {
        let asm = compile("int f(int a) { if (a) return 1; return 2; }");
        assert!(asm.contains("je .L"));
        assert!(asm.contains("cmp $0, %rax"));
    }

    #[test]
    fn float_emission_reports_unimplemented() {
        let buf = SourceBuffer::new("t.c", "double f() { return 1.5; }", 0);
        let mut parser = Parser::new(&buf).unwrap();
        let tu = parser.parse_translation_unit().unwrap();
        let ctx = parser.into_context();
        assert!(matches!(
            generate_assembly(&ctx, &tu),
            Err(CompileError::Unimplemented { .. })
        ));
    }
}
