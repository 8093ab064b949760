//! Parser unit tests.

use crate::error::CompileError;
use crate::front::ast::{
    BinaryOp, DeclId, DeclKind, ExprId, ExprKind, StmtId, StmtKind, TranslationUnit, UnaryOp,
};
use crate::front::context::AstContext;
use crate::front::dump::{dump_translation_unit, type_string};
use crate::front::parser::Parser;
use crate::front::source::SourceBuffer;
use crate::front::types::{ArrayLen, Sign, TypeKind};

fn parse(src: &str) -> (AstContext, TranslationUnit) {
    let buf = SourceBuffer::new("test.c", src, 0);
    let mut parser = Parser::new(&buf).expect("lexing the first token");
    let tu = parser.parse_translation_unit().expect("parse");
    assert_eq!(parser.scopes.depth(), 1, "scope stack must return to the file scope");
    (parser.into_context(), tu)
}

fn parse_err(src: &str) -> CompileError {
    let buf = SourceBuffer::new("test.c", src, 0);
    let mut parser = Parser::new(&buf).expect("lexing the first token");
    parser.parse_translation_unit().expect_err("parse should fail")
}

/// The last function declaration in the translation unit.
fn last_function(ctx: &AstContext, tu: &TranslationUnit) -> DeclId {
    *tu.decls
        .iter()
        .rev()
        .find(|d| matches!(ctx.decl(**d).kind, DeclKind::Function { .. }))
        .expect("no function in translation unit")
}

fn body_stmts(ctx: &AstContext, func: DeclId) -> Vec<StmtId> {
    match &ctx.decl(func).kind {
        DeclKind::Function { body: Some(body), .. } => match &ctx.stmt(*body).kind {
            StmtKind::Compound(stmts) => stmts.clone(),
            _ => panic!("function body is not a compound statement"),
        },
        _ => panic!("expected a function definition"),
    }
}

/// The expression of the first `return` in the last function.
fn first_return_expr(ctx: &AstContext, tu: &TranslationUnit) -> ExprId {
    let func = last_function(ctx, tu);
    for s in body_stmts(ctx, func) {
        if let StmtKind::Return(Some(e)) = ctx.stmt(s).kind {
            return e;
        }
    }
    panic!("no return statement with a value");
}

// ========================================================================
// Concrete scenarios
// ========================================================================

#[test]
fn scenario_main_returns_zero() {
    let (ctx, tu) = parse("int main(void) { return 0; }");
    assert_eq!(tu.decls.len(), 1);
    let main = ctx.decl(tu.decls[0]);
    assert_eq!(main.name, "main");
    match &main.kind {
        DeclKind::Function { ty, params, body, .. } => {
            assert_eq!(type_string(&ctx, *ty), "function () returning int");
            assert!(params.is_empty());
            assert!(body.is_some());
        }
        _ => panic!("expected a function"),
    }
    let ret = first_return_expr(&ctx, &tu);
    assert!(matches!(ctx.expr(ret).kind, ExprKind::IntLit(0)));
}

#[test]
fn scenario_multiple_declarators() {
    let (ctx, tu) = parse("int x = 1, y, z = 3;");
    assert_eq!(tu.decls.len(), 3);
    let inits: Vec<bool> = tu
        .decls
        .iter()
        .map(|d| match ctx.decl(*d).kind {
            DeclKind::Var { init, .. } => init.is_some(),
            _ => panic!("expected variables"),
        })
        .collect();
    assert_eq!(inits, vec![true, false, true]);
    assert_eq!(ctx.decl(tu.decls[1]).name, "y");
}

#[test]
fn scenario_typedef_unsigned() {
    let (ctx, tu) = parse("typedef unsigned int U; U f(U a) { return a + 1; }");
    let func = last_function(&ctx, &tu);
    match &ctx.decl(func).kind {
        DeclKind::Function { ty, params, .. } => {
            match &ctx.ty(*ty).kind {
                TypeKind::Function { ret, params: ptys } => {
                    assert_eq!(ctx.ty(*ret).kind, TypeKind::Int(Sign::Unsigned));
                    assert_eq!(ptys.len(), 1);
                    assert_eq!(ctx.ty(ptys[0]).kind, TypeKind::Int(Sign::Unsigned));
                }
                _ => panic!("expected a function type"),
            }
            assert_eq!(params.len(), 1);
            assert_eq!(ctx.decl(params[0]).name, "a");
        }
        _ => panic!("expected a function"),
    }
    let ret = first_return_expr(&ctx, &tu);
    let expr = ctx.expr(ret);
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
    assert_eq!(ctx.ty(expr.ty).kind, TypeKind::Int(Sign::Unsigned));
}

#[test]
fn scenario_array_subscript_of_global() {
    let (ctx, tu) = parse("int a[3]; int main() { return a[1]; }");
    let global = tu.decls[0];
    match ctx.decl(global).kind {
        DeclKind::Var { ty, .. } => match ctx.ty(ty).kind {
            TypeKind::Array { elem, len } => {
                assert_eq!(len, ArrayLen::Fixed(3));
                assert_eq!(ctx.ty(elem).kind, TypeKind::Int(Sign::None));
            }
            _ => panic!("expected an array type"),
        },
        _ => panic!("expected a variable"),
    }
    let ret = first_return_expr(&ctx, &tu);
    match ctx.expr(ret).kind {
        ExprKind::ArraySubscript { base, index } => {
            assert!(matches!(ctx.expr(base).kind, ExprKind::DeclRef(d) if d == global));
            assert!(matches!(ctx.expr(index).kind, ExprKind::IntLit(1)));
        }
        _ => panic!("expected an array subscript"),
    }
}

#[test]
fn scenario_member_access() {
    let (ctx, tu) = parse("struct P { int x; int y; }; int f(struct P p) { return p.x; }");
    match ctx.decl(tu.decls[0]).kind {
        DeclKind::Record { ty } => match &ctx.ty(ty).kind {
            TypeKind::Record { members, .. } => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[0].name, "x");
                assert_eq!(members[1].name, "y");
            }
            _ => panic!("expected a record type"),
        },
        _ => panic!("expected a record declaration"),
    }
    let ret = first_return_expr(&ctx, &tu);
    match &ctx.expr(ret).kind {
        ExprKind::Member { name, index, arrow, .. } => {
            assert_eq!(name, "x");
            assert_eq!(*index, 0);
            assert!(!arrow);
        }
        _ => panic!("expected a member access"),
    }
    assert_eq!(ctx.ty(ctx.expr(ret).ty).kind, TypeKind::Int(Sign::None));
}

#[test]
fn scenario_for_loop() {
    let (ctx, tu) =
        parse("int f() { int i; for (i = 0; i < 10; i = i + 1) { } return i; }");
    let func = last_function(&ctx, &tu);
    let stmts = body_stmts(&ctx, func);
    let for_stmt = stmts
        .iter()
        .find(|s| matches!(ctx.stmt(**s).kind, StmtKind::For { .. }))
        .copied()
        .expect("no for statement");
    match ctx.stmt(for_stmt).kind.clone() {
        StmtKind::For { init, cond, step, body } => {
            let init = init.expect("for should have an init statement");
            match ctx.stmt(init).kind {
                StmtKind::Expr(e) => {
                    assert!(matches!(
                        ctx.expr(e).kind,
                        ExprKind::Binary { op: BinaryOp::Assign, .. }
                    ));
                }
                _ => panic!("init should be an expression statement"),
            }
            let cond = cond.expect("for should have a condition");
            assert!(matches!(ctx.expr(cond).kind, ExprKind::Binary { op: BinaryOp::Lt, .. }));
            let step = step.expect("for should have a step");
            match ctx.expr(step).kind {
                ExprKind::Binary { op: BinaryOp::Assign, rhs, .. } => {
                    assert!(matches!(
                        ctx.expr(rhs).kind,
                        ExprKind::Binary { op: BinaryOp::Add, .. }
                    ));
                }
                _ => panic!("step should be an assignment"),
            }
            assert!(matches!(ctx.stmt(body).kind, StmtKind::Compound(ref s) if s.is_empty()));
        }
        _ => panic!("expected a for statement"),
    }
}

// ========================================================================
// Precedence boundaries
// ========================================================================

fn return_expr_of(src: &str) -> (AstContext, ExprId) {
    let (ctx, tu) = parse(src);
    let e = first_return_expr(&ctx, &tu);
    (ctx, e)
}

#[test]
fn assignment_is_right_associative() {
    let (ctx, e) =
        return_expr_of("int a; int b; int c; int f() { return a = b = c; }");
    match ctx.expr(e).kind {
        ExprKind::Binary { op: BinaryOp::Assign, lhs, rhs } => {
            assert!(matches!(ctx.expr(lhs).kind, ExprKind::DeclRef(_)));
            assert!(matches!(
                ctx.expr(rhs).kind,
                ExprKind::Binary { op: BinaryOp::Assign, .. }
            ));
        }
        _ => panic!("expected an assignment"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let (ctx, e) =
        return_expr_of("int a; int b; int c; int f() { return a + b * c; }");
    match ctx.expr(e).kind {
        ExprKind::Binary { op: BinaryOp::Add, lhs, rhs } => {
            assert!(matches!(ctx.expr(lhs).kind, ExprKind::DeclRef(_)));
            assert!(matches!(ctx.expr(rhs).kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
        }
        _ => panic!("expected an addition at the top"),
    }
}

#[test]
fn relational_binds_tighter_than_equality() {
    let (ctx, e) =
        return_expr_of("int a; int b; int c; int f() { return a < b == c; }");
    match ctx.expr(e).kind {
        ExprKind::Binary { op: BinaryOp::Eq, lhs, rhs } => {
            assert!(matches!(ctx.expr(lhs).kind, ExprKind::Binary { op: BinaryOp::Lt, .. }));
            assert!(matches!(ctx.expr(rhs).kind, ExprKind::DeclRef(_)));
        }
        _ => panic!("expected an equality at the top"),
    }
}

#[test]
fn conditional_expression() {
    let (ctx, e) = return_expr_of("int f(int a) { return a ? 1 : 2; }");
    assert!(matches!(ctx.expr(e).kind, ExprKind::Conditional { .. }));
}

#[test]
fn comma_operator_types_as_rhs() {
    let (ctx, tu) = parse("int a; double b; int f() { a, b; return 0; }");
    let func = last_function(&ctx, &tu);
    let stmts = body_stmts(&ctx, func);
    match ctx.stmt(stmts[0]).kind {
        StmtKind::Expr(e) => {
            assert!(matches!(ctx.expr(e).kind, ExprKind::Binary { op: BinaryOp::Comma, .. }));
            assert!(ctx.ty(ctx.expr(e).ty).is_floating());
        }
        _ => panic!("expected an expression statement"),
    }
}

// ========================================================================
// Declarators
// ========================================================================

fn first_var_type(src: &str) -> String {
    let (ctx, tu) = parse(src);
    match ctx.decl(tu.decls[0]).kind {
        DeclKind::Var { ty, .. } => type_string(&ctx, ty),
        _ => panic!("expected a variable"),
    }
}

#[test]
fn pointer_to_array_vs_array_of_pointers() {
    assert_eq!(first_var_type("int (*p)[10];"), "pointer to array 10 of int");
    assert_eq!(first_var_type("int *p[10];"), "array 10 of pointer to int");
}

#[test]
fn function_pointer_declarator() {
    assert_eq!(
        first_var_type("int (*cb)(int, char);"),
        "pointer to function (int, char) returning int"
    );
}

#[test]
fn unknown_array_length() {
    let (ctx, tu) = parse("int a[];");
    match ctx.decl(tu.decls[0]).kind {
        DeclKind::Var { ty, .. } => {
            assert!(matches!(ctx.ty(ty).kind, TypeKind::Array { len: ArrayLen::Unknown, .. }));
        }
        _ => panic!("expected a variable"),
    }
}

#[test]
fn parameter_arrays_decay_to_pointers() {
    let (ctx, tu) = parse("int f(int a[10], int g(int)) { return 0; }");
    let func = last_function(&ctx, &tu);
    match &ctx.decl(func).kind {
        DeclKind::Function { ty, .. } => match &ctx.ty(*ty).kind {
            TypeKind::Function { params, .. } => {
                assert_eq!(type_string(&ctx, params[0]), "pointer to int");
                assert_eq!(
                    type_string(&ctx, params[1]),
                    "pointer to function (int) returning int"
                );
            }
            _ => panic!("expected a function type"),
        },
        _ => panic!("expected a function"),
    }
}

// ========================================================================
// Typedefs and scope
// ========================================================================

#[test]
fn typedef_is_visible_in_nested_scopes() {
    let (ctx, tu) = parse("typedef int T; int f() { T x; { T y; y = 1; } return x; }");
    let _ = (ctx, tu);
}

#[test]
fn typedef_handle_identity() {
    let (ctx, tu) = parse("typedef int T; T x; T y;");
    let tys: Vec<_> = tu
        .decls
        .iter()
        .filter_map(|d| match ctx.decl(*d).kind {
            DeclKind::Var { ty, .. } => Some(ty),
            _ => None,
        })
        .collect();
    assert_eq!(tys.len(), 2);
    assert_eq!(tys[0], tys[1], "typedef lookups must return the same arena handle");
}

#[test]
fn block_scope_typedef_does_not_escape() {
    let err = parse_err("int f() { { typedef int T; T x; x = 0; } T y; return 0; }");
    assert!(matches!(err, CompileError::Semantic { .. }), "{err:?}");
}

#[test]
fn inner_scope_shadows_outer() {
    let (_ctx, _tu) = parse("int x; int f() { int x; x = 1; return x; }");
}

// ========================================================================
// Casts, sizeof, calls
// ========================================================================

#[test]
fn cast_expression() {
    let (ctx, e) = return_expr_of("long f(int a) { return (long)a; }");
    match ctx.expr(e).kind {
        ExprKind::Cast { operand } => {
            assert_eq!(ctx.ty(ctx.expr(e).ty).kind, TypeKind::Long(Sign::None));
            assert!(matches!(ctx.expr(operand).kind, ExprKind::DeclRef(_)));
        }
        _ => panic!("expected a cast"),
    }
}

#[test]
fn parenthesised_expression_is_not_a_cast() {
    let (ctx, e) = return_expr_of("int f(int a) { return (a); }");
    assert!(matches!(ctx.expr(e).kind, ExprKind::DeclRef(_)));
}

#[test]
fn cast_of_parenthesised_operand() {
    let (ctx, e) = return_expr_of("int f(int a) { return (int)(a + 1); }");
    assert!(matches!(ctx.expr(e).kind, ExprKind::Cast { .. }));
}

#[test]
fn sizeof_folds_to_constant() {
    let (ctx, e) = return_expr_of("int a[3]; long f() { return sizeof a; }");
    assert!(matches!(ctx.expr(e).kind, ExprKind::IntLit(12)));
    assert_eq!(ctx.ty(ctx.expr(e).ty).kind, TypeKind::Long(Sign::Unsigned));

    let (ctx, e) = return_expr_of("long f() { return sizeof(int); }");
    assert!(matches!(ctx.expr(e).kind, ExprKind::IntLit(4)));
}

#[test]
fn call_with_arguments() {
    let (ctx, e) = return_expr_of("int g(int, int); int f() { return g(1, 2); }");
    match &ctx.expr(e).kind {
        ExprKind::Call { callee, args } => {
            assert!(matches!(ctx.expr(*callee).kind, ExprKind::DeclRef(_)));
            assert_eq!(args.len(), 2);
            assert_eq!(ctx.ty(ctx.expr(e).ty).kind, TypeKind::Int(Sign::None));
        }
        _ => panic!("expected a call"),
    }
}

#[test]
fn arrow_member_access() {
    let (ctx, e) =
        return_expr_of("struct P { int x; }; int f(struct P *p) { return p->x; }");
    match &ctx.expr(e).kind {
        ExprKind::Member { arrow, index, .. } => {
            assert!(*arrow);
            assert_eq!(*index, 0);
        }
        _ => panic!("expected a member access"),
    }
}

#[test]
fn address_of_and_deref_types() {
    let (ctx, e) = return_expr_of("int f(int a) { return *&a; }");
    match ctx.expr(e).kind {
        ExprKind::Unary { op: UnaryOp::Deref, operand } => {
            assert_eq!(ctx.ty(ctx.expr(e).ty).kind, TypeKind::Int(Sign::None));
            match ctx.expr(operand).kind {
                ExprKind::Unary { op: UnaryOp::AddressOf, .. } => {
                    assert!(ctx.ty(ctx.expr(operand).ty).is_pointer());
                }
                _ => panic!("expected an address-of"),
            }
        }
        _ => panic!("expected a dereference"),
    }
}

// ========================================================================
// Statements
// ========================================================================

#[test]
fn switch_with_cases() {
    let (ctx, tu) = parse(
        "int f(int a) { switch (a) { case 1: return 1; default: return 0; } return 2; }",
    );
    let func = last_function(&ctx, &tu);
    let stmts = body_stmts(&ctx, func);
    match ctx.stmt(stmts[0]).kind.clone() {
        StmtKind::Switch { body, .. } => match ctx.stmt(body).kind.clone() {
            StmtKind::Compound(items) => {
                assert!(matches!(
                    ctx.stmt(items[0]).kind,
                    StmtKind::Case { is_default: false, value: Some(_), .. }
                ));
                assert!(matches!(
                    ctx.stmt(items[1]).kind,
                    StmtKind::Case { is_default: true, value: None, .. }
                ));
            }
            _ => panic!("switch body should be compound"),
        },
        _ => panic!("expected a switch"),
    }
}

#[test]
fn switch_requires_compound_body() {
    let err = parse_err("int f(int a) { switch (a) return 0; }");
    assert!(matches!(err, CompileError::UnexpectedToken { .. }), "{err:?}");
}

#[test]
fn do_while_and_labels() {
    let (ctx, tu) = parse("int f() { int i; i = 0; out: do { i++; } while (i < 3); return i; }");
    let func = last_function(&ctx, &tu);
    let stmts = body_stmts(&ctx, func);
    let labeled = stmts
        .iter()
        .find(|s| matches!(ctx.stmt(**s).kind, StmtKind::Labeled { .. }))
        .expect("no labeled statement");
    match ctx.stmt(*labeled).kind.clone() {
        StmtKind::Labeled { label, body } => {
            assert_eq!(ctx.decl(label).name, "out");
            assert!(matches!(ctx.stmt(body).kind, StmtKind::DoWhile { .. }));
        }
        _ => unreachable!(),
    }
}

#[test]
fn init_list_initialiser() {
    let (ctx, tu) = parse("int a[3] = {1, 2, 3};");
    match ctx.decl(tu.decls[0]).kind.clone() {
        DeclKind::Var { init: Some(init), .. } => match &ctx.expr(init).kind {
            ExprKind::InitList { elems } => assert_eq!(elems.len(), 3),
            _ => panic!("expected an initialiser list"),
        },
        _ => panic!("expected an initialised variable"),
    }
}

#[test]
fn locals_attach_to_enclosing_function() {
    let (ctx, tu) = parse("int f() { int a; { int b; b = 0; } a = 0; return a; }");
    let func = last_function(&ctx, &tu);
    match &ctx.decl(func).kind {
        DeclKind::Function { locals, .. } => {
            let names: Vec<_> = locals.iter().map(|d| ctx.decl(*d).name.clone()).collect();
            assert_eq!(names, vec!["a", "b"]);
        }
        _ => panic!("expected a function"),
    }
}

// ========================================================================
// Errors
// ========================================================================

#[test]
fn missing_semicolon_is_unexpected_token() {
    let err = parse_err("int x");
    assert!(matches!(err, CompileError::UnexpectedToken { .. }), "{err:?}");
}

#[test]
fn enum_is_unimplemented() {
    let err = parse_err("enum E { A, B };");
    assert!(matches!(err, CompileError::Unimplemented { .. }), "{err:?}");
}

#[test]
fn goto_is_unimplemented() {
    let err = parse_err("int f() { goto out; out: return 0; }");
    assert!(matches!(err, CompileError::Unimplemented { .. }), "{err:?}");
}

#[test]
fn variadic_functions_are_unimplemented() {
    let err = parse_err("int printf(char *fmt, ...);");
    assert!(matches!(err, CompileError::Unimplemented { .. }), "{err:?}");
}

#[test]
fn redefinition_in_same_scope() {
    let err = parse_err("int x; int x;");
    assert!(matches!(err, CompileError::Redefinition { .. }), "{err:?}");
}

#[test]
fn function_redefinition() {
    let err = parse_err("int f() { return 0; } int f() { return 1; }");
    assert!(matches!(err, CompileError::Redefinition { .. }), "{err:?}");
}

#[test]
fn impossible_specifiers_fail_synthesis() {
    let err = parse_err("short double x;");
    assert!(matches!(err, CompileError::TypeSynthesis { .. }), "{err:?}");
    let err = parse_err("unsigned void x;");
    assert!(matches!(err, CompileError::TypeSynthesis { .. }), "{err:?}");
}

#[test]
fn declaration_without_declarator() {
    let err = parse_err("int;");
    assert!(matches!(err, CompileError::BadDeclarator { .. }), "{err:?}");
}

#[test]
fn undeclared_identifier() {
    let err = parse_err("int f() { return y; }");
    assert!(matches!(err, CompileError::Semantic { .. }), "{err:?}");
}

#[test]
fn unknown_member() {
    let err = parse_err("struct P { int x; }; int f(struct P p) { return p.z; }");
    assert!(matches!(err, CompileError::Semantic { .. }), "{err:?}");
}

// ========================================================================
// Dump
// ========================================================================

#[test]
fn dump_is_deterministic() {
    let src = "typedef int T; struct P { int x; }; T g; \
               int f(struct P p, T t) { if (t) return p.x; return g ? g : -t; }";
    let (ctx, tu) = parse(src);
    let first = dump_translation_unit(&ctx, &tu);
    let second = dump_translation_unit(&ctx, &tu);
    assert_eq!(first, second);
    assert!(first.contains("Function f"));
    assert!(first.contains("Member .x 'int'"));
}
