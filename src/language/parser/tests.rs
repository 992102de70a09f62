use super::*;
use crate::language::lexer::tokenize;

fn parse_source(source: &str) -> Program {
    let tokens = tokenize(source).expect("tokenize");
    parse(&tokens).expect("parse")
}

fn parse_errors(source: &str) -> Vec<SyntaxError> {
    let tokens = tokenize(source).expect("tokenize");
    parse(&tokens).expect_err("should fail").errors
}

#[test]
fn declarations_precede_statements() {
    let program = parse_source("val x = 1 var y in {Show x} y = 2");
    assert_eq!(program.kind, ProgramKind::Statements);
    assert_eq!(program.body.decls.len(), 2);
    assert_eq!(program.body.stmts.len(), 2);
    let DeclKind::Variable(var) = &program.body.decls[1].kind else {
        panic!("expected variable");
    };
    assert!(var.pattern.mutability.is_mutable());
    assert!(var.init.is_none());
}

#[test]
fn declare_programs_are_flagged() {
    let program = parse_source("declare fun {Id X} X end in {Browse {Id 1}}");
    assert_eq!(program.kind, ProgramKind::Declare);
    assert_eq!(program.body.decls.len(), 1);
}

#[test]
fn anonymous_literal_takes_assignment_name() {
    let program = parse_source("var f in f = fun {$ N} N end");
    let StmtKind::Assign(assign) = &program.body.stmts[0].kind else {
        panic!("expected assignment");
    };
    let AssignValue::Anonymous(literal) = &assign.value else {
        panic!("expected anonymous literal");
    };
    assert_eq!(literal.decl.name(), Some("f"));
}

#[test]
fn anonymous_class_in_declaration_is_named() {
    let program = parse_source("val Point = class $ attr x:0 end");
    let DeclKind::Variable(var) = &program.body.decls[0].kind else {
        panic!("expected variable");
    };
    let Some(AssignValue::Anonymous(literal)) = &var.init else {
        panic!("expected anonymous initializer");
    };
    assert!(matches!(literal.decl.as_ref(), AnonymousDecl::Class(class) if class.anonymous));
    assert_eq!(literal.decl.name(), Some("Point"));
}

#[test]
fn precedence_binds_multiplication_tighter() {
    let program = parse_source("{Show 1 + 2 * 3}");
    let StmtKind::Expr(expr) = &program.body.stmts[0].kind else {
        panic!("expected expression");
    };
    let ExprKind::Call(call) = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(call.args.len(), 1);
    let ExprKind::Binary { op, rhs, .. } = &call.args[0].kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn list_tail_builds_cons_cells() {
    let program = parse_source("val l = [1 2 | rest]");
    let DeclKind::Variable(var) = &program.body.decls[0].kind else {
        panic!("expected variable");
    };
    let Some(AssignValue::Plain(expr)) = &var.init else {
        panic!("expected plain initializer");
    };
    let ExprKind::Cons { tail, .. } = &expr.kind else {
        panic!("expected cons");
    };
    assert!(matches!(tail.kind, ExprKind::Cons { .. }));
}

#[test]
fn case_clauses_and_guards() {
    let program = parse_source(
        "case l of nil then 0 of [x] when x > 0 then 1 of h|t then 2 else 3 end",
    );
    let StmtKind::Case(node) = &program.body.stmts[0].kind else {
        panic!("expected case");
    };
    assert_eq!(node.clauses.len(), 3);
    assert!(node.clauses[1].guard.is_some());
    assert!(matches!(node.clauses[2].pattern.kind, PatternKind::Cons(..)));
    assert!(node.default.is_some());
}

#[test]
fn loop_forms() {
    let program = parse_source(
        "for i in 1..10;2 do skip end for j in 0;j < 3;j + 1 do skip end for x in xs do skip end",
    );
    let forms: Vec<_> = program
        .body
        .stmts
        .iter()
        .map(|stmt| match &stmt.kind {
            StmtKind::For(node) => match &node.form {
                LoopForm::Numeric(NumericLoop {
                    bound: LoopBound::UpTo(_),
                    step: Some(_),
                    ..
                }) => "range",
                LoopForm::Numeric(NumericLoop {
                    bound: LoopBound::While(_),
                    ..
                }) => "while",
                LoopForm::Generator(_) => "generator",
                _ => "other",
            },
            _ => "not a loop",
        })
        .collect();
    assert_eq!(forms, ["range", "while", "generator"]);
}

#[test]
fn class_items_and_method_shapes() {
    let program = parse_source(
        "class Counter extends Base attr count:0 name meth init(start) count = start end meth get() => count end end",
    );
    let DeclKind::Class(class) = &program.body.decls[0].kind else {
        panic!("expected class");
    };
    assert_eq!(class.superclasses().collect::<Vec<_>>(), ["Base"]);
    let attrs: Vec<_> = class.attributes().map(|attr| attr.name.as_str()).collect();
    assert_eq!(attrs, ["count", "name"]);
    assert_eq!(class.methods[0].shape, MethodShape::Procedure);
    assert_eq!(class.methods[1].shape, MethodShape::Function);
}

#[test]
fn functor_exports_use_labels() {
    let program = parse_source(
        "functor M import System define export add fun {Add X Y} X + Y end export val version = 1 end",
    );
    let DeclKind::Functor(functor) = &program.body.decls[0].kind else {
        panic!("expected functor");
    };
    assert_eq!(functor.imports[0].name, "System");
    assert_eq!(functor.exports(), [("add", "Add"), ("version", "version")]);
}

#[test]
fn method_calls_on_this_super_and_objects() {
    let program = parse_source("this.inc(1) super(Base).init() c.get()");
    let kinds: Vec<_> = program
        .body
        .stmts
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::Expr(Expr {
                kind: ExprKind::MethodCall(call),
                ..
            }) => Some(&call.receiver),
            _ => None,
        })
        .collect();
    assert!(matches!(kinds[0], Receiver::This));
    assert!(matches!(kinds[1], Receiver::Super(base) if base == "Base"));
    assert!(matches!(kinds[2], Receiver::Object(_)));
}

#[test]
fn records_need_an_adjacent_parenthesis() {
    let program = parse_source("{Show point(x: 1 y: 2)} {Show f (1)}");
    let StmtKind::Expr(first) = &program.body.stmts[0].kind else {
        panic!("expected expression");
    };
    let ExprKind::Call(call) = &first.kind else {
        panic!("expected call");
    };
    assert!(matches!(&call.args[0].kind, ExprKind::Record { label, fields } if label == "point" && fields.len() == 2));

    let StmtKind::Expr(second) = &program.body.stmts[1].kind else {
        panic!("expected expression");
    };
    let ExprKind::Call(call) = &second.kind else {
        panic!("expected call");
    };
    assert_eq!(call.args.len(), 2);
}

#[test]
fn lines_are_recorded() {
    let program = parse_source("val a = 1\n\nfun {F X}\n  X\nend\n{Show {F a}}");
    assert_eq!(program.body.decls[0].line, 1);
    assert_eq!(program.body.decls[1].line, 3);
    assert_eq!(program.body.stmts[0].line, 6);
}

#[test]
fn missing_end_is_reported_with_help() {
    let errors = parse_errors("fun {F X} X");
    assert_eq!(errors.len(), 1);
    let msg = errors[0].message.clone();
    insta::assert_snapshot!(msg, @"expected `end` to close `fun`: found end of input");
    assert_eq!(errors[0].help.as_deref(), Some("close the body of `F` with `end`"));
}

#[test]
fn late_declarations_are_rejected() {
    let errors = parse_errors("{Show 1} val x = 2");
    let msg = errors[0].message.clone();
    insta::assert_snapshot!(msg, @"declarations must come before statements");
}

#[test]
fn recovery_reports_independent_errors() {
    let errors = parse_errors("val = 1\nval y = )\n{Show y}");
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].line, 1);
    assert_eq!(errors[1].line, 2);
}

#[test]
fn stray_end_at_top_level() {
    let errors = parse_errors("skip end");
    let msg = errors[0].message.clone();
    insta::assert_snapshot!(msg, @"unexpected `end` at top level");
}

#[test]
fn invalid_assignment_target_still_parses() {
    let program = parse_source("1 = 2");
    let StmtKind::Assign(assign) = &program.body.stmts[0].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(assign.target, AssignTarget::Invalid(_)));
}
