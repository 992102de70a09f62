use crate::language::ast::*;
use thiserror::Error;

/// A node shape that violates a documented precondition. Fatal for the file.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MalformedTree {
    #[error("left-hand side of an assignment must be a variable")]
    InvalidAssignTarget { line: usize },
    #[error("loop with a condition needs a step expression")]
    MissingLoopStep { line: usize },
    #[error("a method needs a name")]
    UnnamedMethod { line: usize },
}

impl MalformedTree {
    pub fn line(&self) -> usize {
        match self {
            MalformedTree::InvalidAssignTarget { line }
            | MalformedTree::MissingLoopStep { line }
            | MalformedTree::UnnamedMethod { line } => *line,
        }
    }
}

/// Checks shape preconditions before resolution. Stops at the first
/// violation.
pub fn preanalyze(program: &Program) -> Result<(), MalformedTree> {
    check_block(&program.body)
}

fn check_block(block: &Block) -> Result<(), MalformedTree> {
    for decl in &block.decls {
        check_decl(decl)?;
    }
    for stmt in &block.stmts {
        check_stmt(stmt)?;
    }
    Ok(())
}

fn check_decl(decl: &Decl) -> Result<(), MalformedTree> {
    match &decl.kind {
        DeclKind::Variable(var) => match &var.init {
            Some(value) => check_value(value),
            None => Ok(()),
        },
        DeclKind::Function(function) => check_block(&function.body),
        DeclKind::Procedure(procedure) => check_block(&procedure.body),
        DeclKind::Class(class) => check_class(class),
        DeclKind::Functor(functor) => check_block(&functor.body),
    }
}

fn check_class(class: &ClassDecl) -> Result<(), MalformedTree> {
    for attr in class.attributes() {
        if let Some(default) = &attr.default {
            check_expr(default)?;
        }
    }
    for method in &class.methods {
        if method.name.is_empty() {
            return Err(MalformedTree::UnnamedMethod { line: method.line });
        }
        check_block(&method.body)?;
    }
    Ok(())
}

fn check_value(value: &AssignValue) -> Result<(), MalformedTree> {
    match value {
        AssignValue::Plain(expr) => check_expr(expr),
        AssignValue::Anonymous(literal) => check_anonymous(&literal.decl),
    }
}

fn check_anonymous(decl: &AnonymousDecl) -> Result<(), MalformedTree> {
    match decl {
        AnonymousDecl::Function(function) => check_block(&function.body),
        AnonymousDecl::Procedure(procedure) => check_block(&procedure.body),
        AnonymousDecl::Class(class) => check_class(class),
        AnonymousDecl::Functor(functor) => check_block(&functor.body),
    }
}

fn check_stmt(stmt: &Stmt) -> Result<(), MalformedTree> {
    match &stmt.kind {
        StmtKind::Expr(expr) => check_expr(expr),
        StmtKind::Assign(assign) => {
            if let AssignTarget::Invalid(_) = assign.target {
                return Err(MalformedTree::InvalidAssignTarget { line: assign.line });
            }
            check_value(&assign.value)
        }
        StmtKind::If(node) => check_if(node),
        StmtKind::Case(node) => check_case(node),
        StmtKind::For(node) => {
            match &node.form {
                LoopForm::Numeric(numeric) => {
                    check_expr(&numeric.init)?;
                    match &numeric.bound {
                        LoopBound::UpTo(end) => check_expr(end)?,
                        LoopBound::While(condition) => {
                            if numeric.step.is_none() {
                                return Err(MalformedTree::MissingLoopStep { line: node.line });
                            }
                            check_expr(condition)?;
                        }
                    }
                    if let Some(step) = &numeric.step {
                        check_expr(step)?;
                    }
                }
                LoopForm::Generator(list) => check_expr(list)?,
            }
            check_block(&node.body)
        }
        StmtKind::Block(block) => check_block(block),
        StmtKind::Skip => Ok(()),
    }
}

fn check_if(node: &IfNode) -> Result<(), MalformedTree> {
    for branch in &node.branches {
        check_expr(&branch.condition)?;
        check_block(&branch.body)?;
    }
    node.default.as_ref().map_or(Ok(()), check_block)
}

fn check_case(node: &CaseNode) -> Result<(), MalformedTree> {
    check_expr(&node.scrutinee)?;
    for clause in &node.clauses {
        if let Some(guard) = &clause.guard {
            check_expr(guard)?;
        }
        check_block(&clause.body)?;
    }
    node.default.as_ref().map_or(Ok(()), check_block)
}

fn check_expr(expr: &Expr) -> Result<(), MalformedTree> {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Variable(_) => Ok(()),
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Concat { lhs, rhs } => {
            check_expr(lhs)?;
            check_expr(rhs)
        }
        ExprKind::Cons { head, tail } => {
            check_expr(head)?;
            check_expr(tail)
        }
        ExprKind::Unary { operand, .. } => check_expr(operand),
        ExprKind::Call(call) => call.args.iter().try_for_each(check_expr),
        ExprKind::MethodCall(call) => {
            if let Receiver::Object(object) = &call.receiver {
                check_expr(object)?;
            }
            call.args.iter().try_for_each(check_expr)
        }
        ExprKind::New(new) => new.args.iter().try_for_each(check_expr),
        ExprKind::List(items) => items.iter().try_for_each(check_expr),
        ExprKind::Record { fields, .. } => fields.iter().try_for_each(|(_, value)| check_expr(value)),
        ExprKind::Field { target, .. } => check_expr(target),
        ExprKind::Block(block) => check_block(block),
        ExprKind::If(node) => check_if(node),
        ExprKind::Case(node) => check_case(node),
        ExprKind::Anonymous(literal) => check_anonymous(&literal.decl),
    }
}
