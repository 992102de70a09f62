use super::*;

impl Resolver<'_> {
    /// Every statement but the last runs in statement position; the last
    /// one inherits `position` and provides the block's value.
    pub(super) fn resolve_statements(
        &mut self,
        stmts: &mut [Stmt],
        position: Position,
        line: usize,
    ) -> Type {
        let last = stmts.len().checked_sub(1);
        let mut result = None;
        for (index, stmt) in stmts.iter_mut().enumerate() {
            let here = if Some(index) == last {
                position
            } else {
                Position::Statement
            };
            if self.trace {
                let kind = match &stmt.kind {
                    StmtKind::Expr(_) => "expr",
                    StmtKind::Assign(_) => "assign",
                    StmtKind::If(_) => "if",
                    StmtKind::Case(_) => "case",
                    StmtKind::For(_) => "for",
                    StmtKind::Block(_) => "block",
                    StmtKind::Skip => "skip",
                };
                eprintln!("[lumo-debug] stmt {kind} line {}", stmt.line);
            }
            result = self.resolve_stmt(stmt, here);
        }

        match position {
            Position::Statement => Type::Unit,
            Position::Value => result.unwrap_or_else(|| {
                let line = stmts.last().map_or(line, |stmt| stmt.line);
                self.error(line, "missing result: block does not end with a value");
                Type::Any
            }),
        }
    }

    /// Returns the statement's value type when it sits in value position
    /// and yields one.
    fn resolve_stmt(&mut self, stmt: &mut Stmt, position: Position) -> Option<Type> {
        let value = position == Position::Value;
        let result = match &mut stmt.kind {
            StmtKind::Expr(expr) => {
                let ty = self.resolve_expr(expr, position);
                if value {
                    Some(ty)
                } else {
                    stmt.discard = produces_value(expr);
                    None
                }
            }
            StmtKind::Assign(assign) => {
                if !stmt.resolved {
                    self.resolve_assign(assign);
                }
                None
            }
            StmtKind::If(node) => {
                let ty = self.resolve_if(node, position);
                value.then_some(ty)
            }
            StmtKind::Case(node) => {
                let ty = self.resolve_case(node, position);
                value.then_some(ty)
            }
            StmtKind::For(node) => {
                if !stmt.resolved {
                    self.resolve_for(node);
                }
                None
            }
            StmtKind::Block(block) => {
                let ty = self.resolve_block(block, position);
                value.then_some(ty)
            }
            StmtKind::Skip => None,
        };
        stmt.resolved = true;
        result
    }

    fn resolve_assign(&mut self, assign: &mut Assign) {
        if assign.resolved {
            return;
        }
        assign.resolved = true;
        let AssignTarget::Variable(target) = &mut assign.target else {
            self.error(assign.line, "left-hand side of an assignment must be a variable");
            return;
        };

        let found = self.ctx.lookup_variable(self.scope, &target.name);
        // A constant that already holds a value is reported by `try_assign`.
        let registration = found
            .filter(|var| {
                let binding = self.ctx.variable(*var);
                binding.mutability.is_mutable() || !binding.bound
            })
            .map(|var| Registration {
                scope: var.scope,
                cell: self.ctx.variable(var).mutability.is_mutable(),
            });
        let ty = self.resolve_assign_value(&mut assign.value, registration);

        let Some(var) = found else {
            self.error(target.line, format!("undefined variable {}", target.name));
            target.ty = Some(Type::Any);
            return;
        };
        let binding = self.ctx.variable(var).clone();
        target.mutability = binding.mutability;
        target.binding = binding.kind;
        target.ty = Some(binding.use_type());

        match assign.op {
            AssignOp::Set => {
                if self.ctx.try_assign(var, ty, assign.line, self.diags) {
                    target.ty = Some(ty);
                }
            }
            AssignOp::Add | AssignOp::Sub => {
                let symbol = if assign.op == AssignOp::Add { "+=" } else { "-=" };
                if !binding.mutability.is_mutable() {
                    self.error(
                        assign.line,
                        format!("{symbol} needs a mutable variable, {} is constant", binding.name),
                    );
                    return;
                }
                if !binding.bound {
                    self.error(
                        assign.line,
                        format!("{symbol} on {} before it holds a value", binding.name),
                    );
                    return;
                }
                let current = binding.use_type();
                let allowed: &[Type] = if assign.op == AssignOp::Add {
                    &[Type::Int, Type::Float, Type::String, Type::List]
                } else {
                    &Type::NUMERIC
                };
                if must_match_any(current, allowed, assign.line, self.diags) {
                    must_match(ty, current, assign.line, self.diags);
                }
            }
        }
    }

    pub(super) fn resolve_if(&mut self, node: &mut IfNode, position: Position) -> Type {
        if let Some(ty) = node.ty {
            return ty;
        }
        if node.branches.is_empty() {
            self.error(node.line, "conditional has no branches");
        }
        let mut types = Vec::with_capacity(node.branches.len() + 1);
        for branch in &mut node.branches {
            let condition = self.resolve_expr(&mut branch.condition, Position::Value);
            must_match(condition, Type::Boolean, branch.condition.line, self.diags);
            let ty = self.resolve_block(&mut branch.body, position);
            types.push((ty, branch.body.line));
        }
        self.resolve_default(&mut node.default, position, node.line, &mut types);

        let ty = match position {
            Position::Value => self.merge_branch_types(&types),
            Position::Statement => Type::Unit,
        };
        node.ty = Some(ty);
        ty
    }

    pub(super) fn resolve_case(&mut self, node: &mut CaseNode, position: Position) -> Type {
        if let Some(ty) = node.ty {
            return ty;
        }
        let scrutinee = self.resolve_expr(&mut node.scrutinee, Position::Value);
        if node.clauses.is_empty() {
            self.error(node.line, "case has no clauses");
        }
        let mut types = Vec::with_capacity(node.clauses.len() + 1);
        for clause in &mut node.clauses {
            let scope = self.scope_or_push(&mut clause.scope, ScopeKind::Block);
            let ty = self.with_scope(scope, |this| {
                this.bind_pattern(&mut clause.pattern, scrutinee, true);
                if let Some(guard) = clause.guard.as_mut() {
                    let guard_ty = this.resolve_expr(guard, Position::Value);
                    must_match(guard_ty, Type::Boolean, guard.line, this.diags);
                }
                this.resolve_block(&mut clause.body, position)
            });
            types.push((ty, clause.line));
        }
        self.resolve_default(&mut node.default, position, node.line, &mut types);

        let ty = match position {
            Position::Value => self.merge_branch_types(&types),
            Position::Statement => Type::Unit,
        };
        node.ty = Some(ty);
        ty
    }

    fn resolve_default(
        &mut self,
        default: &mut Option<Block>,
        position: Position,
        line: usize,
        types: &mut Vec<(Type, usize)>,
    ) {
        match default {
            Some(block) => {
                let ty = self.resolve_block(block, position);
                types.push((ty, block.line));
            }
            None if position == Position::Value => {
                self.error(line, "conditional used as a value needs an else branch");
            }
            None => {}
        }
    }

    /// Registers pattern variables in the current scope. Only the top-level
    /// pattern is compared with the scrutinee.
    fn bind_pattern(&mut self, pattern: &mut Pattern, expected: Type, top: bool) {
        let line = pattern.line;
        let ty = match &mut pattern.kind {
            PatternKind::Wildcard => expected,
            PatternKind::Bind(variable) => {
                let binding =
                    Binding::bound(variable.name.clone(), BindingKind::Local, expected, variable.line);
                self.ctx.declare_variable(self.scope, binding, self.diags);
                variable.binding = BindingKind::Local;
                variable.ty = Some(expected);
                expected
            }
            // `nil` is the empty list.
            PatternKind::Literal(Literal::Nil) if expected == Type::List => Type::List,
            PatternKind::Literal(literal) => literal.ty(),
            PatternKind::List(items) => {
                for item in items.iter_mut() {
                    self.bind_pattern(item, Type::Any, false);
                }
                Type::List
            }
            PatternKind::Cons(head, tail) => {
                self.bind_pattern(head, Type::Any, false);
                self.bind_pattern(tail, Type::List, false);
                Type::List
            }
            PatternKind::Record { fields, .. } => {
                for (_, field) in fields.iter_mut() {
                    self.bind_pattern(field, Type::Any, false);
                }
                Type::Record
            }
        };
        if top {
            must_match(ty, expected, line, self.diags);
        }
        pattern.ty = Some(ty);
    }

    fn resolve_for(&mut self, node: &mut ForLoop) {
        let scope = self.scope_or_push(&mut node.scope, ScopeKind::Loop);
        let iterator = self.ctx.try_declare_variable(
            scope,
            Binding::bound(
                node.iterator.name.clone(),
                BindingKind::Local,
                Type::Unknown,
                node.iterator.line,
            ),
        );
        node.iterator.binding = BindingKind::Local;

        let iterator_ty = match &mut node.form {
            LoopForm::Numeric(numeric) => {
                let init = self.resolve_expr(&mut numeric.init, Position::Value);
                must_match_any(init, &Type::NUMERIC, numeric.init.line, self.diags);
                match &mut numeric.bound {
                    LoopBound::UpTo(end) => {
                        let end_ty = self.resolve_expr(end, Position::Value);
                        must_match(end_ty, init, end.line, self.diags);
                        if let Some(step) = numeric.step.as_mut() {
                            let step_ty = self.resolve_expr(step, Position::Value);
                            must_match(step_ty, init, step.line, self.diags);
                        }
                    }
                    LoopBound::While(condition) => {
                        // The condition and step see the iterator.
                        if let Ok(var) = iterator {
                            self.ctx.variable_mut(var).ty = init;
                        }
                        self.with_scope(scope, |this| {
                            let cond_ty = this.resolve_expr(condition, Position::Value);
                            must_match(cond_ty, Type::Boolean, condition.line, this.diags);
                            if let Some(step) = numeric.step.as_mut() {
                                let step_ty = this.resolve_expr(step, Position::Value);
                                must_match(step_ty, init, step.line, this.diags);
                            }
                        });
                    }
                }
                init
            }
            LoopForm::Generator(list) => {
                let list_ty = self.resolve_expr(list, Position::Value);
                must_match(list_ty, Type::List, list.line, self.diags);
                Type::Any
            }
        };

        match iterator {
            Ok(var) => self.ctx.variable_mut(var).ty = iterator_ty,
            Err(err) => self.error(node.iterator.line, err.to_string()),
        }
        node.iterator.ty = Some(iterator_ty);
        self.with_scope(scope, |this| {
            this.resolve_block(&mut node.body, Position::Statement);
        });
    }
}

/// Whether an expression in statement position leaves a value behind that
/// the host requires to be bound.
pub(super) fn produces_value(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call(call) => call
            .resolved
            .as_ref()
            .map_or(false, |resolved| resolved.returns_value),
        ExprKind::MethodCall(call) => call.returns_value.unwrap_or(false),
        ExprKind::New(_) => true,
        ExprKind::Block(_) | ExprKind::If(_) | ExprKind::Case(_) => false,
        _ => true,
    }
}
