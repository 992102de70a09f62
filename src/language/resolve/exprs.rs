use super::*;

const COMPARABLE: [Type; 4] = [Type::Int, Type::Float, Type::Char, Type::String];

impl Resolver<'_> {
    pub(crate) fn resolve_expr(&mut self, expr: &mut Expr, position: Position) -> Type {
        if let Some(ty) = expr.ty {
            return ty;
        }
        let line = expr.line;
        let mut concat = false;
        let ty = match &mut expr.kind {
            ExprKind::Literal(literal) => literal.ty(),
            ExprKind::Variable(variable) => self.resolve_variable_use(variable),
            ExprKind::Binary { op, lhs, rhs } => {
                let (ty, is_concat) = self.resolve_binary(*op, lhs, rhs, line);
                concat = is_concat;
                ty
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.resolve_expr(operand, Position::Value);
                match op {
                    UnaryOp::Neg => {
                        must_match_any(ty, &Type::NUMERIC, line, self.diags);
                        ty
                    }
                    UnaryOp::Not => {
                        must_match(ty, Type::Boolean, line, self.diags);
                        Type::Boolean
                    }
                }
            }
            ExprKind::Concat { lhs, rhs } => {
                let left = self.resolve_expr(lhs, Position::Value);
                let right = self.resolve_expr(rhs, Position::Value);
                must_match(right, left, line, self.diags);
                if left == Type::Any {
                    right
                } else {
                    left
                }
            }
            ExprKind::Call(call) => self.resolve_call(call, line, position),
            ExprKind::MethodCall(call) => self.resolve_method_call(call, line, position),
            ExprKind::New(new) => self.resolve_new(new, line),
            ExprKind::List(items) => {
                for item in items.iter_mut() {
                    self.resolve_expr(item, Position::Value);
                }
                Type::List
            }
            ExprKind::Cons { head, tail } => {
                self.resolve_expr(head, Position::Value);
                let tail_ty = self.resolve_expr(tail, Position::Value);
                must_match(tail_ty, Type::List, tail.line, self.diags);
                Type::List
            }
            ExprKind::Record { fields, .. } => {
                for (_, value) in fields.iter_mut() {
                    self.resolve_expr(value, Position::Value);
                }
                Type::Record
            }
            ExprKind::Field { target, .. } => {
                let target_ty = self.resolve_expr(target, Position::Value);
                must_match(target_ty, Type::Record, line, self.diags);
                Type::Any
            }
            ExprKind::Block(block) => self.resolve_block(block, position),
            ExprKind::If(node) => self.resolve_if(node, position),
            ExprKind::Case(node) => self.resolve_case(node, position),
            ExprKind::Anonymous(literal) => {
                if !literal.resolved {
                    literal.resolved = true;
                    self.resolve_anonymous(&mut literal.decl, None);
                }
                Type::Any
            }
        };
        if concat {
            rewrite_as_concat(expr);
        }
        expr.set_type(ty)
    }

    /// Returns the result type and whether the node must become a `Concat`.
    fn resolve_binary(
        &mut self,
        op: BinaryOp,
        lhs: &mut Expr,
        rhs: &mut Expr,
        line: usize,
    ) -> (Type, bool) {
        let left = self.resolve_expr(lhs, Position::Value);
        let right = self.resolve_expr(rhs, Position::Value);
        let either = |ty: Type| left == ty || right == ty;
        let pick = if left == Type::Any { right } else { left };

        match op {
            BinaryOp::Add if either(Type::String) || either(Type::List) => {
                must_match(right, left, line, self.diags);
                (pick, true)
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                if must_match_any(left, &Type::NUMERIC, line, self.diags) {
                    must_match(right, left, line, self.diags);
                }
                (pick, false)
            }
            BinaryOp::Mod => {
                must_match(left, Type::Int, line, self.diags);
                must_match(right, Type::Int, line, self.diags);
                (Type::Int, false)
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                if must_match_any(left, &COMPARABLE, line, self.diags) {
                    must_match(right, left, line, self.diags);
                }
                (Type::Boolean, false)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                must_match(right, left, line, self.diags);
                (Type::Boolean, false)
            }
            BinaryOp::AndThen | BinaryOp::OrElse => {
                must_match(left, Type::Boolean, line, self.diags);
                must_match(right, Type::Boolean, line, self.diags);
                (Type::Boolean, false)
            }
        }
    }

    /// A use occurrence copies mutability, binding kind and type from the
    /// declaration it names. Callables may be used as plain values.
    pub(super) fn resolve_variable_use(&mut self, variable: &mut Variable) -> Type {
        if let Some(var) = self.ctx.lookup_variable(self.scope, &variable.name) {
            let binding = self.ctx.variable(var);
            variable.mutability = binding.mutability;
            variable.binding = binding.kind;
            let ty = binding.use_type();
            variable.ty = Some(ty);
            return ty;
        }
        let callable = [
            CallableKind::Function,
            CallableKind::Procedure,
            CallableKind::Class,
            CallableKind::Functor,
        ]
        .into_iter()
        .find_map(|kind| self.ctx.lookup_named(self.scope, kind, &variable.name));
        match callable {
            Some(callable) => {
                variable.mutability = if callable.cell {
                    Mutability::Mutable
                } else {
                    Mutability::Immutable
                };
                variable.binding = BindingKind::Local;
            }
            None => self.error(variable.line, format!("undefined variable {}", variable.name)),
        }
        variable.ty = Some(Type::Any);
        Type::Any
    }

    fn resolve_call(&mut self, call: &mut Call, line: usize, position: Position) -> Type {
        for arg in &mut call.args {
            self.resolve_expr(arg, Position::Value);
        }
        let arity = call.args.len();
        let value = position == Position::Value;
        let unit_or_any = if value { Type::Any } else { Type::Unit };

        let name = match &mut call.callee {
            Callee::Dotted { module, .. } => {
                self.resolve_variable_use(module);
                call.resolved = Some(ResolvedCall {
                    host_name: host_identifier(&module.name),
                    cell: module.mutability.is_mutable(),
                    returns_value: value,
                });
                return unit_or_any;
            }
            Callee::Named(name) => name.clone(),
        };

        let kinds: &[CallableKind] = if value {
            &[CallableKind::Function]
        } else {
            &[CallableKind::Procedure, CallableKind::Function]
        };
        for kind in kinds {
            if let Some((_, callable)) = self.ctx.lookup_callable(self.scope, *kind, &name, arity) {
                let returns_value = *kind == CallableKind::Function;
                call.resolved = Some(ResolvedCall {
                    host_name: callable.host_name.clone(),
                    cell: callable.cell,
                    returns_value,
                });
                return if returns_value {
                    callable.return_type.unwrap_or(Type::Any)
                } else {
                    Type::Unit
                };
            }
        }

        if value
            && self
                .ctx
                .lookup_callable(self.scope, CallableKind::Procedure, &name, arity)
                .is_some()
        {
            self.error(
                line,
                format!("{name}/{arity} is a procedure and does not produce a value"),
            );
            return Type::Any;
        }

        // A variable holding a procedure value: the host checks the call.
        if let Some(var) = self.ctx.lookup_variable(self.scope, &name) {
            let binding = self.ctx.variable(var);
            let host_name = match binding.kind {
                BindingKind::Attribute => binding.name.clone(),
                BindingKind::Local | BindingKind::Import => host_identifier(&binding.name),
            };
            call.resolved = Some(ResolvedCall {
                host_name,
                cell: binding.mutability.is_mutable(),
                returns_value: value,
            });
            return unit_or_any;
        }

        let noun = if value { "function" } else { "procedure" };
        self.error(line, format!("could not find {noun} for {name}/{arity}"));
        Type::Any
    }

    fn resolve_method_call(
        &mut self,
        call: &mut MethodCall,
        line: usize,
        position: Position,
    ) -> Type {
        for arg in &mut call.args {
            self.resolve_expr(arg, Position::Value);
        }
        let arity = call.args.len();
        let value = position == Position::Value;

        let target_class = match &mut call.receiver {
            Receiver::Object(object) => {
                self.resolve_expr(object, Position::Value);
                call.returns_value = Some(value);
                return if value { Type::Any } else { Type::Unit };
            }
            Receiver::This => {
                let Some(class_scope) = self.ctx.nearest_scope_of_kind(self.scope, ScopeRole::Class)
                else {
                    self.error(line, "this used outside of a class");
                    return Type::Any;
                };
                class_scope
            }
            Receiver::Super(base) => {
                let Some(class_scope) = self.ctx.nearest_scope_of_kind(self.scope, ScopeRole::Class)
                else {
                    self.error(line, "super used outside of a class");
                    return Type::Any;
                };
                let current = self
                    .ctx
                    .class_scope(class_scope)
                    .map(|class| (class.name.clone(), class.superclasses.contains(base)));
                if let Some((name, false)) = current {
                    self.error(line, format!("{base} is not a superclass of class {name}"));
                    return Type::Any;
                }
                let Some(base_scope) = self.ctx.find_class_scope(self.scope, base) else {
                    self.error(line, format!("could not find class {base}"));
                    return Type::Any;
                };
                base_scope
            }
        };

        let class_name = self
            .ctx
            .class_scope(target_class)
            .map(|class| class.name.clone())
            .unwrap_or_default();
        let Some(method) = self.ctx.lookup_method(target_class, &call.method, arity) else {
            self.error(
                line,
                format!(
                    "could not find method {}/{arity} in class {class_name}",
                    call.method
                ),
            );
            return Type::Any;
        };
        let (returns_value, return_type) = (method.returns_value, method.return_type);
        call.returns_value = Some(returns_value);
        if value && !returns_value {
            self.error(
                line,
                format!(
                    "method {}/{arity} does not produce a value",
                    call.method
                ),
            );
            return Type::Any;
        }
        if returns_value {
            return_type
        } else {
            Type::Unit
        }
    }

    fn resolve_new(&mut self, new: &mut NewObject, line: usize) -> Type {
        for arg in &mut new.args {
            self.resolve_expr(arg, Position::Value);
        }
        let class = &mut new.class;
        if let Some(callable) = self.ctx.lookup_named(self.scope, CallableKind::Class, &class.name) {
            class.mutability = if callable.cell {
                Mutability::Mutable
            } else {
                Mutability::Immutable
            };
            class.ty = Some(Type::Any);
        } else if self.ctx.lookup_variable(self.scope, &class.name).is_some() {
            self.resolve_variable_use(class);
        } else {
            self.error(line, format!("could not find class {}", class.name));
            class.ty = Some(Type::Any);
        }
        Type::Any
    }
}

fn rewrite_as_concat(expr: &mut Expr) {
    let placeholder = ExprKind::Literal(Literal::Unit);
    if let ExprKind::Binary { lhs, rhs, .. } = mem::replace(&mut expr.kind, placeholder) {
        expr.kind = ExprKind::Concat { lhs, rhs };
    }
}
