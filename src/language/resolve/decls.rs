use super::*;

impl Resolver<'_> {
    pub(super) fn resolve_decl(&mut self, decl: &mut Decl) {
        if decl.resolved {
            return;
        }
        decl.resolved = true;

        if decl.alias.is_some()
            && !matches!(self.ctx.scope(self.scope).kind, ScopeKind::Functor { .. })
        {
            self.error(
                decl.line,
                "export is only allowed directly inside a functor body",
            );
        }

        let here = Registration {
            scope: self.scope,
            cell: false,
        };
        match &mut decl.kind {
            DeclKind::Variable(var) => self.resolve_var_decl(var),
            DeclKind::Function(function) => self.resolve_function(function, Some(here)),
            DeclKind::Procedure(procedure) => self.resolve_procedure(procedure, Some(here)),
            DeclKind::Class(class) => self.resolve_class(class, Some(here)),
            DeclKind::Functor(functor) => self.resolve_functor(functor, Some(here)),
        }
    }

    fn resolve_var_decl(&mut self, decl: &mut VarDecl) {
        let pattern = &mut decl.pattern;
        let binding = Binding::local(pattern.name.clone(), pattern.mutability, pattern.line);
        let declared = match self.ctx.try_declare_variable(self.scope, binding) {
            Ok(var) => Some(var),
            Err(err) => {
                self.error(pattern.line, err.to_string());
                None
            }
        };
        pattern.binding = BindingKind::Local;

        let Some(init) = decl.init.as_mut() else {
            pattern.ty = Some(Type::Unknown);
            return;
        };
        let registration = declared.map(|var| Registration {
            scope: var.scope,
            cell: pattern.mutability.is_mutable(),
        });
        let ty = self.resolve_assign_value(init, registration);
        pattern.ty = Some(ty);
        if let Some(var) = declared {
            self.ctx.try_assign(var, ty, pattern.line, self.diags);
        }
    }

    /// Right-hand side of a declaration or assignment. Named anonymous
    /// literals register under `registration`.
    pub(super) fn resolve_assign_value(
        &mut self,
        value: &mut AssignValue,
        registration: Option<Registration>,
    ) -> Type {
        match value {
            AssignValue::Plain(expr) => self.resolve_expr(expr, Position::Value),
            AssignValue::Anonymous(literal) => {
                if !literal.resolved {
                    literal.resolved = true;
                    self.resolve_anonymous(&mut literal.decl, registration);
                }
                Type::Any
            }
        }
    }

    pub(super) fn resolve_anonymous(
        &mut self,
        decl: &mut AnonymousDecl,
        registration: Option<Registration>,
    ) {
        match decl {
            AnonymousDecl::Function(function) => self.resolve_function(function, registration),
            AnonymousDecl::Procedure(procedure) => {
                self.resolve_procedure(procedure, registration)
            }
            AnonymousDecl::Class(class) => self.resolve_class(class, registration),
            AnonymousDecl::Functor(functor) => self.resolve_functor(functor, registration),
        }
    }

    /// Enters a named declaration into its registration scope. Returns the
    /// key on success so the caller can patch the entry later.
    fn register(
        &mut self,
        name: Option<&str>,
        registration: Option<Registration>,
        kind: CallableKind,
        arity: usize,
        scope: ScopeId,
        line: usize,
    ) -> Option<(ScopeId, CallableKey)> {
        let (name, registration) = (name?, registration?);
        let return_type = (kind == CallableKind::Function).then_some(Type::Any);
        let callable = Callable {
            name: name.to_string(),
            arity,
            kind,
            scope: Some(scope),
            return_type,
            host_name: host_identifier(name),
            cell: registration.cell,
            line,
        };
        let key = callable.key();
        self.ctx
            .declare_callable(registration.scope, callable, self.diags)
            .then_some((registration.scope, key))
    }

    /// Arguments arrive bound and untyped.
    fn declare_arguments(&mut self, args: &mut [Variable]) {
        for arg in args {
            let binding = Binding::bound(arg.name.clone(), BindingKind::Local, Type::Any, arg.line);
            self.ctx.declare_variable(self.scope, binding, self.diags);
            arg.binding = BindingKind::Local;
            arg.ty = Some(Type::Any);
        }
    }

    pub(super) fn resolve_function(
        &mut self,
        decl: &mut FunctionDecl,
        registration: Option<Registration>,
    ) {
        let scope = self.scope_or_push(
            &mut decl.scope,
            ScopeKind::Function {
                name: decl.name.clone(),
                return_type: None,
            },
        );
        decl.host_name = decl.name.as_deref().map(host_identifier);
        let registered = self.register(
            decl.name.as_deref(),
            registration,
            CallableKind::Function,
            decl.args.len(),
            scope,
            decl.line,
        );
        if self.trace {
            eprintln!(
                "[lumo-debug] function {}/{}",
                decl.name.as_deref().unwrap_or("$"),
                decl.args.len()
            );
        }

        let ty = self.with_scope(scope, |this| {
            this.declare_arguments(&mut decl.args);
            this.resolve_block_in(&mut decl.body, scope, Position::Value)
        });
        self.ctx.set_return_type(scope, ty);
        decl.return_type = Some(ty);
        if let Some((owner, key)) = registered {
            self.ctx
                .set_callable_return_type(owner, CallableKind::Function, &key, ty);
        }
    }

    pub(super) fn resolve_procedure(
        &mut self,
        decl: &mut ProcedureDecl,
        registration: Option<Registration>,
    ) {
        let scope = self.scope_or_push(
            &mut decl.scope,
            ScopeKind::Procedure {
                name: decl.name.clone(),
            },
        );
        decl.host_name = decl.name.as_deref().map(host_identifier);
        self.register(
            decl.name.as_deref(),
            registration,
            CallableKind::Procedure,
            decl.args.len(),
            scope,
            decl.line,
        );

        self.with_scope(scope, |this| {
            this.declare_arguments(&mut decl.args);
            this.resolve_block_in(&mut decl.body, scope, Position::Statement);
        });
    }

    pub(super) fn resolve_class(&mut self, decl: &mut ClassDecl, registration: Option<Registration>) {
        let class_name = decl.name.clone().unwrap_or_else(|| "$".to_string());
        let outer = self.scope;
        let scope = self.scope_or_push(
            &mut decl.scope,
            ScopeKind::Class(ClassScope {
                name: class_name.clone(),
                methods: Default::default(),
                superclasses: Vec::new(),
            }),
        );
        decl.host_name = decl.name.as_deref().map(host_identifier);
        self.register(
            decl.name.as_deref(),
            registration,
            CallableKind::Class,
            0,
            scope,
            decl.line,
        );

        let extends = decl
            .descriptors
            .iter()
            .filter(|descriptor| matches!(descriptor, ClassDescriptor::Extends { .. }))
            .count();
        if extends > 1 {
            self.error(
                decl.line,
                format!("class {class_name} has more than one extends clause"),
            );
        }

        for descriptor in &mut decl.descriptors {
            match descriptor {
                ClassDescriptor::Extends { names, line } => {
                    for name in names.iter() {
                        let visible = self
                            .ctx
                            .lookup_callable(outer, CallableKind::Class, name, 0)
                            .is_some()
                            || self.ctx.lookup_variable(outer, name).is_some();
                        if visible {
                            self.ctx.add_superclass(scope, name.clone());
                        } else {
                            self.error(*line, format!("unknown superclass {name}"));
                        }
                    }
                }
                ClassDescriptor::Attributes { attrs, .. } => {
                    for attr in attrs.iter_mut() {
                        let ty = match attr.default.as_mut() {
                            Some(default) => self.with_scope(scope, |this| {
                                this.resolve_expr(default, Position::Value)
                            }),
                            None => Type::Any,
                        };
                        let binding = Binding {
                            name: attr.name.clone(),
                            mutability: Mutability::Mutable,
                            kind: BindingKind::Attribute,
                            ty,
                            bound: true,
                            line: attr.line,
                        };
                        self.ctx.declare_variable(scope, binding, self.diags);
                    }
                }
                ClassDescriptor::Properties { line, .. } => {
                    self.error(*line, "class properties are not supported");
                }
                ClassDescriptor::Features { line, .. } => {
                    self.error(*line, "class features are not supported");
                }
            }
        }

        self.with_scope(scope, |this| {
            for method in &mut decl.methods {
                this.declare_method_head(method);
            }
            for method in &mut decl.methods {
                this.resolve_method(method);
            }
        });
    }

    fn declare_method_head(&mut self, method: &mut MethodDecl) {
        if method.declared {
            return;
        }
        method.declared = true;
        let Some(class_scope) = self.ctx.nearest_scope_of_kind(self.scope, ScopeRole::Class)
        else {
            self.error(
                method.line,
                format!("method {} must be declared inside a class", method.name),
            );
            return;
        };
        let returns_value = method.shape == MethodShape::Function;
        let info = MethodInfo {
            name: method.name.clone(),
            arity: method.args.len(),
            returns_value,
            return_type: if returns_value { Type::Any } else { Type::Unit },
            line: method.line,
        };
        self.ctx.declare_method(class_scope, info, self.diags);
    }

    fn resolve_method(&mut self, method: &mut MethodDecl) {
        if method.resolved {
            return;
        }
        method.resolved = true;
        let Some(class_scope) = self.ctx.nearest_scope_of_kind(self.scope, ScopeRole::Class)
        else {
            return;
        };
        let returns_value = method.shape == MethodShape::Function;
        let scope = self.scope_or_push(
            &mut method.scope,
            ScopeKind::Method {
                name: method.name.clone(),
                returns_value,
                return_type: None,
            },
        );
        let position = if returns_value {
            Position::Value
        } else {
            Position::Statement
        };
        let ty = self.with_scope(scope, |this| {
            this.declare_arguments(&mut method.args);
            this.resolve_block_in(&mut method.body, scope, position)
        });
        if returns_value {
            self.ctx.set_return_type(scope, ty);
            self.ctx.set_method_return_type(
                class_scope,
                &CallableKey::new(method.name.clone(), method.args.len()),
                ty,
            );
            method.return_type = Some(ty);
        } else {
            method.return_type = Some(Type::Unit);
        }
    }

    pub(super) fn resolve_functor(
        &mut self,
        decl: &mut FunctorDecl,
        registration: Option<Registration>,
    ) {
        let scope = self.scope_or_push(
            &mut decl.scope,
            ScopeKind::Functor {
                name: decl.name.clone(),
                imports: decl.imports.iter().map(|import| import.name.clone()).collect(),
            },
        );
        decl.host_name = decl.name.as_deref().map(host_identifier);
        self.register(
            decl.name.as_deref(),
            registration,
            CallableKind::Functor,
            0,
            scope,
            decl.line,
        );

        let mut labels = HashSet::new();
        for item in &decl.body.decls {
            if let Some(label) = item.alias.as_deref() {
                if !labels.insert(label) {
                    self.diags
                        .error(item.line, format!("{label} is exported more than once"));
                }
            }
        }

        self.with_scope(scope, |this| {
            for import in &mut decl.imports {
                let binding =
                    Binding::bound(import.name.clone(), BindingKind::Import, Type::Any, import.line);
                this.ctx.declare_variable(scope, binding, this.diags);
                import.binding = BindingKind::Import;
                import.ty = Some(Type::Any);
            }
            this.resolve_block_in(&mut decl.body, scope, Position::Statement);
        });
    }
}
