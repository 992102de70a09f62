use crate::language::{
    ast::{BindingKind, Mutability},
    builtins::BUILTINS,
    diagnostics::Diagnostics,
    types::Type,
};
use std::{collections::HashMap, fmt, iter};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallableKind {
    Function,
    Procedure,
    Functor,
    Class,
}

impl CallableKind {
    pub fn noun(self) -> &'static str {
        match self {
            CallableKind::Function => "function",
            CallableKind::Procedure => "procedure",
            CallableKind::Functor => "functor",
            CallableKind::Class => "class",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallableKey {
    pub name: String,
    pub arity: usize,
}

impl CallableKey {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for CallableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

#[derive(Clone, Debug)]
pub struct Callable {
    pub name: String,
    pub arity: usize,
    pub kind: CallableKind,
    /// Scope owned by the declaration (body scope, class scope, ...).
    pub scope: Option<ScopeId>,
    pub return_type: Option<Type>,
    pub host_name: String,
    /// Registered through a mutable binding; calls go through the cell.
    pub cell: bool,
    pub line: usize,
}

impl Callable {
    pub fn key(&self) -> CallableKey {
        CallableKey::new(self.name.clone(), self.arity)
    }
}

#[derive(Clone, Debug)]
pub struct Binding {
    pub name: String,
    pub mutability: Mutability,
    pub kind: BindingKind,
    pub ty: Type,
    /// The binding already holds a value.
    pub bound: bool,
    pub line: usize,
}

impl Binding {
    pub fn local(name: impl Into<String>, mutability: Mutability, line: usize) -> Self {
        Self {
            name: name.into(),
            mutability,
            kind: BindingKind::Local,
            ty: Type::Unknown,
            bound: false,
            line,
        }
    }

    /// Arguments, imports and pattern variables: constants that arrive with
    /// a value.
    pub fn bound(name: impl Into<String>, kind: BindingKind, ty: Type, line: usize) -> Self {
        Self {
            name: name.into(),
            mutability: Mutability::Immutable,
            kind,
            ty,
            bound: true,
            line,
        }
    }

    /// Type seen by a use of this binding.
    pub fn use_type(&self) -> Type {
        match self.ty {
            Type::Unknown => Type::Any,
            ty => ty,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub name: String,
    pub arity: usize,
    pub returns_value: bool,
    pub return_type: Type,
    pub line: usize,
}

#[derive(Clone, Debug)]
pub struct ClassScope {
    pub name: String,
    pub methods: HashMap<CallableKey, MethodInfo>,
    pub superclasses: Vec<String>,
}

#[derive(Clone, Debug)]
pub enum ScopeKind {
    Global,
    Block,
    Loop,
    Function {
        name: Option<String>,
        return_type: Option<Type>,
    },
    Procedure {
        name: Option<String>,
    },
    Method {
        name: String,
        returns_value: bool,
        return_type: Option<Type>,
    },
    Class(ClassScope),
    Functor {
        name: Option<String>,
        imports: Vec<String>,
    },
}

/// Roles answered by [`Context::nearest_scope_of_kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeRole {
    Class,
    /// Function, procedure or method body.
    Callable,
}

impl ScopeKind {
    pub fn plays(&self, role: ScopeRole) -> bool {
        matches!(
            (self, role),
            (ScopeKind::Class(_), ScopeRole::Class)
                | (ScopeKind::Function { .. }, ScopeRole::Callable)
                | (ScopeKind::Procedure { .. }, ScopeRole::Callable)
                | (ScopeKind::Method { .. }, ScopeRole::Callable)
        )
    }
}

#[derive(Clone, Debug, Default)]
struct CallableTables {
    functions: HashMap<CallableKey, Callable>,
    procedures: HashMap<CallableKey, Callable>,
    functors: HashMap<CallableKey, Callable>,
    classes: HashMap<CallableKey, Callable>,
}

impl CallableTables {
    fn table(&self, kind: CallableKind) -> &HashMap<CallableKey, Callable> {
        match kind {
            CallableKind::Function => &self.functions,
            CallableKind::Procedure => &self.procedures,
            CallableKind::Functor => &self.functors,
            CallableKind::Class => &self.classes,
        }
    }

    fn table_mut(&mut self, kind: CallableKind) -> &mut HashMap<CallableKey, Callable> {
        match kind {
            CallableKind::Function => &mut self.functions,
            CallableKind::Procedure => &mut self.procedures,
            CallableKind::Functor => &mut self.functors,
            CallableKind::Class => &mut self.classes,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    variables: Vec<Binding>,
    variable_index: HashMap<String, usize>,
    callables: CallableTables,
}

impl Scope {
    fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            parent,
            kind,
            variables: Vec::new(),
            variable_index: HashMap::new(),
            callables: CallableTables::default(),
        }
    }

    /// Declared variables in declaration order.
    pub fn variables(&self) -> &[Binding] {
        &self.variables
    }

    pub fn callable_count(&self, kind: CallableKind) -> usize {
        self.callables.table(kind).len()
    }

    /// Callables of one kind, ordered by name then arity.
    pub fn callables(&self, kind: CallableKind) -> Vec<&Callable> {
        let mut callables: Vec<_> = self.callables.table(kind).values().collect();
        callables.sort_by(|a, b| (&a.name, a.arity).cmp(&(&b.name, b.arity)));
        callables
    }
}

/// Handle to a binding stored in some scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariableRef {
    pub scope: ScopeId,
    index: usize,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("{name} is already declared in this scope")]
    VariableRedeclared { name: String },
    #[error("{kind} {key} is already declared in this scope")]
    CallableRedeclared { kind: &'static str, key: CallableKey },
    #[error("{kind}s cannot be declared directly inside class {class}")]
    CallableInClass { kind: &'static str, class: String },
    #[error("method {key} is already declared in class {class}")]
    MethodRedeclared { key: CallableKey, class: String },
    #[error("method {name} must be declared inside a class")]
    MethodOutsideClass { name: String },
}

/// The scope chain: an arena of scopes linked to their parents.
#[derive(Clone, Debug)]
pub struct Context {
    scopes: Vec<Scope>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A context holding only the global scope with the host built-ins.
    pub fn new() -> Self {
        let mut global = Scope::new(None, ScopeKind::Global);
        for builtin in BUILTINS {
            let callable = Callable {
                name: builtin.name.to_string(),
                arity: builtin.arity,
                kind: builtin.kind,
                scope: None,
                return_type: builtin.returns,
                host_name: builtin.name.to_string(),
                cell: false,
                line: 0,
            };
            global
                .callables
                .table_mut(builtin.kind)
                .insert(callable.key(), callable);
        }
        Self {
            scopes: vec![global],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId::GLOBAL
    }

    /// Every scope in creation order.
    pub fn ids(&self) -> impl Iterator<Item = ScopeId> {
        (0..self.scopes.len()).map(ScopeId)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn push_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(Some(parent), kind));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scope(id).parent
    }

    /// `from` followed by its ancestors up to the global scope.
    pub fn chain(&self, from: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        iter::successors(Some(from), move |id| self.parent(*id))
    }

    pub fn declare_variable(
        &mut self,
        scope: ScopeId,
        binding: Binding,
        diags: &mut Diagnostics,
    ) -> bool {
        let line = binding.line;
        match self.try_declare_variable(scope, binding) {
            Ok(_) => true,
            Err(err) => {
                diags.error(line, err.to_string());
                false
            }
        }
    }

    /// Only `scope` itself is checked; shadowing a parent is fine.
    pub fn try_declare_variable(
        &mut self,
        scope: ScopeId,
        binding: Binding,
    ) -> Result<VariableRef, ScopeError> {
        let target = self.scope_mut(scope);
        if target.variable_index.contains_key(&binding.name) {
            return Err(ScopeError::VariableRedeclared { name: binding.name });
        }
        let index = target.variables.len();
        target.variable_index.insert(binding.name.clone(), index);
        target.variables.push(binding);
        Ok(VariableRef { scope, index })
    }

    pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> Option<VariableRef> {
        self.chain(scope).find_map(|id| {
            self.scope(id)
                .variable_index
                .get(name)
                .map(|index| VariableRef {
                    scope: id,
                    index: *index,
                })
        })
    }

    pub fn variable(&self, var: VariableRef) -> &Binding {
        &self.scope(var.scope).variables[var.index]
    }

    pub fn variable_mut(&mut self, var: VariableRef) -> &mut Binding {
        &mut self.scope_mut(var.scope).variables[var.index]
    }

    /// Mutability-aware assignment: cells always accept, constants accept
    /// only their first value.
    pub fn try_assign(
        &mut self,
        var: VariableRef,
        ty: Type,
        line: usize,
        diags: &mut Diagnostics,
    ) -> bool {
        let binding = self.variable_mut(var);
        if !binding.mutability.is_mutable() && binding.bound {
            diags.error(
                line,
                format!(
                    "cannot assign to constant {}: it already holds a value",
                    binding.name
                ),
            );
            return false;
        }
        binding.ty = ty;
        binding.bound = true;
        true
    }

    pub fn declare_callable(
        &mut self,
        scope: ScopeId,
        callable: Callable,
        diags: &mut Diagnostics,
    ) -> bool {
        let line = callable.line;
        match self.try_declare_callable(scope, callable) {
            Ok(()) => true,
            Err(err) => {
                diags.error(line, err.to_string());
                false
            }
        }
    }

    pub fn try_declare_callable(
        &mut self,
        scope: ScopeId,
        callable: Callable,
    ) -> Result<(), ScopeError> {
        let target = self.scope_mut(scope);
        if let ScopeKind::Class(class) = &target.kind {
            if matches!(
                callable.kind,
                CallableKind::Function | CallableKind::Procedure
            ) {
                return Err(ScopeError::CallableInClass {
                    kind: callable.kind.noun(),
                    class: class.name.clone(),
                });
            }
        }
        let key = callable.key();
        let table = target.callables.table_mut(callable.kind);
        if let Some(existing) = table.get(&key) {
            // A cell rebound to a new literal of the same shape.
            if !(existing.cell && callable.cell) {
                return Err(ScopeError::CallableRedeclared {
                    kind: callable.kind.noun(),
                    key,
                });
            }
        }
        table.insert(key, callable);
        Ok(())
    }

    pub fn lookup_callable(
        &self,
        scope: ScopeId,
        kind: CallableKind,
        name: &str,
        arity: usize,
    ) -> Option<(ScopeId, &Callable)> {
        let key = CallableKey::new(name, arity);
        self.chain(scope).find_map(|id| {
            self.scope(id)
                .callables
                .table(kind)
                .get(&key)
                .map(|callable| (id, callable))
        })
    }

    /// Any arity; used for class and functor names.
    pub fn lookup_named(&self, scope: ScopeId, kind: CallableKind, name: &str) -> Option<&Callable> {
        self.chain(scope).find_map(|id| {
            self.scope(id)
                .callables
                .table(kind)
                .values()
                .find(|callable| callable.name == name)
        })
    }

    pub fn set_callable_return_type(
        &mut self,
        scope: ScopeId,
        kind: CallableKind,
        key: &CallableKey,
        ty: Type,
    ) {
        if let Some(callable) = self.scope_mut(scope).callables.table_mut(kind).get_mut(key) {
            callable.return_type = Some(ty);
        }
    }

    pub fn nearest_scope_of_kind(&self, scope: ScopeId, role: ScopeRole) -> Option<ScopeId> {
        self.chain(scope).find(|id| self.scope(*id).kind.plays(role))
    }

    /// Nominal lookup: the inner scope of the class declared as `name`.
    pub fn find_class_scope(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        self.lookup_callable(scope, CallableKind::Class, name, 0)
            .and_then(|(_, class)| class.scope)
    }

    pub fn class_scope(&self, scope: ScopeId) -> Option<&ClassScope> {
        match &self.scope(scope).kind {
            ScopeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    fn class_scope_mut(&mut self, scope: ScopeId) -> Option<&mut ClassScope> {
        match &mut self.scope_mut(scope).kind {
            ScopeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn add_superclass(&mut self, class_scope: ScopeId, name: impl Into<String>) {
        if let Some(class) = self.class_scope_mut(class_scope) {
            class.superclasses.push(name.into());
        }
    }

    pub fn declare_method(
        &mut self,
        class_scope: ScopeId,
        method: MethodInfo,
        diags: &mut Diagnostics,
    ) -> bool {
        let line = method.line;
        match self.try_declare_method(class_scope, method) {
            Ok(()) => true,
            Err(err) => {
                diags.error(line, err.to_string());
                false
            }
        }
    }

    pub fn try_declare_method(
        &mut self,
        class_scope: ScopeId,
        method: MethodInfo,
    ) -> Result<(), ScopeError> {
        let Some(class) = self.class_scope_mut(class_scope) else {
            return Err(ScopeError::MethodOutsideClass { name: method.name });
        };
        let key = CallableKey::new(method.name.clone(), method.arity);
        if class.methods.contains_key(&key) {
            return Err(ScopeError::MethodRedeclared {
                key,
                class: class.name.clone(),
            });
        }
        class.methods.insert(key, method);
        Ok(())
    }

    pub fn lookup_method(&self, class_scope: ScopeId, name: &str, arity: usize) -> Option<&MethodInfo> {
        self.class_scope(class_scope)?
            .methods
            .get(&CallableKey::new(name, arity))
    }

    pub fn set_method_return_type(&mut self, class_scope: ScopeId, key: &CallableKey, ty: Type) {
        if let Some(method) = self
            .class_scope_mut(class_scope)
            .and_then(|class| class.methods.get_mut(key))
        {
            method.return_type = ty;
        }
    }

    /// Records the result type on a function or method scope.
    pub fn set_return_type(&mut self, scope: ScopeId, ty: Type) {
        match &mut self.scope_mut(scope).kind {
            ScopeKind::Function { return_type, .. } | ScopeKind::Method { return_type, .. } => {
                *return_type = Some(ty);
            }
            _ => {}
        }
    }

    pub fn enclosing_return_type(&self, scope: ScopeId) -> Option<Type> {
        let id = self.nearest_scope_of_kind(scope, ScopeRole::Callable)?;
        match &self.scope(id).kind {
            ScopeKind::Function { return_type, .. } | ScopeKind::Method { return_type, .. } => {
                *return_type
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str, arity: usize, line: usize) -> Callable {
        Callable {
            name: name.into(),
            arity,
            kind: CallableKind::Function,
            scope: None,
            return_type: Some(Type::Any),
            host_name: name.into(),
            cell: false,
            line,
        }
    }

    fn class_kind(name: &str) -> ScopeKind {
        ScopeKind::Class(ClassScope {
            name: name.into(),
            methods: HashMap::new(),
            superclasses: Vec::new(),
        })
    }

    #[test]
    fn redeclaring_in_same_scope_keeps_first() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let block = ctx.push_scope(ctx.global(), ScopeKind::Block);
        let mut first = Binding::local("x", Mutability::Immutable, 1);
        first.ty = Type::Int;
        assert!(ctx.declare_variable(block, first, &mut diags));
        let mut second = Binding::local("x", Mutability::Mutable, 2);
        second.ty = Type::String;
        assert!(!ctx.declare_variable(block, second, &mut diags));

        assert_eq!(diags.len(), 1);
        assert_eq!(diags.entries()[0].line, 2);
        let found = ctx.lookup_variable(block, "x").expect("x visible");
        assert_eq!(ctx.variable(found).ty, Type::Int);
        assert_eq!(ctx.variable(found).line, 1);
    }

    #[test]
    fn nested_scope_shadows_silently() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let outer = ctx.push_scope(ctx.global(), ScopeKind::Block);
        let inner = ctx.push_scope(outer, ScopeKind::Block);
        assert!(ctx.declare_variable(outer, Binding::local("x", Mutability::Immutable, 1), &mut diags));
        assert!(ctx.declare_variable(inner, Binding::local("x", Mutability::Mutable, 2), &mut diags));
        assert!(diags.is_empty());

        let from_inner = ctx.lookup_variable(inner, "x").expect("inner x");
        assert_eq!(from_inner.scope, inner);
        assert!(ctx.variable(from_inner).mutability.is_mutable());
        let from_outer = ctx.lookup_variable(outer, "x").expect("outer x");
        assert_eq!(from_outer.scope, outer);
    }

    #[test]
    fn siblings_do_not_see_each_other() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let left = ctx.push_scope(ctx.global(), ScopeKind::Block);
        let right = ctx.push_scope(ctx.global(), ScopeKind::Block);
        ctx.declare_variable(left, Binding::local("only_left", Mutability::Immutable, 1), &mut diags);
        assert!(ctx.lookup_variable(right, "only_left").is_none());
    }

    #[test]
    fn callables_are_keyed_by_arity() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let block = ctx.push_scope(ctx.global(), ScopeKind::Block);
        assert!(ctx.declare_callable(block, function("F", 1, 1), &mut diags));
        assert!(ctx.declare_callable(block, function("F", 2, 2), &mut diags));
        assert!(!ctx.declare_callable(block, function("F", 1, 3), &mut diags));
        let msg = diags.entries()[0].message.clone();
        insta::assert_snapshot!(msg, @"function F/1 is already declared in this scope");

        assert!(ctx.lookup_callable(block, CallableKind::Function, "F", 2).is_some());
        assert!(ctx.lookup_callable(block, CallableKind::Function, "F", 0).is_none());
        assert!(ctx.lookup_callable(block, CallableKind::Procedure, "F", 1).is_none());
    }

    #[test]
    fn variables_and_callables_live_in_separate_namespaces() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let block = ctx.push_scope(ctx.global(), ScopeKind::Block);
        assert!(ctx.declare_variable(block, Binding::local("f", Mutability::Immutable, 1), &mut diags));
        assert!(ctx.declare_callable(block, function("f", 1, 1), &mut diags));
        assert!(diags.is_empty());
    }

    #[test]
    fn class_scopes_reject_free_functions() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let class = ctx.push_scope(ctx.global(), class_kind("Counter"));
        assert!(!ctx.declare_callable(class, function("Helper", 0, 5), &mut diags));
        let msg = diags.entries()[0].message.clone();
        insta::assert_snapshot!(msg, @"functions cannot be declared directly inside class Counter");
        assert_eq!(ctx.scope(class).callable_count(CallableKind::Function), 0);
    }

    #[test]
    fn nearest_scope_walks_upward() {
        let mut ctx = Context::new();
        let class = ctx.push_scope(ctx.global(), class_kind("Shape"));
        let method = ctx.push_scope(
            class,
            ScopeKind::Method {
                name: "area".into(),
                returns_value: true,
                return_type: Some(Type::Float),
            },
        );
        let block = ctx.push_scope(method, ScopeKind::Block);
        assert_eq!(ctx.nearest_scope_of_kind(block, ScopeRole::Class), Some(class));
        assert_eq!(ctx.nearest_scope_of_kind(block, ScopeRole::Callable), Some(method));
        assert_eq!(ctx.nearest_scope_of_kind(class, ScopeRole::Callable), None);
        assert_eq!(ctx.enclosing_return_type(block), Some(Type::Float));
    }

    #[test]
    fn find_class_scope_needs_a_declared_name() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let block = ctx.push_scope(ctx.global(), ScopeKind::Block);
        let class = ctx.push_scope(block, class_kind("Base"));
        ctx.declare_callable(
            block,
            Callable {
                name: "Base".into(),
                arity: 0,
                kind: CallableKind::Class,
                scope: Some(class),
                return_type: None,
                host_name: "Base".into(),
                cell: false,
                line: 1,
            },
            &mut diags,
        );
        let inner = ctx.push_scope(block, ScopeKind::Block);
        assert_eq!(ctx.find_class_scope(inner, "Base"), Some(class));
        assert_eq!(ctx.find_class_scope(inner, "Other"), None);
        assert_eq!(ctx.find_class_scope(ctx.global(), "Base"), None);
    }

    #[test]
    fn methods_are_unique_per_class() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let class = ctx.push_scope(ctx.global(), class_kind("Counter"));
        let method = |line| MethodInfo {
            name: "inc".into(),
            arity: 1,
            returns_value: false,
            return_type: Type::Unit,
            line,
        };
        assert!(ctx.declare_method(class, method(1), &mut diags));
        assert!(!ctx.declare_method(class, method(2), &mut diags));
        assert!(ctx.lookup_method(class, "inc", 1).is_some());
        assert!(ctx.lookup_method(class, "inc", 0).is_none());
        let msg = diags.entries()[0].message.clone();
        insta::assert_snapshot!(msg, @"method inc/1 is already declared in class Counter");

        let block = ctx.push_scope(ctx.global(), ScopeKind::Block);
        assert_eq!(
            ctx.try_declare_method(block, method(3)),
            Err(ScopeError::MethodOutsideClass { name: "inc".into() })
        );
    }

    #[test]
    fn constants_accept_one_value_cells_accept_many() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let block = ctx.push_scope(ctx.global(), ScopeKind::Block);
        let constant = ctx
            .try_declare_variable(block, Binding::local("c", Mutability::Immutable, 1))
            .expect("declare c");
        let cell = ctx
            .try_declare_variable(block, Binding::local("m", Mutability::Mutable, 1))
            .expect("declare m");

        assert!(ctx.try_assign(constant, Type::Int, 2, &mut diags));
        assert_eq!(ctx.variable(constant).ty, Type::Int);
        assert!(!ctx.try_assign(constant, Type::String, 3, &mut diags));
        assert_eq!(ctx.variable(constant).ty, Type::Int);
        assert_eq!(diags.len(), 1);

        assert!(ctx.try_assign(cell, Type::Int, 4, &mut diags));
        assert!(ctx.try_assign(cell, Type::String, 5, &mut diags));
        assert_eq!(ctx.variable(cell).ty, Type::String);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn cell_bound_callables_may_be_rebound() {
        let mut ctx = Context::new();
        let mut diags = Diagnostics::new();
        let block = ctx.push_scope(ctx.global(), ScopeKind::Block);
        let mut first = function("step", 1, 1);
        first.cell = true;
        let mut second = function("step", 1, 2);
        second.cell = true;
        second.return_type = Some(Type::Int);
        assert!(ctx.declare_callable(block, first, &mut diags));
        assert!(ctx.declare_callable(block, second, &mut diags));
        let (_, found) = ctx
            .lookup_callable(block, CallableKind::Function, "step", 1)
            .expect("step");
        assert_eq!(found.return_type, Some(Type::Int));
    }

    #[test]
    fn builtins_live_in_the_global_scope() {
        let ctx = Context::new();
        assert!(ctx
            .lookup_callable(ctx.global(), CallableKind::Procedure, "Show", 1)
            .is_some());
        let (scope, length) = ctx
            .lookup_callable(ctx.global(), CallableKind::Function, "Length", 1)
            .expect("Length");
        assert_eq!(scope, ScopeId::GLOBAL);
        assert_eq!(length.return_type, Some(Type::Int));
    }
}
