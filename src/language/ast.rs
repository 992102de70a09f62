use crate::language::{scopes::ScopeId, types::Type};

#[derive(Clone, Debug)]
pub struct Program {
    pub kind: ProgramKind,
    pub body: Block,
}

/// Root shape handed over by the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramKind {
    /// A plain sequence of top-level declarations and statements.
    Statements,
    /// `declare D in S`: declarations land in the global scope.
    Declare,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    Immutable,
    Mutable,
}

impl Mutability {
    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occurrence {
    Binding,
    Use,
}

/// What a variable occurrence ended up referring to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    Local,
    Attribute,
    Import,
}

#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub mutability: Mutability,
    pub occurrence: Occurrence,
    pub binding: BindingKind,
    pub ty: Option<Type>,
    pub line: usize,
}

impl Variable {
    pub fn binding(name: impl Into<String>, mutability: Mutability, line: usize) -> Self {
        Self {
            name: name.into(),
            mutability,
            occurrence: Occurrence::Binding,
            binding: BindingKind::Local,
            ty: None,
            line,
        }
    }

    pub fn use_of(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            mutability: Mutability::Immutable,
            occurrence: Occurrence::Use,
            binding: BindingKind::Local,
            ty: None,
            line,
        }
    }

    pub fn is_binding(&self) -> bool {
        self.occurrence == Occurrence::Binding
    }
}

/// Host spelling of a locally declared name: the first character is
/// forced to upper case.
pub fn host_identifier(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `local D in S end` and every other declaration container.
#[derive(Clone, Debug)]
pub struct Block {
    pub decls: Vec<Decl>,
    pub stmts: Vec<Stmt>,
    pub line: usize,
    pub scope: Option<ScopeId>,
    pub ty: Option<Type>,
}

impl Block {
    pub fn new(decls: Vec<Decl>, stmts: Vec<Stmt>, line: usize) -> Self {
        Self {
            decls,
            stmts,
            line,
            scope: None,
            ty: None,
        }
    }

    pub fn has_declarations(&self) -> bool {
        !self.decls.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Decl {
    pub kind: DeclKind,
    /// Export label inside a functor body.
    pub alias: Option<String>,
    pub line: usize,
    pub resolved: bool,
}

impl Decl {
    pub fn new(kind: DeclKind, line: usize) -> Self {
        Self {
            kind,
            alias: None,
            line,
            resolved: false,
        }
    }

    pub fn exported_as(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            DeclKind::Variable(decl) => Some(decl.pattern.name.as_str()),
            DeclKind::Function(decl) => decl.name.as_deref(),
            DeclKind::Procedure(decl) => decl.name.as_deref(),
            DeclKind::Class(decl) => decl.name.as_deref(),
            DeclKind::Functor(decl) => decl.name.as_deref(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum DeclKind {
    Variable(VarDecl),
    Function(FunctionDecl),
    Procedure(ProcedureDecl),
    Class(ClassDecl),
    Functor(FunctorDecl),
}

/// `val x = e` / `var x = e`.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub pattern: Variable,
    pub init: Option<AssignValue>,
}

impl VarDecl {
    pub fn new(pattern: Variable, mut init: Option<AssignValue>) -> Self {
        if let Some(value) = init.as_mut() {
            bind_name_if_anonymous(value, &pattern.name);
        }
        Self { pattern, init }
    }
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub anonymous: bool,
    pub args: Vec<Variable>,
    pub body: Block,
    pub line: usize,
    pub scope: Option<ScopeId>,
    pub return_type: Option<Type>,
    pub host_name: Option<String>,
}

impl FunctionDecl {
    pub fn new(name: Option<String>, args: Vec<Variable>, body: Block, line: usize) -> Self {
        Self {
            anonymous: name.is_none(),
            name,
            args,
            body,
            line,
            scope: None,
            return_type: None,
            host_name: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProcedureDecl {
    pub name: Option<String>,
    pub anonymous: bool,
    pub args: Vec<Variable>,
    pub body: Block,
    pub line: usize,
    pub scope: Option<ScopeId>,
    pub host_name: Option<String>,
}

impl ProcedureDecl {
    pub fn new(name: Option<String>, args: Vec<Variable>, body: Block, line: usize) -> Self {
        Self {
            anonymous: name.is_none(),
            name,
            args,
            body,
            line,
            scope: None,
            host_name: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub name: Option<String>,
    pub anonymous: bool,
    pub descriptors: Vec<ClassDescriptor>,
    pub methods: Vec<MethodDecl>,
    pub line: usize,
    pub scope: Option<ScopeId>,
    pub host_name: Option<String>,
}

impl ClassDecl {
    pub fn new(
        name: Option<String>,
        descriptors: Vec<ClassDescriptor>,
        methods: Vec<MethodDecl>,
        line: usize,
    ) -> Self {
        Self {
            anonymous: name.is_none(),
            name,
            descriptors,
            methods,
            line,
            scope: None,
            host_name: None,
        }
    }

    pub fn superclasses(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().flat_map(|descriptor| match descriptor {
            ClassDescriptor::Extends { names, .. } => {
                names.iter().map(String::as_str).collect::<Vec<_>>()
            }
            _ => Vec::new(),
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.descriptors.iter().flat_map(|descriptor| match descriptor {
            ClassDescriptor::Attributes { attrs, .. } => attrs.iter().collect::<Vec<_>>(),
            _ => Vec::new(),
        })
    }
}

#[derive(Clone, Debug)]
pub enum ClassDescriptor {
    Extends { names: Vec<String>, line: usize },
    Attributes { attrs: Vec<Attribute>, line: usize },
    Properties { names: Vec<String>, line: usize },
    Features { names: Vec<String>, line: usize },
}

#[derive(Clone, Debug)]
pub struct Attribute {
    pub name: String,
    pub default: Option<Expr>,
    pub line: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodShape {
    /// Statement body, no result.
    Procedure,
    /// Expression body, the result travels through `$`.
    Function,
}

#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub name: String,
    pub args: Vec<Variable>,
    pub shape: MethodShape,
    pub body: Block,
    pub line: usize,
    pub scope: Option<ScopeId>,
    pub return_type: Option<Type>,
    pub declared: bool,
    pub resolved: bool,
}

impl MethodDecl {
    pub fn new(
        name: impl Into<String>,
        args: Vec<Variable>,
        shape: MethodShape,
        body: Block,
        line: usize,
    ) -> Self {
        Self {
            name: name.into(),
            args,
            shape,
            body,
            line,
            scope: None,
            return_type: None,
            declared: false,
            resolved: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FunctorDecl {
    pub name: Option<String>,
    pub anonymous: bool,
    pub imports: Vec<Variable>,
    pub body: Block,
    pub line: usize,
    pub scope: Option<ScopeId>,
    pub host_name: Option<String>,
}

impl FunctorDecl {
    pub fn new(name: Option<String>, imports: Vec<Variable>, body: Block, line: usize) -> Self {
        Self {
            anonymous: name.is_none(),
            name,
            imports,
            body,
            line,
            scope: None,
            host_name: None,
        }
    }

    /// `(label, declared name)` pairs of the body's exported declarations.
    pub fn exports(&self) -> Vec<(&str, &str)> {
        self.body
            .decls
            .iter()
            .filter_map(|decl| Some((decl.alias.as_deref()?, decl.name()?)))
            .collect()
    }
}

/// The four literal kinds that may receive a name from an assignment.
#[derive(Clone, Debug)]
pub enum AnonymousDecl {
    Function(FunctionDecl),
    Procedure(ProcedureDecl),
    Class(ClassDecl),
    Functor(FunctorDecl),
}

impl AnonymousDecl {
    pub fn name(&self) -> Option<&str> {
        match self {
            AnonymousDecl::Function(decl) => decl.name.as_deref(),
            AnonymousDecl::Procedure(decl) => decl.name.as_deref(),
            AnonymousDecl::Class(decl) => decl.name.as_deref(),
            AnonymousDecl::Functor(decl) => decl.name.as_deref(),
        }
    }

    fn name_slot(&mut self) -> &mut Option<String> {
        match self {
            AnonymousDecl::Function(decl) => &mut decl.name,
            AnonymousDecl::Procedure(decl) => &mut decl.name,
            AnonymousDecl::Class(decl) => &mut decl.name,
            AnonymousDecl::Functor(decl) => &mut decl.name,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnonymousLiteral {
    pub decl: Box<AnonymousDecl>,
    pub line: usize,
    pub resolved: bool,
}

impl AnonymousLiteral {
    pub fn new(decl: AnonymousDecl, line: usize) -> Self {
        Self {
            decl: Box::new(decl),
            line,
            resolved: false,
        }
    }
}

/// Right-hand side of an assignment or variable declaration.
#[derive(Clone, Debug)]
pub enum AssignValue {
    Plain(Expr),
    Anonymous(AnonymousLiteral),
}

impl AssignValue {
    /// Lifts anonymous literals out of plain expressions so they can be named.
    pub fn from_expr(expr: Expr) -> Self {
        match expr.kind {
            ExprKind::Anonymous(literal) => AssignValue::Anonymous(*literal),
            kind => AssignValue::Plain(Expr { kind, ..expr }),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            AssignValue::Plain(expr) => expr.line,
            AssignValue::Anonymous(literal) => literal.line,
        }
    }
}

/// Copies `name` into the literal's empty name slot. The slot is filled at
/// most once; a literal that already carries a name keeps it.
pub fn bind_name_if_anonymous(value: &mut AssignValue, name: &str) -> bool {
    let AssignValue::Anonymous(literal) = value else {
        return false;
    };
    let slot = literal.decl.name_slot();
    if slot.is_some() {
        return false;
    }
    *slot = Some(name.to_string());
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

#[derive(Clone, Debug)]
pub enum AssignTarget {
    Variable(Variable),
    /// Anything else the parser saw on the left of `=`; rejected before
    /// resolution.
    Invalid(Box<Expr>),
}

#[derive(Clone, Debug)]
pub struct Assign {
    pub target: AssignTarget,
    pub op: AssignOp,
    pub value: AssignValue,
    pub line: usize,
    pub resolved: bool,
}

impl Assign {
    pub fn new(lhs: Expr, op: AssignOp, mut value: AssignValue, line: usize) -> Self {
        let target = match lhs.kind {
            ExprKind::Variable(variable) => {
                bind_name_if_anonymous(&mut value, &variable.name);
                AssignTarget::Variable(variable)
            }
            kind => AssignTarget::Invalid(Box::new(Expr { kind, ..lhs })),
        };
        Self {
            target,
            op,
            value,
            line,
            resolved: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
    pub resolved: bool,
    /// Set when a value-producing expression sits in statement position.
    pub discard: bool,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: usize) -> Self {
        Self {
            kind,
            line,
            resolved: false,
            discard: false,
        }
    }
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Expr(Expr),
    Assign(Assign),
    If(IfNode),
    Case(CaseNode),
    For(ForLoop),
    Block(Block),
    Skip,
}

#[derive(Clone, Debug)]
pub struct IfNode {
    pub branches: Vec<IfBranch>,
    pub default: Option<Block>,
    pub line: usize,
    pub ty: Option<Type>,
}

#[derive(Clone, Debug)]
pub struct IfBranch {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Clone, Debug)]
pub struct CaseNode {
    pub scrutinee: Expr,
    pub clauses: Vec<Clause>,
    pub default: Option<Block>,
    pub line: usize,
    pub ty: Option<Type>,
}

#[derive(Clone, Debug)]
pub struct Clause {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Block,
    pub line: usize,
    pub scope: Option<ScopeId>,
}

#[derive(Clone, Debug)]
pub struct Pattern {
    pub kind: PatternKind,
    pub line: usize,
    pub ty: Option<Type>,
}

impl Pattern {
    pub fn new(kind: PatternKind, line: usize) -> Self {
        Self {
            kind,
            line,
            ty: None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum PatternKind {
    Wildcard,
    Bind(Variable),
    Literal(Literal),
    List(Vec<Pattern>),
    Cons(Box<Pattern>, Box<Pattern>),
    Record {
        label: String,
        fields: Vec<(String, Pattern)>,
    },
}

#[derive(Clone, Debug)]
pub struct ForLoop {
    pub iterator: Variable,
    pub form: LoopForm,
    pub body: Block,
    pub line: usize,
    pub scope: Option<ScopeId>,
}

#[derive(Clone, Debug)]
pub enum LoopForm {
    Numeric(NumericLoop),
    Generator(Expr),
}

#[derive(Clone, Debug)]
pub struct NumericLoop {
    pub init: Expr,
    pub bound: LoopBound,
    pub step: Option<Expr>,
}

#[derive(Clone, Debug)]
pub enum LoopBound {
    /// `init..end`
    UpTo(Expr),
    /// `init;condition;step`
    While(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Atom(String),
    Bool(bool),
    Nil,
    Unit,
    Underscore,
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Int(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::Str(_) => Type::String,
            Literal::Char(_) => Type::Char,
            Literal::Atom(_) => Type::Atom,
            Literal::Bool(_) => Type::Boolean,
            Literal::Nil => Type::Nil,
            Literal::Unit => Type::Unit,
            Literal::Underscore => Type::Underscore,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndThen,
    OrElse,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "mod",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::AndThen => "andthen",
            BinaryOp::OrElse => "orelse",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize) -> Self {
        Self {
            kind,
            line,
            ty: None,
        }
    }

    /// Records the resolved type. Filled exactly once.
    pub fn set_type(&mut self, ty: Type) -> Type {
        debug_assert!(self.ty.is_none(), "expression type assigned twice");
        self.ty = Some(ty);
        ty
    }

    pub fn resolved_type(&self) -> Type {
        self.ty.unwrap_or(Type::Any)
    }
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Literal(Literal),
    Variable(Variable),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// String `+`, introduced by resolution.
    Concat {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call(Call),
    MethodCall(MethodCall),
    New(NewObject),
    List(Vec<Expr>),
    Cons {
        head: Box<Expr>,
        tail: Box<Expr>,
    },
    Record {
        label: String,
        fields: Vec<(String, Expr)>,
    },
    Field {
        target: Box<Expr>,
        field: String,
    },
    Block(Box<Block>),
    If(Box<IfNode>),
    Case(Box<CaseNode>),
    Anonymous(Box<AnonymousLiteral>),
}

#[derive(Clone, Debug)]
pub enum Callee {
    Named(String),
    /// `{Module.member ...}`
    Dotted { module: Variable, member: String },
}

#[derive(Clone, Debug)]
pub struct Call {
    pub callee: Callee,
    pub args: Vec<Expr>,
    pub resolved: Option<ResolvedCall>,
}

impl Call {
    pub fn new(callee: Callee, args: Vec<Expr>) -> Self {
        Self {
            callee,
            args,
            resolved: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCall {
    pub host_name: String,
    /// Target lives in a cell and must be dereferenced.
    pub cell: bool,
    pub returns_value: bool,
}

#[derive(Clone, Debug)]
pub enum Receiver {
    This,
    Super(String),
    Object(Box<Expr>),
}

#[derive(Clone, Debug)]
pub struct MethodCall {
    pub receiver: Receiver,
    pub method: String,
    pub args: Vec<Expr>,
    pub returns_value: Option<bool>,
}

impl MethodCall {
    pub fn new(receiver: Receiver, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            receiver,
            method: method.into(),
            args,
            returns_value: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewObject {
    pub class: Variable,
    pub method: String,
    pub args: Vec<Expr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anonymous_function(line: usize) -> Expr {
        Expr::new(
            ExprKind::Anonymous(Box::new(AnonymousLiteral::new(
                AnonymousDecl::Function(FunctionDecl::new(
                    None,
                    Vec::new(),
                    Block::new(Vec::new(), Vec::new(), line),
                    line,
                )),
                line,
            ))),
            line,
        )
    }

    #[test]
    fn assignment_names_anonymous_literal() {
        let lhs = Expr::new(ExprKind::Variable(Variable::use_of("fact", 1)), 1);
        let assign = Assign::new(lhs, AssignOp::Set, AssignValue::from_expr(anonymous_function(1)), 1);
        let AssignValue::Anonymous(literal) = &assign.value else {
            panic!("expected anonymous value");
        };
        assert_eq!(literal.decl.name(), Some("fact"));
        let AnonymousDecl::Function(decl) = literal.decl.as_ref() else {
            panic!("expected function");
        };
        assert!(decl.anonymous);
    }

    #[test]
    fn host_identifiers_start_upper_case() {
        assert_eq!(host_identifier("fact"), "Fact");
        assert_eq!(host_identifier("Browse"), "Browse");
        assert_eq!(host_identifier("x1"), "X1");
        assert_eq!(host_identifier(""), "");
    }

    #[test]
    fn plain_values_are_left_alone() {
        let mut value = AssignValue::from_expr(Expr::new(ExprKind::Literal(Literal::Int(1)), 1));
        assert!(!bind_name_if_anonymous(&mut value, "x"));
    }

    #[test]
    fn name_slot_is_filled_once() {
        let mut value = AssignValue::from_expr(anonymous_function(2));
        assert!(bind_name_if_anonymous(&mut value, "first"));
        assert!(!bind_name_if_anonymous(&mut value, "second"));
        let AssignValue::Anonymous(literal) = &value else {
            panic!("expected anonymous value");
        };
        assert_eq!(literal.decl.name(), Some("first"));
    }

    #[test]
    fn invalid_targets_are_kept_for_preanalysis() {
        let lhs = Expr::new(ExprKind::Literal(Literal::Int(3)), 4);
        let assign = Assign::new(
            lhs,
            AssignOp::Set,
            AssignValue::from_expr(anonymous_function(4)),
            4,
        );
        assert!(matches!(assign.target, AssignTarget::Invalid(_)));
        let AssignValue::Anonymous(literal) = &assign.value else {
            panic!("expected anonymous value");
        };
        assert_eq!(literal.decl.name(), None);
    }

    #[test]
    fn var_decl_names_its_initializer() {
        let decl = VarDecl::new(
            Variable::binding("loop", Mutability::Immutable, 1),
            Some(AssignValue::from_expr(anonymous_function(1))),
        );
        let Some(AssignValue::Anonymous(literal)) = &decl.init else {
            panic!("expected anonymous initializer");
        };
        assert_eq!(literal.decl.name(), Some("loop"));
    }
}
