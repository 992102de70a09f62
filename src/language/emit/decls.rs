use super::*;

impl<W: Write> Printer<'_, '_, W> {
    pub(super) fn decl_lines(&mut self, decls: &[Decl]) -> io::Result<()> {
        for decl in decls {
            self.decl(decl)?;
            self.newline()?;
        }
        Ok(())
    }

    fn decl(&mut self, decl: &Decl) -> io::Result<()> {
        match &decl.kind {
            DeclKind::Variable(var) => self.var_decl(var),
            DeclKind::Function(function) => self.function(function),
            DeclKind::Procedure(procedure) => self.procedure(procedure),
            DeclKind::Class(class) => self.class(class),
            DeclKind::Functor(functor) => self.functor(functor),
        }
    }

    /// `X = V`, or `X = {NewCell V}` for a mutable variable. A constant
    /// without a value is declared bare.
    fn var_decl(&mut self, decl: &VarDecl) -> io::Result<()> {
        let name = host_identifier(&decl.pattern.name);
        self.text(&name)?;
        let mutable = decl.pattern.mutability.is_mutable();
        if !mutable && decl.init.is_none() {
            return Ok(());
        }
        self.spaced(HostToken::Bind)?;
        if !mutable {
            return match &decl.init {
                Some(value) => self.assign_value(value),
                None => Ok(()),
            };
        }
        self.token(HostToken::LBrace)?;
        self.token(HostToken::NewCell)?;
        self.space()?;
        match &decl.init {
            Some(AssignValue::Plain(expr)) => self.operand(expr)?,
            Some(AssignValue::Anonymous(literal)) => self.anonymous(&literal.decl)?,
            None => self.token(HostToken::Unbound)?,
        }
        self.token(HostToken::RBrace)
    }

    pub(super) fn assign_value(&mut self, value: &AssignValue) -> io::Result<()> {
        match value {
            AssignValue::Plain(expr) => self.expr(expr),
            AssignValue::Anonymous(literal) => self.anonymous(&literal.decl),
        }
    }

    pub(super) fn anonymous(&mut self, decl: &AnonymousDecl) -> io::Result<()> {
        match decl {
            AnonymousDecl::Function(function) => self.function(function),
            AnonymousDecl::Procedure(procedure) => self.procedure(procedure),
            AnonymousDecl::Class(class) => self.class(class),
            AnonymousDecl::Functor(functor) => self.functor(functor),
        }
    }

    /// Declared name, or `$` for a literal even when an assignment named it.
    fn decl_name(
        &mut self,
        anonymous: bool,
        name: Option<&str>,
        host_name: Option<&str>,
    ) -> io::Result<()> {
        match (anonymous, host_name, name) {
            (false, Some(host_name), _) => self.text(host_name),
            (false, None, Some(name)) => self.text(&host_identifier(name)),
            _ => self.token(HostToken::Placeholder),
        }
    }

    /// `{Name Arg...}` head of a function or procedure.
    fn callable_head(
        &mut self,
        keyword: HostToken,
        anonymous: bool,
        name: Option<&str>,
        host_name: Option<&str>,
        args: &[Variable],
    ) -> io::Result<()> {
        self.token(keyword)?;
        self.space()?;
        self.token(HostToken::LBrace)?;
        self.decl_name(anonymous, name, host_name)?;
        for arg in args {
            self.space()?;
            self.text(&host_identifier(&arg.name))?;
        }
        self.token(HostToken::RBrace)?;
        self.newline()
    }

    fn function(&mut self, decl: &FunctionDecl) -> io::Result<()> {
        self.callable_head(
            HostToken::Fun,
            decl.anonymous,
            decl.name.as_deref(),
            decl.host_name.as_deref(),
            &decl.args,
        )?;
        self.body_lines(&decl.body)?;
        self.token(HostToken::End)
    }

    fn procedure(&mut self, decl: &ProcedureDecl) -> io::Result<()> {
        self.callable_head(
            HostToken::Proc,
            decl.anonymous,
            decl.name.as_deref(),
            decl.host_name.as_deref(),
            &decl.args,
        )?;
        self.body_lines(&decl.body)?;
        self.token(HostToken::End)
    }

    fn class(&mut self, decl: &ClassDecl) -> io::Result<()> {
        self.token(HostToken::Class)?;
        self.space()?;
        self.decl_name(decl.anonymous, decl.name.as_deref(), decl.host_name.as_deref())?;
        let mut superclasses = decl.superclasses().peekable();
        if superclasses.peek().is_some() {
            self.spaced(HostToken::From)?;
            for (index, name) in superclasses.enumerate() {
                if index > 0 {
                    self.space()?;
                }
                self.text(&host_identifier(name))?;
            }
        }
        self.newline()?;

        self.indented(|this| {
            let mut attributes = decl.attributes().peekable();
            if attributes.peek().is_some() {
                this.token(HostToken::Attr)?;
                for attr in attributes {
                    this.space()?;
                    this.text(&this.atom(&attr.name))?;
                    if let Some(default) = &attr.default {
                        this.token(HostToken::Colon)?;
                        this.operand(default)?;
                    }
                }
                this.newline()?;
            }
            for method in &decl.methods {
                this.method(method)?;
            }
            Ok(())
        })?;
        self.token(HostToken::End)
    }

    /// `meth label(Arg... $)`; a function-shaped method hands its result
    /// back through `$`.
    fn method(&mut self, method: &MethodDecl) -> io::Result<()> {
        self.token(HostToken::Meth)?;
        self.space()?;
        self.text(&self.atom(&method.name))?;
        let returns_value = method.shape == MethodShape::Function;
        if !method.args.is_empty() || returns_value {
            self.token(HostToken::LParen)?;
            for (index, arg) in method.args.iter().enumerate() {
                if index > 0 {
                    self.space()?;
                }
                self.text(&host_identifier(&arg.name))?;
            }
            if returns_value {
                if !method.args.is_empty() {
                    self.space()?;
                }
                self.token(HostToken::Placeholder)?;
            }
            self.token(HostToken::RParen)?;
        }
        self.newline()?;
        self.body_lines(&method.body)?;
        self.token(HostToken::End)?;
        self.newline()
    }

    fn functor(&mut self, decl: &FunctorDecl) -> io::Result<()> {
        self.token(HostToken::Functor)?;
        self.space()?;
        self.decl_name(decl.anonymous, decl.name.as_deref(), decl.host_name.as_deref())?;
        self.newline()?;

        if !decl.imports.is_empty() {
            self.token(HostToken::Import)?;
            for import in &decl.imports {
                self.space()?;
                self.text(&host_identifier(&import.name))?;
            }
            self.newline()?;
        }
        let exports = decl.exports();
        if !exports.is_empty() {
            self.token(HostToken::Export)?;
            for (label, name) in exports {
                self.space()?;
                self.text(&self.atom(label))?;
                self.token(HostToken::Colon)?;
                self.text(&host_identifier(name))?;
            }
            self.newline()?;
        }

        self.token(HostToken::Define)?;
        self.newline()?;
        let body = &decl.body;
        if !body.has_declarations() && body.stmts.is_empty() {
            self.indented(|this| {
                this.token(HostToken::Skip)?;
                this.newline()
            })?;
        }
        self.indented(|this| this.decl_lines(&body.decls))?;
        if !body.stmts.is_empty() {
            self.token(HostToken::In)?;
            self.newline()?;
            self.indented(|this| this.stmt_lines(&body.stmts))?;
        }
        self.token(HostToken::End)
    }
}
