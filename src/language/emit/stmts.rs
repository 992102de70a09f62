use super::*;
use crate::language::types::Type;

impl<W: Write> Printer<'_, '_, W> {
    /// One statement per line; an empty list is `skip`.
    pub(super) fn stmt_lines(&mut self, stmts: &[Stmt]) -> io::Result<()> {
        self.stmt_sequence(stmts)?;
        self.newline()
    }

    /// Like [`Self::stmt_lines`] without the final line break.
    pub(super) fn stmt_sequence(&mut self, stmts: &[Stmt]) -> io::Result<()> {
        if stmts.is_empty() {
            return self.token(HostToken::Skip);
        }
        for (index, stmt) in stmts.iter().enumerate() {
            if index > 0 {
                self.newline()?;
            }
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> io::Result<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                if stmt.discard {
                    self.token(HostToken::Unbound)?;
                    self.spaced(HostToken::Bind)?;
                    return self.operand(expr);
                }
                self.expr(expr)
            }
            StmtKind::Assign(assign) => self.assign(assign),
            StmtKind::If(node) => self.if_node(node),
            StmtKind::Case(node) => self.case_node(node),
            StmtKind::For(node) => self.for_loop(node),
            StmtKind::Block(block) if block.has_declarations() => {
                self.token(HostToken::Local)?;
                self.newline()?;
                self.indented(|this| this.decl_lines(&block.decls))?;
                self.token(HostToken::In)?;
                self.newline()?;
                self.indented(|this| this.stmt_lines(&block.stmts))?;
                self.token(HostToken::End)
            }
            StmtKind::Block(block) => self.stmt_sequence(&block.stmts),
            StmtKind::Skip => self.token(HostToken::Skip),
        }
    }

    /// Cells take `:=`, constants unify with `=`. `+=`/`-=` read the cell
    /// on the right-hand side.
    fn assign(&mut self, assign: &Assign) -> io::Result<()> {
        let AssignTarget::Variable(target) = &assign.target else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("line {}: assignment target is not a variable", assign.line),
            ));
        };
        let name = match target.binding {
            BindingKind::Attribute => self.atom(&target.name),
            BindingKind::Local | BindingKind::Import => host_identifier(&target.name),
        };
        self.text(&name)?;
        let mutable = target.mutability.is_mutable();
        self.spaced(if mutable {
            HostToken::CellAssign
        } else {
            HostToken::Bind
        })?;

        if assign.op == AssignOp::Set {
            return self.assign_value(&assign.value);
        }
        let value_type = match &assign.value {
            AssignValue::Plain(expr) => expr.resolved_type(),
            AssignValue::Anonymous(_) => Type::Any,
        };
        let appends = assign.op == AssignOp::Add
            && [target.ty.unwrap_or(Type::Any), value_type]
                .iter()
                .any(|ty| matches!(ty, Type::String | Type::List));
        if appends {
            self.token(HostToken::LBrace)?;
            self.token(HostToken::Append)?;
            self.space()?;
        } else {
            self.token(HostToken::LParen)?;
        }
        self.token(HostToken::Deref)?;
        self.text(&name)?;
        if appends {
            self.space()?;
        } else {
            self.spaced(if assign.op == AssignOp::Add {
                HostToken::Plus
            } else {
                HostToken::Minus
            })?;
        }
        match &assign.value {
            AssignValue::Plain(expr) => self.operand(expr)?,
            AssignValue::Anonymous(literal) => self.anonymous(&literal.decl)?,
        }
        self.token(if appends {
            HostToken::RBrace
        } else {
            HostToken::RParen
        })
    }

    pub(super) fn if_node(&mut self, node: &IfNode) -> io::Result<()> {
        for (index, branch) in node.branches.iter().enumerate() {
            self.token(if index == 0 {
                HostToken::If
            } else {
                HostToken::ElseIf
            })?;
            self.space()?;
            self.expr(&branch.condition)?;
            self.space()?;
            self.token(HostToken::Then)?;
            self.nested_block(&branch.body)?;
        }
        if let Some(default) = &node.default {
            self.token(HostToken::Else)?;
            self.nested_block(default)?;
        }
        self.token(HostToken::End)
    }

    /// The first clause is introduced by `of`, every later one by `[]`.
    pub(super) fn case_node(&mut self, node: &CaseNode) -> io::Result<()> {
        self.token(HostToken::Case)?;
        self.space()?;
        self.expr(&node.scrutinee)?;
        for (index, clause) in node.clauses.iter().enumerate() {
            if index == 0 {
                self.space()?;
                self.token(HostToken::Of)?;
            } else {
                self.token(HostToken::ClauseSeparator)?;
            }
            self.space()?;
            self.pattern(&clause.pattern)?;
            if let Some(guard) = &clause.guard {
                self.spaced(HostToken::AndThen)?;
                self.expr(guard)?;
            }
            self.space()?;
            self.token(HostToken::Then)?;
            self.nested_block(&clause.body)?;
        }
        if let Some(default) = &node.default {
            self.token(HostToken::Else)?;
            self.nested_block(default)?;
        }
        self.token(HostToken::End)
    }

    fn for_loop(&mut self, node: &ForLoop) -> io::Result<()> {
        self.token(HostToken::For)?;
        self.space()?;
        self.text(&host_identifier(&node.iterator.name))?;
        self.spaced(HostToken::In)?;
        match &node.form {
            LoopForm::Numeric(numeric) => {
                self.operand(&numeric.init)?;
                match &numeric.bound {
                    LoopBound::UpTo(end) => {
                        self.token(HostToken::DotDot)?;
                        self.operand(end)?;
                        if let Some(step) = &numeric.step {
                            self.token(HostToken::Semi)?;
                            self.operand(step)?;
                        }
                    }
                    LoopBound::While(condition) => {
                        self.token(HostToken::Semi)?;
                        self.expr(condition)?;
                        if let Some(step) = &numeric.step {
                            self.token(HostToken::Semi)?;
                            self.expr(step)?;
                        }
                    }
                }
            }
            LoopForm::Generator(list) => self.expr(list)?,
        }
        self.space()?;
        self.token(HostToken::Do)?;
        self.nested_block(&node.body)?;
        self.token(HostToken::End)
    }

    fn pattern(&mut self, pattern: &Pattern) -> io::Result<()> {
        match &pattern.kind {
            PatternKind::Wildcard => self.token(HostToken::Unbound),
            PatternKind::Bind(variable) => self.text(&host_identifier(&variable.name)),
            PatternKind::Literal(literal) => self.literal(literal),
            PatternKind::List(items) if items.is_empty() => self.token(HostToken::Nil),
            PatternKind::List(items) => {
                self.token(HostToken::LBracket)?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.space()?;
                    }
                    self.pattern(item)?;
                }
                self.token(HostToken::RBracket)
            }
            PatternKind::Cons(head, tail) => {
                if matches!(head.kind, PatternKind::Cons(..)) {
                    self.token(HostToken::LParen)?;
                    self.pattern(head)?;
                    self.token(HostToken::RParen)?;
                } else {
                    self.pattern(head)?;
                }
                self.token(HostToken::Pipe)?;
                self.pattern(tail)
            }
            PatternKind::Record { label, fields } => {
                self.text(&self.atom(label))?;
                if fields.is_empty() {
                    return Ok(());
                }
                self.token(HostToken::LParen)?;
                for (index, (feature, value)) in fields.iter().enumerate() {
                    if index > 0 {
                        self.space()?;
                    }
                    self.text(&self.atom(feature))?;
                    self.token(HostToken::Colon)?;
                    self.pattern(value)?;
                }
                self.token(HostToken::RParen)
            }
        }
    }
}
