use super::*;
use crate::language::types::Type;

/// Host atom: bare when it reads as one, quoted otherwise.
fn atom(name: &str, table: &TokenTable) -> String {
    let mut chars = name.chars();
    let bare = chars.next().is_some_and(|first| first.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.is_reserved(name);
    if bare {
        return name.to_string();
    }
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('\'');
    for c in name.chars() {
        match c {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn char_literal(value: char) -> String {
    match value {
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\\' => "\\\\".to_string(),
        c if c.is_ascii_graphic() || (!c.is_ascii() && !c.is_whitespace()) => c.to_string(),
        c => format!("\\{:03o}", u32::from(c)),
    }
}

/// Host floats always carry a decimal point.
fn float_digits(value: f64) -> String {
    let digits = value.to_string();
    if digits.bytes().all(|b| b.is_ascii_digit()) {
        format!("{digits}.0")
    } else {
        digits
    }
}

impl<W: Write> Printer<'_, '_, W> {
    pub(super) fn atom(&self, name: &str) -> String {
        atom(name, self.out.table())
    }

    pub(super) fn expr(&mut self, expr: &Expr) -> io::Result<()> {
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal),
            ExprKind::Variable(variable) => self.variable(variable),
            ExprKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => {
                self.token(HostToken::Negate)?;
                self.operand(operand)
            }
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => self.apply(HostToken::Not, [operand.as_ref()]),
            ExprKind::Concat { lhs, rhs } => {
                self.apply(HostToken::Append, [lhs.as_ref(), rhs.as_ref()])
            }
            ExprKind::Call(call) => self.call(call),
            ExprKind::MethodCall(call) => self.method_call(call),
            ExprKind::New(new) => {
                self.token(HostToken::LBrace)?;
                self.token(HostToken::New)?;
                self.space()?;
                self.variable(&new.class)?;
                self.space()?;
                self.message(&new.method, &new.args, false)?;
                self.token(HostToken::RBrace)
            }
            ExprKind::List(items) if items.is_empty() => self.token(HostToken::Nil),
            ExprKind::List(items) => {
                self.token(HostToken::LBracket)?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.space()?;
                    }
                    self.operand(item)?;
                }
                self.token(HostToken::RBracket)
            }
            ExprKind::Cons { head, tail } => {
                self.operand(head)?;
                self.token(HostToken::Pipe)?;
                match tail.kind {
                    ExprKind::Cons { .. } => self.expr(tail),
                    _ => self.operand(tail),
                }
            }
            ExprKind::Record { label, fields } => {
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
                    self.operand(value)?;
                }
                self.token(HostToken::RParen)
            }
            ExprKind::Field { target, field } => {
                self.operand(target)?;
                self.token(HostToken::Dot)?;
                self.text(&self.atom(field))
            }
            ExprKind::Block(block) => self.block_expr(block),
            ExprKind::If(node) => self.if_node(node),
            ExprKind::Case(node) => self.case_node(node),
            ExprKind::Anonymous(literal) => self.anonymous(&literal.decl),
        }
    }

    /// An expression nested inside another one; compound forms get
    /// parentheses.
    pub(super) fn operand(&mut self, expr: &Expr) -> io::Result<()> {
        let wrap = match &expr.kind {
            ExprKind::Binary { .. } | ExprKind::Cons { .. } => true,
            ExprKind::Unary { op, .. } => *op == UnaryOp::Neg,
            ExprKind::MethodCall(call) => matches!(call.receiver, Receiver::Super(_)),
            _ => false,
        };
        if wrap {
            self.token(HostToken::LParen)?;
            self.expr(expr)?;
            self.token(HostToken::RParen)
        } else {
            self.expr(expr)
        }
    }

    pub(super) fn literal(&mut self, literal: &Literal) -> io::Result<()> {
        match literal {
            Literal::Int(value) => {
                if *value < 0 {
                    self.token(HostToken::Negate)?;
                }
                self.text(&value.unsigned_abs().to_string())
            }
            Literal::Float(value) => {
                if value.is_sign_negative() {
                    self.token(HostToken::Negate)?;
                }
                self.text(&float_digits(value.abs()))
            }
            Literal::Str(value) => self.text(&string_literal(value)),
            Literal::Char(value) => {
                self.token(HostToken::CharPrefix)?;
                self.text(&char_literal(*value))
            }
            Literal::Atom(name) => self.text(&self.atom(name)),
            Literal::Bool(true) => self.token(HostToken::True),
            Literal::Bool(false) => self.token(HostToken::False),
            Literal::Nil => self.token(HostToken::Nil),
            Literal::Unit => self.token(HostToken::Unit),
            Literal::Underscore => self.token(HostToken::Unbound),
        }
    }

    /// Cells and attributes are read through `@`.
    fn variable(&mut self, variable: &Variable) -> io::Result<()> {
        if variable.mutability.is_mutable() && !variable.is_binding() {
            self.token(HostToken::Deref)?;
        }
        match variable.binding {
            BindingKind::Attribute => self.text(&self.atom(&variable.name)),
            BindingKind::Local | BindingKind::Import => self.text(&host_identifier(&variable.name)),
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> io::Result<()> {
        let token = match op {
            BinaryOp::Add => HostToken::Plus,
            BinaryOp::Sub => HostToken::Minus,
            BinaryOp::Mul => HostToken::Times,
            BinaryOp::Div if is_float_division(lhs, rhs) => HostToken::FloatDiv,
            BinaryOp::Div => HostToken::IntDiv,
            BinaryOp::Mod => HostToken::Mod,
            BinaryOp::Eq => HostToken::Eq,
            BinaryOp::Ne => HostToken::Ne,
            BinaryOp::Lt => HostToken::Lt,
            BinaryOp::Le => HostToken::Le,
            BinaryOp::Gt => HostToken::Gt,
            BinaryOp::Ge => HostToken::Ge,
            BinaryOp::AndThen => HostToken::AndThen,
            BinaryOp::OrElse => HostToken::OrElse,
        };
        self.operand(lhs)?;
        self.spaced(token)?;
        self.operand(rhs)
    }

    /// `{Builtin Arg...}` for a host procedure named by a token.
    fn apply<'x>(
        &mut self,
        callee: HostToken,
        args: impl IntoIterator<Item = &'x Expr>,
    ) -> io::Result<()> {
        self.token(HostToken::LBrace)?;
        self.token(callee)?;
        for arg in args {
            self.space()?;
            self.operand(arg)?;
        }
        self.token(HostToken::RBrace)
    }

    fn call(&mut self, call: &Call) -> io::Result<()> {
        self.token(HostToken::LBrace)?;
        match (&call.callee, &call.resolved) {
            (Callee::Dotted { module, member }, _) => {
                self.variable(module)?;
                self.token(HostToken::Dot)?;
                self.text(&self.atom(member))?;
            }
            (Callee::Named(_), Some(resolved)) => {
                if resolved.cell {
                    self.token(HostToken::Deref)?;
                }
                self.text(&resolved.host_name)?;
            }
            (Callee::Named(name), None) => self.text(&host_identifier(name))?,
        }
        for arg in &call.args {
            self.space()?;
            self.operand(arg)?;
        }
        self.token(HostToken::RBrace)
    }

    fn method_call(&mut self, call: &MethodCall) -> io::Result<()> {
        let returns_value = call.returns_value.unwrap_or(false);
        match &call.receiver {
            Receiver::This => {
                self.token(HostToken::LBrace)?;
                self.token(HostToken::SelfObject)?;
                self.space()?;
                self.message(&call.method, &call.args, returns_value)?;
                self.token(HostToken::RBrace)
            }
            Receiver::Super(base) => {
                self.text(&host_identifier(base))?;
                self.token(HostToken::Comma)?;
                self.space()?;
                self.message(&call.method, &call.args, returns_value)
            }
            Receiver::Object(object) => {
                self.token(HostToken::LBrace)?;
                self.operand(object)?;
                self.space()?;
                self.message(&call.method, &call.args, returns_value)?;
                self.token(HostToken::RBrace)
            }
        }
    }

    /// `label(Arg... $)`, or the bare label when there is nothing to pass.
    fn message(&mut self, method: &str, args: &[Expr], returns_value: bool) -> io::Result<()> {
        self.text(&self.atom(method))?;
        if args.is_empty() && !returns_value {
            return Ok(());
        }
        self.token(HostToken::LParen)?;
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                self.space()?;
            }
            self.operand(arg)?;
        }
        if returns_value {
            if !args.is_empty() {
                self.space()?;
            }
            self.token(HostToken::Placeholder)?;
        }
        self.token(HostToken::RParen)
    }

    /// A block used as a value. Without declarations a single statement
    /// stands for itself and a longer sequence is parenthesized.
    fn block_expr(&mut self, block: &Block) -> io::Result<()> {
        if block.has_declarations() {
            self.token(HostToken::Local)?;
            self.newline()?;
            self.indented(|this| this.decl_lines(&block.decls))?;
            self.token(HostToken::In)?;
            self.newline()?;
            self.indented(|this| this.stmt_lines(&block.stmts))?;
            return self.token(HostToken::End);
        }
        if block.stmts.len() <= 1 {
            return self.stmt_sequence(&block.stmts);
        }
        self.token(HostToken::LParen)?;
        self.newline()?;
        self.indented(|this| this.stmt_lines(&block.stmts))?;
        self.token(HostToken::RParen)
    }
}

fn is_float_division(lhs: &Expr, rhs: &Expr) -> bool {
    lhs.resolved_type() == Type::Float || rhs.resolved_type() == Type::Float
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_are_quoted_when_needed() {
        let table = TokenTable::oz();
        assert_eq!(atom("point", &table), "point");
        assert_eq!(atom("Point", &table), "'Point'");
        assert_eq!(atom("end", &table), "'end'");
        assert_eq!(atom("it's", &table), "'it\\'s'");
    }

    #[test]
    fn quoting_follows_the_table() {
        let table = TokenTable::oz().with(HostToken::Skip, "pass");
        assert_eq!(atom("pass", &table), "'pass'");
        assert_eq!(atom("skip", &table), "skip");
    }

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(float_digits(1.5), "1.5");
        assert_eq!(float_digits(2.0), "2.0");
        assert!(float_digits(1e300).ends_with(".0"));
    }

    #[test]
    fn control_characters_use_octal_escapes() {
        assert_eq!(char_literal('a'), "a");
        assert_eq!(char_literal('\n'), "\\n");
        assert_eq!(char_literal(' '), "\\040");
    }
}
