use crate::language::{
    ast::*,
    errors::{SyntaxError, SyntaxErrors},
    token::{Token, TokenKind},
};

pub fn parse(tokens: &[Token]) -> Result<Program, SyntaxErrors> {
    let mut parser = AstParser::new(tokens);
    let program = parser.parse_program();
    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(SyntaxErrors::new(parser.errors))
    }
}

struct AstParser<'a> {
    tokens: &'a [Token],
    position: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> AstParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            errors: Vec::new(),
        }
    }

    fn parse_program(&mut self) -> Program {
        let line = self.line();
        let kind = if self.eat(&TokenKind::Declare) {
            ProgramKind::Declare
        } else {
            ProgramKind::Statements
        };
        let body = self.parse_body(line);
        if !self.check(&TokenKind::Eof) {
            let err = self
                .error(format!(
                    "unexpected {} at top level",
                    self.peek().describe()
                ))
                .with_help("every `end` must close an open `local`, `fun`, `if`, `case`, `for` or `class`");
            self.report_error(err);
        }
        Program { kind, body }
    }

    /// `decl* [in] stmt*`, stopping at whatever closes the enclosing form.
    fn parse_body(&mut self, line: usize) -> Block {
        let mut decls = Vec::new();
        while self.at_declaration() {
            match self.parse_decl() {
                Ok(decl) => decls.push(decl),
                Err(err) => {
                    self.report_error(err);
                    self.synchronize();
                }
            }
        }
        self.eat(&TokenKind::In);

        let mut stmts = Vec::new();
        while !self.at_body_end() {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.report_error(err);
                    self.synchronize();
                }
            }
        }
        Block::new(decls, stmts, line)
    }

    fn at_declaration(&self) -> bool {
        match self.peek() {
            TokenKind::Fun | TokenKind::Proc => {
                !(self.peek_at(1) == &TokenKind::LBrace && self.peek_at(2) == &TokenKind::Dollar)
            }
            TokenKind::Class | TokenKind::Functor => self.peek_at(1) != &TokenKind::Dollar,
            kind => kind.starts_declaration(),
        }
    }

    fn at_body_end(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::End
                | TokenKind::Else
                | TokenKind::ElseIf
                | TokenKind::Of
                | TokenKind::Eof
        )
    }

    fn parse_decl(&mut self) -> Result<Decl, SyntaxError> {
        let line = self.line();
        let mut label = None;
        let exported = self.eat(&TokenKind::Export);
        if exported {
            if let TokenKind::Identifier(name) = self.peek() {
                label = Some(name.clone());
                self.advance();
            }
        }

        let kind = match self.peek() {
            TokenKind::Val | TokenKind::Var => DeclKind::Variable(self.parse_var_decl()?),
            TokenKind::Fun => {
                self.advance();
                let (name, args) = self.parse_callable_head("fun")?;
                let body = self.parse_body(line);
                self.consume_with_hint(
                    &TokenKind::End,
                    "expected `end` to close `fun`",
                    Some(format!("close the body of `{name}` with `end`")),
                )?;
                DeclKind::Function(FunctionDecl::new(Some(name), args, body, line))
            }
            TokenKind::Proc => {
                self.advance();
                let (name, args) = self.parse_callable_head("proc")?;
                let body = self.parse_body(line);
                self.consume_with_hint(
                    &TokenKind::End,
                    "expected `end` to close `proc`",
                    Some(format!("close the body of `{name}` with `end`")),
                )?;
                DeclKind::Procedure(ProcedureDecl::new(Some(name), args, body, line))
            }
            TokenKind::Class => {
                self.advance();
                let name = self.expect_identifier("expected a class name after `class`")?;
                DeclKind::Class(self.parse_class_rest(Some(name), line)?)
            }
            TokenKind::Functor => {
                self.advance();
                let name = self.expect_identifier("expected a functor name after `functor`")?;
                DeclKind::Functor(self.parse_functor_rest(Some(name), line)?)
            }
            other => {
                return Err(self
                    .error(format!("expected a declaration, found {}", other.describe()))
                    .with_help("declarations start with `val`, `var`, `fun`, `proc`, `class` or `functor`"));
            }
        };

        let mut decl = Decl::new(kind, line);
        if exported {
            let alias = label.or_else(|| decl.name().map(str::to_string));
            if let Some(alias) = alias {
                decl = decl.exported_as(alias);
            }
        }
        Ok(decl)
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, SyntaxError> {
        let line = self.line();
        let mutability = if self.eat(&TokenKind::Var) {
            Mutability::Mutable
        } else {
            self.advance();
            Mutability::Immutable
        };
        let name = self.expect_identifier("expected a variable name")?;
        let init = if self.eat(&TokenKind::Eq) {
            Some(AssignValue::from_expr(self.parse_expression()?))
        } else {
            None
        };
        Ok(VarDecl::new(Variable::binding(name, mutability, line), init))
    }

    /// `{Name Arg*}` after `fun`/`proc`.
    fn parse_callable_head(&mut self, keyword: &str) -> Result<(String, Vec<Variable>), SyntaxError> {
        self.consume_with_hint(
            &TokenKind::LBrace,
            &format!("expected `{{` after `{keyword}`"),
            Some(format!("Syntax: {keyword} {{Name Arg1 Arg2}} ... end")),
        )?;
        let name = self.expect_identifier(&format!("expected a name in `{keyword}` head"))?;
        let args = self.parse_arguments(&TokenKind::RBrace)?;
        Ok((name, args))
    }

    /// Binding identifiers up to and including `close`.
    fn parse_arguments(&mut self, close: &TokenKind) -> Result<Vec<Variable>, SyntaxError> {
        let mut args = Vec::new();
        while !self.check(close) {
            let line = self.line();
            let name = self.expect_identifier("expected an argument name")?;
            args.push(Variable::binding(name, Mutability::Immutable, line));
            self.eat(&TokenKind::Comma);
        }
        self.advance();
        Ok(args)
    }

    fn parse_class_rest(&mut self, name: Option<String>, line: usize) -> Result<ClassDecl, SyntaxError> {
        let mut descriptors = Vec::new();
        let mut methods = Vec::new();
        loop {
            let item_line = self.line();
            match self.peek() {
                TokenKind::Extends => {
                    self.advance();
                    let names = self.parse_identifier_list("expected a superclass name after `extends`")?;
                    descriptors.push(ClassDescriptor::Extends {
                        names,
                        line: item_line,
                    });
                }
                TokenKind::Attr => {
                    self.advance();
                    let mut attrs = Vec::new();
                    while let TokenKind::Identifier(attr) = self.peek() {
                        let attr = attr.clone();
                        let attr_line = self.line();
                        self.advance();
                        let default = if self.eat(&TokenKind::Colon) {
                            Some(self.parse_expression()?)
                        } else {
                            None
                        };
                        attrs.push(Attribute {
                            name: attr,
                            default,
                            line: attr_line,
                        });
                        self.eat(&TokenKind::Comma);
                    }
                    if attrs.is_empty() {
                        return Err(self.error("expected an attribute name after `attr`"));
                    }
                    descriptors.push(ClassDescriptor::Attributes {
                        attrs,
                        line: item_line,
                    });
                }
                TokenKind::Prop => {
                    self.advance();
                    let names = self.parse_identifier_list("expected a property after `prop`")?;
                    descriptors.push(ClassDescriptor::Properties {
                        names,
                        line: item_line,
                    });
                }
                TokenKind::Feat => {
                    self.advance();
                    let names = self.parse_identifier_list("expected a feature after `feat`")?;
                    descriptors.push(ClassDescriptor::Features {
                        names,
                        line: item_line,
                    });
                }
                TokenKind::Meth => methods.push(self.parse_method()?),
                TokenKind::End => {
                    self.advance();
                    break;
                }
                other => {
                    return Err(self
                        .error(format!("unexpected {} in class body", other.describe()))
                        .with_help("a class body holds `extends`, `attr`, `meth ... end` and a closing `end`"));
                }
            }
        }
        Ok(ClassDecl::new(name, descriptors, methods, line))
    }

    fn parse_identifier_list(&mut self, message: &str) -> Result<Vec<String>, SyntaxError> {
        let mut names = vec![self.expect_identifier(message)?];
        loop {
            self.eat(&TokenKind::Comma);
            match self.peek() {
                TokenKind::Identifier(name) => {
                    names.push(name.clone());
                    self.advance();
                }
                _ => return Ok(names),
            }
        }
    }

    fn parse_method(&mut self) -> Result<MethodDecl, SyntaxError> {
        let line = self.line();
        self.advance();
        let name = self.expect_identifier("expected a method name after `meth`")?;
        self.consume_with_hint(
            &TokenKind::LParen,
            "expected `(` after the method name",
            Some(format!("Syntax: meth {name}(Arg1 Arg2) ... end")),
        )?;
        let args = self.parse_arguments(&TokenKind::RParen)?;
        let shape = if self.eat(&TokenKind::FatArrow) {
            MethodShape::Function
        } else {
            MethodShape::Procedure
        };
        let body = self.parse_body(line);
        self.consume(&TokenKind::End, "expected `end` to close `meth`")?;
        Ok(MethodDecl::new(name, args, shape, body, line))
    }

    fn parse_functor_rest(&mut self, name: Option<String>, line: usize) -> Result<FunctorDecl, SyntaxError> {
        let mut imports = Vec::new();
        if self.eat(&TokenKind::Import) {
            while let TokenKind::Identifier(module) = self.peek() {
                imports.push(Variable::binding(module.clone(), Mutability::Immutable, self.line()));
                self.advance();
                self.eat(&TokenKind::Comma);
            }
        }
        self.consume_with_hint(
            &TokenKind::Define,
            "expected `define` in functor",
            Some("Syntax: functor Name import M define ... end".into()),
        )?;
        let body = self.parse_body(line);
        self.consume(&TokenKind::End, "expected `end` to close `functor`")?;
        Ok(FunctorDecl::new(name, imports, body, line))
    }

    fn parse_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.line();
        let kind = match self.peek() {
            TokenKind::Skip => {
                self.advance();
                StmtKind::Skip
            }
            TokenKind::If => StmtKind::If(self.parse_if()?),
            TokenKind::Case => StmtKind::Case(self.parse_case()?),
            TokenKind::For => StmtKind::For(self.parse_for()?),
            TokenKind::Local => StmtKind::Block(self.parse_local()?),
            kind if kind.starts_declaration() && self.at_declaration() => {
                return Err(self
                    .error("declarations must come before statements")
                    .with_help("move the declaration above the first statement, or open a new `local ... end`"));
            }
            TokenKind::In => {
                return Err(self.error("unexpected `in` after statements"));
            }
            _ => {
                let target = self.parse_expression()?;
                let op = match self.peek() {
                    TokenKind::Eq => Some(AssignOp::Set),
                    TokenKind::PlusEq => Some(AssignOp::Add),
                    TokenKind::MinusEq => Some(AssignOp::Sub),
                    _ => None,
                };
                match op {
                    Some(op) => {
                        self.advance();
                        let value = AssignValue::from_expr(self.parse_expression()?);
                        StmtKind::Assign(Assign::new(target, op, value, line))
                    }
                    None => StmtKind::Expr(target),
                }
            }
        };
        Ok(Stmt::new(kind, line))
    }

    fn parse_local(&mut self) -> Result<Block, SyntaxError> {
        let line = self.line();
        self.advance();
        let block = self.parse_body(line);
        self.consume(&TokenKind::End, "expected `end` to close `local`")?;
        Ok(block)
    }

    fn parse_if(&mut self) -> Result<IfNode, SyntaxError> {
        let line = self.line();
        self.advance();
        let mut branches = Vec::new();
        loop {
            let condition = self.parse_expression()?;
            self.consume(&TokenKind::Then, "expected `then` after the condition")?;
            let body = self.parse_body(condition.line);
            branches.push(IfBranch { condition, body });
            if !self.eat(&TokenKind::ElseIf) {
                break;
            }
        }
        let default = self.parse_else()?;
        self.consume(&TokenKind::End, "expected `end` to close `if`")?;
        Ok(IfNode {
            branches,
            default,
            line,
            ty: None,
        })
    }

    fn parse_else(&mut self) -> Result<Option<Block>, SyntaxError> {
        let line = self.line();
        if self.eat(&TokenKind::Else) {
            Ok(Some(self.parse_body(line)))
        } else {
            Ok(None)
        }
    }

    fn parse_case(&mut self) -> Result<CaseNode, SyntaxError> {
        let line = self.line();
        self.advance();
        let scrutinee = self.parse_expression()?;
        let mut clauses = Vec::new();
        while self.check(&TokenKind::Of) {
            let clause_line = self.line();
            self.advance();
            let pattern = self.parse_pattern()?;
            let guard = if self.eat(&TokenKind::When) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.consume(&TokenKind::Then, "expected `then` after the pattern")?;
            let body = self.parse_body(clause_line);
            clauses.push(Clause {
                pattern,
                guard,
                body,
                line: clause_line,
                scope: None,
            });
        }
        let default = self.parse_else()?;
        self.consume_with_hint(
            &TokenKind::End,
            "expected `end` to close `case`",
            Some("every clause starts with `of`".into()),
        )?;
        Ok(CaseNode {
            scrutinee,
            clauses,
            default,
            line,
            ty: None,
        })
    }

    fn parse_for(&mut self) -> Result<ForLoop, SyntaxError> {
        let line = self.line();
        self.advance();
        let iterator_line = self.line();
        let name = self.expect_identifier("expected a loop variable after `for`")?;
        self.consume(&TokenKind::In, "expected `in` after the loop variable")?;
        let init = self.parse_expression()?;
        let form = if self.eat(&TokenKind::DotDot) {
            let end = self.parse_expression()?;
            let step = if self.eat(&TokenKind::Semi) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            LoopForm::Numeric(NumericLoop {
                init,
                bound: LoopBound::UpTo(end),
                step,
            })
        } else if self.eat(&TokenKind::Semi) {
            let condition = self.parse_expression()?;
            let step = if self.eat(&TokenKind::Semi) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            LoopForm::Numeric(NumericLoop {
                init,
                bound: LoopBound::While(condition),
                step,
            })
        } else {
            LoopForm::Generator(init)
        };
        self.consume_with_hint(
            &TokenKind::Do,
            "expected `do` before the loop body",
            Some("Syntax: for I in 1..10 do ... end".into()),
        )?;
        let body = self.parse_body(line);
        self.consume(&TokenKind::End, "expected `end` to close `for`")?;
        Ok(ForLoop {
            iterator: Variable::binding(name, Mutability::Immutable, iterator_line),
            form,
            body,
            line,
            scope: None,
        })
    }

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_orelse()
    }

    fn parse_orelse(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_andthen()?;
        while self.check(&TokenKind::OrElse) {
            self.advance();
            let rhs = self.parse_andthen()?;
            expr = binary(BinaryOp::OrElse, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_andthen(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_comparison()?;
        while self.check(&TokenKind::AndThen) {
            self.advance();
            let rhs = self.parse_comparison()?;
            expr = binary(BinaryOp::AndThen, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_cons()?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => return Ok(expr),
            };
            self.advance();
            let rhs = self.parse_cons()?;
            expr = binary(op, expr, rhs);
        }
    }

    fn parse_cons(&mut self) -> Result<Expr, SyntaxError> {
        let head = self.parse_additive()?;
        if !self.eat(&TokenKind::Pipe) {
            return Ok(head);
        }
        let tail = self.parse_cons()?;
        let line = head.line;
        Ok(Expr::new(
            ExprKind::Cons {
                head: Box::new(head),
                tail: Box::new(tail),
            },
            line,
        ))
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(expr),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            expr = binary(op, expr, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Mod => BinaryOp::Mod,
                _ => return Ok(expr),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            expr = binary(op, expr, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        while self.check(&TokenKind::Dot) {
            self.advance();
            let line = self.line();
            let member = self.expect_identifier("expected a field or method name after `.`")?;
            if self.eat(&TokenKind::LParen) {
                let args = self.parse_expressions_until(&TokenKind::RParen)?;
                expr = Expr::new(
                    ExprKind::MethodCall(MethodCall::new(
                        Receiver::Object(Box::new(expr)),
                        member,
                        args,
                    )),
                    line,
                );
            } else {
                expr = Expr::new(
                    ExprKind::Field {
                        target: Box::new(expr),
                        field: member,
                    },
                    line,
                );
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        if let Some(literal) = self.literal() {
            self.advance();
            return Ok(Expr::new(ExprKind::Literal(literal), line));
        }
        let kind = match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) && self.touches_previous() {
                    self.advance();
                    let fields = self.parse_record_fields(&name)?;
                    ExprKind::Record {
                        label: name,
                        fields,
                    }
                } else {
                    ExprKind::Variable(Variable::use_of(name, line))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(&TokenKind::RParen, "expected `)` to close the parenthesis")?;
                return Ok(inner);
            }
            TokenKind::LBracket => return self.parse_list(),
            TokenKind::LBrace => ExprKind::Call(self.parse_call()?),
            TokenKind::This => {
                self.advance();
                let (method, args) = self.parse_method_suffix()?;
                ExprKind::MethodCall(MethodCall::new(Receiver::This, method, args))
            }
            TokenKind::Super => {
                self.advance();
                self.consume_with_hint(
                    &TokenKind::LParen,
                    "expected `(` after `super`",
                    Some("Syntax: super(Base).method(Args)".into()),
                )?;
                let base = self.expect_identifier("expected a class name in `super(...)`")?;
                self.consume(&TokenKind::RParen, "expected `)` after the class name")?;
                let (method, args) = self.parse_method_suffix()?;
                ExprKind::MethodCall(MethodCall::new(Receiver::Super(base), method, args))
            }
            TokenKind::New => {
                self.advance();
                let class_line = self.line();
                let class = self.expect_identifier("expected a class name after `new`")?;
                let (method, args) = self.parse_method_suffix()?;
                ExprKind::New(NewObject {
                    class: Variable::use_of(class, class_line),
                    method,
                    args,
                })
            }
            TokenKind::Local => ExprKind::Block(Box::new(self.parse_local()?)),
            TokenKind::If => ExprKind::If(Box::new(self.parse_if()?)),
            TokenKind::Case => ExprKind::Case(Box::new(self.parse_case()?)),
            TokenKind::Fun | TokenKind::Proc | TokenKind::Class | TokenKind::Functor => {
                let decl = self.parse_anonymous()?;
                ExprKind::Anonymous(Box::new(AnonymousLiteral::new(decl, line)))
            }
            other => {
                return Err(self.error(format!("expected an expression, found {}", other.describe())));
            }
        };
        Ok(Expr::new(kind, line))
    }

    fn literal(&self) -> Option<Literal> {
        let literal = match self.peek() {
            TokenKind::Integer(value) => Literal::Int(*value),
            TokenKind::Float(value) => Literal::Float(*value),
            TokenKind::String(text) => Literal::Str(text.clone()),
            TokenKind::Char(ch) => Literal::Char(*ch),
            TokenKind::Atom(name) => Literal::Atom(name.clone()),
            TokenKind::True => Literal::Bool(true),
            TokenKind::False => Literal::Bool(false),
            TokenKind::Nil => Literal::Nil,
            TokenKind::Unit => Literal::Unit,
            TokenKind::Underscore => Literal::Underscore,
            _ => return None,
        };
        Some(literal)
    }

    /// `label: expr` pairs up to `)`; the `(` is already consumed.
    fn parse_record_fields(&mut self, label: &str) -> Result<Vec<(String, Expr)>, SyntaxError> {
        let mut fields = Vec::new();
        while !self.eat(&TokenKind::RParen) {
            let field = self.expect_identifier(&format!("expected a field name in record `{label}`"))?;
            self.consume_with_hint(
                &TokenKind::Colon,
                "expected `:` after the field name",
                Some(format!("Syntax: {label}({field}: Value)")),
            )?;
            fields.push((field, self.parse_expression()?));
            self.eat(&TokenKind::Comma);
        }
        Ok(fields)
    }

    /// `[a b c]` or `[a b | tail]`.
    fn parse_list(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        self.advance();
        let mut items = Vec::new();
        let mut tail = None;
        while !self.eat(&TokenKind::RBracket) {
            if self.check(&TokenKind::Eof) {
                return Err(self.error("expected `]` to close the list"));
            }
            if self.eat(&TokenKind::Pipe) {
                tail = Some(self.parse_expression()?);
                self.consume(&TokenKind::RBracket, "expected `]` after the list tail")?;
                break;
            }
            items.push(self.parse_additive()?);
            self.eat(&TokenKind::Comma);
        }
        let Some(tail) = tail else {
            return Ok(Expr::new(ExprKind::List(items), line));
        };
        Ok(items.into_iter().rev().fold(tail, |tail, head| {
            let line = head.line;
            Expr::new(
                ExprKind::Cons {
                    head: Box::new(head),
                    tail: Box::new(tail),
                },
                line,
            )
        }))
    }

    /// `{Name args}` or `{Module.member args}`.
    fn parse_call(&mut self) -> Result<Call, SyntaxError> {
        self.advance();
        let line = self.line();
        let name = self.expect_identifier("expected a callee name after `{`")?;
        let callee = if self.eat(&TokenKind::Dot) {
            let member = self.expect_identifier("expected a member name after `.`")?;
            Callee::Dotted {
                module: Variable::use_of(name, line),
                member,
            }
        } else {
            Callee::Named(name)
        };
        let args = self.parse_expressions_until(&TokenKind::RBrace)?;
        Ok(Call::new(callee, args))
    }

    /// `.method(args)` after `this`, `super(B)` or `new C`.
    fn parse_method_suffix(&mut self) -> Result<(String, Vec<Expr>), SyntaxError> {
        self.consume(&TokenKind::Dot, "expected `.` before the method name")?;
        let method = self.expect_identifier("expected a method name")?;
        self.consume(&TokenKind::LParen, "expected `(` after the method name")?;
        let args = self.parse_expressions_until(&TokenKind::RParen)?;
        Ok((method, args))
    }

    fn parse_expressions_until(&mut self, close: &TokenKind) -> Result<Vec<Expr>, SyntaxError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            if self.check(&TokenKind::Eof) {
                return Err(self.error(format!(
                    "expected `{}` before the end of input",
                    close.spelling().unwrap_or_default()
                )));
            }
            items.push(self.parse_expression()?);
            self.eat(&TokenKind::Comma);
        }
        Ok(items)
    }

    fn parse_anonymous(&mut self) -> Result<AnonymousDecl, SyntaxError> {
        let line = self.line();
        let keyword = self.advance().kind.clone();
        match keyword {
            TokenKind::Fun | TokenKind::Proc => {
                let spelled = keyword.spelling().unwrap_or_default();
                self.consume(&TokenKind::LBrace, &format!("expected `{{` after `{spelled}`"))?;
                self.consume_with_hint(
                    &TokenKind::Dollar,
                    "expected `$` in an anonymous head",
                    Some(format!("Syntax: {spelled} {{$ Arg1 Arg2}} ... end")),
                )?;
                let args = self.parse_arguments(&TokenKind::RBrace)?;
                let body = self.parse_body(line);
                self.consume(&TokenKind::End, &format!("expected `end` to close `{spelled}`"))?;
                Ok(if keyword == TokenKind::Fun {
                    AnonymousDecl::Function(FunctionDecl::new(None, args, body, line))
                } else {
                    AnonymousDecl::Procedure(ProcedureDecl::new(None, args, body, line))
                })
            }
            TokenKind::Class => {
                self.consume(&TokenKind::Dollar, "expected `$` after `class`")?;
                Ok(AnonymousDecl::Class(self.parse_class_rest(None, line)?))
            }
            _ => {
                self.consume(&TokenKind::Dollar, "expected `$` after `functor`")?;
                Ok(AnonymousDecl::Functor(self.parse_functor_rest(None, line)?))
            }
        }
    }

    fn parse_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        let head = self.parse_pattern_atom()?;
        if !self.eat(&TokenKind::Pipe) {
            return Ok(head);
        }
        let tail = self.parse_pattern()?;
        let line = head.line;
        Ok(Pattern::new(PatternKind::Cons(Box::new(head), Box::new(tail)), line))
    }

    fn parse_pattern_atom(&mut self) -> Result<Pattern, SyntaxError> {
        let line = self.line();
        if self.check(&TokenKind::Underscore) {
            self.advance();
            return Ok(Pattern::new(PatternKind::Wildcard, line));
        }
        if let Some(literal) = self.literal() {
            self.advance();
            return Ok(Pattern::new(PatternKind::Literal(literal), line));
        }
        let kind = match self.peek().clone() {
            TokenKind::Minus => {
                self.advance();
                match self.advance().kind.clone() {
                    TokenKind::Integer(value) => PatternKind::Literal(Literal::Int(-value)),
                    TokenKind::Float(value) => PatternKind::Literal(Literal::Float(-value)),
                    _ => return Err(self.error("expected a number after `-` in a pattern")),
                }
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) && self.touches_previous() {
                    self.advance();
                    let mut fields = Vec::new();
                    while !self.eat(&TokenKind::RParen) {
                        let field = self.expect_identifier(&format!(
                            "expected a field name in pattern `{name}`"
                        ))?;
                        self.consume(&TokenKind::Colon, "expected `:` after the field name")?;
                        fields.push((field, self.parse_pattern()?));
                        self.eat(&TokenKind::Comma);
                    }
                    PatternKind::Record {
                        label: name,
                        fields,
                    }
                } else {
                    PatternKind::Bind(Variable::binding(name, Mutability::Immutable, line))
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                let mut tail = None;
                while !self.eat(&TokenKind::RBracket) {
                    if self.eat(&TokenKind::Pipe) {
                        tail = Some(self.parse_pattern()?);
                        self.consume(&TokenKind::RBracket, "expected `]` after the list tail")?;
                        break;
                    }
                    if self.check(&TokenKind::Eof) {
                        return Err(self.error("expected `]` to close the list pattern"));
                    }
                    items.push(self.parse_pattern_atom()?);
                    self.eat(&TokenKind::Comma);
                }
                match tail {
                    Some(tail) => {
                        return Ok(items.into_iter().rev().fold(tail, |tail, head| {
                            let line = head.line;
                            Pattern::new(PatternKind::Cons(Box::new(head), Box::new(tail)), line)
                        }));
                    }
                    None => PatternKind::List(items),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_pattern()?;
                self.consume(&TokenKind::RParen, "expected `)` to close the pattern")?;
                return Ok(inner);
            }
            other => {
                return Err(self.error(format!("expected a pattern, found {}", other.describe())));
            }
        };
        Ok(Pattern::new(kind, line))
    }

    fn expect_identifier(&mut self, message: &str) -> Result<String, SyntaxError> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("{message}: found {}", other.describe()))),
        }
    }

    fn consume(&mut self, expected: &TokenKind, message: &str) -> Result<(), SyntaxError> {
        self.consume_with_hint(expected, message, None)
    }

    fn consume_with_hint(
        &mut self,
        expected: &TokenKind,
        message: &str,
        help: Option<String>,
    ) -> Result<(), SyntaxError> {
        if self.check(expected) {
            self.advance();
            return Ok(());
        }
        let mut err = self.error(format!("{message}: found {}", self.peek().describe()));
        err.help = help;
        Err(err)
    }

    fn current(&self) -> &'a Token {
        let index = self.position.min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    fn peek(&self) -> &'a TokenKind {
        &self.current().kind
    }

    fn peek_at(&self, ahead: usize) -> &'a TokenKind {
        let index = (self.position + ahead).min(self.tokens.len().saturating_sub(1));
        &self.tokens[index].kind
    }

    /// The current token starts right where the previous one ended;
    /// `point(x: 1)` is a record, `point (x)` is not.
    fn touches_previous(&self) -> bool {
        self.position
            .checked_sub(1)
            .and_then(|previous| self.tokens.get(previous))
            .is_some_and(|previous| previous.span.end == self.current().span.start)
    }

    fn line(&self) -> usize {
        self.current().line
    }

    /// Never moves past the trailing `Eof`.
    fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn check(&self, expected: &TokenKind) -> bool {
        self.peek() == expected
    }

    fn eat(&mut self, expected: &TokenKind) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        let token = self.current();
        SyntaxError::new(message, token.span, token.line)
    }

    fn report_error(&mut self, err: SyntaxError) {
        self.errors.push(err);
    }

    /// Skips to the next token that can start or close a body item.
    fn synchronize(&mut self) {
        if self.at_body_end() {
            return;
        }
        self.advance();
        while !self.at_body_end() {
            match self.peek() {
                TokenKind::Val
                | TokenKind::Var
                | TokenKind::Fun
                | TokenKind::Proc
                | TokenKind::Class
                | TokenKind::Functor
                | TokenKind::Export
                | TokenKind::If
                | TokenKind::Case
                | TokenKind::For
                | TokenKind::Local
                | TokenKind::Skip
                | TokenKind::LBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let line = lhs.line;
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        line,
    )
}

#[cfg(test)]
mod tests;
