use crate::language::ast::*;
use std::io::{self, Write};

mod decls;
mod exprs;
pub mod sink;
mod stmts;
pub mod tokens;

#[cfg(test)]
mod tests;

pub use sink::{Emitter, INDENT_WIDTH};
pub use tokens::{HostToken, TokenTable};

/// Writes a resolved program as host text.
pub fn emit_program<W: Write>(program: &Program, out: &mut Emitter<'_, W>) -> io::Result<()> {
    Printer { out }.program(program)
}

/// Walks the tree and drives the sink. Line-oriented writers end with a
/// line break; everything else leaves the cursor after its last token.
struct Printer<'e, 't, W: Write> {
    out: &'e mut Emitter<'t, W>,
}

impl<W: Write> Printer<'_, '_, W> {
    fn program(&mut self, program: &Program) -> io::Result<()> {
        let body = &program.body;
        match program.kind {
            ProgramKind::Declare if body.has_declarations() => {
                self.token(HostToken::Declare)?;
                self.newline()?;
                self.indented(|this| this.decl_lines(&body.decls))?;
                if !body.stmts.is_empty() {
                    self.token(HostToken::In)?;
                    self.newline()?;
                    self.indented(|this| this.stmt_lines(&body.stmts))?;
                }
                Ok(())
            }
            _ => self.block_lines(body),
        }
    }

    fn token(&mut self, token: HostToken) -> io::Result<()> {
        self.out.token(token)
    }

    fn text(&mut self, text: &str) -> io::Result<()> {
        self.out.text(text)
    }

    fn space(&mut self) -> io::Result<()> {
        self.out.space()
    }

    fn newline(&mut self) -> io::Result<()> {
        self.out.newline()
    }

    /// `token` surrounded by single spaces.
    fn spaced(&mut self, token: HostToken) -> io::Result<()> {
        self.space()?;
        self.token(token)?;
        self.space()
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self) -> io::Result<()>) -> io::Result<()> {
        self.out.indent();
        let result = f(self);
        self.out.outdent();
        result
    }

    /// A block with its own scope: one `local`/`in`/`end` when it declares
    /// anything, its bare statements otherwise.
    fn block_lines(&mut self, block: &Block) -> io::Result<()> {
        if !block.has_declarations() {
            return self.stmt_lines(&block.stmts);
        }
        self.token(HostToken::Local)?;
        self.newline()?;
        self.indented(|this| this.decl_lines(&block.decls))?;
        self.token(HostToken::In)?;
        self.newline()?;
        self.indented(|this| this.stmt_lines(&block.stmts))?;
        self.token(HostToken::End)?;
        self.newline()
    }

    /// Callable bodies declare straight into the callable: `D in S`.
    fn body_lines(&mut self, block: &Block) -> io::Result<()> {
        if block.has_declarations() {
            self.indented(|this| this.decl_lines(&block.decls))?;
            self.token(HostToken::In)?;
            self.newline()?;
        }
        self.indented(|this| this.stmt_lines(&block.stmts))
    }

    /// Opens a nested construct body on the next line, one level deeper.
    fn nested_block(&mut self, block: &Block) -> io::Result<()> {
        self.newline()?;
        self.indented(|this| this.block_lines(block))
    }
}
