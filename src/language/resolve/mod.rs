use crate::language::{
    ast::*,
    diagnostics::Diagnostics,
    scopes::{
        Binding, Callable, CallableKey, CallableKind, ClassScope, Context, MethodInfo, ScopeId,
        ScopeKind, ScopeRole,
    },
    types::{must_match, must_match_any, Type},
};
use std::{collections::HashSet, env, mem};

mod decls;
mod exprs;
mod stmts;


/// Whether the node's result is consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Statement,
    Value,
}

/// Where a named declaration is entered, and whether callers reach it
/// through a cell.
#[derive(Clone, Copy, Debug)]
struct Registration {
    scope: ScopeId,
    cell: bool,
}

/// Resolves `program` against a fresh context and hands the context back.
pub fn resolve_program(program: &mut Program, diags: &mut Diagnostics) -> Context {
    let mut resolver = Resolver::new(Context::new(), diags);
    resolver.resolve_program(program);
    resolver.into_context()
}

pub struct Resolver<'d> {
    ctx: Context,
    scope: ScopeId,
    diags: &'d mut Diagnostics,
    trace: bool,
}

impl<'d> Resolver<'d> {
    pub fn new(ctx: Context, diags: &'d mut Diagnostics) -> Self {
        Self {
            scope: ctx.global(),
            ctx,
            diags,
            trace: env::var_os("LUMO_DEBUG_TRACE").is_some(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn into_context(self) -> Context {
        self.ctx
    }

    pub fn resolve_program(&mut self, program: &mut Program) {
        match program.kind {
            ProgramKind::Declare => {
                let global = self.ctx.global();
                self.resolve_block_in(&mut program.body, global, Position::Statement);
            }
            ProgramKind::Statements => {
                self.resolve_block(&mut program.body, Position::Statement);
            }
        }
    }

    fn with_scope<T>(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = mem::replace(&mut self.scope, scope);
        let out = f(self);
        self.scope = saved;
        out
    }

    fn error(&mut self, line: usize, message: impl Into<String>) {
        self.diags.error(line, message);
    }

    fn warning(&mut self, line: usize, message: impl Into<String>) {
        self.diags.warning(line, message);
    }

    fn scope_or_push(&mut self, slot: &mut Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        if let Some(scope) = *slot {
            return scope;
        }
        let scope = self.ctx.push_scope(self.scope, kind);
        *slot = Some(scope);
        scope
    }

    /// A block with a child scope of its own.
    pub(crate) fn resolve_block(&mut self, block: &mut Block, position: Position) -> Type {
        if let Some(ty) = block.ty {
            return ty;
        }
        let scope = self.scope_or_push(&mut block.scope, ScopeKind::Block);
        self.resolve_block_in(block, scope, position)
    }

    /// A block whose declarations land directly in `scope` (callable bodies,
    /// `declare` programs).
    pub(crate) fn resolve_block_in(
        &mut self,
        block: &mut Block,
        scope: ScopeId,
        position: Position,
    ) -> Type {
        if let Some(ty) = block.ty {
            return ty;
        }
        block.scope = Some(scope);
        let line = block.line;
        let ty = self.with_scope(scope, |this| {
            for decl in &mut block.decls {
                this.resolve_decl(decl);
            }
            this.resolve_statements(&mut block.stmts, position, line)
        });
        block.ty = Some(ty);
        ty
    }

    /// Picks the result type of a multi-branch construct: the first branch
    /// with a concrete type wins, every disagreeing branch is a warning.
    fn merge_branch_types(&mut self, branches: &[(Type, usize)]) -> Type {
        let Some(chosen) = branches
            .iter()
            .map(|(ty, _)| *ty)
            .find(|ty| *ty != Type::Any)
        else {
            return Type::Any;
        };
        for (ty, line) in branches {
            if *ty != Type::Any && *ty != chosen {
                self.warning(
                    *line,
                    format!("branch type mismatch: expected {chosen}, got {ty}"),
                );
            }
        }
        chosen
    }
}
