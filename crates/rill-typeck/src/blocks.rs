//! Block/yield resolution.
//!
//! A block is inferred lazily: when the method it was passed to reaches a
//! `yield`, the yield's argument types are bound positionally to the block's
//! parameters and the block body is inferred in a child of the call site's
//! scope. The body's type becomes the type of the `yield`.
//!
//! Since a block may run any number of times per `yield`, each invocation
//! merges the call-site bindings from before and after the body and repeats
//! until they stop changing.

use std::rc::Rc;

use rill_parser::ast::{BlockLit, Expr, Yield};
use tracing::trace;

use crate::env::{ScopeId, Snapshot};
use crate::error::TypeError;
use crate::infer::Inferencer;
use crate::ty::Ty;
use crate::unify;

/// The block attached to one call, and where it was written.
pub(crate) struct BlockCtx<'a> {
    pub(crate) block: &'a BlockLit,
    /// Scope of the call site; the block body runs in a child of it.
    pub(crate) scope: ScopeId,
    /// Block of the method enclosing the call site. A `yield` inside this
    /// block's body targets it.
    pub(crate) enclosing: Option<Rc<BlockCtx<'a>>>,
    /// Method enclosing the call site.
    pub(crate) method: Option<String>,
}

impl<'a> Inferencer<'a> {
    pub(crate) fn infer_yield(&mut self, expr: &'a Expr, node: &'a Yield) -> Result<Ty, TypeError> {
        let mut args = Vec::with_capacity(node.args.len());
        for arg in &node.args {
            args.push(self.infer_expr(arg)?);
        }
        let Some(ctx) = self.block.clone() else {
            return Err(TypeError::NoBlockGiven {
                node: expr.id,
                span: expr.span,
                method: self.method.clone(),
            });
        };
        self.invoke_block(&ctx, &args)
    }

    /// Run `ctx`'s block with the given argument types in the block's own
    /// lexical context, restoring the current one afterwards.
    fn invoke_block(&mut self, ctx: &Rc<BlockCtx<'a>>, args: &[Ty]) -> Result<Ty, TypeError> {
        let saved_scope = self.current;
        let saved_block = std::mem::replace(&mut self.block, ctx.enclosing.clone());
        let saved_method = std::mem::replace(&mut self.method, ctx.method.clone());
        let result = self.iterate_block(ctx, args);
        self.current = saved_scope;
        self.block = saved_block;
        self.method = saved_method;
        result
    }

    fn iterate_block(&mut self, ctx: &BlockCtx<'a>, args: &[Ty]) -> Result<Ty, TypeError> {
        let block = ctx.block;
        let mut results = Vec::new();
        let mut iteration = 0usize;
        loop {
            iteration += 1;
            let before = self.scopes.snapshot(ctx.scope);

            let scope = self.scopes.push(Some(ctx.scope));
            for (i, param) in block.params.iter().enumerate() {
                let ty = args.get(i).cloned().unwrap_or_else(|| self.module.nil());
                self.scopes.declare(scope, &param.name, ty.clone());
                self.module.record(param.id, &ty);
            }
            self.current = scope;
            results.push(self.infer_body(&block.body)?);

            let after = self.scopes.snapshot(ctx.scope);
            let merged = Snapshot::merge(&before, &after);
            self.scopes.restore(&merged);
            trace!(block = block.id.0, iteration, "block invocation");
            if merged == before {
                break;
            }
        }
        let ty = unify::join_all(results);
        self.module.record(block.id, &ty);
        Ok(ty)
    }
}
