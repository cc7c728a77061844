//! Method registry: definition, call resolution, and the signature cache.
//!
//! A call is resolved by name. Its argument types form a [`Signature`]; a
//! block-less call whose signature is cached returns the cached type,
//! otherwise the body is inferred in a fresh scope with the parameters bound
//! to the argument types.
//!
//! Recursion is cut with a placeholder: before a body is inferred, its cache
//! entry is seeded with `Nil`, so a recursive call for the same signature
//! sees `Nil` and the entry is overwritten once the body is done. Calls that
//! carry a block are never cached (their result depends on the block), so
//! they are guarded separately by the set of block calls in progress.

use std::rc::Rc;

use rill_parser::ast::{Call, Expr, MethodDef};
use tracing::{debug, trace};

use crate::blocks::BlockCtx;
use crate::error::TypeError;
use crate::infer::Inferencer;
use crate::ty::{Signature, Ty};
use crate::unify;

impl<'a> Inferencer<'a> {
    /// Register `def` under its name, replacing any earlier definition.
    pub(crate) fn define_method(&mut self, def: &'a MethodDef) {
        let name = def.name.name.clone();
        debug!(method = %name, arity = def.params.len(), "defining method");
        let params = def.params.iter().map(|p| p.name.clone()).collect();
        self.module.define_method(&name, params);
        self.defs.insert(name, def);
    }

    pub(crate) fn infer_call(&mut self, expr: &'a Expr, call: &'a Call) -> Result<Ty, TypeError> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.infer_expr(arg)?);
        }
        self.resolve_call(expr, call, Signature(args))
    }

    /// Find the method `call` names and infer (or recall) its return type for
    /// `signature`.
    pub(crate) fn resolve_call(
        &mut self,
        expr: &'a Expr,
        call: &'a Call,
        signature: Signature,
    ) -> Result<Ty, TypeError> {
        let Some(def) = self.defs.get(call.name.as_str()).copied() else {
            return Err(TypeError::UnresolvedMethod {
                name: call.name.clone(),
                node: expr.id,
                span: call.name_span,
                method: self.method.clone(),
            });
        };
        if def.params.len() != signature.0.len() {
            return Err(TypeError::ArityMismatch {
                name: call.name.clone(),
                expected: def.params.len(),
                found: signature.0.len(),
                node: expr.id,
                span: expr.span,
                method: self.method.clone(),
            });
        }

        match &call.block {
            None => {
                if let Some(cached) = self
                    .module
                    .method(&call.name)
                    .and_then(|info| unify::unify_return(info, &signature))
                {
                    trace!(method = %call.name, signature = %signature, returns = %cached, "cache hit");
                    return Ok(cached);
                }
                trace!(method = %call.name, signature = %signature, "cache miss");
                self.store_instance(&call.name, signature.clone(), self.module.nil());
                let ty = self.infer_method_body(expr, def, &signature, None)?;
                self.store_instance(&call.name, signature, ty.clone());
                Ok(ty)
            }
            Some(block) => {
                let key = (call.name.clone(), signature.clone(), block.id);
                if self.active_block_calls.contains(&key) {
                    trace!(method = %call.name, signature = %signature, "re-entrant block call");
                    return Ok(self.module.nil());
                }
                let ctx = Rc::new(BlockCtx {
                    block,
                    scope: self.current,
                    enclosing: self.block.clone(),
                    method: self.method.clone(),
                });
                self.active_block_calls.insert(key.clone());
                let result = self.infer_method_body(expr, def, &signature, Some(ctx));
                self.active_block_calls.remove(&key);
                let ty = result?;
                if let Some(info) = self.module.method_mut(&call.name) {
                    info.observe_block_call(signature, ty.clone());
                }
                Ok(ty)
            }
        }
    }

    fn store_instance(&mut self, name: &str, signature: Signature, ty: Ty) {
        if let Some(info) = self.module.method_mut(name) {
            info.insert(signature, ty);
        }
    }

    /// Infer `def`'s body in a fresh scope with its parameters bound to
    /// `signature`, with `block` as the target of any `yield`.
    fn infer_method_body(
        &mut self,
        call_expr: &'a Expr,
        def: &'a MethodDef,
        signature: &Signature,
        block: Option<Rc<BlockCtx<'a>>>,
    ) -> Result<Ty, TypeError> {
        if self.depth >= self.config.max_depth {
            return Err(TypeError::RecursionLimitExceeded {
                name: def.name.name.clone(),
                limit: self.config.max_depth,
                node: call_expr.id,
                span: call_expr.span,
                method: self.method.clone(),
            });
        }
        self.depth += 1;
        debug!(
            method = %def.name.name,
            signature = %signature,
            depth = self.depth,
            with_block = block.is_some(),
            "inferring method body"
        );

        let scope = self.scopes.push(None);
        for (param, ty) in def.params.iter().zip(&signature.0) {
            self.scopes.declare(scope, &param.name, ty.clone());
            self.module.record(param.id, ty);
        }

        let saved_scope = std::mem::replace(&mut self.current, scope);
        let saved_block = std::mem::replace(&mut self.block, block);
        let saved_method = self.method.replace(def.name.name.clone());
        let result = self.infer_body(&def.body);
        self.current = saved_scope;
        self.block = saved_block;
        self.method = saved_method;
        self.depth -= 1;

        let ty = result?;
        debug!(method = %def.name.name, signature = %signature, returns = %ty, "inferred method body");
        Ok(ty)
    }
}
