//! The inference visitor.
//!
//! Walks the program in source order and annotates every expression it
//! evaluates. Inference is flow-sensitive: each local holds the type of the
//! value it currently contains, and the bindings of conditionally executed
//! regions (`if` branches, `while` bodies, blocks) are merged back with
//! [`Snapshot::merge`].
//!
//! Method bodies are not inferred where they are defined. A `def` only
//! registers the method; its body is inferred at each call site for that
//! call's argument types (see `methods.rs`), and a block body is inferred
//! each time the method it is passed to reaches a `yield` (see `blocks.rs`).

use std::rc::Rc;

use rill_parser::ast::{Expr, ExprKind, If, Literal, MethodDef, NodeId, Program, While};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::blocks::BlockCtx;
use crate::config::InferConfig;
use crate::env::{ScopeId, ScopeTree, Snapshot};
use crate::error::TypeError;
use crate::module::Module;
use crate::ty::{Signature, Ty};
use crate::unify;

/// Mutable state of one inference run.
pub(crate) struct Inferencer<'a> {
    pub(crate) config: &'a InferConfig,
    pub(crate) module: Module,
    /// Visible method definitions by name. Redefinition replaces the entry.
    pub(crate) defs: FxHashMap<String, &'a MethodDef>,
    /// Block-carrying calls currently being inferred, by method, signature,
    /// and block literal.
    pub(crate) active_block_calls: FxHashSet<(String, Signature, NodeId)>,
    pub(crate) scopes: ScopeTree,
    pub(crate) current: ScopeId,
    /// Block attached to the call of the method currently being inferred.
    pub(crate) block: Option<Rc<BlockCtx<'a>>>,
    /// Name of the method whose body is currently being inferred.
    pub(crate) method: Option<String>,
    /// Method bodies currently under inference.
    pub(crate) depth: usize,
}

impl<'a> Inferencer<'a> {
    pub(crate) fn new(config: &'a InferConfig) -> Self {
        let scopes = ScopeTree::new();
        let current = scopes.root();
        Inferencer {
            config,
            module: Module::new(),
            defs: FxHashMap::default(),
            active_block_calls: FxHashSet::default(),
            scopes,
            current,
            block: None,
            method: None,
            depth: 0,
        }
    }

    pub(crate) fn run(mut self, program: &'a Program) -> Result<Module, TypeError> {
        debug!(statements = program.stmts.len(), "inferring program");
        let ty = self.infer_body(&program.stmts)?;
        debug!(result = %ty, "inference complete");
        self.module.set_result_type(ty);
        Ok(self.module)
    }

    /// Type of a statement sequence: its last statement's, `Nil` when empty.
    pub(crate) fn infer_body(&mut self, stmts: &'a [Expr]) -> Result<Ty, TypeError> {
        let mut ty = self.module.nil();
        for stmt in stmts {
            ty = self.infer_expr(stmt)?;
        }
        Ok(ty)
    }

    pub(crate) fn infer_expr(&mut self, expr: &'a Expr) -> Result<Ty, TypeError> {
        let ty = match &expr.kind {
            ExprKind::Literal(lit) => self.literal_type(lit),
            ExprKind::Var(name) => match self.scopes.lookup(self.current, name) {
                Some(ty) => ty.clone(),
                None => {
                    return Err(TypeError::UnboundVariable {
                        name: name.clone(),
                        node: expr.id,
                        span: expr.span,
                        method: self.method.clone(),
                    })
                }
            },
            ExprKind::Assign(assign) => {
                let ty = self.infer_expr(&assign.value)?;
                self.scopes
                    .assign(self.current, &assign.target.name, ty.clone());
                self.module.record(assign.target.id, &ty);
                ty
            }
            ExprKind::Call(call) => self.infer_call(expr, call)?,
            ExprKind::Yield(y) => self.infer_yield(expr, y)?,
            ExprKind::If(node) => self.infer_if(node)?,
            ExprKind::While(node) => self.infer_while(node)?,
            ExprKind::Def(def) => {
                self.define_method(def);
                self.module.nil()
            }
        };
        self.module.record(expr.id, &ty);
        Ok(ty)
    }

    fn literal_type(&self, lit: &Literal) -> Ty {
        match lit {
            Literal::Int(_) => self.module.int(),
            Literal::Float(_) => self.module.float(),
            Literal::Char(_) => self.module.char(),
            Literal::Str(_) => self.module.string(),
            Literal::Bool(_) => self.module.bool(),
            Literal::Nil => self.module.nil(),
        }
    }

    /// Both branches start from the pre-branch bindings; afterwards every
    /// local holds the union of what each branch left in it.
    fn infer_if(&mut self, node: &'a If) -> Result<Ty, TypeError> {
        self.infer_expr(&node.cond)?;
        let before = self.scopes.snapshot(self.current);

        let then_ty = self.infer_body(&node.then_body)?;
        let after_then = self.scopes.snapshot(self.current);
        self.scopes.restore(&before);

        let else_ty = match &node.else_body {
            Some(body) => self.infer_body(body)?,
            None => self.module.nil(),
        };
        let after_else = self.scopes.snapshot(self.current);

        let merged = Snapshot::merge(&after_then, &after_else);
        self.scopes.restore(&merged);
        trace!(%then_ty, %else_ty, "merged if branches");
        Ok(unify::join(&then_ty, &else_ty))
    }

    /// The body runs zero or more times: iterate until a pass leaves the
    /// merged bindings unchanged.
    fn infer_while(&mut self, node: &'a While) -> Result<Ty, TypeError> {
        self.infer_expr(&node.cond)?;
        let mut iteration = 0usize;
        loop {
            iteration += 1;
            let before = self.scopes.snapshot(self.current);
            self.infer_body(&node.body)?;
            self.infer_expr(&node.cond)?;
            let after = self.scopes.snapshot(self.current);
            let merged = Snapshot::merge(&before, &after);
            self.scopes.restore(&merged);
            trace!(iteration, "while iteration");
            if merged == before {
                break;
            }
        }
        Ok(self.module.nil())
    }
}
