//! The module: everything one inference run produces.
//!
//! A [`Module`] owns the registry of primitive types, every method definition
//! seen with its per-signature cache, and the node annotation table. It is
//! created at the start of a run, threaded through the engine, and returned
//! to the caller.

use rill_parser::ast::NodeId;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::ty::{Signature, Ty, TyCon};
use crate::unify;

const PRIMITIVES: [&str; 6] = ["Int", "Float", "Char", "String", "Bool", "Nil"];

/// One inferred instantiation of a method.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Instance {
    pub signature: Signature,
    pub returns: Ty,
}

/// A method definition as seen by the registry, with its inference results.
#[derive(Clone, Debug, Serialize)]
pub struct MethodInfo {
    pub name: String,
    pub params: Vec<String>,
    /// Cached block-less instantiations, in first-inferred order.
    instances: Vec<Instance>,
    #[serde(skip)]
    index: FxHashMap<Signature, usize>,
    /// Calls that carried a block. Never used as a cache; the result type is
    /// the join of every such call with the same signature.
    block_instances: Vec<Instance>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        MethodInfo {
            name: name.into(),
            params,
            instances: Vec::new(),
            index: FxHashMap::default(),
            block_instances: Vec::new(),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn block_instances(&self) -> &[Instance] {
        &self.block_instances
    }

    pub fn lookup(&self, signature: &Signature) -> Option<&Ty> {
        self.index
            .get(signature)
            .map(|&i| &self.instances[i].returns)
    }

    /// Store (or overwrite) the cached return type for `signature`.
    pub(crate) fn insert(&mut self, signature: Signature, returns: Ty) {
        match self.index.get(&signature) {
            Some(&i) => self.instances[i].returns = returns,
            None => {
                self.index.insert(signature.clone(), self.instances.len());
                self.instances.push(Instance { signature, returns });
            }
        }
    }

    pub(crate) fn observe_block_call(&mut self, signature: Signature, returns: Ty) {
        match self
            .block_instances
            .iter_mut()
            .find(|inst| inst.signature == signature)
        {
            Some(inst) => inst.returns = unify::join(&inst.returns, &returns),
            None => self.block_instances.push(Instance { signature, returns }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Module {
    #[serde(skip)]
    types: FxHashMap<String, Ty>,
    methods: Vec<MethodInfo>,
    #[serde(skip)]
    method_index: FxHashMap<String, usize>,
    #[serde(skip)]
    node_types: FxHashMap<NodeId, Ty>,
    #[serde(rename = "result")]
    result_type: Ty,
}

impl Module {
    pub fn new() -> Self {
        let mut module = Module {
            types: FxHashMap::default(),
            methods: Vec::new(),
            method_index: FxHashMap::default(),
            node_types: FxHashMap::default(),
            result_type: Ty::nil(),
        };
        for name in PRIMITIVES {
            module.primitive(name);
        }
        module
    }

    /// The canonical primitive named `name`, registered on first reference.
    pub fn primitive(&mut self, name: &str) -> Ty {
        self.types
            .entry(name.to_string())
            .or_insert_with(|| Ty::Con(TyCon::new(name)))
            .clone()
    }

    fn named(&self, name: &str) -> Ty {
        self.types
            .get(name)
            .cloned()
            .unwrap_or_else(|| Ty::Con(TyCon::new(name)))
    }

    pub fn int(&self) -> Ty {
        self.named("Int")
    }

    pub fn float(&self) -> Ty {
        self.named("Float")
    }

    pub fn char(&self) -> Ty {
        self.named("Char")
    }

    pub fn string(&self) -> Ty {
        self.named("String")
    }

    pub fn bool(&self) -> Ty {
        self.named("Bool")
    }

    pub fn nil(&self) -> Ty {
        self.named("Nil")
    }

    pub fn union_of(&self, types: impl IntoIterator<Item = Ty>) -> Ty {
        Ty::union_of(types)
    }

    /// Whether `name` has been registered as a type.
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    // ── Annotations ────────────────────────────────────────────────────

    pub fn type_of(&self, node: NodeId) -> Option<&Ty> {
        self.node_types.get(&node)
    }

    /// Every annotated node, ordered by id.
    pub fn annotations(&self) -> Vec<(NodeId, &Ty)> {
        let mut entries: Vec<_> = self.node_types.iter().map(|(id, ty)| (*id, ty)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Type of the last top-level statement (`Nil` for an empty program).
    pub fn result_type(&self) -> &Ty {
        &self.result_type
    }

    pub(crate) fn set_result_type(&mut self, ty: Ty) {
        self.result_type = ty;
    }

    /// Annotate `node`, joining with any type recorded on an earlier pass.
    pub(crate) fn record(&mut self, node: NodeId, ty: &Ty) {
        self.node_types
            .entry(node)
            .and_modify(|old| *old = unify::join(old, ty))
            .or_insert_with(|| ty.clone());
    }

    // ── Methods ────────────────────────────────────────────────────────

    /// Methods in first-definition order.
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.method_index.get(name).map(|&i| &self.methods[i])
    }

    pub(crate) fn method_mut(&mut self, name: &str) -> Option<&mut MethodInfo> {
        let i = *self.method_index.get(name)?;
        Some(&mut self.methods[i])
    }

    /// Register a method, replacing (and clearing the cache of) any earlier
    /// definition with the same name.
    pub(crate) fn define_method(&mut self, name: &str, params: Vec<String>) {
        let info = MethodInfo::new(name, params);
        match self.method_index.get(name) {
            Some(&i) => self.methods[i] = info,
            None => {
                self.method_index.insert(name.to_string(), self.methods.len());
                self.methods.push(info);
            }
        }
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}
