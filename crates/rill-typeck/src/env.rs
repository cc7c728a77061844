//! Scopes and binding tables.
//!
//! Scopes live in an arena ([`ScopeTree`]) and refer to their parent by
//! index. The top level and every method body start a scope with no parent,
//! so a method never sees its caller's locals. A block body gets a child of
//! the scope its call site runs in, so it reads and writes the caller's
//! locals.
//!
//! Control-flow merges work on [`Snapshot`]s: copies of every table along a
//! scope chain, taken before and after a conditionally executed region.

use rustc_hash::FxHashMap;

use crate::ty::Ty;
use crate::unify;

/// Index of a scope in its [`ScopeTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

/// Name -> currently known type, for one scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingTable {
    bindings: FxHashMap<String, Ty>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Ty> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Introduce or overwrite `name`.
    pub fn insert(&mut self, name: impl Into<String>, ty: Ty) {
        self.bindings.insert(name.into(), ty);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Ty)> {
        self.bindings.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Combine the tables produced by two divergent branches.
    ///
    /// Every name bound in either table maps to the union of its types; a
    /// name bound on one side only is merged against `Nil`.
    pub fn merge(a: &BindingTable, b: &BindingTable) -> BindingTable {
        let mut bindings = FxHashMap::default();
        for (name, ty) in &a.bindings {
            let other = b.bindings.get(name).cloned().unwrap_or_else(Ty::nil);
            bindings.insert(name.clone(), unify::join(ty, &other));
        }
        for (name, ty) in &b.bindings {
            if !a.bindings.contains_key(name) {
                bindings.insert(name.clone(), unify::join(ty, &Ty::nil()));
            }
        }
        BindingTable { bindings }
    }
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    table: BindingTable,
}

/// The tables of one scope chain, innermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot(Vec<(ScopeId, BindingTable)>);

impl Snapshot {
    pub fn tables(&self) -> impl Iterator<Item = (ScopeId, &BindingTable)> {
        self.0.iter().map(|(id, table)| (*id, table))
    }

    /// Scope-by-scope [`BindingTable::merge`]. Both snapshots must come from
    /// the same chain.
    pub fn merge(a: &Snapshot, b: &Snapshot) -> Snapshot {
        let merged = a
            .0
            .iter()
            .zip(&b.0)
            .map(|((id, ta), (_, tb))| (*id, BindingTable::merge(ta, tb)))
            .collect();
        Snapshot(merged)
    }
}

/// Arena of every scope created during one inference run.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// A tree holding only the top-level scope.
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![Scope {
                parent: None,
                table: BindingTable::new(),
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            table: BindingTable::new(),
        });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0 as usize].parent
    }

    pub fn table(&self, scope: ScopeId) -> &BindingTable {
        &self.scopes[scope.0 as usize].table
    }

    /// `scope` followed by each enclosing scope.
    pub fn chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![scope];
        let mut cur = scope;
        while let Some(parent) = self.parent(cur) {
            chain.push(parent);
            cur = parent;
        }
        chain
    }

    /// Bind `name` in `scope` itself, shadowing any enclosing binding.
    pub fn declare(&mut self, scope: ScopeId, name: &str, ty: Ty) {
        self.scopes[scope.0 as usize].table.insert(name, ty);
    }

    /// Innermost binding of `name` visible from `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Ty> {
        self.chain(scope)
            .into_iter()
            .find_map(|id| self.table(id).get(name))
    }

    /// Write `name` into the nearest scope that declares it, or declare it in
    /// `scope`. Returns the scope that now holds the binding.
    pub fn assign(&mut self, scope: ScopeId, name: &str, ty: Ty) -> ScopeId {
        let target = self
            .chain(scope)
            .into_iter()
            .find(|id| self.table(*id).contains(name))
            .unwrap_or(scope);
        let table = &mut self.scopes[target.0 as usize].table;
        let new = match table.get(name) {
            Some(old) => unify::merge_assign(old, ty),
            None => ty,
        };
        table.insert(name, new);
        target
    }

    pub fn snapshot(&self, scope: ScopeId) -> Snapshot {
        Snapshot(
            self.chain(scope)
                .into_iter()
                .map(|id| (id, self.table(id).clone()))
                .collect(),
        )
    }

    /// Put every table of `snapshot` back in place.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        for (id, table) in &snapshot.0 {
            self.scopes[id.0 as usize].table = table.clone();
        }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parents() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Ty::int());
        let child = tree.push(Some(root));

        assert_eq!(tree.lookup(child, "x"), Some(&Ty::int()));
        assert!(tree.lookup(child, "y").is_none());
    }

    #[test]
    fn parentless_scope_is_isolated() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Ty::int());
        let method = tree.push(None);
        assert!(tree.lookup(method, "x").is_none());
    }

    #[test]
    fn assign_writes_back_to_declaring_scope() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "y", Ty::char());
        let child = tree.push(Some(root));

        let target = tree.assign(child, "y", Ty::int());
        assert_eq!(target, root);
        assert_eq!(tree.table(root).get("y"), Some(&Ty::int()));
        assert!(tree.table(child).is_empty());

        let target = tree.assign(child, "z", Ty::bool());
        assert_eq!(target, child);
        assert!(tree.lookup(root, "z").is_none());
    }

    #[test]
    fn declare_shadows() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Ty::int());
        let child = tree.push(Some(root));
        tree.declare(child, "x", Ty::string());

        assert_eq!(tree.lookup(child, "x"), Some(&Ty::string()));
        assert_eq!(tree.lookup(root, "x"), Some(&Ty::int()));
    }

    #[test]
    fn merge_of_distinct_primitives_is_two_member_union() {
        let mut a = BindingTable::new();
        a.insert("v", Ty::int());
        let mut b = BindingTable::new();
        b.insert("v", Ty::float());

        let merged = BindingTable::merge(&a, &b);
        assert_eq!(merged.get("v"), Some(&Ty::union_of([Ty::int(), Ty::float()])));
    }

    #[test]
    fn merge_one_sided_name_with_nil() {
        let a = BindingTable::new();
        let mut b = BindingTable::new();
        b.insert("only", Ty::char());

        let merged = BindingTable::merge(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("only").unwrap().to_string(), "Char | Nil");
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Ty::int());
        let child = tree.push(Some(root));
        let before = tree.snapshot(child);

        tree.assign(child, "x", Ty::char());
        tree.declare(child, "tmp", Ty::nil());
        assert_ne!(tree.snapshot(child), before);

        tree.restore(&before);
        assert_eq!(tree.snapshot(child), before);
        assert_eq!(tree.lookup(child, "x"), Some(&Ty::int()));
        assert!(tree.lookup(child, "tmp").is_none());
    }

    #[test]
    fn snapshot_merge_is_per_scope() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Ty::int());
        let before = tree.snapshot(root);
        tree.assign(root, "x", Ty::char());
        let after = tree.snapshot(root);

        let merged = Snapshot::merge(&before, &after);
        let (id, table) = merged.tables().next().unwrap();
        assert_eq!(id, root);
        assert_eq!(table.get("x").unwrap().to_string(), "Char | Int");
    }
}
