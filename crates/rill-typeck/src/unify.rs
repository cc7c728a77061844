//! Combining candidate types.
//!
//! There are no type variables in Rill: "unification" means finding the
//! least type covering several observations of the same entity. Sequential
//! assignment replaces a binding outright; control-flow merges widen it to a
//! union.

use crate::module::MethodInfo;
use crate::ty::{Signature, Ty};

/// The type a binding holds after `name = value` executes unconditionally.
pub fn merge_assign(_old: &Ty, new: Ty) -> Ty {
    new
}

/// Least type covering both `a` and `b`.
pub fn join(a: &Ty, b: &Ty) -> Ty {
    if a == b {
        return a.clone();
    }
    Ty::union_of([a.clone(), b.clone()])
}

/// Least type covering every candidate; `Nil` for no candidates.
pub fn join_all(types: impl IntoIterator<Item = Ty>) -> Ty {
    Ty::union_of(types)
}

/// Cached return type of `method` for exactly this argument signature.
///
/// A different signature is a cache miss even when it overlaps: each
/// argument shape gets its own inference.
pub fn unify_return(method: &MethodInfo, signature: &Signature) -> Option<Ty> {
    method.lookup(signature).cloned()
}
