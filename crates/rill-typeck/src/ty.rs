//! Type representation for the Rill type system.
//!
//! A type is either a named primitive (`Int`, `Char`, ...) or a union of two
//! or more primitives. Unions are canonical: flattened, deduplicated, and
//! ordered by name, so structural equality is set equality.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

/// A primitive type constructor, identified by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TyCon {
    pub name: String,
}

impl TyCon {
    pub fn new(name: impl Into<String>) -> Self {
        TyCon { name: name.into() }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The member set of a union type. Always holds at least two primitives;
/// only [`Ty::union_of`] constructs one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnionTy(BTreeSet<TyCon>);

impl UnionTy {
    /// Members in canonical (name) order.
    pub fn members(&self) -> impl Iterator<Item = &TyCon> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, con: &TyCon) -> bool {
        self.0.contains(con)
    }
}

/// A Rill type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// A primitive type.
    Con(TyCon),
    /// One of several primitives, depending on the control-flow path taken.
    Union(UnionTy),
}

impl Ty {
    pub fn int() -> Ty {
        Ty::Con(TyCon::new("Int"))
    }

    pub fn float() -> Ty {
        Ty::Con(TyCon::new("Float"))
    }

    pub fn char() -> Ty {
        Ty::Con(TyCon::new("Char"))
    }

    pub fn string() -> Ty {
        Ty::Con(TyCon::new("String"))
    }

    pub fn bool() -> Ty {
        Ty::Con(TyCon::new("Bool"))
    }

    pub fn nil() -> Ty {
        Ty::Con(TyCon::new("Nil"))
    }

    /// Build the least type covering all of `types`.
    ///
    /// Nested unions are flattened and duplicates removed. A single distinct
    /// member collapses to that primitive. An empty input yields `Nil`.
    pub fn union_of(types: impl IntoIterator<Item = Ty>) -> Ty {
        let mut members = BTreeSet::new();
        for ty in types {
            match ty {
                Ty::Con(con) => {
                    members.insert(con);
                }
                Ty::Union(UnionTy(inner)) => members.extend(inner),
            }
        }
        match members.len() {
            0 => Ty::nil(),
            1 => members.pop_first().map(Ty::Con).unwrap_or_else(Ty::nil),
            _ => Ty::Union(UnionTy(members)),
        }
    }

    /// Whether every primitive of `self` is also a primitive of `other`.
    pub fn is_covered_by(&self, other: &Ty) -> bool {
        self.primitives().all(|con| other.primitives().any(|o| o == con))
    }

    /// The primitives making up this type (one for a primitive).
    pub fn primitives(&self) -> Box<dyn Iterator<Item = &TyCon> + '_> {
        match self {
            Ty::Con(con) => Box::new(std::iter::once(con)),
            Ty::Union(u) => Box::new(u.members()),
        }
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Ty::Union(_))
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Con(c) => write!(f, "{}", c),
            Ty::Union(u) => {
                for (i, member) in u.members().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

/// Types serialize as their display form (`"Char | Int"`).
impl Serialize for Ty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordered argument types of one call: the key of a method's inference cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Signature(pub Vec<Ty>);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ")")
    }
}
