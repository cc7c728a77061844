//! Type errors.
//!
//! All type errors are terminal: inference stops at the first one and no
//! partial module is returned. Each error carries the offending node's id and
//! span, plus the name of the method whose body was being inferred (`None`
//! at the top level).

use std::fmt;

use rill_common::span::Span;
use rill_parser::ast::NodeId;

#[derive(Clone, Debug, PartialEq)]
pub enum TypeError {
    /// A local variable is read before any binding is visible.
    UnboundVariable {
        name: String,
        node: NodeId,
        span: Span,
        method: Option<String>,
    },
    /// A call names a method that has not been defined (yet).
    UnresolvedMethod {
        name: String,
        node: NodeId,
        span: Span,
        method: Option<String>,
    },
    /// `yield` ran in a method invoked without a block.
    NoBlockGiven {
        node: NodeId,
        span: Span,
        method: Option<String>,
    },
    /// A call passes a different number of arguments than the method declares.
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        node: NodeId,
        span: Span,
        method: Option<String>,
    },
    /// Nested method inference went deeper than the configured limit.
    RecursionLimitExceeded {
        name: String,
        limit: usize,
        node: NodeId,
        span: Span,
        method: Option<String>,
    },
}

impl TypeError {
    pub fn node(&self) -> NodeId {
        match self {
            TypeError::UnboundVariable { node, .. }
            | TypeError::UnresolvedMethod { node, .. }
            | TypeError::NoBlockGiven { node, .. }
            | TypeError::ArityMismatch { node, .. }
            | TypeError::RecursionLimitExceeded { node, .. } => *node,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeError::UnboundVariable { span, .. }
            | TypeError::UnresolvedMethod { span, .. }
            | TypeError::NoBlockGiven { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::RecursionLimitExceeded { span, .. } => *span,
        }
    }

    /// The method whose body contained the offending node.
    pub fn method(&self) -> Option<&str> {
        match self {
            TypeError::UnboundVariable { method, .. }
            | TypeError::UnresolvedMethod { method, .. }
            | TypeError::NoBlockGiven { method, .. }
            | TypeError::ArityMismatch { method, .. }
            | TypeError::RecursionLimitExceeded { method, .. } => method.as_deref(),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::UnboundVariable { name, .. } => {
                write!(f, "undefined local variable `{}`", name)
            }
            TypeError::UnresolvedMethod { name, .. } => {
                write!(f, "undefined method `{}`", name)
            }
            TypeError::NoBlockGiven { .. } => write!(f, "no block given (yield)"),
            TypeError::ArityMismatch {
                name,
                expected,
                found,
                ..
            } => write!(
                f,
                "wrong number of arguments for `{}` (given {}, expected {})",
                name, found, expected
            ),
            TypeError::RecursionLimitExceeded { name, limit, .. } => write!(
                f,
                "inferring `{}` exceeded the recursion limit of {}",
                name, limit
            ),
        }
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let span = Span::new(0, 3);
        let err = TypeError::ArityMismatch {
            name: "foo".into(),
            expected: 1,
            found: 2,
            node: NodeId(7),
            span,
            method: Some("bar".into()),
        };
        assert_eq!(
            err.to_string(),
            "wrong number of arguments for `foo` (given 2, expected 1)"
        );
        assert_eq!(err.node(), NodeId(7));
        assert_eq!(err.span(), span);
        assert_eq!(err.method(), Some("bar"));

        let err = TypeError::NoBlockGiven {
            node: NodeId(0),
            span,
            method: None,
        };
        assert_eq!(err.to_string(), "no block given (yield)");
        assert_eq!(err.method(), None);
    }
}
