//! Typed abstract syntax tree for Rill programs.
//!
//! Every node the type checker annotates carries a [`NodeId`] that is unique
//! within its [`Program`]: expressions, assignment targets, method and block
//! parameters, and block literals. The tree is plain owned data and is
//! serde-serializable, so a front end other than [`crate::parse`] can hand
//! a program to the type checker as JSON.

use rill_common::span::Span;
use serde::{Deserialize, Serialize};

/// Identity of an AST node within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// A parsed program: the top-level statement sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub stmts: Vec<Expr>,
}

impl Program {
    /// The last top-level statement, if any.
    pub fn last(&self) -> Option<&Expr> {
        self.stmts.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Literal),
    /// Reference to a local variable.
    Var(String),
    Assign(Assign),
    Call(Call),
    Yield(Yield),
    If(If),
    While(While),
    Def(MethodDef),
}

impl Expr {
    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_assign(&self) -> Option<&Assign> {
        match &self.kind {
            ExprKind::Assign(assign) => Some(assign),
            _ => None,
        }
    }

    pub fn as_def(&self) -> Option<&MethodDef> {
        match &self.kind {
            ExprKind::Def(def) => Some(def),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Bool(bool),
    Nil,
}

/// A named binding site: assignment target, method parameter, or block parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

/// `target = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    pub target: Ident,
    pub value: Box<Expr>,
}

/// `name`, `name(args)`, `name args`, each optionally followed by a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
    pub name_span: Span,
    pub args: Vec<Expr>,
    pub block: Option<BlockLit>,
}

/// `do |params| body end` or `{ |params| body }`, attached to exactly one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockLit {
    pub id: NodeId,
    pub span: Span,
    pub params: Vec<Ident>,
    pub body: Vec<Expr>,
}

/// `yield args`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Yield {
    pub args: Vec<Expr>,
}

/// `if cond ... [else ...] end`. An `elsif` chain nests as a single `If`
/// inside `else_body`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct If {
    pub cond: Box<Expr>,
    pub then_body: Vec<Expr>,
    pub else_body: Option<Vec<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct While {
    pub cond: Box<Expr>,
    pub body: Vec<Expr>,
}

/// `def name(params) body end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<Expr>,
}
