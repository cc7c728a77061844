//! Recursive descent parser for Rill.
//!
//! # Newline Significance
//!
//! Newlines terminate statements unless the parser is inside parentheses.
//! `current()` and `nth()` skip insignificant newlines transparently, and
//! `bump()` consumes them along with the next significant token. Block
//! bodies reset the parenthesis depth so statements inside `foo(bar { ... })`
//! are still newline-separated.
//!
//! # Locals
//!
//! The parser tracks which names are local variables in each lexical scope
//! so a bare identifier can be classified as a variable reference or a
//! zero-argument call. Method bodies start an isolated scope; blocks see the
//! locals of their enclosing scope.

pub(crate) mod expressions;
pub(crate) mod items;

use rill_common::span::Span;
use rill_common::token::{Token, TokenKind};

use crate::ast::{NodeId, Program};
use crate::error::ParseError;

pub(crate) type ParseResult<T> = Result<T, ParseError>;

/// Options threaded through expression parsing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExprCtx {
    /// Whether a trailing `do ... end` may attach to a call parsed here.
    /// Cleared for command arguments (the block belongs to the outer call)
    /// and for `while` conditions (where `do` separates the body).
    pub(crate) allow_do: bool,
}

impl Default for ExprCtx {
    fn default() -> Self {
        ExprCtx { allow_do: true }
    }
}

#[derive(Debug)]
struct LocalScope {
    names: Vec<String>,
    /// Lookups stop at an isolated scope (method bodies, top level).
    isolated: bool,
}

pub(crate) struct Parser<'src> {
    /// Significant tokens from the lexer (comments removed), ending with Eof.
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    paren_depth: u32,
    next_id: u32,
    locals: Vec<LocalScope>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        Self {
            tokens,
            pos: 0,
            source,
            paren_depth: 0,
            next_id: 0,
            locals: vec![LocalScope {
                names: Vec::new(),
                isolated: true,
            }],
        }
    }

    /// Parse the whole token stream. Stops at the first error.
    pub(crate) fn parse_program(&mut self) -> (Program, Vec<ParseError>) {
        let mut stmts = Vec::new();
        let errors = match self.parse_stmt_list(&[], &mut stmts) {
            Ok(()) => Vec::new(),
            Err(err) => vec![err],
        };
        (Program { stmts }, errors)
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    fn significant_index(&self, n: usize) -> usize {
        let mut idx = self.pos;
        let mut remaining = n;
        loop {
            if idx >= self.tokens.len() - 1 {
                return self.tokens.len() - 1;
            }
            let kind = self.tokens[idx].kind;
            if kind == TokenKind::Newline && self.paren_depth > 0 {
                idx += 1;
                continue;
            }
            if remaining == 0 {
                return idx;
            }
            remaining -= 1;
            idx += 1;
        }
    }

    pub(crate) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.tokens[self.significant_index(n)].kind
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens[self.significant_index(0)].span
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    // ── Consumption ────────────────────────────────────────────────────

    /// Consume the current significant token (and any skipped newlines).
    pub(crate) fn bump(&mut self) -> Token {
        let idx = self.significant_index(0);
        let token = self.tokens[idx].clone();
        if token.kind != TokenKind::Eof {
            self.pos = idx + 1;
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&format!("expected {}", kind.describe())))
        }
    }

    /// Expect the `end` closing a construct opened at `opener`.
    pub(crate) fn expect_end(&mut self, construct: &str, opener: Span) -> ParseResult<Token> {
        if self.at(TokenKind::End) {
            return Ok(self.bump());
        }
        Err(ParseError::with_related(
            format!(
                "expected `end` to close {}, found {}",
                construct,
                self.current().describe()
            ),
            self.current_span(),
            format!("{} started here", construct),
            opener,
        ))
    }

    /// Require at least one statement terminator (newline or `;`).
    pub(crate) fn expect_terminator(&mut self, after: &str) -> ParseResult<()> {
        if !matches!(self.current(), TokenKind::Newline | TokenKind::Semicolon) {
            return Err(self.unexpected(&format!("expected newline or `;` after {}", after)));
        }
        self.skip_terminators();
        Ok(())
    }

    pub(crate) fn skip_terminators(&mut self) {
        while matches!(self.current(), TokenKind::Newline | TokenKind::Semicolon) {
            self.bump();
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.bump();
        }
    }

    /// An error at the current token: `"{expected}, found {token}"`.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let idx = self.significant_index(0);
        let token = &self.tokens[idx];
        if token.kind == TokenKind::Error {
            return self.invalid_token_error(token);
        }
        ParseError::new(
            format!("{}, found {}", expected, token.kind.describe()),
            token.span,
        )
    }

    fn invalid_token_error(&self, token: &Token) -> ParseError {
        let text = self.text(token.span);
        let message = match text.chars().next() {
            Some('\'') => "unterminated character literal".to_string(),
            Some('"') => "unterminated string literal".to_string(),
            Some(c) => format!("unexpected character `{}`", c),
            None => "unexpected input".to_string(),
        };
        ParseError::new(message, token.span)
    }

    pub(crate) fn text(&self, span: Span) -> &'src str {
        &self.source[span.to_range()]
    }

    pub(crate) fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    // ── Paren depth ────────────────────────────────────────────────────

    pub(crate) fn open_paren(&mut self) -> ParseResult<Token> {
        let token = self.expect(TokenKind::LParen)?;
        self.paren_depth += 1;
        Ok(token)
    }

    pub(crate) fn close_paren(&mut self) -> ParseResult<Token> {
        let token = self.expect(TokenKind::RParen)?;
        self.paren_depth -= 1;
        Ok(token)
    }

    /// Run `f` with newlines significant again (block and method bodies).
    pub(crate) fn with_statement_context<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.paren_depth, 0);
        let result = f(self);
        self.paren_depth = saved;
        result
    }

    // ── Locals ─────────────────────────────────────────────────────────

    pub(crate) fn push_locals(&mut self, isolated: bool) {
        self.locals.push(LocalScope {
            names: Vec::new(),
            isolated,
        });
    }

    pub(crate) fn pop_locals(&mut self) {
        self.locals.pop();
    }

    pub(crate) fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.locals.last_mut() {
            if !scope.names.iter().any(|n| n == name) {
                scope.names.push(name.to_string());
            }
        }
    }

    pub(crate) fn is_local(&self, name: &str) -> bool {
        for scope in self.locals.iter().rev() {
            if scope.names.iter().any(|n| n == name) {
                return true;
            }
            if scope.isolated {
                return false;
            }
        }
        false
    }

    // ── Statement lists ────────────────────────────────────────────────

    /// Parse statements into `out` until one of `terminators` (or Eof) is
    /// the current token. The terminator itself is not consumed.
    pub(crate) fn parse_stmt_list(
        &mut self,
        terminators: &[TokenKind],
        out: &mut Vec<crate::ast::Expr>,
    ) -> ParseResult<()> {
        loop {
            self.skip_terminators();
            let kind = self.current();
            if kind == TokenKind::Eof || terminators.contains(&kind) {
                return Ok(());
            }
            let stmt = self.parse_expr(ExprCtx::default())?;
            out.push(stmt);
            let kind = self.current();
            if matches!(kind, TokenKind::Newline | TokenKind::Semicolon)
                || kind == TokenKind::Eof
                || terminators.contains(&kind)
            {
                continue;
            }
            return Err(self.unexpected("expected newline or `;` after statement"));
        }
    }

    pub(crate) fn parse_body(
        &mut self,
        terminators: &[TokenKind],
    ) -> ParseResult<Vec<crate::ast::Expr>> {
        let mut body = Vec::new();
        self.parse_stmt_list(terminators, &mut body)?;
        Ok(body)
    }
}
