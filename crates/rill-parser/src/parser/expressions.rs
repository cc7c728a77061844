//! Expression parsing: literals, variables, assignment, calls, `yield`,
//! `if`/`elsif`/`else`, `while`, and parenthesized expressions.

use rill_common::span::Span;
use rill_common::token::TokenKind;

use super::{ExprCtx, ParseResult, Parser};
use crate::ast::{Assign, Call, Expr, ExprKind, Ident, If, Literal, While, Yield};
use crate::error::ParseError;

impl<'src> Parser<'src> {
    pub(crate) fn parse_expr(&mut self, ctx: ExprCtx) -> ParseResult<Expr> {
        match self.current() {
            TokenKind::Def => self.parse_def(),
            TokenKind::If => {
                let if_tok = self.bump();
                self.parse_if_rest(if_tok.span, "`if`")
            }
            TokenKind::While => self.parse_while(),
            TokenKind::Yield => self.parse_yield(),
            TokenKind::Ident if self.nth(1) == TokenKind::Eq => self.parse_assign(ctx),
            TokenKind::Ident => self.parse_ident_expr(ctx),
            _ => self.parse_primary(),
        }
    }

    /// `name = value`. The name becomes a local before the value is parsed,
    /// so `x = x` refers to the (still unbound) local.
    fn parse_assign(&mut self, ctx: ExprCtx) -> ParseResult<Expr> {
        let name_tok = self.bump();
        let name = self.text(name_tok.span).to_string();
        self.bump(); // `=`
        self.skip_newlines();
        self.declare_local(&name);
        let target = Ident {
            id: self.alloc_id(),
            name,
            span: name_tok.span,
        };
        let value = self.parse_expr(ctx)?;
        let span = name_tok.span.merge(value.span);
        Ok(Expr {
            id: self.alloc_id(),
            span,
            kind: ExprKind::Assign(Assign {
                target,
                value: Box::new(value),
            }),
        })
    }

    /// A bare identifier: local variable, or a call with optional arguments
    /// and block.
    fn parse_ident_expr(&mut self, ctx: ExprCtx) -> ParseResult<Expr> {
        let name_tok = self.bump();
        let name = self.text(name_tok.span).to_string();

        if self.is_local(&name) && !self.at(TokenKind::LParen) {
            return Ok(Expr {
                id: self.alloc_id(),
                span: name_tok.span,
                kind: ExprKind::Var(name),
            });
        }

        let mut span = name_tok.span;
        let args = if self.at(TokenKind::LParen) {
            let (args, close) = self.parse_paren_args()?;
            span = span.merge(close);
            args
        } else if can_start_command_arg(self.current()) {
            let args = self.parse_command_args()?;
            if let Some(last) = args.last() {
                span = span.merge(last.span);
            }
            args
        } else {
            Vec::new()
        };

        let block = if self.at(TokenKind::LBrace) {
            Some(self.parse_brace_block()?)
        } else if ctx.allow_do && self.at(TokenKind::Do) {
            Some(self.parse_do_block()?)
        } else {
            None
        };
        if let Some(block) = &block {
            span = span.merge(block.span);
        }

        Ok(Expr {
            id: self.alloc_id(),
            span,
            kind: ExprKind::Call(Call {
                name,
                name_span: name_tok.span,
                args,
                block,
            }),
        })
    }

    /// `( [expr {, expr}] )`; returns the arguments and the closing paren span.
    fn parse_paren_args(&mut self) -> ParseResult<(Vec<Expr>, Span)> {
        self.open_paren()?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr(ExprCtx::default())?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close = self.close_paren()?;
        Ok((args, close.span))
    }

    /// `expr {, expr}` without parentheses. A `do` block after the last
    /// argument belongs to the enclosing call, not to the argument.
    fn parse_command_args(&mut self) -> ParseResult<Vec<Expr>> {
        let ctx = ExprCtx { allow_do: false };
        let mut args = vec![self.parse_expr(ctx)?];
        while self.eat(TokenKind::Comma).is_some() {
            self.skip_newlines();
            args.push(self.parse_expr(ctx)?);
        }
        Ok(args)
    }

    fn parse_yield(&mut self) -> ParseResult<Expr> {
        let yield_tok = self.bump();
        let mut span = yield_tok.span;
        let args = if self.at(TokenKind::LParen) {
            let (args, close) = self.parse_paren_args()?;
            span = span.merge(close);
            args
        } else if can_start_command_arg(self.current()) {
            let args = self.parse_command_args()?;
            if let Some(last) = args.last() {
                span = span.merge(last.span);
            }
            args
        } else {
            Vec::new()
        };
        Ok(Expr {
            id: self.alloc_id(),
            span,
            kind: ExprKind::Yield(Yield { args }),
        })
    }

    /// Everything after `if` / `elsif`: condition, body, and the rest of
    /// the chain up to and including the shared `end`.
    fn parse_if_rest(&mut self, opener: Span, construct: &str) -> ParseResult<Expr> {
        let cond = self.parse_expr(ExprCtx::default())?;
        self.expect_terminator("`if` condition")?;
        let then_body = self.parse_body(&[TokenKind::Elsif, TokenKind::Else, TokenKind::End])?;

        let (else_body, end_span) = match self.current() {
            TokenKind::Elsif => {
                let elsif_tok = self.bump();
                let nested = self.parse_if_rest(elsif_tok.span, "`elsif`")?;
                let end_span = nested.span;
                (Some(vec![nested]), end_span)
            }
            TokenKind::Else => {
                self.bump();
                let body = self.parse_body(&[TokenKind::End])?;
                let end_tok = self.expect_end(construct, opener)?;
                (Some(body), end_tok.span)
            }
            _ => {
                let end_tok = self.expect_end(construct, opener)?;
                (None, end_tok.span)
            }
        };

        Ok(Expr {
            id: self.alloc_id(),
            span: opener.merge(end_span),
            kind: ExprKind::If(If {
                cond: Box::new(cond),
                then_body,
                else_body,
            }),
        })
    }

    /// `while cond [do] body end`
    fn parse_while(&mut self) -> ParseResult<Expr> {
        let while_tok = self.bump();
        let cond = self.parse_expr(ExprCtx { allow_do: false })?;
        if self.eat(TokenKind::Do).is_some() {
            self.skip_terminators();
        } else {
            self.expect_terminator("`while` condition")?;
        }
        let body = self.parse_body(&[TokenKind::End])?;
        let end_tok = self.expect_end("`while`", while_tok.span)?;
        Ok(Expr {
            id: self.alloc_id(),
            span: while_tok.span.merge(end_tok.span),
            kind: ExprKind::While(While {
                cond: Box::new(cond),
                body,
            }),
        })
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let kind = self.current();
        let span = self.current_span();
        let literal = match kind {
            TokenKind::IntLiteral => {
                let text = self.text(span).replace('_', "");
                let value = text
                    .parse::<i64>()
                    .map_err(|_| ParseError::new("integer literal out of range", span))?;
                Literal::Int(value)
            }
            TokenKind::FloatLiteral => {
                let text = self.text(span).replace('_', "");
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ParseError::new("invalid float literal", span))?;
                Literal::Float(value)
            }
            TokenKind::CharLiteral => {
                let raw = self.text(span);
                let value = unescape(&raw[1..raw.len() - 1], span)?;
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Literal::Char(c),
                    _ => {
                        return Err(ParseError::new(
                            "character literal must contain exactly one character",
                            span,
                        ))
                    }
                }
            }
            TokenKind::StringLiteral => {
                let raw = self.text(span);
                Literal::Str(unescape(&raw[1..raw.len() - 1], span)?)
            }
            TokenKind::True => Literal::Bool(true),
            TokenKind::False => Literal::Bool(false),
            TokenKind::Nil => Literal::Nil,
            TokenKind::LParen => return self.parse_paren_expr(),
            _ => return Err(self.unexpected("expected expression")),
        };
        self.bump();
        Ok(Expr {
            id: self.alloc_id(),
            span,
            kind: ExprKind::Literal(literal),
        })
    }

    /// `( expr )` -- the inner expression keeps its own id, widened span.
    fn parse_paren_expr(&mut self) -> ParseResult<Expr> {
        let open = self.open_paren()?;
        let mut inner = self.parse_expr(ExprCtx::default())?;
        let close = self.close_paren()?;
        inner.span = open.span.merge(close.span);
        Ok(inner)
    }
}

/// Tokens that can begin an argument of a parenthesis-free call.
fn can_start_command_arg(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::CharLiteral
            | TokenKind::StringLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Nil
    )
}

/// Decode backslash escapes in the body of a quoted literal.
fn unescape(raw: &str, span: Span) -> Result<String, ParseError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                return Err(ParseError::new(
                    format!("unknown escape sequence `\\{}`", other),
                    span,
                ))
            }
            None => return Err(ParseError::new("dangling `\\` in literal", span)),
        }
    }
    Ok(out)
}
