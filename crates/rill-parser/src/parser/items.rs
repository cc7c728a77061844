//! Method definitions and block literals.

use rill_common::token::TokenKind;

use super::{ParseResult, Parser};
use crate::ast::{BlockLit, Expr, ExprKind, Ident, MethodDef};

impl<'src> Parser<'src> {
    /// `def name[(params) | params] body end`
    pub(crate) fn parse_def(&mut self) -> ParseResult<Expr> {
        let def_tok = self.bump();
        let name_tok = self.expect(TokenKind::Ident)?;
        let name = Ident {
            id: self.alloc_id(),
            name: self.text(name_tok.span).to_string(),
            span: name_tok.span,
        };

        let params = if self.at(TokenKind::LParen) {
            self.open_paren()?;
            let params = if self.at(TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_ident_list()?
            };
            self.close_paren()?;
            self.skip_terminators();
            params
        } else if self.at(TokenKind::Ident) {
            let params = self.parse_ident_list()?;
            self.expect_terminator("method parameters")?;
            params
        } else {
            self.expect_terminator("method name")?;
            Vec::new()
        };

        self.push_locals(true);
        for param in &params {
            self.declare_local(&param.name);
        }
        let body = self.with_statement_context(|p| p.parse_body(&[TokenKind::End]));
        self.pop_locals();
        let body = body?;
        let end_tok = self.expect_end("`def`", def_tok.span)?;

        Ok(Expr {
            id: self.alloc_id(),
            span: def_tok.span.merge(end_tok.span),
            kind: ExprKind::Def(MethodDef { name, params, body }),
        })
    }

    /// `do [|params|] body end`
    pub(crate) fn parse_do_block(&mut self) -> ParseResult<BlockLit> {
        let do_tok = self.bump();
        let (params, body) = self.parse_block_contents(TokenKind::End)?;
        let end_tok = self.expect_end("`do` block", do_tok.span)?;
        Ok(BlockLit {
            id: self.alloc_id(),
            span: do_tok.span.merge(end_tok.span),
            params,
            body,
        })
    }

    /// `{ [|params|] body }`
    pub(crate) fn parse_brace_block(&mut self) -> ParseResult<BlockLit> {
        let open = self.bump();
        let (params, body) = self.parse_block_contents(TokenKind::RBrace)?;
        let close = self.expect(TokenKind::RBrace)?;
        Ok(BlockLit {
            id: self.alloc_id(),
            span: open.span.merge(close.span),
            params,
            body,
        })
    }

    fn parse_block_contents(&mut self, closer: TokenKind) -> ParseResult<(Vec<Ident>, Vec<Expr>)> {
        self.push_locals(false);
        let result = self.with_statement_context(|p| {
            let params = if p.eat(TokenKind::Bar).is_some() {
                let params = if p.at(TokenKind::Bar) {
                    Vec::new()
                } else {
                    p.parse_ident_list()?
                };
                p.expect(TokenKind::Bar)?;
                params
            } else {
                Vec::new()
            };
            for param in &params {
                p.declare_local(&param.name);
            }
            let body = p.parse_body(&[closer])?;
            Ok((params, body))
        });
        self.pop_locals();
        result
    }

    /// `ident {, ident}`
    fn parse_ident_list(&mut self) -> ParseResult<Vec<Ident>> {
        let mut idents = Vec::new();
        loop {
            let tok = self.expect(TokenKind::Ident)?;
            idents.push(Ident {
                id: self.alloc_id(),
                name: self.text(tok.span).to_string(),
                span: tok.span,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(idents)
    }
}
