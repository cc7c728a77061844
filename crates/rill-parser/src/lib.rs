//! Rill parser: recursive descent parser producing a typed AST.
//!
//! The parser consumes the token stream from `rill-lexer` and builds the
//! [`ast::Program`] consumed by the type checker. Like Ruby, it decides at
//! parse time whether a bare identifier is a local variable (a name assigned
//! earlier in the same lexical scope, or a parameter) or a zero-argument
//! method call.

pub mod ast;
pub mod error;
mod parser;

pub use error::ParseError;

use ast::Program;

/// Result of parsing a Rill source file.
///
/// Parsing stops at the first error, so `errors` holds at most one entry and
/// `program` holds the statements completed before it.
#[derive(Debug)]
pub struct Parse {
    program: Program,
    errors: Vec<ParseError>,
}

impl Parse {
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn into_program(self) -> Program {
        self.program
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a Rill source file.
pub fn parse(source: &str) -> Parse {
    let tokens = rill_lexer::Lexer::tokenize(source);
    let mut parser = parser::Parser::new(tokens, source);
    let (program, errors) = parser.parse_program();
    Parse { program, errors }
}
