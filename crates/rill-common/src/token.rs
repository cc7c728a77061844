use serde::Serialize;

use crate::span::Span;

/// A token produced by the Rill lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token in the Rill language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords ───────────────────────────────────────────────────────
    Def,
    Do,
    Else,
    Elsif,
    End,
    False,
    If,
    Nil,
    True,
    While,
    Yield,

    // ── Operators and delimiters ───────────────────────────────────────
    /// `=`
    Eq,
    /// `|` around block parameters
    Bar,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// Significant newline (statement terminator).
    Newline,

    // ── Literals ───────────────────────────────────────────────────────
    /// Integer literal, e.g. `42`, `1_000`.
    IntLiteral,
    /// Floating-point literal, e.g. `3.14`.
    FloatLiteral,
    /// Character literal including quotes, e.g. `'a'`, `'\n'`.
    CharLiteral,
    /// String literal including quotes, e.g. `"hi"`.
    StringLiteral,

    /// Identifier, e.g. `foo`, `my_var`.
    Ident,
    /// Line comment (`# ...`). Preserved for tooling; the parser skips it.
    Comment,

    Eof,
    /// Invalid input (unknown character or unterminated literal).
    Error,
}

impl TokenKind {
    /// Human-readable name used in parse error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Def => "`def`",
            TokenKind::Do => "`do`",
            TokenKind::Else => "`else`",
            TokenKind::Elsif => "`elsif`",
            TokenKind::End => "`end`",
            TokenKind::False => "`false`",
            TokenKind::If => "`if`",
            TokenKind::Nil => "`nil`",
            TokenKind::True => "`true`",
            TokenKind::While => "`while`",
            TokenKind::Yield => "`yield`",
            TokenKind::Eq => "`=`",
            TokenKind::Bar => "`|`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Newline => "newline",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::CharLiteral => "character literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Ident => "identifier",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

/// Look up a keyword from its string representation.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "def" => Some(TokenKind::Def),
        "do" => Some(TokenKind::Do),
        "else" => Some(TokenKind::Else),
        "elsif" => Some(TokenKind::Elsif),
        "end" => Some(TokenKind::End),
        "false" => Some(TokenKind::False),
        "if" => Some(TokenKind::If),
        "nil" => Some(TokenKind::Nil),
        "true" => Some(TokenKind::True),
        "while" => Some(TokenKind::While),
        "yield" => Some(TokenKind::Yield),
        _ => None,
    }
}
