// Rill lexer -- tokenizer for the Rill language.

mod cursor;

use cursor::Cursor;
use rill_common::token::{keyword_from_str, Token, TokenKind};

/// The Rill lexer. Converts source text into a stream of tokens.
///
/// Newlines are emitted as [`TokenKind::Newline`] because they terminate
/// statements; the parser decides where they are insignificant. The stream
/// always ends with a single [`TokenKind::Eof`].
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
        }
    }

    /// Tokenize the entire source into a `Vec<Token>`, including `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            '\n' => self.single_char_token(TokenKind::Newline, start),
            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            '{' => self.single_char_token(TokenKind::LBrace, start),
            '}' => self.single_char_token(TokenKind::RBrace, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            ';' => self.single_char_token(TokenKind::Semicolon, start),
            '|' => self.single_char_token(TokenKind::Bar, start),
            '=' => self.single_char_token(TokenKind::Eq, start),

            '#' => self.lex_comment(start),
            '0'..='9' => self.lex_number(start),
            '\'' => self.lex_quoted(start, '\'', TokenKind::CharLiteral),
            '"' => self.lex_quoted(start, '"', TokenKind::StringLiteral),
            c if is_ident_start(c) => self.lex_ident(start),

            _ => {
                self.cursor.advance();
                Token::new(TokenKind::Error, start, self.cursor.pos())
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    /// Skip horizontal whitespace and backslash line continuations.
    fn skip_whitespace(&mut self) {
        loop {
            self.cursor.eat_while(|c| c == ' ' || c == '\t' || c == '\r');
            if self.cursor.peek() == Some('\\') && self.cursor.peek_next() == Some('\n') {
                self.cursor.advance();
                self.cursor.advance();
                continue;
            }
            break;
        }
    }

    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    /// `# ...` up to (not including) the newline.
    fn lex_comment(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c != '\n');
        Token::new(TokenKind::Comment, start, self.cursor.pos())
    }

    /// Decimal integer or float. Underscore separators are allowed.
    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');

        // A float needs a digit after the dot.
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            return Token::new(TokenKind::FloatLiteral, start, self.cursor.pos());
        }

        Token::new(TokenKind::IntLiteral, start, self.cursor.pos())
    }

    /// A quoted literal; the token span includes both quotes. An unterminated
    /// literal (end of line or input before the closing quote) is an `Error`.
    fn lex_quoted(&mut self, start: u32, quote: char, kind: TokenKind) -> Token {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return Token::new(TokenKind::Error, start, self.cursor.pos());
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    return Token::new(kind, start, self.cursor.pos());
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        // Ruby-style predicate and bang method names.
        if matches!(self.cursor.peek(), Some('?' | '!')) && self.cursor.peek_next() != Some('=') {
            self.cursor.advance();
        }
        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, start, self.cursor.pos())
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
