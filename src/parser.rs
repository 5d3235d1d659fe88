use crate::Span;
use crate::lexer::{LexerError, Token, TokenKind};
use crate::types::Node;
use std::iter::Peekable;
use std::vec::IntoIter;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Tokens ran out while a list was still open. The payload describes
    /// what the parser was waiting for.
    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEndOfInput(String),
    /// A ')' appeared with no matching open list.
    #[error("Unmatched ')' at {0}")]
    UnmatchedParenthesis(Span),
    #[error("Lexer error during parse: {0}")]
    Lexer(#[from] LexerError),
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser over an owned token stream. A single cursor
/// advances monotonically; tokens are consumed exactly once, no backtracking.
pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter().peekable(),
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    fn peek_token(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    /// Parses the whole program: `program -> s_expr*`. Returns the ordered
    /// sequence of top-level expressions, however many there are.
    pub fn parse(mut self) -> ParseResult<Vec<Node>> {
        let mut program = Vec::new();
        while self.peek_token().is_some() {
            program.push(self.parse_expr()?);
        }
        Ok(program)
    }

    /// Parses a single S-expression: `s_expr -> list | atom`.
    pub fn parse_expr(&mut self) -> ParseResult<Node> {
        let token = self.next_token();
        self.parse_expr_with_token(token)
    }

    fn parse_expr_with_token(&mut self, token: Option<Token>) -> ParseResult<Node> {
        match token {
            Some(Token {
                kind: TokenKind::LParen,
                span,
            }) => self.parse_list(span),
            Some(Token {
                kind: TokenKind::RParen,
                span,
            }) => Err(ParseError::UnmatchedParenthesis(span)),
            Some(Token {
                kind: TokenKind::Number(n),
                span,
            }) => Ok(Node::new_number(n, span)),
            Some(Token {
                kind: TokenKind::Symbol(s),
                span,
            }) => Ok(Node::new_symbol(s, span)),
            None => Err(ParseError::UnexpectedEndOfInput(
                "an expression".to_string(),
            )),
        }
    }

    /// Parses the remainder of `'(' s_expr* ')'` after the opening paren.
    /// The list node's span covers both parentheses.
    fn parse_list(&mut self, lparen_span: Span) -> ParseResult<Node> {
        let mut elements = Vec::new();
        loop {
            match self.next_token() {
                Some(Token {
                    kind: TokenKind::RParen,
                    span,
                }) => {
                    return Ok(Node::new_list(elements, lparen_span.merge(span)));
                }
                Some(token) => elements.push(self.parse_expr_with_token(Some(token))?),
                None => return Err(ParseError::UnexpectedEndOfInput("')'".to_string())),
            }
        }
    }
}

/// Helper to lex and parse a whole program directly (tests, CLI, REPL).
pub fn parse_str(input: &str) -> ParseResult<Vec<Node>> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}
