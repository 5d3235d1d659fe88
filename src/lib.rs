// Declare modules publicly so they are part of the library interface
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod source;
pub mod types;

pub use environment::{EnvError, Environment};
pub use evaluator::{EvalError, EvalResult, evaluate, interpret};
pub use lexer::{LexerError, Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse_str};
pub use source::Span;
pub use types::{Node, Procedure, Sexpr};

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Any failure surfaced by `run`: a structural parse failure or an
/// evaluation failure. Fail-fast either way; the caller decides whether to
/// continue (a REPL does, a batch run does not).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    pub fn pretty_print(&self, input: &str) {
        match self {
            Error::Parse(e) => e.pretty_print(input),
            Error::Eval(e) => e.pretty_print(input),
        }
    }
}

/// Parses and evaluates a whole program against the given environment,
/// returning the value of the last top-level form.
pub fn run(input: &str, env: &Rc<RefCell<Environment>>) -> Result<Node, Error> {
    let program = parse_str(input)?;
    Ok(interpret(&program, env)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_end_to_end() {
        let env = Environment::new_global_populated();
        let result = run("(define twice (lambda (x) (* 2 x))) (twice 5)", &env).unwrap();
        assert!(matches!(result.kind, Sexpr::Number(n) if n == 10.0));

        // Definitions persist in the environment across runs, REPL-style
        let result = run("(twice 21)", &env).unwrap();
        assert!(matches!(result.kind, Sexpr::Number(n) if n == 42.0));
    }

    #[test]
    fn test_run_wraps_both_error_kinds() {
        let env = Environment::new_global_populated();
        assert!(matches!(run("(+ 1 2", &env), Err(Error::Parse(_))));
        assert!(matches!(run("(+ 1 nope)", &env), Err(Error::Eval(_))));
    }
}
