use crate::environment::EnvError;
use crate::evaluator::EvalError;
use crate::parser::ParseError;
use ariadne::{Label, Report, ReportKind, Source};

const SRC_ID: &str = "program";

impl EvalError {
    /// Renders the error as an ariadne report against the source text that
    /// produced it.
    pub fn pretty_print(&self, input: &str) {
        let report = match self {
            EvalError::Env(EnvError::UnboundSymbol(symbol, span)) => {
                Report::build(ReportKind::Error, (SRC_ID, span.to_range()))
                    .with_message(format!("Unbound symbol `{}`", symbol))
                    .with_label(
                        Label::new((SRC_ID, span.to_range()))
                            .with_message("no scope in the chain defines this symbol"),
                    )
            }
            EvalError::NotAProcedure(sexpr, span) => {
                Report::build(ReportKind::Error, (SRC_ID, span.to_range()))
                    .with_message(format!("Not a procedure: {}", sexpr))
                    .with_label(
                        Label::new((SRC_ID, span.to_range()))
                            .with_message(format!("this {} cannot be applied", sexpr.type_name())),
                    )
            }
            EvalError::ArityMismatch {
                name,
                expected,
                found,
                span,
            } => Report::build(ReportKind::Error, (SRC_ID, span.to_range()))
                .with_message(format!("Wrong number of arguments for '{}'", name))
                .with_label(Label::new((SRC_ID, span.to_range())).with_message(format!(
                    "expects {} argument(s), got {}",
                    expected, found
                ))),
            EvalError::TypeMismatch {
                name,
                expected,
                found,
                span,
            } => Report::build(ReportKind::Error, (SRC_ID, span.to_range()))
                .with_message(format!("Type mismatch in call to '{}'", name))
                .with_label(
                    Label::new((SRC_ID, span.to_range()))
                        .with_message(format!("expected a {}, found a {}", expected, found)),
                ),
            EvalError::InvalidSpecialForm(message, span) => {
                Report::build(ReportKind::Error, (SRC_ID, span.to_range()))
                    .with_message("Invalid special form")
                    .with_label(Label::new((SRC_ID, span.to_range())).with_message(message))
            }
            EvalError::StackOverflow(span) => {
                Report::build(ReportKind::Error, (SRC_ID, span.to_range()))
                    .with_message("Recursion limit exceeded")
                    .with_label(
                        Label::new((SRC_ID, span.to_range()))
                            .with_message("evaluation of this expression recursed too deeply"),
                    )
            }
            EvalError::EmptyProgram => Report::build(ReportKind::Error, (SRC_ID, 0..0))
                .with_message("Empty program has no value"),
        };
        report
            .finish()
            .eprint((SRC_ID, Source::from(input)))
            .ok();
    }
}

impl ParseError {
    pub fn pretty_print(&self, input: &str) {
        let report = match self {
            ParseError::UnexpectedEndOfInput(expected) => {
                let idx = input.len();
                Report::build(ReportKind::Error, (SRC_ID, idx..idx))
                    .with_message("Unexpected end of input")
                    .with_label(
                        Label::new((SRC_ID, idx..idx))
                            .with_message(format!("expected {}", expected)),
                    )
            }
            ParseError::UnmatchedParenthesis(span) => {
                Report::build(ReportKind::Error, (SRC_ID, span.to_range()))
                    .with_message("Unmatched ')'")
                    .with_label(
                        Label::new((SRC_ID, span.to_range()))
                            .with_message("no open list matches this parenthesis"),
                    )
            }
            ParseError::Lexer(lex_err) => {
                Report::build(ReportKind::Error, (SRC_ID, lex_err.span.to_range()))
                    .with_message("Lexer error")
                    .with_label(
                        Label::new((SRC_ID, lex_err.span.to_range()))
                            .with_message(lex_err.error.to_string()),
                    )
            }
        };
        report
            .finish()
            .eprint((SRC_ID, Source::from(input)))
            .ok();
    }
}
