use crate::evaluator::{EvalError, EvalResult};
use crate::source::Span;
use crate::types::{Node, Sexpr};

// Native procedures receive their already-evaluated arguments positionally.
// The span is the span of the whole call form, used for result nodes and
// call-level errors; argument-level errors point at the offending argument.

fn arity_error(name: &str, expected: &str, found: usize, span: Span) -> EvalError {
    EvalError::ArityMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        found,
        span,
    }
}

fn expect_number(node: &Node, name: &str) -> Result<f64, EvalError> {
    match node.kind {
        Sexpr::Number(n) => Ok(n),
        ref other => Err(EvalError::TypeMismatch {
            name: name.to_string(),
            expected: "number",
            found: other.type_name(),
            span: node.span,
        }),
    }
}

fn binary_numeric<F: Fn(f64, f64) -> f64>(
    args: Vec<Node>,
    span: Span,
    name: &str,
    func: F,
) -> EvalResult {
    if let [left, right] = &args[..] {
        let result = func(expect_number(left, name)?, expect_number(right, name)?);
        Ok(Node::new_number(result, span))
    } else {
        Err(arity_error(name, "exactly 2", args.len(), span))
    }
}

pub fn prim_add(args: Vec<Node>, span: Span) -> EvalResult {
    binary_numeric(args, span, "+", |left, right| left + right)
}

pub fn prim_sub(args: Vec<Node>, span: Span) -> EvalResult {
    binary_numeric(args, span, "-", |left, right| left - right)
}

pub fn prim_mul(args: Vec<Node>, span: Span) -> EvalResult {
    binary_numeric(args, span, "*", |left, right| left * right)
}

/// `(<= a b)` — the language has no boolean type, so comparisons answer with
/// 1 or 0, matching the `if` coercion rule.
pub fn prim_less_than_or_equals(args: Vec<Node>, span: Span) -> EvalResult {
    binary_numeric(args, span, "<=", |left, right| {
        if left <= right { 1.0 } else { 0.0 }
    })
}

/// `(list e1 e2 ...)` — returns its evaluated arguments as an ordered list.
pub fn prim_list(args: Vec<Node>, span: Span) -> EvalResult {
    Ok(Node::new_list(args, span))
}

/// `(first lst)` — first element of a non-empty list.
pub fn prim_first(args: Vec<Node>, span: Span) -> EvalResult {
    if let [arg] = &args[..] {
        match &arg.kind {
            Sexpr::List(elements) => match elements.first() {
                Some(first) => Ok(first.clone()),
                None => Err(EvalError::TypeMismatch {
                    name: "first".to_string(),
                    expected: "non-empty list",
                    found: "empty list",
                    span: arg.span,
                }),
            },
            other => Err(EvalError::TypeMismatch {
                name: "first".to_string(),
                expected: "list",
                found: other.type_name(),
                span: arg.span,
            }),
        }
    } else {
        Err(arity_error("first", "exactly 1", args.len(), span))
    }
}

/// `(begin e1 e2 ...)` — the arguments were already evaluated left-to-right
/// by the call mechanism; begin just answers with the last of them. This is
/// how multi-expression bodies are sequenced.
pub fn prim_begin(args: Vec<Node>, span: Span) -> EvalResult {
    match args.last() {
        Some(last) => Ok(last.clone()),
        None => Err(arity_error("begin", "at least 1", 0, span)),
    }
}
