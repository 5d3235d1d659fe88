use crate::environment::{EnvError, Environment};
use crate::source::Span;
use crate::types::{Lambda, Node, Procedure, Sexpr};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

/// Evaluation nesting limit. Unbounded recursion (a non-tail factorial on a
/// large input, a self-calling loop) fails with `StackOverflow` well before
/// the host stack is at risk.
pub const MAX_EVAL_DEPTH: usize = 500;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error("Not a procedure: {0}")]
    NotAProcedure(Sexpr, Span),
    #[error("'{name}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: String,
        found: usize,
        span: Span,
    },
    #[error("'{name}' expected a {expected}, got a {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },
    #[error("Invalid special form: {0}")]
    InvalidSpecialForm(String, Span),
    #[error("Evaluation exceeded the recursion depth limit")]
    StackOverflow(Span),
    #[error("Empty program has no value")]
    EmptyProgram,
}

// Result type alias for convenience
pub type EvalResult<T = Node> = Result<T, EvalError>;

/// Special-form head symbols. These trigger dedicated evaluation rules and
/// are not looked up in the environment.
pub fn special_form_identifiers() -> HashSet<String> {
    ["if", "define", "lambda"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Evaluates a single expression tree against an environment.
///
/// The environment is an explicit argument threaded through every recursive
/// call. It is never interpreter-wide state, so reentrant and sibling
/// procedure calls each see exactly their own frame chain.
pub fn evaluate(node: &Node, env: &Rc<RefCell<Environment>>) -> EvalResult {
    eval_node(node, env, 0)
}

/// Evaluates a sequence of top-level forms in order, returning the value of
/// the last one. Intermediate values are discarded.
pub fn interpret(program: &[Node], env: &Rc<RefCell<Environment>>) -> EvalResult {
    let mut result = None;
    for form in program {
        result = Some(eval_node(form, env, 0)?);
    }
    result.ok_or(EvalError::EmptyProgram)
}

fn eval_node(node: &Node, env: &Rc<RefCell<Environment>>, depth: usize) -> EvalResult {
    if depth > MAX_EVAL_DEPTH {
        return Err(EvalError::StackOverflow(node.span));
    }

    match &node.kind {
        // Self-evaluating
        Sexpr::Number(_) | Sexpr::Procedure(_) => Ok(node.clone()),

        // Symbols resolve through the scope chain
        Sexpr::Symbol(name) => Ok(env.borrow().get(name, node.span)?),

        // Lists are special forms or procedure calls
        Sexpr::List(elements) => match &elements[..] {
            [] => Err(EvalError::InvalidSpecialForm(
                "cannot evaluate an empty form".to_string(),
                node.span,
            )),
            [head, rest @ ..] => match &head.kind {
                Sexpr::Symbol(name) if name == "if" => eval_if(rest, env, node.span, depth),
                Sexpr::Symbol(name) if name == "define" => {
                    eval_define(rest, env, node.span, depth)
                }
                Sexpr::Symbol(name) if name == "lambda" => eval_lambda(rest, env, node.span),
                _ => eval_call(head, rest, env, node.span, depth),
            },
        },
    }
}

/// Boolean coercion rule for `if`: the number 0 and the empty list are
/// false; every other value is true.
fn is_truthy(value: &Sexpr) -> bool {
    match value {
        Sexpr::Number(n) => *n != 0.0,
        Sexpr::List(elements) => !elements.is_empty(),
        Sexpr::Symbol(_) | Sexpr::Procedure(_) => true,
    }
}

/// `(if test conseq alt)` — exactly one branch is evaluated.
fn eval_if(
    operands: &[Node],
    env: &Rc<RefCell<Environment>>,
    span: Span,
    depth: usize,
) -> EvalResult {
    if let [test, consequent, alternative] = operands {
        let test_result = eval_node(test, env, depth + 1)?;
        if is_truthy(&test_result.kind) {
            eval_node(consequent, env, depth + 1)
        } else {
            eval_node(alternative, env, depth + 1)
        }
    } else {
        Err(EvalError::InvalidSpecialForm(
            "if expects a test, a consequent and an alternative".to_string(),
            span,
        ))
    }
}

/// `(define name expr)` — binds in the current frame and returns the bound
/// value.
fn eval_define(
    operands: &[Node],
    env: &Rc<RefCell<Environment>>,
    span: Span,
    depth: usize,
) -> EvalResult {
    if let [name_node, value_expr] = operands {
        let name = match &name_node.kind {
            Sexpr::Symbol(name) => name.clone(),
            other => {
                return Err(EvalError::InvalidSpecialForm(
                    format!("define expects a symbol name, got a {}", other.type_name()),
                    name_node.span,
                ));
            }
        };
        let value = eval_node(value_expr, env, depth + 1)?;
        env.borrow_mut().define(name, value.clone());
        Ok(value)
    } else {
        Err(EvalError::InvalidSpecialForm(
            "define expects a name and a value expression".to_string(),
            span,
        ))
    }
}

/// `(lambda (params...) body)` — captures the environment active right here,
/// not the one at the eventual call site.
fn eval_lambda(operands: &[Node], env: &Rc<RefCell<Environment>>, span: Span) -> EvalResult {
    if let [params_node, body] = operands {
        let param_list = match &params_node.kind {
            Sexpr::List(params) => params,
            other => {
                return Err(EvalError::InvalidSpecialForm(
                    format!(
                        "lambda expects a parameter list, got a {}",
                        other.type_name()
                    ),
                    params_node.span,
                ));
            }
        };
        let mut params = Vec::with_capacity(param_list.len());
        for param in param_list {
            match &param.kind {
                Sexpr::Symbol(name) => params.push(name.clone()),
                other => {
                    return Err(EvalError::InvalidSpecialForm(
                        format!("lambda parameters must be symbols, got a {}", other.type_name()),
                        param.span,
                    ));
                }
            }
        }
        Ok(Node::new(
            Sexpr::Procedure(Procedure::Lambda(Rc::new(Lambda {
                params,
                body: body.clone(),
                env: env.clone(),
            }))),
            span,
        ))
    } else {
        Err(EvalError::InvalidSpecialForm(
            "lambda expects a parameter list and a body expression".to_string(),
            span,
        ))
    }
}

/// Ordinary application: evaluate the operator, evaluate the operands
/// left-to-right, then apply.
fn eval_call(
    operator: &Node,
    operands: &[Node],
    env: &Rc<RefCell<Environment>>,
    span: Span,
    depth: usize,
) -> EvalResult {
    let operator_value = eval_node(operator, env, depth + 1)?;
    let procedure = match operator_value.kind {
        Sexpr::Procedure(procedure) => procedure,
        other => return Err(EvalError::NotAProcedure(other, operator.span)),
    };

    let mut args = Vec::with_capacity(operands.len());
    for operand in operands {
        args.push(eval_node(operand, env, depth + 1)?);
    }

    apply(procedure, args, span, depth)
}

fn apply(procedure: Procedure, args: Vec<Node>, span: Span, depth: usize) -> EvalResult {
    match procedure {
        Procedure::Primitive(func, _) => func(args, span),
        Procedure::Lambda(lambda) => {
            if args.len() != lambda.params.len() {
                return Err(EvalError::ArityMismatch {
                    name: Sexpr::Procedure(Procedure::Lambda(lambda.clone())).to_string(),
                    expected: format!("exactly {}", lambda.params.len()),
                    found: args.len(),
                    span,
                });
            }
            // Fresh frame per application, parented to the *definition*
            // environment. The frame is dropped when the call completes
            // unless a closure created inside it keeps the Rc alive.
            let call_env = Environment::new_enclosed(lambda.env.clone());
            {
                let mut frame = call_env.borrow_mut();
                for (param, arg) in lambda.params.iter().zip(args) {
                    frame.define(param.clone(), arg);
                }
            }
            eval_node(&lambda.body, &call_env, depth + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    fn eval_str(input: &str) -> EvalResult {
        let env = Environment::new_global_populated();
        let program = parse_str(input).expect("parse failed");
        interpret(&program, &env)
    }

    fn assert_eval_number(input: &str, expected: f64) {
        match eval_str(input) {
            Ok(node) => match node.kind {
                Sexpr::Number(n) => assert_eq!(n, expected, "Input: '{}'", input),
                other => panic!("Expected a number for '{}', got: {}", input, other),
            },
            Err(e) => panic!("Evaluation failed for input '{}': {}", input, e),
        }
    }

    fn assert_eval_error(input: &str, expected_error_variant: &EvalError) {
        match eval_str(input) {
            Ok(result) => panic!(
                "Expected evaluation to fail for input '{}', but got: {}",
                input, result
            ),
            Err(e) => assert_eq!(
                std::mem::discriminant(&e),
                std::mem::discriminant(expected_error_variant),
                "Input: '{}', Expected error variant like {:?}, got: {:?}",
                input,
                expected_error_variant,
                e
            ),
        }
    }

    #[test]
    fn test_eval_self_evaluating() {
        assert_eval_number("123", 123.0);
        assert_eval_number("-4.5", -4.5);
        assert_eval_number("0", 0.0);
    }

    #[test]
    fn test_eval_arithmetic() {
        assert_eval_number("(+ 1 2)", 3.0);
        assert_eval_number("(+ 1 (* 2 3))", 7.0);
        assert_eval_number("(- 10 3)", 7.0);
        assert_eval_number("(* 2 3)", 6.0);
        assert_eval_number("(- (+ 5 5) (* 2 3))", 4.0);
    }

    #[test]
    fn test_eval_comparison() {
        assert_eval_number("(<= 1 2)", 1.0);
        assert_eval_number("(<= 2 2)", 1.0);
        assert_eval_number("(<= 3 2)", 0.0);
    }

    #[test]
    fn test_eval_list_and_first() {
        assert_eval_number("(first (list 1 (+ 2 3) 9))", 1.0);
        match eval_str("(list 1 2)") {
            Ok(node) => match node.kind {
                Sexpr::List(elements) => {
                    assert_eq!(elements.len(), 2);
                    assert!(matches!(elements[0].kind, Sexpr::Number(n) if n == 1.0));
                    assert!(matches!(elements[1].kind, Sexpr::Number(n) if n == 2.0));
                }
                other => panic!("Expected a list, got: {}", other),
            },
            Err(e) => panic!("Evaluation failed: {}", e),
        }
    }

    #[test]
    fn test_eval_begin_with_define_and_pi() {
        match eval_str("(begin (define r 10) (* pi (* r r)))") {
            Ok(node) => match node.kind {
                Sexpr::Number(n) => {
                    assert!((n - 100.0 * std::f64::consts::PI).abs() < 1e-9)
                }
                other => panic!("Expected a number, got: {}", other),
            },
            Err(e) => panic!("Evaluation failed: {}", e),
        }
    }

    #[test]
    fn test_eval_define_returns_bound_value() {
        assert_eval_number("(define x 42)", 42.0);
        assert_eval_number("(define x 1) (define x 2) x", 2.0);
    }

    #[test]
    fn test_eval_interpret_returns_last_value() {
        assert_eval_number("1 2 3", 3.0);
        assert_eval_number("(define x 10) (+ x 5)", 15.0);
    }

    #[test]
    fn test_eval_empty_program() {
        assert_eval_error("", &EvalError::EmptyProgram);
    }

    #[test]
    fn test_eval_if_truthiness() {
        // Only the number 0 and the empty list are false
        assert_eval_number("(if 1 10 20)", 10.0);
        assert_eval_number("(if 0 10 20)", 20.0);
        assert_eval_number("(if -1 10 20)", 10.0);
        assert_eval_number("(if (list) 10 20)", 20.0);
        assert_eval_number("(if (list 0) 10 20)", 10.0);
    }

    #[test]
    fn test_eval_if_short_circuits() {
        // The untaken branch holds an unbound symbol and must not run
        assert_eval_number("(if 1 42 no-such-symbol)", 42.0);
        assert_eval_number("(if 0 no-such-symbol 42)", 42.0);
    }

    #[test]
    fn test_eval_lambda_application() {
        assert_eval_number("(define twice (lambda (x) (* 2 x))) (twice 5)", 10.0);
        assert_eval_number("((lambda (x) (+ x 1)) 41)", 42.0);
    }

    #[test]
    fn test_eval_lexical_capture() {
        // The inner lambda closes over its defining frame, not the caller's
        assert_eval_number(
            "(define make-adder (lambda (n) (lambda (x) (+ x n)))) \
             (define add5 (make-adder 5)) \
             (add5 3)",
            8.0,
        );
    }

    #[test]
    fn test_eval_sibling_calls_do_not_leak() {
        assert_eval_number(
            "(define make-adder (lambda (n) (lambda (x) (+ x n)))) \
             (define add5 (make-adder 5)) \
             (define add7 (make-adder 7)) \
             (+ (add5 10) (add7 10))",
            32.0,
        );
        assert_eval_number("(define id (lambda (x) x)) (+ (id 1) (id 2))", 3.0);
    }

    #[test]
    fn test_eval_recursive_factorial() {
        assert_eval_number(
            "(define fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1)))))) (fact 10)",
            3628800.0,
        );
    }

    #[test]
    fn test_eval_recursive_fibonacci() {
        assert_eval_number(
            "(define fib (lambda (n) (if (<= n 1) n (+ (fib (- n 1)) (fib (- n 2)))))) (fib 10)",
            55.0,
        );
    }

    #[test]
    fn test_eval_unbound_symbol() {
        let unbound = EvalError::Env(EnvError::UnboundSymbol("".into(), Span::default()));
        assert_eval_error("no-such-symbol", &unbound);
        assert_eval_error("(+ 1 no-such-symbol)", &unbound);
    }

    #[test]
    fn test_eval_arity_mismatch() {
        let arity = EvalError::ArityMismatch {
            name: "".into(),
            expected: "".into(),
            found: 0,
            span: Span::default(),
        };
        // The arithmetic natives are strictly binary
        assert_eval_error("(+ 1)", &arity);
        assert_eval_error("(+ 1 2 3)", &arity);
        assert_eval_error("(<= 1)", &arity);
        assert_eval_error("(begin)", &arity);
        assert_eval_error("(define twice (lambda (x) (* 2 x))) (twice 1 2)", &arity);
        assert_eval_error("(define twice (lambda (x) (* 2 x))) (twice)", &arity);
    }

    #[test]
    fn test_eval_type_mismatch() {
        let type_mismatch = EvalError::TypeMismatch {
            name: "".into(),
            expected: "",
            found: "",
            span: Span::default(),
        };
        assert_eval_error("(+ 1 (list 1))", &type_mismatch);
        assert_eval_error("(first 5)", &type_mismatch);
        assert_eval_error("(first (list))", &type_mismatch);
    }

    #[test]
    fn test_eval_not_a_procedure() {
        let not_proc = EvalError::NotAProcedure(Sexpr::Number(0.0), Span::default());
        assert_eval_error("(1 2 3)", &not_proc);
        assert_eval_error("((list 1 2) 3)", &not_proc);
    }

    #[test]
    fn test_eval_invalid_special_forms() {
        let invalid = EvalError::InvalidSpecialForm("".into(), Span::default());
        assert_eval_error("()", &invalid);
        assert_eval_error("(if 1)", &invalid);
        assert_eval_error("(if 1 2)", &invalid);
        assert_eval_error("(define 1 2)", &invalid);
        assert_eval_error("(define x)", &invalid);
        assert_eval_error("(lambda x)", &invalid);
        assert_eval_error("(lambda (1) 1)", &invalid);
    }

    #[test]
    fn test_eval_stack_overflow() {
        let overflow = EvalError::StackOverflow(Span::default());
        assert_eval_error("(define loop (lambda (n) (loop (+ n 1)))) (loop 0)", &overflow);
        assert_eval_error(
            "(define fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1)))))) (fact 100000)",
            &overflow,
        );
    }

    #[test]
    fn test_special_form_identifiers() {
        let forms = special_form_identifiers();
        assert!(forms.contains("if"));
        assert!(forms.contains("define"));
        assert!(forms.contains("lambda"));
        assert_eq!(forms.len(), 3);
    }
}
