use crate::environment::Environment;
use crate::evaluator::EvalResult;
use crate::source::Span;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// An expression-tree node: the S-expression data plus the source span it
/// covers. Both code and runtime values use this one representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Sexpr,
    pub span: Span,
}

impl Node {
    pub fn new(kind: Sexpr, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn new_number(n: f64, span: Span) -> Self {
        Node::new(Sexpr::Number(n), span)
    }

    pub fn new_symbol(name: impl Into<String>, span: Span) -> Self {
        Node::new(Sexpr::Symbol(name.into()), span)
    }

    pub fn new_list(elements: Vec<Node>, span: Span) -> Self {
        Node::new(Sexpr::List(elements), span)
    }

    pub fn new_primitive(func: PrimitiveFunc, name: &str, span: Span) -> Self {
        Node::new(
            Sexpr::Procedure(Procedure::Primitive(func, name.to_string())),
            span,
        )
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// The tagged union at the heart of the interpreter. Trees are acyclic and
/// read-only once built; evaluation clones sub-trees rather than mutating.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    Number(f64),
    Symbol(String),
    List(Vec<Node>),
    Procedure(Procedure),
}

impl Sexpr {
    pub fn type_name(&self) -> &'static str {
        match self {
            Sexpr::Number(_) => "number",
            Sexpr::Symbol(_) => "symbol",
            Sexpr::List(_) => "list",
            Sexpr::Procedure(_) => "procedure",
        }
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Number(n) => write!(f, "{}", n),
            Sexpr::Symbol(s) => write!(f, "{}", s),
            Sexpr::List(list) => {
                write!(f, "(")?;
                let mut first = true;
                for expr in list {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", expr)?;
                    first = false;
                }
                write!(f, ")")
            }
            Sexpr::Procedure(procedure) => match procedure {
                Procedure::Primitive(_, name) => write!(f, "#<primitive:{}>", name),
                Procedure::Lambda(lambda) => {
                    write!(f, "#<lambda:({})>", lambda.params.join(" "))
                }
            },
        }
    }
}

pub type PrimitiveFunc = fn(Vec<Node>, Span) -> EvalResult;

#[derive(Clone)]
pub enum Procedure {
    /// A native callable plus its name (for display/debug).
    Primitive(PrimitiveFunc, String),
    /// A user-defined closure. Shared via Rc so a value cloned out of an
    /// environment still points at the same captured scope.
    Lambda(Rc<Lambda>),
}

/// Parameter names, a single body expression, and the environment that was
/// active when the `lambda` form was evaluated. The captured environment is
/// never reassigned, though definitions inside it may still accumulate.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Node,
    pub env: Rc<RefCell<Environment>>,
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Primitive(_, name) => write!(f, "Primitive({})", name),
            Procedure::Lambda(lambda) => write!(f, "Lambda({})", lambda.params.join(" ")),
        }
    }
}

// Function pointers don't implement PartialEq directly, so primitives compare
// by name and lambdas by identity of their shared allocation.
impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Procedure::Primitive(_, n1), Procedure::Primitive(_, n2)) => n1 == n2,
            (Procedure::Lambda(l1), Procedure::Lambda(l2)) => Rc::ptr_eq(l1, l2),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: Sexpr) -> Node {
        Node::new(kind, Span::default())
    }

    #[test]
    fn test_display_atoms() {
        assert_eq!(node(Sexpr::Number(42.0)).to_string(), "42");
        assert_eq!(node(Sexpr::Number(-4.5)).to_string(), "-4.5");
        assert_eq!(node(Sexpr::Symbol("twice".to_string())).to_string(), "twice");
    }

    #[test]
    fn test_display_lists() {
        let inner = node(Sexpr::List(vec![
            node(Sexpr::Symbol("*".to_string())),
            node(Sexpr::Number(2.0)),
            node(Sexpr::Number(3.0)),
        ]));
        let outer = node(Sexpr::List(vec![
            node(Sexpr::Symbol("+".to_string())),
            node(Sexpr::Number(1.0)),
            inner,
        ]));
        assert_eq!(outer.to_string(), "(+ 1 (* 2 3))");
        assert_eq!(node(Sexpr::List(vec![])).to_string(), "()");
    }
}
