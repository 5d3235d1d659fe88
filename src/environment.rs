use crate::source::Span;
use crate::types::{Node, PrimitiveFunc, Sexpr};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("Unbound symbol: '{0}'")]
    UnboundSymbol(String, Span), // Symbol name, span where the lookup happened
}

/// A single scope frame: symbol bindings plus an optional link to the
/// enclosing scope. Frames are shared via Rc<RefCell<..>> because closures
/// keep their definition environment alive after the defining call returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    outer: Option<Rc<RefCell<Environment>>>,
    bindings: HashMap<String, Node>,
}

impl Environment {
    /// Creates a new, empty top-level environment.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: None,
            bindings: HashMap::new(),
        }))
    }

    /// Creates the global environment with the native procedure table bound.
    /// This must run before any user code is evaluated.
    pub fn new_global_populated() -> Rc<RefCell<Environment>> {
        let env_ptr = Environment::new();
        {
            let mut env = env_ptr.borrow_mut();
            env.add_primitive("+", crate::primitives::prim_add);
            env.add_primitive("-", crate::primitives::prim_sub);
            env.add_primitive("*", crate::primitives::prim_mul);
            env.add_primitive("<=", crate::primitives::prim_less_than_or_equals);
            env.add_primitive("list", crate::primitives::prim_list);
            env.add_primitive("first", crate::primitives::prim_first);
            env.add_primitive("begin", crate::primitives::prim_begin);

            // `pi` is a plain numeric binding, not a procedure
            env.define(
                "pi".to_string(),
                Node::new(Sexpr::Number(std::f64::consts::PI), Span::default()),
            );
        }
        env_ptr
    }

    /// Creates a new environment enclosed within an outer one. Called once
    /// per procedure application, parented to the procedure's definition
    /// environment.
    pub fn new_enclosed(outer_env: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer_env),
            bindings: HashMap::new(),
        }))
    }

    /// Binds a name in the *current* frame only, shadowing any enclosing
    /// binding and replacing a same-frame one. This is the language's only
    /// write path; there is deliberately no outer-scope mutation.
    pub fn define(&mut self, name: String, value_node: Node) {
        self.bindings.insert(name, value_node);
    }

    /// Looks a symbol up, innermost frame first, walking the outer chain.
    /// `lookup_span` is where the symbol was referenced, for diagnostics.
    pub fn get(&self, name: &str, lookup_span: Span) -> Result<Node, EnvError> {
        if let Some(value_node) = self.bindings.get(name) {
            Ok(value_node.clone())
        } else {
            match &self.outer {
                Some(outer_env_ptr) => outer_env_ptr.borrow().get(name, lookup_span),
                None => Err(EnvError::UnboundSymbol(name.to_string(), lookup_span)),
            }
        }
    }

    fn add_primitive(&mut self, name: &str, func: PrimitiveFunc) {
        let node = Node::new_primitive(func, name, Span::default());
        self.define(name.to_string(), node);
    }

    fn collect_identifiers(&self, mut identifiers: HashSet<String>) -> HashSet<String> {
        for identifier in self.bindings.keys() {
            identifiers.insert(identifier.to_string());
        }
        match &self.outer {
            Some(outer_env_ptr) => outer_env_ptr.borrow().collect_identifiers(identifiers),
            None => identifiers,
        }
    }

    /// All names bound anywhere in the chain. Used by the REPL completer.
    pub fn identifiers(&self) -> HashSet<String> {
        self.collect_identifiers(HashSet::new())
    }
}
