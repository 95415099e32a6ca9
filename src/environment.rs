//! Lexically scoped bindings.
//!
//! An [`Environment`] is a cheap handle to one scope. Scopes only point
//! outward to their parent, and a closure keeps its defining scope alive by
//! holding a handle to it, so a scope lives as long as its longest holder.

use crate::ast::Mutability;
use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("given identifier '{0}' is already declared")]
    AlreadyDeclared(String),
    #[error("can not reassign variables declared with 'val'")]
    Immutable(String),
    #[error("identifier not found: {0}")]
    Undefined(String),
}

#[derive(Clone)]
struct Binding {
    value: Rc<Object>,
    mutability: Mutability,
}

struct Scope {
    bindings: HashMap<String, Binding>,
    outer: Option<Environment>,
}

#[derive(Clone)]
pub struct Environment {
    scope: Rc<RefCell<Scope>>,
}

impl Environment {
    /// A global scope with no parent.
    pub fn new() -> Self {
        Self::with_outer(None)
    }

    /// A fresh scope whose lookups fall back to `outer`.
    pub fn enclosed(outer: &Environment) -> Self {
        Self::with_outer(Some(outer.clone()))
    }

    fn with_outer(outer: Option<Environment>) -> Self {
        Self {
            scope: Rc::new(RefCell::new(Scope {
                bindings: HashMap::new(),
                outer,
            })),
        }
    }

    /// Resolves `name` through this scope and then each outer scope in turn.
    pub fn get(&self, name: &str) -> Option<Rc<Object>> {
        let scope = self.scope.borrow();
        match scope.bindings.get(name) {
            Some(binding) => Some(Rc::clone(&binding.value)),
            None => scope.outer.as_ref().and_then(|outer| outer.get(name)),
        }
    }

    /// Introduces `name` in this scope only; outer bindings may be shadowed.
    pub fn declare(
        &self,
        name: &str,
        value: Rc<Object>,
        mutability: Mutability,
    ) -> Result<(), EnvError> {
        let mut scope = self.scope.borrow_mut();
        if scope.bindings.contains_key(name) {
            return Err(EnvError::AlreadyDeclared(name.to_string()));
        }
        scope
            .bindings
            .insert(name.to_string(), Binding { value, mutability });
        Ok(())
    }

    /// Updates the scope that defines `name`, searching outward from this one.
    pub fn reassign(&self, name: &str, value: Rc<Object>) -> Result<(), EnvError> {
        let mut scope = self.scope.borrow_mut();
        if let Some(binding) = scope.bindings.get_mut(name) {
            if !binding.mutability.is_mutable() {
                return Err(EnvError::Immutable(name.to_string()));
            }
            binding.value = value;
            return Ok(());
        }
        match &scope.outer {
            Some(outer) => outer.reassign(name, value),
            None => Err(EnvError::Undefined(name.to_string())),
        }
    }

    /// True when both handles refer to the same scope.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.scope, &other.scope)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// Closures stored in a scope point back at it, so printing values would recurse.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let scope = self.scope.borrow();
        let mut names: Vec<&String> = scope.bindings.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("has_outer", &scope.outer.is_some())
            .finish()
    }
}
