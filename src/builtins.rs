//! Native functions visible from every scope.
//!
//! User bindings shadow these: the evaluator only consults [`lookup`] after
//! the scope chain comes up empty.

use crate::object::{Builtin, BuiltinFunction, Object};
use std::rc::Rc;

pub fn lookup(name: &str) -> Option<Builtin> {
    let (name, func): (&'static str, BuiltinFunction) = match name {
        "len" => ("len", len),
        "head" => ("head", head),
        "tail" => ("tail", tail),
        "push" => ("push", push),
        "pushleft" => ("pushleft", pushleft),
        "pop" => ("pop", pop),
        "popleft" => ("popleft", popleft),
        _ => return None,
    };
    Some(Builtin { name, func })
}

fn len(args: &[Rc<Object>]) -> Rc<Object> {
    if let Err(error) = expect_arity(args, 1) {
        return error;
    }
    match args[0].as_ref() {
        Object::String(value) => Object::integer(value.len() as i64),
        Object::Array(elements) => Object::integer(elements.borrow().len() as i64),
        other => unsupported("len", other),
    }
}

/// First element, or null when the array is empty.
fn head(args: &[Rc<Object>]) -> Rc<Object> {
    with_array("head", args, 1, |elements, _| {
        elements.first().cloned().unwrap_or_else(Object::null)
    })
}

/// Last element, or null when the array is empty.
fn tail(args: &[Rc<Object>]) -> Rc<Object> {
    with_array("tail", args, 1, |elements, _| {
        elements.last().cloned().unwrap_or_else(Object::null)
    })
}

fn push(args: &[Rc<Object>]) -> Rc<Object> {
    with_array("push", args, 2, |elements, args| {
        elements.push(Rc::clone(&args[1]));
        Object::null()
    })
}

fn pushleft(args: &[Rc<Object>]) -> Rc<Object> {
    with_array("pushleft", args, 2, |elements, args| {
        elements.insert(0, Rc::clone(&args[1]));
        Object::null()
    })
}

// pop and popleft hand back the shrunken array itself, not the removed element.
fn pop(args: &[Rc<Object>]) -> Rc<Object> {
    with_array("pop", args, 1, |elements, args| match elements.pop() {
        Some(_) => Rc::clone(&args[0]),
        None => Object::null(),
    })
}

fn popleft(args: &[Rc<Object>]) -> Rc<Object> {
    with_array("popleft", args, 1, |elements, args| {
        if elements.is_empty() {
            Object::null()
        } else {
            elements.remove(0);
            Rc::clone(&args[0])
        }
    })
}

/// Validates arity and that the first argument is an array, then runs `body`
/// with that array's elements borrowed mutably.
fn with_array<F>(name: &str, args: &[Rc<Object>], arity: usize, body: F) -> Rc<Object>
where
    F: FnOnce(&mut Vec<Rc<Object>>, &[Rc<Object>]) -> Rc<Object>,
{
    if let Err(error) = expect_arity(args, arity) {
        return error;
    }
    match args[0].as_ref() {
        // No array stays borrowed across evaluation steps, and `body` borrows
        // nothing else, so this borrow is always the only one.
        Object::Array(elements) => body(&mut *elements.borrow_mut(), args),
        other => unsupported(name, other),
    }
}

fn expect_arity(args: &[Rc<Object>], expected: usize) -> Result<(), Rc<Object>> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Object::error(format!(
            "wrong number of arguments: expected {}, but received {}",
            expected,
            args.len()
        )))
    }
}

fn unsupported(name: &str, arg: &Object) -> Rc<Object> {
    Object::error(format!("{}({}) not supported", name, arg.type_tag()))
}
