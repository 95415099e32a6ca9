use crate::ast::{BlockStatement, Identifier};
use crate::environment::Environment;
use crate::stack::ensure_sufficient_stack;
use fnv::FnvHasher;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::Hasher;
use std::rc::Rc;

/// Runtime values.
///
/// Evaluation hands values around as `Rc<Object>` so that identity is
/// observable: arrays are mutated in place through every handle, and the
/// `==` operator compares anything other than integers by reference. Booleans
/// and null must therefore be obtained through [`Object::boolean`] and
/// [`Object::null`], which return the pooled instances.
#[derive(Debug)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(String),
    Null,
    Array(RefCell<Vec<Rc<Object>>>),
    Hash(BTreeMap<HashKey, HashPair>),
    Function(Function),
    Builtin(Builtin),
    /// Carries a `return` up to the nearest function call; never user-visible.
    ReturnValue(Rc<Object>),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectType {
    Integer,
    Boolean,
    String,
    Null,
    Array,
    Hash,
    Function,
    Builtin,
    ReturnValue,
    Error,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Integer => "INTEGER",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::String => "STRING",
            ObjectType::Null => "NULL",
            ObjectType::Array => "ARRAY",
            ObjectType::Hash => "HASH",
            ObjectType::Function => "FUNCTION",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::ReturnValue => "RETURN_VALUE",
            ObjectType::Error => "ERROR",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a hashable value inside a hash map: its type plus a 64-bit hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashKey {
    pub object_type: ObjectType,
    pub value: u64,
}

#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Rc<Object>,
    pub value: Rc<Object>,
}

/// A user-defined function together with the scope it was created in.
#[derive(Debug, Clone)]
pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Environment,
}

pub type BuiltinFunction = fn(&[Rc<Object>]) -> Rc<Object>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFunction,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

const TRUE_HASH: u64 = 1;
const FALSE_HASH: u64 = 0;

thread_local! {
    static TRUE: Rc<Object> = Rc::new(Object::Boolean(true));
    static FALSE: Rc<Object> = Rc::new(Object::Boolean(false));
    static NULL: Rc<Object> = Rc::new(Object::Null);
}

impl Object {
    /// The pooled `true` or `false` instance.
    pub fn boolean(value: bool) -> Rc<Object> {
        if value {
            TRUE.with(Rc::clone)
        } else {
            FALSE.with(Rc::clone)
        }
    }

    /// The pooled `null` instance.
    pub fn null() -> Rc<Object> {
        NULL.with(Rc::clone)
    }

    pub fn integer(value: i64) -> Rc<Object> {
        Rc::new(Object::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Rc<Object> {
        Rc::new(Object::String(value.into()))
    }

    pub fn array(elements: Vec<Rc<Object>>) -> Rc<Object> {
        Rc::new(Object::Array(RefCell::new(elements)))
    }

    pub fn error(message: impl Into<String>) -> Rc<Object> {
        Rc::new(Object::Error(message.into()))
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Integer(_) => ObjectType::Integer,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::String(_) => ObjectType::String,
            Object::Null => ObjectType::Null,
            Object::Array(_) => ObjectType::Array,
            Object::Hash(_) => ObjectType::Hash,
            Object::Function(_) => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::ReturnValue(_) => ObjectType::ReturnValue,
            Object::Error(_) => ObjectType::Error,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        self.object_type().as_str()
    }

    /// Text shown to the user, e.g. by the REPL.
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// `None` for values that cannot key a hash map.
    pub fn hash_key(&self) -> Option<HashKey> {
        let value = match self {
            Object::Integer(value) => *value as u64,
            Object::Boolean(true) => TRUE_HASH,
            Object::Boolean(false) => FALSE_HASH,
            Object::String(value) => {
                let mut hasher = FnvHasher::default();
                hasher.write(value.as_bytes());
                hasher.finish()
            }
            _ => return None,
        };
        Some(HashKey {
            object_type: self.object_type(),
            value,
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// True for values that stop the statements of a block: errors and returns.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Object::Error(_) | Object::ReturnValue(_))
    }
}

/// Structural comparison, used by tests and host code.
///
/// The language's own `==` does not go through this: it compares integers
/// by value and everything else by identity.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(l), Object::Integer(r)) => l == r,
            (Object::Boolean(l), Object::Boolean(r)) => l == r,
            (Object::String(l), Object::String(r)) => l == r,
            (Object::Null, Object::Null) => true,
            (Object::Array(l), Object::Array(r)) => {
                std::ptr::eq(l, r) || *l.borrow() == *r.borrow()
            }
            (Object::Hash(l), Object::Hash(r)) => {
                l.len() == r.len()
                    && l.iter().zip(r.iter()).all(|((lk, lp), (rk, rp))| {
                        lk == rk && lp.key == rp.key && lp.value == rp.value
                    })
            }
            (Object::Function(l), Object::Function(r)) => {
                l.parameters == r.parameters && l.body == r.body && l.env.ptr_eq(&r.env)
            }
            (Object::Builtin(l), Object::Builtin(r)) => l.name == r.name,
            (Object::ReturnValue(l), Object::ReturnValue(r)) => l == r,
            (Object::Error(l), Object::Error(r)) => l == r,
            _ => false,
        }
    }
}

thread_local! {
    static RENDERING: RefCell<HashSet<*const Object>> = RefCell::new(HashSet::new());
}

/// Marks an array as being rendered on this thread until dropped.
struct RenderGuard(*const Object);

impl RenderGuard {
    /// `None` when the array is already being rendered further up the stack.
    fn enter(object: &Object) -> Option<Self> {
        let pointer = object as *const Object;
        RENDERING.with(|active| active.borrow_mut().insert(pointer).then(|| RenderGuard(pointer)))
    }
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        RENDERING.with(|active| {
            active.borrow_mut().remove(&self.0);
        });
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::String(value) => write!(f, "{}", value),
            Object::Null => write!(f, "null"),
            Object::Array(elements) => {
                // An array reachable from itself is shown once, then elided.
                let _guard = match RenderGuard::enter(self) {
                    Some(guard) => guard,
                    None => return write!(f, "[...]"),
                };
                ensure_sufficient_stack(|| {
                    write!(f, "[")?;
                    for (i, element) in elements.borrow().iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", element)?;
                    }
                    write!(f, "]")
                })
            }
            Object::Hash(pairs) => ensure_sufficient_stack(|| {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }),
            Object::Function(function) => {
                write!(f, "func(")?;
                for (i, parameter) in function.parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                write!(f, ") {}", function.body)
            }
            Object::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),
            Object::ReturnValue(value) => write!(f, "{}", value),
            Object::Error(message) => write!(f, "[ERROR] {}", message),
        }
    }
}
