// YAIL language interpreter library
//
// Source text goes through the lexer and the Pratt parser into an AST, which
// the tree-walking evaluator runs against a chain of shared scopes.

// Public modules
pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod repl;
pub mod runner;
mod stack;
pub mod token;

// Re-export commonly used items
pub use ast::{Expression, Program, Statement};
pub use environment::{EnvError, Environment};
pub use error::{ErrorKind, Span, YailError};
pub use evaluator::{eval, Evaluator};
pub use lexer::Lexer;
pub use object::Object;
pub use parser::{parse, Parser};
pub use token::{Token, TokenType};

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::run;
