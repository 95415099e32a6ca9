//! AST produced by the parser.
//!
//! Every composite node owns its children, the tree is never shared or mutated
//! after parsing. `Display` renders the canonical form used by diagnostics and
//! tests: infix and prefix expressions are fully parenthesized and every
//! statement ends in `;`.

use crate::token::TokenType;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn token_literal(&self) -> String {
        self.statements
            .first()
            .map(Statement::token_literal)
            .unwrap_or_default()
    }
}

/// Whether a binding may later be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Declared with `var`.
    Mutable,
    /// Declared with `val`.
    Immutable,
}

impl Mutability {
    pub fn keyword(&self) -> &'static str {
        match self {
            Mutability::Mutable => "var",
            Mutability::Immutable => "val",
        }
    }

    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Binding {
        mutability: Mutability,
        name: Identifier,
        value: Expression,
    },
    Reassignment {
        name: Identifier,
        value: Expression,
    },
    Return {
        value: Expression,
    },
    Expression(Expression),
    Block(BlockStatement),
}

impl Statement {
    /// Builds a binding from the keyword token that introduced it.
    ///
    /// # Panics
    ///
    /// Panics when `keyword` is not `var` or `val`; the parser only calls this
    /// after matching one of them.
    pub fn binding(keyword: TokenType, name: Identifier, value: Expression) -> Self {
        let mutability = match keyword {
            TokenType::Var => Mutability::Mutable,
            TokenType::Val => Mutability::Immutable,
            other => panic!("binding statement requires 'var' or 'val', got '{}'", other),
        };
        Statement::Binding {
            mutability,
            name,
            value,
        }
    }

    pub fn token_literal(&self) -> String {
        match self {
            Statement::Binding { mutability, .. } => mutability.keyword().to_string(),
            Statement::Reassignment { name, .. } => name.name.clone(),
            Statement::Return { .. } => TokenType::Return.as_str().to_string(),
            Statement::Expression(expr) => expr.token_literal(),
            Statement::Block(_) => TokenType::LeftBrace.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

impl BlockStatement {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    Integer(i64),
    String(String),
    Boolean(bool),
    Null,
    Prefix {
        operator: PrefixOperator,
        operand: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        operator: InfixOperator,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Function {
        parameters: Vec<Identifier>,
        body: BlockStatement,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    /// Key/value pairs in source order.
    Hash(Vec<(Expression, Expression)>),
    Index {
        collection: Box<Expression>,
        index: Box<Expression>,
    },
}

impl Expression {
    pub fn token_literal(&self) -> String {
        match self {
            Expression::Identifier(identifier) => identifier.name.clone(),
            Expression::Integer(value) => value.to_string(),
            Expression::String(value) => value.clone(),
            Expression::Boolean(value) => value.to_string(),
            Expression::Null => TokenType::Null.as_str().to_string(),
            Expression::Prefix { operator, .. } => operator.to_string(),
            Expression::Infix { operator, .. } => operator.to_string(),
            Expression::If { .. } => TokenType::If.as_str().to_string(),
            Expression::Function { .. } => TokenType::Func.as_str().to_string(),
            Expression::Call { .. } => TokenType::LeftParen.as_str().to_string(),
            Expression::Array(_) | Expression::Index { .. } => {
                TokenType::LeftBracket.as_str().to_string()
            }
            Expression::Hash(_) => TokenType::LeftBrace.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Less,
    Greater,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
}

impl InfixOperator {
    pub fn from_token(token_type: TokenType) -> Option<Self> {
        match token_type {
            TokenType::Plus => Some(InfixOperator::Add),
            TokenType::Minus => Some(InfixOperator::Subtract),
            TokenType::Star => Some(InfixOperator::Multiply),
            TokenType::Slash => Some(InfixOperator::Divide),
            TokenType::Percent => Some(InfixOperator::Modulo),
            TokenType::Less => Some(InfixOperator::Less),
            TokenType::Greater => Some(InfixOperator::Greater),
            TokenType::EqualEqual => Some(InfixOperator::Equal),
            TokenType::BangEqual => Some(InfixOperator::NotEqual),
            TokenType::LessEqual => Some(InfixOperator::LessEqual),
            TokenType::GreaterEqual => Some(InfixOperator::GreaterEqual),
            _ => None,
        }
    }
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrefixOperator::Not => write!(f, "!"),
            PrefixOperator::Negate => write!(f, "-"),
        }
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            InfixOperator::Add => "+",
            InfixOperator::Subtract => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Modulo => "%",
            InfixOperator::Less => "<",
            InfixOperator::Greater => ">",
            InfixOperator::Equal => "==",
            InfixOperator::NotEqual => "!=",
            InfixOperator::LessEqual => "<=",
            InfixOperator::GreaterEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_joined(f, &self.statements, " ")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Binding {
                mutability,
                name,
                value,
            } => write!(f, "{} {} = {};", mutability.keyword(), name, value),
            Statement::Reassignment { name, value } => write!(f, "{} = {};", name, value),
            Statement::Return { value } => write!(f, "return {};", value),
            Statement::Expression(expr) => write!(f, "{};", expr),
            Statement::Block(block) => write!(f, "{}", block),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{ ")?;
        write_joined(f, &self.statements, " ")?;
        write!(f, " }}")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Identifier(identifier) => write!(f, "{}", identifier),
            Expression::Integer(value) => write!(f, "{}", value),
            Expression::String(value) => write!(f, "\"{}\"", value),
            Expression::Boolean(value) => write!(f, "{}", value),
            Expression::Null => write!(f, "null"),
            Expression::Prefix { operator, operand } => write!(f, "({}{})", operator, operand),
            Expression::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expression::Function { parameters, body } => {
                write!(f, "func(")?;
                write_joined(f, parameters, ", ")?;
                write!(f, ") {}", body)
            }
            Expression::Call { callee, arguments } => {
                write!(f, "{}(", callee)?;
                write_joined(f, arguments, ", ")?;
                write!(f, ")")
            }
            Expression::Array(elements) => {
                write!(f, "[")?;
                write_joined(f, elements, ", ")?;
                write!(f, "]")
            }
            Expression::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                write!(f, "}}")
            }
            Expression::Index { collection, index } => write!(f, "({}[{}])", collection, index),
        }
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
