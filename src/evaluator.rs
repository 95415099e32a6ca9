use crate::ast::{
    BlockStatement, Expression, Identifier, InfixOperator, Mutability, PrefixOperator, Program,
    Statement,
};
use crate::builtins;
use crate::environment::Environment;
use crate::object::{Function, HashPair, Object};
use crate::stack::ensure_sufficient_stack;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Tree-walking evaluator.
///
/// Failures never unwind: every step hands back an `Object`, and an
/// `Object::Error` or `Object::ReturnValue` coming out of a sub-evaluation is
/// passed straight up without doing any further work. The evaluator owns the
/// current scope and swaps it out for the duration of each function call.
pub struct Evaluator {
    environment: Environment,
    call_depth: usize,
}

/// Nested user function calls allowed before a call fails with an error.
pub const MAX_CALL_DEPTH: usize = 20_000;

impl Evaluator {
    pub fn new() -> Self {
        Self::with_environment(Environment::new())
    }

    pub fn with_environment(environment: Environment) -> Self {
        Self {
            environment,
            call_depth: 0,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Runs the statements in order. The first error ends the program, and a
    /// top-level `return` ends it with the returned value.
    pub fn eval_program(&mut self, program: &Program) -> Rc<Object> {
        tracing::debug!(statements = program.statements.len(), "evaluating program");
        let mut result = Object::null();

        for statement in &program.statements {
            result = self.eval_statement(statement);
            if let Object::ReturnValue(value) = result.as_ref() {
                return Rc::clone(value);
            }
            if result.is_error() {
                tracing::debug!(%result, "program stopped on error");
                return result;
            }
        }

        result
    }

    fn eval_block(&mut self, block: &BlockStatement) -> Rc<Object> {
        ensure_sufficient_stack(|| self.eval_block_inner(block))
    }

    fn eval_block_inner(&mut self, block: &BlockStatement) -> Rc<Object> {
        let mut result = Object::null();

        for statement in &block.statements {
            result = self.eval_statement(statement);
            if result.is_interrupt() {
                return result;
            }
        }

        result
    }

    fn eval_statement(&mut self, statement: &Statement) -> Rc<Object> {
        match statement {
            Statement::Binding {
                mutability,
                name,
                value,
            } => {
                let value = self.eval_expression(value);
                if value.is_interrupt() {
                    return value;
                }
                match self.environment.declare(&name.name, value, *mutability) {
                    Ok(()) => Object::null(),
                    Err(error) => Object::error(error.to_string()),
                }
            }
            Statement::Reassignment { name, value } => {
                let value = self.eval_expression(value);
                if value.is_interrupt() {
                    return value;
                }
                match self.environment.reassign(&name.name, value) {
                    Ok(()) => Object::null(),
                    Err(error) => Object::error(error.to_string()),
                }
            }
            Statement::Return { value } => {
                let value = self.eval_expression(value);
                if value.is_interrupt() {
                    return value;
                }
                Rc::new(Object::ReturnValue(value))
            }
            Statement::Expression(expression) => self.eval_expression(expression),
            Statement::Block(block) => self.eval_block(block),
        }
    }

    fn eval_expression(&mut self, expression: &Expression) -> Rc<Object> {
        ensure_sufficient_stack(|| self.eval_expression_inner(expression))
    }

    fn eval_expression_inner(&mut self, expression: &Expression) -> Rc<Object> {
        match expression {
            Expression::Identifier(identifier) => self.eval_identifier(identifier),
            Expression::Integer(value) => Object::integer(*value),
            Expression::String(value) => Object::string(value.as_str()),
            Expression::Boolean(value) => Object::boolean(*value),
            Expression::Null => Object::null(),
            Expression::Prefix { operator, operand } => {
                let operand = self.eval_expression(operand);
                if operand.is_interrupt() {
                    return operand;
                }
                eval_prefix(*operator, &operand)
            }
            Expression::Infix {
                left,
                operator,
                right,
            } => {
                let left = self.eval_expression(left);
                if left.is_interrupt() {
                    return left;
                }
                let right = self.eval_expression(right);
                if right.is_interrupt() {
                    return right;
                }
                eval_infix(*operator, &left, &right)
            }
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expression(condition);
                if condition.is_interrupt() {
                    return condition;
                }
                // Only the pooled booleans select a branch.
                if Rc::ptr_eq(&condition, &Object::boolean(true)) {
                    self.eval_block(consequence)
                } else if Rc::ptr_eq(&condition, &Object::boolean(false)) {
                    match alternative {
                        Some(alternative) => self.eval_block(alternative),
                        None => Object::null(),
                    }
                } else {
                    Object::null()
                }
            }
            Expression::Function { parameters, body } => Rc::new(Object::Function(Function {
                parameters: parameters.clone(),
                body: body.clone(),
                env: self.environment.clone(),
            })),
            Expression::Call { callee, arguments } => {
                let callee = self.eval_expression(callee);
                if callee.is_interrupt() {
                    return callee;
                }
                match self.eval_expressions(arguments) {
                    Ok(arguments) => self.apply_function(&callee, arguments),
                    Err(interrupt) => interrupt,
                }
            }
            Expression::Array(elements) => match self.eval_expressions(elements) {
                Ok(elements) => Object::array(elements),
                Err(interrupt) => interrupt,
            },
            Expression::Hash(pairs) => self.eval_hash(pairs),
            Expression::Index { collection, index } => {
                let collection = self.eval_expression(collection);
                if collection.is_interrupt() {
                    return collection;
                }
                let index = self.eval_expression(index);
                if index.is_interrupt() {
                    return index;
                }
                eval_index(&collection, &index)
            }
        }
    }

    fn eval_identifier(&self, identifier: &Identifier) -> Rc<Object> {
        if let Some(value) = self.environment.get(&identifier.name) {
            return value;
        }
        match builtins::lookup(&identifier.name) {
            Some(builtin) => Rc::new(Object::Builtin(builtin)),
            None => Object::error(format!("identifier not found: {}", identifier.name)),
        }
    }

    /// Evaluates left to right, stopping at the first error or return.
    fn eval_expressions(
        &mut self,
        expressions: &[Expression],
    ) -> Result<Vec<Rc<Object>>, Rc<Object>> {
        let mut values = Vec::with_capacity(expressions.len());
        for expression in expressions {
            let value = self.eval_expression(expression);
            if value.is_interrupt() {
                return Err(value);
            }
            values.push(value);
        }
        Ok(values)
    }

    fn eval_hash(&mut self, pairs: &[(Expression, Expression)]) -> Rc<Object> {
        let mut map = BTreeMap::new();

        for (key_expression, value_expression) in pairs {
            let key = self.eval_expression(key_expression);
            if key.is_interrupt() {
                return key;
            }
            let hash_key = match key.hash_key() {
                Some(hash_key) => hash_key,
                None => {
                    return Object::error(format!("{} can not be used as hash key", key.type_tag()))
                }
            };
            let value = self.eval_expression(value_expression);
            if value.is_interrupt() {
                return value;
            }
            map.insert(hash_key, HashPair { key, value });
        }

        Rc::new(Object::Hash(map))
    }

    fn apply_function(&mut self, callee: &Rc<Object>, arguments: Vec<Rc<Object>>) -> Rc<Object> {
        let function = match callee.as_ref() {
            Object::Function(function) => function,
            Object::Builtin(builtin) => {
                tracing::trace!(name = builtin.name, arguments = arguments.len(), "calling builtin");
                return (builtin.func)(&arguments);
            }
            other => {
                return Object::error(format!(
                    "failed to invoke {} as a function",
                    other.type_tag()
                ))
            }
        };

        if function.parameters.len() != arguments.len() {
            return Object::error(format!(
                "wrong number of arguments: expected {}, but received {}",
                function.parameters.len(),
                arguments.len()
            ));
        }

        let scope = Environment::enclosed(&function.env);
        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            if let Err(error) = scope.declare(&parameter.name, argument, Mutability::Mutable) {
                return Object::error(error.to_string());
            }
        }
        tracing::trace!(parameters = function.parameters.len(), "entering function scope");

        if self.call_depth >= MAX_CALL_DEPTH {
            tracing::debug!(depth = self.call_depth, "call depth limit reached");
            return Object::error(format!("maximum call depth exceeded: {}", MAX_CALL_DEPTH));
        }

        let previous = std::mem::replace(&mut self.environment, scope);
        self.call_depth += 1;
        let result = self.eval_block(&function.body);
        self.call_depth -= 1;
        self.environment = previous;

        match result.as_ref() {
            Object::ReturnValue(value) => Rc::clone(value),
            _ => result,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates `program` against `environment`, which keeps any new bindings.
pub fn eval(program: &Program, environment: &Environment) -> Rc<Object> {
    Evaluator::with_environment(environment.clone()).eval_program(program)
}

fn eval_prefix(operator: PrefixOperator, operand: &Rc<Object>) -> Rc<Object> {
    match operator {
        PrefixOperator::Not => {
            if Rc::ptr_eq(operand, &Object::boolean(true)) {
                Object::boolean(false)
            } else if Rc::ptr_eq(operand, &Object::boolean(false)) {
                Object::boolean(true)
            } else {
                Object::error(format!("unknown operator: !{}", operand.type_tag()))
            }
        }
        PrefixOperator::Negate => match operand.as_ref() {
            Object::Integer(value) => Object::integer(value.wrapping_neg()),
            other => Object::error(format!("unknown operator: -{}", other.type_tag())),
        },
    }
}

fn eval_infix(operator: InfixOperator, left: &Rc<Object>, right: &Rc<Object>) -> Rc<Object> {
    match (left.as_ref(), right.as_ref()) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(operator, *l, *r),
        (Object::String(l), Object::String(r)) => match operator {
            InfixOperator::Add => Object::string(format!("{}{}", l, r)),
            // Strings compare by identity, not content.
            InfixOperator::Equal => Object::boolean(Rc::ptr_eq(left, right)),
            InfixOperator::NotEqual => Object::boolean(!Rc::ptr_eq(left, right)),
            _ => unknown_infix(operator, left, right),
        },
        _ if operator == InfixOperator::Equal => Object::boolean(Rc::ptr_eq(left, right)),
        _ if operator == InfixOperator::NotEqual => Object::boolean(!Rc::ptr_eq(left, right)),
        _ if left.object_type() != right.object_type() => Object::error(format!(
            "type mismatch: {} {} {}",
            left.type_tag(),
            operator,
            right.type_tag()
        )),
        _ => unknown_infix(operator, left, right),
    }
}

fn eval_integer_infix(operator: InfixOperator, l: i64, r: i64) -> Rc<Object> {
    match operator {
        InfixOperator::Add => Object::integer(l.wrapping_add(r)),
        InfixOperator::Subtract => Object::integer(l.wrapping_sub(r)),
        InfixOperator::Multiply => Object::integer(l.wrapping_mul(r)),
        InfixOperator::Divide | InfixOperator::Modulo if r == 0 => {
            Object::error(format!("division by zero: {} {} 0", l, operator))
        }
        InfixOperator::Divide => Object::integer(l.wrapping_div(r)),
        InfixOperator::Modulo => Object::integer(l.wrapping_rem(r)),
        InfixOperator::Less => Object::boolean(l < r),
        InfixOperator::Greater => Object::boolean(l > r),
        InfixOperator::Equal => Object::boolean(l == r),
        InfixOperator::NotEqual => Object::boolean(l != r),
        InfixOperator::LessEqual => Object::boolean(l <= r),
        InfixOperator::GreaterEqual => Object::boolean(l >= r),
    }
}

fn unknown_infix(operator: InfixOperator, left: &Object, right: &Object) -> Rc<Object> {
    Object::error(format!(
        "unknown operator: {} {} {}",
        left.type_tag(),
        operator,
        right.type_tag()
    ))
}

fn eval_index(collection: &Rc<Object>, index: &Rc<Object>) -> Rc<Object> {
    match (collection.as_ref(), index.as_ref()) {
        (Object::Array(elements), Object::Integer(position)) => {
            let elements = elements.borrow();
            usize::try_from(*position)
                .ok()
                .and_then(|position| elements.get(position).cloned())
                .unwrap_or_else(Object::null)
        }
        (Object::Hash(pairs), _) => match index.hash_key() {
            Some(key) => pairs
                .get(&key)
                .map(|pair| Rc::clone(&pair.value))
                .unwrap_or_else(Object::null),
            None => Object::error(format!("unusable as hash key: {}", index.type_tag())),
        },
        _ => Object::error(format!(
            "unsupported operation: {}[{}]",
            collection.type_tag(),
            index.type_tag()
        )),
    }
}
