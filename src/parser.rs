use crate::ast::{
    BlockStatement, Expression, Identifier, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::error::YailError;
use crate::lexer::Lexer;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};

/// Binding power of a token seen after a complete expression, low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    Comparison,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

impl Precedence {
    fn of(token_type: TokenType) -> Precedence {
        match token_type {
            TokenType::EqualEqual | TokenType::BangEqual => Precedence::Equals,
            TokenType::Less
            | TokenType::Greater
            | TokenType::LessEqual
            | TokenType::GreaterEqual => Precedence::Comparison,
            TokenType::Plus | TokenType::Minus => Precedence::Sum,
            TokenType::Star | TokenType::Slash | TokenType::Percent => Precedence::Product,
            TokenType::LeftParen => Precedence::Call,
            TokenType::LeftBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

/// Parses the token starting an expression.
type NullDenotation = fn(&mut Parser) -> Option<Expression>;
/// Parses the token following an already-parsed expression.
type LeftDenotation = fn(&mut Parser, Expression) -> Option<Expression>;

fn null_denotation(token_type: TokenType) -> Option<NullDenotation> {
    let nud: NullDenotation = match token_type {
        TokenType::Identifier => Parser::parse_identifier,
        TokenType::Integer => Parser::parse_integer,
        TokenType::String => Parser::parse_string,
        TokenType::True | TokenType::False => Parser::parse_boolean,
        TokenType::Null => Parser::parse_null,
        TokenType::Bang | TokenType::Minus => Parser::parse_prefix,
        TokenType::LeftParen => Parser::parse_grouped,
        TokenType::If => Parser::parse_if,
        TokenType::Func => Parser::parse_function,
        TokenType::LeftBracket => Parser::parse_array,
        TokenType::LeftBrace => Parser::parse_hash,
        _ => return None,
    };
    Some(nud)
}

fn left_denotation(token_type: TokenType) -> Option<LeftDenotation> {
    let led: LeftDenotation = match token_type {
        TokenType::LeftParen => Parser::parse_call,
        TokenType::LeftBracket => Parser::parse_index,
        other if InfixOperator::from_token(other).is_some() => Parser::parse_infix,
        _ => return None,
    };
    Some(led)
}

/// Pratt parser over a [`Lexer`].
///
/// Parsing never stops at the first problem. Each construct that fails to
/// parse is dropped from the tree and recorded in [`Parser::errors`], then
/// parsing resumes from wherever the cursor ended up. A program is only fit
/// for evaluation when that list is empty.
pub struct Parser {
    lexer: Lexer,
    errors: Vec<YailError>,
    current: Token,
    peek: Token,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            errors: Vec::new(),
            current,
            peek,
        }
    }

    pub fn errors(&self) -> &[YailError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<YailError> {
        self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.current.is(TokenType::Eof) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.next_token();
        }

        Program { statements }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.token_type {
            TokenType::Var | TokenType::Val => self.parse_binding(),
            TokenType::Identifier if self.peek.is(TokenType::Equal) => self.parse_reassignment(),
            TokenType::Return => self.parse_return(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_binding(&mut self) -> Option<Statement> {
        let keyword = self.current.token_type;
        self.expect_next(TokenType::Identifier)?;
        let name = Identifier::new(self.current.literal.clone());
        self.expect_next(TokenType::Equal)?;
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest);
        self.skip_semicolon();
        Some(Statement::binding(keyword, name, value?))
    }

    fn parse_reassignment(&mut self) -> Option<Statement> {
        let name = Identifier::new(self.current.literal.clone());
        self.expect_next(TokenType::Equal)?;
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest);
        self.skip_semicolon();
        Some(Statement::Reassignment { name, value: value? })
    }

    fn parse_return(&mut self) -> Option<Statement> {
        // A bare `return` leaves the closing token for the enclosing block.
        if matches!(
            self.peek.token_type,
            TokenType::RightBrace | TokenType::Eof
        ) {
            return Some(Statement::Return {
                value: Expression::Null,
            });
        }
        if self.peek.is(TokenType::Semicolon) {
            self.next_token();
            return Some(Statement::Return {
                value: Expression::Null,
            });
        }

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest);
        self.skip_semicolon();
        Some(Statement::Return { value: value? })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expression = self.parse_expression(Precedence::Lowest);
        self.skip_semicolon();
        expression.map(Statement::Expression)
    }

    /// Expects the cursor on `{`; leaves it on the matching `}`.
    fn parse_block(&mut self) -> Option<BlockStatement> {
        let mut statements = Vec::new();
        self.next_token();

        while !self.current.is(TokenType::RightBrace) && !self.current.is(TokenType::Eof) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.next_token();
        }

        if self.current.is(TokenType::Eof) {
            self.missing_token(TokenType::RightBrace);
            return None;
        }
        Some(BlockStatement::new(statements))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        ensure_sufficient_stack(|| self.parse_expression_inner(precedence))
    }

    fn parse_expression_inner(&mut self, precedence: Precedence) -> Option<Expression> {
        let nud = match null_denotation(self.current.token_type) {
            Some(nud) => nud,
            None => {
                self.no_null_denotation();
                return None;
            }
        };
        let mut left = nud(self)?;

        while !self.peek.is(TokenType::Semicolon) && precedence < Precedence::of(self.peek.token_type)
        {
            let led = match left_denotation(self.peek.token_type) {
                Some(led) => led,
                None => return Some(left),
            };
            self.next_token();
            left = led(self, left)?;
        }

        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::Identifier(Identifier::new(
            self.current.literal.clone(),
        )))
    }

    fn parse_integer(&mut self) -> Option<Expression> {
        match self.current.literal.parse::<i64>() {
            Ok(value) => Some(Expression::Integer(value)),
            Err(_) => {
                let error = YailError::syntax(
                    self.current.span,
                    format!("could not parse {:?} as integer", self.current.literal),
                    format!(
                        "Integer literals must fit in a signed 64-bit value ({} to {}).",
                        i64::MIN,
                        i64::MAX
                    ),
                );
                self.record(error);
                None
            }
        }
    }

    fn parse_string(&mut self) -> Option<Expression> {
        Some(Expression::String(self.current.literal.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression::Boolean(self.current.is(TokenType::True)))
    }

    fn parse_null(&mut self) -> Option<Expression> {
        Some(Expression::Null)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let operator = if self.current.is(TokenType::Bang) {
            PrefixOperator::Not
        } else {
            PrefixOperator::Negate
        };
        self.next_token();
        let operand = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            operand: Box::new(operand),
        })
    }

    fn parse_grouped(&mut self) -> Option<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_next(TokenType::RightParen)?;
        Some(expression)
    }

    fn parse_if(&mut self) -> Option<Expression> {
        self.expect_next(TokenType::LeftParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_next(TokenType::RightParen)?;
        self.expect_next(TokenType::LeftBrace)?;
        let consequence = self.parse_block()?;

        let alternative = if self.peek.is(TokenType::Else) {
            self.next_token();
            self.expect_next(TokenType::LeftBrace)?;
            Some(self.parse_block()?)
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function(&mut self) -> Option<Expression> {
        self.expect_next(TokenType::LeftParen)?;
        let parameters = self.parse_parameters()?;
        self.expect_next(TokenType::LeftBrace)?;
        let body = self.parse_block()?;
        Some(Expression::Function { parameters, body })
    }

    fn parse_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut parameters = Vec::new();
        if self.peek.is(TokenType::RightParen) {
            self.next_token();
            return Some(parameters);
        }

        self.expect_next(TokenType::Identifier)?;
        parameters.push(Identifier::new(self.current.literal.clone()));
        while self.peek.is(TokenType::Comma) {
            self.next_token();
            self.expect_next(TokenType::Identifier)?;
            parameters.push(Identifier::new(self.current.literal.clone()));
        }

        self.expect_next(TokenType::RightParen)?;
        Some(parameters)
    }

    fn parse_array(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenType::RightBracket)?;
        Some(Expression::Array(elements))
    }

    fn parse_hash(&mut self) -> Option<Expression> {
        let mut pairs = Vec::new();

        while !self.peek.is(TokenType::RightBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_next(TokenType::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek.is(TokenType::RightBrace) {
                self.expect_next(TokenType::Comma)?;
            }
        }

        self.expect_next(TokenType::RightBrace)?;
        Some(Expression::Hash(pairs))
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        let token_type = self.current.token_type;
        let operator = InfixOperator::from_token(token_type)?;
        self.next_token();
        let right = self.parse_expression(Precedence::of(token_type))?;
        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_call(&mut self, callee: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenType::RightParen)?;
        Some(Expression::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn parse_index(&mut self, collection: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_next(TokenType::RightBracket)?;
        Some(Expression::Index {
            collection: Box::new(collection),
            index: Box::new(index),
        })
    }

    /// Comma-separated expressions up to `end`; the cursor starts on the opener.
    fn parse_expression_list(&mut self, end: TokenType) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek.is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek.is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_next(end)?;
        Some(list)
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn skip_semicolon(&mut self) {
        if self.peek.is(TokenType::Semicolon) {
            self.next_token();
        }
    }

    /// Advances, then requires the new current token to be `expected`.
    fn expect_next(&mut self, expected: TokenType) -> Option<()> {
        self.next_token();
        if self.current.is(expected) {
            Some(())
        } else {
            self.missing_token(expected);
            None
        }
    }

    fn missing_token(&mut self, expected: TokenType) {
        let found = if self.current.is(TokenType::Eof) {
            "the end of input".to_string()
        } else {
            format!("'{}'", self.current.literal)
        };
        let error = YailError::syntax(
            self.current.span,
            format!("missing token: {}", expected),
            format!("Expected {} here but found {}.", describe(expected), found),
        );
        self.record(error);
    }

    fn no_null_denotation(&mut self) {
        let help = match self.current.token_type {
            TokenType::Illegal => "This character is not part of the language.",
            TokenType::RightParen => "Found ')' without matching '('. Check for unbalanced parentheses.",
            TokenType::RightBrace => "Found '}' without matching '{'. Check for unbalanced braces.",
            TokenType::RightBracket => "Found ']' without matching '['. Check for unbalanced brackets.",
            TokenType::Eof => "Reached end of input while expecting an expression.",
            _ => "Expected a literal, identifier, or parenthesized expression here.",
        };
        let error = YailError::syntax(
            self.current.span,
            format!("failed to understand: '{}'", self.current.literal),
            help,
        );
        self.record(error);
    }

    fn record(&mut self, error: YailError) {
        tracing::debug!(
            start = error.span.start,
            end = error.span.end,
            "parse error: {}",
            error.message
        );
        self.errors.push(error);
    }
}

fn describe(token_type: TokenType) -> String {
    match token_type {
        TokenType::Identifier => "an identifier".to_string(),
        other => format!("'{}'", other),
    }
}

/// Parses a complete source text, returning the program and every syntax error.
pub fn parse(source: &str) -> (Program, Vec<YailError>) {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    (program, parser.into_errors())
}
