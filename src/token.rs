use crate::error::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Special
    Illegal,
    Eof,

    // Literals
    Identifier,
    Integer,
    String,

    // Single-character tokens
    Equal,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Less,
    Greater,
    Comma,
    Semicolon,
    Colon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    // Two character tokens
    EqualEqual,
    BangEqual,
    LessEqual,
    GreaterEqual,

    // Keywords
    Var,
    Val,
    True,
    False,
    Null,
    Func,
    If,
    Else,
    Return,
}

impl TokenType {
    /// Keyword table; anything else that looks like a word is an identifier.
    pub fn keyword(word: &str) -> Option<TokenType> {
        match word {
            "var" => Some(TokenType::Var),
            "val" => Some(TokenType::Val),
            "true" => Some(TokenType::True),
            "false" => Some(TokenType::False),
            "null" => Some(TokenType::Null),
            "func" => Some(TokenType::Func),
            "if" => Some(TokenType::If),
            "else" => Some(TokenType::Else),
            "return" => Some(TokenType::Return),
            _ => None,
        }
    }

    pub fn two_char(first: char, second: char) -> Option<TokenType> {
        match (first, second) {
            ('=', '=') => Some(TokenType::EqualEqual),
            ('!', '=') => Some(TokenType::BangEqual),
            ('<', '=') => Some(TokenType::LessEqual),
            ('>', '=') => Some(TokenType::GreaterEqual),
            _ => None,
        }
    }

    pub fn single_char(c: char) -> Option<TokenType> {
        match c {
            '=' => Some(TokenType::Equal),
            '!' => Some(TokenType::Bang),
            '+' => Some(TokenType::Plus),
            '-' => Some(TokenType::Minus),
            '*' => Some(TokenType::Star),
            '/' => Some(TokenType::Slash),
            '%' => Some(TokenType::Percent),
            '<' => Some(TokenType::Less),
            '>' => Some(TokenType::Greater),
            ',' => Some(TokenType::Comma),
            ';' => Some(TokenType::Semicolon),
            ':' => Some(TokenType::Colon),
            '(' => Some(TokenType::LeftParen),
            ')' => Some(TokenType::RightParen),
            '{' => Some(TokenType::LeftBrace),
            '}' => Some(TokenType::RightBrace),
            '[' => Some(TokenType::LeftBracket),
            ']' => Some(TokenType::RightBracket),
            _ => None,
        }
    }

    /// Name used in diagnostics such as `missing token: )`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Illegal => "ILLEGAL",
            TokenType::Eof => "END_OF_FILE",
            TokenType::Identifier => "IDENTIFIER",
            TokenType::Integer => "INTEGER_LITERAL",
            TokenType::String => "STRING",
            TokenType::Equal => "=",
            TokenType::Bang => "!",
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Star => "*",
            TokenType::Slash => "/",
            TokenType::Percent => "%",
            TokenType::Less => "<",
            TokenType::Greater => ">",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::Colon => ":",
            TokenType::LeftParen => "(",
            TokenType::RightParen => ")",
            TokenType::LeftBrace => "{",
            TokenType::RightBrace => "}",
            TokenType::LeftBracket => "[",
            TokenType::RightBracket => "]",
            TokenType::EqualEqual => "==",
            TokenType::BangEqual => "!=",
            TokenType::LessEqual => "<=",
            TokenType::GreaterEqual => ">=",
            TokenType::Var => "var",
            TokenType::Val => "val",
            TokenType::True => "true",
            TokenType::False => "false",
            TokenType::Null => "null",
            TokenType::Func => "func",
            TokenType::If => "if",
            TokenType::Else => "else",
            TokenType::Return => "return",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, literal: impl Into<String>, span: Span) -> Self {
        Self {
            token_type,
            literal: literal.into(),
            span,
        }
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }
}
