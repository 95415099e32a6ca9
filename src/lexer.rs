use crate::error::Span;
use crate::token::{Token, TokenType};

/// On-demand tokenizer over a byte-indexed cursor.
///
/// The lexer never fails: characters it does not understand become
/// `Illegal` tokens and an unterminated string runs to the end of input.
/// Once the input is exhausted every call returns an `Eof` token.
pub struct Lexer {
    source: String,
    position: usize,
    read_position: usize,
    ch: char,
}

impl Lexer {
    pub fn new(source: impl Into<String>) -> Self {
        let mut lexer = Self {
            source: source.into(),
            position: 0,
            read_position: 0,
            ch: '\0',
        };
        lexer.read_char();
        lexer
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        if self.is_at_end() {
            return Token::new(TokenType::Eof, "", Span::new(start, start));
        }

        let c = self.ch;
        if is_letter(c) {
            let word = self.read_identifier();
            let token_type = TokenType::keyword(word).unwrap_or(TokenType::Identifier);
            let word = word.to_string();
            return Token::new(token_type, word, Span::new(start, self.position));
        }

        if c.is_ascii_digit() {
            let digits = self.read_number().to_string();
            return Token::new(TokenType::Integer, digits, Span::new(start, self.position));
        }

        if c == '"' {
            let content = self.read_string().to_string();
            return Token::new(TokenType::String, content, Span::new(start, self.position));
        }

        if let Some(token_type) = TokenType::two_char(c, self.peek_char()) {
            self.read_char();
            self.read_char();
            return self.make_token(token_type, start);
        }

        self.read_char();
        let token_type = TokenType::single_char(c).unwrap_or(TokenType::Illegal);
        self.make_token(token_type, start)
    }

    fn make_token(&self, token_type: TokenType, start: usize) -> Token {
        Token::new(
            token_type,
            &self.source[start..self.position],
            Span::new(start, self.position),
        )
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    fn read_char(&mut self) {
        self.position = self.read_position;
        match self.source[self.position..].chars().next() {
            Some(c) => {
                self.ch = c;
                self.read_position = self.position + c.len_utf8();
            }
            None => self.ch = '\0',
        }
    }

    fn peek_char(&self) -> char {
        self.source[self.read_position..]
            .chars()
            .next()
            .unwrap_or('\0')
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && matches!(self.ch, ' ' | '\t' | '\n' | '\r') {
            self.read_char();
        }
    }

    fn read_identifier(&mut self) -> &str {
        let start = self.position;
        while !self.is_at_end() && (is_letter(self.ch) || self.ch.is_ascii_digit()) {
            self.read_char();
        }
        &self.source[start..self.position]
    }

    fn read_number(&mut self) -> &str {
        let start = self.position;
        while !self.is_at_end() && self.ch.is_ascii_digit() {
            self.read_char();
        }
        &self.source[start..self.position]
    }

    /// Reads the body of a string literal; the cursor starts on the opening quote.
    fn read_string(&mut self) -> &str {
        self.read_char();
        let start = self.position;
        while !self.is_at_end() && self.ch != '"' {
            if self.ch == '\\' {
                self.read_char();
                if self.is_at_end() {
                    break;
                }
            }
            self.read_char();
        }
        let end = self.position;

        // Closing quote, absent when the literal is unterminated
        if !self.is_at_end() {
            self.read_char();
        }
        &self.source[start..end]
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields every token before `Eof`.
    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        if token.is(TokenType::Eof) {
            None
        } else {
            Some(token)
        }
    }
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}
