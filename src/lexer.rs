use crate::error::{PlayError, Span};
use log::trace;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Minus,
    Plus,
    Slash,
    Star,
    Less,
    Greater,

    // One or two character tokens
    Equal,
    EqualEqual,
    BangEqual,

    // Literals
    Identifier,
    Integer,
    Boolean,
    Tag,

    // Keywords
    Print,
    Swap,
    If,
    Else,
    While,

    /// Follows a tag name that stands alone on its line.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text for punctuation, upper-case text for keywords and booleans,
    /// lower-case name for identifiers and tags.
    pub lexeme: String,
    pub span: Span,
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span, line: usize) -> Self {
        Self {
            token_type,
            lexeme,
            span,
            line,
        }
    }

    /// How the token is named in diagnostics.
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Empty => "end of line".to_string(),
            TokenType::Tag => format!("'@{}'", self.lexeme),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.token_type {
            TokenType::Identifier
            | TokenType::Integer
            | TokenType::Boolean
            | TokenType::Tag => write!(f, "{:>4}  {:?}({})", self.line, self.token_type, self.lexeme),
            _ => write!(f, "{:>4}  {:?}", self.line, self.token_type),
        }
    }
}

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("PRINT", TokenType::Print);
        keywords.insert("SWAP", TokenType::Swap);
        keywords.insert("IF", TokenType::If);
        keywords.insert("ELSE", TokenType::Else);
        keywords.insert("WHILE", TokenType::While);
        keywords.insert("TRUE", TokenType::Boolean);
        keywords.insert("FALSE", TokenType::Boolean);

        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            keywords,
        }
    }

    /// Scan the whole source. No end-of-input token is appended.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, PlayError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        trace!("scanned {} tokens over {} lines", self.tokens.len(), self.line);
        Ok(std::mem::take(&mut self.tokens))
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), PlayError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            '[' => self.add_token(TokenType::LeftBracket),
            ']' => self.add_token(TokenType::RightBracket),
            ',' => self.add_token(TokenType::Comma),
            '+' => self.add_token(TokenType::Plus),
            '*' => self.add_token(TokenType::Star),
            '/' => self.add_token(TokenType::Slash),
            '<' => self.add_token(TokenType::Less),
            '>' => self.add_token(TokenType::Greater),
            '-' => {
                if self.peek() == '-' || self.peek() == '>' {
                    self.skip_comment();
                } else {
                    self.add_token(TokenType::Minus);
                }
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    return Err(PlayError::lex_error(
                        Span::new(self.start, self.current),
                        "Unexpected character: '!'".to_string(),
                    ));
                }
            }
            '@' => self.tag()?,
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_alphabetic() => self.identifier(),
            _ => {
                return Err(PlayError::lex_error(
                    Span::single(self.start),
                    format!("Unexpected character: '{}'", c),
                ));
            }
        }

        Ok(())
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.current += 1;
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn peek(&self) -> char {
        self.char_at(self.current)
    }

    fn char_at(&self, index: usize) -> char {
        self.source.get(index).copied().unwrap_or('\0')
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    // `--` and `->` both open a comment running up to (not including) the newline.
    fn skip_comment(&mut self) {
        while self.peek() != '\n' && !self.is_at_end() {
            self.current += 1;
        }
    }

    fn number(&mut self) -> Result<(), PlayError> {
        while self.peek().is_ascii_digit() {
            self.current += 1;
        }

        let text = self.lexeme();
        if text.parse::<i64>().is_err() {
            return Err(PlayError::lex_error(
                Span::new(self.start, self.current),
                format!("Integer literal too large: {}", text),
            ));
        }
        self.add_token_with_content(TokenType::Integer, text);
        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_alphabetic() {
            self.current += 1;
        }

        let text = self.lexeme();
        let upper = text.to_uppercase();
        match self.keywords.get(upper.as_str()).copied() {
            Some(token_type) => self.add_token_with_content(token_type, upper),
            None => self.add_token_with_content(TokenType::Identifier, text.to_lowercase()),
        }
    }

    fn tag(&mut self) -> Result<(), PlayError> {
        while self.peek().is_alphabetic() {
            self.current += 1;
        }

        // Skip the '@' itself.
        let name: String = self.source[self.start + 1..self.current].iter().collect();
        if name.is_empty() {
            return Err(PlayError::lex_error(
                Span::single(self.start),
                "Expected tag name after '@'".to_string(),
            ));
        }
        self.add_token_with_content(TokenType::Tag, name.to_lowercase());

        if self.tag_stands_alone() {
            let at = self.current;
            self.tokens.push(Token::new(
                TokenType::Empty,
                String::new(),
                Span::new(at, at),
                self.line,
            ));
        }
        Ok(())
    }

    /// A tag stands alone when nothing but blanks separate it from a newline,
    /// the end of input, a comment or a closing brace.
    fn tag_stands_alone(&self) -> bool {
        let mut index = self.current;
        while matches!(self.char_at(index), ' ' | '\t' | '\r') {
            index += 1;
        }

        if index >= self.source.len() {
            return true;
        }
        match self.char_at(index) {
            '\n' | '}' => true,
            '-' => matches!(self.char_at(index + 1), '-' | '>'),
            _ => false,
        }
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.lexeme();
        self.add_token_with_content(token_type, text);
    }

    fn add_token_with_content(&mut self, token_type: TokenType, lexeme: String) {
        self.tokens.push(Token::new(
            token_type,
            lexeme,
            Span::new(self.start, self.current),
            self.line,
        ));
    }
}

/// Convenience wrapper over [`Lexer::scan_tokens`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, PlayError> {
    Lexer::new(source).scan_tokens()
}
