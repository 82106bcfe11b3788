use crate::ast::{BinaryOp, Expr, Program, Stmt, Target};
use crate::error::{PlayError, Span};
use crate::lexer::{Token, TokenType};
use log::trace;

/// Recursive-descent parser over a token sequence that has no end marker.
///
/// Grammar, lowest precedence first:
///
/// ```text
/// program    := statement*
/// statement  := assignment | tag | swap | if | while | PRINT comparison
/// assignment := IDENTIFIER ('[' expression ']')? '=' (vector | expression)
/// tag        := TAG (EMPTY | statement)
/// swap       := SWAP target target
/// if         := IF comparison block (ELSE block)?
/// while      := WHILE comparison block
/// block      := '{' statement* '}'
/// comparison := expression (('==' | '!=' | '<' | '>') expression)*
/// expression := term (('+' | '-') term)*
/// term       := factor (('*' | '/') factor)*
/// factor     := IDENTIFIER ('[' expression ']')? | BOOLEAN | INTEGER | '(' expression ')'
/// vector     := '[' (expression (',' expression)*)? ']'
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    bindings: Vec<(String, Stmt)>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            bindings: Vec::new(),
        }
    }

    pub fn parse(&mut self) -> Result<Program, PlayError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        Ok(Program {
            statements,
            tags: self.tag_names(),
            bindings: std::mem::take(&mut self.bindings),
        })
    }

    /// Parse the whole token sequence as one comparison. Used by the REPL to
    /// echo bare expressions.
    pub fn parse_comparison(&mut self) -> Result<Expr, PlayError> {
        let expr = self.comparison()?;
        if let Some(token) = self.peek() {
            return Err(PlayError::parse_error(
                token.span.clone(),
                format!("Unexpected {} after expression", token.describe()),
            ));
        }
        Ok(expr)
    }

    /// Whether `token_type` can open a statement.
    pub fn starts_statement(token_type: TokenType) -> bool {
        matches!(
            token_type,
            TokenType::Identifier
                | TokenType::Tag
                | TokenType::Swap
                | TokenType::If
                | TokenType::While
                | TokenType::Print
        )
    }

    fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for token in &self.tokens {
            if token.token_type == TokenType::Tag && !names.contains(&token.lexeme) {
                names.push(token.lexeme.clone());
            }
        }
        names
    }

    fn statement(&mut self) -> Result<Stmt, PlayError> {
        trace!("parse statement at token {}", self.current);

        let token = match self.peek() {
            Some(token) => token.clone(),
            None => {
                return Err(self.error_at_end("Expected statement, found end of input"));
            }
        };

        match token.token_type {
            TokenType::Identifier => self.assignment(),
            TokenType::Tag => self.tag_statement(),
            TokenType::Swap => self.swap_statement(),
            TokenType::If => self.if_statement(),
            TokenType::While => self.while_statement(),
            TokenType::Print => self.print_statement(),
            _ => Err(PlayError::parse_error_with_help(
                token.span.clone(),
                format!("Unexpected token {} at start of statement", token.describe()),
                "Statements begin with a variable, a tag, PRINT, SWAP, IF or WHILE.".to_string(),
            )),
        }
    }

    fn assignment(&mut self) -> Result<Stmt, PlayError> {
        trace!("parse assignment");
        let target = self.target("assignment")?;

        self.consume_with_help(
            TokenType::Equal,
            "Expected '=' after assignment target",
            "Assignments look like 'x = 1' or 'x[i] = 1'.".to_string(),
        )?;

        let value = if self.check(TokenType::LeftBracket) {
            self.vector_literal()?
        } else {
            self.expression()?
        };

        let span = target.span.to(value.span());
        Ok(Stmt::Assign {
            target,
            value,
            span,
        })
    }

    fn tag_statement(&mut self) -> Result<Stmt, PlayError> {
        trace!("parse tag statement");
        let tag = self.advance().clone();

        if self.match_type(TokenType::Empty) {
            return Ok(Stmt::Tag {
                name: tag.lexeme,
                body: None,
                span: tag.span,
            });
        }

        let body = self.statement()?;
        // Declarations bind wherever they appear, even in blocks that never run.
        self.bindings.push((tag.lexeme.clone(), body.clone()));
        let span = tag.span.to(body.span());
        Ok(Stmt::Tag {
            name: tag.lexeme,
            body: Some(Box::new(body)),
            span,
        })
    }

    fn swap_statement(&mut self) -> Result<Stmt, PlayError> {
        trace!("parse swap");
        let start = self.advance().span.clone();

        let left = self.target("swap")?;
        let right = self.target("swap")?;

        let span = start.to(&right.span);
        Ok(Stmt::Swap { left, right, span })
    }

    fn if_statement(&mut self) -> Result<Stmt, PlayError> {
        trace!("parse if");
        let start = self.advance().span.clone();

        let condition = self.comparison()?;
        let then_branch = self.block("IF")?;
        let else_branch = if self.match_type(TokenType::Else) {
            Some(self.block("ELSE")?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: start.to(&self.previous().span),
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, PlayError> {
        trace!("parse while");
        let start = self.advance().span.clone();

        let condition = self.comparison()?;
        let body = self.block("WHILE")?;

        Ok(Stmt::While {
            condition,
            body,
            span: start.to(&self.previous().span),
        })
    }

    fn print_statement(&mut self) -> Result<Stmt, PlayError> {
        trace!("parse print");
        let start = self.advance().span.clone();

        let expr = self.comparison()?;
        let span = start.to(expr.span());
        Ok(Stmt::Print { expr, span })
    }

    fn block(&mut self, owner: &str) -> Result<Vec<Stmt>, PlayError> {
        self.consume_with_help(
            TokenType::LeftBrace,
            &format!("Expected '{{' to open {} block", owner),
            format!("{} bodies are enclosed in braces: {} ... {{ ... }}", owner, owner),
        )?;

        let mut statements = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume_with_help(
            TokenType::RightBrace,
            &format!("Expected '}}' to close {} block", owner),
            "Every '{' must be matched by a '}'.".to_string(),
        )?;
        Ok(statements)
    }

    /// `IDENTIFIER ('[' expression ']')?`
    fn target(&mut self, production: &str) -> Result<Target, PlayError> {
        let name = self
            .consume(
                TokenType::Identifier,
                &format!("Expected variable name in {}", production),
            )?
            .clone();

        let index = if self.match_type(TokenType::LeftBracket) {
            let index = self.expression()?;
            self.consume(
                TokenType::RightBracket,
                &format!("Expected ']' after index in {}", production),
            )?;
            Some(index)
        } else {
            None
        };

        Ok(Target {
            name: name.lexeme,
            index,
            span: name.span.to(&self.previous().span),
        })
    }

    fn comparison(&mut self) -> Result<Expr, PlayError> {
        trace!("parse comparison");
        let mut expr = self.expression()?;

        while let Some(operator) = self.match_operator(&[
            (TokenType::EqualEqual, BinaryOp::Equal),
            (TokenType::BangEqual, BinaryOp::NotEqual),
            (TokenType::Less, BinaryOp::Less),
            (TokenType::Greater, BinaryOp::Greater),
        ]) {
            let right = self.operand(Self::expression)?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn expression(&mut self) -> Result<Expr, PlayError> {
        trace!("parse expression");
        let mut expr = self.term()?;

        while let Some(operator) = self.match_operator(&[
            (TokenType::Plus, BinaryOp::Add),
            (TokenType::Minus, BinaryOp::Subtract),
        ]) {
            let right = self.operand(Self::term)?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, PlayError> {
        trace!("parse term");
        let mut expr = self.factor()?;

        while let Some(operator) = self.match_operator(&[
            (TokenType::Star, BinaryOp::Multiply),
            (TokenType::Slash, BinaryOp::Divide),
        ]) {
            let right = self.operand(Self::factor)?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, PlayError> {
        trace!("parse factor");
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(self.error_at_end("Expected expression, found end of input")),
        };

        match token.token_type {
            TokenType::Identifier => {
                self.advance();
                let index = if self.match_type(TokenType::LeftBracket) {
                    let index = self.expression()?;
                    self.consume(TokenType::RightBracket, "Expected ']' after index")?;
                    Some(Box::new(index))
                } else {
                    None
                };
                Ok(Expr::Variable {
                    name: token.lexeme,
                    index,
                    span: token.span.to(&self.previous().span),
                })
            }
            TokenType::Boolean => {
                self.advance();
                Ok(Expr::Boolean {
                    value: token.lexeme == "TRUE",
                    span: token.span,
                })
            }
            TokenType::Integer => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    PlayError::parse_error(
                        token.span.clone(),
                        format!("Invalid integer literal '{}'", token.lexeme),
                    )
                })?;
                Ok(Expr::Integer {
                    value,
                    span: token.span,
                })
            }
            TokenType::LeftParen => {
                self.advance();
                let mut expr = self.expression()?;
                let close = self
                    .consume_with_help(
                        TokenType::RightParen,
                        "Expected ')' after expression",
                        "Parentheses hold an arithmetic expression; comparisons cannot be grouped."
                            .to_string(),
                    )?
                    .span
                    .clone();
                // Widen the span to cover the parentheses.
                let span = token.span.to(&close);
                match &mut expr {
                    Expr::Integer { span: s, .. }
                    | Expr::Boolean { span: s, .. }
                    | Expr::Variable { span: s, .. }
                    | Expr::Binary { span: s, .. }
                    | Expr::Vector { span: s, .. } => *s = span,
                }
                Ok(expr)
            }
            TokenType::LeftBracket => Err(PlayError::parse_error_with_help(
                token.span.clone(),
                "Vector literals are only allowed on the right of '='".to_string(),
                "Assign the vector to a variable first: v = [1, 2, 3]".to_string(),
            )),
            _ => Err(PlayError::parse_error(
                token.span.clone(),
                format!("Expected expression, found {}", token.describe()),
            )),
        }
    }

    fn vector_literal(&mut self) -> Result<Expr, PlayError> {
        trace!("parse vector");
        let start = self.advance().span.clone();
        let mut elements = Vec::new();

        if !self.check(TokenType::RightBracket) {
            loop {
                elements.push(self.expression()?);
                if !self.match_type(TokenType::Comma) {
                    break;
                }
            }
        }

        let end = self
            .consume_with_help(
                TokenType::RightBracket,
                "Expected ']' after vector elements",
                "Vector elements are separated by commas: [1, 2, 3]".to_string(),
            )?
            .span
            .clone();

        Ok(Expr::Vector {
            elements,
            span: start.to(&end),
        })
    }

    fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
        let span = left.span().to(right.span());
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        }
    }

    /// Parse the right operand of the operator just consumed. A missing operand
    /// is reported against the operator; deeper errors pass through unchanged.
    fn operand(
        &mut self,
        parse: fn(&mut Self) -> Result<Expr, PlayError>,
    ) -> Result<Expr, PlayError> {
        let operator = self.previous().clone();
        let starts_factor = self.peek().map_or(false, |token| {
            matches!(
                token.token_type,
                TokenType::Identifier
                    | TokenType::Boolean
                    | TokenType::Integer
                    | TokenType::LeftParen
            )
        });

        if !starts_factor {
            return Err(PlayError::parse_error_with_help(
                operator.span.clone(),
                format!("Expected expression after '{}'", operator.lexeme),
                format!("'{}' needs an operand on both sides.", operator.lexeme),
            ));
        }
        parse(self)
    }

    fn match_operator(&mut self, operators: &[(TokenType, BinaryOp)]) -> Option<BinaryOp> {
        let token_type = self.peek()?.token_type;
        let (_, operator) = operators.iter().find(|(t, _)| *t == token_type)?;
        self.advance();
        Some(*operator)
    }

    fn match_type(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek()
            .map_or(false, |token| token.token_type == token_type)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    // Only called after at least one token has been consumed.
    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, PlayError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(message, None))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: String,
    ) -> Result<&Token, PlayError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(message, Some(help)))
        }
    }

    /// Error naming the expectation and what was found instead.
    fn unexpected(&self, message: &str, help: Option<String>) -> PlayError {
        let (span, found) = match self.peek() {
            Some(token) => (token.span.clone(), token.describe()),
            None => (self.end_span(), "end of input".to_string()),
        };
        let message = format!("{}, found {}", message, found);
        match help {
            Some(help) => PlayError::parse_error_with_help(span, message, help),
            None => PlayError::parse_error(span, message),
        }
    }

    fn error_at_end(&self, message: &str) -> PlayError {
        PlayError::parse_error(self.end_span(), message.to_string())
    }

    // Points just past the last token.
    fn end_span(&self) -> Span {
        match self.tokens.last() {
            Some(token) => Span::single(token.span.end),
            None => Span::single(0),
        }
    }
}
