use crate::error::Span;
use std::fmt;

/// A parsed program: the top-level statements in source order, every tag
/// name that appears anywhere in the source, and every tag body declared
/// anywhere in the source, in declaration order.
#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub tags: Vec<String>,
    pub bindings: Vec<(String, Stmt)>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign {
        target: Target,
        value: Expr,
        span: Span,
    },
    /// `@name statement` declares `body` for the tag when the program is
    /// parsed; `@name` alone (no body) invokes it.
    Tag {
        name: String,
        body: Option<Box<Stmt>>,
        span: Span,
    },
    Swap {
        left: Target,
        right: Target,
        span: Span,
    },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Print {
        expr: Expr,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Assign { span, .. } => span,
            Stmt::Tag { span, .. } => span,
            Stmt::Swap { span, .. } => span,
            Stmt::If { span, .. } => span,
            Stmt::While { span, .. } => span,
            Stmt::Print { span, .. } => span,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Stmt::Assign { .. } => "assignment",
            Stmt::Tag { body: Some(_), .. } => "tag declaration",
            Stmt::Tag { body: None, .. } => "tag invocation",
            Stmt::Swap { .. } => "swap",
            Stmt::If { .. } => "if",
            Stmt::While { .. } => "while",
            Stmt::Print { .. } => "print",
        }
    }
}

/// Left-hand side of an assignment or an operand of `SWAP`.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub index: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Integer {
        value: i64,
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    Variable {
        name: String,
        index: Option<Box<Expr>>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    /// Only appears as the right-hand side of an assignment.
    Vector {
        elements: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Integer { span, .. } => span,
            Expr::Boolean { span, .. } => span,
            Expr::Variable { span, .. } => span,
            Expr::Binary { span, .. } => span,
            Expr::Vector { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    Greater,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal | BinaryOp::NotEqual | BinaryOp::Less | BinaryOp::Greater
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// Canonical source rendering. Arithmetic is fully parenthesised; comparison
// chains stay bare because the grammar has no parenthesised comparison.

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Integer { value, .. } => write!(f, "{}", value),
            Expr::Boolean { value: true, .. } => write!(f, "TRUE"),
            Expr::Boolean { value: false, .. } => write!(f, "FALSE"),
            Expr::Variable { name, index, .. } => match index {
                Some(index) => write!(f, "{}[{}]", name, index),
                None => write!(f, "{}", name),
            },
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => {
                if operator.is_comparison() {
                    write!(f, "{} {} {}", left, operator, right)
                } else {
                    write!(f, "({} {} {})", left, operator, right)
                }
            }
            Expr::Vector { elements, .. } => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => write!(f, "{}", self.name),
        }
    }
}

// One statement per line: a bare tag invocation is only terminated by a newline.
fn write_block(f: &mut fmt::Formatter, statements: &[Stmt]) -> fmt::Result {
    writeln!(f, "{{")?;
    for statement in statements {
        writeln!(f, "{}", statement)?;
    }
    write!(f, "}}")
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Assign { target, value, .. } => write!(f, "{} = {}", target, value),
            Stmt::Tag { name, body, .. } => match body {
                Some(body) => write!(f, "@{} {}", name, body),
                None => write!(f, "@{}", name),
            },
            Stmt::Swap { left, right, .. } => write!(f, "SWAP {} {}", left, right),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                write!(f, "IF {} ", condition)?;
                write_block(f, then_branch)?;
                if let Some(else_branch) = else_branch {
                    write!(f, " ELSE ")?;
                    write_block(f, else_branch)?;
                }
                Ok(())
            }
            Stmt::While {
                condition, body, ..
            } => {
                write!(f, "WHILE {} ", condition)?;
                write_block(f, body)
            }
            Stmt::Print { expr, .. } => write!(f, "PRINT {}", expr),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}
