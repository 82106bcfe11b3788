use crate::ast::{BinaryOp, Expr, Program, Stmt, Target};
use crate::error::{PlayError, Span};
use crate::value::Value;
use log::{debug, trace};
use std::collections::BTreeMap;

pub const DEFAULT_MAX_TAG_DEPTH: usize = 256;

/// Variable name to current value. Entries are created by the first
/// assignment and never removed.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    values: BTreeMap<String, Value>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.values.get_mut(name)
    }

    pub fn assign(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Tag name to bound statement. `None` marks a tag that appears in the
/// source but is never declared with a body.
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    tags: BTreeMap<String, Option<Stmt>>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name without touching an existing binding.
    pub fn declare(&mut self, name: &str) {
        self.tags.entry(name.to_string()).or_insert(None);
    }

    /// Bind a body; the last binding in source order wins.
    pub fn bind(&mut self, name: &str, body: Stmt) {
        self.tags.insert(name.to_string(), Some(body));
    }

    pub fn get(&self, name: &str) -> Option<Option<&Stmt>> {
        self.tags.get(name).map(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, Option<&Stmt>)> {
        self.tags.iter().map(|(name, body)| (name, body.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }
}

/// Where `PRINT` sends its values.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Write each value to stdout on its own line.
    Console,
    /// Keep the values in order, for assertions.
    Captured(Vec<Value>),
}

impl Output {
    pub fn captured() -> Self {
        Output::Captured(Vec::new())
    }

    fn emit(&mut self, value: Value) {
        match self {
            Output::Console => println!("{}", value),
            Output::Captured(values) => values.push(value),
        }
    }

    fn clear(&mut self) {
        if let Output::Captured(values) = self {
            values.clear();
        }
    }
}

pub struct Evaluator {
    symbols: SymbolTable,
    tags: TagTable,
    output: Output,
    max_tag_depth: usize,
    tag_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_output(Output::Console)
    }

    pub fn with_output(output: Output) -> Self {
        Self {
            symbols: SymbolTable::new(),
            tags: TagTable::new(),
            output,
            max_tag_depth: DEFAULT_MAX_TAG_DEPTH,
            tag_depth: 0,
        }
    }

    /// Evaluator that records printed values instead of writing them.
    pub fn capturing() -> Self {
        Self::with_output(Output::captured())
    }

    pub fn set_max_tag_depth(&mut self, depth: usize) {
        self.max_tag_depth = depth;
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Values printed so far in captured mode; empty on the console.
    pub fn captured(&self) -> &[Value] {
        match &self.output {
            Output::Captured(values) => values,
            Output::Console => &[],
        }
    }

    /// Forget all variables, tags and captured output.
    pub fn reset(&mut self) {
        self.symbols.clear();
        self.tags.clear();
        self.output.clear();
        self.tag_depth = 0;
    }

    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), PlayError> {
        debug!(
            "running {} statements, {} tags",
            program.statements.len(),
            program.tags.len()
        );

        for name in &program.tags {
            self.tags.declare(name);
        }
        for (name, body) in &program.bindings {
            debug!("bind tag @{}", name);
            self.tags.bind(name, body.clone());
        }
        for statement in &program.statements {
            self.execute_statement(statement)?;
        }

        debug!("finished with {} variables", self.symbols.len());
        Ok(())
    }

    pub fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), PlayError> {
        trace!("execute {}", stmt.kind());

        match stmt {
            Stmt::Assign { target, value, .. } => self.execute_assign(target, value),
            // Bound before the program started.
            Stmt::Tag { body: Some(_), .. } => Ok(()),
            Stmt::Tag {
                name,
                body: None,
                span,
            } => self.invoke_tag(name, span),
            Stmt::Swap { left, right, span } => self.execute_swap(left, right, span),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate_condition(condition)? {
                    self.execute_block(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                while self.evaluate_condition(condition)? {
                    self.execute_block(body)?;
                }
                Ok(())
            }
            Stmt::Print { expr, .. } => {
                let value = self.evaluate_expression(expr)?;
                self.output.emit(value);
                Ok(())
            }
        }
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), PlayError> {
        for statement in statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    fn execute_assign(&mut self, target: &Target, value: &Expr) -> Result<(), PlayError> {
        match &target.index {
            None => {
                let value = self.evaluate_expression(value)?;
                self.symbols.assign(&target.name, value);
            }
            Some(index) => {
                let position = self.evaluate_index(index)?;
                let element = self.evaluate_integer(value)?;
                *self.element_mut(&target.name, position, &target.span)? = element;
            }
        }
        Ok(())
    }

    fn invoke_tag(&mut self, name: &str, span: &Span) -> Result<(), PlayError> {
        let body = match self.tags.get(name) {
            Some(Some(body)) => body.clone(),
            Some(None) => {
                return Err(PlayError::runtime_error_with_help(
                    span.clone(),
                    format!("Tag '@{}' has no body", name),
                    format!(
                        "Declare a body for it somewhere in the program, e.g. '@{} x = x + 1'.",
                        name
                    ),
                ));
            }
            None => {
                return Err(PlayError::runtime_error(
                    span.clone(),
                    format!("Undeclared tag '@{}'", name),
                ));
            }
        };

        if self.tag_depth >= self.max_tag_depth {
            return Err(PlayError::runtime_error_with_help(
                span.clone(),
                format!("Tag '@{}' nested deeper than {} levels", name, self.max_tag_depth),
                "A tag that invokes itself never terminates; use WHILE for repetition."
                    .to_string(),
            ));
        }

        debug!("invoke tag @{}", name);
        self.tag_depth += 1;
        let result = self.execute_statement(&body);
        self.tag_depth -= 1;
        result
    }

    /// Exchange two targets. Both indices are evaluated and both old values
    /// read before either write.
    fn execute_swap(&mut self, left: &Target, right: &Target, span: &Span) -> Result<(), PlayError> {
        let left_index = match &left.index {
            Some(index) => Some(self.evaluate_index(index)?),
            None => None,
        };
        let right_index = match &right.index {
            Some(index) => Some(self.evaluate_index(index)?),
            None => None,
        };

        match (left_index, right_index) {
            (None, None) => {
                let left_value = self.lookup(&left.name, &left.span)?.clone();
                let right_value = self.lookup(&right.name, &right.span)?.clone();
                self.symbols.assign(&left.name, right_value);
                self.symbols.assign(&right.name, left_value);
            }
            (Some(i), None) => {
                let element = *self.element_mut(&left.name, i, &left.span)?;
                let scalar = self.swappable_scalar(right, span)?;
                *self.element_mut(&left.name, i, &left.span)? = scalar;
                self.symbols.assign(&right.name, Value::Integer(element));
            }
            (None, Some(j)) => {
                let scalar = self.swappable_scalar(left, span)?;
                let element = *self.element_mut(&right.name, j, &right.span)?;
                self.symbols.assign(&left.name, Value::Integer(element));
                *self.element_mut(&right.name, j, &right.span)? = scalar;
            }
            (Some(i), Some(j)) => {
                let left_element = *self.element_mut(&left.name, i, &left.span)?;
                let right_element = *self.element_mut(&right.name, j, &right.span)?;
                *self.element_mut(&left.name, i, &left.span)? = right_element;
                *self.element_mut(&right.name, j, &right.span)? = left_element;
            }
        }
        Ok(())
    }

    /// A scalar swapped with a vector element must be numeric; reals truncate
    /// as they do when assigned to an element.
    fn swappable_scalar(&self, target: &Target, span: &Span) -> Result<i64, PlayError> {
        match self.lookup(&target.name, &target.span)? {
            Value::Integer(n) => Ok(*n),
            Value::Real(n) => Ok(n.trunc() as i64),
            other => Err(PlayError::runtime_error_with_help(
                span.clone(),
                format!(
                    "Cannot swap {} '{}' with a vector element",
                    other.type_name(),
                    target.name
                ),
                "Vector elements are integers and can only be exchanged with numbers."
                    .to_string(),
            )),
        }
    }

    fn evaluate_condition(&mut self, condition: &Expr) -> Result<bool, PlayError> {
        let value = self.evaluate_expression(condition)?;
        value.to_condition().ok_or_else(|| {
            PlayError::runtime_error(
                condition.span().clone(),
                format!("Condition must be a boolean, got {}", value.type_name()),
            )
        })
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, PlayError> {
        match expr {
            Expr::Integer { value, .. } => Ok(Value::Integer(*value)),
            Expr::Boolean { value, .. } => Ok(Value::Boolean(*value)),
            Expr::Variable { name, index, span } => match index {
                Some(index) => {
                    let position = self.evaluate_index(index)?;
                    Ok(Value::Integer(*self.element_mut(name, position, span)?))
                }
                None => Ok(self.lookup(name, span)?.clone()),
            },
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left_val = self.evaluate_integer(left)?;
                let right_val = self.evaluate_integer(right)?;
                self.evaluate_binary_op(*operator, left_val, right_val, span)
            }
            Expr::Vector { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate_integer(element)?);
                }
                Ok(Value::Vector(items))
            }
        }
    }

    fn evaluate_binary_op(
        &self,
        operator: BinaryOp,
        left: i64,
        right: i64,
        span: &Span,
    ) -> Result<Value, PlayError> {
        let overflow = || {
            PlayError::runtime_error(
                span.clone(),
                format!("Integer overflow in {} {} {}", left, operator, right),
            )
        };

        match operator {
            BinaryOp::Add => left.checked_add(right).map(Value::Integer).ok_or_else(overflow),
            BinaryOp::Subtract => left.checked_sub(right).map(Value::Integer).ok_or_else(overflow),
            BinaryOp::Multiply => left.checked_mul(right).map(Value::Integer).ok_or_else(overflow),
            BinaryOp::Divide => {
                if right == 0 {
                    Err(PlayError::runtime_error(
                        span.clone(),
                        "Division by zero".to_string(),
                    ))
                } else {
                    Ok(Value::Real(left as f64 / right as f64))
                }
            }
            BinaryOp::Equal => Ok(Value::Boolean(left == right)),
            BinaryOp::NotEqual => Ok(Value::Boolean(left != right)),
            BinaryOp::Less => Ok(Value::Boolean(left < right)),
            BinaryOp::Greater => Ok(Value::Boolean(left > right)),
        }
    }

    /// Evaluate and coerce to an integer.
    fn evaluate_integer(&mut self, expr: &Expr) -> Result<i64, PlayError> {
        let value = self.evaluate_expression(expr)?;
        value.to_integer().ok_or_else(|| {
            PlayError::runtime_error_with_help(
                expr.span().clone(),
                format!("Expected a number, got {}", value.type_name()),
                "Index a vector to use one of its elements: v[0]".to_string(),
            )
        })
    }

    fn evaluate_index(&mut self, index: &Expr) -> Result<usize, PlayError> {
        let position = self.evaluate_integer(index)?;
        usize::try_from(position).map_err(|_| {
            PlayError::runtime_error(
                index.span().clone(),
                format!("Vector index must not be negative, got {}", position),
            )
        })
    }

    fn lookup(&self, name: &str, span: &Span) -> Result<&Value, PlayError> {
        self.symbols.get(name).ok_or_else(|| {
            PlayError::runtime_error_with_help(
                span.clone(),
                format!("Undefined variable '{}'", name),
                format!("Assign '{}' before reading it, e.g. '{} = 0'.", name, name),
            )
        })
    }

    fn element_mut(
        &mut self,
        name: &str,
        position: usize,
        span: &Span,
    ) -> Result<&mut i64, PlayError> {
        let value = self.symbols.get_mut(name).ok_or_else(|| {
            PlayError::runtime_error(span.clone(), format!("Undefined variable '{}'", name))
        })?;

        let items = match value {
            Value::Vector(items) => items,
            other => {
                return Err(PlayError::runtime_error(
                    span.clone(),
                    format!("Cannot index {} '{}'", other.type_name(), name),
                ));
            }
        };

        let len = items.len();
        items.get_mut(position).ok_or_else(|| {
            PlayError::runtime_error(
                span.clone(),
                format!(
                    "Index {} out of range for vector '{}' of length {}",
                    position, name, len
                ),
            )
        })
    }
}
