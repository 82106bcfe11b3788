use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    /// Only produced by `/`, which yields the true quotient.
    Real(f64),
    Boolean(bool),
    /// Fixed length once built; elements are overwritten in place.
    Vector(Vec<i64>),
}

impl Value {
    /// Numeric view used by every arithmetic and relational operator.
    ///
    /// Reals truncate toward zero and booleans count as 1/0. Vectors have no
    /// numeric view.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Real(n) => Some(n.trunc() as i64),
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::Vector(_) => None,
        }
    }

    /// Truth value of an `IF`/`WHILE` condition.
    pub fn to_condition(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(n) => Some(*n != 0),
            Value::Real(n) => Some(*n != 0.0),
            Value::Vector(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Boolean(_) => "boolean",
            Value::Vector(_) => "vector",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(n) => {
                // Always show at least one decimal place for reals
                if n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::Vector(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
