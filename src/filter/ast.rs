//! # Predicate Tree
//!
//! Compiled form of a filter: comparisons between a field and a constant,
//! combined with AND / OR / NOT. Evaluation follows nullable lifting, so a
//! comparison against null only matches through `eq null` / `ne null`.

use std::fmt;

use crate::schema::{FieldPath, Fields, Value};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// Parses an operator word (`eq`, `ne`, `gt`, `ge`, `lt`, `le`), ignoring case
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "eq" => Some(CompareOp::Eq),
            "ne" => Some(CompareOp::Ne),
            "gt" => Some(CompareOp::Gt),
            "ge" => Some(CompareOp::Ge),
            "lt" => Some(CompareOp::Lt),
            "le" => Some(CompareOp::Le),
            _ => None,
        }
    }

    /// Symbol used when rendering a tree
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    /// Applies the operator with lifted null semantics
    pub fn apply(&self, left: &Value, right: &Value) -> bool {
        use std::cmp::Ordering::*;

        match self {
            CompareOp::Eq => left.lifted_eq(right),
            CompareOp::Ne => !left.lifted_eq(right),
            op => match left.partial_compare(right) {
                Some(ordering) => match op {
                    CompareOp::Gt => ordering == Greater,
                    CompareOp::Ge => ordering != Less,
                    CompareOp::Lt => ordering == Less,
                    CompareOp::Le => ordering != Greater,
                    CompareOp::Eq | CompareOp::Ne => false,
                },
                None => false,
            },
        }
    }
}

/// One side of a comparison
#[derive(Debug, Clone)]
pub enum Operand {
    Field(FieldPath),
    Constant(Value),
}

impl Operand {
    fn value(&self, record: &dyn Fields) -> Value {
        match self {
            Operand::Field(path) => path.read(record),
            Operand::Constant(value) => value.clone(),
        }
    }
}

/// A boolean predicate over one record
#[derive(Debug, Clone)]
pub enum Predicate {
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Field-versus-constant comparison
    pub fn compare(path: FieldPath, op: CompareOp, value: Value) -> Self {
        Predicate::Compare {
            left: Operand::Field(path),
            op,
            right: Operand::Constant(value),
        }
    }

    /// `self AND other`
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// `NOT self`
    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Evaluates the predicate against a record
    pub fn evaluate(&self, record: &dyn Fields) -> bool {
        match self {
            Predicate::Compare { left, op, right } => {
                op.apply(&left.value(record), &right.value(record))
            }
            Predicate::And(a, b) => a.evaluate(record) && b.evaluate(record),
            Predicate::Or(a, b) => a.evaluate(record) || b.evaluate(record),
            Predicate::Not(inner) => !inner.evaluate(record),
        }
    }

    /// Number of comparisons in the tree
    pub fn comparison_count(&self) -> usize {
        match self {
            Predicate::Compare { .. } => 1,
            Predicate::And(a, b) | Predicate::Or(a, b) => {
                a.comparison_count() + b.comparison_count()
            }
            Predicate::Not(inner) => inner.comparison_count(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(path) => write!(f, "{}", path),
            Operand::Constant(value) => write!(f, "{}", value),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { left, op, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Predicate::And(a, b) => write!(f, "({} AND {})", a, b),
            Predicate::Or(a, b) => write!(f, "({} OR {})", a, b),
            Predicate::Not(inner) => write!(f, "NOT {}", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_words() {
        assert_eq!(CompareOp::parse("EQ"), Some(CompareOp::Eq));
        assert_eq!(CompareOp::parse("le"), Some(CompareOp::Le));
        assert_eq!(CompareOp::parse("like"), None);
    }

    #[test]
    fn test_ordering_against_null_is_false() {
        for op in [CompareOp::Gt, CompareOp::Ge, CompareOp::Lt, CompareOp::Le] {
            assert!(!op.apply(&Value::Null, &Value::Int(1)));
            assert!(!op.apply(&Value::Int(1), &Value::Null));
        }
        assert!(CompareOp::Ne.apply(&Value::Null, &Value::Int(1)));
        assert!(CompareOp::Eq.apply(&Value::Null, &Value::Null));
    }

    #[test]
    fn test_range_operators() {
        let five = Value::Int(5);
        assert!(CompareOp::Ge.apply(&five, &Value::Int(5)));
        assert!(!CompareOp::Gt.apply(&five, &Value::Int(5)));
        assert!(CompareOp::Lt.apply(&five, &Value::Float(5.5)));
        assert!(CompareOp::Le.apply(&five, &Value::Int(5)));
    }
}
