//! Dynamically typed field values.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use derive_more::From;
use ordered_float::OrderedFloat;

use crate::{fields::FieldName, record::Record};

/// A field value. `Nil` doubles as the unset marker: reading a field that
/// was never set (or was deleted) yields it.
///
/// `PartialEq` is the loose relation (`Int(70)` equals `Float(70.0)`);
/// [`Value::strict_eq`] is the variant-exact relation that `Hash` agrees
/// with.
#[derive(Clone, Debug, From)]
pub enum Value {
    #[from(ignore)]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Sym(FieldName),
    List(Vec<Value>),
    Record(Record),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Loose equality: numeric cross-type comparison is permitted, records
    /// compare via their loose `==`.
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Self::Record(a), Self::Record(b)) => a == b,
            _ => self.strict_eq(other),
        }
    }

    /// Strict equality: no numeric coercion, records compare via
    /// [`Record::eql`]. This is the relation `Hash` is consistent with.
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Sym(a), Self::Sym(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_eq(y))
            }
            (Self::Record(a), Self::Record(b)) => a.eql(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.loose_eq(other)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Nil => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(x) => OrderedFloat(*x).hash(state),
            Self::Str(s) => s.hash(state),
            Self::Sym(s) => s.hash(state),
            Self::List(items) => {
                for item in items {
                    item.hash(state);
                }
            }
            Self::Record(r) => r.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Sym(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                let mut iter = items.iter().peekable();
                while let Some(item) = iter.next() {
                    write!(f, "{item}")?;
                    if iter.peek().is_some() {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "]")
            }
            Self::Record(r) => write!(f, "{r}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}
