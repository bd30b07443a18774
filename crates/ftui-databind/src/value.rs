#![forbid(unsafe_code)]

//! Dynamic values carried between data sources and bound components.

use std::fmt;
use std::rc::Rc;

use crate::descriptor::{DataObject, ObjectRef};
use crate::error::BindingError;
use crate::list::{DataList, ListRef};

/// The kind of a [`Value`], used to drive conversion and parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    /// No declared kind; values pass through unconverted.
    #[default]
    Any,
    Bool,
    Int,
    Float,
    Text,
    Object,
    List,
}

impl ValueKind {
    /// Whether this kind holds a number.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any value",
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "number",
            Self::Text => "text",
            Self::Object => "object",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// A dynamically typed value.
///
/// `DbNull` is the "missing data" sentinel data sources use by default; it is
/// distinct from `Null` (no value at all) but both count as null for display.
/// Objects and lists compare by reference.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    DbNull,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Object(ObjectRef),
    List(ListRef),
}

impl Value {
    /// Wrap a shared data object.
    pub fn object<T: DataObject>(object: Rc<T>) -> Self {
        Self::Object(object)
    }

    /// Wrap a shared list.
    pub fn list<T: DataList + 'static>(list: Rc<T>) -> Self {
        Self::List(list)
    }

    /// Text value from anything string-like.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null | Self::DbNull => ValueKind::Any,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::Object(_) => ValueKind::Object,
            Self::List(_) => ValueKind::List,
        }
    }

    /// `true` for both `Null` and `DbNull`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::DbNull)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of `Int` and `Float` values.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Borrow the concrete object behind an `Object` value.
    #[must_use]
    pub fn downcast_ref<T: DataObject>(&self) -> Option<&T> {
        self.as_object()
            .and_then(|object| object.as_any().downcast_ref::<T>())
    }

    /// Convert to `kind` without any culture-specific formatting.
    ///
    /// Null values pass through unchanged; `ValueKind::Any` is the identity.
    ///
    /// # Errors
    ///
    /// [`BindingError::Parse`] for text that does not parse,
    /// [`BindingError::TypeMismatch`] for conversions with no meaning.
    pub fn convert_to(&self, kind: ValueKind) -> Result<Value, BindingError> {
        if kind == ValueKind::Any || self.is_null() || self.kind() == kind {
            return Ok(self.clone());
        }
        let mismatch = || BindingError::TypeMismatch {
            expected: kind,
            found: self.kind(),
        };
        match (kind, self) {
            (ValueKind::Text, v) => Ok(Value::Text(v.to_string())),
            (ValueKind::Int, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
            (ValueKind::Int, Value::Float(f)) => float_to_int(*f).map(Value::Int).ok_or_else(mismatch),
            (ValueKind::Int, Value::Text(s)) => {
                s.trim().parse::<i64>().map(Value::Int).map_err(|_| BindingError::Parse {
                    text: s.clone(),
                    target: kind,
                })
            }
            #[allow(clippy::cast_precision_loss)]
            (ValueKind::Float, Value::Int(i)) => Ok(Value::Float(*i as f64)),
            (ValueKind::Float, Value::Text(s)) => {
                s.trim().parse::<f64>().map(Value::Float).map_err(|_| BindingError::Parse {
                    text: s.clone(),
                    target: kind,
                })
            }
            (ValueKind::Bool, Value::Int(i)) => Ok(Value::Bool(*i != 0)),
            (ValueKind::Bool, Value::Text(s)) => parse_bool(s).map(Value::Bool).ok_or_else(|| {
                BindingError::Parse {
                    text: s.clone(),
                    target: kind,
                }
            }),
            _ => Err(mismatch()),
        }
    }
}

/// Integral floats within `i64` range convert exactly; anything else fails.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn float_to_int(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::DbNull, Self::DbNull) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Default, culture-invariant stringification. Null values render empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null | Self::DbNull => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Object(o) => f.write_str(o.descriptor().type_name()),
            Self::List(l) => write!(f, "list of {}", l.len()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::DbNull => f.write_str("DbNull"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Object(o) => f
                .debug_tuple("Object")
                .field(&o.descriptor().type_name())
                .finish(),
            Self::List(l) => f.debug_struct("List").field("len", &l.len()).finish(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Self::Object(o)
    }
}

impl From<ListRef> for Value {
    fn from(l: ListRef) -> Self {
        Self::List(l)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
