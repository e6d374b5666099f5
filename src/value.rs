use std::{any::Any, fmt, sync::Arc};

use rust_decimal::{Decimal, prelude::ToPrimitive};

/// An opaque reference to a host-application object.
///
/// The engine never looks inside the referenced object; every read goes through
/// a [`PropertyAccessor`](crate::accessor::PropertyAccessor). Two references are
/// `==` only when they point at the same allocation. Logical identity (two
/// references that represent the same row) is judged by the accessor.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Any + Send + Sync>);

impl ObjectRef {
    pub fn new<T: Any + Send + Sync>(object: T) -> Self {
        ObjectRef(Arc::new(object))
    }

    /// Borrow the referenced object as a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", Arc::as_ptr(&self.0))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// A value produced by evaluating an expression or carried as a literal.
///
/// Numbers keep their flavour: integers, exact decimals and floats are distinct
/// variants, and arithmetic promotes along `Integer -> Decimal -> Float`.
///
/// # Examples
///
/// ```
/// use qualex::Value;
///
/// let name = Value::from("Picasso");
/// let price = Value::from(3000);
/// let flag = Value::Boolean(true);
///
/// assert_eq!(name.type_name(), "string");
/// assert_eq!(price, Value::Integer(3000));
/// assert!(flag.is_truthy());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    Boolean(bool),

    /// 64-bit signed integer (`42`, `42L`)
    Integer(i64),

    /// Exact decimal (`3.50`); equality ignores trailing zeros
    Decimal(Decimal),

    /// Binary floating point (`3.5d`, `1e3`)
    Float(f64),

    String(String),

    /// Raw byte sequence (`x'0aff'`)
    Bytes(Vec<u8>),

    /// Host object reference
    Object(ObjectRef),

    /// Ordered sequence, produced by fan-out and by list literals
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Decimal(_) | Value::Float(_))
    }

    /// Truthiness used when a value stands in for a condition.
    ///
    /// Null is false, numbers are true when non-zero, empty lists are false and
    /// every other non-null value is true.
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Integer(n) => *n != 0,
            Decimal(d) => !d.is_zero(),
            Float(n) => *n != 0.0,
            List(items) => !items.is_empty(),
            String(_) | Bytes(_) | Object(_) => true,
        }
    }

    /// Convert to boolean for conditions
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            _ => self.is_truthy(),
        }
    }

    /// Integer view used by bitwise operators. Fractions are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Decimal(d) => d.trunc().to_i64(),
            Value::Float(n) if n.is_finite() => Some(n.trunc() as i64),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Decimal(d) => d.to_f64(),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns a human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Object(_) => "object",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Value::Object(o) => write!(f, "{:?}", o),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
