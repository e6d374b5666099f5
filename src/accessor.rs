//! Host-application contracts consumed by the evaluator and the
//! parameterized renderer.
//!
//! The engine knows nothing about the object model it runs against. A host
//! implements [`PropertyAccessor`] to expose attributes, relationships and
//! identity, and optionally [`EnumResolver`] to resolve `enum:` literals.

use std::collections::HashMap;

use crate::{
    ast::BinOp,
    value::{ObjectRef, Value},
};

/// What a property name denotes on a given object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Plain value, read with [`PropertyAccessor::read_attribute`]
    Attribute,
    /// Relationship to at most one object
    ToOne,
    /// Relationship to a sequence of objects
    ToMany,
}

/// Failure reported by a host collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    #[error("comparing null with '{op}' is not allowed: {reason}")]
    NullComparison { op: &'static str, reason: String },

    #[error("cannot extract identity: {0}")]
    Identity(String),

    #[error("{0}")]
    Other(String),
}

impl AccessError {
    pub fn other(msg: impl Into<String>) -> Self {
        AccessError::Other(msg.into())
    }
}

/// Read access to a host object graph.
///
/// # Examples
///
/// ```
/// use qualex::accessor::{AccessError, PropertyAccessor, PropertyKind};
/// use qualex::value::{ObjectRef, Value};
///
/// struct Point { x: i64 }
///
/// struct Points;
///
/// impl PropertyAccessor for Points {
///     fn property_kind(&self, _: &ObjectRef, name: &str) -> Option<PropertyKind> {
///         (name == "x").then_some(PropertyKind::Attribute)
///     }
///     fn read_attribute(&self, object: &ObjectRef, _: &str) -> Result<Value, AccessError> {
///         let point = object.downcast_ref::<Point>().ok_or_else(|| AccessError::other("not a point"))?;
///         Ok(Value::Integer(point.x))
///     }
///     fn navigate_to_one(&self, _: &ObjectRef, name: &str) -> Result<Option<ObjectRef>, AccessError> {
///         Err(AccessError::UnknownProperty(name.to_string()))
///     }
///     fn navigate_to_many(&self, _: &ObjectRef, name: &str) -> Result<Vec<ObjectRef>, AccessError> {
///         Err(AccessError::UnknownProperty(name.to_string()))
///     }
/// }
/// ```
pub trait PropertyAccessor {
    /// Classify `name` on `object`, or `None` if the object has no such
    /// property.
    fn property_kind(&self, object: &ObjectRef, name: &str) -> Option<PropertyKind>;

    fn read_attribute(&self, object: &ObjectRef, name: &str) -> Result<Value, AccessError>;

    fn navigate_to_one(&self, object: &ObjectRef, name: &str)
    -> Result<Option<ObjectRef>, AccessError>;

    fn navigate_to_many(&self, object: &ObjectRef, name: &str)
    -> Result<Vec<ObjectRef>, AccessError>;

    /// Whether two references denote the same logical object.
    fn identity_equals(&self, a: &ObjectRef, b: &ObjectRef) -> bool {
        a.ptr_eq(b)
    }

    /// Primary-key scalar of `object`.
    fn extract_identity(&self, _object: &ObjectRef) -> Result<Value, AccessError> {
        Err(AccessError::Identity(
            "this object model does not expose identities".to_string(),
        ))
    }

    /// Called before an ordering comparison involving null. Returning an
    /// error aborts evaluation with that error instead of yielding `false`.
    fn null_comparison(&self, _op: BinOp) -> Result<(), AccessError> {
        Ok(())
    }
}

/// Resolves `enum:Type.MEMBER` literals.
pub trait EnumResolver {
    fn resolve_enum_member(&self, type_name: &str, member: &str) -> Option<Value>;
}

/// A fixed table of enum types and their members.
///
/// Members resolve to `Value::String(member)` unless registered with an
/// explicit value.
#[derive(Debug, Clone, Default)]
pub struct EnumTable {
    types: HashMap<String, HashMap<String, Value>>,
}

impl EnumTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `type_name` with members that evaluate to their own names.
    pub fn register<I, S>(&mut self, type_name: impl Into<String>, members: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.types.entry(type_name.into()).or_default();
        for member in members {
            let member = member.into();
            entry.insert(member.clone(), Value::String(member));
        }
        self
    }

    pub fn register_value(
        &mut self,
        type_name: impl Into<String>,
        member: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.types
            .entry(type_name.into())
            .or_default()
            .insert(member.into(), value.into());
        self
    }
}

impl EnumResolver for EnumTable {
    fn resolve_enum_member(&self, type_name: &str, member: &str) -> Option<Value> {
        self.types.get(type_name)?.get(member).cloned()
    }
}
