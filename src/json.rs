//! An object model over `serde_json` documents.
//!
//! JSON objects become host objects: a member holding an object is a to-one
//! relationship, a member holding an array of objects (or an empty array) is a
//! to-many relationship, and every other member is an attribute. Two objects
//! are the same when both carry an equal `id` member.

use rust_decimal::Decimal;
use serde_json::{Map, Value as Json};

use crate::{
    accessor::{AccessError, PropertyAccessor, PropertyKind},
    value::{ObjectRef, Value},
};

/// Member used as the identity of a JSON object.
pub const ID_MEMBER: &str = "id";

/// A JSON object wrapped as a host object.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonObject(pub Map<String, Json>);

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObjectModel;

impl JsonObjectModel {
    pub fn new() -> Self {
        JsonObjectModel
    }

    /// Wrap a JSON document as an evaluation subject.
    pub fn object(json: Json) -> Value {
        json_to_value(json)
    }

    fn members<'o>(&self, object: &'o ObjectRef) -> Result<&'o Map<String, Json>, AccessError> {
        object
            .downcast_ref::<JsonObject>()
            .map(|o| &o.0)
            .ok_or_else(|| AccessError::other("not a JSON object"))
    }

    fn member<'o>(&self, object: &'o ObjectRef, name: &str) -> Result<&'o Json, AccessError> {
        self.members(object)?
            .get(name)
            .ok_or_else(|| AccessError::UnknownProperty(name.to_string()))
    }
}

impl PropertyAccessor for JsonObjectModel {
    fn property_kind(&self, object: &ObjectRef, name: &str) -> Option<PropertyKind> {
        let member = self.members(object).ok()?.get(name)?;
        Some(match member {
            Json::Object(_) => PropertyKind::ToOne,
            Json::Array(items) if items.iter().all(Json::is_object) => PropertyKind::ToMany,
            _ => PropertyKind::Attribute,
        })
    }

    fn read_attribute(&self, object: &ObjectRef, name: &str) -> Result<Value, AccessError> {
        Ok(json_to_value(self.member(object, name)?.clone()))
    }

    fn navigate_to_one(&self, object: &ObjectRef, name: &str) -> Result<Option<ObjectRef>, AccessError> {
        match self.member(object, name)? {
            Json::Object(map) => Ok(Some(ObjectRef::new(JsonObject(map.clone())))),
            Json::Null => Ok(None),
            _ => Err(AccessError::other(format!("'{}' is not an object", name))),
        }
    }

    fn navigate_to_many(&self, object: &ObjectRef, name: &str) -> Result<Vec<ObjectRef>, AccessError> {
        match self.member(object, name)? {
            Json::Array(items) => Ok(items
                .iter()
                .filter_map(|item| match item {
                    Json::Object(map) => Some(ObjectRef::new(JsonObject(map.clone()))),
                    _ => None,
                })
                .collect()),
            _ => Err(AccessError::other(format!("'{}' is not an array", name))),
        }
    }

    fn identity_equals(&self, a: &ObjectRef, b: &ObjectRef) -> bool {
        if a.ptr_eq(b) {
            return true;
        }
        match (self.members(a), self.members(b)) {
            (Ok(x), Ok(y)) => match (x.get(ID_MEMBER), y.get(ID_MEMBER)) {
                (Some(id_a), Some(id_b)) => id_a == id_b,
                _ => x == y,
            },
            _ => false,
        }
    }

    fn extract_identity(&self, object: &ObjectRef) -> Result<Value, AccessError> {
        self.members(object)?
            .get(ID_MEMBER)
            .cloned()
            .map(json_to_value)
            .ok_or_else(|| AccessError::Identity(format!("object has no '{}' member", ID_MEMBER)))
    }
}

/// Convert a JSON value, wrapping objects as host objects.
pub fn json_to_value(v: Json) -> Value {
    match v {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(u) = n.as_u64() {
                Value::Decimal(Decimal::from(u))
            } else {
                n.as_f64().map(Value::Float).unwrap_or(Value::Null)
            }
        }
        Json::String(s) => Value::String(s),
        Json::Array(arr) => Value::List(arr.into_iter().map(json_to_value).collect()),
        Json::Object(obj) => Value::Object(ObjectRef::new(JsonObject(obj))),
    }
}

/// Convert a value back to JSON. Objects not created by this model become
/// `null`.
pub fn value_to_json(v: &Value) -> Json {
    match v {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Decimal(d) => {
            use rust_decimal::prelude::ToPrimitive;
            match d.to_i64() {
                Some(i) if d.fract().is_zero() => Json::Number(i.into()),
                _ => d
                    .to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or(Json::Null),
            }
        }
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => Json::String(bytes.iter().map(|b| format!("{:02x}", b)).collect()),
        Value::Object(o) => o
            .downcast_ref::<JsonObject>()
            .map(|o| Json::Object(o.0.clone()))
            .unwrap_or(Json::Null),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
    }
}
