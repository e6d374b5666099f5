// tests/common/mod.rs
//
// A small in-memory art catalogue used as the host object model.

#![allow(dead_code)]

use std::str::FromStr;

use qualex::accessor::{AccessError, PropertyAccessor, PropertyKind};
use qualex::ast::BinOp;
use qualex::value::{ObjectRef, Value};
use rust_decimal::Decimal;

pub struct Gallery {
    pub id: i64,
    pub name: String,
}

pub struct Painting {
    pub id: i64,
    pub title: String,
    pub price: Option<Decimal>,
    pub gallery: Option<ObjectRef>,
}

pub struct Artist {
    pub id: i64,
    pub name: String,
    pub paintings: Vec<ObjectRef>,
}

/// Accessor over [`Artist`], [`Painting`] and [`Gallery`].
#[derive(Default)]
pub struct ArtModel {
    /// Report ordered comparisons against null as errors
    pub strict_nulls: bool,
}

impl ArtModel {
    pub fn strict() -> Self {
        ArtModel { strict_nulls: true }
    }
}

pub fn gallery(id: i64, name: &str) -> ObjectRef {
    ObjectRef::new(Gallery {
        id,
        name: name.to_string(),
    })
}

pub fn painting(id: i64, title: &str, price: Option<&str>, gallery: Option<&ObjectRef>) -> ObjectRef {
    ObjectRef::new(Painting {
        id,
        title: title.to_string(),
        price: price.map(|p| Decimal::from_str(p).unwrap()),
        gallery: gallery.cloned(),
    })
}

pub fn artist(id: i64, name: &str, paintings: Vec<ObjectRef>) -> Value {
    Value::Object(ObjectRef::new(Artist {
        id,
        name: name.to_string(),
        paintings,
    }))
}

/// Picasso has two paintings in the Louvre and one without a gallery,
/// Dali has one priced painting and one unpriced, Miro has none.
pub fn catalogue() -> Vec<Value> {
    let louvre = gallery(1, "Louvre");
    let prado = gallery(2, "Prado");

    vec![
        artist(
            1,
            "Picasso",
            vec![
                painting(11, "Guernica", Some("20000"), Some(&louvre)),
                painting(12, "La Vie", Some("4500.50"), Some(&louvre)),
                painting(13, "Sketch", Some("150"), None),
            ],
        ),
        artist(
            2,
            "Dali",
            vec![
                painting(21, "The Persistence of Memory", Some("15000"), Some(&prado)),
                painting(22, "Untitled", None, Some(&prado)),
            ],
        ),
        artist(3, "Miro", vec![]),
    ]
}

pub fn names(subjects: &[&Value]) -> Vec<String> {
    let model = ArtModel::default();
    subjects
        .iter()
        .filter_map(|v| v.as_object())
        .map(|o| match model.read_attribute(o, "artistName") {
            Ok(Value::String(s)) => s,
            other => panic!("artist without a name: {:?}", other),
        })
        .collect()
}

impl PropertyAccessor for ArtModel {
    fn property_kind(&self, object: &ObjectRef, name: &str) -> Option<PropertyKind> {
        if object.downcast_ref::<Artist>().is_some() {
            match name {
                "artistName" | "artistId" => Some(PropertyKind::Attribute),
                "paintingArray" => Some(PropertyKind::ToMany),
                _ => None,
            }
        } else if object.downcast_ref::<Painting>().is_some() {
            match name {
                "paintingTitle" | "estimatedPrice" | "paintingId" => Some(PropertyKind::Attribute),
                "toGallery" => Some(PropertyKind::ToOne),
                _ => None,
            }
        } else if object.downcast_ref::<Gallery>().is_some() {
            match name {
                "galleryName" | "galleryId" => Some(PropertyKind::Attribute),
                _ => None,
            }
        } else {
            None
        }
    }

    fn read_attribute(&self, object: &ObjectRef, name: &str) -> Result<Value, AccessError> {
        if let Some(a) = object.downcast_ref::<Artist>() {
            return match name {
                "artistName" => Ok(Value::String(a.name.clone())),
                "artistId" => Ok(Value::Integer(a.id)),
                _ => Err(AccessError::UnknownProperty(name.to_string())),
            };
        }
        if let Some(p) = object.downcast_ref::<Painting>() {
            return match name {
                "paintingTitle" => Ok(Value::String(p.title.clone())),
                "estimatedPrice" => Ok(p.price.into()),
                "paintingId" => Ok(Value::Integer(p.id)),
                _ => Err(AccessError::UnknownProperty(name.to_string())),
            };
        }
        if let Some(g) = object.downcast_ref::<Gallery>() {
            return match name {
                "galleryName" => Ok(Value::String(g.name.clone())),
                "galleryId" => Ok(Value::Integer(g.id)),
                _ => Err(AccessError::UnknownProperty(name.to_string())),
            };
        }
        Err(AccessError::other("unknown object type"))
    }

    fn navigate_to_one(&self, object: &ObjectRef, name: &str) -> Result<Option<ObjectRef>, AccessError> {
        match (object.downcast_ref::<Painting>(), name) {
            (Some(p), "toGallery") => Ok(p.gallery.clone()),
            _ => Err(AccessError::UnknownProperty(name.to_string())),
        }
    }

    fn navigate_to_many(&self, object: &ObjectRef, name: &str) -> Result<Vec<ObjectRef>, AccessError> {
        match (object.downcast_ref::<Artist>(), name) {
            (Some(a), "paintingArray") => Ok(a.paintings.clone()),
            _ => Err(AccessError::UnknownProperty(name.to_string())),
        }
    }

    fn identity_equals(&self, a: &ObjectRef, b: &ObjectRef) -> bool {
        a.ptr_eq(b)
            || match (self.extract_identity(a), self.extract_identity(b)) {
                (Ok(x), Ok(y)) => x == y && self.type_tag(a) == self.type_tag(b),
                _ => false,
            }
    }

    fn extract_identity(&self, object: &ObjectRef) -> Result<Value, AccessError> {
        if let Some(a) = object.downcast_ref::<Artist>() {
            Ok(Value::Integer(a.id))
        } else if let Some(p) = object.downcast_ref::<Painting>() {
            Ok(Value::Integer(p.id))
        } else if let Some(g) = object.downcast_ref::<Gallery>() {
            Ok(Value::Integer(g.id))
        } else {
            Err(AccessError::Identity("unknown object type".to_string()))
        }
    }

    fn null_comparison(&self, op: BinOp) -> Result<(), AccessError> {
        if self.strict_nulls {
            return Err(AccessError::NullComparison {
                op: op.symbol(),
                reason: "null has no order".to_string(),
            });
        }
        Ok(())
    }
}

impl ArtModel {
    fn type_tag(&self, object: &ObjectRef) -> u8 {
        if object.downcast_ref::<Artist>().is_some() {
            1
        } else if object.downcast_ref::<Painting>().is_some() {
            2
        } else {
            3
        }
    }
}
