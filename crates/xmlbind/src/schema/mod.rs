//! Type descriptors: the static schema of every record type.
//!
//! A [`Schema`] is an immutable arena of [`TypeDescriptor`]s produced by
//! [`SchemaBuilder::build`]. Types refer to each other through copyable
//! [`TypeId`] handles, which lets field types be self-referential or
//! mutually recursive while parent chains stay acyclic (cycles are rejected
//! at build time).
//!
//! Each descriptor caches its *effective* field list: the parent's effective
//! fields followed by the type's own fields, in declaration order. That order
//! is also the order of child elements on the wire.

mod builder;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::PrimitiveKind;
use crate::error::{Error, Result};
use crate::instance::Instance;

pub use builder::{FieldDef, MaxSpec, SchemaBuilder, SchemaDocument, TypeDef};

/// Handle to a type descriptor inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    /// Position of the type in its schema.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Upper occurrence bound of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxOccurs {
    One,
    Unbounded,
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::One => f.write_str("1"),
            MaxOccurs::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Occurrence bounds. `min` is always 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    min: u8,
    max: MaxOccurs,
}

impl Occurs {
    /// Exactly one.
    pub const REQUIRED: Occurs = Occurs { min: 1, max: MaxOccurs::One };
    /// Zero or one.
    pub const OPTIONAL: Occurs = Occurs { min: 0, max: MaxOccurs::One };
    /// Zero or more.
    pub const REPEATED: Occurs = Occurs { min: 0, max: MaxOccurs::Unbounded };
    /// One or more.
    pub const ONE_OR_MORE: Occurs = Occurs { min: 1, max: MaxOccurs::Unbounded };

    /// Returns `None` when `min` is greater than 1.
    pub fn new(min: u32, max: MaxOccurs) -> Option<Self> {
        match min {
            0 | 1 => Some(Occurs { min: min as u8, max }),
            _ => None,
        }
    }

    /// Minimum number of occurrences, 0 or 1.
    pub fn min(&self) -> u32 {
        u32::from(self.min)
    }

    /// Maximum number of occurrences.
    pub fn max(&self) -> MaxOccurs {
        self.max
    }

    /// True when at least one occurrence is required.
    pub fn is_required(&self) -> bool {
        self.min >= 1
    }

    /// True when the field holds a sequence.
    pub fn is_repeated(&self) -> bool {
        self.max == MaxOccurs::Unbounded
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

/// What a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    Complex(TypeId),
}

/// One field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_ref: TypeRef,
    pub occurs: Occurs,
    /// Namespace of the declaring type; qualifies the field's element tag.
    pub namespace: Option<String>,
    /// The type that declares this field (differs from the owner for inherited fields).
    pub declared_in: TypeId,
}

/// Immutable schema of one record type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: String,
    pub namespace: Option<String>,
    pub parent: Option<TypeId>,
    pub own_fields: Vec<FieldDescriptor>,
    pub doc: String,
    effective: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Inherited fields first, then own fields, in declaration order.
    pub fn effective_fields(&self) -> &[FieldDescriptor] {
        &self.effective
    }

    /// Looks a field up in the effective field list.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.effective.iter().find(|f| f.name == name)
    }
}

/// A frozen set of type descriptors.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeId>,
}

impl Schema {
    /// The descriptor for `id`, if it belongs to this schema.
    pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id.0)
    }

    /// The descriptor named `name`.
    pub fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    /// Like [`lookup`](Self::lookup), failing with [`Error::UnknownType`].
    pub fn require(&self, name: &str) -> Result<&TypeDescriptor> {
        self.lookup(name).ok_or_else(|| Error::UnknownType {
            name: name.to_string(),
        })
    }

    /// Returns true when `sub` is `sup` or inherits from it.
    pub fn is_subtype_of(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut current = Some(sub);
        while let Some(id) = current {
            if id == sup {
                return true;
            }
            current = self.get(id).and_then(|t| t.parent);
        }
        false
    }

    /// Creates an empty instance (all fields absent) of the named type.
    pub fn new_instance(&self, name: &str) -> Result<Instance> {
        self.require(name).map(Instance::of)
    }

    /// Display name of a type reference.
    pub fn type_ref_name(&self, type_ref: &TypeRef) -> String {
        match type_ref {
            TypeRef::Primitive(kind) => kind.to_string(),
            TypeRef::Complex(id) => self
                .get(*id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| format!("#{}", id.0)),
        }
    }

    /// All descriptors in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    /// Number of types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when the schema has no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_bounds() {
        assert!(Occurs::new(2, MaxOccurs::One).is_none());
        let occurs = Occurs::new(1, MaxOccurs::Unbounded).unwrap();
        assert_eq!(occurs, Occurs::ONE_OR_MORE);
        assert!(occurs.is_required());
        assert!(occurs.is_repeated());
        assert_eq!(Occurs::OPTIONAL.to_string(), "0..1");
        assert_eq!(Occurs::REPEATED.to_string(), "0..unbounded");
    }

    #[test]
    fn test_subtype_walk() {
        let schema = SchemaBuilder::new()
            .with_type(TypeDef::new("A").field(FieldDef::required("a", "string")))
            .with_type(TypeDef::new("B").extends("A"))
            .with_type(TypeDef::new("C").extends("B"))
            .with_type(TypeDef::new("D"))
            .build()
            .unwrap();
        let id = |n: &str| schema.lookup(n).unwrap().id;
        assert!(schema.is_subtype_of(id("C"), id("A")));
        assert!(schema.is_subtype_of(id("B"), id("B")));
        assert!(!schema.is_subtype_of(id("A"), id("C")));
        assert!(!schema.is_subtype_of(id("D"), id("A")));
    }

    #[test]
    fn test_require_unknown_type() {
        let schema = Schema::default();
        assert!(matches!(
            schema.require("Bogus"),
            Err(Error::UnknownType { name }) if name == "Bogus"
        ));
    }
}
