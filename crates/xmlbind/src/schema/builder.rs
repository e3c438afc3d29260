//! Definition-time construction of a [`Schema`].
//!
//! Types are declared by name and may reference parents and nested types that
//! are declared later. [`SchemaBuilder::build`] resolves every reference,
//! rejects inheritance cycles and duplicate fields, and computes each type's
//! effective field list exactly once.
//!
//! # Example
//!
//! ```
//! use xmlbind::schema::{FieldDef, SchemaBuilder, TypeDef};
//!
//! let schema = SchemaBuilder::new()
//!     .namespace("urn:example")
//!     .with_type(
//!         TypeDef::new("Person")
//!             .field(FieldDef::optional("name", "string"))
//!             .field(FieldDef::repeated("titles", "string")),
//!     )
//!     .with_type(
//!         TypeDef::new("Employee")
//!             .extends("Person")
//!             .field(FieldDef::required("id", "integer")),
//!     )
//!     .build()?;
//!
//! let employee = schema.lookup("Employee").unwrap();
//! let names: Vec<_> = employee.effective_fields().iter().map(|f| f.name.as_str()).collect();
//! assert_eq!(names, ["name", "titles", "id"]);
//! # Ok::<(), xmlbind::Error>(())
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FieldDescriptor, MaxOccurs, Occurs, Schema, TypeDescriptor, TypeId, TypeRef};
use crate::codec::PrimitiveKind;
use crate::error::SchemaError;

/// Upper bound as written in a definition: `1` or `"unbounded"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxSpec {
    Count(u32),
    Named(String),
}

impl Default for MaxSpec {
    fn default() -> Self {
        MaxSpec::Count(1)
    }
}

impl From<MaxOccurs> for MaxSpec {
    fn from(max: MaxOccurs) -> Self {
        match max {
            MaxOccurs::One => MaxSpec::Count(1),
            MaxOccurs::Unbounded => MaxSpec::Named("unbounded".to_string()),
        }
    }
}

fn default_min() -> u32 {
    1
}

/// A field as declared, before name resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Primitive kind name (`string`, `integer`, ...) or the name of a record type.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_min")]
    pub min: u32,
    #[serde(default)]
    pub max: MaxSpec,
}

impl FieldDef {
    /// A field with explicit bounds.
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        min: u32,
        max: MaxOccurs,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            min,
            max: max.into(),
        }
    }

    /// Exactly one occurrence.
    pub fn required(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, type_name, 1, MaxOccurs::One)
    }

    /// Zero or one occurrence.
    pub fn optional(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, type_name, 0, MaxOccurs::One)
    }

    /// Zero or more occurrences.
    pub fn repeated(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, type_name, 0, MaxOccurs::Unbounded)
    }

    /// One or more occurrences.
    pub fn one_or_more(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, type_name, 1, MaxOccurs::Unbounded)
    }
}

/// A record type as declared, before name resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(default, alias = "extends")]
    pub parent: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl TypeDef {
    /// A type with no parent and no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the parent type by name.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Overrides the schema's default namespace for this type.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the description.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Appends a field after those already declared.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

/// Serialized form of a whole set of definitions.
///
/// ```json
/// {
///   "namespace": "urn:example",
///   "types": [
///     { "name": "Level3", "fields": [{ "name": "arg1", "type": "integer" }] },
///     { "name": "Level1", "fields": [
///         { "name": "level3", "type": "Level3", "min": 0, "max": "unbounded" }
///     ] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
}

/// Collects [`TypeDef`]s and freezes them into a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    namespace: Option<String>,
    types: Vec<TypeDef>,
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    New,
    InProgress,
    Done,
}

impl SchemaBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads definitions from a JSON [`SchemaDocument`].
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(document))
    }

    /// A builder holding an already deserialized document.
    pub fn from_document(document: SchemaDocument) -> Self {
        Self {
            namespace: document.namespace,
            types: document.types,
        }
    }

    /// Default namespace for types that do not declare one.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Adds a definition, builder style.
    pub fn with_type(mut self, def: TypeDef) -> Self {
        self.types.push(def);
        self
    }

    /// Adds a definition in place.
    pub fn add_type(&mut self, def: TypeDef) -> &mut Self {
        self.types.push(def);
        self
    }

    /// Resolves names, validates and freezes the definitions.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut by_name = HashMap::with_capacity(self.types.len());
        for (index, def) in self.types.iter().enumerate() {
            if by_name.insert(def.name.clone(), TypeId(index)).is_some() {
                return Err(SchemaError::DuplicateType(def.name.clone()));
            }
        }

        let parents = self
            .types
            .iter()
            .map(|def| match &def.parent {
                None => Ok(None),
                Some(parent) => by_name.get(parent).copied().map(Some).ok_or_else(|| {
                    SchemaError::UnknownParent {
                        type_name: def.name.clone(),
                        parent: parent.clone(),
                    }
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        check_acyclic(&self.types, &parents)?;

        let mut descriptors = Vec::with_capacity(self.types.len());
        for (index, def) in self.types.iter().enumerate() {
            let namespace = def.namespace.clone().or_else(|| self.namespace.clone());
            let own_fields = def
                .fields
                .iter()
                .map(|field| {
                    resolve_field(def, field, &by_name, TypeId(index), namespace.as_deref())
                })
                .collect::<Result<Vec<_>, _>>()?;
            descriptors.push(TypeDescriptor {
                id: TypeId(index),
                name: def.name.clone(),
                namespace,
                parent: parents[index],
                own_fields,
                doc: def.doc.clone(),
                effective: Vec::new(),
            });
        }

        compute_effective_fields(&mut descriptors)?;

        debug!(types = descriptors.len(), "schema built");
        Ok(Schema {
            types: descriptors,
            by_name,
        })
    }
}

fn resolve_field(
    owner: &TypeDef,
    field: &FieldDef,
    by_name: &HashMap<String, TypeId>,
    declared_in: TypeId,
    namespace: Option<&str>,
) -> Result<FieldDescriptor, SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidOccurs {
        type_name: owner.name.clone(),
        field: field.name.clone(),
        reason,
    };

    let max = match &field.max {
        MaxSpec::Count(1) => MaxOccurs::One,
        MaxSpec::Named(word) if word == "unbounded" => MaxOccurs::Unbounded,
        MaxSpec::Named(word) if word == "1" => MaxOccurs::One,
        MaxSpec::Count(n) => return Err(invalid(format!("max must be 1 or unbounded, got {n}"))),
        MaxSpec::Named(word) => {
            return Err(invalid(format!("max must be 1 or unbounded, got {word:?}")));
        }
    };
    let occurs = Occurs::new(field.min, max)
        .ok_or_else(|| invalid(format!("min must be 0 or 1, got {}", field.min)))?;

    let type_ref = match PrimitiveKind::from_type_name(&field.type_name) {
        Some(kind) => TypeRef::Primitive(kind),
        None => by_name
            .get(&field.type_name)
            .copied()
            .map(TypeRef::Complex)
            .ok_or_else(|| SchemaError::UnknownFieldType {
                type_name: owner.name.clone(),
                field: field.name.clone(),
                field_type: field.type_name.clone(),
            })?,
    };

    Ok(FieldDescriptor {
        name: field.name.clone(),
        type_ref,
        occurs,
        namespace: namespace.map(str::to_string),
        declared_in,
    })
}

/// Walks every parent chain once; a chain that re-enters itself is a cycle.
fn check_acyclic(types: &[TypeDef], parents: &[Option<TypeId>]) -> Result<(), SchemaError> {
    let mut state = vec![Visit::New; types.len()];
    for start in 0..types.len() {
        let mut chain: Vec<usize> = Vec::new();
        let mut current = Some(start);
        while let Some(index) = current {
            match state[index] {
                Visit::Done => break,
                Visit::InProgress => {
                    let from = chain.iter().position(|&c| c == index).unwrap_or(0);
                    let mut names: Vec<String> =
                        chain[from..].iter().map(|&c| types[c].name.clone()).collect();
                    names.push(types[index].name.clone());
                    return Err(SchemaError::InheritanceCycle { chain: names });
                }
                Visit::New => {
                    state[index] = Visit::InProgress;
                    chain.push(index);
                    current = parents[index].map(TypeId::index);
                }
            }
        }
        for index in chain {
            state[index] = Visit::Done;
        }
    }
    Ok(())
}

/// Fills `effective` for every descriptor, ancestors first. Requires acyclic parents.
fn compute_effective_fields(descriptors: &mut [TypeDescriptor]) -> Result<(), SchemaError> {
    let mut done = vec![false; descriptors.len()];
    for start in 0..descriptors.len() {
        let mut pending = Vec::new();
        let mut current = Some(start);
        while let Some(index) = current {
            if done[index] {
                break;
            }
            pending.push(index);
            current = descriptors[index].parent.map(TypeId::index);
        }

        while let Some(index) = pending.pop() {
            let mut effective = match descriptors[index].parent {
                Some(parent) => descriptors[parent.index()].effective.clone(),
                None => Vec::new(),
            };
            effective.extend(descriptors[index].own_fields.iter().cloned());

            let mut seen = HashSet::with_capacity(effective.len());
            for field in &effective {
                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        type_name: descriptors[index].name.clone(),
                        field: field.name.clone(),
                    });
                }
            }

            descriptors[index].effective = effective;
            done[index] = true;
        }
    }
    Ok(())
}
