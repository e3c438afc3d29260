//! In-memory records conforming to a [`TypeDescriptor`].
//!
//! Presence is tri-state per field: absent (no entry), a single value, or a
//! sequence (which may be empty). Instances own their nested instances
//! outright; cloning is a deep copy.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::codec::Scalar;
use crate::schema::{TypeDescriptor, TypeId};

/// A field value: a primitive or a nested record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Instance(Instance),
}

impl Value {
    /// The primitive value, if this is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Instance(_) => None,
        }
    }

    /// The nested record, if this is one.
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(i) => Some(i),
            Value::Scalar(_) => None,
        }
    }

    /// The string, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is an integer scalar.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// The double, if this is a double scalar.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Double(d)) => Some(*d),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean scalar.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    /// The timestamp, if this is a timestamp scalar.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Scalar(Scalar::Timestamp(ts)) => Some(*ts),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Value::Scalar(s) => s.kind().to_string(),
            Value::Instance(i) => format!("an instance of {}", i.type_name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Scalar(s) => s.serialize(serializer),
            Value::Instance(i) => i.serialize(serializer),
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::Instance(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Scalar(Scalar::String(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(Scalar::Integer(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Scalar(Scalar::Integer(i64::from(value)))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(Scalar::Double(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Scalar(Scalar::Boolean(value))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Scalar(Scalar::Timestamp(value))
    }
}

/// A present field: one value, or an ordered sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Value),
    Sequence(Vec<Value>),
}

impl FieldValue {
    pub(crate) fn shape(&self) -> &'static str {
        match self {
            FieldValue::Single(_) => "a single value",
            FieldValue::Sequence(_) => "a sequence",
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Single(v) => v.serialize(serializer),
            FieldValue::Sequence(items) => items.serialize(serializer),
        }
    }
}

/// A record value of some type.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    type_id: TypeId,
    type_name: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Instance {
    /// An empty instance: every field absent.
    pub fn of(descriptor: &TypeDescriptor) -> Self {
        Self {
            type_id: descriptor.id,
            type_name: descriptor.name.clone(),
            fields: BTreeMap::new(),
        }
    }

    /// Handle of the type this instance belongs to.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the type this instance belongs to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Sets a singular field.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.fields
            .insert(field.to_string(), FieldValue::Single(value.into()));
        self
    }

    /// Sets a repeated field, replacing any previous content.
    pub fn set_sequence<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.fields
            .insert(field.to_string(), FieldValue::Sequence(values));
        self
    }

    /// Appends to a repeated field, starting an empty sequence when absent.
    ///
    /// A field currently holding a single value becomes a two-item sequence.
    pub fn push(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        let items = match self.fields.remove(field) {
            None => vec![value],
            Some(FieldValue::Sequence(mut items)) => {
                items.push(value);
                items
            }
            Some(FieldValue::Single(previous)) => vec![previous, value],
        };
        self.fields
            .insert(field.to_string(), FieldValue::Sequence(items));
        self
    }

    /// Makes the field absent, returning what it held.
    pub fn clear(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// The field's value, or `None` when absent.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Mutable access to a present field.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(field)
    }

    /// True when the field has no entry at all.
    pub fn is_absent(&self, field: &str) -> bool {
        !self.fields.contains_key(field)
    }

    /// The value of a singular field.
    pub fn value(&self, field: &str) -> Option<&Value> {
        match self.fields.get(field)? {
            FieldValue::Single(v) => Some(v),
            FieldValue::Sequence(_) => None,
        }
    }

    /// The items of a repeated field.
    pub fn sequence(&self, field: &str) -> Option<&[Value]> {
        match self.fields.get(field)? {
            FieldValue::Sequence(items) => Some(items),
            FieldValue::Single(_) => None,
        }
    }

    /// The nested record held by a singular field.
    pub fn nested(&self, field: &str) -> Option<&Instance> {
        self.value(field)?.as_instance()
    }

    /// The string held by a singular field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.value(field)?.as_str()
    }

    /// The integer held by a singular field.
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.value(field)?.as_integer()
    }

    /// The double held by a singular field.
    pub fn double(&self, field: &str) -> Option<f64> {
        self.value(field)?.as_double()
    }

    /// The boolean held by a singular field.
    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.value(field)?.as_boolean()
    }

    /// The timestamp held by a singular field.
    pub fn timestamp(&self, field: &str) -> Option<NaiveDateTime> {
        self.value(field)?.as_timestamp()
    }

    /// Present fields, ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// JSON view of the instance, for logging and debugging.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub(crate) fn insert(&mut self, field: String, value: FieldValue) {
        self.fields.insert(field, value);
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("@type", &self.type_name)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
