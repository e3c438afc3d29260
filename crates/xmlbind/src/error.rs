//! Error types for schema assembly, marshaling and unmarshaling.
//!
//! Decode-time errors abort the whole call: the unmarshaler never hands back a
//! partially populated instance. Every variant carries enough context (type
//! name, element path, expected vs. found count) to diagnose the failure
//! without re-parsing the document.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::codec::PrimitiveKind;
use crate::schema::MaxOccurs;

/// The primary error type for every binding operation.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad type descriptor construction.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A field declared with `min = 1` had no matching element.
    #[error("missing required field `{field}` of type {type_name} at {path}: expected at least 1 element, found 0")]
    MissingRequiredField {
        type_name: String,
        field: String,
        path: String,
    },

    /// Too many elements for a singular field.
    #[error("cardinality violation for field `{field}` of type {type_name} at {path}: expected at most {max}, found {found}")]
    CardinalityViolation {
        type_name: String,
        field: String,
        path: String,
        max: MaxOccurs,
        found: usize,
    },

    /// Primitive text that could not be decoded.
    #[error("malformed scalar at {path}: {source}")]
    MalformedScalar {
        path: String,
        #[source]
        source: ScalarError,
    },

    /// Polymorphic lookup miss.
    #[error("unknown type `{name}`")]
    UnknownType { name: String },

    /// A polymorphic payload without the type-identifier attribute.
    #[error("element <{tag}> carries no `{attribute}` attribute")]
    MissingTypeAttribute { tag: String, attribute: String },

    /// A child element matching no field, rejected under `UnknownChildPolicy::Reject`.
    #[error("unexpected element <{tag}> inside {type_name} at {path}")]
    UnexpectedElement {
        type_name: String,
        tag: String,
        path: String,
    },

    /// A qualified name that is not valid Clark notation.
    #[error("invalid qualified name `{0}`")]
    InvalidName(String),

    /// Instance/descriptor contract violations detected while marshaling.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// XML document could not be parsed.
    #[cfg(feature = "xml")]
    #[error("XML parse error: {0}")]
    Parse(#[from] roxmltree::Error),

    /// XML document could not be written.
    #[cfg(feature = "xml")]
    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A character XML 1.0 cannot represent, found while writing a document.
    #[error("element <{tag}> holds {character:?}, which XML 1.0 cannot represent")]
    UnrepresentableChar { tag: String, character: char },

    /// IO error while writing a document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while freezing type definitions into a [`Schema`](crate::Schema).
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("type `{0}` is defined more than once")]
    DuplicateType(String),

    #[error("type `{type_name}` extends unknown type `{parent}`")]
    UnknownParent { type_name: String, parent: String },

    #[error("field `{type_name}.{field}` refers to unknown type `{field_type}`")]
    UnknownFieldType {
        type_name: String,
        field: String,
        field_type: String,
    },

    #[error("field `{type_name}.{field}` has invalid occurrence bounds: {reason}")]
    InvalidOccurs {
        type_name: String,
        field: String,
        reason: String,
    },

    #[error("inheritance cycle: {}", chain.join(" -> "))]
    InheritanceCycle { chain: Vec<String> },

    #[error("field `{field}` appears more than once in the effective fields of `{type_name}`")]
    DuplicateField { type_name: String, field: String },

    #[error("invalid schema definition: {0}")]
    Definition(#[from] serde_json::Error),
}

/// Contract violations: the instance handed to the marshaler does not fit its descriptor.
#[derive(Error, Debug)]
pub enum MarshalError {
    #[error("field `{type_name}.{field}` expects {expected}, got {found}")]
    KindMismatch {
        type_name: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("field `{type_name}.{field}` expects an instance of {expected}, got {found}")]
    TypeMismatch {
        type_name: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("field `{type_name}.{field}` is {expected} but holds {found}")]
    ShapeMismatch {
        type_name: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("type {type_name} has no field `{field}`")]
    UnknownField { type_name: String, field: String },

    #[error("instance of `{type_name}` does not belong to this schema")]
    ForeignInstance { type_name: String },
}

/// Primitive text that does not parse as its declared kind.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot decode {text:?} as {kind}: {reason}")]
pub struct ScalarError {
    pub kind: PrimitiveKind,
    pub text: String,
    pub reason: String,
}

impl ScalarError {
    pub(crate) fn new(kind: PrimitiveKind, text: &str, reason: impl ToString) -> Self {
        Self {
            kind,
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_message_names_field_and_counts() {
        let err = Error::CardinalityViolation {
            type_name: "Address".to_string(),
            field: "city".to_string(),
            path: "atach/city".to_string(),
            max: MaxOccurs::One,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("`city`"));
        assert!(msg.contains("expected at most 1"));
        assert!(msg.contains("found 2"));
    }

    #[test]
    fn test_inheritance_cycle_message() {
        let err = SchemaError::InheritanceCycle {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "inheritance cycle: A -> B -> A");
    }

    #[test]
    fn test_schema_error_converts() {
        let err: Error = SchemaError::DuplicateType("Person".into()).into();
        assert!(matches!(err, Error::Schema(SchemaError::DuplicateType(_))));
    }
}
