//! Binding options for the marshaler, unmarshaler and resolver.
//!
//! Options can be built programmatically, deserialized (serde) from any
//! config source, or read from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XMLBIND_DUPLICATE_SINGULAR` | reject | `reject` or `last-wins` for repeated elements of a singular field |
//! | `XMLBIND_UNKNOWN_CHILDREN` | ignore | `ignore` or `reject` child elements matching no field |
//! | `XMLBIND_ZERO_OCCURRENCES` | absent | `absent` or `empty-sequence` for repeated fields with no elements |
//! | `XMLBIND_TYPE_ATTRIBUTE` | `{http://www.w3.org/2001/XMLSchema-instance}type` | Clark-notation name of the type-identifier attribute |
//! | `XMLBIND_TAG_SUBTYPES` | true | Tag nested subtype instances with the type attribute when marshaling |
//!
//! # Example
//!
//! ```
//! use xmlbind::{BindOptions, DuplicatePolicy};
//!
//! let options = BindOptions {
//!     duplicate_singular: DuplicatePolicy::LastWins,
//!     ..Default::default()
//! };
//! assert!(options.tag_subtypes);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::element::{QName, xsi_type};

/// What to do when a singular field has more than one matching element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail with a cardinality violation.
    #[default]
    Reject,
    /// Keep the last occurrence.
    LastWins,
}

/// What to do with child elements that match no field of the type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownChildPolicy {
    #[default]
    Ignore,
    Reject,
}

/// How a repeated field with zero matching elements is decoded.
///
/// XML has no way to tell an omitted repeated field from an empty one, so
/// only one of the two survives a round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroOccurrencePolicy {
    /// Leave the field absent.
    #[default]
    Absent,
    /// Store an empty sequence.
    EmptySequence,
}

macro_rules! kebab_from_str {
    ($ty:ty { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(format!("unrecognized value `{}`", other)),
                }
            }
        }
    };
}

kebab_from_str!(DuplicatePolicy {
    "reject" => DuplicatePolicy::Reject,
    "last-wins" => DuplicatePolicy::LastWins,
});

kebab_from_str!(UnknownChildPolicy {
    "ignore" => UnknownChildPolicy::Ignore,
    "reject" => UnknownChildPolicy::Reject,
});

kebab_from_str!(ZeroOccurrencePolicy {
    "absent" => ZeroOccurrencePolicy::Absent,
    "empty-sequence" => ZeroOccurrencePolicy::EmptySequence,
});

/// Options shared by marshaling and unmarshaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindOptions {
    pub duplicate_singular: DuplicatePolicy,
    pub unknown_children: UnknownChildPolicy,
    pub zero_occurrences: ZeroOccurrencePolicy,
    /// Reserved attribute naming a payload's concrete type.
    pub type_attribute: QName,
    /// Tag nested instances whose concrete type is a strict subtype of the declared one.
    pub tag_subtypes: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            duplicate_singular: DuplicatePolicy::Reject,
            unknown_children: UnknownChildPolicy::Ignore,
            zero_occurrences: ZeroOccurrencePolicy::Absent,
            type_attribute: xsi_type(),
            tag_subtypes: true,
        }
    }
}

impl BindOptions {
    /// Reads options from `XMLBIND_*` environment variables.
    ///
    /// Unset variables keep their defaults; unparsable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        override_from(&lookup, "XMLBIND_DUPLICATE_SINGULAR", &mut options.duplicate_singular);
        override_from(&lookup, "XMLBIND_UNKNOWN_CHILDREN", &mut options.unknown_children);
        override_from(&lookup, "XMLBIND_ZERO_OCCURRENCES", &mut options.zero_occurrences);
        override_from(&lookup, "XMLBIND_TYPE_ATTRIBUTE", &mut options.type_attribute);
        override_from(&lookup, "XMLBIND_TAG_SUBTYPES", &mut options.tag_subtypes);
        options
    }

    /// Strictest settings: every irregularity in the input is an error.
    pub fn for_testing() -> Self {
        Self {
            duplicate_singular: DuplicatePolicy::Reject,
            unknown_children: UnknownChildPolicy::Reject,
            ..Default::default()
        }
    }
}

fn override_from<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(e) => warn!(variable = key, value = %raw, error = %e, "ignoring invalid option"),
    }
}
