//! XML element tree → instance.
//!
//! Children are grouped by local tag name; each field of the type's effective
//! field list then takes its group, with occurrence bounds enforced before any
//! value is decoded. The first violation aborts the whole call and no partial
//! instance is returned.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::codec;
use crate::config::{BindOptions, DuplicatePolicy, UnknownChildPolicy, ZeroOccurrencePolicy};
use crate::element::XmlElement;
use crate::error::{Error, Result};
use crate::instance::{FieldValue, Instance, Value};
use crate::registry::bare_type_name;
use crate::schema::{FieldDescriptor, MaxOccurs, Schema, TypeDescriptor, TypeId, TypeRef};

/// Reads XML elements into instances of a schema's types.
#[derive(Debug, Clone)]
pub struct Unmarshaler<'s> {
    schema: &'s Schema,
    options: BindOptions,
}

impl<'s> Unmarshaler<'s> {
    /// An unmarshaler with default options.
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_options(schema, BindOptions::default())
    }

    /// An unmarshaler with explicit options.
    pub fn with_options(schema: &'s Schema, options: BindOptions) -> Self {
        Self { schema, options }
    }

    /// Decodes `element` as an instance of `type_id`.
    pub fn from_xml(&self, type_id: TypeId, element: &XmlElement) -> Result<Instance> {
        let descriptor = self.schema.get(type_id).ok_or_else(|| Error::UnknownType {
            name: format!("#{}", type_id.index()),
        })?;
        debug!(type_name = %descriptor.name, tag = %element.tag, "unmarshaling element");
        let mut path = vec![element.tag.local.clone()];
        self.read_instance(descriptor, element, &mut path)
    }

    /// Decodes `element` as an instance of the named type.
    pub fn from_xml_named(&self, type_name: &str, element: &XmlElement) -> Result<Instance> {
        let descriptor = self.schema.require(type_name)?;
        self.from_xml(descriptor.id, element)
    }

    fn read_instance(
        &self,
        descriptor: &TypeDescriptor,
        element: &XmlElement,
        path: &mut Vec<String>,
    ) -> Result<Instance> {
        let mut groups: HashMap<&str, Vec<&XmlElement>> = HashMap::new();
        for child in &element.children {
            groups.entry(child.tag.local.as_str()).or_default().push(child);
        }

        let mut instance = Instance::of(descriptor);
        for field in descriptor.effective_fields() {
            let matches = groups.remove(field.name.as_str()).unwrap_or_default();
            trace!(field = %field.name, found = matches.len(), "matching field");

            if matches.is_empty() {
                if field.occurs.is_required() {
                    return Err(Error::MissingRequiredField {
                        type_name: descriptor.name.clone(),
                        field: field.name.clone(),
                        path: path.join("/"),
                    });
                }
                if field.occurs.is_repeated()
                    && self.options.zero_occurrences == ZeroOccurrencePolicy::EmptySequence
                {
                    instance.insert(field.name.clone(), FieldValue::Sequence(Vec::new()));
                }
                continue;
            }

            let value = match field.occurs.max() {
                MaxOccurs::One => {
                    let chosen = self.pick_singular(descriptor, field, &matches, path.as_slice())?;
                    path.push(field.name.clone());
                    let value = self.read_value(field, chosen, path)?;
                    path.pop();
                    FieldValue::Single(value)
                }
                MaxOccurs::Unbounded => {
                    let mut items = Vec::with_capacity(matches.len());
                    for (index, child) in matches.iter().enumerate() {
                        path.push(format!("{}[{}]", field.name, index));
                        items.push(self.read_value(field, child, path)?);
                        path.pop();
                    }
                    FieldValue::Sequence(items)
                }
            };
            instance.insert(field.name.clone(), value);
        }

        if let Some(unknown) = element
            .children
            .iter()
            .find(|c| groups.contains_key(c.tag.local.as_str()))
        {
            match self.options.unknown_children {
                UnknownChildPolicy::Reject => {
                    return Err(Error::UnexpectedElement {
                        type_name: descriptor.name.clone(),
                        tag: unknown.tag.to_string(),
                        path: path.join("/"),
                    });
                }
                UnknownChildPolicy::Ignore => {
                    warn!(
                        type_name = %descriptor.name,
                        tag = %unknown.tag,
                        "ignoring unknown child element"
                    );
                }
            }
        }

        Ok(instance)
    }

    fn pick_singular<'x>(
        &self,
        descriptor: &TypeDescriptor,
        field: &FieldDescriptor,
        matches: &[&'x XmlElement],
        path: &[String],
    ) -> Result<&'x XmlElement> {
        let found = matches.len();
        if found > 1 {
            match self.options.duplicate_singular {
                DuplicatePolicy::Reject => {
                    return Err(Error::CardinalityViolation {
                        type_name: descriptor.name.clone(),
                        field: field.name.clone(),
                        path: path.join("/"),
                        max: MaxOccurs::One,
                        found,
                    });
                }
                DuplicatePolicy::LastWins => {
                    warn!(
                        type_name = %descriptor.name,
                        field = %field.name,
                        found,
                        "keeping last of repeated singular elements"
                    );
                }
            }
        }
        Ok(matches[found - 1])
    }

    fn read_value(
        &self,
        field: &FieldDescriptor,
        element: &XmlElement,
        path: &mut Vec<String>,
    ) -> Result<Value> {
        match field.type_ref {
            TypeRef::Primitive(kind) => codec::decode(kind, element.text_content())
                .map(Value::Scalar)
                .map_err(|source| Error::MalformedScalar {
                    path: path.join("/"),
                    source,
                }),
            TypeRef::Complex(declared) => {
                let concrete = self.concrete_type(declared, element)?;
                self.read_instance(concrete, element, path).map(Value::Instance)
            }
        }
    }

    /// The declared type, or the subtype named by the element's type attribute.
    fn concrete_type(&self, declared: TypeId, element: &XmlElement) -> Result<&'s TypeDescriptor> {
        let unknown = |name: &str| Error::UnknownType {
            name: name.to_string(),
        };
        let Some(raw) = element.attribute(&self.options.type_attribute) else {
            return self
                .schema
                .get(declared)
                .ok_or_else(|| unknown(&format!("#{}", declared.index())));
        };

        let name = bare_type_name(raw);
        match self.schema.lookup(name) {
            Some(concrete) if self.schema.is_subtype_of(concrete.id, declared) => {
                trace!(type_name = %concrete.name, "using tagged subtype");
                Ok(concrete)
            }
            _ => Err(unknown(name)),
        }
    }
}
