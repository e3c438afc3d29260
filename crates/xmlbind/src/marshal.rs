//! Instance → XML element tree.
//!
//! The marshaler walks an instance along its type's effective field list and
//! emits one child element per present value, in field declaration order
//! (inherited fields first). Repeated fields become sibling elements sharing
//! the field's tag; absent fields and empty sequences emit nothing.
//!
//! Required-ness is not checked here: an instance may be marshaled while
//! incomplete, and only decoding enforces minimum occurrences.

use tracing::{debug, trace};

use crate::codec;
use crate::config::BindOptions;
use crate::element::{QName, XmlElement};
use crate::error::{MarshalError, Result};
use crate::instance::{FieldValue, Instance, Value};
use crate::schema::{FieldDescriptor, MaxOccurs, Schema, TypeDescriptor, TypeRef};

/// Writes instances of a schema's types as XML elements.
#[derive(Debug, Clone)]
pub struct Marshaler<'s> {
    schema: &'s Schema,
    options: BindOptions,
}

impl<'s> Marshaler<'s> {
    /// A marshaler with default options.
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_options(schema, BindOptions::default())
    }

    /// A marshaler with explicit options.
    pub fn with_options(schema: &'s Schema, options: BindOptions) -> Self {
        Self { schema, options }
    }

    /// Appends the instance's wrapper element under `parent` and returns it.
    ///
    /// On error `parent` is left untouched.
    pub fn to_xml<'e>(
        &self,
        instance: &Instance,
        parent: &'e mut XmlElement,
        tag: QName,
    ) -> Result<&'e mut XmlElement> {
        let element = self.to_element(instance, tag)?;
        Ok(parent.append_child(element))
    }

    /// Marshals the instance into a detached element.
    pub fn to_element(&self, instance: &Instance, tag: QName) -> Result<XmlElement> {
        let descriptor = self.descriptor_of(instance)?;
        debug!(type_name = %descriptor.name, tag = %tag, "marshaling instance");
        self.write_instance(descriptor, instance, tag)
    }

    fn descriptor_of(&self, instance: &Instance) -> Result<&'s TypeDescriptor> {
        self.schema
            .get(instance.type_id())
            .filter(|d| d.name == instance.type_name())
            .ok_or_else(|| {
                MarshalError::ForeignInstance {
                    type_name: instance.type_name().to_string(),
                }
                .into()
            })
    }

    fn write_instance(
        &self,
        descriptor: &TypeDescriptor,
        instance: &Instance,
        tag: QName,
    ) -> Result<XmlElement> {
        if let Some((name, _)) = instance
            .fields()
            .find(|(name, _)| descriptor.field(name).is_none())
        {
            return Err(MarshalError::UnknownField {
                type_name: descriptor.name.clone(),
                field: name.to_string(),
            }
            .into());
        }

        let mut element = XmlElement::new(tag);
        for field in descriptor.effective_fields() {
            let Some(value) = instance.get(&field.name) else {
                continue;
            };
            let child_tag = QName::new(field.namespace.as_deref(), field.name.as_str());

            match (value, field.occurs.max()) {
                (FieldValue::Single(v), MaxOccurs::One) => {
                    let child = self.write_value(descriptor, field, v, child_tag)?;
                    element.children.push(child);
                }
                (FieldValue::Sequence(items), MaxOccurs::Unbounded) => {
                    trace!(field = %field.name, count = items.len(), "writing repeated field");
                    for item in items {
                        let child = self.write_value(descriptor, field, item, child_tag.clone())?;
                        element.children.push(child);
                    }
                }
                (other, max) => {
                    return Err(MarshalError::ShapeMismatch {
                        type_name: descriptor.name.clone(),
                        field: field.name.clone(),
                        expected: match max {
                            MaxOccurs::One => "singular",
                            MaxOccurs::Unbounded => "repeated",
                        },
                        found: other.shape(),
                    }
                    .into());
                }
            }
        }
        Ok(element)
    }

    fn write_value(
        &self,
        owner: &TypeDescriptor,
        field: &FieldDescriptor,
        value: &Value,
        tag: QName,
    ) -> Result<XmlElement> {
        match (&field.type_ref, value) {
            (TypeRef::Primitive(kind), Value::Scalar(scalar)) if scalar.kind() == *kind => {
                Ok(XmlElement::with_text(tag, codec::encode(scalar)))
            }
            (TypeRef::Complex(declared), Value::Instance(nested)) => {
                let concrete = self.descriptor_of(nested)?;
                if !self.schema.is_subtype_of(concrete.id, *declared) {
                    return Err(MarshalError::TypeMismatch {
                        type_name: owner.name.clone(),
                        field: field.name.clone(),
                        expected: self.schema.type_ref_name(&field.type_ref),
                        found: concrete.name.clone(),
                    }
                    .into());
                }
                let mut child = self.write_instance(concrete, nested, tag)?;
                if concrete.id != *declared && self.options.tag_subtypes {
                    child.set_attribute(self.options.type_attribute.clone(), concrete.name.clone());
                }
                Ok(child)
            }
            (type_ref, other) => Err(MarshalError::KindMismatch {
                type_name: owner.name.clone(),
                field: field.name.clone(),
                expected: self.schema.type_ref_name(type_ref),
                found: other.describe(),
            }
            .into()),
        }
    }
}
