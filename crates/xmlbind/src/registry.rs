//! Type registry and polymorphic resolver.
//!
//! Payloads declared as "any type" carry their concrete type in a reserved
//! attribute (`xsi:type` by default). The resolver reads that attribute, looks
//! the name up in a [`TypeRegistry`], and hands the element to the
//! [`Unmarshaler`] with the resolved descriptor. A name missing from the
//! registry is a hard error, never a silent fallback.
//!
//! The writer side is not automatic: whoever produces a polymorphic payload
//! must tag it with [`tag_concrete_type`] after marshaling.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use xmlbind::{Marshaler, QName, TypeRegistry, resolve_and_decode, tag_concrete_type};
//! use xmlbind::schema::{FieldDef, SchemaBuilder, TypeDef};
//!
//! let schema = Arc::new(
//!     SchemaBuilder::new()
//!         .with_type(TypeDef::new("Level4").field(FieldDef::required("arg1", "string")))
//!         .build()?,
//! );
//! let registry = TypeRegistry::with_all_types(schema.clone());
//!
//! let mut value = schema.new_instance("Level4")?;
//! value.set("arg1", "x");
//! let mut element = Marshaler::new(&schema).to_element(&value, QName::local("any"))?;
//! tag_concrete_type(&mut element, "Level4");
//!
//! let decoded = resolve_and_decode(&element, &registry)?;
//! assert_eq!(decoded, value);
//! # Ok::<(), xmlbind::Error>(())
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::config::BindOptions;
use crate::element::{XmlElement, xsi_type};
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::schema::{Schema, TypeId};
use crate::unmarshal::Unmarshaler;

/// Maps type names to descriptors of one schema.
///
/// Reads take a shared lock, registrations an exclusive one, so a registry
/// can be populated while decoders run on other threads.
#[derive(Debug)]
pub struct TypeRegistry {
    schema: Arc<Schema>,
    entries: RwLock<HashMap<String, TypeId>>,
    options: BindOptions,
}

impl TypeRegistry {
    /// An empty registry over `schema`.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::with_options(schema, BindOptions::default())
    }

    /// An empty registry with explicit options.
    pub fn with_options(schema: Arc<Schema>, options: BindOptions) -> Self {
        Self {
            schema,
            entries: RwLock::new(HashMap::new()),
            options,
        }
    }

    /// A registry holding every type of `schema` under its own name.
    pub fn with_all_types(schema: Arc<Schema>) -> Self {
        let registry = Self::new(schema);
        registry.register_all();
        registry
    }

    /// The schema every registered id belongs to.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Options handed to the unmarshaler on decode.
    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Registers `type_id` under `name`, returning the previous entry.
    ///
    /// Fails with [`Error::UnknownType`] when the id is not part of the schema.
    pub fn register(&self, name: impl Into<String>, type_id: TypeId) -> Result<Option<TypeId>> {
        let name = name.into();
        if self.schema.get(type_id).is_none() {
            return Err(Error::UnknownType { name });
        }
        debug!(type_name = %name, "registering type");
        Ok(self.entries.write().insert(name, type_id))
    }

    /// Registers a schema type under its own name.
    pub fn register_type(&self, type_name: &str) -> Result<TypeId> {
        let id = self.schema.require(type_name)?.id;
        self.entries.write().insert(type_name.to_string(), id);
        Ok(id)
    }

    /// Registers every schema type under its own name.
    pub fn register_all(&self) {
        let mut entries = self.entries.write();
        for descriptor in self.schema.types() {
            entries.insert(descriptor.name.clone(), descriptor.id);
        }
    }

    /// Looks a name up, failing with [`Error::UnknownType`].
    pub fn resolve(&self, name: &str) -> Result<TypeId> {
        self.entries
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownType {
                name: name.to_string(),
            })
    }

    /// True when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Decodes an element whose concrete type is named by its type attribute.
#[instrument(skip_all, fields(tag = %element.tag))]
pub fn resolve_and_decode(element: &XmlElement, registry: &TypeRegistry) -> Result<Instance> {
    let attribute = &registry.options().type_attribute;
    let raw = element
        .attribute(attribute)
        .ok_or_else(|| Error::MissingTypeAttribute {
            tag: element.tag.to_string(),
            attribute: attribute.to_string(),
        })?;
    let type_name = bare_type_name(raw);
    let type_id = registry.resolve(type_name)?;
    debug!(type_name, "resolved polymorphic payload");

    Unmarshaler::with_options(registry.schema(), registry.options().clone())
        .from_xml(type_id, element)
}

/// Tags `element` with its concrete type under the default `xsi:type` attribute.
pub fn tag_concrete_type(element: &mut XmlElement, type_name: &str) {
    element.set_attribute(xsi_type(), type_name);
}

/// Drops a `prefix:` from a type attribute value.
pub(crate) fn bare_type_name(raw: &str) -> &str {
    let raw = raw.trim();
    raw.rsplit_once(':').map_or(raw, |(_, local)| local)
}
