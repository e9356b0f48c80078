//! Footprint-driven persistence.
//!
//! Every persistable node type declares a [`Footprint`]: an ordered list of
//! document keys, each either a scalar copied verbatim or a collection of
//! owned children walked recursively. One generic walker drives both save and
//! load for every node type.
//!
//! Loading is strict about structure and lenient about values: a missing
//! child collection aborts the load, while a missing scalar leaves the node's
//! default in place. Any element of a child collection may name a registered
//! subtype under [`SUBTYPE_KEY`] to be built from that prototype instead of
//! the declared type.

mod error;
mod file;
mod footprint;
mod registry;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::content::TileCatalog;

pub use error::PersistError;
pub use file::{read_document, write_document_atomic, DocumentFileError};
pub use footprint::{Field, Footprint};
pub use registry::SubtypeRegistry;

use footprint::FieldKind;

/// Document key carrying a per-element subtype override.
pub const SUBTYPE_KEY: &str = "subclass";

pub trait Persist: Sized + 'static {
    /// Node kind name; also the root segment of error paths.
    const KIND: &'static str;

    fn footprint() -> Footprint<Self>;

    /// Fresh node of the declared type, before any document fields apply.
    fn instantiate(ctx: &LoadContext) -> Self;

    /// Runs after every footprint field has been applied.
    fn after_load(&mut self, _path: &str) -> Result<(), PersistError> {
        Ok(())
    }

    /// Name this node was built under from the [`SubtypeRegistry`], if any.
    /// Written back under [`SUBTYPE_KEY`] on save.
    fn subtype(&self) -> Option<&str>;

    fn set_subtype(&mut self, name: String);
}

/// Shared inputs every node may need while being rebuilt from a document.
#[derive(Debug, Clone)]
pub struct LoadContext {
    catalog: Arc<TileCatalog>,
    registry: Arc<SubtypeRegistry>,
}

impl LoadContext {
    pub fn new(catalog: Arc<TileCatalog>, registry: SubtypeRegistry) -> Self {
        Self {
            catalog,
            registry: Arc::new(registry),
        }
    }

    pub fn catalog(&self) -> &Arc<TileCatalog> {
        &self.catalog
    }

    pub fn registry(&self) -> &SubtypeRegistry {
        &self.registry
    }
}

pub fn serialize<T: Persist>(node: &T) -> Result<Value, PersistError> {
    serialize_at(node, T::KIND)
}

/// Builds a new `T` from `doc`, honoring a root-level subtype override.
pub fn load_node<T: Persist>(doc: &Value, ctx: &LoadContext) -> Result<T, PersistError> {
    load_element(doc, ctx, T::KIND)
}

/// Loads `doc` over an existing node. The node is left untouched when the
/// load fails. A root-level subtype override is ignored.
pub fn load_into<T: Persist + Clone>(
    node: &mut T,
    doc: &Value,
    ctx: &LoadContext,
) -> Result<(), PersistError> {
    let mut staged = node.clone();
    apply_document(&mut staged, doc, ctx, T::KIND)?;
    *node = staged;
    Ok(())
}

pub(crate) fn serialize_at<T: Persist>(node: &T, path: &str) -> Result<Value, PersistError> {
    let mut object = Map::new();
    if let Some(name) = node.subtype() {
        object.insert(SUBTYPE_KEY.to_string(), Value::String(name.to_string()));
    }
    for field in T::footprint().fields() {
        let value = match &field.kind {
            FieldKind::Scalar { save, .. } => {
                save(node).map_err(|source| PersistError::Encode {
                    path: path.to_string(),
                    field: field.name,
                    source,
                })?
            }
            FieldKind::Children { save, .. } => Value::Array(save(node, path)?),
        };
        object.insert(field.name.to_string(), value);
    }
    Ok(Value::Object(object))
}

pub(crate) fn load_element<T: Persist>(
    element: &Value,
    ctx: &LoadContext,
    path: &str,
) -> Result<T, PersistError> {
    let mut node = match element.get(SUBTYPE_KEY) {
        None => T::instantiate(ctx),
        Some(Value::String(name)) => ctx.registry().construct::<T>(name, ctx).ok_or_else(|| {
            PersistError::UnknownSubtype {
                path: path.to_string(),
                kind: T::KIND,
                subtype: name.clone(),
            }
        })?,
        Some(other) => {
            return Err(PersistError::invalid(
                path,
                format!("`{SUBTYPE_KEY}` must be a string, got {other}"),
            ))
        }
    };
    apply_document(&mut node, element, ctx, path)?;
    Ok(node)
}

fn apply_document<T: Persist>(
    node: &mut T,
    doc: &Value,
    ctx: &LoadContext,
    path: &str,
) -> Result<(), PersistError> {
    let object = doc.as_object().ok_or_else(|| PersistError::NotAnObject {
        path: path.to_string(),
    })?;

    for field in T::footprint().fields() {
        match &field.kind {
            FieldKind::Scalar { load, .. } => {
                let Some(value) = object.get(field.name) else {
                    continue;
                };
                load(node, value.clone()).map_err(|source| PersistError::Scalar {
                    path: path.to_string(),
                    field: field.name,
                    source,
                })?;
            }
            FieldKind::Children { load, .. } => {
                let value = object
                    .get(field.name)
                    .ok_or_else(|| PersistError::MissingCollection {
                        path: path.to_string(),
                        field: field.name,
                    })?;
                let elements = value.as_array().ok_or_else(|| PersistError::NotASequence {
                    path: path.to_string(),
                    field: field.name,
                })?;
                load(node, elements, ctx, path)?;
            }
        }
    }

    node.after_load(path)
}
