use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{load_element, serialize_at, LoadContext, Persist, PersistError};

type ScalarSave<T> = Box<dyn Fn(&T) -> Result<Value, serde_json::Error>>;
type ScalarLoad<T> = Box<dyn Fn(&mut T, Value) -> Result<(), serde_json::Error>>;
type ChildrenSave<T> = Box<dyn Fn(&T, &str) -> Result<Vec<Value>, PersistError>>;
type ChildrenLoad<T> =
    Box<dyn Fn(&mut T, &[Value], &LoadContext, &str) -> Result<(), PersistError>>;

pub(crate) enum FieldKind<T> {
    Scalar {
        save: ScalarSave<T>,
        load: ScalarLoad<T>,
    },
    Children {
        save: ChildrenSave<T>,
        load: ChildrenLoad<T>,
    },
}

/// One entry of a footprint: a document key bound to either a scalar value
/// (copied verbatim) or an owned child collection (walked recursively).
pub struct Field<T> {
    pub(crate) name: &'static str,
    pub(crate) kind: FieldKind<T>,
}

impl<T: 'static> Field<T> {
    pub fn scalar<V>(name: &'static str, get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        Self {
            name,
            kind: FieldKind::Scalar {
                save: Box::new(move |node: &T| -> Result<Value, serde_json::Error> {
                    serde_json::to_value(get(node))
                }),
                load: Box::new(move |node: &mut T, value: Value| -> Result<(), serde_json::Error> {
                    *get_mut(node) = serde_json::from_value(value)?;
                    Ok(())
                }),
            },
        }
    }

    pub fn children<C>(
        name: &'static str,
        get: fn(&T) -> &Vec<C>,
        get_mut: fn(&mut T) -> &mut Vec<C>,
    ) -> Self
    where
        C: Persist + 'static,
    {
        let save = move |node: &T, path: &str| -> Result<Vec<Value>, PersistError> {
            get(node)
                .iter()
                .enumerate()
                .map(|(index, child)| serialize_at(child, &format!("{path}.{name}[{index}]")))
                .collect()
        };
        let load = move |node: &mut T,
                         elements: &[Value],
                         ctx: &LoadContext,
                         path: &str|
              -> Result<(), PersistError> {
            let built = elements
                .iter()
                .enumerate()
                .map(|(index, element)| {
                    load_element::<C>(element, ctx, &format!("{path}.{name}[{index}]"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            *get_mut(node) = built;
            Ok(())
        };
        Self {
            name,
            kind: FieldKind::Children {
                save: Box::new(save),
                load: Box::new(load),
            },
        }
    }

    /// A single owned child stored as a one-element collection.
    pub fn single<C>(name: &'static str, get: fn(&T) -> &C, get_mut: fn(&mut T) -> &mut C) -> Self
    where
        C: Persist + 'static,
    {
        let save = move |node: &T, path: &str| -> Result<Vec<Value>, PersistError> {
            Ok(vec![serialize_at(get(node), &format!("{path}.{name}[0]"))?])
        };
        let load = move |node: &mut T,
                         elements: &[Value],
                         ctx: &LoadContext,
                         path: &str|
              -> Result<(), PersistError> {
            let [element] = elements else {
                return Err(PersistError::ChildCount {
                    path: path.to_string(),
                    field: name,
                    expected: 1,
                    actual: elements.len(),
                });
            };
            *get_mut(node) = load_element::<C>(element, ctx, &format!("{path}.{name}[0]"))?;
            Ok(())
        };
        Self {
            name,
            kind: FieldKind::Children {
                save: Box::new(save),
                load: Box::new(load),
            },
        }
    }
}

/// Ordered serialization schema of a node type.
pub struct Footprint<T> {
    fields: Vec<Field<T>>,
}

impl<T: 'static> Footprint<T> {
    pub fn new(fields: Vec<Field<T>>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }
}
