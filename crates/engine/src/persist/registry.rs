use std::any::Any;
use std::collections::HashMap;

use super::{LoadContext, Persist};

type Factory = Box<dyn Fn(&LoadContext) -> Box<dyn Any> + Send + Sync>;

/// Named prototypes per node kind. A document element carrying
/// `"subclass": "<name>"` is instantiated from the matching factory instead of
/// the declared type's default, and its fields are then loaded over it.
#[derive(Default)]
pub struct SubtypeRegistry {
    factories: HashMap<(&'static str, String), Factory>,
}

impl SubtypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for `T` under `name`, replacing any earlier entry.
    pub fn register<T, F>(&mut self, name: impl Into<String>, factory: F)
    where
        T: Persist + 'static,
        F: Fn(&LoadContext) -> T + Send + Sync + 'static,
    {
        let erased = move |ctx: &LoadContext| -> Box<dyn Any> { Box::new(factory(ctx)) };
        self.factories.insert((T::KIND, name.into()), Box::new(erased));
    }

    pub fn contains<T: Persist>(&self, name: &str) -> bool {
        self.factories.contains_key(&(T::KIND, name.to_string()))
    }

    /// Builds the prototype registered for `T` under `name` and tags it with
    /// that name so it is written back on save.
    pub fn construct<T: Persist + 'static>(&self, name: &str, ctx: &LoadContext) -> Option<T> {
        let factory = self.factories.get(&(T::KIND, name.to_string()))?;
        let mut node = *factory(ctx).downcast::<T>().ok()?;
        node.set_subtype(name.to_string());
        Some(node)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for SubtypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self
            .factories
            .keys()
            .map(|(kind, name)| format!("{kind}:{name}"))
            .collect::<Vec<_>>();
        names.sort();
        f.debug_struct("SubtypeRegistry")
            .field("subtypes", &names)
            .finish()
    }
}
