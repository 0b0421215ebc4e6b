//! Registry of validated schemas.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::error::{SchemaError, SchemaResult};
use crate::keymap::KeyMap;
use crate::schema::{Persistable, Schema};

/// The set of types a mapper recognises without static type information.
///
/// Registration validates the schema against the registry's [`KeyMap`], so a
/// misdeclared type is rejected before any data is written. The registry is
/// what answers "is this value persistable" for `&dyn Any` input and what
/// resolves a stored type marker back to a schema.
#[derive(Debug, Default)]
pub struct Registry {
    keys: KeyMap,
    by_type: HashMap<TypeId, &'static Schema>,
    by_name: HashMap<&'static str, &'static Schema>,
}

impl Registry {
    /// An empty registry using the legacy key map.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry using `keys`.
    pub fn with_key_map(keys: KeyMap) -> Self {
        Self {
            keys,
            ..Self::default()
        }
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.keys
    }

    /// Register `T`, validating its schema.
    ///
    /// Registering the same type twice is a no-op. Registering a different
    /// type under an already-used type name is an error.
    pub fn register<T: Persistable>(&mut self) -> SchemaResult<&mut Self> {
        self.register_schema(T::schema())?;
        Ok(self)
    }

    /// Register an already-built schema.
    pub fn register_schema(&mut self, schema: &'static Schema) -> SchemaResult<()> {
        schema.validate()?;
        schema.validate_keys(&self.keys)?;

        if let Some(existing) = self.by_name.get(schema.type_name()) {
            if Schema::type_id(existing) == schema.type_id() {
                return Ok(());
            }
            return Err(SchemaError::DuplicateType(schema.type_name().to_string()));
        }

        self.by_type.insert(schema.type_id(), schema);
        self.by_name.insert(schema.type_name(), schema);
        tracing::debug!(type_name = schema.type_name(), "registered persistable type");
        Ok(())
    }

    /// The schema of a registered type.
    pub fn get(&self, type_id: TypeId) -> Option<&'static Schema> {
        self.by_type.get(&type_id).copied()
    }

    /// The schema registered under a stored type name.
    pub fn by_name(&self, type_name: &str) -> Option<&'static Schema> {
        self.by_name.get(type_name).copied()
    }

    /// The schema of the value's concrete type, if registered.
    pub fn schema_of(&self, value: &dyn Any) -> Option<&'static Schema> {
        self.get(value.type_id())
    }

    /// Returns `true` if the value's concrete type is registered.
    pub fn is_persistable(&self, value: &dyn Any) -> bool {
        self.schema_of(value).is_some()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}
