use std::any::Any;
use std::collections::{BTreeSet, HashSet};

use rmap_schema::{
    FieldUpdate, FieldValue, KeyMap, Persistable, Registry, Schema, SchemaError, CLASS_KEY,
};
use rmap_store::{HashStore, RedisHashStore, StoreConfig};
use rmap_types::{decode, encode, Scalar};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::load::identity_kind;

/// Separator between items of a stored list.
pub const LIST_DELIMITER: &str = ",";

/// Records touched during one top-level call, by type name and key.
pub(crate) type Visited = HashSet<(&'static str, String)>;

/// Persists and loads object graphs in a [`HashStore`].
///
/// A mapper owns its store. Calls are synchronous and run to completion; the
/// mapper does no locking, so concurrent writers to the same identity are
/// not coordinated. The store is closed by [`close`](Self::close) or when the
/// mapper is dropped.
pub struct Mapper<S: HashStore> {
    pub(crate) store: S,
    pub(crate) registry: Registry,
}

impl Mapper<RedisHashStore> {
    /// Connect to Redis as described by `config`.
    pub fn open(config: &StoreConfig) -> EngineResult<Self> {
        Ok(Self::new(RedisHashStore::open(config)?))
    }

    /// Connect to Redis at `host:port` and select `database`.
    pub fn connect(host: &str, port: u16, database: i64) -> EngineResult<Self> {
        Self::open(&StoreConfig::new(host, port, database))
    }
}

impl<S: HashStore> Mapper<S> {
    /// Wrap a store, using an empty registry with the legacy key map.
    pub fn new(store: S) -> Self {
        Self::with_registry(store, Registry::new())
    }

    /// Wrap a store, using an empty registry with the given key map.
    pub fn with_key_map(store: S, keys: KeyMap) -> Self {
        Self::with_registry(store, Registry::with_key_map(keys))
    }

    /// Wrap a store with a populated registry. The registry's key map is the
    /// one applied to every field read and write.
    pub fn with_registry(store: S, registry: Registry) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn key_map(&self) -> &KeyMap {
        self.registry.key_map()
    }

    // ---- Persist ----

    /// Persist `object` and everything it references.
    ///
    /// Returns `Ok(true)` once every record is written. Fails if the type is
    /// misdeclared, if any identity in the graph is null, or if the store
    /// fails.
    pub fn persist<T: Persistable>(&mut self, object: &T) -> EngineResult<bool> {
        let mut visited = Visited::new();
        self.persist_record(T::schema(), object, &mut visited)?;
        Ok(true)
    }

    /// Persist a type-erased value.
    ///
    /// Returns `Ok(false)` when `object` is `None` or its type is not in the
    /// registry; otherwise behaves like [`persist`](Self::persist).
    pub fn persist_any(&mut self, object: Option<&dyn Any>) -> EngineResult<bool> {
        let Some(object) = object else {
            return Ok(false);
        };
        let Some(schema) = self.registry.schema_of(object) else {
            debug!("refusing to persist a value of an unregistered type");
            return Ok(false);
        };
        let mut visited = Visited::new();
        self.persist_record(schema, object, &mut visited)?;
        Ok(true)
    }

    // ---- Load ----

    /// Load the record identified by `seed`'s identity into a fresh instance.
    ///
    /// Only the identity of `seed` is read. Returns `Ok(None)` if no record
    /// exists. Lazy fields are left at their default.
    pub fn load<T: Persistable>(&mut self, seed: &T) -> EngineResult<Option<T>> {
        let schema = T::schema();
        self.check(schema)?;
        let (id, _) = identity_of(schema, seed)?;
        self.load_typed(schema, id)
    }

    /// Load a `T` by identity value.
    pub fn load_by_id<T: Persistable>(&mut self, id: impl Into<Scalar>) -> EngineResult<Option<T>> {
        let schema = T::schema();
        let mut seed = T::default();
        schema
            .identity()?
            .write(&mut seed, FieldUpdate::Scalar(id.into()))?;
        self.load(&seed)
    }

    /// Load whatever record lives at `key`, using its stored type marker to
    /// pick a registered schema.
    pub fn load_any(&mut self, key: &str) -> EngineResult<Option<Box<dyn Any>>> {
        let Some(type_name) = self.store.hget(key, CLASS_KEY)?.filter(|t| !t.is_empty()) else {
            if self.store.exists(key)? {
                return Err(EngineError::MissingTypeMarker {
                    key: key.to_string(),
                });
            }
            return Ok(None);
        };
        let schema = self
            .registry
            .by_name(&type_name)
            .ok_or_else(|| EngineError::UnknownType {
                key: key.to_string(),
                type_name: type_name.clone(),
            })?;
        self.check(schema)?;

        let id = match decode(key, identity_kind(schema)?) {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(None),
            Err(source) => {
                return Err(SchemaError::Coercion {
                    field: format!("{}.{}", schema.type_name(), schema.identity()?.name()),
                    source,
                }
                .into())
            }
        };

        let mut visiting = Visited::new();
        self.load_record(schema, id, &mut visiting)
    }

    fn load_typed<T: Persistable>(
        &mut self,
        schema: &'static Schema,
        id: Scalar,
    ) -> EngineResult<Option<T>> {
        let mut visiting = Visited::new();
        let Some(instance) = self.load_record(schema, id, &mut visiting)? else {
            return Ok(None);
        };
        instance
            .downcast::<T>()
            .map(|instance| Some(*instance))
            .map_err(|_| type_mismatch(schema, schema.type_name()))
    }

    // ---- Keys ----

    /// Every record key matching a Redis-style glob.
    pub fn list_keys(&mut self, pattern: &str) -> EngineResult<BTreeSet<String>> {
        Ok(self.store.keys(pattern)?)
    }

    /// Delete one record. Returns `true` if it existed.
    pub fn delete_key(&mut self, key: &str) -> EngineResult<bool> {
        let removed = self.store.delete(key)?;
        debug!(key, removed, "delete record");
        Ok(removed)
    }

    // ---- Lifecycle ----

    /// Release the store's connection. Later calls fail with a store error.
    pub fn close(&mut self) -> EngineResult<()> {
        Ok(self.store.close()?)
    }

    /// Validate a schema against this mapper's key map.
    pub(crate) fn check(&self, schema: &Schema) -> EngineResult<()> {
        schema.validate()?;
        schema.validate_keys(self.registry.key_map())?;
        Ok(())
    }
}

impl<S: HashStore> Drop for Mapper<S> {
    fn drop(&mut self) {
        if let Err(e) = self.store.close() {
            warn!(error = %e, "failed to close store");
        }
    }
}

impl<S: HashStore + std::fmt::Debug> std::fmt::Debug for Mapper<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("store", &self.store)
            .field("types", &self.registry.type_names())
            .finish()
    }
}

/// The identity of `owner` as a scalar and as its store key.
pub(crate) fn identity_of(schema: &Schema, owner: &dyn Any) -> EngineResult<(Scalar, String)> {
    let field = schema.identity()?;
    let null = || EngineError::NullIdentity {
        type_name: schema.type_name().to_string(),
        field: field.name().to_string(),
    };
    match field.read(owner)? {
        FieldValue::Scalar(Some(id)) => {
            let key = encode(&id);
            if key.is_empty() {
                Err(null())
            } else {
                Ok((id, key))
            }
        }
        FieldValue::Scalar(None) => Err(null()),
        _ => Err(type_mismatch(schema, field.name())),
    }
}

pub(crate) fn type_mismatch(schema: &Schema, field: &str) -> EngineError {
    SchemaError::TypeMismatch {
        type_name: schema.type_name().to_string(),
        field: field.to_string(),
    }
    .into()
}
