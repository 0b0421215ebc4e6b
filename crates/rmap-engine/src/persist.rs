//! Graph serializer: writes an instance and everything it references.

use std::any::Any;

use rmap_schema::{Field, FieldValue, Schema, CLASS_KEY};
use rmap_store::HashStore;
use rmap_types::encode;
use tracing::{debug, warn};

use crate::error::EngineResult;
use crate::mapper::{identity_of, type_mismatch, Mapper, Visited, LIST_DELIMITER};

impl<S: HashStore> Mapper<S> {
    /// Write `owner` as one record and return its key.
    ///
    /// Referenced instances are written first, each as its own record. An
    /// identity already in `visited` is not written again; only its key is
    /// returned, which is what the referring field stores.
    pub(crate) fn persist_record(
        &mut self,
        schema: &'static Schema,
        owner: &dyn Any,
        visited: &mut Visited,
    ) -> EngineResult<String> {
        self.check(schema)?;
        let (_, key) = identity_of(schema, owner)?;
        if !visited.insert((schema.type_name(), key.clone())) {
            debug!(type_name = schema.type_name(), key = %key, "already written in this call");
            return Ok(key);
        }

        let keys = *self.registry.key_map();
        let mut entries = Vec::with_capacity(schema.fields().len() + 1);
        for field in schema.fields() {
            let value = self.stored_value(schema, field, owner, visited)?;
            entries.push((keys.to_store_key(field.name()).to_string(), value));
        }
        entries.push((CLASS_KEY.to_string(), schema.type_name().to_string()));

        self.store.hset_multiple(&key, &entries)?;
        debug!(key = %key, type_name = schema.type_name(), fields = entries.len(), "record written");
        Ok(key)
    }

    /// The text stored for one field. Absent values store as `""`.
    fn stored_value(
        &mut self,
        schema: &'static Schema,
        field: &Field,
        owner: &dyn Any,
        visited: &mut Visited,
    ) -> EngineResult<String> {
        let value = match field.read(owner)? {
            FieldValue::Scalar(value) => value.map(|v| encode(&v)).unwrap_or_default(),
            FieldValue::ScalarList(items) => {
                let items: Vec<String> = items.iter().map(encode).collect();
                if items.iter().any(|item| item.contains(LIST_DELIMITER)) {
                    warn!(
                        type_name = schema.type_name(),
                        field = field.name(),
                        "list item contains the delimiter and will not round-trip"
                    );
                }
                items.join(LIST_DELIMITER)
            }
            FieldValue::Reference(None) => String::new(),
            FieldValue::Reference(Some(child)) => {
                let target = field
                    .kind()
                    .target()
                    .ok_or_else(|| type_mismatch(schema, field.name()))?;
                self.persist_record(target, child, visited)?
            }
            FieldValue::ReferenceList(children) => {
                let target = field
                    .kind()
                    .target()
                    .ok_or_else(|| type_mismatch(schema, field.name()))?;
                let mut ids = Vec::with_capacity(children.len());
                for child in children {
                    ids.push(self.persist_record(target, child, visited)?);
                }
                ids.join(LIST_DELIMITER)
            }
        };
        Ok(value)
    }
}
