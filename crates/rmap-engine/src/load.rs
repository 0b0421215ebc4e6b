//! Graph deserializer: rebuilds an instance from its record.

use std::any::Any;

use rmap_schema::{Field, FieldKind, FieldUpdate, KeyMap, Schema, SchemaError, CLASS_KEY};
use rmap_store::{HashStore, Record};
use rmap_types::{decode, encode, Scalar, ScalarKind};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::mapper::{type_mismatch, Mapper, Visited, LIST_DELIMITER};

impl<S: HashStore> Mapper<S> {
    /// Load the record for `id` into a fresh instance of `schema`'s type.
    ///
    /// Returns `Ok(None)` if the record does not exist, or if it is already
    /// being loaded further up this call (a reference cycle).
    pub(crate) fn load_record(
        &mut self,
        schema: &'static Schema,
        id: Scalar,
        visiting: &mut Visited,
    ) -> EngineResult<Option<Box<dyn Any>>> {
        self.check(schema)?;
        let identity = schema.identity()?;
        let key = encode(&id);
        if key.is_empty() {
            return Err(EngineError::NullIdentity {
                type_name: schema.type_name().to_string(),
                field: identity.name().to_string(),
            });
        }

        let marker = (schema.type_name(), key);
        if visiting.contains(&marker) {
            debug!(type_name = schema.type_name(), key = %marker.1, "reference cycle, not descending");
            return Ok(None);
        }

        let record = self.store.hgetall(&marker.1)?;
        if record.is_empty() {
            debug!(type_name = schema.type_name(), key = %marker.1, "record not found");
            return Ok(None);
        }
        if let Some(stored) = record.get(CLASS_KEY).filter(|t| t.as_str() != schema.type_name()) {
            debug!(key = %marker.1, stored = %stored, expected = schema.type_name(), "type marker differs");
        }

        visiting.insert(marker.clone());
        let loaded = self.populate(schema, &record, visiting);
        visiting.remove(&marker);
        let mut instance = loaded?;

        identity.write(instance.as_mut(), FieldUpdate::Scalar(id))?;
        debug!(key = %marker.1, type_name = schema.type_name(), "record loaded");
        Ok(Some(instance))
    }

    fn populate(
        &mut self,
        schema: &'static Schema,
        record: &Record,
        visiting: &mut Visited,
    ) -> EngineResult<Box<dyn Any>> {
        let keys = *self.registry.key_map();
        let mut instance = schema.instantiate();

        for field in schema.eager_fields().filter(|f| !f.is_identity()) {
            let text = lookup(&keys, field, record);
            let update = match field.kind() {
                FieldKind::Scalar(kind) => {
                    let Some(text) = text else { continue };
                    match decode(text, kind) {
                        Ok(Some(value)) => FieldUpdate::Scalar(value),
                        Ok(None) => continue,
                        Err(e) => {
                            warn!(type_name = schema.type_name(), field = field.name(), error = %e, "unreadable value, leaving field unset");
                            continue;
                        }
                    }
                }
                FieldKind::ScalarList(kind) => {
                    let mut items = Vec::new();
                    for token in tokens(text) {
                        match decode(token, kind) {
                            Ok(Some(value)) => items.push(value),
                            Ok(None) => {}
                            Err(e) => {
                                warn!(type_name = schema.type_name(), field = field.name(), error = %e, "skipping unreadable list item");
                            }
                        }
                    }
                    FieldUpdate::ScalarList(items)
                }
                FieldKind::Reference(target) => {
                    let Some(text) = text else { continue };
                    let target = target();
                    let Some(id) = reference_id(schema, field, target, text)? else {
                        continue;
                    };
                    match self.load_record(target, id, visiting)? {
                        Some(child) => FieldUpdate::Reference(child),
                        None => continue,
                    }
                }
                FieldKind::ReferenceList(target) => {
                    let target = target();
                    let mut children = Vec::new();
                    for token in tokens(text) {
                        let Some(id) = reference_id(schema, field, target, token)? else {
                            continue;
                        };
                        match self.load_record(target, id, visiting)? {
                            Some(child) => children.push(child),
                            None => debug!(field = field.name(), id = token, "skipping missing list element"),
                        }
                    }
                    FieldUpdate::ReferenceList(children)
                }
            };

            match field.write(instance.as_mut(), update) {
                Ok(()) => {}
                Err(SchemaError::Coercion { field, source }) => {
                    warn!(field = %field, error = %source, "value does not fit field, leaving it unset");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(instance)
    }
}

/// Find the stored text for `field`.
///
/// Tries the mapped key, then the raw field name, then declared aliases.
/// For fields with aliases, a last resort scans every key for a
/// case-insensitive or substring match on the field name or an alias.
fn lookup<'r>(keys: &KeyMap, field: &Field, record: &'r Record) -> Option<&'r str> {
    let present = |key: &str| record.get(key).map(String::as_str).filter(|v| !v.is_empty());

    let found = present(keys.to_store_key(field.name()))
        .or_else(|| present(field.name()))
        .or_else(|| field.aliases().iter().find_map(|alias| present(*alias)));
    if found.is_some() || field.aliases().is_empty() {
        return found;
    }

    let candidates: Vec<String> = std::iter::once(field.name())
        .chain(field.aliases().iter().copied())
        .map(str::to_ascii_lowercase)
        .collect();
    record
        .iter()
        .filter(|(key, value)| key.as_str() != CLASS_KEY && !value.is_empty())
        .find(|(key, _)| {
            let key = key.to_ascii_lowercase();
            candidates.iter().any(|c| key == *c || key.contains(c.as_str()))
        })
        .map(|(key, value)| {
            debug!(field = field.name(), key = %key, "matched by key scan");
            value.as_str()
        })
}

/// Non-empty items of a stored list.
fn tokens(text: Option<&str>) -> impl Iterator<Item = &str> {
    text.unwrap_or_default()
        .split(LIST_DELIMITER)
        .filter(|token| !token.is_empty())
}

/// Decode a stored reference as the target type's identity.
fn reference_id(
    owner: &Schema,
    field: &Field,
    target: &'static Schema,
    text: &str,
) -> EngineResult<Option<Scalar>> {
    let kind = identity_kind(target)?;
    match decode(text, kind) {
        Ok(id) => Ok(id),
        Err(e) => {
            warn!(type_name = owner.type_name(), field = field.name(), error = %e, "unreadable reference, skipping");
            Ok(None)
        }
    }
}

pub(crate) fn identity_kind(schema: &Schema) -> EngineResult<ScalarKind> {
    let identity = schema.identity()?;
    match identity.kind() {
        FieldKind::Scalar(kind) => Ok(kind),
        _ => Err(type_mismatch(schema, identity.name())),
    }
}
