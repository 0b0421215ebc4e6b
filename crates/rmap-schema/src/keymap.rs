//! Translation between programmatic field names and store keys.
//!
//! Records written by other tools, or by hand, do not always use the field
//! names of the object model. A [`KeyMap`] is a fixed table of overrides for
//! those keys. Fields without an override are stored under their own name.
//!
//! The table is static configuration: it is never derived from the data.

use crate::error::{SchemaError, SchemaResult};
use crate::CLASS_KEY;

/// One override: `field` is stored under `key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyOverride {
    pub field: &'static str,
    pub key: &'static str,
    /// Match `field` ignoring ASCII case.
    pub ignore_case: bool,
}

impl KeyOverride {
    pub const fn exact(field: &'static str, key: &'static str) -> Self {
        Self {
            field,
            key,
            ignore_case: false,
        }
    }

    pub const fn any_case(field: &'static str, key: &'static str) -> Self {
        Self {
            field,
            key,
            ignore_case: true,
        }
    }

    fn matches_field(&self, name: &str) -> bool {
        if self.ignore_case {
            self.field.eq_ignore_ascii_case(name)
        } else {
            self.field == name
        }
    }
}

const LEGACY: &[KeyOverride] = &[
    KeyOverride::exact("authorName", "Author Name"),
    KeyOverride::any_case("date", "Date"),
    KeyOverride::any_case("description", "Description"),
];

/// A static field-name to store-key table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyMap {
    overrides: &'static [KeyOverride],
}

impl KeyMap {
    /// Build a key map from a static table, checking it first.
    pub fn new(overrides: &'static [KeyOverride]) -> SchemaResult<Self> {
        let map = Self { overrides };
        map.validate()?;
        Ok(map)
    }

    /// Every field stored under its own name.
    pub const fn identity() -> Self {
        Self { overrides: &[] }
    }

    /// The overrides used by records written before key mapping was
    /// configurable: `authorName` is stored as `Author Name`, and `date` and
    /// `description` in any case are stored capitalised.
    pub const fn legacy() -> Self {
        Self { overrides: LEGACY }
    }

    pub fn overrides(&self) -> &'static [KeyOverride] {
        self.overrides
    }

    /// The store key for `field`.
    pub fn to_store_key<'a>(&self, field: &'a str) -> &'a str {
        self.overrides
            .iter()
            .find(|o| o.matches_field(field))
            .map_or(field, |o| o.key)
    }

    /// The field name for a store key, the inverse of [`to_store_key`](Self::to_store_key).
    pub fn to_field_name<'a>(&self, key: &'a str) -> &'a str {
        self.overrides
            .iter()
            .find(|o| o.key == key)
            .map_or(key, |o| o.field)
    }

    /// Check that no override targets the reserved marker and that the
    /// table is one-to-one.
    pub fn validate(&self) -> SchemaResult<()> {
        for (idx, entry) in self.overrides.iter().enumerate() {
            if entry.key == CLASS_KEY {
                return Err(SchemaError::ReservedKey {
                    owner: format!("key map entry for {}", entry.field),
                    name: entry.key.to_string(),
                    reserved: CLASS_KEY,
                });
            }
            for other in &self.overrides[idx + 1..] {
                if other.key == entry.key {
                    return Err(SchemaError::AmbiguousKeyMap(format!(
                        "{} and {} both map to {:?}",
                        entry.field, other.field, entry.key
                    )));
                }
                if entry.matches_field(other.field) || other.matches_field(entry.field) {
                    return Err(SchemaError::AmbiguousKeyMap(format!(
                        "field {} has more than one override",
                        entry.field
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::legacy()
    }
}
