//! Persistable types and their schemas.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;

use rmap_types::ScalarValue;

use crate::error::{SchemaError, SchemaResult};
use crate::field::{
    Field, FieldRole, ReferenceListSlot, ReferenceSlot, ScalarListSlot, ScalarSlot, Slot,
};
use crate::keymap::KeyMap;
use crate::CLASS_KEY;

/// A type whose instances the mapper can persist and load.
///
/// Implementations build their schema once and hand out the cached copy:
///
/// ```
/// use std::sync::OnceLock;
/// use rmap_schema::{Persistable, Schema};
///
/// #[derive(Default)]
/// struct Thing {
///     id: String,
///     name: String,
///     count: i32,
/// }
///
/// impl Persistable for Thing {
///     fn schema() -> &'static Schema {
///         static SCHEMA: OnceLock<Schema> = OnceLock::new();
///         SCHEMA.get_or_init(|| {
///             Schema::builder::<Self>("Thing")
///                 .identity("id", |t| &t.id, |t, v| t.id = v)
///                 .field("name", |t| &t.name, |t, v| t.name = v)
///                 .field("count", |t| &t.count, |t, v| t.count = v)
///                 .build()
///         })
///     }
/// }
///
/// assert!(Thing::schema().validate().is_ok());
/// ```
pub trait Persistable: Any + Default + Send + Sync {
    fn schema() -> &'static Schema;
}

/// The field layout of one persistable type.
///
/// A schema is built once and never mutated. Declaration errors found while
/// building are kept and reported by [`Schema::validate`], so that a broken
/// type fails the operation that uses it rather than the process that
/// declares it.
pub struct Schema {
    type_name: &'static str,
    type_id: TypeId,
    fields: Vec<Field>,
    identity: Option<usize>,
    instantiate: fn() -> Box<dyn Any>,
    validation: SchemaResult<()>,
}

impl Schema {
    /// Start describing the type `T`, recorded in the store as `type_name`.
    pub fn builder<T: Any + Default>(type_name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            type_name,
            fields: Vec::new(),
            errors: Vec::new(),
            _owner: std::marker::PhantomData,
        }
    }

    /// The type name written to the reserved marker key.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Every declared field, in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Fields read by an eager load: everything except lazy fields.
    pub fn eager_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_lazy())
    }

    /// The identity field.
    pub fn identity(&self) -> SchemaResult<&Field> {
        self.validate()?;
        self.identity
            .map(|idx| &self.fields[idx])
            .ok_or_else(|| SchemaError::MissingIdentity {
                type_name: self.type_name.to_string(),
            })
    }

    /// The outcome of the checks run when the schema was built.
    pub fn validate(&self) -> SchemaResult<()> {
        self.validation.clone()
    }

    /// Check that no two fields share a store key under `keys`, and that no
    /// field maps onto the reserved type marker.
    pub fn validate_keys(&self, keys: &KeyMap) -> SchemaResult<()> {
        let mut seen: Vec<(&str, &str)> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let key = keys.to_store_key(field.name());
            if key == CLASS_KEY {
                return Err(SchemaError::ReservedKey {
                    owner: format!("{}.{}", self.type_name, field.name()),
                    name: key.to_string(),
                    reserved: CLASS_KEY,
                });
            }
            if let Some((other, _)) = seen.iter().find(|(_, k)| *k == key) {
                return Err(SchemaError::DuplicateKey {
                    type_name: self.type_name.to_string(),
                    first: (*other).to_string(),
                    second: field.name().to_string(),
                    key: key.to_string(),
                });
            }
            seen.push((field.name(), key));
        }
        Ok(())
    }

    /// A fresh default instance of the described type.
    pub fn instantiate(&self) -> Box<dyn Any> {
        (self.instantiate)()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("validation", &self.validation)
            .finish()
    }
}

fn instantiate<T: Any + Default>() -> Box<dyn Any> {
    Box::new(T::default())
}

/// Typed builder for a [`Schema`].
///
/// Accessors are plain function pointers, so closures passed here must not
/// capture anything.
pub struct SchemaBuilder<T> {
    type_name: &'static str,
    fields: Vec<Field>,
    errors: Vec<SchemaError>,
    _owner: std::marker::PhantomData<fn() -> T>,
}

impl<T: Any + Default> SchemaBuilder<T> {
    /// Declare the identity field.
    pub fn identity<V: ScalarValue>(
        self,
        name: &'static str,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> Self {
        self.push(name, FieldRole::Identity, Box::new(ScalarSlot { get, set }))
    }

    /// Declare a scalar field.
    pub fn field<V: ScalarValue>(
        self,
        name: &'static str,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> Self {
        self.push(name, FieldRole::Stored, Box::new(ScalarSlot { get, set }))
    }

    /// Declare an ordered list of scalars.
    pub fn list<V: ScalarValue>(
        self,
        name: &'static str,
        get: fn(&T) -> &Vec<V>,
        set: fn(&mut T, Vec<V>),
    ) -> Self {
        self.push(
            name,
            FieldRole::Stored,
            Box::new(ScalarListSlot { get, set }),
        )
    }

    /// Declare a reference to another persistable instance.
    pub fn reference<C: Persistable>(
        self,
        name: &'static str,
        get: fn(&T) -> Option<&C>,
        set: fn(&mut T, C),
    ) -> Self {
        self.push(name, FieldRole::Stored, Box::new(ReferenceSlot { get, set }))
    }

    /// Declare an ordered list of references.
    pub fn references<C: Persistable>(
        self,
        name: &'static str,
        get: fn(&T) -> &Vec<C>,
        set: fn(&mut T, Vec<C>),
    ) -> Self {
        self.push(
            name,
            FieldRole::Stored,
            Box::new(ReferenceListSlot { get, set }),
        )
    }

    /// Exclude an already-declared field from eager loading.
    pub fn lazy(mut self, name: &'static str) -> Self {
        let type_name = self.type_name;
        match self.fields.iter_mut().find(|f| f.name() == name) {
            Some(field) if field.is_identity() => self.errors.push(SchemaError::LazyIdentity {
                type_name: type_name.to_string(),
                field: name.to_string(),
            }),
            Some(field) => field.set_role(FieldRole::Lazy),
            None => self.errors.push(SchemaError::UnknownField {
                type_name: type_name.to_string(),
                field: name.to_string(),
            }),
        }
        self
    }

    /// Register legacy store keys for an already-declared field.
    pub fn aliases(mut self, name: &'static str, aliases: &[&'static str]) -> Self {
        let type_name = self.type_name;
        match self.fields.iter_mut().find(|f| f.name() == name) {
            Some(field) => {
                for alias in aliases {
                    field.push_alias(alias);
                }
            }
            None => self.errors.push(SchemaError::UnknownField {
                type_name: type_name.to_string(),
                field: name.to_string(),
            }),
        }
        self
    }

    /// Finish the schema, recording the first declaration error if any.
    pub fn build(self) -> Schema {
        let identities: Vec<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_identity())
            .map(|(idx, _)| idx)
            .collect();

        let validation = match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => check_fields(self.type_name, &self.fields, &identities),
        };

        if let Err(err) = &validation {
            tracing::debug!(type_name = self.type_name, error = %err, "schema declared with errors");
        }

        Schema {
            type_name: self.type_name,
            type_id: TypeId::of::<T>(),
            identity: identities.first().copied(),
            fields: self.fields,
            instantiate: instantiate::<T>,
            validation,
        }
    }

    fn push(mut self, name: &'static str, role: FieldRole, slot: Box<dyn Slot>) -> Self {
        self.fields
            .push(Field::new(self.type_name, name, role, slot));
        self
    }
}

fn check_fields(type_name: &str, fields: &[Field], identities: &[usize]) -> SchemaResult<()> {
    let mut names = HashSet::new();
    for field in fields {
        if field.name() == CLASS_KEY {
            return Err(SchemaError::ReservedKey {
                owner: type_name.to_string(),
                name: field.name().to_string(),
                reserved: CLASS_KEY,
            });
        }
        if !names.insert(field.name()) {
            return Err(SchemaError::DuplicateField {
                type_name: type_name.to_string(),
                field: field.name().to_string(),
            });
        }
    }

    match identities {
        [] => Err(SchemaError::MissingIdentity {
            type_name: type_name.to_string(),
        }),
        [_] => Ok(()),
        [first, second, ..] => Err(SchemaError::DuplicateIdentity {
            type_name: type_name.to_string(),
            first: fields[*first].name().to_string(),
            second: fields[*second].name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use chrono::NaiveDate;
    use rmap_types::{Scalar, ScalarKind};

    use super::*;
    use crate::field::{FieldKind, FieldUpdate, FieldValue};

    #[derive(Default, Debug, PartialEq)]
    struct Author {
        handle: String,
        joined: Option<NaiveDate>,
    }

    impl Persistable for Author {
        fn schema() -> &'static Schema {
            static SCHEMA: OnceLock<Schema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::builder::<Self>("Author")
                    .identity("handle", |a| &a.handle, |a, v| a.handle = v)
                    .field("joined", |a| &a.joined, |a, v| a.joined = v)
                    .build()
            })
        }
    }

    #[derive(Default, Debug)]
    struct Post {
        id: i64,
        tags: Vec<String>,
        author: Option<Author>,
        reviewers: Vec<Author>,
        body: Option<String>,
    }

    impl Persistable for Post {
        fn schema() -> &'static Schema {
            static SCHEMA: OnceLock<Schema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::builder::<Self>("Post")
                    .identity("id", |p| &p.id, |p, v| p.id = v)
                    .list("tags", |p| &p.tags, |p, v| p.tags = v)
                    .reference("author", |p| p.author.as_ref(), |p, v| p.author = Some(v))
                    .references("reviewers", |p| &p.reviewers, |p, v| p.reviewers = v)
                    .field("body", |p| &p.body, |p, v| p.body = v)
                    .lazy("body")
                    .build()
            })
        }
    }

    #[derive(Default)]
    struct Anonymous {
        name: String,
    }

    fn anonymous_schema() -> Schema {
        Schema::builder::<Anonymous>("Anonymous")
            .field("name", |a| &a.name, |a, v| a.name = v)
            .build()
    }

    // -----------------------------------------------------------------------
    // Declaration
    // -----------------------------------------------------------------------

    #[test]
    fn declared_fields_keep_order_and_kind() {
        let schema = Post::schema();
        assert!(schema.validate().is_ok());
        let names: Vec<_> = schema.fields().iter().map(Field::name).collect();
        assert_eq!(names, ["id", "tags", "author", "reviewers", "body"]);

        assert!(matches!(
            schema.field("tags").unwrap().kind(),
            FieldKind::ScalarList(ScalarKind::String)
        ));
        let author = schema.field("author").unwrap().kind();
        assert!(author.is_reference());
        assert_eq!(author.target().unwrap().type_name(), "Author");
        assert!(schema.field("reviewers").unwrap().kind().is_collection());
    }

    #[test]
    fn identity_is_found() {
        let id = Post::schema().identity().unwrap();
        assert_eq!(id.name(), "id");
        assert!(matches!(id.kind(), FieldKind::Scalar(ScalarKind::Long)));
    }

    #[test]
    fn lazy_fields_are_excluded_from_eager_set() {
        let schema = Post::schema();
        assert!(schema.field("body").unwrap().is_lazy());
        assert!(schema.eager_fields().all(|f| f.name() != "body"));
    }

    #[test]
    fn schema_is_cached() {
        assert!(std::ptr::eq(Post::schema(), Post::schema()));
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn missing_identity_is_reported() {
        let schema = anonymous_schema();
        let err = schema.identity().unwrap_err();
        assert!(matches!(err, SchemaError::MissingIdentity { .. }));
        assert!(err.to_string().contains("identity"));
        assert!(err.to_string().contains("@Id"));
    }

    #[test]
    fn two_identities_are_rejected() {
        let schema = Schema::builder::<Anonymous>("Twice")
            .identity("a", |a| &a.name, |a, v| a.name = v)
            .identity("b", |a| &a.name, |a, v| a.name = v)
            .build();
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::DuplicateIdentity { .. })
        ));
    }

    #[test]
    fn reserved_field_name_is_rejected() {
        let schema = Schema::builder::<Anonymous>("Clash")
            .identity("id", |a| &a.name, |a, v| a.name = v)
            .field("_class", |a| &a.name, |a, v| a.name = v)
            .build();
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::ReservedKey { .. })
        ));
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let schema = Schema::builder::<Anonymous>("Dup")
            .identity("id", |a| &a.name, |a, v| a.name = v)
            .field("id", |a| &a.name, |a, v| a.name = v)
            .build();
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn unknown_lazy_field_is_rejected() {
        let schema = Schema::builder::<Anonymous>("Typo")
            .identity("id", |a| &a.name, |a, v| a.name = v)
            .lazy("nmae")
            .build();
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::UnknownField { .. })
        ));
    }

    #[test]
    fn lazy_identity_is_rejected() {
        let schema = Schema::builder::<Anonymous>("LazyId")
            .identity("id", |a| &a.name, |a, v| a.name = v)
            .lazy("id")
            .build();
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::LazyIdentity { .. })
        ));
    }

    #[test]
    fn mapped_keys_must_not_collide() {
        #[derive(Default)]
        struct Entry {
            date: String,
            upper: String,
        }
        let schema = Schema::builder::<Entry>("Entry")
            .identity("date", |e| &e.date, |e, v| e.date = v)
            .field("Date", |e| &e.upper, |e, v| e.upper = v)
            .build();
        assert!(schema.validate().is_ok());
        assert!(schema.validate_keys(&KeyMap::identity()).is_ok());
        assert!(matches!(
            schema.validate_keys(&KeyMap::legacy()),
            Err(SchemaError::DuplicateKey { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Erased access
    // -----------------------------------------------------------------------

    #[test]
    fn read_and_write_through_erased_fields() {
        let schema = Author::schema();
        let mut boxed = schema.instantiate();

        schema
            .field("handle")
            .unwrap()
            .write(boxed.as_mut(), FieldUpdate::Scalar(Scalar::from("ada")))
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        schema
            .field("joined")
            .unwrap()
            .write(boxed.as_mut(), FieldUpdate::Scalar(Scalar::Date(day)))
            .unwrap();

        let author = boxed.downcast::<Author>().unwrap();
        assert_eq!(
            *author,
            Author {
                handle: "ada".into(),
                joined: Some(day)
            }
        );

        match schema.field("joined").unwrap().read(&*author).unwrap() {
            FieldValue::Scalar(value) => assert_eq!(value, Some(Scalar::Date(day))),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn reference_fields_roundtrip_boxed_children() {
        let schema = Post::schema();
        let mut post = Post::default();
        let child: Box<dyn Any> = Box::new(Author {
            handle: "grace".into(),
            joined: None,
        });
        schema
            .field("author")
            .unwrap()
            .write(&mut post, FieldUpdate::Reference(child))
            .unwrap();
        assert_eq!(post.author.as_ref().unwrap().handle, "grace");

        match schema.field("author").unwrap().read(&post).unwrap() {
            FieldValue::Reference(Some(child)) => {
                assert_eq!(child.downcast_ref::<Author>().unwrap().handle, "grace");
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn absent_list_items_are_left_out_of_reads() {
        #[derive(Default)]
        struct Readings {
            id: String,
            values: Vec<Option<i32>>,
        }

        let schema = Schema::builder::<Readings>("Readings")
            .identity("id", |r| &r.id, |r, v| r.id = v)
            .list("values", |r| &r.values, |r, v| r.values = v)
            .build();
        let readings = Readings {
            id: "r1".into(),
            values: vec![Some(1), None, Some(3)],
        };

        match schema.field("values").unwrap().read(&readings).unwrap() {
            FieldValue::ScalarList(items) => {
                assert_eq!(items, vec![Scalar::Int(1), Scalar::Int(3)]);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn wrong_owner_is_a_type_mismatch() {
        let mut author = Author::default();
        let err = Post::schema()
            .field("tags")
            .unwrap()
            .write(&mut author, FieldUpdate::ScalarList(vec![]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn wrong_scalar_kind_is_a_coercion_error() {
        let mut post = Post::default();
        let err = Post::schema()
            .field("id")
            .unwrap()
            .write(&mut post, FieldUpdate::Scalar(Scalar::from("seven")))
            .unwrap_err();
        assert!(matches!(err, SchemaError::Coercion { .. }));
    }
}
