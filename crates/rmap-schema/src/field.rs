//! Field descriptors and their type-erased accessors.
//!
//! A [`Field`] pairs a declared name and role with a typed getter/setter pair.
//! The pair is erased behind `&dyn Any` so the mapper can walk a graph of
//! different persistable types without knowing them statically. The erasure
//! is only ever built by [`SchemaBuilder`](crate::SchemaBuilder), which checks
//! every accessor against its owner type at compile time.

use std::any::Any;
use std::fmt;

use rmap_types::{CoercionError, Scalar, ScalarKind, ScalarValue};

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{Persistable, Schema};

/// Deferred handle to a referenced type's schema.
///
/// Stored as a function so that self-referential and mutually-referential
/// types can be declared without initialising each other's schemas.
pub type SchemaRef = fn() -> &'static Schema;

/// The declared shape of a persisted field.
#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    /// A single scalar.
    Scalar(ScalarKind),
    /// An ordered list of scalars.
    ScalarList(ScalarKind),
    /// A reference to another persistable instance, stored by identity.
    Reference(SchemaRef),
    /// An ordered list of references, stored as identities.
    ReferenceList(SchemaRef),
}

impl FieldKind {
    /// The scalar kind of a scalar or scalar-list field.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Scalar(kind) | Self::ScalarList(kind) => Some(*kind),
            Self::Reference(_) | Self::ReferenceList(_) => None,
        }
    }

    /// The target schema of a reference or reference-list field.
    pub fn target(&self) -> Option<&'static Schema> {
        match self {
            Self::Reference(target) | Self::ReferenceList(target) => Some(target()),
            Self::Scalar(_) | Self::ScalarList(_) => None,
        }
    }

    /// Returns `true` for list fields.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::ScalarList(_) | Self::ReferenceList(_))
    }

    /// Returns `true` for single or list references.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_) | Self::ReferenceList(_))
    }
}

/// How the mapper treats a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// The store key of the instance.
    Identity,
    /// Written on persist, read on load.
    Stored,
    /// Written on persist, skipped on load.
    Lazy,
}

/// A value read out of an instance.
#[derive(Debug)]
pub enum FieldValue<'a> {
    Scalar(Option<Scalar>),
    ScalarList(Vec<Scalar>),
    Reference(Option<&'a dyn Any>),
    ReferenceList(Vec<&'a dyn Any>),
}

/// A value to write into an instance.
#[derive(Debug)]
pub enum FieldUpdate {
    Scalar(Scalar),
    ScalarList(Vec<Scalar>),
    Reference(Box<dyn Any>),
    ReferenceList(Vec<Box<dyn Any>>),
}

/// One persisted field of a [`Schema`].
pub struct Field {
    name: &'static str,
    owner: &'static str,
    role: FieldRole,
    aliases: Vec<&'static str>,
    slot: Box<dyn Slot>,
}

impl Field {
    pub(crate) fn new(
        owner: &'static str,
        name: &'static str,
        role: FieldRole,
        slot: Box<dyn Slot>,
    ) -> Self {
        Self {
            name,
            owner,
            role,
            aliases: Vec::new(),
            slot,
        }
    }

    /// The programmatic field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn role(&self) -> FieldRole {
        self.role
    }

    pub fn is_identity(&self) -> bool {
        self.role == FieldRole::Identity
    }

    pub fn is_lazy(&self) -> bool {
        self.role == FieldRole::Lazy
    }

    /// Legacy store keys tried when neither the mapped nor the raw key holds
    /// a value.
    pub fn aliases(&self) -> &[&'static str] {
        &self.aliases
    }

    pub fn kind(&self) -> FieldKind {
        self.slot.kind()
    }

    /// Read this field out of `owner`.
    pub fn read<'a>(&self, owner: &'a dyn Any) -> SchemaResult<FieldValue<'a>> {
        self.slot.read(owner).ok_or_else(|| self.mismatch())
    }

    /// Write `update` into this field of `owner`.
    pub fn write(&self, owner: &mut dyn Any, update: FieldUpdate) -> SchemaResult<()> {
        self.slot.write(owner, update).map_err(|e| match e {
            SlotError::Mismatch => self.mismatch(),
            SlotError::Coercion(source) => SchemaError::Coercion {
                field: format!("{}.{}", self.owner, self.name),
                source,
            },
        })
    }

    pub(crate) fn set_role(&mut self, role: FieldRole) {
        self.role = role;
    }

    pub(crate) fn push_alias(&mut self, alias: &'static str) {
        self.aliases.push(alias);
    }

    fn mismatch(&self) -> SchemaError {
        SchemaError::TypeMismatch {
            type_name: self.owner.to_string(),
            field: self.name.to_string(),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("kind", &self.kind())
            .field("aliases", &self.aliases)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Type-erased accessors
// ---------------------------------------------------------------------------

pub(crate) enum SlotError {
    Mismatch,
    Coercion(CoercionError),
}

pub(crate) trait Slot: Send + Sync {
    fn kind(&self) -> FieldKind;

    fn read<'a>(&self, owner: &'a dyn Any) -> Option<FieldValue<'a>>;

    fn write(&self, owner: &mut dyn Any, update: FieldUpdate) -> Result<(), SlotError>;
}

pub(crate) struct ScalarSlot<T, V> {
    pub(crate) get: fn(&T) -> &V,
    pub(crate) set: fn(&mut T, V),
}

impl<T: Any, V: ScalarValue> Slot for ScalarSlot<T, V> {
    fn kind(&self) -> FieldKind {
        FieldKind::Scalar(V::KIND)
    }

    fn read<'a>(&self, owner: &'a dyn Any) -> Option<FieldValue<'a>> {
        let owner = owner.downcast_ref::<T>()?;
        Some(FieldValue::Scalar((self.get)(owner).to_scalar()))
    }

    fn write(&self, owner: &mut dyn Any, update: FieldUpdate) -> Result<(), SlotError> {
        let owner = owner.downcast_mut::<T>().ok_or(SlotError::Mismatch)?;
        let FieldUpdate::Scalar(value) = update else {
            return Err(SlotError::Mismatch);
        };
        let value = V::from_scalar(value).map_err(SlotError::Coercion)?;
        (self.set)(owner, value);
        Ok(())
    }
}

pub(crate) struct ScalarListSlot<T, V> {
    pub(crate) get: fn(&T) -> &Vec<V>,
    pub(crate) set: fn(&mut T, Vec<V>),
}

impl<T: Any, V: ScalarValue> Slot for ScalarListSlot<T, V> {
    fn kind(&self) -> FieldKind {
        FieldKind::ScalarList(V::KIND)
    }

    fn read<'a>(&self, owner: &'a dyn Any) -> Option<FieldValue<'a>> {
        let owner = owner.downcast_ref::<T>()?;
        let values = (self.get)(owner);
        let items: Vec<Scalar> = values.iter().filter_map(ScalarValue::to_scalar).collect();
        if items.len() != values.len() {
            tracing::warn!(
                owner = std::any::type_name::<T>(),
                dropped = values.len() - items.len(),
                "absent list items are not stored; later items shift on reload"
            );
        }
        Some(FieldValue::ScalarList(items))
    }

    fn write(&self, owner: &mut dyn Any, update: FieldUpdate) -> Result<(), SlotError> {
        let owner = owner.downcast_mut::<T>().ok_or(SlotError::Mismatch)?;
        let FieldUpdate::ScalarList(values) = update else {
            return Err(SlotError::Mismatch);
        };
        let items = values
            .into_iter()
            .map(V::from_scalar)
            .collect::<Result<Vec<V>, _>>()
            .map_err(SlotError::Coercion)?;
        (self.set)(owner, items);
        Ok(())
    }
}

pub(crate) struct ReferenceSlot<T, C> {
    pub(crate) get: fn(&T) -> Option<&C>,
    pub(crate) set: fn(&mut T, C),
}

impl<T: Any, C: Persistable> Slot for ReferenceSlot<T, C> {
    fn kind(&self) -> FieldKind {
        FieldKind::Reference(C::schema)
    }

    fn read<'a>(&self, owner: &'a dyn Any) -> Option<FieldValue<'a>> {
        let owner = owner.downcast_ref::<T>()?;
        let child = (self.get)(owner).map(|c| c as &dyn Any);
        Some(FieldValue::Reference(child))
    }

    fn write(&self, owner: &mut dyn Any, update: FieldUpdate) -> Result<(), SlotError> {
        let owner = owner.downcast_mut::<T>().ok_or(SlotError::Mismatch)?;
        let FieldUpdate::Reference(child) = update else {
            return Err(SlotError::Mismatch);
        };
        let child = child.downcast::<C>().map_err(|_| SlotError::Mismatch)?;
        (self.set)(owner, *child);
        Ok(())
    }
}

pub(crate) struct ReferenceListSlot<T, C> {
    pub(crate) get: fn(&T) -> &Vec<C>,
    pub(crate) set: fn(&mut T, Vec<C>),
}

impl<T: Any, C: Persistable> Slot for ReferenceListSlot<T, C> {
    fn kind(&self) -> FieldKind {
        FieldKind::ReferenceList(C::schema)
    }

    fn read<'a>(&self, owner: &'a dyn Any) -> Option<FieldValue<'a>> {
        let owner = owner.downcast_ref::<T>()?;
        let items = (self.get)(owner).iter().map(|c| c as &dyn Any).collect();
        Some(FieldValue::ReferenceList(items))
    }

    fn write(&self, owner: &mut dyn Any, update: FieldUpdate) -> Result<(), SlotError> {
        let owner = owner.downcast_mut::<T>().ok_or(SlotError::Mismatch)?;
        let FieldUpdate::ReferenceList(children) = update else {
            return Err(SlotError::Mismatch);
        };
        let items = children
            .into_iter()
            .map(|child| child.downcast::<C>().map(|c| *c))
            .collect::<Result<Vec<C>, _>>()
            .map_err(|_| SlotError::Mismatch)?;
        (self.set)(owner, items);
        Ok(())
    }
}
