//! Foundation types for the rmap record mapper.
//!
//! Every value the mapper writes ends up as a string in a flat hash store.
//! This crate defines the scalar values that can make that trip and the
//! rules for converting them in both directions.
//!
//! # Key Types
//!
//! - [`Scalar`] — A single native value (string, integer, long, double, float, boolean, date)
//! - [`ScalarKind`] — The declared kind of a scalar field, used to pick a decoder
//! - [`ScalarValue`] — Bridge between native Rust field types and [`Scalar`]
//! - [`CoercionError`] — Typed failure for text that does not parse as its declared kind
//!
//! # Coercion Rules
//!
//! 1. Empty text decodes to the absent sentinel (`None`) for every kind.
//! 2. Numbers use their canonical decimal text form.
//! 3. Booleans are `true`/`false`, case-insensitive on decode.
//! 4. Dates are calendar days (`YYYY-MM-DD`). Time of day is dropped on encode;
//!    keeping sub-day precision would be a breaking format change.

pub mod coerce;
pub mod error;
pub mod scalar;
pub mod value;

pub use coerce::{decode, encode, DATE_FORMAT};
pub use error::CoercionError;
pub use scalar::{Scalar, ScalarKind};
pub use value::ScalarValue;
