//! Bridge between native Rust field types and [`Scalar`].

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::CoercionError;
use crate::scalar::{Scalar, ScalarKind};

/// A native Rust type that can be stored as a single scalar.
///
/// `to_scalar` returns `None` when the value is absent (only `Option<_>`
/// fields ever are). `from_scalar` rejects a scalar of the wrong kind.
pub trait ScalarValue: Sized + Send + Sync + 'static {
    /// The kind used to decode this type's stored text.
    const KIND: ScalarKind;

    fn to_scalar(&self) -> Option<Scalar>;

    fn from_scalar(value: Scalar) -> Result<Self, CoercionError>;
}

fn mismatch(expected: ScalarKind, value: &Scalar) -> CoercionError {
    CoercionError::KindMismatch {
        expected,
        actual: value.kind(),
    }
}

macro_rules! impl_scalar_value {
    ($ty:ty, $kind:ident) => {
        impl ScalarValue for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn to_scalar(&self) -> Option<Scalar> {
                Some(Scalar::$kind(self.clone()))
            }

            fn from_scalar(value: Scalar) -> Result<Self, CoercionError> {
                match value {
                    Scalar::$kind(inner) => Ok(inner),
                    other => Err(mismatch(Self::KIND, &other)),
                }
            }
        }
    };
}

impl_scalar_value!(String, String);
impl_scalar_value!(i32, Int);
impl_scalar_value!(i64, Long);
impl_scalar_value!(f64, Double);
impl_scalar_value!(f32, Float);
impl_scalar_value!(bool, Bool);
impl_scalar_value!(NaiveDate, Date);

/// Timestamps are stored as their UTC calendar day and come back at midnight.
impl ScalarValue for DateTime<Utc> {
    const KIND: ScalarKind = ScalarKind::Date;

    fn to_scalar(&self) -> Option<Scalar> {
        Some(Scalar::Date(self.date_naive()))
    }

    fn from_scalar(value: Scalar) -> Result<Self, CoercionError> {
        match value {
            Scalar::Date(day) => Ok(Utc.from_utc_datetime(&day.and_time(NaiveTime::default()))),
            other => Err(mismatch(Self::KIND, &other)),
        }
    }
}

impl<V: ScalarValue> ScalarValue for Option<V> {
    const KIND: ScalarKind = V::KIND;

    fn to_scalar(&self) -> Option<Scalar> {
        self.as_ref().and_then(V::to_scalar)
    }

    fn from_scalar(value: Scalar) -> Result<Self, CoercionError> {
        V::from_scalar(value).map(Some)
    }
}
