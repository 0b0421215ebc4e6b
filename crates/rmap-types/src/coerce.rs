//! Bidirectional conversion between [`Scalar`] values and store text.

use chrono::NaiveDate;

use crate::error::CoercionError;
use crate::scalar::{Scalar, ScalarKind};

/// Calendar-day format used for every stored date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encode a scalar into its stored text form.
pub fn encode(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => s.clone(),
        Scalar::Int(n) => n.to_string(),
        Scalar::Long(n) => n.to_string(),
        Scalar::Double(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Date(d) => d.format(DATE_FORMAT).to_string(),
    }
}

/// Decode stored text as a scalar of the given kind.
///
/// Returns `Ok(None)` for empty text regardless of kind, so callers can tell
/// "never set" apart from a zero value.
pub fn decode(text: &str, kind: ScalarKind) -> Result<Option<Scalar>, CoercionError> {
    if text.is_empty() {
        return Ok(None);
    }

    let value = match kind {
        ScalarKind::String => Scalar::String(text.to_string()),
        ScalarKind::Int => Scalar::Int(text.parse().map_err(|_| invalid_number(kind, text))?),
        ScalarKind::Long => Scalar::Long(text.parse().map_err(|_| invalid_number(kind, text))?),
        ScalarKind::Double => {
            Scalar::Double(text.parse().map_err(|_| invalid_number(kind, text))?)
        }
        ScalarKind::Float => Scalar::Float(text.parse().map_err(|_| invalid_number(kind, text))?),
        ScalarKind::Bool => Scalar::Bool(decode_bool(text)?),
        ScalarKind::Date => Scalar::Date(
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map_err(|_| CoercionError::InvalidDate(text.to_string()))?,
        ),
    };
    Ok(Some(value))
}

fn decode_bool(text: &str) -> Result<bool, CoercionError> {
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(CoercionError::InvalidBoolean(text.to_string()))
    }
}

fn invalid_number(kind: ScalarKind, text: &str) -> CoercionError {
    CoercionError::InvalidNumber {
        kind,
        text: text.to_string(),
    }
}
