//! Free-form numeric input.
//!
//! Form fields keep the text the user typed. Arithmetic only ever sees the
//! coerced value, so blank or garbage input counts as zero instead of
//! poisoning a sum with NaN.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Convert user text into a finite number. Blank, unparsable and non-finite
/// input (`NaN`, `inf`) all yield `0.0`.
pub fn coerce(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().map(finite_or_zero).unwrap_or(0.0)
}

/// `value` itself when finite, otherwise `0.0`. Applied to every derived
/// figure so an overflowing product or sum never turns into `inf` or NaN.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// An editable numeric field: the raw text is stored, the number is derived.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "FieldRepr", into = "String")]
pub struct NumericField {
    raw: String,
}

/// Archives may hold the typed text, a plain JSON number, or `null` for a
/// field that was left blank.
#[derive(Deserialize)]
#[serde(untagged)]
enum FieldRepr {
    Null,
    Number(f64),
    Text(String),
}

impl From<FieldRepr> for NumericField {
    fn from(repr: FieldRepr) -> Self {
        match repr {
            FieldRepr::Null => NumericField::blank(),
            FieldRepr::Number(n) => NumericField::from(n),
            FieldRepr::Text(s) => NumericField { raw: s },
        }
    }
}

impl From<NumericField> for String {
    fn from(field: NumericField) -> Self {
        field.raw
    }
}

impl NumericField {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> f64 {
        coerce(&self.raw)
    }

    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// True when the raw text is itself a finite number, i.e. coercion did
    /// not have to substitute zero.
    pub fn is_number(&self) -> bool {
        self.raw
            .trim()
            .parse::<f64>()
            .is_ok_and(|value| value.is_finite())
    }
}

impl From<f64> for NumericField {
    fn from(value: f64) -> Self {
        NumericField {
            raw: value.to_string(),
        }
    }
}

impl From<&str> for NumericField {
    fn from(raw: &str) -> Self {
        NumericField {
            raw: raw.to_string(),
        }
    }
}

impl From<String> for NumericField {
    fn from(raw: String) -> Self {
        NumericField { raw }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
