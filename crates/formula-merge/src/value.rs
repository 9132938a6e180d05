use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// JSON-friendly representation of a single cell.
///
/// The enum uses an explicit `{type, value}` tagged layout for stable IPC.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Absent value. Unmatched sides of outer-style joins are filled with it.
    Null,
    /// Plain text.
    String(String),
    /// IEEE-754 double; integer and float columns both store numbers.
    Number(f64),
    /// Boolean.
    Boolean(bool),
    /// Calendar date without a time component.
    Date(NaiveDate),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl CellValue {
    /// Returns true if the value is [`CellValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text form used for key comparison.
    ///
    /// Two key cells join iff their text forms are equal, so `55` matches `"55"` and
    /// [`CellValue::Null`] matches both another null and the text `"null"`.
    pub fn key_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("null"),
            CellValue::String(s) => Cow::Borrowed(s.as_str()),
            CellValue::Number(n) => Cow::Owned(number_text(*n)),
            CellValue::Boolean(true) => Cow::Borrowed("true"),
            CellValue::Boolean(false) => Cow::Borrowed("false"),
            CellValue::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Formats a number the way the merge designer displays it: shortest round-trip digits, no
/// trailing `.0`, exponent form outside `[1e-6, 1e21)`.
pub(crate) fn number_text(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // Covers -0.0 as well.
        return "0".to_string();
    }

    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{n}");
    }

    let text = format!("{n:e}");
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key_text())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}
