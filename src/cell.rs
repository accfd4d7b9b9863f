/// Typed cell values and the coercion rules applied to WEBPRO input cells
///
/// Every cell read from a sheet is normalized into a [`CellValue`] before any
/// extraction logic looks at it. Coercions never fail: a value that cannot be
/// converted is passed through unchanged (or mapped to null where the domain
/// convention says so).
use calamine::Data;
use regex::Regex;
use std::fmt;

/// Filled-marker glyph used by the input forms for "yes"
pub const FILLED_MARKER: &str = "■";

/// A single scalar cell value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// A value is present iff it is non-null and its string form is not
    /// empty after trimming whitespace.
    pub fn is_present(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Text(s) => !s.trim().is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Float-then-int conversion; on failure the raw value is kept.
    pub fn coerce_int(self) -> CellValue {
        let as_int = |f: f64| {
            if f.is_finite() {
                Some(CellValue::Int(f.trunc() as i64))
            } else {
                None
            }
        };

        match self {
            CellValue::Int(_) => self,
            CellValue::Number(f) => as_int(f).unwrap_or(self),
            CellValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(f) => as_int(f).unwrap_or(CellValue::Text(s)),
                Err(_) => CellValue::Text(s),
            },
            other => other,
        }
    }

    /// `■` maps to 1, anything else (blank included) maps to 0
    pub fn marker_flag(&self) -> CellValue {
        match self {
            CellValue::Text(s) if s == FILLED_MARKER => CellValue::Int(1),
            _ => CellValue::Int(0),
        }
    }

    /// Parse an operating-order cell such as "2番目" into an integer rank
    pub fn parse_priority(&self) -> CellValue {
        match self {
            CellValue::Int(i) => CellValue::Int(*i),
            CellValue::Number(f) if f.is_finite() => CellValue::Int(f.trunc() as i64),
            CellValue::Text(s) => strip_ordinal(s).map_or(CellValue::Null, CellValue::Int),
            _ => CellValue::Null,
        }
    }

    /// Blank cells become null, anything present is kept as-is
    pub fn blank_to_null(self) -> CellValue {
        if self.is_present() {
            self
        } else {
            CellValue::Null
        }
    }

    /// Blank cells become an empty string (notes columns)
    pub fn blank_to_empty(self) -> CellValue {
        if self.is_present() {
            self
        } else {
            CellValue::Text(String::new())
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => CellValue::Null,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Int(*i),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(ndt) if ndt.time() == chrono::NaiveTime::MIN => {
                    CellValue::Text(ndt.date().format("%Y-%m-%d").to_string())
                }
                Some(ndt) => CellValue::Text(ndt.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => CellValue::Number(dt.as_f64()),
            },
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

/// Strip an ordinal suffix ("2番目", "3rd") and parse the remaining integer
///
/// ```
/// use webpro_etl::cell::strip_ordinal;
///
/// assert_eq!(strip_ordinal("2番目"), Some(2));
/// assert_eq!(strip_ordinal(" 1st "), Some(1));
/// assert_eq!(strip_ordinal("abc"), None);
/// ```
pub fn strip_ordinal(value: &str) -> Option<i64> {
    let re = Regex::new(r"^(-?\d+)\s*(?:番目|st|nd|rd|th)?$").ok()?;
    re.captures(value.trim())
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}
