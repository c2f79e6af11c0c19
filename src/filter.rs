//! The filter mini-language understood by The One API.
//!
//! A [`FilterDescriptor`] names a document field, an operator and (for most
//! operators) a value. Descriptors compile to the API's literal query terms:
//!
//! | Operator | Term |
//! |---|---|
//! | `exists` | `key` |
//! | `not_exists` | `!key` |
//! | `match`, `include` | `key=value` |
//! | `not_match`, `exclude` | `key!=value` |
//! | `regex_match` | `key=/value/i` |
//! | `regex_not_match` | `key!=/value/i` |
//! | `>`, `<`, `>=`, `<=` | `key>value` etc. |
//!
//! Compilation fails open: a descriptor that cannot produce a valid term
//! (empty key, missing value, non-numeric comparison value) is dropped and the
//! request goes ahead without it.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Comparison and matching operators accepted by the API.
///
/// Parses from the wire names used in filter lists (`"match"`, `"not_exists"`,
/// `">="`, ...). `"not_exist"` is accepted as an alias of
/// [`FilterOperator::NotExists`].
///
/// ```
/// use lotr::FilterOperator;
///
/// assert_eq!("regex_match".parse::<FilterOperator>().unwrap(), FilterOperator::RegexMatch);
/// assert_eq!("<=".parse::<FilterOperator>().unwrap(), FilterOperator::LessOrEqual);
/// assert_eq!("not_exist".parse::<FilterOperator>().unwrap(), FilterOperator::NotExists);
/// assert!("between".parse::<FilterOperator>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "match")]
    Match,
    #[serde(rename = "not_match")]
    NotMatch,
    #[serde(rename = "include")]
    Include,
    #[serde(rename = "exclude")]
    Exclude,
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "not_exists", alias = "not_exist")]
    NotExists,
    #[serde(rename = "regex_match")]
    RegexMatch,
    #[serde(rename = "regex_not_match")]
    RegexNotMatch,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
}

impl FilterOperator {
    /// The canonical wire name of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Match => "match",
            FilterOperator::NotMatch => "not_match",
            FilterOperator::Include => "include",
            FilterOperator::Exclude => "exclude",
            FilterOperator::Exists => "exists",
            FilterOperator::NotExists => "not_exists",
            FilterOperator::RegexMatch => "regex_match",
            FilterOperator::RegexNotMatch => "regex_not_match",
            FilterOperator::GreaterThan => ">",
            FilterOperator::LessThan => "<",
            FilterOperator::GreaterOrEqual => ">=",
            FilterOperator::LessOrEqual => "<=",
        }
    }

    /// `true` for `>`, `<`, `>=` and `<=`, which only accept numeric values.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            FilterOperator::GreaterThan
                | FilterOperator::LessThan
                | FilterOperator::GreaterOrEqual
                | FilterOperator::LessOrEqual
        )
    }

    /// `true` for `exists` and `not_exists`, which take no value.
    pub fn is_presence(self) -> bool {
        matches!(self, FilterOperator::Exists | FilterOperator::NotExists)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`FilterOperator`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter operator: {0:?}")]
pub struct UnknownOperator(pub String);

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "match" => FilterOperator::Match,
            "not_match" => FilterOperator::NotMatch,
            "include" => FilterOperator::Include,
            "exclude" => FilterOperator::Exclude,
            "exists" => FilterOperator::Exists,
            "not_exists" | "not_exist" => FilterOperator::NotExists,
            "regex_match" => FilterOperator::RegexMatch,
            "regex_not_match" => FilterOperator::RegexNotMatch,
            ">" => FilterOperator::GreaterThan,
            "<" => FilterOperator::LessThan,
            ">=" => FilterOperator::GreaterOrEqual,
            "<=" => FilterOperator::LessOrEqual,
            other => return Err(UnknownOperator(other.to_string())),
        };
        Ok(op)
    }
}

/// A scalar filter value.
///
/// Text is emitted verbatim, so comma-separated lists (`"Hobbit,Human"`) and
/// regex bodies pass through untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FilterValue {
    /// Whether the value is usable with a comparison operator.
    ///
    /// Integers and finite floats always are. Text is numeric when, after
    /// trimming ASCII whitespace, it reads as a decimal number with optional
    /// sign, fraction and exponent (`"1000"`, `"-2.5"`, `"1e3"`).
    pub fn is_numeric(&self) -> bool {
        match self {
            FilterValue::Integer(_) => true,
            FilterValue::Float(f) => f.is_finite(),
            FilterValue::Text(s) => is_numeric_text(s),
        }
    }
}

fn is_numeric_text(s: &str) -> bool {
    let trimmed = s.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return false;
    }
    // f64::from_str also takes "inf" and "NaN"; those are not numbers here.
    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return false;
    }
    trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Integer(i) => write!(f, "{i}"),
            FilterValue::Float(x) => write!(f, "{x}"),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

/// One filter on a listing request.
///
/// Deserializes from the `{"key", "filter_type", "value"}` objects used in
/// the API documentation, so filter lists can live in configuration files.
///
/// ```
/// use lotr::{FilterDescriptor, FilterOperator};
///
/// let hobbits = FilterDescriptor::new("race", FilterOperator::Include, "Hobbit,Human");
/// assert_eq!(hobbits.compile().as_deref(), Some("race=Hobbit,Human"));
///
/// let named = FilterDescriptor::exists("name");
/// assert_eq!(named.compile().as_deref(), Some("name"));
///
/// // comparison with a non-numeric value is dropped
/// let broken = FilterDescriptor::new("boxOfficeRevenueInMillions", FilterOperator::LessThan, "a");
/// assert_eq!(broken.compile(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterDescriptor {
    pub key: String,
    #[serde(rename = "filter_type")]
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Option<FilterValue>,
}

impl FilterDescriptor {
    /// Creates a descriptor carrying a value.
    pub fn new(
        key: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            key: key.into(),
            operator,
            value: Some(value.into()),
        }
    }

    /// `key`: documents where the field is present.
    pub fn exists(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: FilterOperator::Exists,
            value: None,
        }
    }

    /// `!key`: documents where the field is absent.
    pub fn not_exists(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: FilterOperator::NotExists,
            value: None,
        }
    }

    /// Compiles the descriptor to its query term, or `None` if it is not a
    /// valid filter and should be left out of the query.
    pub fn compile(&self) -> Option<String> {
        if self.key.is_empty() {
            return None;
        }
        let key = &self.key;

        // presence operators ignore any value they were given
        let term = match (self.operator, self.value.as_ref()) {
            (FilterOperator::Exists, _) => key.clone(),
            (FilterOperator::NotExists, _) => format!("!{key}"),
            (_, None) => return None,
            (FilterOperator::Match | FilterOperator::Include, Some(value)) => {
                format!("{key}={value}")
            }
            (FilterOperator::NotMatch | FilterOperator::Exclude, Some(value)) => {
                format!("{key}!={value}")
            }
            (FilterOperator::RegexMatch, Some(value)) => format!("{key}=/{value}/i"),
            (FilterOperator::RegexNotMatch, Some(value)) => format!("{key}!=/{value}/i"),
            (op, Some(value)) if value.is_numeric() => format!("{key}{op}{value}"),
            // comparison against something that is not a number
            (_, Some(_)) => return None,
        };
        Some(term)
    }
}

/// Compiles a filter list into `&`-joined terms, skipping invalid descriptors.
///
/// Order of the input is preserved in the output. The result is not
/// percent-encoded.
pub fn compile_filters(filters: &[FilterDescriptor]) -> String {
    filters
        .iter()
        .filter_map(|filter| {
            let term = filter.compile();
            if term.is_none() {
                tracing::debug!(
                    key = %filter.key,
                    operator = %filter.operator,
                    value = ?filter.value,
                    "Dropping invalid filter"
                );
            }
            term
        })
        .collect::<Vec<_>>()
        .join("&")
}
