//! Session-scoped paging, sorting and filtering state, and the query string
//! built from it.
//!
//! A [`QueryOptions`] lives inside each [`Client`](crate::Client) and is read by
//! every listing call until one of its setters overwrites it. Setters are
//! guards: a value outside the accepted range is ignored and the previous
//! state stays in place.

use crate::filter::{compile_filters, FilterDescriptor};
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

/// Page size, page number and offset.
///
/// The API decides how `page` and `offset` combine; in practice `offset` wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagingState {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub offset: Option<u32>,
}

/// Sort order for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Ascending),
            "desc" => Ok(SortDirection::Descending),
            _ => Err(()),
        }
    }
}

/// Field and direction to sort by, sent as `sort=<key>:<asc|desc>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Returns `None` when `key` is empty.
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Option<Self> {
        let key = key.into();
        if key.is_empty() {
            return None;
        }
        Some(Self { key, direction })
    }
}

/// Paging, sort and filter state shared by all listing requests of a client.
///
/// # Examples
///
/// ```
/// use lotr::{FilterDescriptor, FilterOperator, QueryOptions};
///
/// let mut options = QueryOptions::default();
/// options.set_limit(3);
/// options.set_filters(vec![
///     FilterDescriptor::new("race", FilterOperator::Include, "Hobbit,Human"),
///     FilterDescriptor::new("name", FilterOperator::RegexMatch, "king"),
/// ]);
///
/// assert_eq!(options.to_query_string(), "?limit=3&race=Hobbit,Human&name=/king/i");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    paging: PagingState,
    sort: Option<SortSpec>,
    filters: Vec<FilterDescriptor>,
}

impl QueryOptions {
    /// Stores `limit` if it is at least 1.
    pub fn set_limit(&mut self, limit: i64) {
        if let Some(limit) = positive(limit) {
            self.paging.limit = Some(limit);
        }
    }

    /// Stores `page` if it is at least 1.
    pub fn set_page(&mut self, page: i64) {
        if let Some(page) = positive(page) {
            self.paging.page = Some(page);
        }
    }

    /// Stores `offset` if it is not negative.
    pub fn set_offset(&mut self, offset: i64) {
        if let Ok(offset) = u32::try_from(offset) {
            self.paging.offset = Some(offset);
        }
    }

    /// Stores the sort if `key` is non-empty and `direction` is `"asc"` or
    /// `"desc"`.
    pub fn set_sort(&mut self, key: &str, direction: &str) {
        let Ok(direction) = direction.parse::<SortDirection>() else {
            return;
        };
        if let Some(sort) = SortSpec::new(key, direction) {
            self.sort = Some(sort);
        }
    }

    /// Typed counterpart of [`set_sort`](Self::set_sort).
    pub fn set_sort_spec(&mut self, sort: SortSpec) {
        if !sort.key.is_empty() {
            self.sort = Some(sort);
        }
    }

    /// Replaces the filter list. Descriptors are checked only when the query
    /// is built.
    pub fn set_filters(&mut self, filters: Vec<FilterDescriptor>) {
        self.filters = filters;
    }

    pub fn clear_paging(&mut self) {
        self.paging = PagingState::default();
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Back to no paging, no sort and no filters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn paging(&self) -> PagingState {
        self.paging
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn filters(&self) -> &[FilterDescriptor] {
        &self.filters
    }

    /// Builds the query string to append to an endpoint path.
    ///
    /// Paging and sort come first, form-encoded, in the order `limit`, `page`,
    /// `offset`, `sort`. Compiled filter terms follow verbatim. Returns an
    /// empty string when nothing is set, otherwise a string starting with `?`.
    pub fn to_query_string(&self) -> String {
        let mut pairs = form_urlencoded::Serializer::new(String::new());
        let mut has_pairs = false;
        let paging = [
            ("limit", self.paging.limit),
            ("page", self.paging.page),
            ("offset", self.paging.offset),
        ];
        for (name, value) in paging {
            if let Some(value) = value {
                pairs.append_pair(name, &value.to_string());
                has_pairs = true;
            }
        }
        if let Some(sort) = &self.sort {
            pairs.append_pair("sort", &format!("{}:{}", sort.key, sort.direction));
            has_pairs = true;
        }
        let pairs = pairs.finish();

        let filters = compile_filters(&self.filters);

        match (has_pairs, filters.is_empty()) {
            (true, true) => format!("?{pairs}"),
            (true, false) => format!("?{pairs}&{filters}"),
            (false, false) => format!("?{filters}"),
            (false, true) => String::new(),
        }
    }
}

fn positive(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v >= 1)
}
