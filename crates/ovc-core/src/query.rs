//! Query string construction for list endpoints.
//!
//! Every OVC collection endpoint accepts the same paging/sorting parameters plus
//! an open set of resource-specific filters. [`ListParams`] captures both and
//! renders them through [`QueryParams`].

use std::collections::BTreeMap;
use std::fmt::Display;

/// Limit applied when the caller asks for fewer than one result.
pub const DEFAULT_LIST_LIMIT: u32 = 500;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Display,
    {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Parameters accepted by every collection (`GET /<resources>`) endpoint.
///
/// Paging, sorting and field selection are always sent, empty strings included,
/// so the controller applies its own defaults explicitly. Filters are merged in
/// after the fixed parameters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Maximum number of results; values below 1 fall back to [`DEFAULT_LIST_LIMIT`].
    pub limit: u32,
    /// Offset for pagination.
    pub offset: u32,
    /// Field to sort on.
    pub sort: String,
    /// Sort order (`ascending` / `descending`).
    pub order: String,
    /// Comma-separated list of fields to return.
    pub fields: String,
    /// Case sensitivity of filter matching (`sensitive` / `insensitive`).
    pub case: String,
    /// Include fields the controller omits by default.
    pub show_optional_fields: bool,
    /// Resource-specific filters, e.g. `name` or `datastore_id`.
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    /// Create parameters with controller defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create parameters with a single filter.
    #[must_use]
    pub fn filter(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().with_filter(field, value)
    }

    /// Set the result limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the result offset.
    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Sort by `field` in `order`.
    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort = field.into();
        self.order = order.into();
        self
    }

    /// Restrict the returned fields.
    #[must_use]
    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    /// Set filter case sensitivity.
    #[must_use]
    pub fn with_case(mut self, case: impl Into<String>) -> Self {
        self.case = case.into();
        self
    }

    /// Request optional fields.
    #[must_use]
    pub fn with_optional_fields(mut self, show: bool) -> Self {
        self.show_optional_fields = show;
        self
    }

    /// Add (or replace) a named filter.
    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// The limit actually sent to the controller.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        if self.limit < 1 {
            DEFAULT_LIST_LIMIT
        } else {
            self.limit
        }
    }

    /// Convert the parameters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut params = QueryParams::new();
        params.push("limit", self.effective_limit());
        params.push("offset", self.offset);
        params.push("sort", &self.sort);
        params.push("order", &self.order);
        params.push("fields", &self.fields);
        params.push("case", &self.case);
        params.push("show_optional_fields", self.show_optional_fields);

        for (key, value) in &self.filters {
            params.push(key.as_str(), value);
        }

        params.into_pairs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_params_render_controller_defaults() {
        let pairs = ListParams::new().to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("limit".to_string(), "500".to_string()),
                ("offset".to_string(), "0".to_string()),
                ("sort".to_string(), String::new()),
                ("order".to_string(), String::new()),
                ("fields".to_string(), String::new()),
                ("case".to_string(), String::new()),
                ("show_optional_fields".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn zero_limit_becomes_default() {
        let params = ListParams::new().with_limit(0);
        assert_eq!(params.effective_limit(), DEFAULT_LIST_LIMIT);
        assert_eq!(lookup(&params.to_pairs(), "limit"), Some("500"));
    }

    #[test]
    fn explicit_limit_is_kept() {
        let params = ListParams::new().with_limit(1).with_offset(20);
        let pairs = params.to_pairs();
        assert_eq!(lookup(&pairs, "limit"), Some("1"));
        assert_eq!(lookup(&pairs, "offset"), Some("20"));
    }

    #[test]
    fn filters_are_merged_after_fixed_parameters() {
        let params = ListParams::filter("name", "testname")
            .with_filter("datastore_id", "ds-1")
            .with_sort("name", "descending")
            .with_optional_fields(true);
        let pairs = params.to_pairs();

        assert_eq!(pairs.len(), 9);
        assert_eq!(lookup(&pairs, "name"), Some("testname"));
        assert_eq!(lookup(&pairs, "datastore_id"), Some("ds-1"));
        assert_eq!(lookup(&pairs, "sort"), Some("name"));
        assert_eq!(lookup(&pairs, "order"), Some("descending"));
        assert_eq!(lookup(&pairs, "show_optional_fields"), Some("true"));
    }
}
