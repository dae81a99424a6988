//! # Filter Store Module
//!
//! Generic keyed filter state shared by every filtered list and report view
//!
//! ## Key Components
//! - [`FilterValue`] - Duck-typed filter value (text, number, bool, list or null)
//! - [`FilterState`] - Insertion-ordered mapping from filter name to value
//! - [`FilterStore`] - Owner of the state with change notification and reset/clear
//! - [`Filterable`] - Lets loaded records be matched against active filters

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    /// Null, blank text and empty lists are inactive; numbers and bools always count.
    pub fn is_active(&self) -> bool {
        match self {
            FilterValue::Null => false,
            FilterValue::Text(text) => !text.trim().is_empty(),
            FilterValue::List(items) => !items.is_empty(),
            FilterValue::Number(_) | FilterValue::Bool(_) => true,
        }
    }

    /// Flat string values as they go on the wire; lists expand to one value per item.
    pub fn wire_values(&self) -> Vec<String> {
        match self {
            FilterValue::Null => Vec::new(),
            FilterValue::Bool(b) => vec![b.to_string()],
            FilterValue::Number(n) => vec![n.to_string()],
            FilterValue::Text(text) => vec![text.clone()],
            FilterValue::List(items) => items.clone(),
        }
    }

    fn matches_field(&self, field: &str) -> bool {
        let field = field.trim();
        match self {
            FilterValue::Null => true,
            FilterValue::Bool(b) => field.eq_ignore_ascii_case(&b.to_string()),
            FilterValue::Number(n) => field.parse::<f64>().is_ok_and(|v| v == *n),
            FilterValue::Text(text) => field.eq_ignore_ascii_case(text.trim()),
            FilterValue::List(items) => items.iter().any(|item| field.eq_ignore_ascii_case(item.trim())),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Null => write!(f, "null"),
            FilterValue::List(items) => write!(f, "[{}]", items.join(", ")),
            other => write!(f, "{}", other.wire_values().join("")),
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

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::List(value)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(value: Vec<&str>) -> Self {
        FilterValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

/// Records that can be matched against a [`FilterState`].
pub trait Filterable {
    /// Value of the named field, or `None` when the record has no such field.
    fn filter_field(&self, key: &str) -> Option<String>;
}

/// Mapping from filter name to value that keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    entries: Vec<(String, FilterValue)>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FilterValue>,
    {
        let mut state = Self::new();
        for (key, value) in pairs {
            state.insert(key, value);
        }
        state
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Replace in place if the key exists, otherwise append.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.get(key).is_some_and(FilterValue::is_active)
    }

    /// Only the active entries, in insertion order.
    pub fn active(&self) -> FilterState {
        FilterState {
            entries: self
                .entries
                .iter()
                .filter(|(_, v)| v.is_active())
                .cloned()
                .collect(),
        }
    }

    /// True when every active filter accepts the record. Filters naming a
    /// field the record does not expose are ignored.
    pub fn matches<T: Filterable>(&self, item: &T) -> bool {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_active())
            .all(|(key, value)| match item.filter_field(key) {
                Some(field) => value.matches_field(&field),
                None => true,
            })
    }
}

impl Serialize for FilterState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

pub type ChangeCallback = Box<dyn FnMut(&FilterState)>;

/// Single-writer owner of a view's filter state.
///
/// Every mutation hands the complete updated mapping to the registered
/// callback, never just the delta.
pub struct FilterStore {
    defaults: FilterState,
    filters: FilterState,
    on_change: Option<ChangeCallback>,
}

impl fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStore")
            .field("defaults", &self.defaults)
            .field("filters", &self.filters)
            .field("has_callback", &self.on_change.is_some())
            .finish()
    }
}

impl FilterStore {
    pub fn new(defaults: FilterState) -> Self {
        Self {
            filters: defaults.clone(),
            defaults,
            on_change: None,
        }
    }

    pub fn with_callback(defaults: FilterState, on_change: impl FnMut(&FilterState) + 'static) -> Self {
        let mut store = Self::new(defaults);
        store.on_change(on_change);
        store
    }

    /// Register the change callback, replacing any previous one.
    pub fn on_change(&mut self, callback: impl FnMut(&FilterState) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key)
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.filters.insert(key, value);
        self.notify();
    }

    /// Merge several keys in one mutation with a single notification.
    pub fn set_many<I, K, V>(&mut self, partial: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FilterValue>,
    {
        for (key, value) in partial {
            self.filters.insert(key, value);
        }
        self.notify();
    }

    /// Drop the key entirely so it disappears from the query projection.
    /// Removing a key that is not present is a no-op.
    pub fn remove_filter(&mut self, key: &str) {
        if self.filters.remove(key).is_some() {
            self.notify();
        }
    }

    /// Restore exactly the defaults captured at construction.
    pub fn reset(&mut self) {
        self.filters = self.defaults.clone();
        self.notify();
    }

    /// Null every present key; keys stay in the mapping.
    pub fn clear(&mut self) {
        for (_, value) in self.filters.entries.iter_mut() {
            *value = FilterValue::Null;
        }
        self.notify();
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.filters.is_active(key)
    }

    pub fn active_count(&self) -> usize {
        self.filters.iter().filter(|(_, v)| v.is_active()).count()
    }

    pub fn has_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Active entries only, in insertion order, ready to send as request
    /// parameters. Values are limited to text, numbers and lists, so booleans
    /// go out as `"true"`/`"false"`.
    pub fn to_query_params(&self) -> FilterState {
        let mut params = self.filters.active();
        for (_, value) in params.entries.iter_mut() {
            if let FilterValue::Bool(b) = value {
                *value = FilterValue::Text(b.to_string());
            }
        }
        params
    }

    /// Percent-encoded query string of the active entries. List values are
    /// sent as repeated keys.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        for (key, value) in self.to_query_params().iter() {
            for item in value.wire_values() {
                pairs.push(format!("{}={}", urlencoding::encode(key), urlencoding::encode(&item)));
            }
        }
        pairs.join("&")
    }

    fn notify(&mut self) {
        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.filters);
        }
    }
}
