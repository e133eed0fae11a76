//! Resource model

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier of a remote resource (UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Generate a fresh client-side identifier for a resource not yet uploaded
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A remote resource reduced to the parts fusionsync maps to disk.
///
/// Every map only holds values that are actually present. A missing key is
/// omitted from writes, which keeps patch requests from clobbering remote
/// fields the local tree does not mention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    /// Identifier, when known
    pub id: Option<ResourceId>,
    /// Plain and default-locale fields keyed by JSON property
    pub fields: BTreeMap<String, String>,
    /// Localized overrides: JSON property -> locale -> value
    pub localized: BTreeMap<String, BTreeMap<String, String>>,
    /// Named entries such as theme templates: JSON property -> name -> value
    pub entries: BTreeMap<String, BTreeMap<String, String>>,
    /// Free-form metadata blob
    pub data: Option<Map<String, Value>>,
}

impl Resource {
    #[must_use]
    pub fn new(id: Option<ResourceId>) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set_field(field, value);
        self
    }

    #[must_use]
    pub fn with_localized(mut self, field: &str, locale: &str, value: impl Into<String>) -> Self {
        self.set_localized(field, locale, value);
        self
    }

    #[must_use]
    pub fn with_entry(mut self, field: &str, name: &str, value: impl Into<String>) -> Self {
        self.set_entry(field, name, value);
        self
    }

    pub fn set_field(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn set_localized(&mut self, field: &str, locale: &str, value: impl Into<String>) {
        self.localized
            .entry(field.to_string())
            .or_default()
            .insert(locale.to_string(), value.into());
    }

    pub fn set_entry(&mut self, field: &str, name: &str, value: impl Into<String>) {
        self.entries
            .entry(field.to_string())
            .or_default()
            .insert(name.to_string(), value.into());
    }

    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn localized_value(&self, field: &str, locale: &str) -> Option<&str> {
        self.localized
            .get(field)
            .and_then(|values| values.get(locale))
            .map(String::as_str)
    }

    pub fn entry(&self, field: &str, name: &str) -> Option<&str> {
        self.entries
            .get(field)
            .and_then(|values| values.get(name))
            .map(String::as_str)
    }

    /// Union of locale codes across every localized field, sorted.
    pub fn locales(&self) -> BTreeSet<String> {
        self.localized
            .values()
            .flat_map(|values| values.keys().cloned())
            .collect()
    }

    /// True when nothing would be sent to the server.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self.localized.values().all(BTreeMap::is_empty)
            && self.entries.values().all(BTreeMap::is_empty)
            && self.data.is_none()
    }
}
