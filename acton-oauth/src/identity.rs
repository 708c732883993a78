//! Normalized identity of an authenticated end user
//!
//! Every provider returns its own profile shape. Provider flows map those
//! payloads onto an [`Identity`], which always carries the provider name
//! (`service`) and the user's `email`, plus any number of provider-specific
//! fields added after construction.
//!
//! ```rust,ignore
//! let mut identity = Identity::new("github", "octocat@github.com");
//! identity.set("id", 583231);
//! identity.set("firstName", "The Octocat");
//!
//! assert_eq!(identity.get_str("firstName"), Some("The Octocat"));
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;

const SERVICE_FIELD: &str = "service";
const EMAIL_FIELD: &str = "email";

/// Authenticated user, independent of the provider that produced it
///
/// Fields keep the order in which they were set, and serialization walks them
/// in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    values: IndexMap<String, Value>,
}

impl Identity {
    /// Create an identity with the two guaranteed fields
    pub fn new(service: impl Into<String>, email: impl Into<String>) -> Self {
        let mut values = IndexMap::new();
        values.insert(SERVICE_FIELD.to_string(), Value::String(service.into()));
        values.insert(EMAIL_FIELD.to_string(), Value::String(email.into()));
        Self { values }
    }

    /// Provider name this identity came from
    #[must_use]
    pub fn service(&self) -> &str {
        self.get_str(SERVICE_FIELD).unwrap_or_default()
    }

    /// User's email address (empty when the provider did not disclose it)
    #[must_use]
    pub fn email(&self) -> &str {
        self.get_str(EMAIL_FIELD).unwrap_or_default()
    }

    /// Set a field, replacing any previous value
    ///
    /// `service` and `email` only accept string values; anything else is
    /// stored as its JSON text so both fields stay readable as strings.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let mut value = value.into();

        if (name == SERVICE_FIELD || name == EMAIL_FIELD) && !value.is_string() {
            value = Value::String(match value {
                Value::Null => String::new(),
                other => other.to_string(),
            });
        }

        self.values.insert(name, value);
        self
    }

    /// Get a field value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a field value as a string slice, if it is a string
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Check whether a field has been set
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate over fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields set
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: `service` and `email` are present from construction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert into an ordered JSON object
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Take the underlying ordered field map
    #[must_use]
    pub fn into_fields(self) -> IndexMap<String, Value> {
        self.values
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.email())
    }
}
