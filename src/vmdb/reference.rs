//! Resource references
//!
//! Turns whatever the caller used to name a VMDB object into the URL the
//! request goes to.

use crate::manageiq::error::VmdbError;
use serde::Deserialize;
use serde_json::{Map, Value};

const SLUG_SEPARATOR: &str = "::";

/// A caller-supplied pointer at a VMDB resource
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResourceReference {
    /// A resource object as returned by the API, carrying its own `href`
    Inline(Map<String, Value>),
    /// A path below the API root, or a `collection::id` slug
    Reference(String),
}

impl ResourceReference {
    /// Compute the request URL for this reference.
    ///
    /// Inline objects address themselves through their `href`. A string that
    /// splits into exactly two parts on `::` keeps only the id half; any other
    /// string is appended to `api_url` verbatim, so `a::b::c` is not a slug.
    pub fn resolve(&self, api_url: &str) -> Result<String, VmdbError> {
        match self {
            ResourceReference::Inline(object) => object
                .get("href")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    VmdbError::InvalidArguments(
                        "inline vmdb object has no 'href' field".to_string(),
                    )
                }),
            ResourceReference::Reference(reference) => {
                let parts: Vec<&str> = reference.split(SLUG_SEPARATOR).collect();
                let suffix = match parts.as_slice() {
                    [_, id] => *id,
                    _ => reference.as_str(),
                };
                Ok(format!("{}/{}", api_url, suffix))
            }
        }
    }

    /// The collection half of a `collection::id` slug. Not validated against
    /// anything, only reported in logs.
    pub fn collection_hint(&self) -> Option<&str> {
        let ResourceReference::Reference(reference) = self else {
            return None;
        };
        let parts: Vec<&str> = reference.split(SLUG_SEPARATOR).collect();
        match parts.as_slice() {
            [collection, _] => Some(*collection),
            _ => None,
        }
    }
}

impl From<&str> for ResourceReference {
    fn from(reference: &str) -> Self {
        Self::Reference(reference.to_string())
    }
}

impl From<Map<String, Value>> for ResourceReference {
    fn from(object: Map<String, Value>) -> Self {
        Self::Inline(object)
    }
}
