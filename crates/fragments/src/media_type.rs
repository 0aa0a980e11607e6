//! MediaType: a Content-Type value parsed once into essence and parameters.
//!
//! `text/HTML; charset="utf-8"` keeps its original spelling for display and
//! storage, while the rest of the crate compares only the lower-cased
//! essence (`text/html`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::FragmentError;

/// A parsed Content-Type value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    raw: String,
    essence: String,
    parameters: Vec<(String, String)>,
}

impl MediaType {
    /// Parse a Content-Type header value.
    pub fn parse(value: &str) -> Result<Self, FragmentError> {
        let raw = value.trim();
        let mut parts = raw.split(';');

        let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.split_once('/') {
            Some((ty, subtype))
                if !ty.is_empty() && !subtype.is_empty() && !subtype.contains('/') => {}
            _ => {
                return Err(FragmentError::InvalidArgument(format!(
                    "invalid media type: {value:?}"
                )))
            }
        }

        let mut parameters = Vec::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let Some((name, val)) = param.split_once('=') else {
                return Err(FragmentError::InvalidArgument(format!(
                    "invalid media type parameter {param:?} in {value:?}"
                )));
            };
            let val = val.trim();
            let val = val
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(val);
            parameters.push((name.trim().to_ascii_lowercase(), val.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            essence,
            parameters,
        })
    }

    /// The base `type/subtype`, lower-cased, parameters stripped.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Parameter value by (case-insensitive) name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// The value exactly as supplied (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for MediaType {
    type Err = FragmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for MediaType {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
