//! The fragment record and its read-time view.
//!
//! A [`Fragment`] serializes to exactly `{id, ownerId, created, updated,
//! type, size}`. That shape is what the metadata store round-trips.
//! Derived values such as `formats` live on [`FragmentInfo`] and are never
//! persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ContentKind;
use crate::error::{FragmentError, Result};
use crate::media_type::MediaType;

/// Metadata for one owner-scoped blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub id: String,
    pub owner_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(rename = "type")]
    pub content_type: MediaType,
    pub size: u64,
}

impl Fragment {
    /// Build a fragment, validating the owner and content type.
    ///
    /// A missing `id` gets a random UUID; `created` and `updated` are set to now.
    pub fn new(owner_id: &str, id: Option<&str>, content_type: &str, size: u64) -> Result<Self> {
        if owner_id.trim().is_empty() {
            return Err(FragmentError::InvalidArgument("ownerId is required".to_string()));
        }
        if content_type.trim().is_empty() {
            return Err(FragmentError::InvalidArgument("type is required".to_string()));
        }
        if id.is_some_and(|id| id.trim().is_empty()) {
            return Err(FragmentError::InvalidArgument("id must not be empty".to_string()));
        }

        let content_type = MediaType::parse(content_type)?;
        if ContentKind::from_media_type(&content_type).is_none() {
            return Err(FragmentError::UnsupportedType(content_type.essence().to_string()));
        }

        let now = Utc::now();
        Ok(Self {
            id: id.map(str::to_string).unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: owner_id.to_string(),
            created: now,
            updated: now,
            content_type,
            size,
        })
    }

    /// Base MIME type, e.g. `text/html` for `text/html; charset=utf-8`.
    pub fn mime_type(&self) -> &str {
        self.content_type.essence()
    }

    /// Catalog entry for this fragment's type.
    ///
    /// `None` only when `content_type` was assigned directly to something
    /// outside the catalog; [`Fragment::new`] and the repository reject those.
    pub fn kind(&self) -> Option<ContentKind> {
        ContentKind::from_media_type(&self.content_type)
    }

    /// True for every catalog kind that is not an image, JSON and YAML included.
    pub fn is_text(&self) -> bool {
        self.kind().is_some_and(ContentKind::is_text)
    }

    /// MIME types this fragment can be served as.
    pub fn formats(&self) -> Vec<&'static str> {
        self.kind()
            .map(|kind| kind.conversions().iter().map(|k| k.mime()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn touch(&mut self) {
        let now = Utc::now();
        // keep `updated` strictly monotonic even on coarse clocks
        self.updated = if now > self.updated {
            now
        } else {
            self.updated + chrono::Duration::microseconds(1)
        };
    }

    pub fn info(&self) -> FragmentInfo {
        FragmentInfo::from(self)
    }
}

/// A fragment plus the formats it can be converted into.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentInfo {
    #[serde(flatten)]
    pub fragment: Fragment,
    pub formats: Vec<&'static str>,
}

impl From<&Fragment> for FragmentInfo {
    fn from(fragment: &Fragment) -> Self {
        Self {
            fragment: fragment.clone(),
            formats: fragment.formats(),
        }
    }
}

impl From<Fragment> for FragmentInfo {
    fn from(fragment: Fragment) -> Self {
        let formats = fragment.formats();
        Self { fragment, formats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new_generates_id_and_timestamps() {
        let fragment = Fragment::new("owner1", None, "text/plain", 0).unwrap();
        assert!(Uuid::parse_str(&fragment.id).is_ok());
        assert_eq!(fragment.owner_id, "owner1");
        assert_eq!(fragment.created, fragment.updated);
        assert_eq!(fragment.size, 0);
    }

    #[test]
    fn test_new_keeps_supplied_id() {
        let fragment = Fragment::new("owner1", Some("my-id"), "text/markdown", 10).unwrap();
        assert_eq!(fragment.id, "my-id");
    }

    #[test]
    fn test_missing_owner_or_type_is_invalid() {
        let err = Fragment::new("", None, "text/plain", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = Fragment::new("owner1", None, "", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = Fragment::new("owner1", Some(""), "text/plain", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_unsupported_type() {
        let err = Fragment::new("owner1", None, "application/msword", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert!(err.to_string().contains("application/msword"));
    }

    #[test]
    fn test_type_with_charset() {
        let fragment = Fragment::new("owner1", None, "text/html; charset=utf-8", 0).unwrap();
        assert_eq!(fragment.mime_type(), "text/html");
        assert_eq!(fragment.content_type.to_string(), "text/html; charset=utf-8");
        assert!(fragment.is_text());
        assert_eq!(fragment.formats(), vec!["text/html", "text/plain"]);
    }

    #[test]
    fn test_image_is_not_text() {
        let fragment = Fragment::new("owner1", None, "image/png", 0).unwrap();
        assert!(!fragment.is_text());
        assert_eq!(fragment.formats().len(), 5);
    }

    #[test]
    fn test_structured_text_agrees_with_catalog() {
        for mime in ["application/json", "application/yaml", "text/csv", "image/webp"] {
            let fragment = Fragment::new("owner1", None, mime, 0).unwrap();
            let kind = fragment.kind().unwrap();
            assert_eq!(fragment.is_text(), kind.is_text(), "{mime}");
        }
        let json = Fragment::new("owner1", None, "application/json", 0).unwrap();
        assert!(json.is_text());
    }

    #[test]
    fn test_uncatalogued_type_has_no_kind() {
        let mut fragment = Fragment::new("owner1", None, "text/plain", 0).unwrap();
        fragment.content_type = MediaType::parse("application/msword").unwrap();
        assert_eq!(fragment.kind(), None);
        assert!(!fragment.is_text());
        assert!(fragment.formats().is_empty());
    }

    #[test]
    fn test_record_shape() {
        let fragment = Fragment::new("owner1", Some("abc"), "text/plain; charset=utf-8", 3).unwrap();
        let value = serde_json::to_value(&fragment).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["created", "id", "ownerId", "size", "type", "updated"]);
        assert_eq!(obj["type"], "text/plain; charset=utf-8");
        assert_eq!(obj["ownerId"], "owner1");

        let restored: Fragment = serde_json::from_value(value).unwrap();
        assert_eq!(restored, fragment);
    }

    #[test]
    fn test_info_adds_formats() {
        let fragment = Fragment::new("owner1", Some("abc"), "text/csv", 3).unwrap();
        let value = serde_json::to_value(fragment.info()).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(
            value["formats"],
            serde_json::json!(["text/csv", "application/json", "text/plain"])
        );
    }

    #[test]
    fn test_touch_advances_updated() {
        let mut fragment = Fragment::new("owner1", None, "text/plain", 0).unwrap();
        let before = fragment.updated;
        fragment.touch();
        assert!(fragment.updated > before);
        assert_eq!(fragment.created, before);
    }
}
