use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::bookmark::{BookmarkItem, UNSORTED_FOLDER};
use crate::types::errors::CaptureError;

/// A full new-bookmark payload produced by the capture extension.
///
/// Lives only in the hand-off buffer and the pending-import inbox; the
/// reconciler turns it into a [`BookmarkItem`] on merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEvent {
    #[serde(default)]
    pub id: String,
    pub natural_key: String,
    pub url: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub saved_at: i64,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_handle: String,
    #[serde(default)]
    pub author_pic: String,
    #[serde(default)]
    pub post_text: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub poster_url: String,
}

impl CaptureEvent {
    /// Validates the payload at the trust boundary.
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.natural_key.trim().is_empty() {
            return Err(CaptureError::Validation(
                "capture event is missing a natural key".to_string(),
            ));
        }
        if self.url.trim().is_empty() {
            return Err(CaptureError::Validation(format!(
                "capture event {} is missing a url",
                self.natural_key
            )));
        }
        Ok(())
    }

    /// Converts the event into a canonical bookmark, generating a record id
    /// if the extension did not supply one.
    pub fn into_bookmark(self) -> BookmarkItem {
        let folder = if self.folder.trim().is_empty() {
            UNSORTED_FOLDER.to_string()
        } else {
            self.folder
        };
        let id = if self.id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            self.id
        };
        BookmarkItem {
            id,
            natural_key: self.natural_key,
            url: self.url,
            folder,
            tags: self
                .tags
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            description: self.note,
            timestamp: self.saved_at,
            author_name: self.author_name,
            author_handle: self.author_handle,
            author_pic: self.author_pic,
            post_text: self.post_text,
            media_urls: self.media_urls,
            media_type: self.media_type,
            poster_url: self.poster_url,
            deleted_at: None,
        }
    }
}

/// A folder/tags/note patch for a bookmark that may already have been
/// captured, keyed by natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatch {
    pub natural_key: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note: String,
}

impl UpdatePatch {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.natural_key.trim().is_empty() {
            return Err(CaptureError::Validation(
                "update patch is missing a natural key".to_string(),
            ));
        }
        Ok(())
    }
}
