use serde::{Deserialize, Serialize};

/// Fixed color palette used when a tag or folder is created without an
/// explicit color (e.g. lazily from a capture update).
pub const TAG_COLORS: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#06b6d4", "#f97316",
];

/// Picks a palette color for a name. Hash-based so the same name always
/// gets the same color, without carrying per-item color state around.
pub fn palette_color(name: &str) -> &'static str {
    let h = name
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    TAG_COLORS[h % TAG_COLORS.len()]
}

/// Folder name a bookmark belongs to when it was never filed anywhere.
pub const UNSORTED_FOLDER: &str = "Unsorted";

/// Represents a saved bookmark.
///
/// `id` is the locally generated record id and is never reassigned.
/// `natural_key` is the stable identifier of the source post (tweet id,
/// reddit post id) and is what capture deduplication keys on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkItem {
    pub id: String,
    pub natural_key: String,
    pub url: String,
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timestamp: i64,
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
    /// Set only while the bookmark sits in the trash collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

fn default_folder() -> String {
    UNSORTED_FOLDER.to_string()
}

impl BookmarkItem {
    /// Whether this (trashed) bookmark has outlived the retention window.
    pub fn is_expired(&self, now_ms: i64, retention_days: i64) -> bool {
        match self.deleted_at {
            Some(deleted_at) => now_ms - deleted_at > retention_days * 24 * 60 * 60 * 1000,
            None => false,
        }
    }
}

/// Represents a folder for organizing bookmarks.
///
/// Folders form a tree through `parent_id` over a flat list; the tree is
/// kept acyclic by the library's reparenting check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

/// Represents a user-defined tag. Tag names are stored lowercased and are
/// unique case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// Extracts the natural key from a source-post URL.
///
/// Twitter/X links carry it as `status/<digits>`, reddit links as
/// `comments/<id>`. Returns `None` for anything else.
pub fn natural_key_from_url(url: &str) -> Option<String> {
    if url.contains("reddit.com") {
        let rest = url.split("comments/").nth(1)?;
        let key: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        return if key.is_empty() { None } else { Some(key) };
    }
    let rest = url.split("status/").nth(1)?;
    let key: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Normalizes a user-entered URL: trims whitespace and defaults to https.
pub fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
