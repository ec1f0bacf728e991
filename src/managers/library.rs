//! Canonical in-memory library: bookmarks, folders, tags and trash.
//!
//! All state changes to the four collections go through intent methods on
//! [`Library`]; callers never reach into the vectors. The owner observes
//! mutations (to debounce persistence) by calling the intents and marking
//! itself dirty, so the library itself carries no timers or IO.

use tracing::debug;
use uuid::Uuid;

use crate::types::bookmark::{
    palette_color, sanitize_url, BookmarkItem, FolderItem, TagItem, UNSORTED_FOLDER,
};
use crate::types::config::SyncConfig;
use crate::types::errors::LibraryError;
use crate::types::sync::{BackupPayload, StateSnapshot};

/// The canonical collections of one signed-in (or anonymous) session.
#[derive(Debug, Default)]
pub struct Library {
    bookmarks: Vec<BookmarkItem>,
    folders: Vec<FolderItem>,
    tags: Vec<TagItem>,
    trash: Vec<BookmarkItem>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bookmarks(&self) -> &[BookmarkItem] {
        &self.bookmarks
    }

    pub fn folders(&self) -> &[FolderItem] {
        &self.folders
    }

    pub fn tags(&self) -> &[TagItem] {
        &self.tags
    }

    pub fn trash(&self) -> &[BookmarkItem] {
        &self.trash
    }

    /// Copies the current state of all four collections.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            bookmarks: self.bookmarks.clone(),
            folders: self.folders.clone(),
            tags: self.tags.clone(),
            trash: self.trash.clone(),
        }
    }

    /// Replaces all four collections wholesale, as a pull or migration does.
    pub fn replace_from_snapshot(&mut self, snapshot: StateSnapshot) {
        self.bookmarks = snapshot.bookmarks;
        self.folders = snapshot.folders;
        self.tags = snapshot.tags;
        self.trash = snapshot.trash;
    }

    pub fn find_by_natural_key(&self, natural_key: &str) -> Option<&BookmarkItem> {
        self.bookmarks
            .iter()
            .find(|b| b.natural_key == natural_key)
    }

    pub(crate) fn find_by_natural_key_mut(
        &mut self,
        natural_key: &str,
    ) -> Option<&mut BookmarkItem> {
        self.bookmarks
            .iter_mut()
            .find(|b| b.natural_key == natural_key)
    }

    // === Bookmark intents ===

    /// Adds a bookmark, rejecting a second capture of the same source post.
    /// The URL is normalized the way the manual-add form expects.
    pub fn add_bookmark(&mut self, mut item: BookmarkItem) -> Result<(), LibraryError> {
        if self.find_by_natural_key(&item.natural_key).is_some() {
            return Err(LibraryError::DuplicateNaturalKey(item.natural_key));
        }
        item.url = sanitize_url(&item.url);
        self.bookmarks.insert(0, item);
        Ok(())
    }

    /// Inserts a batch at the front, preserving the batch's own order.
    pub(crate) fn prepend_bookmarks(&mut self, items: Vec<BookmarkItem>) {
        for item in items.into_iter().rev() {
            self.bookmarks.insert(0, item);
        }
    }

    pub fn edit_bookmark(
        &mut self,
        id: &str,
        folder: String,
        tags: Vec<String>,
        description: String,
    ) -> Result<(), LibraryError> {
        let item = self
            .bookmarks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        item.folder = if folder.trim().is_empty() {
            UNSORTED_FOLDER.to_string()
        } else {
            folder
        };
        item.tags = tags
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        item.description = description;
        Ok(())
    }

    /// Moves a bookmark into the trash, stamping its deletion time.
    pub fn move_to_trash(&mut self, id: &str, now_ms: i64) -> Result<(), LibraryError> {
        let pos = self
            .bookmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let mut item = self.bookmarks.remove(pos);
        item.deleted_at = Some(now_ms);
        self.trash.insert(0, item);
        Ok(())
    }

    /// Restores a trashed bookmark, unless its source post was re-captured
    /// in the meantime.
    pub fn restore(&mut self, id: &str) -> Result<(), LibraryError> {
        let pos = self
            .trash
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let natural_key = self.trash[pos].natural_key.clone();
        if self.find_by_natural_key(&natural_key).is_some() {
            return Err(LibraryError::DuplicateNaturalKey(natural_key));
        }
        let mut item = self.trash.remove(pos);
        item.deleted_at = None;
        self.bookmarks.insert(0, item);
        Ok(())
    }

    /// Permanently deletes one trashed bookmark.
    pub fn purge(&mut self, id: &str) -> Result<(), LibraryError> {
        let pos = self
            .trash
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        self.trash.remove(pos);
        Ok(())
    }

    pub fn clear_trash(&mut self) -> usize {
        let purged = self.trash.len();
        self.trash.clear();
        purged
    }

    /// Load-time sweep: drops trashed bookmarks older than the retention
    /// window. Returns how many were purged.
    pub fn purge_expired(&mut self, now_ms: i64, retention_days: i64) -> usize {
        let before = self.trash.len();
        self.trash.retain(|b| !b.is_expired(now_ms, retention_days));
        let purged = before - self.trash.len();
        if purged > 0 {
            debug!(purged, "expired trash swept");
        }
        purged
    }

    // === Folder intents ===

    pub fn find_folder(&self, id: &str) -> Option<&FolderItem> {
        self.folders.iter().find(|f| f.id == id)
    }

    fn folder_name_taken(&self, name: &str, except_id: Option<&str>) -> bool {
        let lowered = name.trim().to_lowercase();
        self.folders
            .iter()
            .any(|f| Some(f.id.as_str()) != except_id && f.name.to_lowercase() == lowered)
    }

    pub fn create_folder(
        &mut self,
        name: &str,
        color: &str,
        parent_id: Option<String>,
    ) -> Result<String, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::ValidationError(
                "folder name is empty".to_string(),
            ));
        }
        if self.folder_name_taken(name, None) {
            return Err(LibraryError::DuplicateName(name.to_string()));
        }
        if let Some(parent) = parent_id.as_deref() {
            if self.find_folder(parent).is_none() {
                return Err(LibraryError::NotFound(parent.to_string()));
            }
        }
        let id = Uuid::new_v4().to_string();
        self.folders.push(FolderItem {
            id: id.clone(),
            name: name.to_string(),
            color: if color.is_empty() {
                palette_color(name).to_string()
            } else {
                color.to_string()
            },
            parent_id,
            is_pinned: false,
        });
        Ok(id)
    }

    /// Renames and recolors a folder. A rename cascades into every live and
    /// trashed bookmark filed under the old name.
    pub fn edit_folder(&mut self, id: &str, name: &str, color: &str) -> Result<(), LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::ValidationError(
                "folder name is empty".to_string(),
            ));
        }
        if self.folder_name_taken(name, Some(id)) {
            return Err(LibraryError::DuplicateName(name.to_string()));
        }
        let folder = self
            .folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let old_name = std::mem::replace(&mut folder.name, name.to_string());
        if !color.is_empty() {
            folder.color = color.to_string();
        }
        if old_name != name {
            for bookmark in self
                .bookmarks
                .iter_mut()
                .chain(self.trash.iter_mut())
                .filter(|b| b.folder == old_name)
            {
                bookmark.folder = name.to_string();
            }
        }
        Ok(())
    }

    pub fn set_folder_pinned(&mut self, id: &str, pinned: bool) -> Result<(), LibraryError> {
        let folder = self
            .folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        folder.is_pinned = pinned;
        Ok(())
    }

    /// Whether `id` sits somewhere below `ancestor_id` in the folder tree.
    fn is_descendant_of(&self, id: &str, ancestor_id: &str) -> bool {
        let mut current = Some(id);
        // Hop count bound guards against a pre-existing malformed cycle.
        for _ in 0..=self.folders.len() {
            match current {
                Some(cur) if cur == ancestor_id => return true,
                Some(cur) => {
                    current = self
                        .find_folder(cur)
                        .and_then(|f| f.parent_id.as_deref());
                }
                None => return false,
            }
        }
        false
    }

    /// Reparents a folder, rejecting moves that would make it its own
    /// ancestor (including moving it under itself).
    pub fn set_folder_parent(
        &mut self,
        id: &str,
        parent_id: Option<String>,
    ) -> Result<(), LibraryError> {
        if self.find_folder(id).is_none() {
            return Err(LibraryError::NotFound(id.to_string()));
        }
        if let Some(parent) = parent_id.as_deref() {
            if self.find_folder(parent).is_none() {
                return Err(LibraryError::NotFound(parent.to_string()));
            }
            if self.is_descendant_of(parent, id) {
                return Err(LibraryError::FolderCycle(id.to_string()));
            }
        }
        if let Some(folder) = self.folders.iter_mut().find(|f| f.id == id) {
            folder.parent_id = parent_id;
        }
        Ok(())
    }

    /// Deletes a folder: children are reparented to its parent, bookmarks
    /// filed under it fall back to Unsorted.
    pub fn delete_folder(&mut self, id: &str) -> Result<(), LibraryError> {
        let pos = self
            .folders
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let removed = self.folders.remove(pos);
        for folder in self
            .folders
            .iter_mut()
            .filter(|f| f.parent_id.as_deref() == Some(id))
        {
            folder.parent_id = removed.parent_id.clone();
        }
        for bookmark in self
            .bookmarks
            .iter_mut()
            .chain(self.trash.iter_mut())
            .filter(|b| b.folder == removed.name)
        {
            bookmark.folder = UNSORTED_FOLDER.to_string();
        }
        Ok(())
    }

    /// Names of a folder and everything below it, for subtree filtering.
    pub fn folder_and_descendant_names(&self, id: &str) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(folder) = self.find_folder(id) {
            names.push(folder.name.clone());
        } else {
            return names;
        }
        let mut frontier = vec![id.to_string()];
        while let Some(current) = frontier.pop() {
            for child in self
                .folders
                .iter()
                .filter(|f| f.parent_id.as_deref() == Some(current.as_str()))
            {
                names.push(child.name.clone());
                frontier.push(child.id.clone());
            }
        }
        names
    }

    // === Tag intents ===

    pub fn find_tag(&self, name: &str) -> Option<&TagItem> {
        let lowered = name.trim().to_lowercase();
        self.tags.iter().find(|t| t.name == lowered)
    }

    /// Creates a tag. Names are lowercased and unique.
    pub fn create_tag(&mut self, name: &str, color: &str) -> Result<String, LibraryError> {
        let lowered = name.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(LibraryError::ValidationError(
                "tag name is empty".to_string(),
            ));
        }
        if self.find_tag(&lowered).is_some() {
            return Err(LibraryError::DuplicateName(lowered));
        }
        let id = Uuid::new_v4().to_string();
        self.tags.push(TagItem {
            id: id.clone(),
            name: lowered.clone(),
            color: if color.is_empty() {
                palette_color(&lowered).to_string()
            } else {
                color.to_string()
            },
        });
        Ok(id)
    }

    /// Ensures a tag exists, creating it with a palette color when missing.
    /// Returns true when a tag was created.
    pub fn ensure_tag(&mut self, name: &str) -> bool {
        let lowered = name.trim().to_lowercase();
        if lowered.is_empty() || self.find_tag(&lowered).is_some() {
            return false;
        }
        self.tags.push(TagItem {
            id: Uuid::new_v4().to_string(),
            name: lowered.clone(),
            color: palette_color(&lowered).to_string(),
        });
        true
    }

    /// Renames and recolors a tag, cascading the rename into every bookmark
    /// carrying the old name.
    pub fn edit_tag(&mut self, id: &str, name: &str, color: &str) -> Result<(), LibraryError> {
        let lowered = name.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(LibraryError::ValidationError(
                "tag name is empty".to_string(),
            ));
        }
        if self
            .tags
            .iter()
            .any(|t| t.id != id && t.name == lowered)
        {
            return Err(LibraryError::DuplicateName(lowered));
        }
        let tag = self
            .tags
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let old_name = std::mem::replace(&mut tag.name, lowered.clone());
        if !color.is_empty() {
            tag.color = color.to_string();
        }
        if old_name != lowered {
            for bookmark in self.bookmarks.iter_mut().chain(self.trash.iter_mut()) {
                for t in bookmark.tags.iter_mut().filter(|t| **t == old_name) {
                    *t = lowered.clone();
                }
                bookmark.tags.dedup();
            }
        }
        Ok(())
    }

    /// Deletes a tag and strips it from every bookmark.
    pub fn delete_tag(&mut self, id: &str) -> Result<(), LibraryError> {
        let pos = self
            .tags
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let removed = self.tags.remove(pos);
        for bookmark in self.bookmarks.iter_mut().chain(self.trash.iter_mut()) {
            bookmark.tags.retain(|t| *t != removed.name);
        }
        Ok(())
    }

    // === Backup ===

    /// Serializes the library into the portable backup shape.
    pub fn export_backup(&self, export_date: &str) -> Result<String, LibraryError> {
        let payload = BackupPayload {
            bookmarks: to_values(&self.bookmarks)?,
            custom_folders: to_values(&self.folders)?,
            custom_tags: to_values(&self.tags)?,
            trash: to_values(&self.trash)?,
            export_date: export_date.to_string(),
            version: "2.0".to_string(),
        };
        serde_json::to_string_pretty(&payload)
            .map_err(|e| LibraryError::ValidationError(e.to_string()))
    }

    /// Replaces the library from a backup archive.
    ///
    /// The archive is checked before anything is touched: array shapes,
    /// required bookmark fields, and the projected size against the soft
    /// quota. A failed check leaves the library unchanged.
    pub fn import_backup(&mut self, json: &str, config: &SyncConfig) -> Result<(), LibraryError> {
        if json.len() > config.soft_quota_bytes {
            return Err(LibraryError::QuotaError(format!(
                "archive is {} bytes, limit is {}",
                json.len(),
                config.soft_quota_bytes
            )));
        }
        let payload: BackupPayload = serde_json::from_str(json)
            .map_err(|e| LibraryError::ValidationError(e.to_string()))?;
        for item in payload.bookmarks.iter().chain(payload.trash.iter()) {
            let has_key = |field: &str| {
                matches!(item.get(field), Some(serde_json::Value::String(s)) if !s.is_empty())
            };
            if !has_key("id") || !has_key("naturalKey") {
                return Err(LibraryError::ValidationError(
                    "bookmark entry is missing id or naturalKey".to_string(),
                ));
            }
        }
        let snapshot = StateSnapshot {
            bookmarks: from_values(payload.bookmarks)?,
            folders: from_values(payload.custom_folders)?,
            tags: from_values(payload.custom_tags)?,
            trash: from_values(payload.trash)?,
        };
        self.replace_from_snapshot(snapshot);
        Ok(())
    }
}

fn to_values<T: serde::Serialize>(items: &[T]) -> Result<Vec<serde_json::Value>, LibraryError> {
    items
        .iter()
        .map(|item| {
            serde_json::to_value(item).map_err(|e| LibraryError::ValidationError(e.to_string()))
        })
        .collect()
}

fn from_values<T: serde::de::DeserializeOwned>(
    values: Vec<serde_json::Value>,
) -> Result<Vec<T>, LibraryError> {
    values
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|e| LibraryError::ValidationError(e.to_string()))
        })
        .collect()
}
