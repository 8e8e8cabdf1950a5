//! Typed stores built on the keyed cache layer
//!
//! - `TranslationCache`: TTL-bounded (7 days), keyed by language pair and a
//!   source-text prefix
//! - `CommentStore`: unbounded, comments grouped per content id with a
//!   moderation flag
//! - `NotificationStore`: unbounded history list; the caller caps its length

use crate::cache::{composite_key, KeyedCache};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days a cached translation stays servable
pub const TRANSLATION_TTL_DAYS: i64 = 7;

/// Characters of source text used in the translation cache key
const TRANSLATION_KEY_PREFIX_LEN: usize = 50;

const TRANSLATION_STORE_KEY: &str = "readerpulse:translations";
const COMMENT_STORE_KEY: &str = "readerpulse:comments";
const NOTIFICATION_STORE_KEY: &str = "readerpulse:notifications";
const NOTIFICATION_HISTORY_KEY: &str = "history";

/// TTL-bounded cache of translated strings.
///
/// Entries older than `TRANSLATION_TTL_DAYS` are purged lazily and never
/// served, forcing a fresh boundary call.
pub struct TranslationCache {
    cache: KeyedCache<String>,
}

impl TranslationCache {
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        Self {
            cache: KeyedCache::open(
                TRANSLATION_STORE_KEY,
                Some(Duration::days(TRANSLATION_TTL_DAYS)),
                backend,
            ),
        }
    }

    pub fn get(&mut self, text: &str, source_lang: &str, target_lang: &str) -> Option<String> {
        self.cache.get(&translation_key(text, source_lang, target_lang))
    }

    pub fn put(&mut self, text: &str, source_lang: &str, target_lang: &str, translated: String) {
        self.cache
            .put(translation_key(text, source_lang, target_lang), translated);
    }

    pub fn evict_expired(&mut self) {
        self.cache.evict_expired();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// `source:target:<text prefix>` — deterministic and stable across sessions
fn translation_key(text: &str, source_lang: &str, target_lang: &str) -> String {
    let prefix: String = text.chars().take(TRANSLATION_KEY_PREFIX_LEN).collect();
    composite_key(&[source_lang, target_lang, &prefix])
}

/// One reader comment on a content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content_id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Moderation state; new comments start unapproved
    pub approved: bool,
}

/// Unbounded per-content comment store with a moderation flag
pub struct CommentStore {
    cache: KeyedCache<Vec<Comment>>,
}

impl CommentStore {
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        Self {
            cache: KeyedCache::open(COMMENT_STORE_KEY, None, backend),
        }
    }

    /// Append a pending comment and return it
    pub fn add(
        &mut self,
        content_id: &str,
        author: impl Into<String>,
        body: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Comment {
        let comment = Comment {
            id: Uuid::new_v4(),
            content_id: content_id.to_string(),
            author: author.into(),
            body: body.into(),
            created_at: now,
            approved: false,
        };

        let mut comments = self.cache.get(content_id).unwrap_or_default();
        comments.push(comment.clone());
        self.cache.put(content_id, comments);
        comment
    }

    /// All comments for a content item, oldest first
    pub fn for_content(&mut self, content_id: &str) -> Vec<Comment> {
        self.cache.get(content_id).unwrap_or_default()
    }

    /// Mark a comment approved; false when the comment is unknown
    pub fn approve(&mut self, content_id: &str, comment_id: Uuid) -> bool {
        let mut comments = match self.cache.get(content_id) {
            Some(comments) => comments,
            None => return false,
        };
        let Some(comment) = comments.iter_mut().find(|c| c.id == comment_id) else {
            return false;
        };
        comment.approved = true;
        self.cache.put(content_id, comments);
        true
    }

    /// Delete a comment; false when the comment is unknown
    pub fn remove(&mut self, content_id: &str, comment_id: Uuid) -> bool {
        let mut comments = match self.cache.get(content_id) {
            Some(comments) => comments,
            None => return false,
        };
        let before = comments.len();
        comments.retain(|c| c.id != comment_id);
        if comments.len() == before {
            return false;
        }
        self.cache.put(content_id, comments);
        true
    }
}

/// One in-app notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// Unbounded notification history.
///
/// The store itself never evicts; callers pass the cap they want on `push`.
pub struct NotificationStore {
    cache: KeyedCache<Vec<Notification>>,
}

impl NotificationStore {
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        Self {
            cache: KeyedCache::open(NOTIFICATION_STORE_KEY, None, backend),
        }
    }

    /// Append a notification, trimming the oldest entries past `max_history`
    pub fn push(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        now: DateTime<Utc>,
        max_history: usize,
    ) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            created_at: now,
            read: false,
        };

        let mut history = self.all();
        history.push(notification.clone());
        if history.len() > max_history {
            let excess = history.len() - max_history;
            history.drain(..excess);
        }
        self.cache.put(NOTIFICATION_HISTORY_KEY, history);
        notification
    }

    /// Full history, oldest first
    pub fn all(&mut self) -> Vec<Notification> {
        self.cache.get(NOTIFICATION_HISTORY_KEY).unwrap_or_default()
    }

    /// Mark one notification read; false when unknown
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        let mut history = self.all();
        let Some(notification) = history.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        notification.read = true;
        self.cache.put(NOTIFICATION_HISTORY_KEY, history);
        true
    }

    pub fn unread_count(&mut self) -> usize {
        self.all().iter().filter(|n| !n.read).count()
    }
}
