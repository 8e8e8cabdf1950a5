//! Core types for the readerpulse engine
//!
//! This module defines the data that flows through the engine: recorded
//! interactions, content metadata supplied by the host, and the derived
//! user profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of user action recorded against a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Read,
    Bookmark,
    Like,
    Share,
    Comment,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::View => "view",
            InteractionKind::Read => "read",
            InteractionKind::Bookmark => "bookmark",
            InteractionKind::Like => "like",
            InteractionKind::Share => "share",
            InteractionKind::Comment => "comment",
        }
    }
}

/// One recorded user action.
///
/// The kind determines which optional fields are meaningful: `duration_seconds`
/// and `scroll_depth_percent` accompany `Read` interactions only. Consumers
/// must not assume the optional fields are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Opaque identifier of the content item
    pub content_id: String,
    /// Action kind
    pub kind: InteractionKind,
    /// Capture time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Time spent reading, seconds (read only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// How far down the page the reader got, 0-100 (read only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_depth_percent: Option<f64>,
    /// Single topical label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Ordered topical labels
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Interaction {
    /// Build a minimal interaction with just an id, kind, and timestamp
    pub fn new(content_id: impl Into<String>, kind: InteractionKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            content_id: content_id.into(),
            kind,
            timestamp,
            duration_seconds: None,
            scroll_depth_percent: None,
            category: None,
            tags: Vec::new(),
        }
    }
}

/// Content item metadata as supplied by the host's content source.
///
/// The engine treats this as a read-only snapshot; it never queries the
/// content source itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub author: String,
    pub published_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

/// Aggregated interest/engagement summary derived from the interaction log.
///
/// Derived, never stored: recomputed in full from the log on each request
/// after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Accumulated interest weight per category label (values >= 0)
    pub interest_scores: HashMap<String, f64>,
    /// Content ids the user has viewed, first-seen order
    pub read_history: Vec<String>,
    /// Content ids the user has bookmarked, first-seen order
    pub bookmarked_ids: Vec<String>,
    /// Content ids the user has liked, first-seen order
    pub liked_ids: Vec<String>,
    /// Mean read duration over reads that carried one, seconds
    pub average_read_seconds: f64,
    /// Up to 3 most frequent hour-of-day buckets among timed reads
    pub preferred_hours: Vec<u32>,
    /// Normalized engagement score, 0-100
    pub engagement_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_interaction_kind_serialization() {
        let kind = InteractionKind::Bookmark;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"bookmark\"");

        let parsed: InteractionKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, InteractionKind::Bookmark);
    }

    #[test]
    fn test_interaction_deserialization_without_optional_fields() {
        let json = r#"{
            "content_id": "post-42",
            "kind": "view",
            "timestamp": "2024-03-01T10:00:00Z"
        }"#;

        let interaction: Interaction = serde_json::from_str(json).unwrap();
        assert_eq!(interaction.content_id, "post-42");
        assert_eq!(interaction.kind, InteractionKind::View);
        assert!(interaction.duration_seconds.is_none());
        assert!(interaction.category.is_none());
        assert!(interaction.tags.is_empty());
    }

    #[test]
    fn test_interaction_with_read_fields() {
        let json = r#"{
            "content_id": "post-7",
            "kind": "read",
            "timestamp": "2024-03-01T21:15:00Z",
            "duration_seconds": 120.0,
            "scroll_depth_percent": 85.0,
            "category": "rust",
            "tags": ["systems", "tutorial"]
        }"#;

        let interaction: Interaction = serde_json::from_str(json).unwrap();
        assert_eq!(interaction.duration_seconds, Some(120.0));
        assert_eq!(interaction.scroll_depth_percent, Some(85.0));
        assert_eq!(interaction.category.as_deref(), Some("rust"));
        assert_eq!(interaction.tags, vec!["systems", "tutorial"]);
    }

    #[test]
    fn test_empty_profile_is_zero_valued() {
        let profile = UserProfile::default();
        assert!(profile.interest_scores.is_empty());
        assert!(profile.read_history.is_empty());
        assert_eq!(profile.engagement_score, 0.0);
        assert_eq!(profile.average_read_seconds, 0.0);
    }

    #[test]
    fn test_interaction_new_defaults() {
        let interaction = Interaction::new("post-1", InteractionKind::Share, Utc::now());
        assert_eq!(interaction.kind, InteractionKind::Share);
        assert!(interaction.scroll_depth_percent.is_none());
    }
}
