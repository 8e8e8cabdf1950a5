//! Profile aggregation
//!
//! This module derives the user profile from the interaction log:
//! - Interest weights per category, weighted by action kind
//! - View/bookmark/like membership sets
//! - Read-duration and preferred-hour statistics
//! - A normalized engagement score
//!
//! Aggregation is a pure function of the full log. The profile is never
//! patched incrementally; correctness over efficiency at local-data scale.

use crate::types::{Interaction, InteractionKind, UserProfile};
use chrono::Timelike;
use std::collections::HashMap;

/// Number of preferred-hour buckets reported
const PREFERRED_HOUR_COUNT: usize = 3;

/// Profile aggregator for replaying the interaction log
pub struct ProfileAggregator;

impl ProfileAggregator {
    /// Recompute the full profile from the interaction log.
    ///
    /// Total function: an empty log yields a zero-valued profile.
    pub fn recompute(events: &[Interaction]) -> UserProfile {
        let mut profile = UserProfile::default();
        let mut read_durations: Vec<f64> = Vec::new();
        let mut hour_counts: HashMap<u32, u32> = HashMap::new();
        let mut views = 0u64;

        for event in events {
            if let Some(category) = &event.category {
                *profile.interest_scores.entry(category.clone()).or_insert(0.0) +=
                    interest_weight(event.kind);
            }

            match event.kind {
                InteractionKind::View => {
                    views += 1;
                    push_unique(&mut profile.read_history, &event.content_id);
                }
                InteractionKind::Bookmark => {
                    push_unique(&mut profile.bookmarked_ids, &event.content_id);
                }
                InteractionKind::Like => {
                    push_unique(&mut profile.liked_ids, &event.content_id);
                }
                InteractionKind::Read => {
                    if let Some(duration) = event.duration_seconds {
                        read_durations.push(duration);
                        *hour_counts.entry(event.timestamp.hour()).or_insert(0) += 1;
                    }
                }
                InteractionKind::Share | InteractionKind::Comment => {}
            }
        }

        profile.average_read_seconds = if read_durations.is_empty() {
            0.0
        } else {
            read_durations.iter().sum::<f64>() / read_durations.len() as f64
        };
        profile.preferred_hours = top_hours(&hour_counts);
        profile.engagement_score = compute_engagement_score(
            profile.bookmarked_ids.len() as u64,
            profile.liked_ids.len() as u64,
            views,
        );

        profile
    }
}

/// Interest weight contributed by one action kind.
/// Heavier actions signal stronger interest.
fn interest_weight(kind: InteractionKind) -> f64 {
    match kind {
        InteractionKind::View => 1.0,
        InteractionKind::Read => 3.0,
        InteractionKind::Like => 4.0,
        InteractionKind::Bookmark => 5.0,
        InteractionKind::Share => 6.0,
        InteractionKind::Comment => 7.0,
    }
}

/// Engagement score: bookmark- and like-heavy activity relative to raw views,
/// scaled to 0-100
fn compute_engagement_score(bookmarks: u64, likes: u64, views: u64) -> f64 {
    let raw = 10.0 * (5 * bookmarks + 3 * likes + views) as f64 / views.max(1) as f64;
    raw.min(100.0)
}

/// Top hour-of-day buckets by frequency, ties broken by smaller hour
fn top_hours(hour_counts: &HashMap<u32, u32>) -> Vec<u32> {
    let mut hours: Vec<(u32, u32)> = hour_counts.iter().map(|(h, c)| (*h, *c)).collect();
    hours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    hours
        .into_iter()
        .take(PREFERRED_HOUR_COUNT)
        .map(|(h, _)| h)
        .collect()
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}
