//! Engine orchestration
//!
//! `PersonalizationEngine` ties the pieces together: interactions append to
//! the event log, the profile is recomputed from the full log on demand, and
//! recommendations are scored against that profile. Constructed once at
//! application start and passed by reference to consumers; there is no
//! process-global instance.

use crate::boundary::{AnalyticsSink, NoopSink};
use crate::events::EventLog;
use crate::profile::ProfileAggregator;
use crate::recommend::{RecommendConfig, Recommender};
use crate::storage::KeyValueStore;
use crate::types::{Content, Interaction, UserProfile};
use chrono::{DateTime, Utc};

/// Stateful personalization engine over one client's local storage
pub struct PersonalizationEngine {
    log: EventLog,
    recommender: Recommender,
    analytics: Box<dyn AnalyticsSink>,
}

impl PersonalizationEngine {
    /// Create an engine with default scoring config and no analytics
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self::with_config(backend, RecommendConfig::default())
    }

    pub fn with_config(backend: Box<dyn KeyValueStore>, config: RecommendConfig) -> Self {
        Self {
            log: EventLog::open(backend),
            recommender: Recommender::new(config),
            analytics: Box::new(NoopSink),
        }
    }

    /// Replace the analytics sink
    pub fn with_analytics(mut self, analytics: Box<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Swap in a seeded recommender for deterministic output
    pub fn with_seeded_recommender(mut self, config: RecommendConfig, seed: u64) -> Self {
        self.recommender = Recommender::with_seed(config, seed);
        self
    }

    /// Record one interaction: append, persist, and emit a fire-and-forget
    /// analytics event
    pub fn record(&mut self, interaction: Interaction) {
        self.analytics.emit(
            "interaction_recorded",
            &serde_json::json!({
                "content_id": interaction.content_id,
                "kind": interaction.kind.as_str(),
                "engine_version": crate::ENGINE_VERSION,
            }),
        );
        self.log.record(interaction);
    }

    /// Derive the profile by replaying the full interaction log
    pub fn profile(&self) -> UserProfile {
        ProfileAggregator::recompute(self.log.interactions())
    }

    /// Rank candidates against the current profile
    pub fn recommend(
        &mut self,
        candidates: &[Content],
        excluding: Option<&Content>,
        now: DateTime<Utc>,
    ) -> Vec<Content> {
        let profile = self.profile();
        self.recommender
            .recommend(candidates, excluding, &profile, now)
    }

    /// All recorded interactions, oldest first
    pub fn interactions(&self) -> &[Interaction] {
        self.log.interactions()
    }

    /// Drop the full interaction history
    pub fn clear_history(&mut self) {
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::InteractionKind;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn make_engine() -> PersonalizationEngine {
        PersonalizationEngine::new(Box::new(MemoryStore::new())).with_seeded_recommender(
            RecommendConfig {
                max_recommendations: 3,
                personalized_weight: 1.0,
                diversity_factor: 0.0,
            },
            11,
        )
    }

    fn make_content(id: &str, category: &str, days_old: i64) -> Content {
        Content {
            id: id.to_string(),
            title: format!("Article {}", id),
            categories: vec![category.to_string()],
            author: "alice".to_string(),
            published_at: now() - Duration::days(days_old),
            excerpt: None,
        }
    }

    #[test]
    fn test_record_then_profile_reflects_interaction() {
        let mut engine = make_engine();
        let mut read = Interaction::new("post-1", InteractionKind::Read, now());
        read.duration_seconds = Some(120.0);
        read.category = Some("rust".to_string());
        engine.record(read);

        let profile = engine.profile();
        assert_eq!(profile.interest_scores["rust"], 3.0);
        assert_eq!(profile.average_read_seconds, 120.0);
    }

    #[test]
    fn test_profile_requests_are_pure_between_mutations() {
        let mut engine = make_engine();
        engine.record(Interaction::new("post-1", InteractionKind::View, now()));

        assert_eq!(engine.profile(), engine.profile());
    }

    #[test]
    fn test_recommend_uses_interaction_history() {
        let mut engine = make_engine();
        let mut read = Interaction::new("post-1", InteractionKind::Read, now());
        read.category = Some("rust".to_string());
        engine.record(read);

        let candidates = vec![
            make_content("r", "rust", 1),
            make_content("g", "gardening", 1),
        ];
        let result = engine.recommend(&candidates, None, now());
        assert_eq!(result[0].id, "r");
    }

    #[test]
    fn test_clear_history_resets_profile() {
        let mut engine = make_engine();
        engine.record(Interaction::new("post-1", InteractionKind::View, now()));
        engine.clear_history();

        assert_eq!(engine.profile(), UserProfile::default());
        assert!(engine.interactions().is_empty());
    }

    #[test]
    fn test_analytics_sink_sees_recorded_interactions() {
        struct CapturingSink {
            events: Rc<RefCell<Vec<String>>>,
        }
        impl crate::boundary::AnalyticsSink for CapturingSink {
            fn emit(&self, event: &str, _properties: &serde_json::Value) {
                self.events.borrow_mut().push(event.to_string());
            }
        }

        let events = Rc::new(RefCell::new(Vec::new()));
        let mut engine = PersonalizationEngine::new(Box::new(MemoryStore::new()))
            .with_analytics(Box::new(CapturingSink {
                events: events.clone(),
            }));

        engine.record(Interaction::new("post-1", InteractionKind::Like, now()));
        assert_eq!(events.borrow().as_slice(), ["interaction_recorded"]);
    }
}
