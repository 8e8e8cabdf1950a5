//! Recommendation scoring
//!
//! This module ranks candidate content against the derived user profile:
//! - Category affinity against accumulated interest weights
//! - Similarity to the currently open item, when one is given
//! - History penalty for already-viewed items
//! - Publish-date recency with 30-day exponential decay
//!
//! Scores blend a small random jitter scaled by `1 - personalized_weight`
//! so thin personalization data does not produce repetitive output. The
//! random source is injectable for deterministic tests.

use crate::types::{Content, UserProfile};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

const AFFINITY_WEIGHT: f64 = 0.30;
const SIMILARITY_WEIGHT: f64 = 0.25;
const HISTORY_WEIGHT: f64 = 0.20;
const RECENCY_WEIGHT: f64 = 0.15;
const POPULARITY_WEIGHT: f64 = 0.10;

/// Flat stand-in until real view/like counters exist per content item
const POPULARITY_PLACEHOLDER: f64 = 0.5;

/// Decay constant for the recency signal, days
const RECENCY_DECAY_DAYS: f64 = 30.0;

/// Jitter amplitude before the `1 - personalized_weight` scale is applied
const JITTER_SCALE: f64 = 0.1;

/// Tuning knobs for the recommendation scorer
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    /// Upper bound on the number of returned items
    pub max_recommendations: usize,
    /// How much of the score is personalization vs jitter (0-1)
    pub personalized_weight: f64,
    /// Probability of preferring an item that introduces a new category over
    /// the top-ranked item (0-1); 0 keeps output at pure score rank
    pub diversity_factor: f64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            max_recommendations: 5,
            personalized_weight: 0.7,
            diversity_factor: 0.3,
        }
    }
}

/// Recommendation scorer with an injectable random source
pub struct Recommender {
    config: RecommendConfig,
    rng: StdRng,
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(RecommendConfig::default())
    }
}

impl Recommender {
    pub fn new(config: RecommendConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a scorer with a fixed seed for deterministic output
    pub fn with_seed(config: RecommendConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Rank candidates and return up to `max_recommendations` items.
    ///
    /// The `excluding` item never appears in the output. Candidates whose
    /// final score lands at or below zero are ineligible: already-viewed
    /// items carry a hard -1 history signal, so they only resurface when
    /// their other signals outweigh it.
    pub fn recommend(
        &mut self,
        candidates: &[Content],
        excluding: Option<&Content>,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> Vec<Content> {
        let mut seen_ids = HashSet::new();
        let mut scored: Vec<(Content, f64)> = Vec::new();

        for candidate in candidates {
            if let Some(current) = excluding {
                if candidate.id == current.id {
                    continue;
                }
            }
            if !seen_ids.insert(candidate.id.clone()) {
                continue;
            }

            let score = self.score(candidate, excluding, profile, now);
            if score > 0.0 {
                scored.push((candidate.clone(), score));
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        self.select_diverse(scored)
    }

    fn score(
        &mut self,
        candidate: &Content,
        excluding: Option<&Content>,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> f64 {
        let mut score = AFFINITY_WEIGHT * category_affinity(candidate, profile)
            + HISTORY_WEIGHT * history_signal(candidate, profile)
            + RECENCY_WEIGHT * recency_score(candidate.published_at, now)
            + POPULARITY_WEIGHT * POPULARITY_PLACEHOLDER;

        if let Some(current) = excluding {
            score += SIMILARITY_WEIGHT * similarity_score(candidate, current);
        }

        let jitter: f64 = self.rng.gen::<f64>() * JITTER_SCALE;
        score + jitter * (1.0 - self.config.personalized_weight)
    }

    /// Greedy selection pass: with probability `diversity_factor`, prefer the
    /// highest-scored item that introduces a category not yet represented;
    /// otherwise take the top remaining item. Slots left by the diversity
    /// scan fill by pure score order.
    fn select_diverse(&mut self, mut ranked: Vec<(Content, f64)>) -> Vec<Content> {
        let mut selected: Vec<Content> = Vec::new();
        let mut represented: HashSet<String> = HashSet::new();

        while selected.len() < self.config.max_recommendations && !ranked.is_empty() {
            let pick = if self.rng.gen::<f64>() < self.config.diversity_factor {
                ranked
                    .iter()
                    .position(|(content, _)| {
                        content.categories.iter().any(|c| !represented.contains(c))
                    })
                    .unwrap_or(0)
            } else {
                0
            };

            let (content, _) = ranked.remove(pick);
            represented.extend(content.categories.iter().cloned());
            selected.push(content);
        }

        selected
    }
}

/// Category affinity: accumulated interest over the candidate's categories,
/// relative to the profile's strongest interest. Zero when no interests exist.
fn category_affinity(candidate: &Content, profile: &UserProfile) -> f64 {
    let max_interest = profile
        .interest_scores
        .values()
        .cloned()
        .fold(0.0_f64, f64::max);
    if max_interest <= 0.0 {
        return 0.0;
    }

    let total: f64 = candidate
        .categories
        .iter()
        .filter_map(|c| profile.interest_scores.get(c))
        .sum();
    (total / max_interest).min(1.0)
}

/// Similarity to the currently open item: category overlap, title token
/// overlap, and shared authorship
fn similarity_score(candidate: &Content, current: &Content) -> f64 {
    let candidate_categories: HashSet<String> = candidate.categories.iter().cloned().collect();
    let current_categories: HashSet<String> = current.categories.iter().cloned().collect();
    let category_overlap = jaccard(&candidate_categories, &current_categories);
    let title_overlap = jaccard(
        &tokenize_title(&candidate.title),
        &tokenize_title(&current.title),
    );
    let same_author = if candidate.author == current.author {
        1.0
    } else {
        0.0
    };

    0.5 * category_overlap + 0.3 * title_overlap + 0.2 * same_author
}

/// History signal: hard -1 for already-viewed items, small nominal boost
/// otherwise
fn history_signal(candidate: &Content, profile: &UserProfile) -> f64 {
    if profile.read_history.iter().any(|id| *id == candidate.id) {
        -1.0
    } else {
        0.1
    }
}

/// Recency: exponential decay, ~37% relevance at 30 days since publish
fn recency_score(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - published_at).num_seconds() as f64 / 86_400.0;
    (-days.max(0.0) / RECENCY_DECAY_DAYS).exp()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

fn tokenize_title(title: &str) -> HashSet<String> {
    title
        .split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}
