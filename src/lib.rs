//! Readerpulse - On-device personalization and experiment state engine
//!
//! Readerpulse keeps one client's personalization state entirely local: an
//! append-only interaction log, a profile derived by full replay, a weighted
//! recommendation scorer, a frozen-once experiment assignment store, and a
//! keyed cache layer, all persisted through a pluggable key-value backend.
//!
//! ## Modules
//!
//! - **Event Log + Profile**: record interactions, derive interest/engagement
//! - **Recommendation**: rank candidate content against the profile
//! - **Experiments**: deterministic-once variant assignment with counters
//! - **Cache Layer**: TTL-bounded and unbounded keyed stores

pub mod boundary;
pub mod cache;
pub mod engine;
pub mod error;
pub mod events;
pub mod experiment;
pub mod profile;
pub mod recommend;
pub mod storage;
pub mod stores;
pub mod types;

pub use boundary::{AnalyticsSink, NoopSink, TranslationService, Translator};
pub use cache::{composite_key, CacheEntry, KeyedCache};
pub use engine::PersonalizationEngine;
pub use error::StoreError;
pub use events::EventLog;
pub use experiment::{ExperimentResults, ExperimentStore, VariantStats};
pub use profile::ProfileAggregator;
pub use recommend::{RecommendConfig, Recommender};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use stores::{Comment, CommentStore, Notification, NotificationStore, TranslationCache};
pub use types::{Content, Interaction, InteractionKind, UserProfile};

/// Engine version embedded in analytics payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
