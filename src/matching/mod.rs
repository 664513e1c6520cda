//! Address matching engine and scoring.
//!
//! - [`MatchEngine`]: main entry point, resolves a [`QueryAddress`] into a
//!   [`MatchResult`]
//! - [`MatchScore`]: per-field evidence behind one candidate's score
//! - [`MatchingConfig`]: every weight, floor and limit, loadable from JSON
//!
//! ## Matching Algorithm
//!
//! 1. **Repair**: a settlement or building typed into the street moves to
//!    its own field; post-office boxes in Kyiv short-circuit to the central
//!    post office
//! 2. **Retrieval**: city-prefix and region candidates, bounded
//! 3. **Scoring**: weighted city, street, building and postal evidence with
//!    hard floors
//! 4. **Ranking**: threshold, stable sort, truncate
//! 5. **Automatic pick**: exactly one high-confidence candidate that agrees
//!    with the query's postal index, building and region
//!
//! ## Scoring
//!
//! | Evidence | Effect (defaults) |
//! |----------|-------------------|
//! | City | 0.35 × similarity; below 0.85 the score is similarity × 0.2 and nothing else counts |
//! | Street | 0.35 × similarity; below 0.75 only 0.10 × similarity |
//! | Building | +0.25 exact, +0.10 partial, −0.10 requested but not served |
//! | Postal index | +0.05 equal, −0.02 different |
//! | Region | −0.30 below 0.80 similarity |
//! | Alignment | +0.10 when city and street ≥ 0.95 and the building is exact |
//!
//! ## Example
//!
//! ```rust
//! use addr_solver::{MatchEngine, QueryAddress, ReferenceIndex};
//! use addr_solver::core::record::{RecordFields, ReferenceRecord};
//!
//! let index = ReferenceIndex::from_records(vec![ReferenceRecord::new(RecordFields {
//!     city: "м. Київ".to_string(),
//!     street: "вул. Хрещатик".to_string(),
//!     buildings: "1, 3, 5".to_string(),
//!     postal_index: "01001".to_string(),
//!     ..RecordFields::default()
//! })]);
//!
//! let engine = MatchEngine::new(&index);
//! let query = QueryAddress::new().with_city("Київ").with_street("Хрещатик").with_building("1");
//! let result = engine.search(&query, None);
//!
//! assert_eq!(result.auto.unwrap().record.postal_index, "01001");
//! ```
//!
//! [`QueryAddress`]: crate::core::address::QueryAddress

pub mod auto;
pub mod cache;
pub mod config;
pub mod engine;
pub mod preprocess;
pub mod scoring;

pub use auto::AutoRejection;
pub use cache::{cache_key, CacheError, ResultCache};
pub use config::{ConfigError, MatchingConfig, ScoringThresholds, ScoringWeights};
pub use engine::{MatchEngine, MatchResult, ScoredCandidate};
pub use scoring::{BuildingMatch, MatchScore, PostalMatch};
