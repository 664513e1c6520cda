//! # addr-solver
//!
//! A library for resolving free-text Ukrainian postal addresses against the
//! national postal gazetteer.
//!
//! Addresses typed by people rarely match the register letter for letter:
//! settlement and street type prefixes come and go (`м.`, `вул.`, `бульв.`),
//! first names are abbreviated (`Л. Українки`), Russian spellings creep in
//! (`Киев`), cities have been renamed, and building numbers end up in the
//! street column.
//!
//! `addr-solver` canonicalizes both sides, retrieves a bounded candidate set
//! through a prefix index, scores each candidate with weighted fuzzy
//! evidence, and decides whether a single candidate is certain enough to be
//! applied without review.
//!
//! ## Features
//!
//! - **Normalization**: prefix stripping, abbreviation expansion, letter
//!   folding, city renames
//! - **Fuzzy similarity**: Jaro-Winkler, Levenshtein and order-insensitive
//!   token matching
//! - **Prefix index**: candidates by city prefix and region, with a binary
//!   snapshot for fast startup
//! - **Strict automatic pick**: only a unique high-confidence candidate
//!   that agrees with postal index, building and region
//!
//! ## Example
//!
//! ```rust,no_run
//! use addr_solver::{GazetteerLoader, MatchEngine, QueryAddress};
//!
//! let index = GazetteerLoader::new("magistral.csv").load(false).unwrap().index;
//! let engine = MatchEngine::new(&index);
//!
//! let query = QueryAddress::new()
//!     .with_city("Київ")
//!     .with_street("Хрещатик")
//!     .with_building("22");
//! let result = engine.search(&query, None);
//!
//! match &result.auto {
//!     Some(pick) => println!("{} ({}%)", pick.record, pick.confidence),
//!     None => println!("{} candidates for review", result.total_found),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Query and record types, confidence bands
//! - [`normalize`]: Canonicalization of address fragments
//! - [`similarity`]: String similarity primitives
//! - [`gazetteer`]: Gazetteer loading, snapshotting and indexing
//! - [`matching`]: Matching engine, scoring and the automatic-pick rule
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod gazetteer;
pub mod matching;
pub mod normalize;
pub mod similarity;

// Re-export commonly used types for convenience
pub use crate::core::address::QueryAddress;
pub use crate::core::record::{RecordFields, ReferenceRecord};
pub use crate::core::types::*;
pub use gazetteer::{GazetteerError, GazetteerHandle, GazetteerLoader, ReferenceIndex};
pub use matching::{MatchEngine, MatchResult, MatchingConfig, ScoredCandidate};
