//! Reference gazetteer storage, loading and indexing.
//!
//! The gazetteer is the national postal address register: one row per
//! (settlement, street) pair with the buildings and postal index serving it.
//!
//! ## Loading
//!
//! [`GazetteerLoader`] reads the semicolon-delimited source, detecting its
//! text encoding, and keeps a binary snapshot next to it so later runs skip
//! parsing. A stale or corrupt snapshot is discarded and rebuilt.
//!
//! ## Indexes
//!
//! [`ReferenceIndex`] keeps two lookup maps over the records:
//!
//! | Map | Key | Used for |
//! |-----|-----|----------|
//! | city prefix | first 2 and 3 chars of the normalized city | query city |
//! | region | normalized region | query region |
//!
//! [`CandidateFinder`] unions both into a bounded candidate list. The
//! three-character prefixes also answer settlement suggestions
//! ([`ReferenceIndex::search_cities`]) and the street and building listings
//! of one [`Settlement`].

pub mod handle;
pub mod index;
pub mod loader;
pub mod snapshot;
pub mod store;

pub use handle::GazetteerHandle;
pub use index::CandidateFinder;
pub use loader::{
    decode_source, parse_gazetteer_text, GazetteerLoader, LoadOrigin, LoadOutcome, ParsedSource,
    SourceEncoding,
};
pub use store::{
    GazetteerError, IndexStats, ReferenceIndex, Settlement, CITY_SUGGESTION_PREFIX,
};
