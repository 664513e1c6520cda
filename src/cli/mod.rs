//! Command-line interface for addr-solver.
//!
//! Available commands:
//!
//! - **search**: Resolve one address against the gazetteer
//! - **batch**: Resolve every row of a CSV file of addresses
//! - **index**: Build the gazetteer snapshot, show index statistics, or list
//!   settlements, streets and buildings
//! - **normalize**: Show the canonical form of an address fragment
//!
//! ## Usage
//!
//! ```text
//! # Resolve one address
//! addr-solver search --source magistral.csv --city Київ --street Хрещатик --building 22
//!
//! # Free text
//! addr-solver search --source magistral.csv --text "01001, м. Київ, вул. Хрещатик, буд. 22"
//!
//! # Many addresses, JSON out
//! addr-solver batch queries.csv --source magistral.csv --format json
//!
//! # Rebuild the snapshot after updating the source
//! addr-solver index build --source magistral.csv
//!
//! # Browse the register
//! addr-solver index cities Бров --source magistral.csv
//! addr-solver index buildings --city Бровари --street Київська --source magistral.csv
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::types::confidence_percent;
use crate::gazetteer::{GazetteerLoader, ReferenceIndex};
use crate::matching::{MatchingConfig, ScoredCandidate};

pub mod batch;
pub mod index;
pub mod normalize;
pub mod search;

#[derive(Parser)]
#[command(name = "addr-solver")]
#[command(author)]
#[command(version)]
#[command(about = "Match free-text Ukrainian postal addresses against the national gazetteer")]
#[command(
    long_about = "addr-solver resolves postal addresses (city, street, building, region) against the reference gazetteer.\n\nIt normalizes spelling, abbreviations and renamed cities, ranks candidate records by a weighted fuzzy score and provides:\n- A single automatic pick when exactly one candidate is certain\n- A ranked list for manual review otherwise"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a single address
    Search(search::SearchArgs),

    /// Resolve every address in a CSV file
    Batch(batch::BatchArgs),

    /// Manage the gazetteer snapshot
    Index(index::IndexArgs),

    /// Show how an address fragment is normalized
    Normalize(normalize::NormalizeArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where the gazetteer lives
#[derive(Args, Debug, Clone)]
pub struct GazetteerArgs {
    /// Gazetteer source file (semicolon-delimited)
    #[arg(long, required = true)]
    pub source: PathBuf,

    /// Snapshot file (defaults to <source>.snapshot)
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Ignore the snapshot and re-parse the source
    #[arg(long)]
    pub reload: bool,
}

impl GazetteerArgs {
    #[must_use]
    pub fn loader(&self) -> GazetteerLoader {
        let loader = GazetteerLoader::new(&self.source);
        match &self.cache {
            Some(cache) => loader.with_cache(cache),
            None => loader,
        }
    }

    /// Load the index, honoring `--reload`
    ///
    /// # Errors
    ///
    /// Returns an error if the gazetteer cannot be loaded.
    pub fn load(&self, verbose: bool) -> anyhow::Result<ReferenceIndex> {
        let outcome = self.loader().load(self.reload)?;
        if verbose {
            eprintln!(
                "Loaded {} gazetteer records from {}",
                outcome.index.len(),
                outcome.origin
            );
        }
        Ok(outcome.index)
    }
}

/// Matching policy overrides
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// JSON file with matching configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum score (0-1) for a candidate to be listed
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Confidence (0-100) needed for an automatic pick
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub auto_confidence: Option<u8>,

    /// Cap on candidates scored per address
    #[arg(long)]
    pub max_candidates: Option<usize>,
}

impl PolicyArgs {
    /// Configuration file (or defaults) with command-line overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or an override is out
    /// of range.
    pub fn build(&self) -> anyhow::Result<MatchingConfig> {
        let mut config = match &self.config {
            Some(path) => MatchingConfig::load_from_file(path)?,
            None => MatchingConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            config.similarity_threshold = threshold;
        }
        if let Some(confidence) = self.auto_confidence {
            config.auto_match_confidence = confidence;
        }
        if let Some(max) = self.max_candidates {
            config.max_candidates = max;
        }

        config.validate()?;
        Ok(config)
    }
}

/// One candidate as shown to users
fn candidate_json(candidate: &ScoredCandidate) -> serde_json::Value {
    let record = &candidate.record;
    serde_json::json!({
        "record_id": candidate.record_id.map(|id| id.index()),
        "score": candidate.score,
        "confidence": candidate.confidence,
        "band": candidate.band.label(),
        "region": record.region,
        "district": record.district(),
        "otg": record.otg,
        "city": record.city,
        "street": record.street,
        "buildings": record.buildings,
        "postal_index": record.postal_index,
        "features": record.features,
        "is_working": record.is_working(),
        "breakdown": candidate.breakdown,
    })
}

fn format_percent(score: f64) -> String {
    format!("{}%", confidence_percent(score))
}
