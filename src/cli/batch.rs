//! Batch command - resolve every address in a CSV file.
//!
//! Input columns are matched by header name: `city`, `street`, `building`,
//! `region`, `district`, `postal_index`. Missing columns read as empty;
//! unknown columns are ignored.
//!
//! With `--result-cache`, resolved rows are kept in a JSON file and reused
//! by later runs over the same addresses until they expire.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cli::{GazetteerArgs, OutputFormat, PolicyArgs};
use crate::core::address::QueryAddress;
use crate::matching::cache::DEFAULT_EXPIRY_DAYS;
use crate::matching::{cache_key, MatchEngine, MatchResult, ResultCache};

/// Arguments for the batch command
#[derive(Args)]
pub struct BatchArgs {
    /// CSV file of addresses, with a header row
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub gazetteer: GazetteerArgs,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Field delimiter of the input file
    #[arg(long, default_value = ",")]
    pub delimiter: char,

    /// JSON file keeping resolved rows between runs
    #[arg(long)]
    pub result_cache: Option<PathBuf>,

    /// Days a cached row stays valid
    #[arg(long, default_value_t = DEFAULT_EXPIRY_DAYS, requires = "result_cache")]
    pub cache_days: i64,
}

/// Outcome of one input row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// A single candidate was picked automatically
    Auto,
    /// Candidates were found but need a human choice
    Manual,
    /// No candidate above the threshold
    NotFound,
    /// The row could not be read
    Invalid,
}

impl RowStatus {
    fn label(self) -> &'static str {
        match self {
            RowStatus::Auto => "auto",
            RowStatus::Manual => "manual",
            RowStatus::NotFound => "not_found",
            RowStatus::Invalid => "invalid",
        }
    }
}

/// One output row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRow {
    /// 1-based data row number in the input
    pub row: usize,
    pub status: RowStatus,
    pub query: String,
    /// Postal index of the automatic pick
    pub postal_index: Option<String>,
    /// Best candidate's confidence
    pub confidence: Option<u8>,
    pub candidates: usize,
    /// Best candidate, formatted
    pub best: Option<String>,
    pub reason: Option<String>,
}

impl BatchRow {
    fn from_result(row: usize, query: &QueryAddress, result: &MatchResult) -> Self {
        let status = if result.auto.is_some() {
            RowStatus::Auto
        } else if result.total_found > 0 {
            RowStatus::Manual
        } else {
            RowStatus::NotFound
        };

        let best = result.best();
        Self {
            row,
            status,
            query: query.full_address(),
            postal_index: result.auto.as_ref().map(|a| a.record.postal_index.clone()),
            confidence: best.map(|c| c.confidence),
            candidates: result.total_found,
            best: best.map(|c| c.record.to_string()),
            reason: result.review_reason.map(|r| r.to_string()),
        }
    }

    fn invalid(row: usize, reason: String) -> Self {
        Self {
            row,
            status: RowStatus::Invalid,
            query: String::new(),
            postal_index: None,
            confidence: None,
            candidates: 0,
            best: None,
            reason: Some(reason),
        }
    }
}

/// Resolve each query, one output row per query.
///
/// Rows found in `cache` are reused; newly resolved rows are added to it.
pub fn resolve_all<I>(
    engine: &MatchEngine<'_>,
    queries: I,
    mut cache: Option<&mut ResultCache<BatchRow>>,
) -> Vec<BatchRow>
where
    I: IntoIterator<Item = Result<QueryAddress, String>>,
{
    queries
        .into_iter()
        .enumerate()
        .map(|(i, query)| match query {
            Ok(query) if query.is_empty() => BatchRow::invalid(i + 1, "empty address".to_string()),
            Ok(query) => {
                let Some(cache) = cache.as_deref_mut() else {
                    return BatchRow::from_result(i + 1, &query, &engine.search(&query, Some(1)));
                };
                let key = cache_key(&query);
                if let Some(mut row) = cache.get(&key) {
                    row.row = i + 1;
                    return row;
                }
                let row = BatchRow::from_result(i + 1, &query, &engine.search(&query, Some(1)));
                cache.insert(key, row.clone());
                row
            }
            Err(e) => BatchRow::invalid(i + 1, e),
        })
        .collect()
}

/// Execute the batch command
///
/// # Errors
///
/// Returns an error if the input cannot be opened, the configuration is
/// invalid, or the gazetteer cannot be loaded.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: BatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let delimiter = u8::try_from(args.delimiter)
        .map_err(|_| anyhow::anyhow!("Delimiter must be a single-byte character"))?;

    let config = args.policy.build()?;
    let index = args.gazetteer.load(verbose)?;
    let engine = MatchEngine::with_config(&index, config);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&args.input)?;

    let queries = reader.deserialize::<QueryAddress>().map(|row| {
        row.map_err(|e| {
            warn!("Unreadable input row: {e}");
            e.to_string()
        })
    });

    let mut cache = args
        .result_cache
        .as_deref()
        .map(|path| ResultCache::open(path, engine.config(), args.cache_days));
    let rows = resolve_all(&engine, queries, cache.as_mut());

    if let Some(cache) = cache.as_mut() {
        info!("Result cache: {} of {} rows reused", cache.hits(), rows.len());
        cache.save()?;
    }

    match format {
        OutputFormat::Text => print_text(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Tsv => print_tsv(&rows),
    }

    if verbose {
        let count = |status: RowStatus| rows.iter().filter(|r| r.status == status).count();
        eprintln!(
            "{} rows: {} auto, {} manual, {} not found, {} invalid",
            rows.len(),
            count(RowStatus::Auto),
            count(RowStatus::Manual),
            count(RowStatus::NotFound),
            count(RowStatus::Invalid)
        );
    }

    Ok(())
}

fn print_text(rows: &[BatchRow]) {
    for row in rows {
        let detail = match row.status {
            RowStatus::Auto => format!(
                "{} [{}%]",
                row.postal_index.as_deref().unwrap_or_default(),
                row.confidence.unwrap_or_default()
            ),
            RowStatus::Manual => format!(
                "{} candidates, best {}% ({})",
                row.candidates,
                row.confidence.unwrap_or_default(),
                row.reason.as_deref().unwrap_or_default()
            ),
            RowStatus::NotFound => String::new(),
            RowStatus::Invalid => row.reason.clone().unwrap_or_default(),
        };
        println!(
            "{:>5}  {:<9}  {}  {}",
            row.row,
            row.status.label(),
            row.query,
            detail
        );
    }
}

fn print_tsv(rows: &[BatchRow]) {
    println!("row\tstatus\tpostal_index\tconfidence\tcandidates\tquery\tbest\treason");
    for row in rows {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.row,
            row.status.label(),
            row.postal_index.as_deref().unwrap_or_default(),
            row.confidence.map(|c| c.to_string()).unwrap_or_default(),
            row.candidates,
            row.query,
            row.best.as_deref().unwrap_or_default(),
            row.reason.as_deref().unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{RecordFields, ReferenceRecord};
    use crate::gazetteer::ReferenceIndex;

    fn index() -> ReferenceIndex {
        ReferenceIndex::from_records(vec![
            ReferenceRecord::new(RecordFields {
                city: "м. Київ".to_string(),
                street: "вул. Хрещатик".to_string(),
                buildings: "1,3,5".to_string(),
                postal_index: "01001".to_string(),
                ..RecordFields::default()
            }),
            ReferenceRecord::new(RecordFields {
                city: "м. Київ".to_string(),
                street: "вул. Хрещатик".to_string(),
                buildings: "2,4".to_string(),
                postal_index: "01001".to_string(),
                ..RecordFields::default()
            }),
        ])
    }

    fn kyiv(building: &str) -> QueryAddress {
        QueryAddress::new()
            .with_city("Київ")
            .with_street("Хрещатик")
            .with_building(building)
    }

    #[test]
    fn test_resolve_all_statuses() {
        let index = index();
        let engine = MatchEngine::new(&index);
        let rows = resolve_all(
            &engine,
            vec![
                Ok(kyiv("1")),
                Ok(kyiv("999")),
                Ok(QueryAddress::new().with_city("Одеса").with_street("Дерибасівська")),
                Ok(QueryAddress::new()),
                Err("bad row".to_string()),
            ],
            None,
        );

        let statuses: Vec<_> = rows.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                RowStatus::Auto,
                RowStatus::Manual,
                RowStatus::NotFound,
                RowStatus::Invalid,
                RowStatus::Invalid
            ]
        );
        assert_eq!(rows[0].postal_index.as_deref(), Some("01001"));
        assert_eq!(rows[1].candidates, 2);
        assert_eq!(rows[4].row, 5);
    }

    #[test]
    fn test_resolve_all_reuses_cached_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let index = index();
        let engine = MatchEngine::new(&index);

        let mut cache = ResultCache::open(&path, engine.config(), DEFAULT_EXPIRY_DAYS);
        let first = resolve_all(&engine, vec![Ok(kyiv("1"))], Some(&mut cache));
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.len(), 1);
        cache.save().unwrap();

        let mut cache = ResultCache::open(&path, engine.config(), DEFAULT_EXPIRY_DAYS);
        let again = resolve_all(
            &engine,
            vec![Ok(kyiv("3")), Ok(kyiv("1")), Err("bad row".to_string())],
            Some(&mut cache),
        );
        assert_eq!(cache.hits(), 1);
        assert_eq!(again[1].row, 2);
        assert_eq!(again[1].status, RowStatus::Auto);
        assert_eq!(again[1].postal_index, first[0].postal_index);
        assert_eq!(again[2].status, RowStatus::Invalid);
        assert_eq!(cache.len(), 2);
    }
}
