//! Search command - resolve one address.

use clap::Args;

use crate::cli::{candidate_json, format_percent, GazetteerArgs, OutputFormat, PolicyArgs};
use crate::core::address::QueryAddress;
use crate::matching::{MatchEngine, MatchResult};
use crate::normalize::parse_full_address;

/// Arguments for the search command
#[derive(Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub gazetteer: GazetteerArgs,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Settlement, with or without its type prefix
    #[arg(long)]
    pub city: Option<String>,

    /// Street, with or without its type prefix
    #[arg(long)]
    pub street: Option<String>,

    /// Building number
    #[arg(long)]
    pub building: Option<String>,

    /// Region (oblast)
    #[arg(long)]
    pub region: Option<String>,

    /// District
    #[arg(long)]
    pub district: Option<String>,

    /// Postal index
    #[arg(long = "index")]
    pub postal_index: Option<String>,

    /// Whole address on one line, instead of the field options
    #[arg(long, conflicts_with_all = ["city", "street", "building", "region", "district", "postal_index"])]
    pub text: Option<String>,

    /// Maximum number of candidates to show
    #[arg(short = 'n', long)]
    pub max_results: Option<usize>,
}

impl SearchArgs {
    fn query(&self) -> QueryAddress {
        if let Some(text) = &self.text {
            return parse_full_address(text);
        }

        let field = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
        QueryAddress {
            city: field(&self.city),
            street: field(&self.street),
            building: field(&self.building),
            region: field(&self.region),
            district: field(&self.district),
            postal_index: field(&self.postal_index),
        }
    }
}

/// Execute the search command
///
/// # Errors
///
/// Returns an error if the query is empty, the configuration is invalid, or
/// the gazetteer cannot be loaded.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: SearchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let query = args.query();
    if query.is_empty() {
        anyhow::bail!("Nothing to search for: give --city/--street/--building/--region or --text");
    }

    let config = args.policy.build()?;
    let index = args.gazetteer.load(verbose)?;
    let engine = MatchEngine::with_config(&index, config);

    if verbose {
        eprintln!("Query: {query}");
    }

    let result = engine.search(&query, args.max_results);

    match format {
        OutputFormat::Text => print_text(&query, &result),
        OutputFormat::Json => print_json(&query, &result)?,
        OutputFormat::Tsv => print_tsv(&result),
    }

    Ok(())
}

fn print_text(query: &QueryAddress, result: &MatchResult) {
    println!("\nQuery: {}", query.full_address());

    if result.ranked.is_empty() {
        println!("\nNo matching addresses found.");
        return;
    }

    match (&result.auto, &result.review_reason) {
        (Some(auto), _) => println!(
            "\nAutomatic match: {} [{}]",
            auto.record,
            format_percent(auto.score)
        ),
        (None, Some(reason)) => println!("\nManual review needed: {reason}"),
        (None, None) => {}
    }

    println!(
        "\nCandidates ({} shown of {}):",
        result.ranked.len(),
        result.total_found
    );
    for (i, candidate) in result.ranked.iter().enumerate() {
        let record = &candidate.record;
        println!(
            "  {:>2}. {:>4}  {:<6}  {}",
            i + 1,
            format_percent(candidate.score),
            candidate.band.label(),
            record
        );
        if !record.buildings.is_empty() {
            println!("              buildings: {}", record.buildings);
        }
        if !record.is_working() {
            println!("              not working: {}", record.not_working);
        }
    }
}

fn print_json(query: &QueryAddress, result: &MatchResult) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "query": query,
        "auto": result.auto.as_ref().map(candidate_json),
        "review_reason": result.review_reason.map(|r| r.to_string()),
        "total_found": result.total_found,
        "ranked": result.ranked.iter().map(candidate_json).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(result: &MatchResult) {
    println!("rank\tconfidence\tscore\tauto\tregion\tdistrict\tcity\tstreet\tbuildings\tpostal_index");

    let auto_id = result.auto.as_ref().map(|a| (a.record_id, a.record.postal_index.as_str()));
    for (i, candidate) in result.ranked.iter().enumerate() {
        let record = &candidate.record;
        let is_auto = auto_id == Some((candidate.record_id, record.postal_index.as_str()));
        println!(
            "{}\t{}\t{:.4}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            i + 1,
            candidate.confidence,
            candidate.score,
            is_auto,
            record.region,
            record.district(),
            record.city,
            record.street,
            record.buildings,
            record.postal_index
        );
    }
}
