use std::collections::BTreeMap;

use anyhow::bail;
use clap::{Args, Subcommand};

use crate::cli::{GazetteerArgs, OutputFormat};
use crate::gazetteer::{IndexStats, LoadOrigin, ReferenceIndex, Settlement};
use crate::normalize::normalize_region;

#[derive(Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommands,
}

#[derive(Subcommand)]
pub enum IndexCommands {
    /// Parse the source and (re)write the snapshot
    Build {
        #[command(flatten)]
        gazetteer: GazetteerArgs,
    },

    /// Show record and index counts
    Stats {
        #[command(flatten)]
        gazetteer: GazetteerArgs,
    },

    /// Suggest settlements matching a partial name (three letters or more)
    Cities {
        /// Partial settlement name
        query: String,

        /// Maximum number of suggestions
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        #[command(flatten)]
        gazetteer: GazetteerArgs,
    },

    /// List the streets of a settlement
    Streets {
        #[command(flatten)]
        place: PlaceArgs,

        #[command(flatten)]
        gazetteer: GazetteerArgs,
    },

    /// List buildings of a street, grouped by postal index
    Buildings {
        #[command(flatten)]
        place: PlaceArgs,

        /// Street name or part of it
        #[arg(long)]
        street: String,

        #[command(flatten)]
        gazetteer: GazetteerArgs,
    },
}

/// Which settlement a streets/buildings lookup is about
#[derive(Args)]
pub struct PlaceArgs {
    /// Settlement name; a type prefix (`м.`, `с.`) narrows namesakes
    #[arg(long)]
    pub city: String,

    /// Oblast, to pick one of several settlements with the same name
    #[arg(long)]
    pub region: Option<String>,
}

impl PlaceArgs {
    /// Resolve to exactly one settlement of `index`
    fn resolve(&self, index: &ReferenceIndex) -> anyhow::Result<Settlement> {
        let mut named = index.settlements_named(&self.city);
        if let Some(region) = self.region.as_deref() {
            let wanted = normalize_region(region);
            named.retain(|s| normalize_region(&s.region) == wanted);
        }

        // `м. Бровари` picks the city over a village of the same name
        let typed = self.city.trim().to_lowercase();
        if named.len() > 1 && named.iter().any(|s| s.city.to_lowercase() == typed) {
            named.retain(|s| s.city.to_lowercase() == typed);
        }

        match named.len() {
            0 => bail!("No settlement named '{}' in the gazetteer", self.city),
            1 => Ok(named.remove(0)),
            _ => {
                let listed: Vec<String> = named.iter().map(ToString::to_string).collect();
                bail!(
                    "'{}' names {} settlements, narrow it down with --region:\n  {}",
                    self.city,
                    named.len(),
                    listed.join("\n  ")
                )
            }
        }
    }
}

/// Execute the index command
///
/// # Errors
///
/// Returns an error if the gazetteer cannot be loaded, or a street or
/// building lookup does not name exactly one settlement.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: IndexArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match &args.command {
        IndexCommands::Build { gazetteer } => run_stats(gazetteer, true, format),
        IndexCommands::Stats { gazetteer } => run_stats(gazetteer, gazetteer.reload, format),
        IndexCommands::Cities {
            query,
            limit,
            gazetteer,
        } => {
            let index = gazetteer.load(verbose)?;
            let found = index.search_cities(query, *limit);
            print_settlements(&found, format)
        }
        IndexCommands::Streets { place, gazetteer } => {
            let index = gazetteer.load(verbose)?;
            let settlement = place.resolve(&index)?;
            let streets = index.streets_of(&settlement);
            print_streets(&settlement, &streets, format)
        }
        IndexCommands::Buildings {
            place,
            street,
            gazetteer,
        } => {
            let index = gazetteer.load(verbose)?;
            let settlement = place.resolve(&index)?;
            let buildings = index.buildings_of(&settlement, street);
            print_buildings(&settlement, &buildings, format)
        }
    }
}

fn run_stats(gazetteer: &GazetteerArgs, force_reload: bool, format: OutputFormat) -> anyhow::Result<()> {
    let loader = gazetteer.loader();
    let outcome = loader.load(force_reload)?;
    let stats = outcome.index.stats();
    let snapshot = loader.cache().display().to_string();

    match format {
        OutputFormat::Text => print_text(&stats, outcome.origin, &snapshot),
        OutputFormat::Json => {
            let (encoding, skipped_rows) = match outcome.origin {
                LoadOrigin::Snapshot => (None, None),
                LoadOrigin::Source {
                    encoding,
                    skipped_rows,
                } => (Some(encoding.name()), Some(skipped_rows)),
            };
            let output = serde_json::json!({
                "stats": stats,
                "origin": outcome.origin.to_string(),
                "encoding": encoding,
                "skipped_rows": skipped_rows,
                "snapshot": snapshot,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("total_records\tindexed_prefixes\tindexed_regions\torigin");
            println!(
                "{}\t{}\t{}\t{}",
                stats.total_records, stats.indexed_prefixes, stats.indexed_regions, outcome.origin
            );
        }
    }

    Ok(())
}

fn print_settlements(found: &[Settlement], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            if found.is_empty() {
                println!("No settlements found");
            }
            for settlement in found {
                println!("{settlement}");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "settlements": found, "count": found.len() });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("city\tdistricts\tregion");
            for s in found {
                println!("{}\t{}\t{}", s.city, s.districts.join(", "), s.region);
            }
        }
    }
    Ok(())
}

fn print_streets(settlement: &Settlement, streets: &[&str], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Streets of {settlement} ({})", streets.len());
            for street in streets {
                println!("   {street}");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "settlement": settlement, "streets": streets });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("street");
            for street in streets {
                println!("{street}");
            }
        }
    }
    Ok(())
}

fn print_buildings(
    settlement: &Settlement,
    buildings: &BTreeMap<String, Vec<String>>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Buildings in {settlement}");
            if buildings.is_empty() {
                println!("   No matching street");
            }
            for (postal_index, numbers) in buildings {
                println!("   {postal_index}: {}", numbers.join(", "));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "settlement": settlement, "buildings": buildings });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("postal_index\tbuildings");
            for (postal_index, numbers) in buildings {
                println!("{postal_index}\t{}", numbers.join(", "));
            }
        }
    }
    Ok(())
}

fn print_text(stats: &IndexStats, origin: LoadOrigin, snapshot: &str) {
    println!("Gazetteer loaded from {origin}");
    println!("   Records:        {}", stats.total_records);
    println!("   City prefixes:  {}", stats.indexed_prefixes);
    println!("   Regions:        {}", stats.indexed_regions);
    println!("   Snapshot:       {snapshot}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{RecordFields, ReferenceRecord};

    fn index() -> ReferenceIndex {
        let row = |region: &str, city: &str| {
            ReferenceRecord::new(RecordFields {
                region: region.to_string(),
                city: city.to_string(),
                street: "вул. Шкільна".to_string(),
                postal_index: "07400".to_string(),
                ..RecordFields::default()
            })
        };
        ReferenceIndex::from_records(vec![
            row("Київська область", "м. Бровари"),
            row("Київська область", "с. Бровари"),
            row("Чернігівська область", "с. Бровари"),
        ])
    }

    fn place(city: &str, region: Option<&str>) -> PlaceArgs {
        PlaceArgs {
            city: city.to_string(),
            region: region.map(str::to_string),
        }
    }

    #[test]
    fn test_place_needs_one_settlement() {
        let index = index();

        let err = place("Бровари", None).resolve(&index).unwrap_err();
        assert!(err.to_string().contains("names 3 settlements"));
        assert!(place("Одеса", None).resolve(&index).is_err());

        let village = place("Бровари", Some("Чернігівська обл.")).resolve(&index).unwrap();
        assert_eq!(village.region, "Чернігівська область");
    }

    #[test]
    fn test_place_type_prefix_picks_namesake() {
        let index = index();

        let city = place("м. Бровари", None).resolve(&index).unwrap();
        assert_eq!(city.city, "м. Бровари");

        let village = place("с. Бровари", Some("Київська")).resolve(&index).unwrap();
        assert_eq!(village.region, "Київська область");
        assert_eq!(village.city, "с. Бровари");
    }
}
