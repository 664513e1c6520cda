//! Normalize command - show the canonical form of an address fragment.

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::types::AddressField;
use crate::normalize::{
    building_key, extract_consonants, normalize_city, normalize_region, normalize_street,
    normalize_text, parse_full_address,
};

#[derive(Args)]
pub struct NormalizeArgs {
    /// Which kind of fragment the text is
    #[arg(value_enum)]
    pub kind: AddressField,

    /// The text to normalize
    #[arg(required = true)]
    pub text: String,
}

/// Canonical form of `text` as the matcher compares it
#[must_use]
pub fn canonical(kind: AddressField, text: &str) -> String {
    match kind {
        AddressField::City => normalize_city(text),
        AddressField::Street => normalize_street(text),
        AddressField::Region => normalize_region(text),
        AddressField::Building => building_key(text),
        AddressField::Text => normalize_text(text),
    }
}

/// Execute the normalize command
///
/// # Errors
///
/// Returns an error if JSON output cannot be serialized.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: NormalizeArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let normalized = canonical(args.kind, &args.text);
    let consonants = extract_consonants(&normalized);

    // Free text is also split into fields
    let parsed = matches!(args.kind, AddressField::Text).then(|| parse_full_address(&args.text));

    match format {
        OutputFormat::Text => {
            println!("{normalized}");
            if verbose {
                println!("   input:      {}", args.text);
                println!("   consonants: {consonants}");
            }
            if let Some(parsed) = &parsed {
                for (label, value) in [
                    ("postal_index", parsed.postal_index()),
                    ("city", parsed.city()),
                    ("street", parsed.street()),
                    ("building", parsed.building()),
                ] {
                    if !value.is_empty() {
                        println!("   {label}: {value}");
                    }
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "kind": args.kind,
                "input": args.text,
                "normalized": normalized,
                "consonants": consonants,
                "parsed": parsed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("input\tnormalized\tconsonants");
            println!("{}\t{normalized}\t{consonants}", args.text);
        }
    }

    Ok(())
}
