use serde::{Deserialize, Serialize};

use crate::normalize::{building_key, normalize_city, normalize_region, normalize_street};

/// Raw column values of one gazetteer row, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
    pub region: String,
    pub old_district: String,
    pub new_district: String,
    pub otg: String,
    pub city: String,
    pub postal_index: String,
    pub street: String,
    pub buildings: String,
    pub sort_center_1: String,
    pub sort_center_2: String,
    pub delivery_district: String,
    pub tech_index: String,
    pub features: String,
    pub not_working: String,
}

/// One row of the reference gazetteer.
///
/// The `normalized_*` fields are derived once in [`ReferenceRecord::new`]
/// and never recomputed; a record is immutable once it enters an index.
///
/// Serialized positionally (no `skip_serializing_if`) so the binary snapshot
/// stays readable by `bincode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Oblast
    pub region: String,
    /// Administrative district before the 2020 reform
    pub old_district: String,
    /// Administrative district after the 2020 reform
    pub new_district: String,
    /// Territorial community (reference only)
    pub otg: String,
    /// Settlement name with its type prefix, e.g. `м. Київ`
    pub city: String,
    /// Settlement postal index
    pub postal_index: String,
    /// Street name with its type prefix
    pub street: String,
    /// Comma-separated building numbers served by this row
    pub buildings: String,
    pub sort_center_1: String,
    pub sort_center_2: String,
    pub delivery_district: String,
    pub tech_index: String,
    /// Operational notes of the serving post office
    pub features: String,
    /// Free-text outage or merge note; empty when the office is working
    pub not_working: String,

    // === Derived at load time ===
    pub normalized_city: String,
    pub normalized_street: String,
    pub normalized_region: String,
}

impl ReferenceRecord {
    /// Build a record from raw columns, trimming values and deriving the
    /// normalized fields.
    #[must_use]
    pub fn new(fields: RecordFields) -> Self {
        let trim = |s: String| {
            let trimmed = s.trim();
            if trimmed.len() == s.len() {
                s
            } else {
                trimmed.to_string()
            }
        };

        let city = trim(fields.city);
        let street = trim(fields.street);
        let region = trim(fields.region);

        let normalized_city = normalize_city(&city);
        let normalized_street = normalize_street(&street);
        let normalized_region = normalize_region(&region);

        Self {
            region,
            old_district: trim(fields.old_district),
            new_district: trim(fields.new_district),
            otg: trim(fields.otg),
            city,
            postal_index: trim(fields.postal_index),
            street,
            buildings: trim(fields.buildings),
            sort_center_1: trim(fields.sort_center_1),
            sort_center_2: trim(fields.sort_center_2),
            delivery_district: trim(fields.delivery_district),
            tech_index: trim(fields.tech_index),
            features: trim(fields.features),
            not_working: trim(fields.not_working),
            normalized_city,
            normalized_street,
            normalized_region,
        }
    }

    /// Current district, falling back to the pre-reform one
    #[must_use]
    pub fn district(&self) -> &str {
        if self.new_district.is_empty() {
            &self.old_district
        } else {
            &self.new_district
        }
    }

    /// Building numbers as listed, trimmed, blanks dropped
    #[must_use]
    pub fn buildings_list(&self) -> Vec<&str> {
        self.buildings
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .collect()
    }

    /// Building numbers in comparison form (see [`building_key`])
    #[must_use]
    pub fn building_keys(&self) -> Vec<String> {
        self.buildings_list()
            .into_iter()
            .map(building_key)
            .filter(|b| !b.is_empty())
            .collect()
    }

    /// Exact membership of `building` in this row's building list
    #[must_use]
    pub fn has_building(&self, building: &str) -> bool {
        let key = building_key(building);
        !key.is_empty() && self.building_keys().iter().any(|b| *b == key)
    }

    /// The serving office has no outage note
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.not_working.trim().is_empty()
    }
}

impl std::fmt::Display for ReferenceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} → {} → {} ({})",
            self.region, self.city, self.street, self.postal_index
        )
    }
}
