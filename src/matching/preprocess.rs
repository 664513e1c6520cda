//! Query repair and normalization ahead of scoring.

use tracing::debug;

use crate::core::address::QueryAddress;
use crate::core::record::{RecordFields, ReferenceRecord};
use crate::normalize::{
    building_key, normalize_city, normalize_region, normalize_street, postal_key,
    try_extract_building, try_extract_city,
};

/// Street markers of a post-office box
const PO_BOX_MARKERS: [&str; 3] = ["а/с", "п/с", "абонент"];

/// Normalized city names a post-office-box query must carry to be
/// intercepted: Ukrainian and Russian spellings of Kyiv
const PO_BOX_CITIES: [&str; 2] = ["киів", "киев"];

/// A query after fragment repair, with every field in its normalized form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    /// The repaired query as the caller would have typed it
    pub address: QueryAddress,
    pub city: String,
    pub street: String,
    pub region: String,
    /// Building in [`building_key`] form
    pub building: String,
    /// Postal index in [`postal_key`] form
    pub postal_index: String,
}

impl PreparedQuery {
    /// Repair misplaced fragments, then normalize every field.
    ///
    /// A settlement typed at the head of the street (`м. Київ, Хрещатик`)
    /// moves to the city when the city is empty; a trailing building number
    /// moves out of the street when the building is empty.
    #[must_use]
    pub fn new(query: &QueryAddress) -> Self {
        let mut address = query.clone();

        if address.city().is_empty() && !address.street().is_empty() {
            let (city, street) = try_extract_city(address.street());
            if !city.is_empty() {
                debug!("Moved city '{city}' out of street");
                address.city = Some(city);
                address.street = Some(street).filter(|s| !s.is_empty());
            }
        }

        if address.building().is_empty() && !address.street().is_empty() {
            let (building, street) = try_extract_building(address.street());
            if !building.is_empty() {
                debug!("Moved building '{building}' out of street");
                address.building = Some(building);
                address.street = Some(street);
            }
        }

        Self {
            city: normalize_city(address.city()),
            street: normalize_street(address.street()),
            region: normalize_region(address.region()),
            building: building_key(address.building()),
            postal_index: postal_key(address.postal_index()),
            address,
        }
    }

    /// True for a post-office-box street in Kyiv, which is served by the
    /// central post office regardless of street and building
    #[must_use]
    pub fn is_po_box(&self) -> bool {
        if !PO_BOX_CITIES.contains(&self.city.as_str()) {
            return false;
        }
        let street = self.address.street().to_lowercase();
        PO_BOX_MARKERS.iter().any(|marker| street.contains(marker))
    }
}

/// The record returned for every post-office-box query: Kyiv's central
/// post office
#[must_use]
pub fn central_post_office() -> ReferenceRecord {
    ReferenceRecord::new(RecordFields {
        region: "м. Київ".to_string(),
        city: "м. Київ".to_string(),
        postal_index: "01001".to_string(),
        street: "вул. Хрещатик".to_string(),
        buildings: "22".to_string(),
        features: "Головпоштамт".to_string(),
        ..RecordFields::default()
    })
}
