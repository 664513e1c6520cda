use serde::{Deserialize, Serialize};

/// A caller-supplied address to resolve against the gazetteer.
///
/// Every field is optional. Blank strings are treated the same as missing
/// fields by all accessors, so callers can pass spreadsheet cells through
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_index: Option<String>,
}

fn present(field: Option<&String>) -> &str {
    field.map_or("", |s| s.trim())
}

fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl QueryAddress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = non_blank(city);
        self
    }

    #[must_use]
    pub fn with_street(mut self, street: impl Into<String>) -> Self {
        self.street = non_blank(street);
        self
    }

    #[must_use]
    pub fn with_building(mut self, building: impl Into<String>) -> Self {
        self.building = non_blank(building);
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = non_blank(region);
        self
    }

    #[must_use]
    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = non_blank(district);
        self
    }

    #[must_use]
    pub fn with_postal_index(mut self, postal_index: impl Into<String>) -> Self {
        self.postal_index = non_blank(postal_index);
        self
    }

    /// Trimmed city, empty when absent
    #[must_use]
    pub fn city(&self) -> &str {
        present(self.city.as_ref())
    }

    #[must_use]
    pub fn street(&self) -> &str {
        present(self.street.as_ref())
    }

    #[must_use]
    pub fn building(&self) -> &str {
        present(self.building.as_ref())
    }

    #[must_use]
    pub fn region(&self) -> &str {
        present(self.region.as_ref())
    }

    #[must_use]
    pub fn district(&self) -> &str {
        present(self.district.as_ref())
    }

    #[must_use]
    pub fn postal_index(&self) -> &str {
        present(self.postal_index.as_ref())
    }

    /// True when none of the locating fields carry any text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.city().is_empty()
            && self.street().is_empty()
            && self.building().is_empty()
            && self.region().is_empty()
    }

    /// Human-readable one-line rendering, region first
    #[must_use]
    pub fn full_address(&self) -> String {
        let mut parts = Vec::new();
        for part in [self.region(), self.district(), self.city(), self.street()] {
            if !part.is_empty() {
                parts.push(part.to_string());
            }
        }
        if !self.building().is_empty() {
            parts.push(format!("буд. {}", self.building()));
        }
        parts.join(", ")
    }
}

impl std::fmt::Display for QueryAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.postal_index().is_empty() {
            write!(f, "{}", self.full_address())
        } else {
            write!(f, "{}, {}", self.postal_index(), self.full_address())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_absent() {
        let query = QueryAddress::new().with_city("   ").with_street(" Хрещатик ");
        assert!(query.city.is_none());
        assert_eq!(query.city(), "");
        assert_eq!(query.street(), "Хрещатик");
    }

    #[test]
    fn test_is_empty() {
        assert!(QueryAddress::new().is_empty());
        assert!(QueryAddress::new().with_postal_index("01001").is_empty());
        assert!(!QueryAddress::new().with_building("1").is_empty());
    }

    #[test]
    fn test_full_address() {
        let query = QueryAddress::new()
            .with_city("м. Київ")
            .with_street("вул. Хрещатик")
            .with_building("22")
            .with_postal_index("01001");
        assert_eq!(query.full_address(), "м. Київ, вул. Хрещатик, буд. 22");
        assert_eq!(query.to_string(), "01001, м. Київ, вул. Хрещатик, буд. 22");
    }

    #[test]
    fn test_deserialize_partial_json() {
        let query: QueryAddress = serde_json::from_str(r#"{"city": "Львів"}"#).unwrap();
        assert_eq!(query.city(), "Львів");
        assert!(query.street.is_none());
    }
}
