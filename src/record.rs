use crate::identity::sighting_id;
use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";
pub const RECENT: &str = "Recent";
pub const DEFAULT_COUNT: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SightingRecord {
    pub species: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default = "unknown")]
    pub location: String,
    #[serde(default = "unknown")]
    pub date: String,
    #[serde(default = "unknown")]
    pub observer: String,
    #[serde(default = "default_count")]
    pub count: String,
    #[serde(default)]
    pub scraped_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_url: Option<String>,
    /// Content fingerprint, see [`sighting_id`]. Empty only for history files
    /// written without one; the store fills it on load.
    #[serde(default)]
    pub id: String,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn default_count() -> String {
    DEFAULT_COUNT.to_string()
}

/// Collects field values before the id is fixed. Records are immutable once
/// built, so everything that feeds the fingerprint goes through here.
#[derive(Debug, Clone)]
pub struct SightingBuilder {
    species: String,
    scientific_name: Option<String>,
    location: String,
    date: String,
    observer: String,
    count: String,
    scraped_at: String,
    species_url: Option<String>,
    location_url: Option<String>,
    checklist_url: Option<String>,
}

impl SightingBuilder {
    pub fn new(species: impl Into<String>, scraped_at: &str) -> Self {
        Self {
            species: species.into(),
            scientific_name: None,
            location: unknown(),
            date: unknown(),
            observer: unknown(),
            count: default_count(),
            scraped_at: scraped_at.to_string(),
            species_url: None,
            location_url: None,
            checklist_url: None,
        }
    }

    pub fn scientific_name(mut self, name: Option<String>) -> Self {
        self.scientific_name = name;
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn observer(mut self, observer: impl Into<String>) -> Self {
        self.observer = observer.into();
        self
    }

    pub fn count(mut self, count: impl Into<String>) -> Self {
        self.count = count.into();
        self
    }

    pub fn species_url(mut self, url: Option<String>) -> Self {
        self.species_url = url;
        self
    }

    pub fn location_url(mut self, url: Option<String>) -> Self {
        self.location_url = url;
        self
    }

    pub fn checklist_url(mut self, url: Option<String>) -> Self {
        self.checklist_url = url;
        self
    }

    pub fn build(self) -> SightingRecord {
        let id = sighting_id(&self.species, &self.location, &self.date, &self.observer);
        SightingRecord {
            species: self.species,
            scientific_name: self.scientific_name,
            location: self.location,
            date: self.date,
            observer: self.observer,
            count: self.count,
            scraped_at: self.scraped_at,
            species_url: self.species_url,
            location_url: self.location_url,
            checklist_url: self.checklist_url,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let record = SightingBuilder::new("Blue Jay", "2024-01-01T00:00:00Z").build();
        assert_eq!(record.location, "Unknown");
        assert_eq!(record.date, "Unknown");
        assert_eq!(record.observer, "Unknown");
        assert_eq!(record.count, "1");
        assert_eq!(record.id.len(), 12);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let json = r#"{"species": "Snowy Owl", "scraped_at": "2024-02-02T10:00:00Z"}"#;
        let record: SightingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.location, "Unknown");
        assert_eq!(record.count, "1");
        assert!(record.species_url.is_none());
        assert!(record.id.is_empty());
    }

    #[test]
    fn test_serialize_omits_absent_urls() {
        let record = SightingBuilder::new("Blue Jay", "2024-01-01T00:00:00Z").build();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"scraped_at\""));
        assert!(!json.contains("species_url"));
        assert!(!json.contains("scientific_name"));
    }
}
