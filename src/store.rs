use crate::error::StoreError;
use crate::identity::sighting_id;
use crate::record::SightingRecord;
use csv::Writer;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Sighting history kept as a JSON array on disk.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Load saved sightings; a missing file is an empty history.
    pub fn load(&self) -> Result<Vec<SightingRecord>, StoreError> {
        if !self.path.exists() {
            info!("No history at {}", self.path.display());
            return Ok(Vec::new());
        }

        let text = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let loaded: Vec<SightingRecord> =
            serde_json::from_str(&text).map_err(|source| StoreError::Json {
                path: self.path.display().to_string(),
                source,
            })?;

        let sightings = normalize(loaded);
        info!("Loaded {} sightings from {}", sightings.len(), self.path.display());
        Ok(sightings)
    }

    /// Replace the history file with `sightings`. The new content is written
    /// next to the target and renamed over it, so readers never see a partial file.
    pub fn save(&self, sightings: &[SightingRecord]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let json = serde_json::to_string_pretty(sightings).map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(json.as_bytes()).map_err(|e| self.io_error(e))?;
        tmp.flush().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        info!("Saved {} sightings to {}", sightings.len(), self.path.display());
        Ok(())
    }
}

/// Fill in missing ids and drop repeats so a hand-edited file still loads as
/// a valid history.
fn normalize(loaded: Vec<SightingRecord>) -> Vec<SightingRecord> {
    let mut seen = HashSet::new();
    let mut sightings = Vec::with_capacity(loaded.len());

    for mut sighting in loaded {
        if sighting.id.is_empty() {
            sighting.id = sighting_id(
                &sighting.species,
                &sighting.location,
                &sighting.date,
                &sighting.observer,
            );
        }
        if seen.insert(sighting.id.clone()) {
            sightings.push(sighting);
        } else {
            warn!("Dropping duplicate sighting {} ({})", sighting.id, sighting.species);
        }
    }

    sightings
}

/// Flat CSV layout; every column is always present.
#[derive(Serialize)]
struct CsvRow<'a> {
    species: &'a str,
    scientific_name: Option<&'a str>,
    location: &'a str,
    date: &'a str,
    observer: &'a str,
    count: &'a str,
    scraped_at: &'a str,
    species_url: Option<&'a str>,
    location_url: Option<&'a str>,
    checklist_url: Option<&'a str>,
    id: &'a str,
}

impl<'a> From<&'a SightingRecord> for CsvRow<'a> {
    fn from(s: &'a SightingRecord) -> Self {
        Self {
            species: &s.species,
            scientific_name: s.scientific_name.as_deref(),
            location: &s.location,
            date: &s.date,
            observer: &s.observer,
            count: &s.count,
            scraped_at: &s.scraped_at,
            species_url: s.species_url.as_deref(),
            location_url: s.location_url.as_deref(),
            checklist_url: s.checklist_url.as_deref(),
            id: &s.id,
        }
    }
}

/// Save records to CSV file
pub fn save_to_csv(sightings: &[SightingRecord], path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }

    let mut writer = Writer::from_path(path)?;
    for sighting in sightings {
        writer.serialize(CsvRow::from(sighting))?;
    }

    writer.flush().map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("Data saved to {}", path.display());
    Ok(())
}
