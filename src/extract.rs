use crate::error::ExtractError;
use crate::record::{RECENT, SightingBuilder, SightingRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Longest species text kept from a free-form species section.
const MAX_SECTION_CHARS: usize = 100;
/// Shorter text is not taken to be a species name.
const MIN_SPECIES_CHARS: usize = 3;

/// Per-run values shared by every element.
pub struct Context<'a> {
    pub base: &'a Url,
    pub scraped_at: &'a str,
}

/// One way of reading sightings out of a page layout.
pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Elements that may each hold one sighting.
    fn candidates<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;

    fn extract_one(&self, element: ElementRef<'_>, ctx: &Context<'_>)
        -> Result<SightingRecord, ExtractError>;
}

/// Runs an ordered chain of strategies; the first one that yields any record
/// wins and the rest are never consulted.
pub struct Extractor {
    base: Url,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Extractor {
    /// Table rows first, then species sections, then bare species links.
    pub fn new(base: Url) -> Self {
        Self::with_strategies(
            base,
            vec![
                Box::new(ObservationRows::new()),
                Box::new(SpeciesSections::new()),
                Box::new(SpeciesLinks::new()),
            ],
        )
    }

    pub fn with_strategies(base: Url, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { base, strategies }
    }

    pub fn extract(&self, document: &Html, timestamp: DateTime<Utc>) -> Vec<SightingRecord> {
        let scraped_at = timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
        let ctx = Context {
            base: &self.base,
            scraped_at: &scraped_at,
        };

        for strategy in &self.strategies {
            let records = run_strategy(strategy.as_ref(), document, &ctx);
            if !records.is_empty() {
                info!("Found {} sightings using {}", records.len(), strategy.name());
                return records;
            }
            debug!("Strategy {} found nothing", strategy.name());
        }

        info!("No sightings found by any strategy");
        Vec::new()
    }
}

fn run_strategy(strategy: &dyn Strategy, document: &Html, ctx: &Context<'_>) -> Vec<SightingRecord> {
    let mut records = Vec::new();
    for (index, element) in strategy.candidates(document).into_iter().enumerate() {
        match strategy.extract_one(element, ctx) {
            Ok(record) => records.push(record),
            Err(ExtractError::MissingSpecies) => {
                debug!("{}: skipping element {} without species", strategy.name(), index)
            }
            Err(e) => warn!("{}: skipping element {}: {}", strategy.name(), index, e),
        }
    }
    records
}

/// Compile a selector list, dropping (and logging) any that fail to parse.
fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!("Ignoring invalid selector {:?}: {}", s, e);
                None
            }
        })
        .collect()
}

/// Selectors for one field, tried in priority order.
struct FieldSelectors(Vec<Selector>);

impl FieldSelectors {
    fn new(list: &[&str]) -> Self {
        Self(selectors(list))
    }

    fn find<'a>(&self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.0.iter().find_map(|s| element.select(s).next())
    }
}

/// Whitespace-collapsed text content.
fn text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Site-relative hrefs get the site origin prefixed as written; anything
/// else is kept as written. Fails only when the base has no usable origin.
pub fn resolve_href(base: &Url, href: &str) -> Result<String, ExtractError> {
    if !href.starts_with('/') {
        return Ok(href.to_string());
    }
    let origin = base.origin();
    if !origin.is_tuple() {
        return Err(ExtractError::BadHref {
            href: href.to_string(),
            base: base.to_string(),
        });
    }
    Ok(format!("{}{}", origin.ascii_serialization(), href))
}

/// Links are optional: one that cannot be resolved is logged and left out,
/// and the record keeps its other fields.
fn href_of(element: Option<ElementRef<'_>>, base: &Url) -> Option<String> {
    let href = element.and_then(|e| e.value().attr("href"))?.trim();
    if href.is_empty() {
        return None;
    }
    match resolve_href(base, href) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Dropping link: {}", e);
            None
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Structured observation rows with a cell per field.
pub struct ObservationRows {
    rows: Vec<Selector>,
    species: FieldSelectors,
    scientific_name: FieldSelectors,
    location: FieldSelectors,
    date: FieldSelectors,
    observer: FieldSelectors,
    count: FieldSelectors,
    checklist: FieldSelectors,
    anchor: FieldSelectors,
}

impl ObservationRows {
    pub fn new() -> Self {
        Self {
            rows: selectors(&["tr.Observation-row, tr[data-species], .Observation"]),
            species: FieldSelectors::new(&[".Observation-species", ".species-name", "a[href*=\"species\"]"]),
            scientific_name: FieldSelectors::new(&[".Observation-species-sci", ".scientific-name", ".sci-name"]),
            location: FieldSelectors::new(&[".Observation-location", ".location", "a[href*=\"hotspot\"]"]),
            date: FieldSelectors::new(&[".Observation-date", ".date", "time"]),
            observer: FieldSelectors::new(&[".Observation-observer", ".observer", "a[href*=\"profile\"]"]),
            count: FieldSelectors::new(&[".Observation-count", ".count"]),
            checklist: FieldSelectors::new(&["a[href*=\"/checklist/\"]"]),
            anchor: FieldSelectors::new(&["a[href]"]),
        }
    }

    /// The field element itself when it carries an href, else its first link.
    fn link<'a>(&self, element: Option<ElementRef<'a>>) -> Option<ElementRef<'a>> {
        let element = element?;
        if element.value().attr("href").is_some() {
            Some(element)
        } else {
            self.anchor.find(element)
        }
    }

    fn field(&self, selectors: &FieldSelectors, row: ElementRef<'_>) -> Option<String> {
        selectors.find(row).map(text).and_then(non_empty)
    }
}

impl Strategy for ObservationRows {
    fn name(&self) -> &'static str {
        "observation rows"
    }

    fn candidates<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        self.rows.iter().flat_map(|s| document.select(s)).collect()
    }

    fn extract_one(&self, row: ElementRef<'_>, ctx: &Context<'_>) -> Result<SightingRecord, ExtractError> {
        let species_el = self.species.find(row);
        let species = species_el
            .map(text)
            .and_then(non_empty)
            .ok_or(ExtractError::MissingSpecies)?;
        let location_el = self.location.find(row);

        let mut builder = SightingBuilder::new(species, ctx.scraped_at)
            .scientific_name(self.field(&self.scientific_name, row))
            .species_url(href_of(self.link(species_el), ctx.base))
            .location_url(href_of(self.link(location_el), ctx.base))
            .checklist_url(href_of(self.checklist.find(row), ctx.base));

        if let Some(location) = location_el.map(text).and_then(non_empty) {
            builder = builder.location(location);
        }
        if let Some(date) = self.field(&self.date, row) {
            builder = builder.date(date);
        }
        if let Some(observer) = self.field(&self.observer, row) {
            builder = builder.observer(observer);
        }
        if let Some(count) = self.field(&self.count, row) {
            builder = builder.count(count);
        }

        Ok(builder.build())
    }
}

/// Loosely structured blocks whose whole text is the species name.
pub struct SpeciesSections {
    sections: Vec<Selector>,
}

impl SpeciesSections {
    pub fn new() -> Self {
        Self {
            sections: selectors(&[".Observation-species, .species-section, [class*=\"species\"]"]),
        }
    }
}

impl Strategy for SpeciesSections {
    fn name(&self) -> &'static str {
        "species sections"
    }

    fn candidates<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        self.sections.iter().flat_map(|s| document.select(s)).collect()
    }

    fn extract_one(&self, section: ElementRef<'_>, ctx: &Context<'_>) -> Result<SightingRecord, ExtractError> {
        let species = text(section);
        if species.chars().count() < MIN_SPECIES_CHARS {
            return Err(ExtractError::MissingSpecies);
        }

        Ok(SightingBuilder::new(truncate_chars(&species, MAX_SECTION_CHARS), ctx.scraped_at)
            .date(RECENT)
            .build())
    }
}

/// Last resort: any link that points at a species page.
pub struct SpeciesLinks {
    links: Vec<Selector>,
}

impl SpeciesLinks {
    pub fn new() -> Self {
        Self {
            links: selectors(&["a[href*=\"/species/\"], a[href*=\"speciesCode\"]"]),
        }
    }
}

impl Strategy for SpeciesLinks {
    fn name(&self) -> &'static str {
        "species links"
    }

    fn candidates<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        self.links.iter().flat_map(|s| document.select(s)).collect()
    }

    fn extract_one(&self, link: ElementRef<'_>, ctx: &Context<'_>) -> Result<SightingRecord, ExtractError> {
        let species = text(link);
        if species.chars().count() < MIN_SPECIES_CHARS {
            return Err(ExtractError::MissingSpecies);
        }

        Ok(SightingBuilder::new(species, ctx.scraped_at)
            .date(RECENT)
            .species_url(href_of(Some(link), ctx.base))
            .build())
    }
}
