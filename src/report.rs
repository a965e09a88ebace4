//! Static HTML page listing every saved sighting.

use crate::config::ReportConfig;
use crate::record::SightingRecord;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub struct ReportRenderer {
    config: ReportConfig,
}

impl ReportRenderer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    fn escape_html(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    fn cell(text: &str, url: Option<&str>, class: &str) -> String {
        match url {
            Some(url) => format!(
                "<a href=\"{}\" target=\"_blank\" class=\"{}\">{}</a>",
                Self::escape_html(url),
                class,
                Self::escape_html(text)
            ),
            None => Self::escape_html(text),
        }
    }

    /// Render the page. Rows are ordered newest scrape first.
    pub fn render(&self, sightings: &[SightingRecord], now: DateTime<Utc>) -> String {
        let mut sorted: Vec<&SightingRecord> = sightings.iter().collect();
        sorted.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));

        let title = Self::escape_html(&self.config.title);
        let mut html = String::with_capacity(8192 + sightings.len() * 512);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"UTF-8\">\n");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
        html.push_str(&format!("<title>{title}</title>\n"));
        html.push_str(&format!("<link rel=\"stylesheet\" href=\"{DATATABLES_CSS}\">\n"));
        html.push_str("<style>\n");
        html.push_str(INLINE_CSS);
        html.push_str("</style>\n</head>\n<body>\n");

        html.push_str("<div class=\"container\">\n");
        html.push_str(&format!("<h1>{title}</h1>\n"));

        html.push_str("<div class=\"stats\">\n");
        html.push_str(&stat(&sightings.len().to_string(), "Total Sightings"));
        html.push_str(&stat(&unique_species(sightings).to_string(), "Unique Species"));
        html.push_str(&stat(&now.format("%Y-%m-%d %H:%M UTC").to_string(), "Last Updated"));
        html.push_str("</div>\n");

        html.push_str("<table id=\"sightings-table\" class=\"display\">\n<thead>\n<tr>");
        for header in ["Species", "Location", "Date", "Observer", "Count", "Scraped"] {
            html.push_str(&format!("<th>{header}</th>"));
        }
        html.push_str("</tr>\n</thead>\n<tbody>\n");

        for s in sorted {
            let scraped = if s.scraped_at.is_empty() {
                "N/A".to_string()
            } else {
                s.scraped_at.chars().take(10).collect()
            };
            html.push_str("<tr>");
            html.push_str(&format!(
                "<td>{}</td>",
                Self::cell(&s.species, s.species_url.as_deref(), "species-link")
            ));
            html.push_str(&format!(
                "<td>{}</td>",
                Self::cell(&s.location, s.location_url.as_deref(), "location-link")
            ));
            html.push_str(&format!(
                "<td>{}</td>",
                Self::cell(&s.date, s.checklist_url.as_deref(), "checklist-link")
            ));
            html.push_str(&format!("<td>{}</td>", Self::escape_html(&s.observer)));
            html.push_str(&format!("<td>{}</td>", Self::escape_html(&s.count)));
            html.push_str(&format!("<td>{}</td>", Self::escape_html(&scraped)));
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");

        html.push_str(&format!(
            "<footer>Data scraped from <a href=\"{}\">{}</a></footer>\n",
            Self::escape_html(&self.config.source_url),
            Self::escape_html(&self.config.source_name)
        ));
        html.push_str("</div>\n");

        html.push_str(&format!("<script src=\"{JQUERY_JS}\"></script>\n"));
        html.push_str(&format!("<script src=\"{DATATABLES_JS}\"></script>\n"));
        html.push_str(&format!(
            "<script>\n$(document).ready(function() {{\n  $('#sightings-table').DataTable({{\n    pageLength: {},\n    order: [[5, 'desc']],\n    language: {{\n      search: \"Filter:\",\n      lengthMenu: \"Show _MENU_ sightings\",\n      info: \"Showing _START_ to _END_ of _TOTAL_ sightings\"\n    }}\n  }});\n}});\n</script>\n",
            self.config.page_length
        ));
        html.push_str("</body>\n</html>\n");
        html
    }

    /// Render and write the whole page, replacing any previous one.
    pub fn write(&self, sightings: &[SightingRecord], path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.render(sightings, Utc::now()))?;
        info!("Generated {}", path.display());
        Ok(())
    }
}

fn stat(value: &str, label: &str) -> String {
    format!(
        "<div class=\"stat\"><span class=\"stat-value\">{}</span><span class=\"stat-label\">{}</span></div>\n",
        ReportRenderer::escape_html(value),
        label
    )
}

pub fn unique_species(sightings: &[SightingRecord]) -> usize {
    sightings
        .iter()
        .map(|s| s.species.as_str())
        .collect::<HashSet<_>>()
        .len()
}

const JQUERY_JS: &str = "https://code.jquery.com/jquery-3.7.1.min.js";
const DATATABLES_JS: &str = "https://cdn.datatables.net/1.13.7/js/jquery.dataTables.min.js";
const DATATABLES_CSS: &str = "https://cdn.datatables.net/1.13.7/css/jquery.dataTables.min.css";

const INLINE_CSS: &str = r#"* { box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; color: #333; }
.container { max-width: 1400px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
h1 { color: #2c5530; margin-top: 0; }
.stats { background: #e8f5e9; padding: 15px 20px; border-radius: 6px; margin-bottom: 20px; display: flex; gap: 30px; flex-wrap: wrap; }
.stat { display: flex; flex-direction: column; }
.stat-value { font-size: 24px; font-weight: bold; color: #2c5530; }
.stat-label { font-size: 12px; color: #666; text-transform: uppercase; }
table.dataTable { width: 100% !important; }
table.dataTable thead th { background: #2c5530; color: white; }
.species-link { color: #1a73e8; text-decoration: none; font-weight: 500; }
.species-link:hover { text-decoration: underline; }
.location-link, .checklist-link { color: #666; text-decoration: none; }
.location-link:hover, .checklist-link:hover { color: #1a73e8; }
footer { margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; font-size: 12px; color: #888; text-align: center; }
@media (max-width: 768px) { body { padding: 10px; } .container { padding: 15px; } .stats { flex-direction: column; gap: 15px; } }
"#;
