//! JSON / CSV writers and the end-of-run summary.

use crate::models::EnrichedLead;
use anyhow::Context;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const JSON_FILE_NAME: &str = "enriched_leads.json";
pub const CSV_FILE_NAME: &str = "enriched_leads.csv";

/// Posts kept in the flattened `linkedin_posts` column.
const CSV_POST_LIMIT: usize = 3;

/// Output formats selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    Both,
}

impl OutputFormat {
    pub fn wants_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    pub fn wants_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }
}

/// Writes all leads as one pretty-printed JSON array.
pub fn save_json(leads: &[EnrichedLead], dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output dir {}", dir.display()))?;
    let path = dir.join(JSON_FILE_NAME);
    let data = serde_json::to_string_pretty(leads)?;
    fs::write(&path, data).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Saved {} leads to {}", leads.len(), path.display());
    Ok(path)
}

type Row = Vec<(&'static str, Option<String>)>;

/// One flat row per lead. A column appears in a row whenever its
/// sub-object exists, even if that particular value is empty.
pub fn flatten_lead(lead: &EnrichedLead) -> Row {
    let mut row: Row = vec![
        ("lead_id", Some(lead.lead_id.clone())),
        ("name", Some(lead.name.clone())),
        ("email", lead.email.clone()),
        ("phone", lead.phone.clone()),
        ("organization", lead.organization.clone()),
        ("designation", lead.designation.clone()),
        ("linkedin_url", lead.linkedin_url.clone()),
        ("website", lead.website.clone()),
        ("campaign_id", Some(lead.campaign_id.clone())),
        ("campaign_name", lead.campaign_name.clone()),
    ];

    if let Some(overview) = &lead.company_overview {
        row.extend([
            ("company_description", overview.description.clone()),
            ("company_industry", overview.industry.clone()),
            ("company_headcount", overview.headcount.clone()),
            ("company_founded_year", overview.founded_year.clone()),
            ("company_region", overview.region.clone()),
            ("company_estimated_revenue", overview.estimated_revenue.clone()),
        ]);
    }

    if let Some(stack) = lead.tech_stack.as_ref().filter(|s| !s.0.is_empty()) {
        row.push(("tech_stack", Some(stack.labels().join(", "))));
    }

    if let Some(funding) = &lead.funding {
        row.extend([
            (
                "total_funding_usd",
                funding.total_funding_usd.map(|t| t.to_string()),
            ),
            (
                "funding_history",
                funding
                    .funding_history
                    .as_ref()
                    .filter(|h| !h.is_empty())
                    .and_then(|h| serde_json::to_string(h).ok()),
            ),
            ("company_news_summary", funding.news_summary.clone()),
        ]);
    }

    if let Some(posts) = lead.linkedin_posts.as_ref().filter(|p| !p.0.is_empty()) {
        let shown: Vec<&str> = posts
            .0
            .iter()
            .take(CSV_POST_LIMIT)
            .map(String::as_str)
            .collect();
        row.push(("linkedin_posts", Some(shown.join(" | "))));
    }

    let meta = &lead.enrichment_metadata;
    row.extend([
        ("signals_found", Some(meta.signals_found.join(", "))),
        ("signals_missed", Some(meta.signals_missed.join(", "))),
        ("enriched_at", Some(meta.enriched_at.to_rfc3339())),
        ("run_id", meta.run_id.clone()),
    ]);

    row
}

/// Union of the columns of all rows, in first-seen order.
fn column_union(rows: &[Row]) -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = Vec::new();
    for row in rows {
        for (key, _) in row {
            if !columns.contains(key) {
                columns.push(*key);
            }
        }
    }
    columns
}

/// Writes the flattened CSV. Nothing is written when `leads` is empty.
pub fn save_csv(leads: &[EnrichedLead], dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output dir {}", dir.display()))?;
    let path = dir.join(CSV_FILE_NAME);

    let rows: Vec<Row> = leads.iter().map(flatten_lead).collect();
    if !rows.is_empty() {
        let columns = column_union(&rows);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        writer.write_record(&columns)?;
        for row in &rows {
            let record: Vec<&str> = columns
                .iter()
                .map(|column| {
                    row.iter()
                        .find(|(key, _)| key == column)
                        .and_then(|(_, value)| value.as_deref())
                        .unwrap_or("")
                })
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }

    tracing::info!("Saved {} leads to {}", leads.len(), path.display());
    Ok(path)
}

/// Coverage counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub total: usize,
    pub with_overview: usize,
    pub with_tech_stack: usize,
    pub with_funding: usize,
    pub with_posts: usize,
    pub signals_found: usize,
    pub signals_missed: usize,
}

impl EnrichmentSummary {
    pub fn from_leads(leads: &[EnrichedLead]) -> Self {
        let mut summary = Self {
            total: leads.len(),
            ..Default::default()
        };
        for lead in leads {
            summary.with_overview += lead.company_overview.is_some() as usize;
            summary.with_tech_stack +=
                lead.tech_stack.as_ref().is_some_and(|s| !s.0.is_empty()) as usize;
            summary.with_funding += lead.funding.is_some() as usize;
            summary.with_posts +=
                lead.linkedin_posts.as_ref().is_some_and(|p| !p.0.is_empty()) as usize;
            summary.signals_found += lead.enrichment_metadata.signals_found.len();
            summary.signals_missed += lead.enrichment_metadata.signals_missed.len();
        }
        summary
    }
}

impl fmt::Display for EnrichmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "ENRICHMENT SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total leads processed:    {}", self.total)?;
        writeln!(f, "With company overview:    {}/{}", self.with_overview, self.total)?;
        writeln!(f, "With tech stack:          {}/{}", self.with_tech_stack, self.total)?;
        writeln!(f, "With funding data:        {}/{}", self.with_funding, self.total)?;
        writeln!(f, "With LinkedIn posts:      {}/{}", self.with_posts, self.total)?;
        writeln!(f, "Total signals found:      {}", self.signals_found)?;
        writeln!(f, "Total signals missed:     {}", self.signals_missed)?;
        write!(f, "{}", rule)
    }
}
