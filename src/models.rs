use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ CRM Models ============

/// Lead as returned by the Aturiya SDR-agent API.
///
/// Immutable once fetched; the pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLead {
    pub lead_id: String,
    pub agent_id: String,
    pub campaign_id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub task_status: Option<String>,
    #[serde(default)]
    pub campaign_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub lead_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Campaign summary. Unknown attributes are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Authenticated CRM user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Pagination block of a leads page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub has_next_page: bool,
}

/// Envelope used by every Aturiya list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

// ============ Enriched Models ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub description: Option<String>,
    pub industry: Option<String>,
    pub headcount: Option<String>,
    pub founded_year: Option<String>,
    pub region: Option<String>,
    pub estimated_revenue: Option<String>,
}

/// Technology identifiers exactly as the vendor listed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechStack(pub Vec<Value>);

impl TechStack {
    /// Renders each entry as plain text (strings without quotes).
    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(value_to_text).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingInfo {
    pub total_funding_usd: Option<i64>,
    pub funding_history: Option<Vec<Value>>,
    pub news_summary: Option<String>,
}

/// Most recent LinkedIn post texts, newest first, at most five.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkedInPosts(pub Vec<String>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentMetadata {
    pub enriched_at: DateTime<Utc>,
    pub signals_found: Vec<String>,
    pub signals_missed: Vec<String>,
    #[serde(rename = "pipe0_run_id")]
    pub run_id: Option<String>,
}

/// Outreach-ready lead: CRM identity and contact data plus whatever signals
/// the vendor resolved. Built once by the merge step and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedLead {
    pub lead_id: String,
    pub agent_id: String,
    pub campaign_id: String,
    pub campaign_name: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub designation: Option<String>,
    pub linkedin_url: Option<String>,
    pub website: Option<String>,

    pub company_overview: Option<CompanyOverview>,
    pub tech_stack: Option<TechStack>,
    pub funding: Option<FundingInfo>,
    pub linkedin_posts: Option<LinkedInPosts>,

    pub enrichment_metadata: EnrichmentMetadata,
}

/// Plain-text rendering of a JSON value: strings lose their quotes,
/// everything else uses its JSON form.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
