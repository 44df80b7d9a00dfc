//! Wire types for the pipe0 enrichment API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reference to one vendor pipe in a run request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeRef {
    pub pipe_id: String,
}

/// One record submitted to pipe0.
///
/// `id` is the 1-based position inside the batch and is the only join key
/// between request and response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorInputEntry {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

impl VendorInputEntry {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            company_website_url: None,
            company_name: None,
            profile_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub environment: String,
}

/// Body of both the sync and the async run endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRequest {
    pub pipes: Vec<PipeRef>,
    pub input: Vec<VendorInputEntry>,
    pub config: RunConfig,
}

/// Who resolved a field. `ref == "input"` means the value is an echo of
/// what we submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBy {
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
}

/// Per-field state inside a vendor record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorField {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub resolved_by: Option<ResolvedBy>,
}

impl VendorField {
    /// `resolved_by.ref == "input"`, checked on the undecoded field so it
    /// holds even when the rest of the field is malformed.
    pub fn is_raw_input_echo(raw: &Value) -> bool {
        raw.get("resolved_by")
            .and_then(|resolved_by| resolved_by.get("ref"))
            .and_then(Value::as_str)
            == Some("input")
    }

    /// Completed with a non-null value.
    pub fn resolved_value(&self) -> Option<&Value> {
        if self.status.as_deref() != Some("completed") {
            return None;
        }
        self.value.as_ref().filter(|v| !v.is_null())
    }
}

/// One output record. `fields` keeps vendor ordering; each entry is
/// decoded into a [`VendorField`] lazily so one odd field does not sink
/// the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
}

impl VendorRecord {
    /// Explicit record id, numeric or numeric string.
    pub fn explicit_id(&self) -> Option<u32> {
        match self.id.as_ref()? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Run status snapshot, returned by the sync endpoint and by polling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "VendorResponseWire")]
pub struct VendorResponse {
    #[serde(rename = "id")]
    pub run_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub records: BTreeMap<String, VendorRecord>,
    #[serde(default)]
    pub errors: Option<Value>,
}

/// Responses name the run `id`, some also (or only) `run_id`.
#[derive(Deserialize)]
struct VendorResponseWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    run_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    records: BTreeMap<String, VendorRecord>,
    #[serde(default)]
    errors: Option<Value>,
}

impl From<VendorResponseWire> for VendorResponse {
    fn from(wire: VendorResponseWire) -> Self {
        Self {
            run_id: wire.id.or(wire.run_id),
            status: wire.status,
            records: wire.records,
            errors: wire.errors,
        }
    }
}

impl VendorResponse {
    pub fn run_status(&self) -> RunStatus {
        RunStatus::from(self.status.as_deref().unwrap_or(""))
    }

    /// Vendor-reported errors, if any were non-empty.
    pub fn reported_errors(&self) -> Option<&Value> {
        self.errors.as_ref().filter(|errors| match errors {
            Value::Null => false,
            Value::Array(list) => !list.is_empty(),
            Value::Object(map) => !map.is_empty(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
    }
}

/// Reply of the async run endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RunStarted {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl From<&str> for RunStatus {
    fn from(status: &str) -> Self {
        match status {
            "pending" => RunStatus::Pending,
            "processing" => RunStatus::Processing,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            other => RunStatus::Other(other.to_string()),
        }
    }
}
