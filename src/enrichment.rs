/// Batch orchestration for lead enrichment.
///
/// Leads are cut into contiguous batches no larger than the vendor's
/// synchronous cap and sent one batch at a time:
/// 1. Build the position -> lead_id map for the batch
/// 2. Build the pipe0 request and run it synchronously
/// 3. Parse the response against the map
/// 4. Merge every lead of the batch, enriched or not
///
/// A failed batch never aborts the run; its leads come out unenriched.
use crate::config::{EnrichmentSettings, MAX_BATCH_SIZE};
use crate::errors::AppError;
use crate::merge::merge_lead;
use crate::models::{EnrichedLead, RawLead};
use crate::pipe0_models::{VendorRequest, VendorResponse};
use crate::request_builder::build_request;
use crate::response_parser::{parse_enrichment, EnrichmentRecord};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;

/// Anything that can run a synchronous enrichment call.
///
/// [`crate::pipe0_client::Pipe0Client`] is the production implementation.
pub trait EnrichmentVendor {
    fn enrich_sync(
        &self,
        request: &VendorRequest,
    ) -> impl Future<Output = Result<VendorResponse, AppError>> + Send;
}

/// 1-based submission position -> lead_id, for a single vendor call.
///
/// This relies on pipe0 keying its records by the positions we submitted.
/// If the vendor reordered or silently dropped records, affected leads
/// would quietly come out unenriched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchIndexMap {
    positions: BTreeMap<u32, String>,
}

impl BatchIndexMap {
    pub fn from_lead_ids<I>(lead_ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let positions = lead_ids
            .into_iter()
            .enumerate()
            .map(|(index, lead_id)| (index as u32 + 1, lead_id))
            .collect();
        Self { positions }
    }

    pub fn for_batch(batch: &[RawLead]) -> Self {
        Self::from_lead_ids(batch.iter().map(|lead| lead.lead_id.clone()))
    }

    pub fn lead_id(&self, position: u32) -> Option<&str> {
        self.positions.get(&position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Effective batch size: at least one, never above the vendor cap.
pub fn effective_batch_size(requested: usize) -> usize {
    requested.clamp(1, MAX_BATCH_SIZE)
}

/// Contiguous, order-preserving batches of at most `batch_size` leads.
pub fn chunk_leads(leads: &[RawLead], batch_size: usize) -> std::slice::Chunks<'_, RawLead> {
    leads.chunks(effective_batch_size(batch_size))
}

pub fn batch_count(lead_count: usize, batch_size: usize) -> usize {
    lead_count.div_ceil(effective_batch_size(batch_size))
}

/// Result of one vendor call for one batch.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Parsed records, keyed by lead_id; may cover only part of the batch.
    Enriched(HashMap<String, EnrichmentRecord>),
    /// No pipes were enabled, the vendor was not called.
    Skipped,
    /// The call or its response was unusable.
    Failed(AppError),
}

impl BatchOutcome {
    pub fn into_records(self) -> HashMap<String, EnrichmentRecord> {
        match self {
            BatchOutcome::Enriched(records) => records,
            BatchOutcome::Skipped | BatchOutcome::Failed(_) => HashMap::new(),
        }
    }
}

/// Runs one batch through the vendor and parses the result.
pub async fn enrich_batch<V>(
    vendor: &V,
    settings: &EnrichmentSettings,
    batch: &[RawLead],
) -> BatchOutcome
where
    V: EnrichmentVendor,
{
    let index_map = BatchIndexMap::for_batch(batch);

    let Some(request) = build_request(batch, &settings.pipes, &settings.environment) else {
        tracing::warn!("No enrichment pipes enabled, skipping vendor call");
        return BatchOutcome::Skipped;
    };

    match vendor.enrich_sync(&request).await {
        Ok(response) => BatchOutcome::Enriched(parse_enrichment(&response, &index_map)),
        Err(e) => BatchOutcome::Failed(e),
    }
}

fn merge_batch(
    batch: &[RawLead],
    mut records: HashMap<String, EnrichmentRecord>,
    out: &mut Vec<EnrichedLead>,
) {
    for lead in batch {
        let record = records.remove(&lead.lead_id).unwrap_or_default();
        tracing::debug!(
            "  {} @ {} - {} signals found, {} missed",
            lead.name,
            lead.organization.as_deref().unwrap_or("-"),
            record.signals_found.len(),
            record.signals_missed.len()
        );
        out.push(merge_lead(lead, &record));
    }
}

/// Enriches every lead, batch by batch, strictly sequentially.
///
/// Always returns exactly one enriched lead per input lead, in input order.
pub async fn enrich_leads<V>(
    vendor: &V,
    settings: &EnrichmentSettings,
    leads: &[RawLead],
) -> Vec<EnrichedLead>
where
    V: EnrichmentVendor,
{
    let total_batches = batch_count(leads.len(), settings.batch_size);
    let mut enriched = Vec::with_capacity(leads.len());

    for (batch_num, batch) in chunk_leads(leads, settings.batch_size).enumerate() {
        let batch_num = batch_num + 1;
        tracing::info!(
            "Enriching batch {}/{} ({} leads)",
            batch_num,
            total_batches,
            batch.len()
        );

        let records = match enrich_batch(vendor, settings, batch).await {
            BatchOutcome::Failed(e) => {
                tracing::error!(
                    "Batch {} failed: {}. Returning leads without enrichment.",
                    batch_num,
                    e
                );
                HashMap::new()
            }
            outcome => outcome.into_records(),
        };

        merge_batch(batch, records, &mut enriched);
    }

    tracing::info!("Enrichment complete: {} leads processed", enriched.len());
    enriched
}

/// Enriches a single lead through the same batch path.
pub async fn enrich_one<V>(vendor: &V, settings: &EnrichmentSettings, lead: &RawLead) -> EnrichedLead
where
    V: EnrichmentVendor,
{
    let batch = std::slice::from_ref(lead);
    let mut records = match enrich_batch(vendor, settings, batch).await {
        BatchOutcome::Failed(e) => {
            tracing::error!("Enrichment failed for {}: {}", lead.name, e);
            HashMap::new()
        }
        outcome => outcome.into_records(),
    };

    let record = records.remove(&lead.lead_id).unwrap_or_default();
    merge_lead(lead, &record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnrichmentPipes;
    use serde_json::json;
    use std::sync::Mutex;

    fn lead(id: usize) -> RawLead {
        serde_json::from_value(json!({
            "lead_id": format!("lead-{}", id),
            "agent_id": "agent",
            "campaign_id": "camp",
            "name": format!("Person {}", id),
            "email": format!("p{}@company{}.com", id, id)
        }))
        .unwrap()
    }

    /// Answers every record with one completed headcount field, and fails
    /// the calls listed in `fail_calls` (1-based).
    struct ScriptedVendor {
        fail_calls: Vec<usize>,
        calls: Mutex<Vec<VendorRequest>>,
    }

    impl ScriptedVendor {
        fn new(fail_calls: Vec<usize>) -> Self {
            Self {
                fail_calls,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl EnrichmentVendor for ScriptedVendor {
        fn enrich_sync(
            &self,
            request: &VendorRequest,
        ) -> impl Future<Output = Result<VendorResponse, AppError>> + Send {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(request.clone());
                calls.len()
            };
            let fail = self.fail_calls.contains(&call);
            let mut records = serde_json::Map::new();
            for entry in &request.input {
                records.insert(
                    entry.id.to_string(),
                    json!({"fields": {"headcount": {"status": "completed", "value": "10"}}}),
                );
            }
            let body = json!({"id": format!("run-{}", call), "records": records});
            async move {
                if fail {
                    Err(AppError::ExternalApiError("pipe0 returned 503".to_string()))
                } else {
                    Ok(serde_json::from_value(body).unwrap())
                }
            }
        }
    }

    #[test]
    fn test_index_map_is_one_based() {
        let map = BatchIndexMap::for_batch(&[lead(7), lead(3)]);
        assert_eq!(map.lead_id(1), Some("lead-7"));
        assert_eq!(map.lead_id(2), Some("lead-3"));
        assert_eq!(map.lead_id(0), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_chunking() {
        let leads: Vec<RawLead> = (0..20).map(lead).collect();
        let sizes: Vec<usize> = chunk_leads(&leads, 9).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![9, 9, 2]);
        assert_eq!(batch_count(20, 9), 3);
        assert_eq!(batch_count(0, 9), 0);
        // Oversized requests are clamped to the vendor cap
        assert_eq!(chunk_leads(&leads, 50).next().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_failed_middle_batch_does_not_abort() {
        let vendor = ScriptedVendor::new(vec![2]);
        let settings = EnrichmentSettings {
            batch_size: 3,
            ..Default::default()
        };
        let leads: Vec<RawLead> = (0..9).map(lead).collect();

        let enriched = enrich_leads(&vendor, &settings, &leads).await;

        assert_eq!(enriched.len(), 9);
        for (i, out) in enriched.iter().enumerate() {
            assert_eq!(out.lead_id, leads[i].lead_id);
            let meta = &out.enrichment_metadata;
            if (3..6).contains(&i) {
                assert!(meta.signals_found.is_empty());
                assert!(meta.signals_missed.is_empty());
                assert!(meta.run_id.is_none());
                assert!(out.company_overview.is_none());
            } else {
                assert_eq!(meta.signals_found, vec!["headcount"]);
                assert!(out.company_overview.is_some());
            }
        }
        assert_eq!(enriched[0].enrichment_metadata.run_id.as_deref(), Some("run-1"));
        assert_eq!(enriched[8].enrichment_metadata.run_id.as_deref(), Some("run-3"));
    }

    #[tokio::test]
    async fn test_each_batch_restarts_positions() {
        let vendor = ScriptedVendor::new(vec![]);
        let settings = EnrichmentSettings {
            batch_size: 2,
            ..Default::default()
        };
        let leads: Vec<RawLead> = (0..3).map(lead).collect();
        enrich_leads(&vendor, &settings, &leads).await;

        let calls = vendor.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let second: Vec<u32> = calls[1].input.iter().map(|e| e.id).collect();
        assert_eq!(second, vec![1]);
        assert_eq!(
            calls[1].input[0].company_website_url.as_deref(),
            Some("company2.com")
        );
    }

    #[tokio::test]
    async fn test_no_pipes_skips_vendor() {
        let vendor = ScriptedVendor::new(vec![]);
        let settings = EnrichmentSettings {
            pipes: EnrichmentPipes::none(),
            ..Default::default()
        };
        let leads: Vec<RawLead> = (0..4).map(lead).collect();

        let enriched = enrich_leads(&vendor, &settings, &leads).await;

        assert_eq!(enriched.len(), 4);
        assert!(vendor.calls.lock().unwrap().is_empty());
        assert!(enriched
            .iter()
            .all(|l| l.enrichment_metadata.signals_found.is_empty()));
    }

    #[tokio::test]
    async fn test_enrich_one_degrades_on_failure() {
        let vendor = ScriptedVendor::new(vec![1]);
        let out = enrich_one(&vendor, &EnrichmentSettings::default(), &lead(1)).await;
        assert_eq!(out.lead_id, "lead-1");
        assert!(out.enrichment_metadata.run_id.is_none());

        let vendor = ScriptedVendor::new(vec![]);
        let out = enrich_one(&vendor, &EnrichmentSettings::default(), &lead(1)).await;
        assert_eq!(out.enrichment_metadata.run_id.as_deref(), Some("run-1"));
    }
}
