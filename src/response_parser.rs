//! Turns a pipe0 run response into per-lead enrichment records.

use crate::enrichment::BatchIndexMap;
use crate::pipe0_models::{VendorField, VendorResponse};
use crate::signals::SignalField;
use serde_json::Value;
use std::collections::HashMap;

/// Signals resolved for one lead by one vendor run.
///
/// A field name lands in at most one of `signals_found` / `signals_missed`;
/// input echoes land in neither.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentRecord {
    pub values: HashMap<SignalField, Value>,
    pub signals_found: Vec<String>,
    pub signals_missed: Vec<String>,
    pub run_id: Option<String>,
}

impl EnrichmentRecord {
    /// Record for a lead the vendor returned nothing for.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &SignalField) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &SignalField) -> bool {
        self.values.contains_key(field)
    }

    fn record_found(&mut self, field: SignalField, value: Value) {
        self.signals_found.push(field.as_str().to_string());
        self.values.insert(field, value);
    }

    fn record_missed(&mut self, field: SignalField) {
        self.signals_missed.push(field.as_str().to_string());
    }
}

/// Resolves the batch position of a record: the map key if numeric,
/// otherwise the record's own `id`.
fn record_position(key: &str, explicit: Option<u32>) -> Option<u32> {
    key.trim().parse::<u32>().ok().or(explicit)
}

/// Parses a response into `lead_id -> EnrichmentRecord`.
///
/// Only leads whose position appears in the response are present. Records
/// whose position is not in `index_map` are dropped.
pub fn parse_enrichment(
    response: &VendorResponse,
    index_map: &BatchIndexMap,
) -> HashMap<String, EnrichmentRecord> {
    let mut results = HashMap::new();

    for (key, record) in &response.records {
        let Some(position) = record_position(key, record.explicit_id()) else {
            tracing::debug!("Dropping pipe0 record with unusable key '{}'", key);
            continue;
        };
        let Some(lead_id) = index_map.lead_id(position) else {
            tracing::debug!("Dropping pipe0 record at unmapped position {}", position);
            continue;
        };

        let mut enrichment = EnrichmentRecord {
            run_id: response.run_id.clone(),
            ..Default::default()
        };

        for (name, raw_field) in &record.fields {
            if VendorField::is_raw_input_echo(raw_field) {
                continue;
            }

            let field = SignalField::from(name.as_str());
            // A field we cannot decode is treated as unresolved
            let data: VendorField = serde_json::from_value(raw_field.clone()).unwrap_or_default();

            match data.resolved_value() {
                Some(value) => enrichment.record_found(field, value.clone()),
                None => enrichment.record_missed(field),
            }
        }

        results.insert(lead_id.to_string(), enrichment);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index_map(ids: &[&str]) -> BatchIndexMap {
        BatchIndexMap::from_lead_ids(ids.iter().map(|s| s.to_string()))
    }

    fn response(value: Value) -> VendorResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_found_missed_and_echo() {
        let resp = response(json!({
            "id": "run-42",
            "records": {
                "1": {
                    "fields": {
                        "company_website_url": {
                            "status": "completed",
                            "value": "acme.io",
                            "resolved_by": {"ref": "input"}
                        },
                        "company_industry": {"status": "completed", "value": "SaaS"},
                        "headcount": {"status": "completed", "value": null},
                        "technology_list": {"status": "failed", "value": ["React"]},
                        "funding_total_usd": {"status": "no_result"}
                    }
                }
            }
        }));

        let parsed = parse_enrichment(&resp, &index_map(&["lead-a"]));
        let record = &parsed["lead-a"];

        assert_eq!(record.signals_found, vec!["company_industry"]);
        assert_eq!(
            record.signals_missed,
            vec!["headcount", "technology_list", "funding_total_usd"]
        );
        assert_eq!(record.get(&SignalField::CompanyIndustry), Some(&json!("SaaS")));
        assert!(!record.contains(&SignalField::TechnologyList));
        assert!(!record.contains(&SignalField::Other("company_website_url".into())));
        assert_eq!(record.run_id.as_deref(), Some("run-42"));
    }

    #[test]
    fn test_echo_with_malformed_status_is_skipped() {
        let resp = response(json!({
            "id": "run-43",
            "records": {
                "1": {
                    "fields": {
                        "company_website_url": {
                            "status": null,
                            "value": "acme.io",
                            "resolved_by": {"ref": "input"}
                        },
                        "company_name": {
                            "status": ["odd"],
                            "resolved_by": {"ref": "input"}
                        },
                        "headcount": {"status": 3, "value": "40"}
                    }
                }
            }
        }));

        let record = &parse_enrichment(&resp, &index_map(&["lead-a"]))["lead-a"];
        assert!(record.signals_found.is_empty());
        assert_eq!(record.signals_missed, vec!["headcount"]);
    }

    #[test]
    fn test_positions_map_to_lead_ids() {
        let resp = response(json!({
            "id": "run-1",
            "records": {
                "2": {"fields": {"headcount": {"status": "completed", "value": "50"}}},
                "1": {"fields": {"headcount": {"status": "completed", "value": "10"}}}
            }
        }));

        let parsed = parse_enrichment(&resp, &index_map(&["first", "second"]));
        assert_eq!(parsed["first"].get(&SignalField::Headcount), Some(&json!("10")));
        assert_eq!(parsed["second"].get(&SignalField::Headcount), Some(&json!("50")));
    }

    #[test]
    fn test_non_numeric_key_falls_back_to_record_id() {
        let resp = response(json!({
            "records": {
                "rec_abc": {"id": 2, "fields": {}}
            }
        }));
        let parsed = parse_enrichment(&resp, &index_map(&["first", "second"]));
        assert!(parsed.contains_key("second"));
        assert_eq!(parsed["second"].run_id, None);
    }

    #[test]
    fn test_unmapped_positions_are_dropped() {
        let resp = response(json!({
            "id": "run-1",
            "records": {
                "7": {"fields": {"headcount": {"status": "completed", "value": "9"}}},
                "junk": {"fields": {}}
            }
        }));
        let parsed = parse_enrichment(&resp, &index_map(&["only"]));
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_absent_leads_not_reported() {
        let resp = response(json!({
            "id": "run-1",
            "records": {"1": {"fields": {}}}
        }));
        let parsed = parse_enrichment(&resp, &index_map(&["a", "b", "c"]));
        assert_eq!(parsed.len(), 1);
        assert!(parsed["a"].signals_found.is_empty());
        assert!(parsed["a"].signals_missed.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_classified() {
        let resp = response(json!({
            "records": {
                "1": {"fields": {
                    "company_logo_url": {"status": "completed", "value": "https://cdn/logo.png"},
                    "weird": "not an object"
                }}
            }
        }));
        let parsed = parse_enrichment(&resp, &index_map(&["a"]));
        assert_eq!(parsed["a"].signals_found, vec!["company_logo_url"]);
        assert_eq!(parsed["a"].signals_missed, vec!["weird"]);
    }
}
