//! Folds a raw lead and its enrichment record into the outreach-ready shape.

use crate::models::{
    value_to_text, CompanyOverview, EnrichedLead, EnrichmentMetadata, FundingInfo, LinkedInPosts,
    RawLead, TechStack,
};
use crate::response_parser::EnrichmentRecord;
use crate::signals::SignalField;
use chrono::Utc;
use serde_json::Value;

/// Most recent posts kept per lead.
pub const MAX_LINKEDIN_POSTS: usize = 5;

fn text(record: &EnrichmentRecord, field: SignalField) -> Option<String> {
    record.get(&field).map(value_to_text)
}

/// Present iff at least one of the six overview fields resolved.
fn company_overview(record: &EnrichmentRecord) -> Option<CompanyOverview> {
    if !SignalField::OVERVIEW.iter().any(|f| record.contains(f)) {
        return None;
    }
    Some(CompanyOverview {
        description: text(record, SignalField::CompanyDescription),
        industry: text(record, SignalField::CompanyIndustry),
        headcount: text(record, SignalField::Headcount),
        founded_year: text(record, SignalField::FoundedYear),
        region: text(record, SignalField::CompanyRegion),
        estimated_revenue: text(record, SignalField::EstimatedRevenue),
    })
}

fn tech_stack(record: &EnrichmentRecord) -> Option<TechStack> {
    match record.get(&SignalField::TechnologyList)? {
        Value::Array(items) => Some(TechStack(items.clone())),
        single => Some(TechStack(vec![single.clone()])),
    }
}

/// Whole dollars; numeric strings like `"$1,500,000"` are accepted too.
/// Anything else left after dropping `$`, `,` and whitespace (units such as
/// `"1.5M"`) is not a number.
fn funding_total(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
                .collect();
            cleaned.parse::<i64>().ok().or_else(|| {
                cleaned
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn funding(record: &EnrichmentRecord) -> Option<FundingInfo> {
    let has_total = record.contains(&SignalField::FundingTotalUsd);
    let has_history = record.contains(&SignalField::FundingHistory);
    if !has_total && !has_history {
        return None;
    }

    let funding_history = record
        .get(&SignalField::FundingHistory)
        .map(|history| match history {
            Value::Array(items) => items.clone(),
            single => vec![single.clone()],
        });

    Some(FundingInfo {
        total_funding_usd: record
            .get(&SignalField::FundingTotalUsd)
            .and_then(funding_total),
        funding_history,
        news_summary: text(record, SignalField::CompanyNewsSummary),
    })
}

fn post_text(post: &Value) -> String {
    match post {
        Value::Object(map) => map
            .get("text")
            .map(value_to_text)
            .unwrap_or_else(|| post.to_string()),
        other => value_to_text(other),
    }
}

fn linkedin_posts(record: &EnrichmentRecord) -> Option<LinkedInPosts> {
    if let Some(Value::Array(posts)) = record.get(&SignalField::CrustdataPostList) {
        if !posts.is_empty() {
            return Some(LinkedInPosts(
                posts.iter().take(MAX_LINKEDIN_POSTS).map(post_text).collect(),
            ));
        }
    }

    match record.get(&SignalField::PostListString) {
        Some(Value::String(s)) if s.is_empty() => None,
        Some(combined) => Some(LinkedInPosts(vec![value_to_text(combined)])),
        None => None,
    }
}

/// Builds the enriched lead. Missing data only ever makes a part absent;
/// the metadata block is always present and stamped now.
pub fn merge_lead(raw: &RawLead, record: &EnrichmentRecord) -> EnrichedLead {
    EnrichedLead {
        lead_id: raw.lead_id.clone(),
        agent_id: raw.agent_id.clone(),
        campaign_id: raw.campaign_id.clone(),
        campaign_name: raw.campaign_name.clone(),
        name: raw.name.clone(),
        email: raw.email.clone(),
        phone: raw.phone.clone(),
        organization: raw.organization.clone(),
        designation: raw.designation.clone(),
        linkedin_url: raw.linkedin_url.clone(),
        website: raw.website.clone(),
        company_overview: company_overview(record),
        tech_stack: tech_stack(record),
        funding: funding(record),
        linkedin_posts: linkedin_posts(record),
        enrichment_metadata: EnrichmentMetadata {
            enriched_at: Utc::now(),
            signals_found: record.signals_found.clone(),
            signals_missed: record.signals_missed.clone(),
            run_id: record.run_id.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw() -> RawLead {
        serde_json::from_value(json!({
            "lead_id": "l-1",
            "agent_id": "a-1",
            "campaign_id": "c-1",
            "campaign_name": "Launch",
            "name": "Grace Hopper",
            "email": "grace@navy.mil",
            "organization": "US Navy"
        }))
        .unwrap()
    }

    fn record(fields: &[(SignalField, Value)]) -> EnrichmentRecord {
        let mut record = EnrichmentRecord::empty();
        for (field, value) in fields {
            record.values.insert(field.clone(), value.clone());
            record.signals_found.push(field.as_str().to_string());
        }
        record.run_id = Some("run-9".to_string());
        record
    }

    #[test]
    fn test_empty_record_yields_bare_lead() {
        let lead = merge_lead(&raw(), &EnrichmentRecord::empty());
        assert_eq!(lead.lead_id, "l-1");
        assert_eq!(lead.organization.as_deref(), Some("US Navy"));
        assert!(lead.company_overview.is_none());
        assert!(lead.tech_stack.is_none());
        assert!(lead.funding.is_none());
        assert!(lead.linkedin_posts.is_none());
        assert!(lead.enrichment_metadata.signals_found.is_empty());
        assert!(lead.enrichment_metadata.signals_missed.is_empty());
        assert!(lead.enrichment_metadata.run_id.is_none());
    }

    #[test]
    fn test_single_overview_field_builds_overview() {
        let lead = merge_lead(&raw(), &record(&[(SignalField::FoundedYear, json!(1998))]));
        let overview = lead.company_overview.unwrap();
        assert_eq!(overview.founded_year.as_deref(), Some("1998"));
        assert!(overview.description.is_none());
        assert!(overview.industry.is_none());
        assert!(overview.headcount.is_none());
        assert!(overview.region.is_none());
        assert!(overview.estimated_revenue.is_none());
    }

    #[test]
    fn test_non_overview_fields_do_not_build_overview() {
        let lead = merge_lead(
            &raw(),
            &record(&[(SignalField::CompanyNewsSummary, json!("Raised a round"))]),
        );
        assert!(lead.company_overview.is_none());
        // News alone does not make a funding block
        assert!(lead.funding.is_none());
    }

    #[test]
    fn test_tech_stack_verbatim() {
        let lead = merge_lead(
            &raw(),
            &record(&[(SignalField::TechnologyList, json!(["React", "Stripe"]))]),
        );
        assert_eq!(lead.tech_stack, Some(TechStack(vec![json!("React"), json!("Stripe")])));
    }

    #[test]
    fn test_funding_with_news() {
        let lead = merge_lead(
            &raw(),
            &record(&[
                (SignalField::FundingTotalUsd, json!(2500000)),
                (SignalField::CompanyNewsSummary, json!("Series A")),
            ]),
        );
        let funding = lead.funding.unwrap();
        assert_eq!(funding.total_funding_usd, Some(2_500_000));
        assert_eq!(funding.funding_history, None);
        assert_eq!(funding.news_summary.as_deref(), Some("Series A"));
    }

    #[test]
    fn test_funding_total_from_string() {
        assert_eq!(funding_total(&json!("$1,200,000")), Some(1_200_000));
        assert_eq!(funding_total(&json!(12.9)), Some(12));
        assert_eq!(funding_total(&json!({"amount": 1})), None);
        assert_eq!(funding_total(&json!(" 2500000.75 ")), Some(2_500_000));
    }

    #[test]
    fn test_funding_total_rejects_unit_suffixes() {
        assert_eq!(funding_total(&json!("1.5M")), None);
        assert_eq!(funding_total(&json!("$2.5 billion")), None);
        assert_eq!(funding_total(&json!("NaN")), None);
        assert_eq!(funding_total(&json!("")), None);
    }

    #[test]
    fn test_funding_total_keeps_sign() {
        assert_eq!(funding_total(&json!("-500")), Some(-500));
        assert_eq!(funding_total(&json!(-500)), Some(-500));
    }

    #[test]
    fn test_first_five_posts_in_order() {
        let posts: Vec<Value> = (1..=7).map(|i| json!({"text": format!("post {}", i)})).collect();
        let lead = merge_lead(
            &raw(),
            &record(&[(SignalField::CrustdataPostList, Value::Array(posts))]),
        );
        assert_eq!(
            lead.linkedin_posts.unwrap().0,
            vec!["post 1", "post 2", "post 3", "post 4", "post 5"]
        );
    }

    #[test]
    fn test_post_without_text_is_rendered() {
        let lead = merge_lead(
            &raw(),
            &record(&[(
                SignalField::CrustdataPostList,
                json!([{"url": "https://lnkd.in/x"}, "plain"]),
            )]),
        );
        assert_eq!(
            lead.linkedin_posts.unwrap().0,
            vec![r#"{"url":"https://lnkd.in/x"}"#.to_string(), "plain".to_string()]
        );
    }

    #[test]
    fn test_combined_post_string_fallback() {
        let lead = merge_lead(
            &raw(),
            &record(&[(SignalField::PostListString, json!("Hiring! | Shipped v2"))]),
        );
        assert_eq!(lead.linkedin_posts.unwrap().0, vec!["Hiring! | Shipped v2"]);
    }

    #[test]
    fn test_metadata_carries_run() {
        let lead = merge_lead(&raw(), &record(&[(SignalField::Headcount, json!("120"))]));
        assert_eq!(lead.enrichment_metadata.run_id.as_deref(), Some("run-9"));
        assert_eq!(lead.enrichment_metadata.signals_found, vec!["headcount"]);
    }
}
