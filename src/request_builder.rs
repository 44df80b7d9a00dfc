//! Converts raw leads into pipe0's input schema.

use crate::config::EnrichmentPipes;
use crate::models::RawLead;
use crate::pipe0_models::{PipeRef, RunConfig, VendorInputEntry, VendorRequest};
use crate::signals::SignalType;

/// Free mailbox providers; their domain says nothing about the employer.
pub const GENERIC_EMAIL_DOMAINS: [&str; 4] =
    ["gmail.com", "yahoo.com", "hotmail.com", "outlook.com"];

/// Pipe list for the enabled signal types, in table order.
///
/// Returns `None` when nothing is enabled; the caller must then skip the
/// vendor call and leave every lead unenriched.
pub fn build_pipes(pipes: &EnrichmentPipes) -> Option<Vec<PipeRef>> {
    let refs: Vec<PipeRef> = SignalType::ALL
        .into_iter()
        .filter(|signal| pipes.is_enabled(*signal))
        .map(|signal| PipeRef {
            pipe_id: signal.pipe_id().to_string(),
        })
        .collect();

    if refs.is_empty() {
        None
    } else {
        Some(refs)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Company identifier for a lead: the website verbatim, else the email
/// domain unless it belongs to a generic mailbox provider.
pub fn company_identifier(lead: &RawLead) -> Option<String> {
    if let Some(website) = lead.website.as_deref().filter(|w| !w.trim().is_empty()) {
        return Some(website.to_string());
    }

    let email = non_empty(lead.email.as_deref())?;
    let (_, domain) = email.split_once('@')?;
    // Multiple '@' are malformed but keep whatever follows the first one
    let domain = domain.split('@').next().unwrap_or(domain).trim();
    if domain.is_empty() {
        return None;
    }
    if GENERIC_EMAIL_DOMAINS
        .iter()
        .any(|generic| generic.eq_ignore_ascii_case(domain))
    {
        return None;
    }
    Some(domain.to_string())
}

/// Builds one input entry per lead. Positions are 1-based and follow the
/// order of `leads`, not their ids.
pub fn build_input(leads: &[RawLead]) -> Vec<VendorInputEntry> {
    leads
        .iter()
        .enumerate()
        .map(|(index, lead)| {
            let mut entry = VendorInputEntry::new(index as u32 + 1);
            entry.company_website_url = company_identifier(lead);
            entry.company_name = non_empty(lead.organization.as_deref()).map(String::from);
            entry.profile_url = non_empty(lead.linkedin_url.as_deref()).map(String::from);
            entry
        })
        .collect()
}

/// Full run request for a batch, or `None` when no pipes are enabled.
pub fn build_request(
    leads: &[RawLead],
    pipes: &EnrichmentPipes,
    environment: &str,
) -> Option<VendorRequest> {
    let pipes = build_pipes(pipes)?;
    Some(VendorRequest {
        pipes,
        input: build_input(leads),
        config: RunConfig {
            environment: environment.to_string(),
        },
    })
}
