//! Lead Enrichment Library
//!
//! Ingests sales leads from the Aturiya CRM, enriches them with
//! firmographic, technographic and financial signals from pipe0, and
//! produces outreach-ready lead records.
//!
//! # Modules
//!
//! - `aturiya_client`: CRM client (auth, campaigns, paginated leads).
//! - `config`: Configuration management.
//! - `enrichment`: Batch orchestration of vendor calls.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `ingest`: Ingestion stage of a pipeline run.
//! - `merge`: Folding enrichment into the enriched-lead shape.
//! - `models`: Raw and enriched lead models.
//! - `output`: JSON / CSV writers and run summary.
//! - `pipe0_client`: Enrichment vendor client.
//! - `pipe0_models`: Enrichment vendor wire types.
//! - `request_builder`: Vendor input construction.
//! - `response_parser`: Vendor response classification.
//! - `signals`: Known signal types and field names.

pub mod aturiya_client;
pub mod config;
pub mod enrichment;
pub mod errors;
pub mod handlers;
pub mod ingest;
pub mod merge;
pub mod models;
pub mod output;
pub mod pipe0_client;
pub mod pipe0_models;
pub mod request_builder;
pub mod response_parser;
pub mod signals;
