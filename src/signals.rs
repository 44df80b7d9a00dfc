//! Known enrichment signal types and vendor field names.

use std::fmt;
use std::str::FromStr;

/// One category of supplemental data obtainable from pipe0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    CompanyOverview,
    TechStack,
    Funding,
    News,
    LinkedinPosts,
}

impl SignalType {
    /// Request order of the pipe list.
    pub const ALL: [SignalType; 5] = [
        SignalType::CompanyOverview,
        SignalType::TechStack,
        SignalType::Funding,
        SignalType::News,
        SignalType::LinkedinPosts,
    ];

    /// pipe0 pipe that produces this signal.
    pub fn pipe_id(self) -> &'static str {
        match self {
            SignalType::CompanyOverview => "company:overview@2",
            SignalType::TechStack => "company:techstack:builtwith@1",
            SignalType::Funding => "company:funding:leadmagic@1",
            SignalType::News => "company:newssummary:website@1",
            SignalType::LinkedinPosts => "people:posts:crustdata@1",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::CompanyOverview => "company_overview",
            SignalType::TechStack => "tech_stack",
            SignalType::Funding => "funding",
            SignalType::News => "news",
            SignalType::LinkedinPosts => "linkedin_posts",
        }
    }
}

impl FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalType::ALL
            .into_iter()
            .find(|signal| signal.as_str() == s)
            .ok_or_else(|| format!("unknown signal type: {}", s))
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field name as it appears in a pipe0 record.
///
/// Fields this crate knows how to merge get their own variant; anything else
/// the vendor sends is kept as `Other` so it still shows up in the
/// found/missed bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalField {
    CompanyDescription,
    CompanyIndustry,
    Headcount,
    FoundedYear,
    CompanyRegion,
    EstimatedRevenue,
    TechnologyList,
    FundingTotalUsd,
    FundingHistory,
    CompanyNewsSummary,
    CrustdataPostList,
    PostListString,
    Other(String),
}

impl SignalField {
    /// The six fields that make up a company overview.
    pub const OVERVIEW: [SignalField; 6] = [
        SignalField::CompanyDescription,
        SignalField::CompanyIndustry,
        SignalField::Headcount,
        SignalField::FoundedYear,
        SignalField::CompanyRegion,
        SignalField::EstimatedRevenue,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SignalField::CompanyDescription => "company_description",
            SignalField::CompanyIndustry => "company_industry",
            SignalField::Headcount => "headcount",
            SignalField::FoundedYear => "founded_year",
            SignalField::CompanyRegion => "company_region",
            SignalField::EstimatedRevenue => "estimated_revenue",
            SignalField::TechnologyList => "technology_list",
            SignalField::FundingTotalUsd => "funding_total_usd",
            SignalField::FundingHistory => "funding_history",
            SignalField::CompanyNewsSummary => "company_news_summary",
            SignalField::CrustdataPostList => "crustdata_post_list",
            SignalField::PostListString => "post_list_string",
            SignalField::Other(name) => name,
        }
    }
}

impl From<&str> for SignalField {
    fn from(name: &str) -> Self {
        match name {
            "company_description" => SignalField::CompanyDescription,
            "company_industry" => SignalField::CompanyIndustry,
            "headcount" => SignalField::Headcount,
            "founded_year" => SignalField::FoundedYear,
            "company_region" => SignalField::CompanyRegion,
            "estimated_revenue" => SignalField::EstimatedRevenue,
            "technology_list" => SignalField::TechnologyList,
            "funding_total_usd" => SignalField::FundingTotalUsd,
            "funding_history" => SignalField::FundingHistory,
            "company_news_summary" => SignalField::CompanyNewsSummary,
            "crustdata_post_list" => SignalField::CrustdataPostList,
            "post_list_string" => SignalField::PostListString,
            other => SignalField::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SignalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
