use crate::signals::SignalType;

/// Vendor cap on records per synchronous call.
pub const MAX_BATCH_SIZE: usize = 9;

pub const DEFAULT_ATURIYA_BASE_URL: &str = "https://api.aturiya.ai";
pub const DEFAULT_PIPE0_BASE_URL: &str = "https://api.pipe0.com";

/// Which enrichment signal types are requested from the vendor.
///
/// Each enabled type costs one pipe per record, so this is the knob that
/// controls vendor spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentPipes {
    pub company_overview: bool,
    pub tech_stack: bool,
    pub funding: bool,
    pub news: bool,
    pub linkedin_posts: bool,
}

impl Default for EnrichmentPipes {
    fn default() -> Self {
        Self::all()
    }
}

impl EnrichmentPipes {
    pub fn all() -> Self {
        Self {
            company_overview: true,
            tech_stack: true,
            funding: true,
            news: true,
            linkedin_posts: true,
        }
    }

    pub fn none() -> Self {
        Self {
            company_overview: false,
            tech_stack: false,
            funding: false,
            news: false,
            linkedin_posts: false,
        }
    }

    pub fn is_enabled(&self, signal: SignalType) -> bool {
        match signal {
            SignalType::CompanyOverview => self.company_overview,
            SignalType::TechStack => self.tech_stack,
            SignalType::Funding => self.funding,
            SignalType::News => self.news,
            SignalType::LinkedinPosts => self.linkedin_posts,
        }
    }

    fn enable(&mut self, signal: SignalType) {
        match signal {
            SignalType::CompanyOverview => self.company_overview = true,
            SignalType::TechStack => self.tech_stack = true,
            SignalType::Funding => self.funding = true,
            SignalType::News => self.news = true,
            SignalType::LinkedinPosts => self.linkedin_posts = true,
        }
    }

    /// Parses a comma separated list such as `tech_stack,funding`.
    /// An empty (or whitespace-only) list disables every pipe.
    pub fn parse_list(list: &str) -> anyhow::Result<Self> {
        let mut pipes = Self::none();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let signal: SignalType = name
                .parse()
                .map_err(|_| anyhow::anyhow!("Unknown enrichment pipe '{}'", name))?;
            pipes.enable(signal);
        }
        Ok(pipes)
    }
}

/// Knobs the batch orchestrator needs; split out of [`Config`] so the
/// pipeline can run without CRM credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentSettings {
    pub batch_size: usize,
    pub pipes: EnrichmentPipes,
    pub environment: String,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            pipes: EnrichmentPipes::all(),
            environment: "production".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub aturiya_base_url: String,
    pub aturiya_token: String,
    pub aturiya_user_id: String,
    pub aturiya_agent_id: String,
    pub pipe0_base_url: String,
    pub pipe0_api_key: String,
    pub output_dir: String,
    pub enrichment: EnrichmentSettings,
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn base_url(name: &str, default: &str) -> anyhow::Result<String> {
    let raw = std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    validate_base_url(name, &raw)?;
    Ok(raw.trim_end_matches('/').to_string())
}

pub(crate) fn validate_base_url(name: &str, raw: &str) -> anyhow::Result<()> {
    let parsed =
        url::Url::parse(raw).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(())
}

pub(crate) fn parse_batch_size(raw: &str) -> anyhow::Result<usize> {
    let size: usize = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("PIPE0_BATCH_SIZE must be a number"))?;
    if size == 0 || size > MAX_BATCH_SIZE {
        anyhow::bail!("PIPE0_BATCH_SIZE must be between 1 and {}", MAX_BATCH_SIZE);
    }
    Ok(size)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let batch_size = match std::env::var("PIPE0_BATCH_SIZE") {
            Ok(raw) => parse_batch_size(&raw)?,
            Err(_) => MAX_BATCH_SIZE,
        };

        let pipes = match std::env::var("ENRICHMENT_PIPES") {
            Ok(list) => EnrichmentPipes::parse_list(&list)?,
            Err(_) => EnrichmentPipes::all(),
        };

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            aturiya_base_url: base_url("ATURIYA_BASE_URL", DEFAULT_ATURIYA_BASE_URL)?,
            aturiya_token: required("ATURIYA_BEARER_TOKEN")?,
            aturiya_user_id: required("ATURIYA_USER_ID")?,
            aturiya_agent_id: required("ATURIYA_AGENT_ID")?,
            pipe0_base_url: base_url("PIPE0_BASE_URL", DEFAULT_PIPE0_BASE_URL)?,
            pipe0_api_key: required("PIPE0_API_KEY")?,
            output_dir: std::env::var("OUTPUT_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "output".to_string()),
            enrichment: EnrichmentSettings {
                batch_size,
                pipes,
                environment: std::env::var("PIPE0_ENVIRONMENT")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| "production".to_string()),
            },
        };

        // Credentials stay out of the logs
        tracing::debug!("Aturiya Base URL: {}", config.aturiya_base_url);
        tracing::debug!("pipe0 Base URL: {}", config.pipe0_base_url);
        tracing::debug!(
            "pipe0 environment: {}, batch size: {}, pipes: {:?}",
            config.enrichment.environment,
            config.enrichment.batch_size,
            config.enrichment.pipes
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
