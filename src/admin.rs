//! Calls against the OpenAI admin API, authenticated with `OPENAI_ADMIN_KEY`.

use serde::Deserialize;

use crate::{
    config::Config,
    errors::GptError,
    http::{HttpClient, Parsed},
    openai::List,
};

/// Most buckets the costs endpoint hands out per page
pub const COSTS_PAGE_LIMIT: i64 = 180;

const SECONDS_PER_DAY: i64 = 86_400;

/// One day of organization costs
#[derive(Debug, Clone, Deserialize)]
pub struct CostsBucket {
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub results: Vec<CostsResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CostsResult {
    pub amount: Amount,
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Amount {
    pub value: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CostsBucket {
    /// Cost and organization of the bucket, if anything was billed
    pub fn cost(&self) -> Option<(f64, &str)> {
        self.results.first().map(|r| {
            (
                r.amount.value,
                r.organization_id.as_deref().unwrap_or("-"),
            )
        })
    }
}

/// Client for the OpenAI admin API
#[derive(Debug, Clone)]
pub struct OpenAiAdmin {
    http: HttpClient,
}

impl OpenAiAdmin {
    pub fn new(config: &Config) -> Result<Self, GptError> {
        let key = config.credentials.admin_key()?;
        let http = HttpClient::new(
            config.openai.base_url.as_str(),
            Some(key.to_string()),
            config.http.timeout(),
        )?;
        Ok(Self { http })
    }

    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn get_costs(
        &self,
        start_time: i64,
        limit: i64,
    ) -> Result<Parsed<List<CostsBucket>>, GptError> {
        let query = [
            ("start_time", start_time.to_string()),
            ("limit", limit.to_string()),
        ];
        self.http.get("organization/costs", &query)?.parsed()
    }
}

/// Start of a look-back window of `days` days ending today
pub fn costs_start_time(now: i64, days: i64) -> i64 {
    now - (days - 1) * SECONDS_PER_DAY
}
