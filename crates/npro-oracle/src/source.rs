//! Block-time sources
//!
//! The default source reads the `avg_block_time` statistic published by a
//! NEAR explorer API. Payloads look like:
//!
//! ```text
//! {"stats": [{"avg_block_time": "1.0914", "block": 131234567, ...}]}
//! ```
//!
//! The field is located by a dotted path; arrays along the way resolve to
//! their first element, so `"stats.avg_block_time"` and plain
//! `"avg_block_time"` on a flat object both work. Numeric and string values
//! are accepted.

use crate::error::{OracleError, Result};
use async_trait::async_trait;
use npro_core::BlockTime;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default stats endpoint
pub const DEFAULT_BLOCK_TIME_URL: &str = "https://api.nearblocks.io/v1/stats";

/// Default path of the block-time field within the payload
pub const DEFAULT_BLOCK_TIME_FIELD: &str = "stats.avg_block_time";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can produce a live average block time
#[async_trait]
pub trait BlockTimeSource: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &str;

    async fn fetch_block_time(&self) -> Result<BlockTime>;
}

/// Fetches the block time over HTTP
pub struct HttpBlockTimeSource {
    client: reqwest::Client,
    url: String,
    field: String,
}

impl HttpBlockTimeSource {
    /// Build a source with its own client and request timeout
    pub fn new(url: impl Into<String>, field: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("npro-oracle/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OracleError::Client(e.to_string()))?;
        Ok(Self::with_client(client, url, field))
    }

    /// Reuse a preconfigured client
    pub fn with_client(client: reqwest::Client, url: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            field: field.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BlockTimeSource for HttpBlockTimeSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_block_time(&self) -> Result<BlockTime> {
        debug!(url = %self.url, "fetching average block time");

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::HttpStatus(status.as_u16()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedPayload(e.to_string()))?;

        parse_block_time(&payload, &self.field)
    }
}

/// Extract a positive block time from `payload` at the dotted `field` path
pub fn parse_block_time(payload: &Value, field: &str) -> Result<BlockTime> {
    let mut node = payload;
    for segment in field.split('.').filter(|s| !s.is_empty()) {
        node = first_element(node)
            .get(segment)
            .ok_or_else(|| OracleError::MalformedPayload(format!("missing field {field:?}")))?;
    }

    let seconds = match first_element(node) {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| OracleError::MalformedPayload(format!("{field:?} is not a number")))?;

    BlockTime::new(seconds).map_err(|e| OracleError::MalformedPayload(e.to_string()))
}

fn first_element(value: &Value) -> &Value {
    let mut current = value;
    while let Value::Array(items) = current {
        match items.first() {
            Some(item) => current = item,
            None => break,
        }
    }
    current
}

/// Always returns the same block time; useful offline and in tests
#[derive(Clone, Copy, Debug)]
pub struct StaticBlockTimeSource(pub BlockTime);

#[async_trait]
impl BlockTimeSource for StaticBlockTimeSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_block_time(&self) -> Result<BlockTime> {
        Ok(self.0)
    }
}
