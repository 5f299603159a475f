use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use tracing::debug;

use crate::config::{Mode, RunConfig, TimeWindow, API_KEY_HEADER};
use crate::error::FetchError;
use crate::models::RawPage;

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery<'a> {
    pub mode: Mode,
    pub address: &'a str,
    pub limit: u32,
    pub window: TimeWindow,
    /// Cursor from the previous page, `None` on the first request.
    pub fingerprint: Option<&'a str>,
}

impl PageQuery<'_> {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("min_timestamp", self.window.min_timestamp.to_string()),
            ("max_timestamp", self.window.max_timestamp.to_string()),
        ];
        if let Some(fp) = self.fingerprint {
            params.push(("fingerprint", fp.to_string()));
        }
        params
    }
}

/// Anything that can serve transaction pages for an address.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<RawPage, FetchError>;
}

#[derive(Clone)]
pub struct TronGridClient {
    client: Client,
    base_url: String,
}

impl TronGridClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> eyre::Result<Self> {
        let mut headers = HeaderMap::new();
        let name = HeaderName::from_bytes(API_KEY_HEADER.as_bytes())?;
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| eyre::eyre!("Invalid API key header value: {e}"))?;
        key.set_sensitive(true);
        headers.insert(name, key);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RunConfig) -> eyre::Result<Self> {
        Self::new(&config.base_url, &config.api_key, config.request_timeout)
    }

    pub fn url_for(&self, mode: Mode, address: &str) -> String {
        format!("{}{}", self.base_url, mode.endpoint(address))
    }
}

#[async_trait]
impl PageSource for TronGridClient {
    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<RawPage, FetchError> {
        let url = self.url_for(query.mode, query.address);
        let params = query.params();
        debug!(%url, ?params, "Requesting page");

        let response = self.client.get(&url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
