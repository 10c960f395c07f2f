//! PostgREST-style row source over `reqwest`.
//!
//! Queries land as `GET {base}/{table}?select=id&status=eq.ganho&...` with the
//! window encoded as repeated `created_at` bounds and paging as
//! `offset`/`limit`. The key goes out in both `apikey` and `Authorization`
//! headers.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::Client;
use tokio::time::{sleep, Duration};
use url::Url;

use crate::config::Config;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::source::retry::{is_retryable, RetryPolicy};
use crate::source::{LeadQuery, Row, RowSource, QUALIFYING_STATUS};

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct RestSource {
    client: Client,
    base: Url,
    table: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl RestSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .context("building http client")?;
        let base = Url::parse(&cfg.api_base)
            .with_context(|| format!("invalid API_BASE {}", cfg.api_base))?;
        Ok(Self {
            client,
            base,
            table: cfg.table.clone(),
            api_key: cfg.api_key.clone(),
            retry: cfg.retry_policy(),
        })
    }

    fn endpoint(&self, query: &LeadQuery, offset: usize, limit: usize) -> Result<Url> {
        let mut url = self
            .base
            .join(&self.table)
            .with_context(|| format!("invalid table segment {}", self.table))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "id");
            pairs.append_pair("status", &format!("eq.{}", QUALIFYING_STATUS));
            pairs.append_pair(
                "created_at",
                &format!("gte.{}", query.window.start.format(TS_FORMAT)),
            );
            let end_op = if query.window.end_inclusive { "lte" } else { "lt" };
            pairs.append_pair(
                "created_at",
                &format!("{}.{}", end_op, query.window.end.format(TS_FORMAT)),
            );
            let f = &query.filter;
            for (column, value) in [
                ("funnel_id", f.funnel_id),
                ("unit_id", f.unit_id),
                ("seller_id", f.seller_id),
                ("origin_id", f.origin_id),
            ] {
                if let Some(id) = value {
                    pairs.append_pair(column, &format!("eq.{}", id));
                }
            }
            pairs.append_pair("offset", &offset.to_string());
            pairs.append_pair("limit", &limit.to_string());
        }
        Ok(url)
    }

    async fn request_page(&self, url: &Url) -> Result<Vec<Row>, reqwest::Error> {
        let mut req = self.client.get(url.clone());
        if let Some(key) = &self.api_key {
            req = req
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key));
        }
        let resp = req.send().await?.error_for_status()?;
        resp.json::<Vec<Row>>().await
    }
}

#[async_trait]
impl RowSource for RestSource {
    async fn fetch_page(
        &self,
        query: &LeadQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>> {
        let url = self.endpoint(query, offset, limit)?;
        let mut attempt = 0u32;
        loop {
            match self.request_page(&url).await {
                Ok(rows) => return Ok(rows),
                Err(err) if attempt < self.retry.max_retries && is_retryable(&err) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    log(
                        Level::Warn,
                        Domain::Fetch,
                        "retry",
                        obj(&[
                            ("attempt", serde_json::json!(attempt + 1)),
                            ("max", serde_json::json!(self.retry.max_retries)),
                            ("delay_ms", serde_json::json!(delay.as_millis() as u64)),
                            ("error", v_str(&err.to_string())),
                        ]),
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("fetch_page offset={}", offset))
                }
            }
        }
    }
}
