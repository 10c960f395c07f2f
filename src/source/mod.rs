//! Row-source capability: the one seam between the engine and the data store.
//!
//! The aggregator only ever asks "rows matching predicate P inside window W,
//! at offset O, limit L". Everything else about the transport is behind
//! [`RowSource`]; [`rest::RestSource`] is the production implementation and
//! the test suites inject in-memory doubles.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::logging::{log, obj, v_str, Domain, Level};

pub mod rest;
pub mod retry;

/// Only leads in this status qualify for the heatmap.
pub const QUALIFYING_STATUS: &str = "ganho";

/// Optional equality filters, passed through untouched. The engine never
/// inspects them beyond forwarding to the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFilter {
    pub funnel_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub origin_id: Option<i64>,
}

/// Timestamp window of one query pass. Day totals close the end of the day
/// inclusively; hourly slots are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub end_inclusive: bool,
}

impl TimeWindow {
    /// `[date 00:00:00, date 23:59:59]`, end inclusive.
    pub fn full_day(date: NaiveDate) -> Self {
        Self {
            start: date.and_time(NaiveTime::MIN),
            end: date.and_time(hms(23, 59, 59)),
            end_inclusive: true,
        }
    }

    /// The half-open window `[label-1:00, label:00)` for hour label `label`.
    ///
    /// The heatmap's first column is labeled 8 but shows `[07:00, 08:00)`:
    /// every column aggregates the hour immediately preceding its label. This
    /// offset-by-one convention is a fixed contract with the rendering layer.
    pub fn hour_slot(date: NaiveDate, label: u8) -> Self {
        Self {
            start: date.and_time(hms(label as u32 - 1, 0, 0)),
            end: date.and_time(hms(label as u32, 0, 0)),
            end_inclusive: false,
        }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        if ts < self.start {
            return false;
        }
        if self.end_inclusive {
            ts <= self.end
        } else {
            ts < self.end
        }
    }
}

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN)
}

/// One counting query: fixed qualifying status + caller filters + window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadQuery {
    pub filter: LeadFilter,
    pub window: TimeWindow,
}

/// The single-column row shape the engine needs back: a record id. Counting
/// is the number of rows accumulated across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: i64,
}

#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch one page of qualifying rows, at most `limit`, starting at
    /// `offset`.
    async fn fetch_page(&self, query: &LeadQuery, offset: usize, limit: usize)
        -> Result<Vec<Row>>;
}

/// Drain a window through repeated pages until a short page signals
/// end-of-data.
///
/// A failed page (after the source's own retries) ends the pass with whatever
/// accumulated so far: the count comes back short, never as an error. The
/// failure is only visible on the log stream.
pub async fn fetch_all(source: &dyn RowSource, query: &LeadQuery, page_size: usize) -> Vec<Row> {
    let page_size = page_size.max(1);
    let mut rows: Vec<Row> = Vec::new();
    loop {
        match source.fetch_page(query, rows.len(), page_size).await {
            Ok(page) => {
                let got = page.len();
                rows.extend(page);
                if got < page_size {
                    break;
                }
            }
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Fetch,
                    "page_failed",
                    obj(&[
                        ("offset", serde_json::json!(rows.len())),
                        ("window_start", v_str(&query.window.start.to_string())),
                        ("error", v_str(&err.to_string())),
                        ("msg", v_str("truncating pass, keeping partial count")),
                    ]),
                );
                break;
            }
        }
    }
    rows
}
