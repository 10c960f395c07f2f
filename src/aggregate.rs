//! Day/hour count aggregation.
//!
//! One pass walks the resolved week twice: a full-day count per weekday, then
//! the 15 hour slots per weekday. Every window is its own paginated query,
//! issued sequentially in a fixed order (totals Monday to Sunday, then hourly
//! Monday to Sunday with labels 8 to 22). Day totals come from their own
//! query, never from summing hourly cells; the two counts may diverge and
//! both are kept.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::source::{fetch_all, LeadFilter, LeadQuery, RowSource, TimeWindow};
use crate::week::ResolvedWeek;

/// First rendered hour label. Covers the 07:00-08:00 window.
pub const FIRST_HOUR_LABEL: u8 = 8;
pub const LAST_HOUR_LABEL: u8 = 22;

/// One cell of the 7x15 matrix. All 105 cells exist per pass, zero-filled;
/// absence is not a valid state for a queried cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatCell {
    pub weekday: u8,
    pub hour: u8,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTotal {
    pub weekday: u8,
    pub count: u64,
}

/// Cooperative abandonment for superseded passes. The caller raises the flag
/// when a newer request starts; the aggregator checks it between windows and
/// bails out, never interrupting an in-flight page request.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateOutcome {
    pub cells: Vec<HeatCell>,
    pub totals: Vec<DayTotal>,
    /// True when the pass was abandoned mid-way; the caller must discard the
    /// partial outcome instead of publishing it.
    pub aborted: bool,
}

/// Count qualifying leads for every day and hour slot of the resolved week.
///
/// Failures inside a window have already been degraded to partial counts by
/// [`fetch_all`]; this function itself never fails. Worst case is an
/// undercounted heatmap.
pub async fn aggregate(
    source: &dyn RowSource,
    week: &ResolvedWeek,
    filter: &LeadFilter,
    page_size: usize,
    abort: &AbortFlag,
) -> AggregateOutcome {
    let mut totals = Vec::with_capacity(7);
    for (weekday, date) in week.days() {
        if abort.is_raised() {
            return abandoned(totals, Vec::new());
        }
        let query = LeadQuery {
            filter: filter.clone(),
            window: TimeWindow::full_day(*date),
        };
        let count = fetch_all(source, &query, page_size).await.len() as u64;
        totals.push(DayTotal {
            weekday: *weekday,
            count,
        });
    }

    let mut cells = Vec::with_capacity(7 * (LAST_HOUR_LABEL - FIRST_HOUR_LABEL + 1) as usize);
    for (weekday, date) in week.days() {
        for hour in FIRST_HOUR_LABEL..=LAST_HOUR_LABEL {
            if abort.is_raised() {
                return abandoned(totals, cells);
            }
            let query = LeadQuery {
                filter: filter.clone(),
                window: TimeWindow::hour_slot(*date, hour),
            };
            let count = fetch_all(source, &query, page_size).await.len() as u64;
            cells.push(HeatCell {
                weekday: *weekday,
                hour,
                count,
            });
        }
    }

    log(
        Level::Debug,
        Domain::Aggregate,
        "pass_complete",
        obj(&[
            ("cells", json!(cells.len())),
            ("totals", json!(totals.len())),
            (
                "lead_count",
                json!(totals.iter().map(|t| t.count).sum::<u64>()),
            ),
        ]),
    );

    AggregateOutcome {
        cells,
        totals,
        aborted: false,
    }
}

fn abandoned(totals: Vec<DayTotal>, cells: Vec<HeatCell>) -> AggregateOutcome {
    log(
        Level::Info,
        Domain::Aggregate,
        "pass_abandoned",
        obj(&[("msg", v_str("superseded by a newer request"))]),
    );
    AggregateOutcome {
        cells,
        totals,
        aborted: true,
    }
}
