//! One-call composition of the whole pass: resolve, aggregate, scale.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use crate::aggregate::{aggregate, AbortFlag, AggregateOutcome};
use crate::logging::{log, obj, Domain, Level};
use crate::scale::Scaler;
use crate::source::{LeadFilter, RowSource};
use crate::week::{resolve_week, ResolvedWeek};

/// Everything the rendering layer needs for one request.
///
/// Per-hour counts and per-day sums are not comparable distributions, so each
/// gets its own scaler.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapView {
    pub week: ResolvedWeek,
    pub cells: Vec<crate::aggregate::HeatCell>,
    pub totals: Vec<crate::aggregate::DayTotal>,
    pub cell_scale: Scaler,
    pub total_scale: Scaler,
    /// Carried over from the aggregation pass; an aborted view must be
    /// discarded by the caller, not rendered.
    pub aborted: bool,
}

pub async fn build_heatmap(
    source: &dyn RowSource,
    filter: &LeadFilter,
    week_offset: u32,
    today: NaiveDate,
    page_size: usize,
    abort: &AbortFlag,
) -> HeatmapView {
    let week = resolve_week(week_offset, today);
    log(
        Level::Debug,
        Domain::Resolve,
        "week_resolved",
        obj(&[
            ("week_offset", json!(week_offset)),
            ("today", json!(today.to_string())),
            (
                "days",
                json!(week
                    .days()
                    .iter()
                    .map(|(w, d)| (*w, d.to_string()))
                    .collect::<Vec<_>>()),
            ),
        ]),
    );

    let AggregateOutcome {
        cells,
        totals,
        aborted,
    } = aggregate(source, &week, filter, page_size, abort).await;

    let cell_values: Vec<f64> = cells.iter().map(|c| c.count as f64).collect();
    let total_values: Vec<f64> = totals.iter().map(|t| t.count as f64).collect();
    let cell_scale = Scaler::build(&cell_values);
    let total_scale = Scaler::build(&total_values);
    log(
        Level::Debug,
        Domain::Scale,
        "scales_built",
        obj(&[
            (
                "cell_log",
                json!(cell_scale.stats().map(|s| s.log_applied)),
            ),
            (
                "total_log",
                json!(total_scale.stats().map(|s| s.log_applied)),
            ),
        ]),
    );

    HeatmapView {
        week,
        cells,
        totals,
        cell_scale,
        total_scale,
        aborted,
    }
}
