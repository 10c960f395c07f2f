//! End-to-end pass over an in-memory source: resolve, aggregate, scale.
//!
//! The fixture pins `today` to Wednesday 2024-06-12, so with week offset 0 the
//! Monday column resolves to 2024-06-10 while Friday falls back to 2024-06-07
//! of the prior calendar week.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};

use leadheat::aggregate::AbortFlag;
use leadheat::heatmap::build_heatmap;
use leadheat::scale::{Band, NEUTRAL, TEXT_MUTED};
use leadheat::source::{LeadFilter, LeadQuery, Row, RowSource};
use leadheat::week::resolve_week;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(d: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    d.and_hms_opt(h, m, 0).unwrap()
}

const TODAY: (i32, u32, u32) = (2024, 6, 12); // Wednesday

/// Event timestamps behind a paging, filter-aware façade.
struct MemorySource {
    events: Vec<(NaiveDateTime, Option<i64>)>, // (timestamp, funnel)
    fail_everything: bool,
}

impl MemorySource {
    fn new(events: Vec<(NaiveDateTime, Option<i64>)>) -> Self {
        Self {
            events,
            fail_everything: false,
        }
    }

    fn timestamps(events: &[NaiveDateTime]) -> Vec<(NaiveDateTime, Option<i64>)> {
        events.iter().map(|ts| (*ts, None)).collect()
    }
}

#[async_trait]
impl RowSource for MemorySource {
    async fn fetch_page(
        &self,
        query: &LeadQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>> {
        if self.fail_everything {
            return Err(anyhow!("synthetic outage"));
        }
        let matching: Vec<Row> = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, (ts, funnel))| {
                query.window.contains(*ts)
                    && match query.filter.funnel_id {
                        Some(want) => *funnel == Some(want),
                        None => true,
                    }
            })
            .map(|(i, _)| Row { id: i as i64 })
            .collect();
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }
}

#[tokio::test]
async fn scattered_week_routes_events_to_resolved_dates() {
    let today = date(TODAY.0, TODAY.1, TODAY.2);
    let monday = date(2024, 6, 10);
    let prior_friday = date(2024, 6, 7);
    let this_friday = date(2024, 6, 14); // future, must never be queried

    let source = MemorySource::new(MemorySource::timestamps(&[
        at(monday, 8, 10),       // Monday, hour label 9
        at(monday, 8, 40),       // Monday, hour label 9
        at(prior_friday, 14, 5), // Friday column shows the prior week
        at(this_friday, 14, 5),  // outside every resolved day
    ]));

    let view = build_heatmap(
        &source,
        &LeadFilter::default(),
        0,
        today,
        1000,
        &AbortFlag::new(),
    )
    .await;

    assert!(!view.aborted);
    assert_eq!(view.week.date_of(1), Some(monday));
    assert_eq!(view.week.date_of(5), Some(prior_friday));

    let monday_9 = view
        .cells
        .iter()
        .find(|c| c.weekday == 1 && c.hour == 9)
        .unwrap();
    assert_eq!(monday_9.count, 2);

    let friday_15 = view
        .cells
        .iter()
        .find(|c| c.weekday == 5 && c.hour == 15)
        .unwrap();
    assert_eq!(friday_15.count, 1);

    let friday_total = view.totals.iter().find(|t| t.weekday == 5).unwrap();
    assert_eq!(friday_total.count, 1);

    // The event on the upcoming Friday is invisible to this pass.
    let grand_total: u64 = view.totals.iter().map(|t| t.count).sum();
    assert_eq!(grand_total, 3);
}

#[tokio::test]
async fn sequential_week_is_one_calendar_week() {
    let today = date(TODAY.0, TODAY.1, TODAY.2);
    let week = resolve_week(1, today);
    let days = week.days();
    assert_eq!(days[0].1, date(2024, 6, 3));
    for i in 1..7 {
        assert_eq!(days[i].1, days[i - 1].1 + Duration::days(1));
    }
}

#[tokio::test]
async fn pagination_is_size_invariant() {
    let today = date(TODAY.0, TODAY.1, TODAY.2);
    let monday = date(2024, 6, 10);
    let events: Vec<NaiveDateTime> = (0i64..2500)
        .map(|i| at(monday, 10, 0) + Duration::milliseconds(i))
        .collect();
    let source = MemorySource::new(MemorySource::timestamps(&events));

    for page_size in [1000, 333, 2500, 1] {
        let view = build_heatmap(
            &source,
            &LeadFilter::default(),
            0,
            today,
            page_size,
            &AbortFlag::new(),
        )
        .await;
        let total = view.totals.iter().find(|t| t.weekday == 1).unwrap();
        assert_eq!(total.count, 2500, "page_size {}", page_size);
    }
}

#[tokio::test]
async fn filters_pass_through_to_the_source() {
    let today = date(TODAY.0, TODAY.1, TODAY.2);
    let monday = date(2024, 6, 10);
    let source = MemorySource::new(vec![
        (at(monday, 10, 5), Some(4)),
        (at(monday, 10, 25), Some(4)),
        (at(monday, 10, 45), Some(9)),
    ]);

    let filter = LeadFilter {
        funnel_id: Some(4),
        ..Default::default()
    };
    let view = build_heatmap(&source, &filter, 0, today, 1000, &AbortFlag::new()).await;
    let total = view.totals.iter().find(|t| t.weekday == 1).unwrap();
    assert_eq!(total.count, 2);
}

#[tokio::test]
async fn the_two_scales_are_independent() {
    let today = date(TODAY.0, TODAY.1, TODAY.2);
    let monday = date(2024, 6, 10);
    // All activity inside one hour of one day: the cell distribution has a
    // single positive sample while the totals distribution has another.
    let events: Vec<NaiveDateTime> = (0i64..40)
        .map(|i| at(monday, 10, 0) + Duration::seconds(i))
        .collect();
    let source = MemorySource::new(MemorySource::timestamps(&events));

    let view = build_heatmap(
        &source,
        &LeadFilter::default(),
        0,
        today,
        1000,
        &AbortFlag::new(),
    )
    .await;

    // Zero isolation holds per scaler (P3): zeros render neutral on both.
    assert_eq!(view.cell_scale.color(0.0), NEUTRAL);
    assert_eq!(view.total_scale.color(0.0), NEUTRAL);
    assert_eq!(view.cell_scale.band(0.0), Band::ForaDeOperacao);
    assert_eq!(view.cell_scale.text_color(0.0), TEXT_MUTED);

    // Both scales saturate at their own observed maximum.
    assert_eq!(view.cell_scale.band(40.0), Band::MuitoAlta);
    assert_eq!(view.total_scale.band(40.0), Band::MuitoAlta);
}

#[tokio::test]
async fn total_outage_degrades_to_empty_scale() {
    let today = date(TODAY.0, TODAY.1, TODAY.2);
    let mut source = MemorySource::new(vec![]);
    source.fail_everything = true;

    let view = build_heatmap(
        &source,
        &LeadFilter::default(),
        0,
        today,
        1000,
        &AbortFlag::new(),
    )
    .await;

    // Shape intact, no error: 105 zero cells and the no-data scale.
    assert!(!view.aborted);
    assert_eq!(view.cells.len(), 105);
    assert_eq!(view.cell_scale.band(5.0), Band::SemDados);
    assert_eq!(view.cell_scale.band(5.0).label(), "Sem dados");
    assert_eq!(view.cell_scale.color(5.0).hex(), "#1e1b3a");
}

#[tokio::test]
async fn superseded_pass_is_flagged_for_discard() {
    let today = date(TODAY.0, TODAY.1, TODAY.2);
    let source = MemorySource::new(vec![]);
    let abort = AbortFlag::new();
    abort.raise();

    let view = build_heatmap(&source, &LeadFilter::default(), 0, today, 1000, &abort).await;
    assert!(view.aborted);
}
