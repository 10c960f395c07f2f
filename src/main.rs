use anyhow::Result;
use chrono::Local;
use serde_json::json;

use leadheat::aggregate::AbortFlag;
use leadheat::config::Config;
use leadheat::heatmap::build_heatmap;
use leadheat::logging::{log, obj, v_str, Domain, Level};
use leadheat::source::rest::RestSource;

/// Run one aggregation pass against the configured API and print the fully
/// scaled view model as JSON. Diagnostic driver; the dashboard embeds the
/// library directly.
#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("api_base", v_str(&cfg.api_base)),
            ("table", v_str(&cfg.table)),
            ("week_offset", json!(cfg.week_offset)),
            ("page_size", json!(cfg.page_size)),
        ]),
    );

    let source = RestSource::new(&cfg)?;
    let today = Local::now().date_naive();
    let abort = AbortFlag::new();
    let view = build_heatmap(
        &source,
        &cfg.filter(),
        cfg.week_offset,
        today,
        cfg.page_size,
        &abort,
    )
    .await;

    let cells: Vec<_> = view
        .cells
        .iter()
        .map(|c| {
            let v = c.count as f64;
            json!({
                "weekday": c.weekday,
                "hour": c.hour,
                "count": c.count,
                "color": view.cell_scale.color(v).hex(),
                "band": view.cell_scale.band(v).label(),
                "text": view.cell_scale.text_color(v).hex(),
            })
        })
        .collect();
    let totals: Vec<_> = view
        .totals
        .iter()
        .map(|t| {
            let v = t.count as f64;
            json!({
                "weekday": t.weekday,
                "count": t.count,
                "color": view.total_scale.color(v).hex(),
                "band": view.total_scale.band(v).label(),
                "text": view.total_scale.text_color(v).hex(),
            })
        })
        .collect();
    let days: Vec<_> = view
        .week
        .days()
        .iter()
        .map(|(w, d)| json!({ "weekday": w, "date": d.to_string() }))
        .collect();

    let out = json!({
        "week": days,
        "cells": cells,
        "totals": totals,
        "aborted": view.aborted,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
