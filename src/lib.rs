//! Data-alignment and statistical color-scaling engine for the
//! "Leads by Day/Hour" heatmap.
//!
//! The pipeline: resolve which calendar date stands for each weekday
//! ([`week`]), count qualifying leads per day and per hour against a paginated
//! remote source ([`source`], [`aggregate`]), then turn the skewed count
//! distribution into a stable color/label scale ([`stats`], [`gradient`],
//! [`scale`]). [`heatmap`] composes the whole pass.

pub mod aggregate;
pub mod config;
pub mod gradient;
pub mod heatmap;
pub mod logging;
pub mod scale;
pub mod source;
pub mod stats;
pub mod week;

pub use aggregate::{AbortFlag, AggregateOutcome, DayTotal, HeatCell};
pub use config::Config;
pub use gradient::Rgb;
pub use heatmap::{build_heatmap, HeatmapView};
pub use scale::{Band, Scaler};
pub use source::{LeadFilter, LeadQuery, RowSource, TimeWindow};
pub use week::{resolve_week, ResolvedWeek};
