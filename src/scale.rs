//! Color/label scale over one snapshot of observed counts.
//!
//! A [`Scaler`] is built per dataset (hourly cells and daily totals get
//! independent instances, their distributions are not comparable) and answers
//! three queries per rendered cell: fill color, intensity band, text color.
//! Zero always means "out of operation" and never touches the scale.

use serde::Serialize;

use crate::gradient::{gradient, Rgb};
use crate::stats::{summarize, DistributionStats};

/// Fill for zero-count cells and for the degenerate no-data scale.
pub const NEUTRAL: Rgb = Rgb::new(0x1e, 0x1b, 0x3a);
/// Text over neutral cells.
pub const TEXT_MUTED: Rgb = Rgb::new(0x94, 0xa3, 0xb8);
pub const TEXT_LIGHT: Rgb = Rgb::new(0xff, 0xff, 0xff);
pub const TEXT_DARK: Rgb = Rgb::new(0x00, 0x00, 0x00);

/// Normalized position above which cell text flips to white. A fixed
/// perceptual constant, not derived from gradient luminance.
const TEXT_CONTRAST_SPLIT: f64 = 0.45;

/// Intensity label, ordered coldest to hottest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Band {
    SemDados,
    ForaDeOperacao,
    Baixa,
    Media,
    Alta,
    MuitoAlta,
}

impl Band {
    pub fn label(&self) -> &'static str {
        match self {
            Band::SemDados => "Sem dados",
            Band::ForaDeOperacao => "Fora de operação",
            Band::Baixa => "Baixa",
            Band::Media => "Média",
            Band::Alta => "Alta",
            Band::MuitoAlta => "Muito Alta",
        }
    }
}

/// Percentile-anchored color scale for one dataset snapshot.
///
/// `stats` is `None` when the snapshot had no positive values; every query
/// then returns the fixed no-data answer.
#[derive(Debug, Clone, Serialize)]
pub struct Scaler {
    stats: Option<DistributionStats>,
}

impl Scaler {
    /// Build from a snapshot which may contain zeros; only the strictly
    /// positive subset shapes the scale.
    pub fn build(values: &[f64]) -> Self {
        let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
        Self {
            stats: summarize(&positive),
        }
    }

    pub fn stats(&self) -> Option<&DistributionStats> {
        self.stats.as_ref()
    }

    /// Fill color for a cell holding `value`.
    pub fn color(&self, value: f64) -> Rgb {
        let stats = match &self.stats {
            Some(s) => s,
            None => return NEUTRAL,
        };
        if value <= 0.0 {
            return NEUTRAL;
        }
        gradient(normalized(stats, value))
    }

    /// Intensity band for `value`, classified against the percentile
    /// thresholds in whichever space the stats live in.
    pub fn band(&self, value: f64) -> Band {
        let stats = match &self.stats {
            Some(s) => s,
            None => return Band::SemDados,
        };
        if value <= 0.0 {
            return Band::ForaDeOperacao;
        }
        let x = in_scale_space(stats, value);
        if x < stats.p50 {
            Band::Baixa
        } else if x < stats.p85 {
            Band::Media
        } else if x < stats.p97 {
            Band::Alta
        } else {
            Band::MuitoAlta
        }
    }

    /// Text color readable over `color(value)`.
    pub fn text_color(&self, value: f64) -> Rgb {
        let stats = match &self.stats {
            Some(s) => s,
            None => return TEXT_MUTED,
        };
        if value <= 0.0 {
            return TEXT_MUTED;
        }
        if normalized(stats, value) > TEXT_CONTRAST_SPLIT {
            TEXT_LIGHT
        } else {
            TEXT_DARK
        }
    }
}

fn in_scale_space(stats: &DistributionStats, value: f64) -> f64 {
    if stats.log_applied {
        value.ln_1p()
    } else {
        value
    }
}

/// Clamped linear map of `value` from [p10, p97] onto [0, 1].
///
/// A zero-width band (every observation equal) degenerates to the clamp
/// limits: at or above p97 maps to 1, below to 0.
fn normalized(stats: &DistributionStats, value: f64) -> f64 {
    let x = in_scale_space(stats, value);
    let span = stats.p97 - stats.p10;
    if span <= 0.0 {
        return if x >= stats.p97 { 1.0 } else { 0.0 };
    }
    ((x - stats.p10) / span).clamp(0.0, 1.0)
}
