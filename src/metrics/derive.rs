//! Snapshot → ordered metric-card descriptors.
//!
//! Derivation is pure: the same snapshot and formatter always produce the
//! same descriptors, in [`MetricKey::ALL`] order.

use serde::Serialize;

use super::format::{MetricFormatter, RATING_SCALE_SUFFIX, delta_label, rounds_to_zero};
use super::snapshot::{MetricKey, MetricKind, MetricsSnapshot};

/// Direction of a metric's change against the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Positive delta.
    Up,
    /// Negative delta.
    Down,
    /// Delta that renders as `0.0%`. Counts as `trend_up` unless negative.
    Flat,
}

impl Trend {
    /// Classify a delta percentage at label precision.
    #[must_use]
    pub fn of(delta: f64) -> Self {
        if rounds_to_zero(delta, 1) {
            Self::Flat
        } else if delta > 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// Single-glyph marker for terminal cards.
    #[must_use]
    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Up => "▲",
            Self::Down => "▼",
            Self::Flat => "■",
        }
    }
}

/// One display-ready metric card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDescriptor {
    /// Metric this card describes.
    pub key: MetricKey,
    /// Fixed card title.
    pub title: &'static str,
    /// Value from the snapshot's current period.
    pub raw_value: f64,
    /// `raw_value` rendered for its kind.
    pub display_value: String,
    /// Scale indicator shown after the value (`/5` for ratings).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_suffix: Option<&'static str>,
    /// Signed percentage change from the comparison section.
    pub delta_percent: f64,
    /// `delta_percent >= 0`.
    pub trend_up: bool,
}

impl MetricDescriptor {
    /// Build the descriptor for one key of a snapshot.
    #[must_use]
    pub fn describe(
        key: MetricKey,
        snapshot: &MetricsSnapshot,
        formatter: &MetricFormatter,
    ) -> Self {
        let raw_value = snapshot.current.get(key);
        let delta_percent = snapshot.previous_comparison.get(key);
        Self {
            key,
            title: key.title(),
            raw_value,
            display_value: formatter.format(key.kind(), raw_value),
            unit_suffix: match key.kind() {
                MetricKind::Rating => Some(RATING_SCALE_SUFFIX),
                MetricKind::Count | MetricKind::Currency => None,
            },
            delta_percent,
            trend_up: delta_percent >= 0.0,
        }
    }

    /// Three-way trend; lets callers render a zero delta as neutral.
    #[must_use]
    pub fn trend(&self) -> Trend {
        Trend::of(self.delta_percent)
    }

    /// Delta as a signed percentage label, e.g. `+15.0%`.
    #[must_use]
    pub fn delta_label(&self) -> String {
        delta_label(self.delta_percent)
    }

    /// `display_value` followed by the unit suffix, if any.
    #[must_use]
    pub fn display_with_unit(&self) -> String {
        match self.unit_suffix {
            Some(suffix) => format!("{}{suffix}", self.display_value),
            None => self.display_value.clone(),
        }
    }
}

/// Derive descriptors with the default (`pt-BR`) formatter.
#[must_use]
pub fn derive(snapshot: &MetricsSnapshot) -> Vec<MetricDescriptor> {
    derive_with(snapshot, &MetricFormatter::default())
}

/// Derive descriptors with an explicit formatter.
#[must_use]
pub fn derive_with(
    snapshot: &MetricsSnapshot,
    formatter: &MetricFormatter,
) -> Vec<MetricDescriptor> {
    MetricKey::ALL
        .into_iter()
        .map(|key| MetricDescriptor::describe(key, snapshot, formatter))
        .collect()
}
