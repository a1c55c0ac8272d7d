//! Metrics snapshot model and the backend wire contract.
//!
//! A [`MetricsSnapshot`] pairs the current-period values with the
//! percentage deltas against the previous period. Both halves are total
//! over [`MetricKey`]: a key the backend did not send reads as `0.0`.
//!
//! The backend speaks a localized JSON contract:
//!
//! ```json
//! {"data": {
//!     "metricas_principais": {"corridas_concluidas": 1247, "receita_total": 45200, ...},
//!     "comparacao_anterior": {"corridas_concluidas": 15, "receita_total": 8, ...}
//! }}
//! ```
//!
//! The `data` envelope is optional. Wire names are preserved exactly.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire name of the current-period section.
pub const SECTION_CURRENT: &str = "metricas_principais";
/// Wire name of the previous-period comparison section.
pub const SECTION_COMPARISON: &str = "comparacao_anterior";
/// Optional top-level envelope wrapping both sections.
pub const ENVELOPE_KEY: &str = "data";

// ──────────────────── keys ────────────────────

/// Recognized metric keys, declared in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    CompletedRides,
    TotalRevenue,
    ActiveDrivers,
    AverageRating,
}

/// How a metric's raw value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Whole number with thousands grouping.
    Count,
    /// Currency amount with two decimals.
    Currency,
    /// One-decimal score on a 0–5 scale.
    Rating,
}

impl MetricKey {
    /// Every key, in the fixed display order.
    pub const ALL: [Self; 4] = [
        Self::CompletedRides,
        Self::TotalRevenue,
        Self::ActiveDrivers,
        Self::AverageRating,
    ];

    /// Stable English identifier (matches the serde representation).
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::CompletedRides => "completed_rides",
            Self::TotalRevenue => "total_revenue",
            Self::ActiveDrivers => "active_drivers",
            Self::AverageRating => "average_rating",
        }
    }

    /// Key name used by the backend payload.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::CompletedRides => "corridas_concluidas",
            Self::TotalRevenue => "receita_total",
            Self::ActiveDrivers => "motoristas_ativos",
            Self::AverageRating => "avaliacao_media",
        }
    }

    /// Fixed card title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::CompletedRides => "Completed Rides",
            Self::TotalRevenue => "Total Revenue",
            Self::ActiveDrivers => "Active Drivers",
            Self::AverageRating => "Average Rating",
        }
    }

    #[must_use]
    pub const fn kind(self) -> MetricKind {
        match self {
            Self::CompletedRides | Self::ActiveDrivers => MetricKind::Count,
            Self::TotalRevenue => MetricKind::Currency,
            Self::AverageRating => MetricKind::Rating,
        }
    }

    /// Resolve a backend key name.
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.wire_name() == name)
    }
}

// ──────────────────── values ────────────────────

/// Total mapping from [`MetricKey`] to a numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricValues {
    pub completed_rides: f64,
    pub total_revenue: f64,
    pub active_drivers: f64,
    pub average_rating: f64,
}

impl MetricValues {
    #[must_use]
    pub const fn new(
        completed_rides: f64,
        total_revenue: f64,
        active_drivers: f64,
        average_rating: f64,
    ) -> Self {
        Self {
            completed_rides,
            total_revenue,
            active_drivers,
            average_rating,
        }
    }

    #[must_use]
    pub const fn get(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::CompletedRides => self.completed_rides,
            MetricKey::TotalRevenue => self.total_revenue,
            MetricKey::ActiveDrivers => self.active_drivers,
            MetricKey::AverageRating => self.average_rating,
        }
    }

    pub fn set(&mut self, key: MetricKey, value: f64) {
        match key {
            MetricKey::CompletedRides => self.completed_rides = value,
            MetricKey::TotalRevenue => self.total_revenue = value,
            MetricKey::ActiveDrivers => self.active_drivers = value,
            MetricKey::AverageRating => self.average_rating = value,
        }
    }

    /// Builder-style copy with one slot replaced.
    #[must_use]
    pub fn with(mut self, key: MetricKey, value: f64) -> Self {
        self.set(key, value);
        self
    }
}

// ──────────────────── snapshot ────────────────────

/// One acquired set of current values and previous-period deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSnapshot {
    pub current: MetricValues,
    pub previous_comparison: MetricValues,
}

impl MetricsSnapshot {
    #[must_use]
    pub const fn new(current: MetricValues, previous_comparison: MetricValues) -> Self {
        Self {
            current,
            previous_comparison,
        }
    }

    /// The fixed offline snapshot substituted when acquisition fails.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            current: MetricValues::new(1247.0, 45200.0, 85.0, 4.7),
            previous_comparison: MetricValues::new(15.0, 8.0, 3.0, 0.2),
        }
    }
}

// ──────────────────── wire parsing ────────────────────

/// Schema drift observed while reading a live body.
///
/// Entries are `section.key` paths. Drift never fails a parse: unknown keys
/// are ignored and missing keys read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaWarnings {
    /// Keys inside a section that no [`MetricKey`] recognizes.
    pub unknown_fields: Vec<String>,
    /// Recognized keys (or whole sections) absent from the body.
    pub missing_fields: Vec<String>,
}

impl SchemaWarnings {
    /// Whether any drift was detected.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        !self.unknown_fields.is_empty() || !self.missing_fields.is_empty()
    }
}

/// Successfully shape-checked backend body.
#[derive(Debug, Clone, PartialEq)]
pub struct WireSnapshot {
    pub snapshot: MetricsSnapshot,
    pub warnings: SchemaWarnings,
}

/// Parse a backend body into a snapshot.
///
/// Rejects non-JSON bodies, non-object roots, sections of the wrong type,
/// recognized values that are neither numbers nor `null`, and bodies that
/// carry neither section at all. Everything else parses, with absent keys
/// and `null` values reading as zero.
pub fn parse_wire_body(raw: &str) -> std::result::Result<WireSnapshot, String> {
    let value: Value =
        serde_json::from_str(raw).map_err(|error| format!("body is not valid JSON: {error}"))?;
    let Some(root) = value.as_object() else {
        return Err(format!(
            "expected a JSON object, found {}",
            json_kind(&value)
        ));
    };

    let envelope = match root.get(ENVELOPE_KEY) {
        Some(Value::Object(inner)) => Some(inner),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(format!(
                "`{ENVELOPE_KEY}` envelope is {} instead of an object",
                json_kind(other)
            ));
        }
    };
    // The envelope wins only when it carries a section; otherwise read the root.
    let body = match envelope {
        Some(inner) if has_section(inner) => inner,
        _ => root,
    };

    if !has_section(body) {
        return Err(format!(
            "neither `{SECTION_CURRENT}` nor `{SECTION_COMPARISON}` is present"
        ));
    }

    let mut warnings = SchemaWarnings::default();
    let current = read_section(body, SECTION_CURRENT, &mut warnings)?;
    let previous_comparison = read_section(body, SECTION_COMPARISON, &mut warnings)?;

    Ok(WireSnapshot {
        snapshot: MetricsSnapshot::new(current, previous_comparison),
        warnings,
    })
}

fn has_section(body: &Map<String, Value>) -> bool {
    body.contains_key(SECTION_CURRENT) || body.contains_key(SECTION_COMPARISON)
}

fn read_section(
    body: &Map<String, Value>,
    section: &str,
    warnings: &mut SchemaWarnings,
) -> std::result::Result<MetricValues, String> {
    let fields = match body.get(section) {
        Some(Value::Object(fields)) => fields,
        Some(Value::Null) | None => {
            warnings.missing_fields.push(section.to_string());
            return Ok(MetricValues::default());
        }
        Some(other) => {
            return Err(format!(
                "`{section}` is {} instead of an object",
                json_kind(other)
            ));
        }
    };

    let mut values = MetricValues::default();
    for key in MetricKey::ALL {
        match fields.get(key.wire_name()) {
            None => warnings
                .missing_fields
                .push(format!("{section}.{}", key.wire_name())),
            Some(Value::Null) => {}
            Some(Value::Number(number)) => {
                let Some(parsed) = number.as_f64() else {
                    return Err(format!(
                        "`{section}.{}` is not representable as f64",
                        key.wire_name()
                    ));
                };
                values.set(key, parsed);
            }
            Some(other) => {
                return Err(format!(
                    "`{section}.{}` is {} instead of a number",
                    key.wire_name(),
                    json_kind(other)
                ));
            }
        }
    }

    let mut unknown: Vec<String> = fields
        .keys()
        .filter(|name| MetricKey::from_wire_name(name).is_none())
        .map(|name| format!("{section}.{name}"))
        .collect();
    unknown.sort();
    warnings.unknown_fields.extend(unknown);

    Ok(values)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
