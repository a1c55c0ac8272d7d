//! Named dashboard views and the selection state machine.
//!
//! A [`ViewState`] always holds a member of its [`ViewCatalog`]. Selection
//! either moves to a catalog member or fails with
//! [`DashError::InvalidView`] and leaves the state untouched.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};

/// Upper bound on remembered back-navigation entries.
pub const MAX_HISTORY: usize = 32;

// ──────────────────── views ────────────────────

/// Every dashboard section, in canonical navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Overview,
    Performance,
    Ai,
    Alerts,
    Import,
    Charts,
    Rides,
    Drivers,
    Goals,
    TemporalComparison,
    Settings,
}

impl View {
    pub const ALL: [Self; 11] = [
        Self::Overview,
        Self::Performance,
        Self::Ai,
        Self::Alerts,
        Self::Import,
        Self::Charts,
        Self::Rides,
        Self::Drivers,
        Self::Goals,
        Self::TemporalComparison,
        Self::Settings,
    ];

    /// Canonical identifier (matches the serde representation).
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Performance => "performance",
            Self::Ai => "ai",
            Self::Alerts => "alerts",
            Self::Import => "import",
            Self::Charts => "charts",
            Self::Rides => "rides",
            Self::Drivers => "drivers",
            Self::Goals => "goals",
            Self::TemporalComparison => "temporal-comparison",
            Self::Settings => "settings",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Performance => "Performance",
            Self::Ai => "AI System",
            Self::Alerts => "Alerts",
            Self::Import => "Data Import",
            Self::Charts => "Advanced Analytics",
            Self::Rides => "Ride Analysis",
            Self::Drivers => "Drivers",
            Self::Goals => "City Goals",
            Self::TemporalComparison => "Temporal Comparison",
            Self::Settings => "Settings",
        }
    }

    /// Legacy identifiers still accepted on selection.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Overview | Self::Performance => &[],
            Self::Ai => &["ia"],
            Self::Alerts => &["alertas"],
            Self::Import => &["importacao"],
            Self::Charts => &["graficos", "analises"],
            Self::Rides => &["corridas"],
            Self::Drivers => &["motoristas"],
            Self::Goals => &["metas"],
            Self::TemporalComparison => &["temporal", "comparativo"],
            Self::Settings => &["configuracao"],
        }
    }

    /// Resolve an identifier or alias. Case-insensitive, whitespace-trimmed.
    #[must_use]
    pub fn resolve(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|view| {
            view.id() == needle || view.aliases().iter().any(|alias| *alias == needle)
        })
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for View {
    type Err = DashError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::resolve(raw).ok_or_else(|| DashError::invalid_view(raw))
    }
}

// ──────────────────── catalog ────────────────────

/// Ordered, duplicate-free, non-empty set of enabled views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ViewCatalog {
    views: Vec<View>,
}

impl Default for ViewCatalog {
    fn default() -> Self {
        Self {
            views: View::ALL.to_vec(),
        }
    }
}

impl ViewCatalog {
    /// # Errors
    /// `InvalidConfig` when `views` is empty or repeats a view.
    pub fn new(views: Vec<View>) -> Result<Self> {
        if views.is_empty() {
            return Err(DashError::InvalidConfig {
                details: "views.enabled must list at least one view".to_string(),
            });
        }
        for (index, view) in views.iter().enumerate() {
            if views[..index].contains(view) {
                return Err(DashError::InvalidConfig {
                    details: format!("views.enabled lists {view} more than once"),
                });
            }
        }
        Ok(Self { views })
    }

    /// Build a catalog from identifiers or aliases.
    ///
    /// # Errors
    /// `InvalidConfig` for unknown identifiers, duplicates, or an empty list.
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Result<Self> {
        let views = ids
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                View::resolve(raw).ok_or_else(|| DashError::InvalidConfig {
                    details: format!("views.enabled: unknown view {raw:?}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(views)
    }

    #[must_use]
    pub fn contains(&self, view: View) -> bool {
        self.views.contains(&view)
    }

    /// 0-based position in navigation order.
    #[must_use]
    pub fn position(&self, view: View) -> Option<usize> {
        self.views.iter().position(|candidate| *candidate == view)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<View> {
        self.views.get(index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Always false for a constructed catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = View> + '_ {
        self.views.iter().copied()
    }
}

// ──────────────────── state machine ────────────────────

/// Active view plus back-navigation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    catalog: ViewCatalog,
    active: View,
    history: Vec<View>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            catalog: ViewCatalog::default(),
            active: View::Overview,
            history: Vec::new(),
        }
    }
}

impl ViewState {
    /// # Errors
    /// `InvalidConfig` when `initial` is not in `catalog`.
    pub fn new(catalog: ViewCatalog, initial: View) -> Result<Self> {
        if !catalog.contains(initial) {
            return Err(DashError::InvalidConfig {
                details: format!("views.default_view {initial} is not enabled"),
            });
        }
        Ok(Self {
            catalog,
            active: initial,
            history: Vec::new(),
        })
    }

    /// Build from the `[views]` configuration section.
    ///
    /// # Errors
    /// `InvalidConfig` when the section does not describe a usable catalog.
    pub fn from_config(config: &crate::core::config::ViewsConfig) -> Result<Self> {
        let catalog = ViewCatalog::from_ids(&config.enabled)?;
        let initial = View::resolve(&config.default_view).ok_or_else(|| {
            DashError::InvalidConfig {
                details: format!(
                    "views.default_view: unknown view {:?}",
                    config.default_view
                ),
            }
        })?;
        Self::new(catalog, initial)
    }

    #[must_use]
    pub const fn active(&self) -> View {
        self.active
    }

    #[must_use]
    pub const fn catalog(&self) -> &ViewCatalog {
        &self.catalog
    }

    /// Previously active views, most recent last.
    #[must_use]
    pub fn history(&self) -> &[View] {
        &self.history
    }

    /// Select by identifier or alias.
    ///
    /// # Errors
    /// `InvalidView` when `raw` names no view or a view outside the catalog.
    /// The active view is unchanged on error.
    pub fn select(&mut self, raw: &str) -> Result<View> {
        let view = View::resolve(raw).ok_or_else(|| DashError::invalid_view(raw))?;
        if !self.catalog.contains(view) {
            return Err(DashError::invalid_view(raw));
        }
        self.navigate_to(view);
        Ok(view)
    }

    /// Select an already-resolved view.
    ///
    /// # Errors
    /// `InvalidView` when `view` is disabled.
    pub fn select_view(&mut self, view: View) -> Result<View> {
        if !self.catalog.contains(view) {
            return Err(DashError::invalid_view(view.id()));
        }
        self.navigate_to(view);
        Ok(view)
    }

    /// Select by 1-based catalog position; `0` is the tenth entry.
    ///
    /// # Errors
    /// `InvalidView` when the catalog has no such position.
    pub fn select_number(&mut self, number: u8) -> Result<View> {
        let index = if number == 0 { 9 } else { usize::from(number) - 1 };
        let view = self
            .catalog
            .get(index)
            .ok_or_else(|| DashError::invalid_view(number.to_string()))?;
        self.navigate_to(view);
        Ok(view)
    }

    /// Advance in catalog order, wrapping at the end.
    pub fn next(&mut self) -> View {
        self.step(1)
    }

    /// Step back in catalog order, wrapping at the start.
    pub fn prev(&mut self) -> View {
        self.step(self.catalog.len() - 1)
    }

    /// Return to the most recent history entry, if any.
    pub fn back(&mut self) -> Option<View> {
        let previous = self.history.pop()?;
        self.active = previous;
        Some(previous)
    }

    fn step(&mut self, offset: usize) -> View {
        let len = self.catalog.len();
        let current = self.catalog.position(self.active).unwrap_or(0);
        let target = self.catalog.get((current + offset) % len).unwrap_or(self.active);
        self.navigate_to(target);
        target
    }

    fn navigate_to(&mut self, target: View) -> bool {
        if target == self.active {
            return false;
        }
        if self.history.len() == MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(self.active);
        self.active = target;
        true
    }
}
