//! Terminal presentation shared by the one-shot and live CLI paths.
#![allow(missing_docs)]

pub mod dashboard;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::acquire::Acquired;
use crate::metrics::derive::{MetricDescriptor, Trend};
use crate::view::{View, ViewState};

/// Data-source badge for a session state.
#[must_use]
pub fn source_badge(latest: Option<&Acquired>) -> &'static str {
    match latest {
        None => "LOADING",
        Some(acquired) if acquired.is_fallback => "FALLBACK",
        Some(_) => "LIVE",
    }
}

/// Hotkey label for a 0-based catalog position, if it has one.
#[must_use]
pub fn hotkey(index: usize) -> Option<char> {
    match index {
        0..=8 => char::from_digit(u32::try_from(index + 1).ok()?, 10),
        9 => Some('0'),
        _ => None,
    }
}

/// One row of `mobdash views` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewRow {
    /// 1-based catalog position; absent for disabled views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<usize>,
    pub id: &'static str,
    pub label: &'static str,
    pub aliases: &'static [&'static str],
    pub enabled: bool,
    pub active: bool,
}

/// Every known view, enabled ones first in catalog order.
#[must_use]
pub fn view_rows(state: &ViewState) -> Vec<ViewRow> {
    let catalog = state.catalog();
    let row = |view: View, number: Option<usize>| ViewRow {
        number,
        id: view.id(),
        label: view.label(),
        aliases: view.aliases(),
        enabled: number.is_some(),
        active: view == state.active(),
    };
    let mut rows: Vec<ViewRow> = catalog
        .iter()
        .enumerate()
        .map(|(index, view)| row(view, Some(index + 1)))
        .collect();
    rows.extend(
        View::ALL
            .into_iter()
            .filter(|view| !catalog.contains(*view))
            .map(|view| row(view, None)),
    );
    rows
}

/// Colored `▲ +15.0%` style delta marker.
#[must_use]
pub fn styled_delta(card: &MetricDescriptor) -> ColoredString {
    let text = format!("{} {}", card.trend().arrow(), card.delta_label());
    match card.trend() {
        Trend::Up => text.green(),
        Trend::Down => text.red(),
        Trend::Flat => text.dimmed(),
    }
}

/// Human-readable card block, one line per metric.
#[must_use]
pub fn render_cards(cards: &[MetricDescriptor]) -> Vec<String> {
    let title_width = cards.iter().map(|c| c.title.len()).max().unwrap_or(0);
    let value_width = cards
        .iter()
        .map(|c| c.display_with_unit().chars().count())
        .max()
        .unwrap_or(0);
    cards
        .iter()
        .map(|card| {
            let value = card.display_with_unit();
            let pad = value_width.saturating_sub(value.chars().count());
            format!(
                "  {:<title_width$}  {}{}  {}",
                card.title,
                " ".repeat(pad),
                value.bold(),
                styled_delta(card),
            )
        })
        .collect()
}
