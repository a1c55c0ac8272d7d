//! Locale-aware number formatting for metric cards.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::snapshot::MetricKind;

/// Number-formatting locales supported by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberLocale {
    /// `1.247` / `R$ 45.200,00`.
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    /// `1,247` / `$45,200.00`.
    #[serde(rename = "en-US")]
    EnUs,
}

impl NumberLocale {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::PtBr => "pt-BR",
            Self::EnUs => "en-US",
        }
    }

    #[must_use]
    pub const fn group_separator(self) -> char {
        match self {
            Self::PtBr => '.',
            Self::EnUs => ',',
        }
    }

    #[must_use]
    pub const fn decimal_separator(self) -> char {
        match self {
            Self::PtBr => ',',
            Self::EnUs => '.',
        }
    }

    /// Whether a space separates the currency symbol from the amount.
    #[must_use]
    pub const fn spaced_currency(self) -> bool {
        matches!(self, Self::PtBr)
    }

    #[must_use]
    pub const fn default_currency_symbol(self) -> &'static str {
        match self {
            Self::PtBr => "R$",
            Self::EnUs => "$",
        }
    }
}

impl fmt::Display for NumberLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for NumberLocale {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pt-br" => Ok(Self::PtBr),
            "en-us" => Ok(Self::EnUs),
            other => Err(format!("unsupported locale {other:?} (expected pt-BR or en-US)")),
        }
    }
}

/// Upper bound of the rating scale, shown as the rating's unit suffix.
pub const RATING_SCALE_SUFFIX: &str = "/5";

/// Formats raw metric values per [`MetricKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricFormatter {
    locale: NumberLocale,
    currency_symbol: String,
}

impl Default for MetricFormatter {
    fn default() -> Self {
        Self::for_locale(NumberLocale::default())
    }
}

impl MetricFormatter {
    #[must_use]
    pub fn new(locale: NumberLocale, currency_symbol: impl Into<String>) -> Self {
        Self {
            locale,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Formatter using the locale's conventional currency symbol.
    #[must_use]
    pub fn for_locale(locale: NumberLocale) -> Self {
        Self::new(locale, locale.default_currency_symbol())
    }

    #[must_use]
    pub const fn locale(&self) -> NumberLocale {
        self.locale
    }

    #[must_use]
    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    #[must_use]
    pub fn format(&self, kind: MetricKind, value: f64) -> String {
        match kind {
            MetricKind::Count => self.integer(value),
            MetricKind::Currency => self.currency(value),
            MetricKind::Rating => rating(value),
        }
    }

    /// Whole number with locale grouping.
    #[must_use]
    pub fn integer(&self, value: f64) -> String {
        format_grouped(value, 0, self.locale)
    }

    /// Symbol plus a two-decimal grouped amount; the sign leads the symbol.
    #[must_use]
    pub fn currency(&self, value: f64) -> String {
        let grouped = format_grouped(value, 2, self.locale);
        let (sign, digits) = grouped
            .strip_prefix('-')
            .map_or(("", grouped.as_str()), |rest| ("-", rest));
        let gap = if self.locale.spaced_currency() { " " } else { "" };
        format!("{sign}{}{gap}{digits}", self.currency_symbol)
    }
}

/// One decimal place, always with `.`.
#[must_use]
pub fn rating(value: f64) -> String {
    let fixed = format!("{:.1}", value.abs());
    if value < 0.0 && !rounds_to_zero(value, 1) {
        format!("-{fixed}")
    } else {
        fixed
    }
}

/// Signed one-decimal percentage; anything shown as zero is unsigned.
#[must_use]
pub fn delta_label(delta: f64) -> String {
    let fixed = format!("{:.1}", delta.abs());
    if rounds_to_zero(delta, 1) {
        format!("{fixed}%")
    } else if delta > 0.0 {
        format!("+{fixed}%")
    } else {
        format!("-{fixed}%")
    }
}

/// Whether `value` renders as all zeros at `decimals` places.
#[must_use]
pub fn rounds_to_zero(value: f64, decimals: usize) -> bool {
    !format!("{:.*}", decimals, value.abs())
        .bytes()
        .any(|b| matches!(b, b'1'..=b'9'))
}

/// Fixed-point rendering with thousands grouping in the integer part.
#[must_use]
pub fn format_grouped(value: f64, decimals: usize, locale: NumberLocale) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = fixed
        .split_once('.')
        .map_or((fixed.as_str(), None), |(int, frac)| (int, Some(frac)));

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    // Values that round to zero lose their sign.
    if value.is_sign_negative() && !rounds_to_zero(value, decimals) {
        out.push('-');
    }
    push_grouped(&mut out, int_part, locale.group_separator());
    if let Some(frac) = frac_part {
        out.push(locale.decimal_separator());
        out.push_str(frac);
    }
    out
}

fn push_grouped(out: &mut String, digits: &str, separator: char) {
    let len = digits.len();
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_integers_per_locale() {
        assert_eq!(format_grouped(1247.0, 0, NumberLocale::PtBr), "1.247");
        assert_eq!(format_grouped(1247.0, 0, NumberLocale::EnUs), "1,247");
        assert_eq!(
            format_grouped(1_234_567.0, 0, NumberLocale::EnUs),
            "1,234,567"
        );
        assert_eq!(format_grouped(85.0, 0, NumberLocale::PtBr), "85");
        assert_eq!(format_grouped(0.0, 0, NumberLocale::PtBr), "0");
        assert_eq!(format_grouped(100.0, 0, NumberLocale::PtBr), "100");
        assert_eq!(format_grouped(1000.0, 0, NumberLocale::PtBr), "1.000");
    }

    #[test]
    fn integer_rounds_fractional_counts() {
        let fmt = MetricFormatter::for_locale(NumberLocale::EnUs);
        assert_eq!(fmt.integer(1246.6), "1,247");
    }

    #[test]
    fn negative_values_keep_their_sign() {
        assert_eq!(format_grouped(-1247.0, 0, NumberLocale::PtBr), "-1.247");
        let fmt = MetricFormatter::default();
        assert_eq!(fmt.currency(-45200.0), "-R$ 45.200,00");
        assert_eq!(rating(-1.24), "-1.2");
    }

    #[test]
    fn negative_zero_renders_unsigned() {
        assert_eq!(format_grouped(-0.0, 2, NumberLocale::EnUs), "0.00");
        assert_eq!(format_grouped(-0.001, 2, NumberLocale::EnUs), "0.00");
    }

    #[test]
    fn currency_uses_two_decimals_and_symbol() {
        let pt = MetricFormatter::default();
        assert_eq!(pt.currency(45200.0), "R$ 45.200,00");
        assert_eq!(pt.currency(0.5), "R$ 0,50");

        let us = MetricFormatter::for_locale(NumberLocale::EnUs);
        assert_eq!(us.currency(45200.0), "$45,200.00");

        let custom = MetricFormatter::new(NumberLocale::EnUs, "US$");
        assert_eq!(custom.currency(12.346), "US$12.35");
    }

    #[test]
    fn rating_has_one_decimal_regardless_of_locale() {
        let pt = MetricFormatter::default();
        assert_eq!(pt.format(MetricKind::Rating, 4.7), "4.7");
        assert_eq!(pt.format(MetricKind::Rating, 5.0), "5.0");
        assert_eq!(pt.format(MetricKind::Rating, 0.0), "0.0");
    }

    #[test]
    fn delta_label_signs_and_zero() {
        assert_eq!(delta_label(15.0), "+15.0%");
        assert_eq!(delta_label(0.2), "+0.2%");
        assert_eq!(delta_label(-2.5), "-2.5%");
        assert_eq!(delta_label(0.0), "0.0%");
        assert_eq!(delta_label(-0.0), "0.0%");
    }

    #[test]
    fn near_zero_values_render_unsigned_everywhere() {
        assert_eq!(rating(-0.04), "0.0");
        assert_eq!(rating(-0.06), "-0.1");
        assert_eq!(delta_label(0.04), "0.0%");
        assert_eq!(delta_label(-0.04), "0.0%");
        assert_eq!(delta_label(0.06), "+0.1%");
        assert_eq!(format_grouped(-0.04, 1, NumberLocale::EnUs), "0.0");
        assert!(rounds_to_zero(0.049, 1));
        assert!(!rounds_to_zero(0.051, 1));
    }

    #[test]
    fn locale_parses_common_spellings() {
        assert_eq!("pt-BR".parse::<NumberLocale>(), Ok(NumberLocale::PtBr));
        assert_eq!("en_us".parse::<NumberLocale>(), Ok(NumberLocale::EnUs));
        assert!("fr-FR".parse::<NumberLocale>().is_err());
        assert_eq!(NumberLocale::EnUs.to_string(), "en-US");
    }
}
