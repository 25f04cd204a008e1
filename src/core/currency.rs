//! Currency tags and locale-aware amount formatting.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Describes how amounts of a currency are written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyTag {
    pub code: String,
    pub symbol: String,
    pub locale: String,
}

impl CurrencyTag {
    pub fn new(code: &str, symbol: &str, locale: &str) -> Self {
        CurrencyTag {
            code: code.to_string(),
            symbol: symbol.to_string(),
            locale: locale.to_string(),
        }
    }

    /// Number of digits shown after the decimal separator.
    pub fn fraction_digits(&self) -> u32 {
        match self.code.to_uppercase().as_str() {
            "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" => 0,
            _ => 2,
        }
    }
}

impl Default for CurrencyTag {
    fn default() -> Self {
        CurrencyTag::new("USD", "$", "en-US")
    }
}

impl Display for CurrencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    Thousands,
    Lakh,
}

#[derive(Debug, Clone, Copy)]
struct NumberStyle {
    group: &'static str,
    decimal: char,
    grouping: Grouping,
    symbol_first: bool,
}

fn number_style(locale: &str) -> NumberStyle {
    let normalized = locale.replace('_', "-");
    let mut parts = normalized.split('-');
    let language = parts.next().unwrap_or("").to_lowercase();
    // Region is the first two-letter or three-digit subtag after the language.
    let region = parts
        .find(|p| p.len() == 2 || (p.len() == 3 && p.chars().all(|c| c.is_ascii_digit())))
        .unwrap_or("")
        .to_uppercase();

    if region == "IN" {
        return NumberStyle {
            group: ",",
            decimal: '.',
            grouping: Grouping::Lakh,
            symbol_first: true,
        };
    }
    if language == "de" && region == "CH" {
        return NumberStyle {
            group: "'",
            decimal: '.',
            grouping: Grouping::Thousands,
            symbol_first: false,
        };
    }

    match language.as_str() {
        "de" | "es" | "it" | "nl" | "pt" | "id" | "tr" | "da" | "el" => NumberStyle {
            group: ".",
            decimal: ',',
            grouping: Grouping::Thousands,
            symbol_first: false,
        },
        "fr" | "ru" | "pl" | "cs" | "sv" | "nb" | "fi" | "uk" | "sk" => NumberStyle {
            group: " ",
            decimal: ',',
            grouping: Grouping::Thousands,
            symbol_first: false,
        },
        _ => NumberStyle {
            group: ",",
            decimal: '.',
            grouping: Grouping::Thousands,
            symbol_first: true,
        },
    }
}

fn group_digits(digits: &str, separator: &str, grouping: Grouping) -> String {
    let len = digits.len();
    if len <= 3 {
        return digits.to_string();
    }

    // Split points counted from the right: every 3 digits, or 3 then every 2 for lakh.
    let mut groups: Vec<&str> = Vec::new();
    let mut end = len;
    let mut width = 3;
    while end > 0 {
        let start = end.saturating_sub(width);
        groups.push(&digits[start..end]);
        end = start;
        if grouping == Grouping::Lakh {
            width = 2;
        }
    }
    groups.reverse();
    groups.join(separator)
}

/// Formats `amount` for display in the given currency.
///
/// The currency's minor-unit precision is applied with half-away-from-zero
/// rounding, digits are grouped and separated according to the tag's locale,
/// and the symbol is placed before or after the number as that locale writes
/// it. A negative sign always leads.
pub fn format_amount(amount: Decimal, currency: &CurrencyTag) -> String {
    let style = number_style(&currency.locale);
    let digits = currency.fraction_digits();
    let rounded =
        amount.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let plain = format!("{:.*}", digits as usize, rounded.abs());
    let (integer, fraction) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut number = group_digits(integer, style.group, style.grouping);
    if let Some(fraction) = fraction {
        number.push(style.decimal);
        number.push_str(fraction);
    }

    let sign = if negative { "-" } else { "" };
    if style.symbol_first {
        format!("{sign}{}{number}", currency.symbol)
    } else {
        format!("{sign}{number} {}", currency.symbol)
    }
}
