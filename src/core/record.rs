//! Transaction records and the boundary where raw documents become typed
//! transactions.

use crate::core::currency::CurrencyTag;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, warn};

/// A dated money movement ready for aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    #[serde(default)]
    pub inflow: Decimal,
    #[serde(default)]
    pub outflow: Decimal,
    #[serde(default)]
    pub currency: Option<CurrencyTag>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub details: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, inflow: Decimal, outflow: Decimal) -> Self {
        Transaction {
            date,
            inflow,
            outflow,
            currency: None,
            payment_method: None,
            details: String::new(),
        }
    }

    pub fn with_currency(mut self, currency: CurrencyTag) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn with_payment_method(mut self, method: &str) -> Self {
        self.payment_method = Some(method.to_string());
        self
    }

    pub fn with_details(mut self, details: &str) -> Self {
        self.details = details.to_string();
        self
    }

    /// `inflow - outflow`, saturating at the `Decimal` range.
    pub fn net(&self) -> Decimal {
        self.inflow.saturating_sub(self.outflow)
    }

    /// The transaction's own currency, or `default` when it carries none.
    pub fn currency_or<'a>(&'a self, default: &'a CurrencyTag) -> &'a CurrencyTag {
        self.currency.as_ref().unwrap_or(default)
    }
}

/// An amount as it appears in a stored document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// A text field as it appears in a stored document. Numbers are kept as
/// their written form, anything else is dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawText {
    Text(String),
    Number(serde_json::Number),
    Other(IgnoredAny),
}

impl RawText {
    pub fn into_text(self) -> Option<String> {
        match self {
            RawText::Text(text) => Some(text),
            RawText::Number(number) => Some(number.to_string()),
            RawText::Other(_) => None,
        }
    }
}

/// A currency field: a full tag, a bare code, or something unusable.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCurrency {
    Tag(CurrencyTag),
    Code(String),
    Other(IgnoredAny),
}

impl RawCurrency {
    /// A bare code is written with the code as its symbol, in the default
    /// tag's locale.
    pub fn into_tag(self) -> Option<CurrencyTag> {
        match self {
            RawCurrency::Tag(tag) => Some(tag),
            RawCurrency::Code(code) if code.trim().is_empty() => None,
            RawCurrency::Code(code) => {
                let code = code.trim().to_uppercase();
                let base = CurrencyTag::default();
                if code == base.code {
                    Some(base)
                } else {
                    Some(CurrencyTag::new(&code, &code, &base.locale))
                }
            }
            RawCurrency::Other(_) => None,
        }
    }
}

/// A transaction document before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default)]
    pub date: Option<RawText>,
    #[serde(default)]
    pub inflow: Option<RawAmount>,
    #[serde(default)]
    pub outflow: Option<RawAmount>,
    #[serde(default)]
    pub currency: Option<RawCurrency>,
    #[serde(default, alias = "payment_method")]
    pub payment_method: Option<RawText>,
    #[serde(default, alias = "description")]
    pub details: Option<RawText>,
}

impl RawRecord {
    /// Reads one stored document. Only a document that is not a map fails.
    pub fn from_value(value: Value) -> Result<RawRecord, String> {
        match value {
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| format!("malformed record: {e}")),
            Value::Null => Err("record is null".to_string()),
            other => Err(format!("record is not a map: {other}")),
        }
    }
}

/// Largest accepted magnitude for a single amount: one quadrillion.
///
/// Keeps every sum a report can reach well inside the `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// How amounts that are not numbers are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountPolicy {
    /// Unparseable amounts count as zero, so one bad document cannot sink a report.
    #[default]
    Lenient,
    /// A present but unparseable amount rejects the whole record.
    Strict,
}

impl Display for AmountPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountPolicy::Lenient => write!(f, "lenient"),
            AmountPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for AmountPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(AmountPolicy::Lenient),
            "strict" => Ok(AmountPolicy::Strict),
            _ => Err(anyhow::anyhow!("Invalid amount policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RejectedRecord>,
}

/// Parses the longest leading decimal number in `text`, ignoring surrounding
/// whitespace. `"12.5 USD"` yields 12.5, `"1e3"` yields 1000 and `"abc"`
/// yields `None`.
fn parse_leading_number(text: &str) -> Option<Decimal> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }

    let mantissa = end;
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    let number = text[..end].trim_start_matches('+');
    if end > mantissa {
        Decimal::from_scientific(number).ok()
    } else {
        Decimal::from_str(number).ok()
    }
}

/// Reads an amount under `policy`. A missing amount is zero under both
/// policies; `Err` carries the reason a strict read failed.
pub fn coerce_amount(raw: Option<&RawAmount>, policy: AmountPolicy) -> Result<Decimal, String> {
    let parsed = match raw {
        None => return Ok(Decimal::ZERO),
        Some(RawAmount::Number(n)) => Decimal::from_f64(*n)
            .ok_or_else(|| format!("amount {n} is not a representable number")),
        Some(RawAmount::Text(s)) => match policy {
            AmountPolicy::Lenient => {
                parse_leading_number(s).ok_or_else(|| format!("amount {s:?} is not numeric"))
            }
            AmountPolicy::Strict => Decimal::from_str(s.trim())
                .map_err(|_| format!("amount {s:?} is not numeric")),
        },
        Some(RawAmount::Other(_)) => Err("amount is not a number or string".to_string()),
    };

    match (parsed, policy) {
        (Ok(value), _) => Ok(value),
        (Err(reason), AmountPolicy::Lenient) => {
            debug!("Coercing to zero: {reason}");
            Ok(Decimal::ZERO)
        }
        (Err(reason), AmountPolicy::Strict) => Err(reason),
    }
}

/// Parses a calendar date, dropping any time of day.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

fn within_limit(amount: Decimal, field: &str) -> Result<Decimal, String> {
    if amount.abs() > MAX_AMOUNT {
        Err(format!("{field} {amount} exceeds the largest accepted amount"))
    } else {
        Ok(amount)
    }
}

impl RawRecord {
    pub fn into_transaction(self, policy: AmountPolicy) -> Result<Transaction, String> {
        let date = match self.date.and_then(RawText::into_text) {
            None => return Err("missing date".to_string()),
            Some(text) => parse_date(&text).ok_or_else(|| format!("unparseable date {text:?}"))?,
        };
        let inflow = within_limit(coerce_amount(self.inflow.as_ref(), policy)?, "inflow")?;
        let outflow = within_limit(coerce_amount(self.outflow.as_ref(), policy)?, "outflow")?;

        Ok(Transaction {
            date,
            inflow,
            outflow,
            currency: self.currency.and_then(RawCurrency::into_tag),
            payment_method: self.payment_method.and_then(RawText::into_text),
            details: self
                .details
                .and_then(RawText::into_text)
                .unwrap_or_default(),
        })
    }
}

/// Converts stored documents into transactions, keeping input order.
///
/// Documents that cannot be read are reported in `rejected` with their input
/// index; the rest are returned even when some fail.
pub fn normalize_records(documents: Vec<Value>, policy: AmountPolicy) -> Normalized {
    let mut normalized = Normalized::default();
    for (index, document) in documents.into_iter().enumerate() {
        match RawRecord::from_value(document).and_then(|raw| raw.into_transaction(policy)) {
            Ok(transaction) => normalized.transactions.push(transaction),
            Err(reason) => {
                warn!(index, %reason, "Skipping transaction record");
                normalized.rejected.push(RejectedRecord { index, reason });
            }
        }
    }
    debug!(
        accepted = normalized.transactions.len(),
        rejected = normalized.rejected.len(),
        %policy,
        "Normalized transaction records"
    );
    normalized
}
