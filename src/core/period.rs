//! Period keys used to bucket transactions.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Annual,
}

impl Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Granularity::Weekly => "weekly",
                Granularity::Monthly => "monthly",
                Granularity::Quarterly => "quarterly",
                Granularity::Annual => "annual",
            }
        )
    }
}

impl FromStr for Granularity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" | "week" => Ok(Granularity::Weekly),
            "monthly" | "month" => Ok(Granularity::Monthly),
            "quarterly" | "quarter" => Ok(Granularity::Quarterly),
            "annual" | "annually" | "yearly" | "year" => Ok(Granularity::Annual),
            _ => Err(anyhow::anyhow!("Invalid granularity: {}", s)),
        }
    }
}

/// Which policy buckets transactions under [`Granularity::Weekly`].
///
/// The two policies disagree around month boundaries and both are in use by
/// different reports, so callers pick one explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekScheme {
    /// `YYYY-MM-W<n>`, weeks restart on the first of every month.
    #[default]
    MonthRelative,
    /// `YYYY-MM-DD` of the Monday that starts the week.
    MondayAligned,
}

impl Display for WeekScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                WeekScheme::MonthRelative => "month_relative",
                WeekScheme::MondayAligned => "monday_aligned",
            }
        )
    }
}

impl FromStr for WeekScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "month_relative" | "month" => Ok(WeekScheme::MonthRelative),
            "monday_aligned" | "monday" | "iso" => Ok(WeekScheme::MondayAligned),
            _ => Err(anyhow::anyhow!("Invalid week scheme: {}", s)),
        }
    }
}

/// Week number of `date` within its own month, counting from 1.
///
/// The first week is padded by the weekday of the first of the month
/// (Sunday = 0), so a week never spans two months.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let offset = date.with_day(1).unwrap_or(date).weekday().num_days_from_sunday();
    (date.day() + offset).div_ceil(7)
}

/// Derives the period key for `date`.
///
/// Keys sort lexicographically in chronological order. Weekly keys are
/// month-relative: the last day of one month and the first day of the next
/// never share a key, even when they fall in the same calendar week.
pub fn period_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Weekly => format!(
            "{:04}-{:02}-W{}",
            date.year(),
            date.month(),
            week_of_month(date)
        ),
        Granularity::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
        Granularity::Quarterly => format!("{:04}-Q{}", date.year(), date.month0() / 3 + 1),
        Granularity::Annual => format!("{:04}", date.year()),
    }
}

/// The most recent Monday on or before `date`. A Sunday steps back six days.
pub fn week_start_monday(date: NaiveDate) -> NaiveDate {
    let days_since_monday = date.weekday().num_days_from_monday();
    date - Duration::days(days_since_monday as i64)
}

/// Period key under the given granularity and weekly policy.
pub fn bucket_key(date: NaiveDate, granularity: Granularity, week_scheme: WeekScheme) -> String {
    match (granularity, week_scheme) {
        (Granularity::Weekly, WeekScheme::MondayAligned) => {
            week_start_monday(date).format("%Y-%m-%d").to_string()
        }
        _ => period_key(date, granularity),
    }
}
