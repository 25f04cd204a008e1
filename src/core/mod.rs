//! Core business logic: records, periods and aggregation

pub mod aggregate;
pub mod budget;
pub mod config;
pub mod currency;
pub mod filter;
pub mod log;
pub mod period;
pub mod record;
pub mod source;

// Re-export main types for cleaner imports
pub use aggregate::{AggregateOptions, AggregateReport, PeriodBucket, aggregate};
pub use currency::{CurrencyTag, format_amount};
pub use filter::TransactionFilter;
pub use period::{Granularity, WeekScheme};
pub use record::{AmountPolicy, RawRecord, Transaction};
