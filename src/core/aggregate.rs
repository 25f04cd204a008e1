//! Groups transactions into periods and carries a running balance across them.
use crate::core::currency::{CurrencyTag, format_amount};
use crate::core::period::{Granularity, WeekScheme, bucket_key};
use crate::core::record::Transaction;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Label counted for transactions that carry no payment method.
pub const UNSPECIFIED_PAYMENT_METHOD: &str = "unspecified";

/// Settings for a single aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub granularity: Granularity,
    /// Only consulted when `granularity` is weekly.
    pub week_scheme: WeekScheme,
    /// Reporting currency when the first transaction has none.
    pub default_currency: CurrencyTag,
}

impl AggregateOptions {
    pub fn new(granularity: Granularity) -> Self {
        AggregateOptions {
            granularity,
            ..Default::default()
        }
    }
}

/// Transactions that share a period key, with their totals and the running
/// balance on either side of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBucket {
    pub period_key: String,
    pub transactions: Vec<Transaction>,
    pub total_inflow: Decimal,
    pub total_outflow: Decimal,
    pub net: Decimal,
    pub starting_balance: Decimal,
    pub ending_balance: Decimal,
    pub payment_methods: BTreeMap<String, usize>,
}

impl PeriodBucket {
    fn open(period_key: String, starting_balance: Decimal) -> Self {
        PeriodBucket {
            period_key,
            transactions: Vec::new(),
            total_inflow: Decimal::ZERO,
            total_outflow: Decimal::ZERO,
            net: Decimal::ZERO,
            starting_balance,
            ending_balance: starting_balance,
            payment_methods: BTreeMap::new(),
        }
    }

    fn push(&mut self, transaction: Transaction, running_balance: Decimal) {
        self.total_inflow = self.total_inflow.saturating_add(transaction.inflow);
        self.total_outflow = self.total_outflow.saturating_add(transaction.outflow);
        self.net = self.total_inflow.saturating_sub(self.total_outflow);
        self.ending_balance = running_balance;

        let method = transaction
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(UNSPECIFIED_PAYMENT_METHOD);
        *self.payment_methods.entry(method.to_string()).or_insert(0) += 1;

        self.transactions.push(transaction);
    }
}

/// The result of an aggregation run.
///
/// `buckets` are kept in chronological order, which is the order the running
/// balance was carried in. Use [`AggregateReport::buckets_for_display`] for the
/// most-recent-first order reports are usually shown in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub granularity: Granularity,
    pub week_scheme: WeekScheme,
    pub buckets: Vec<PeriodBucket>,
    pub total_inflow: Decimal,
    pub total_outflow: Decimal,
    pub report_currency: CurrencyTag,
}

impl AggregateReport {
    pub fn net(&self) -> Decimal {
        self.total_inflow.saturating_sub(self.total_outflow)
    }

    /// Balance after the last transaction, zero for an empty report.
    pub fn closing_balance(&self) -> Decimal {
        self.buckets
            .last()
            .map_or(Decimal::ZERO, |bucket| bucket.ending_balance)
    }

    pub fn transaction_count(&self) -> usize {
        self.buckets.iter().map(|b| b.transactions.len()).sum()
    }

    /// Buckets ordered by descending period key, most recent period first.
    pub fn buckets_for_display(&self) -> Vec<&PeriodBucket> {
        let mut buckets: Vec<&PeriodBucket> = self.buckets.iter().collect();
        buckets.sort_by(|a, b| b.period_key.cmp(&a.period_key));
        buckets
    }

    pub fn format_amount(&self, amount: Decimal) -> String {
        format_amount(amount, &self.report_currency)
    }
}

/// Groups `transactions` into period buckets and computes running balances.
///
/// The caller's slice is left untouched: a copy is stably sorted by date, so
/// transactions on the same day keep their input order. Each bucket's
/// `starting_balance` is the running balance before its first transaction and
/// its `ending_balance` the balance after its last one, so consecutive
/// buckets chain. Amounts are summed as given, including negatives.
///
/// Sums saturate at the `Decimal` range instead of overflowing; amounts read
/// through [`crate::core::record::normalize_records`] never get close.
///
/// The reporting currency is the tag on the first transaction in input
/// order, or `options.default_currency` when that transaction has none or the
/// input is empty.
pub fn aggregate(transactions: &[Transaction], options: &AggregateOptions) -> AggregateReport {
    let report_currency = transactions
        .first()
        .map(|t| t.currency_or(&options.default_currency).clone())
        .unwrap_or_else(|| options.default_currency.clone());

    let mut ordered = transactions.to_vec();
    ordered.sort_by_key(|t| t.date);

    let mut buckets: Vec<PeriodBucket> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();
    let mut running_balance = Decimal::ZERO;
    let mut total_inflow = Decimal::ZERO;
    let mut total_outflow = Decimal::ZERO;

    for transaction in ordered {
        let key = bucket_key(transaction.date, options.granularity, options.week_scheme);
        let index = *index_by_key.entry(key.clone()).or_insert_with(|| {
            buckets.push(PeriodBucket::open(key, running_balance));
            buckets.len() - 1
        });

        total_inflow = total_inflow.saturating_add(transaction.inflow);
        total_outflow = total_outflow.saturating_add(transaction.outflow);
        running_balance = running_balance.saturating_add(transaction.net());
        buckets[index].push(transaction, running_balance);
    }

    debug!(
        granularity = %options.granularity,
        week_scheme = %options.week_scheme,
        buckets = buckets.len(),
        currency = %report_currency.code,
        "Aggregated {} transactions",
        transactions.len()
    );

    AggregateReport {
        granularity: options.granularity,
        week_scheme: options.week_scheme,
        buckets,
        total_inflow,
        total_outflow,
        report_currency,
    }
}
