//! Narrowing the transaction set before aggregation.

use crate::core::record::Transaction;
use chrono::NaiveDate;

/// Optional search text and inclusive date range, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub search: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self.search_needle().is_none() && self.start.is_none() && self.end.is_none()
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Case-insensitive search over the details and payment method.
    fn matches_search(needle: &str, transaction: &Transaction) -> bool {
        transaction.details.to_lowercase().contains(needle)
            || transaction
                .payment_method
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains(needle))
    }

    fn matches_with(&self, needle: Option<&str>, transaction: &Transaction) -> bool {
        !self.start.is_some_and(|start| transaction.date < start)
            && !self.end.is_some_and(|end| transaction.date > end)
            && needle.is_none_or(|needle| Self::matches_search(needle, transaction))
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.matches_with(self.search_needle().as_deref(), transaction)
    }

    /// The matching transactions, in input order.
    pub fn apply(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        let needle = self.search_needle();
        transactions
            .iter()
            .filter(|t| self.matches_with(needle.as_deref(), t))
            .cloned()
            .collect()
    }
}
