//! Spending limits checked against each period's outflow.

use crate::core::aggregate::PeriodBucket;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A spending guardrail applied to every period of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub limit: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub limit: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub over_budget: bool,
}

impl BudgetStatus {
    /// Share of the limit spent, as a percentage. `None` for a zero limit or
    /// a share too large to represent.
    pub fn used_pct(&self) -> Option<Decimal> {
        self.spent
            .checked_div(self.limit)
            .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
    }
}

impl Budget {
    pub fn new(limit: Decimal) -> Self {
        Budget { limit }
    }

    pub fn evaluate(&self, bucket: &PeriodBucket) -> BudgetStatus {
        let spent = bucket.total_outflow;
        BudgetStatus {
            limit: self.limit,
            spent,
            remaining: self.limit.saturating_sub(spent),
            over_budget: spent > self.limit,
        }
    }
}
