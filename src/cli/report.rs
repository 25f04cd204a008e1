use super::ui;
use crate::core::budget::{Budget, BudgetStatus};
use crate::core::config::AppConfig;
use crate::core::record::{RejectedRecord, normalize_records};
use crate::core::{
    AggregateReport, AmountPolicy, Granularity, TransactionFilter, WeekScheme, aggregate, source,
};
use anyhow::{Context, Result};
use comfy_table::Cell;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

/// Options for one `report` invocation. Unset fields fall back to the config.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub granularity: Option<Granularity>,
    pub week_scheme: Option<WeekScheme>,
    pub amount_policy: Option<AmountPolicy>,
    pub records: Option<String>,
    pub filter: TransactionFilter,
    pub json: bool,
}

#[derive(Debug)]
pub struct ReportOutput {
    pub report: AggregateReport,
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Serialize)]
struct PeriodBudget<'a> {
    period_key: &'a str,
    #[serde(flatten)]
    status: BudgetStatus,
}

/// The `--json` document: the report itself plus what the table prints
/// around it.
#[derive(Serialize)]
struct ExportedReport<'a> {
    #[serde(flatten)]
    report: &'a AggregateReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    budget: Option<Vec<PeriodBudget<'a>>>,
    rejected: &'a [RejectedRecord],
}

impl ReportOutput {
    pub fn to_json(&self, budget: Option<&Budget>) -> Result<String> {
        let budget = budget.map(|budget| {
            self.report
                .buckets
                .iter()
                .map(|bucket| PeriodBudget {
                    period_key: &bucket.period_key,
                    status: budget.evaluate(bucket),
                })
                .collect()
        });
        let exported = ExportedReport {
            report: &self.report,
            budget,
            rejected: &self.rejected,
        };
        serde_json::to_string_pretty(&exported).context("Failed to serialize report")
    }
}

impl AggregateReport {
    pub fn display_as_table(&self, budget: Option<&Budget>) -> String {
        let mut table = ui::new_styled_table();

        let mut header = vec![
            ui::header_cell("Period"),
            ui::header_cell("Count"),
            ui::header_cell("Inflow"),
            ui::header_cell("Outflow"),
            ui::header_cell("Net"),
            ui::header_cell("Opening"),
            ui::header_cell("Closing"),
        ];
        if budget.is_some() {
            header.push(ui::header_cell("Budget Left"));
        }
        header.push(ui::header_cell("Payment Methods"));
        table.set_header(header);

        for bucket in self.buckets_for_display() {
            let methods = bucket
                .payment_methods
                .iter()
                .map(|(method, count)| format!("{method} ×{count}"))
                .collect::<Vec<_>>()
                .join(", ");

            let mut row = vec![
                Cell::new(&bucket.period_key),
                Cell::new(bucket.transactions.len()),
                ui::amount_cell(self.format_amount(bucket.total_inflow), false),
                ui::amount_cell(self.format_amount(bucket.total_outflow), false),
                ui::signed_amount_cell(self.format_amount(bucket.net), bucket.net < Decimal::ZERO),
                ui::amount_cell(
                    self.format_amount(bucket.starting_balance),
                    bucket.starting_balance < Decimal::ZERO,
                ),
                ui::amount_cell(
                    self.format_amount(bucket.ending_balance),
                    bucket.ending_balance < Decimal::ZERO,
                ),
            ];
            if let Some(budget) = budget {
                let status = budget.evaluate(bucket);
                let remaining = self.format_amount(status.remaining);
                let used = ui::format_optional_cell(status.used_pct(), |pct| {
                    format!("{remaining} ({:.0}% used)", pct)
                });
                row.push(if status.over_budget {
                    used.fg(comfy_table::Color::Red)
                } else {
                    used
                });
            }
            row.push(Cell::new(methods));
            table.add_row(row);
        }

        let mut output = format!(
            "{} report in {}\n\n",
            ui::style_text(&capitalize(&self.granularity.to_string()), ui::StyleType::Title),
            self.report_currency
        );
        if self.granularity == Granularity::Weekly {
            output.push_str(&ui::style_text(
                &format!("Weeks: {}\n\n", self.week_scheme),
                ui::StyleType::Subtle,
            ));
        }

        output.push_str(&table.to_string());

        let net_style = if self.net() < Decimal::ZERO {
            ui::StyleType::Error
        } else {
            ui::StyleType::TotalValue
        };
        output.push_str(&format!(
            "\n\n{} {}   {} {}   {} {}",
            ui::style_text("Total Inflow:", ui::StyleType::TotalLabel),
            self.format_amount(self.total_inflow),
            ui::style_text("Total Outflow:", ui::StyleType::TotalLabel),
            self.format_amount(self.total_outflow),
            ui::style_text("Net:", ui::StyleType::TotalLabel),
            ui::style_text(&self.format_amount(self.net()), net_style),
        ));

        output
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Loads, normalizes, filters and aggregates the records for a report.
pub fn build_report(config: &AppConfig, request: &ReportRequest) -> Result<ReportOutput> {
    let records_path = request
        .records
        .as_deref()
        .or(config.records.as_deref())
        .context("No records file given; pass --records or set `records` in the config")?;

    let raws = source::load_records(records_path)?;
    let policy = request.amount_policy.unwrap_or(config.amount_policy);
    let normalized = normalize_records(raws, policy);

    let transactions = if request.filter.is_empty() {
        normalized.transactions
    } else {
        let filtered = request.filter.apply(&normalized.transactions);
        debug!(
            "Filter kept {} of {} transactions",
            filtered.len(),
            normalized.transactions.len()
        );
        filtered
    };

    let mut options = config.aggregate_options();
    if let Some(granularity) = request.granularity {
        options.granularity = granularity;
    }
    if let Some(week_scheme) = request.week_scheme {
        options.week_scheme = week_scheme;
    }

    Ok(ReportOutput {
        report: aggregate(&transactions, &options),
        rejected: normalized.rejected,
    })
}

pub fn run(config: &AppConfig, request: &ReportRequest) -> Result<()> {
    info!("Building transaction report...");
    let output = build_report(config, request)?;

    if request.json {
        println!("{}", output.to_json(config.budget.as_ref())?);
        return Ok(());
    }

    if output.report.buckets.is_empty() {
        println!("No transactions found for this report.");
    } else {
        println!("{}", output.report.display_as_table(config.budget.as_ref()));
    }

    if !output.rejected.is_empty() {
        ui::print_separator();
        println!(
            "{}",
            ui::style_text(
                &format!("Skipped {} unreadable record(s):", output.rejected.len()),
                ui::StyleType::Error
            )
        );
        for rejected in &output.rejected {
            println!(
                "{}",
                ui::style_text(
                    &format!("  #{}: {}", rejected.index, rejected.reason),
                    ui::StyleType::Subtle
                )
            );
        }
    }

    Ok(())
}
