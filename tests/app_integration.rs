use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;
use tallybook::cli::report::{ReportRequest, build_report};
use tallybook::core::config::AppConfig;
use tallybook::core::period::{period_key, week_start_monday};
use tallybook::core::{
    AggregateOptions, CurrencyTag, Granularity, Transaction, TransactionFilter, WeekScheme,
    aggregate,
};
use tracing::info;

mod test_utils {
    use std::fs;
    use std::path::Path;

    pub fn write_config(dir: &Path, records: &Path, extra: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let config_content = format!(
            r#"
currency:
  code: "EUR"
  symbol: "€"
  locale: "de-DE"
records: "{}"
{}
"#,
            records.display(),
            extra
        );
        fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }

    pub fn write_records(dir: &Path) -> std::path::PathBuf {
        let records_path = dir.join("transactions.yaml");
        fs::write(
            &records_path,
            r#"
transactions:
  - date: "2024-03-31"
    inflow: 1200
    details: "Invoice #101 Acme GmbH"
    paymentMethod: "Bank transfer"
  - date: "2024-04-01"
    outflow: "300.50"
    details: "Office rent"
    paymentMethod: "Bank transfer"
  - date: "2024-04-03"
    outflow: "oops"
    details: "Receipt scan unreadable"
  - date: "2024-05-27"
    inflow: "80"
    details: "Cash sale"
    paymentMethod: "Cash"
  - date: "not-a-date"
    inflow: 10
"#,
        )
        .expect("Failed to write records file");
        records_path
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A year of invoices and expenses, with a few negative corrections.
fn generated_transactions() -> Vec<Transaction> {
    let start = date(2023, 11, 20);
    (0..160)
        .map(|i| {
            let day = start + Duration::days((i * 37 % 400) as i64);
            let amount = Decimal::new((i * 7919 % 50_000) as i64, 2);
            let t = if i % 3 == 0 {
                Transaction::new(day, Decimal::ZERO, amount)
            } else if i % 17 == 0 {
                Transaction::new(day, -amount, Decimal::ZERO)
            } else {
                Transaction::new(day, amount, Decimal::ZERO)
            };
            t.with_details(&format!("record {i}"))
        })
        .collect()
}

#[test_log::test]
fn test_full_app_flow() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let records_path = test_utils::write_records(temp_dir.path());
    let config_path = test_utils::write_config(temp_dir.path(), &records_path, "");

    let result = tallybook::run_command(
        tallybook::AppCommand::Report(ReportRequest::default()),
        Some(config_path.to_str().unwrap()),
    );
    assert!(
        result.is_ok(),
        "Main function failed with: {:?}",
        result.err()
    );

    let json = tallybook::run_command(
        tallybook::AppCommand::Report(ReportRequest {
            granularity: Some(Granularity::Weekly),
            week_scheme: Some(WeekScheme::MondayAligned),
            json: true,
            ..Default::default()
        }),
        Some(config_path.to_str().unwrap()),
    );
    assert!(json.is_ok(), "JSON report failed with: {:?}", json.err());
}

#[test_log::test]
fn test_missing_config_file_is_an_error() {
    let result = tallybook::run_command(
        tallybook::AppCommand::Report(ReportRequest::default()),
        Some("/nonexistent/tallybook/config.yaml"),
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test_log::test]
fn test_report_from_config_and_records() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let records_path = test_utils::write_records(temp_dir.path());
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &records_path,
        "granularity: weekly\nbudget:\n  limit: 250\n",
    );
    let config = AppConfig::load_from_path(&config_path).unwrap();

    let output = build_report(&config, &ReportRequest::default()).unwrap();
    let report = &output.report;
    info!(buckets = report.buckets.len(), "Built weekly report");

    // Month-relative weeks: the last of March and the first of April split.
    let keys: Vec<&str> = report.buckets.iter().map(|b| b.period_key.as_str()).collect();
    assert_eq!(keys, vec!["2024-03-W6", "2024-04-W1", "2024-05-W5"]);
    assert_eq!(report.report_currency.code, "EUR");
    assert_eq!(report.total_inflow, dec("1280"));
    assert_eq!(report.total_outflow, dec("300.50"));
    assert_eq!(report.closing_balance(), dec("979.50"));
    assert_eq!(report.format_amount(report.closing_balance()), "979,50 €");

    // "oops" is coerced to zero, the undated record is skipped.
    assert_eq!(report.buckets[1].transactions.len(), 2);
    assert_eq!(output.rejected.len(), 1);
    assert_eq!(output.rejected[0].index, 4);

    let budget = config.budget.unwrap();
    assert!(budget.evaluate(&report.buckets[1]).over_budget);
    assert!(!budget.evaluate(&report.buckets[2]).over_budget);
}

#[test_log::test]
fn test_strict_policy_and_filters() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let records_path = test_utils::write_records(temp_dir.path());
    let config_path =
        test_utils::write_config(temp_dir.path(), &records_path, "amount_policy: strict\n");
    let config = AppConfig::load_from_path(&config_path).unwrap();

    let output = build_report(&config, &ReportRequest::default()).unwrap();
    assert_eq!(output.report.transaction_count(), 3);
    assert_eq!(
        output.rejected.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![2, 4]
    );

    let filtered = build_report(
        &config,
        &ReportRequest {
            filter: TransactionFilter {
                search: Some("bank".to_string()),
                start: Some(date(2024, 4, 1)),
                end: Some(date(2024, 4, 30)),
            },
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(filtered.report.transaction_count(), 1);
    assert_eq!(filtered.report.buckets[0].period_key, "2024-04");
    assert_eq!(filtered.report.net(), dec("-300.50"));
}

#[test_log::test]
fn test_conservation_and_continuity_hold_for_every_granularity() {
    let transactions = generated_transactions();
    let global_in: Decimal = transactions.iter().map(|t| t.inflow).sum();
    let global_out: Decimal = transactions.iter().map(|t| t.outflow).sum();

    for (granularity, week_scheme) in [
        (Granularity::Weekly, WeekScheme::MonthRelative),
        (Granularity::Weekly, WeekScheme::MondayAligned),
        (Granularity::Monthly, WeekScheme::MonthRelative),
        (Granularity::Quarterly, WeekScheme::MonthRelative),
        (Granularity::Annual, WeekScheme::MonthRelative),
    ] {
        let options = AggregateOptions {
            granularity,
            week_scheme,
            ..Default::default()
        };
        let report = aggregate(&transactions, &options);

        assert_eq!(report.total_inflow, global_in);
        assert_eq!(report.total_outflow, global_out);
        let summed_net: Decimal = report.buckets.iter().map(|b| b.net).sum();
        assert_eq!(summed_net, global_in - global_out);

        assert_eq!(report.buckets[0].starting_balance, Decimal::ZERO);
        for pair in report.buckets.windows(2) {
            assert!(pair[0].period_key < pair[1].period_key);
            assert_eq!(pair[1].starting_balance, pair[0].ending_balance);
        }
        assert_eq!(report.closing_balance(), global_in - global_out);

        // Partition: same multiset of transactions, each under its own key.
        let mut seen: Vec<String> = Vec::new();
        for bucket in &report.buckets {
            for t in &bucket.transactions {
                let key = match (granularity, week_scheme) {
                    (Granularity::Weekly, WeekScheme::MondayAligned) => {
                        week_start_monday(t.date).format("%Y-%m-%d").to_string()
                    }
                    _ => period_key(t.date, granularity),
                };
                assert_eq!(key, bucket.period_key);
                seen.push(t.details.clone());
            }
        }
        let mut expected: Vec<String> = transactions.iter().map(|t| t.details.clone()).collect();
        seen.sort();
        expected.sort();
        assert_eq!(seen, expected);

        assert_eq!(aggregate(&transactions, &options), report);
    }
}

#[test_log::test]
fn test_default_currency_reaches_formatting() {
    let inr = CurrencyTag::new("INR", "₹", "en-IN");
    let options = AggregateOptions {
        default_currency: inr.clone(),
        ..Default::default()
    };
    let transactions = vec![
        Transaction::new(date(2024, 6, 2), dec("150000"), Decimal::ZERO),
        Transaction::new(date(2024, 6, 3), Decimal::ZERO, dec("25"))
            .with_currency(CurrencyTag::default()),
    ];

    let report = aggregate(&transactions, &options);
    assert_eq!(report.report_currency, inr);
    assert_eq!(report.format_amount(report.net()), "₹1,49,975.00");

    let empty = aggregate(&[], &options);
    assert_eq!(empty.report_currency, inr);
    assert!(empty.buckets.is_empty());
}

#[test_log::test]
fn test_bad_records_are_skipped_one_at_a_time() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let records_path = temp_dir.path().join("records.json");
    std::fs::write(
        &records_path,
        r#"[
            {"date": "2024-01-05", "inflow": 100},
            {"date": "2024-01-06", "inflow": 5, "details": 42},
            {"date": 20240106, "inflow": 1},
            {"date": "2024-01-07", "outflow": 2, "currency": "USD"},
            {"date": "2024-01-08", "inflow": "50000000000000000000000000000"},
            {"date": "2024-01-09", "inflow": "50000000000000000000000000000"}
        ]"#,
    )
    .unwrap();
    let config_path = test_utils::write_config(temp_dir.path(), &records_path, "");
    let config = AppConfig::load_from_path(&config_path).unwrap();

    let output = build_report(&config, &ReportRequest::default()).unwrap();
    assert_eq!(output.report.transaction_count(), 3);
    assert_eq!(output.report.net(), dec("103"));
    assert_eq!(
        output.rejected.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![2, 4, 5]
    );

    let json: serde_json::Value = serde_json::from_str(&output.to_json(None).unwrap()).unwrap();
    assert_eq!(json["rejected"].as_array().map(Vec::len), Some(3));
}
