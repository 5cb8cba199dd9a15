//! Ingestion adapter tests: payload shape, coercion and sentinels.

use bankdesk_core::{
    config::IngestionConfig,
    error::DeskError,
    ingest::{parse_rows, JsonFileSource, JsonSliceSource, RowSource},
    raw::{AccountType, ActiveStatus, RiskLevel},
};
use chrono::NaiveDate;

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/customers.json");

#[test]
fn sample_file_loads_every_row() {
    let rows = JsonFileSource::new(SAMPLE, IngestionConfig::default())
        .load()
        .unwrap();
    assert_eq!(rows.len(), 5);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.row_index, i);
    }
}

#[test]
fn string_encoded_values_are_typed() {
    let rows = JsonFileSource::new(SAMPLE, IngestionConfig::default())
        .load()
        .unwrap();

    let priya = &rows[2];
    assert!(priya.freeze_account, "\"True\" must coerce to true");
    assert_eq!(priya.cibil_score, 612);
    assert_eq!(priya.payment_delay_days, 75);
    assert_eq!(priya.account_type, AccountType::Current);
    assert_eq!(priya.risk_level, RiskLevel::Medium);
    assert_eq!(priya.account_balance, 48_000.0);

    let rohan = &rows[3];
    assert_eq!(rohan.age, 29);
    assert_eq!(rohan.transaction_amount, 1_500.0, "thousands separator tolerated");
    assert_eq!(rohan.active_status, ActiveStatus::Inactive);
    assert_eq!(
        rohan.transaction_date,
        NaiveDate::from_ymd_opt(2024, 1, 3)
    );
}

#[test]
fn sentinels_become_absence() {
    let rows = JsonFileSource::new(SAMPLE, IngestionConfig::default())
        .load()
        .unwrap();
    let rohan = &rows[3];
    assert_eq!(rohan.loan_id, None);
    assert_eq!(rohan.card_id, None);
    assert_eq!(rohan.loan_type, None);
    assert_eq!(rohan.loan_amount, 0.0);
    assert_eq!(rohan.payment_due_date, None);
    assert_eq!(rohan.credit_utilization, None);
    assert!(
        rohan.coercion_failures.is_empty(),
        "sentinels are not failures: {:?}",
        rohan.coercion_failures
    );

    // Blank ids are absent too; the normalizer decides what to do with them.
    assert_eq!(rows[4].customer_id, None);
}

#[test]
fn failed_coercion_defaults_to_zero_and_is_reported() {
    let payload = br#"[{
        "Customer ID": "C1",
        "Account Balance": "twelve",
        "CIBIL_Score": "seven hundred",
        "FreezeAccount": "maybe",
        "RiskLevel": "Severe",
        "Transaction Date": "yesterday"
    }]"#;
    let rows = parse_rows("inline", payload, &IngestionConfig::default()).unwrap();
    let row = &rows[0];

    assert_eq!(row.account_balance, 0.0);
    assert_eq!(row.cibil_score, 0);
    assert!(!row.freeze_account);
    assert_eq!(row.risk_level, RiskLevel::Low);
    assert_eq!(row.transaction_date, None);
    for field in ["Account Balance", "CIBIL_Score", "FreezeAccount", "RiskLevel", "Transaction Date"] {
        assert!(
            row.coercion_failures.contains(&field),
            "{field} missing from {:?}",
            row.coercion_failures
        );
    }
}

#[test]
fn alternate_key_spellings_are_accepted() {
    let payload = br#"[{"Customer ID": 7, "Risk Level": "high", "Freeze Account": true, "CIBIL Score": 640.4}]"#;
    let rows = parse_rows("inline", payload, &IngestionConfig::default()).unwrap();
    assert_eq!(rows[0].customer_id.as_deref(), Some("7"));
    assert_eq!(rows[0].risk_level, RiskLevel::High);
    assert!(rows[0].freeze_account);
    assert_eq!(rows[0].cibil_score, 640);
}

#[test]
fn custom_sentinel_is_honoured() {
    let config = IngestionConfig {
        sentinel: "-".into(),
        ..IngestionConfig::default()
    };
    let payload = br#"[{"Customer ID": "C1", "Loan ID": "-", "CardID": "N/A"}]"#;
    let rows = parse_rows("inline", payload, &config).unwrap();
    assert_eq!(rows[0].loan_id, None);
    assert_eq!(rows[0].card_id.as_deref(), Some("N/A"));
}

#[test]
fn empty_array_is_not_an_error() {
    let source = JsonSliceSource::new("empty", b"[]".to_vec(), IngestionConfig::default());
    assert!(source.load().unwrap().is_empty());
}

#[test]
fn non_array_payload_is_source_unavailable() {
    let payloads: [&[u8]; 3] = [br#"{"Customer ID": "C1"}"#, b"[1, 2, 3]", b"not json"];
    for payload in payloads {
        let err = parse_rows("bad", payload, &IngestionConfig::default()).unwrap_err();
        assert!(
            matches!(err, DeskError::SourceUnavailable { .. }),
            "expected SourceUnavailable, got {err:?}"
        );
    }
}

#[test]
fn missing_file_is_source_unavailable() {
    let err = JsonFileSource::new("/definitely/not/here.json", IngestionConfig::default())
        .load()
        .unwrap_err();
    match err {
        DeskError::SourceUnavailable { source_name, .. } => {
            assert!(source_name.contains("here.json"));
        }
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
}

#[test]
fn both_key_spellings_in_one_row_do_not_fail_the_batch() {
    let payload = br#"[
        {"Customer ID": "C1", "RiskLevel": "Low", "Risk Level": "High"},
        {"Customer ID": "C2", "Risk Level": "Medium"}
    ]"#;
    let rows = parse_rows("inline", payload, &IngestionConfig::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].risk_level, RiskLevel::Low, "canonical spelling wins");
    assert_eq!(rows[1].risk_level, RiskLevel::Medium);
}

#[test]
fn out_of_range_integers_are_reported_not_clamped() {
    let payload = br#"[{
        "Customer ID": "C1",
        "CIBIL_Score": 1e30,
        "Payment Delay Days": "-1e20",
        "Age": 41
    }]"#;
    let rows = parse_rows("inline", payload, &IngestionConfig::default()).unwrap();
    let row = &rows[0];
    assert_eq!(row.cibil_score, 0);
    assert_eq!(row.payment_delay_days, 0);
    assert_eq!(row.age, 41);
    assert!(row.coercion_failures.contains(&"CIBIL_Score"));
    assert!(row.coercion_failures.contains(&"Payment Delay Days"));
    assert!(!row.coercion_failures.contains(&"Age"));
}
