//! CSV export tests against the sample dataset.

use bankdesk_core::{
    config::{DeskConfig, ExportConfig},
    export::{export_csv, write_csv, ExportView, EXPORT_HEADERS},
    ingest::JsonFileSource,
    overrides::{Override, OverrideSnapshot, ViewModel},
    pipeline::CustomerPipeline,
};

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/customers.json");

fn sample_views(overrides: &OverrideSnapshot) -> Vec<ViewModel> {
    let config = DeskConfig::default_test();
    let source = JsonFileSource::new(SAMPLE, config.ingestion.clone());
    let mut pipeline = CustomerPipeline::new(config);
    pipeline.refresh(&source).unwrap();
    pipeline.view_models(overrides)
}

fn data_lines(csv: &str) -> Vec<&str> {
    csv.lines().skip(1).collect()
}

#[test]
fn header_has_fixed_column_order() {
    let csv = export_csv(&[], ExportView::All, &ExportConfig::default()).unwrap();
    assert_eq!(csv.lines().next(), Some("Customer ID,Name,Email,Balance,Risk Level,Status"));
    assert_eq!(EXPORT_HEADERS.len(), 6);
    assert_eq!(csv.lines().count(), 1, "empty input still gets a header");
}

#[test]
fn each_view_selects_its_rows() {
    let views = sample_views(&OverrideSnapshot::new());
    let config = ExportConfig::default();

    let high = export_csv(&views, ExportView::HighRisk, &config).unwrap();
    let ids: Vec<_> = data_lines(&high)
        .into_iter()
        .map(|l| l.split(',').next().unwrap_or_default())
        .collect();
    assert_eq!(ids, ["C1002", "C1003"]);

    let frozen = export_csv(&views, ExportView::Frozen, &config).unwrap();
    assert_eq!(data_lines(&frozen).len(), 1);
    assert!(frozen.contains("C1002,Priya Iyer,priya.iyer@example.com,48000.00,Medium,Frozen"));

    let all = export_csv(&views, ExportView::All, &config).unwrap();
    assert_eq!(data_lines(&all).len(), 3);
}

#[test]
fn row_formatting() {
    let views = sample_views(&OverrideSnapshot::new());
    let all = export_csv(&views, ExportView::All, &ExportConfig::default()).unwrap();
    let rows = data_lines(&all);
    assert_eq!(rows[0], "C1001,Aarav Sharma,aarav.sharma@example.com,177000.50,Low,Active");
    assert_eq!(rows[2], "C1003,Rohan Mehta,rohan.mehta@example.com,9500.00,High,Inactive");
}

#[test]
fn overrides_are_reflected_in_export() {
    let mut snapshot = OverrideSnapshot::new();
    snapshot.insert(
        "C1001".into(),
        Override {
            frozen: Some(true),
            flagged: Some(true),
            ..Override::default()
        },
    );
    snapshot.insert(
        "C1002".into(),
        Override {
            frozen: Some(false),
            ..Override::default()
        },
    );
    let views = sample_views(&snapshot);
    let config = ExportConfig::default();

    let frozen = export_csv(&views, ExportView::Frozen, &config).unwrap();
    assert_eq!(
        data_lines(&frozen),
        ["C1001,Aarav Sharma,aarav.sharma@example.com,177000.50,High,Frozen"]
    );

    let high = export_csv(&views, ExportView::HighRisk, &config).unwrap();
    assert_eq!(data_lines(&high).len(), 3);
}

#[test]
fn write_csv_reports_row_count_and_honours_config() {
    let views = sample_views(&OverrideSnapshot::new());
    let config = ExportConfig {
        delimiter: ';',
        include_header: false,
    };
    let mut buf = Vec::new();
    let written = write_csv(&mut buf, &views, ExportView::HighRisk, &config).unwrap();
    assert_eq!(written, 2);

    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.starts_with("C1002;Priya Iyer;"));
}

#[test]
fn file_names_are_stable() {
    let names: Vec<_> = ExportView::ALL_VIEWS.iter().map(|v| v.file_name()).collect();
    assert_eq!(
        names,
        ["high_risk_customers.csv", "frozen_accounts.csv", "all_customers.csv"]
    );
}
