use bankdesk_core::config::{DeskConfig, RowOrdering};

#[test]
fn shipped_config_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/desk_config.json");
    let config = DeskConfig::load(path).unwrap();
    assert_eq!(config, DeskConfig::default());
    assert_eq!(config.risk.high_risk_delay_days, 60);
    assert_eq!(config.risk.min_cibil_score, 650);
    assert_eq!(config.ingestion.ordering, RowOrdering::IngestionOrder);
}

#[test]
fn partial_config_fills_in_defaults() {
    let config: DeskConfig =
        serde_json::from_str(r#"{"ingestion": {"sentinel": "-", "ordering": "transaction_date"}}"#)
            .unwrap();
    assert_eq!(config.ingestion.sentinel, "-");
    assert_eq!(config.ingestion.ordering, RowOrdering::TransactionDate);
    assert_eq!(config.risk, DeskConfig::default().risk);
    assert_eq!(config.export, DeskConfig::default().export);
}

#[test]
fn missing_config_file_is_an_error() {
    assert!(DeskConfig::load("/no/such/desk_config.json").is_err());
}
