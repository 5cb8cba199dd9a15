use serde::{Deserialize, Serialize};

// ── Risk rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRules {
    /// A payment delay strictly above this many days marks a customer high-risk.
    pub high_risk_delay_days: i64,
    /// A CIBIL score strictly below this marks a customer high-risk.
    pub min_cibil_score: i64,
    /// Report customers that are high-risk by delay or score with risk level High.
    #[serde(default)]
    pub escalate_risk_level: bool,
}

impl Default for RiskRules {
    fn default() -> Self {
        Self {
            high_risk_delay_days: 60,
            min_cibil_score: 650,
            escalate_risk_level: false,
        }
    }
}

// ── Credit utilization bands ───────────────────────────────────────

/// Upper bounds (inclusive, in percent) for each utilization label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationBands {
    pub excellent_max: f64,
    pub good_max: f64,
    pub high_usage_max: f64,
}

impl Default for UtilizationBands {
    fn default() -> Self {
        Self {
            excellent_max: 30.0,
            good_max: 50.0,
            high_usage_max: 75.0,
        }
    }
}

// ── Ingestion ──────────────────────────────────────────────────────

/// Which row within a customer's group counts as "latest".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RowOrdering {
    /// Last row in source order is the most current.
    #[default]
    IngestionOrder,
    /// Rows are stably sorted by transaction date first; undated rows sort earliest.
    TransactionDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Literal placeholder meaning "not applicable".
    pub sentinel: String,
    #[serde(default)]
    pub ordering: RowOrdering,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            sentinel: "N/A".into(),
            ordering: RowOrdering::IngestionOrder,
        }
    }
}

// ── Export ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub delimiter: char,
    pub include_header: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub risk: RiskRules,
    #[serde(default)]
    pub utilization: UtilizationBands,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl DeskConfig {
    /// Load from a JSON file such as `data/desk_config.json`.
    /// Missing sections fall back to their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self::default()
    }

    fn validate(&self) -> anyhow::Result<()> {
        let u = &self.utilization;
        if !(u.excellent_max <= u.good_max && u.good_max <= u.high_usage_max) {
            anyhow::bail!(
                "utilization bands must be ascending: {} / {} / {}",
                u.excellent_max,
                u.good_max,
                u.high_usage_max
            );
        }
        if self.ingestion.sentinel.trim().is_empty() {
            anyhow::bail!("ingestion sentinel must not be blank");
        }
        if !self.export.delimiter.is_ascii() {
            anyhow::bail!("export delimiter must be a single ASCII character");
        }
        Ok(())
    }
}
