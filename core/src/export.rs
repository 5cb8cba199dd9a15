//! CSV export of merged customer views.
//!
//! Column order is fixed: Customer ID, Name, Email, Balance, Risk Level, Status.

use crate::{config::ExportConfig, error::DeskResult, overrides::ViewModel};
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const EXPORT_HEADERS: [&str; 6] = ["Customer ID", "Name", "Email", "Balance", "Risk Level", "Status"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportView {
    HighRisk,
    Frozen,
    All,
}

impl ExportView {
    pub const ALL_VIEWS: [ExportView; 3] = [Self::HighRisk, Self::Frozen, Self::All];

    pub fn matches(&self, view: &ViewModel) -> bool {
        match self {
            Self::HighRisk => view.record.is_high_risk,
            Self::Frozen => view.record.frozen,
            Self::All => true,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::HighRisk => "high_risk_customers.csv",
            Self::Frozen => "frozen_accounts.csv",
            Self::All => "all_customers.csv",
        }
    }
}

fn status_text(view: &ViewModel) -> &'static str {
    if view.record.frozen {
        "Frozen"
    } else {
        view.record.active_status.as_str()
    }
}

/// Write the rows of `views` selected by `filter` to `writer`.
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(
    writer: W,
    views: &[ViewModel],
    filter: ExportView,
    config: &ExportConfig,
) -> DeskResult<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(config.delimiter as u8)
        .from_writer(writer);
    if config.include_header {
        wtr.write_record(EXPORT_HEADERS)?;
    }

    let mut written = 0usize;
    for view in views.iter().filter(|v| filter.matches(v)) {
        let r = &view.record;
        wtr.write_record([
            r.customer_id.as_str(),
            r.full_name.as_str(),
            r.email.as_str(),
            format!("{:.2}", r.balance).as_str(),
            r.risk_level.as_str(),
            status_text(view),
        ])?;
        written += 1;
    }
    wtr.flush()?;
    log::debug!("export: wrote {written} rows for {filter:?}");
    Ok(written)
}

pub fn export_csv(views: &[ViewModel], filter: ExportView, config: &ExportConfig) -> DeskResult<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, views, filter, config)?;
    String::from_utf8(buf).map_err(|e| anyhow::anyhow!("export produced invalid UTF-8: {e}").into())
}
