//! The customer pipeline: ties ingestion, normalization and merging together.
//!
//! STAGES (fixed order):
//!   1. RowSource::load        (the only fallible stage)
//!   2. Normalizer::normalize  (full re-run on every refresh, no deltas)
//!   3. overrides::merge_all   (on read, against the caller's snapshot)
//!
//! The pipeline holds the latest record snapshot and nothing else; overrides
//! are always passed in so the merge reflects the store at read time.

use crate::{
    config::DeskConfig,
    error::DeskResult,
    event::{DeskEvent, NotificationBus},
    ingest::RowSource,
    normalize::{CustomerRecord, Normalizer},
    overrides::{merge, merge_all, OverrideSnapshot, ViewModel},
};
use serde::{Deserialize, Serialize};

pub struct CustomerPipeline {
    normalizer: Normalizer,
    records: Vec<CustomerRecord>,
    bus: NotificationBus,
}

impl CustomerPipeline {
    pub fn new(config: DeskConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
            records: Vec::new(),
            bus: NotificationBus::new(),
        }
    }

    pub fn config(&self) -> &DeskConfig {
        self.normalizer.config()
    }

    pub fn bus_mut(&mut self) -> &mut NotificationBus {
        &mut self.bus
    }

    /// Reload the full row snapshot and re-derive every record.
    /// On failure the previous records are kept.
    pub fn refresh(&mut self, source: &dyn RowSource) -> DeskResult<usize> {
        let rows = source.load()?;
        let records = self.normalizer.normalize(&rows);

        let used: usize = records.iter().map(|r| r.source_rows.len()).sum();
        let dropped_rows = rows.len() - used;
        log::info!(
            "pipeline: {} rows → {} customers from {} ({dropped_rows} dropped)",
            rows.len(),
            records.len(),
            source.name()
        );

        self.records = records;
        self.bus.publish(DeskEvent::DatasetLoaded {
            source: source.name(),
            rows: rows.len(),
            customers: self.records.len(),
            dropped_rows,
        });
        Ok(self.records.len())
    }

    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    pub fn record(&self, customer_id: &str) -> Option<&CustomerRecord> {
        self.records.iter().find(|r| r.customer_id == customer_id)
    }

    pub fn view_models(&self, overrides: &OverrideSnapshot) -> Vec<ViewModel> {
        merge_all(&self.records, overrides)
    }

    pub fn view_model(&self, customer_id: &str, overrides: &OverrideSnapshot) -> Option<ViewModel> {
        self.record(customer_id)
            .map(|r| merge(r, overrides.get(customer_id)))
    }
}

/// Headline figures for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeskSummary {
    pub total_customers: usize,
    pub high_risk: usize,
    pub frozen: usize,
    pub flagged: usize,
    pub inactive: usize,
    pub cards_blocked: usize,
    pub total_balance: f64,
    pub loan_count: usize,
    pub average_cibil: f64,
}

impl DeskSummary {
    pub fn from_views(views: &[ViewModel]) -> Self {
        let mut s = DeskSummary {
            total_customers: views.len(),
            ..Self::default()
        };
        let mut cibil_sum = 0f64;
        for v in views {
            let r = &v.record;
            if r.is_high_risk {
                s.high_risk += 1;
            }
            if r.frozen {
                s.frozen += 1;
            }
            if v.is_flagged() {
                s.flagged += 1;
            }
            if v.is_card_blocked() {
                s.cards_blocked += 1;
            }
            if r.active_status == crate::raw::ActiveStatus::Inactive {
                s.inactive += 1;
            }
            s.total_balance += r.balance;
            s.loan_count += r.loans.len();
            cibil_sum += r.cibil_score as f64;
        }
        if !views.is_empty() {
            s.average_cibil = cibil_sum / views.len() as f64;
        }
        s
    }
}
