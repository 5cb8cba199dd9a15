//! Override merge layer: administrator patches over canonical records.
//!
//! RULE: merge() is pure and total. It never persists, logs or fails;
//! overrides are read as an immutable snapshot per call.

use crate::{
    error::{DeskError, DeskResult},
    normalize::CustomerRecord,
    raw::RiskLevel,
    types::CustomerId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Verified => "Verified",
            Self::Rejected => "Rejected",
        }
    }
}

impl FromStr for KycStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DeskError::InvalidValue {
                field: "kyc_status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrator decision on a customer's loan application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanDecision {
    Pending,
    Approved,
    Rejected,
}

impl LoanDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl FromStr for LoanDecision {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DeskError::InvalidValue {
                field: "loan_status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LoanDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sparse administrator patch. `None` means "not overridden".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc_status: Option<KycStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_status: Option<LoanDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_blocked: Option<bool>,
}

impl Override {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Field-wise last-write-wins: every field set on `patch` replaces ours.
    pub fn apply(&mut self, patch: &Override) {
        if patch.frozen.is_some() {
            self.frozen = patch.frozen;
        }
        if patch.flagged.is_some() {
            self.flagged = patch.flagged;
        }
        if patch.remark.is_some() {
            self.remark.clone_from(&patch.remark);
        }
        if patch.kyc_status.is_some() {
            self.kyc_status = patch.kyc_status;
        }
        if patch.loan_status.is_some() {
            self.loan_status = patch.loan_status;
        }
        if patch.card_blocked.is_some() {
            self.card_blocked = patch.card_blocked;
        }
    }
}

pub type OverrideSnapshot = HashMap<CustomerId, Override>;

/// A record as presented: the canonical record with override fields applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    #[serde(flatten)]
    pub record: CustomerRecord,
    pub flagged: Option<bool>,
    pub remark: Option<String>,
    pub kyc_status: Option<KycStatus>,
    pub loan_status: Option<LoanDecision>,
    pub card_blocked: Option<bool>,
}

impl ViewModel {
    pub fn customer_id(&self) -> &str {
        &self.record.customer_id
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged.unwrap_or(false)
    }

    pub fn is_card_blocked(&self) -> bool {
        self.card_blocked.unwrap_or(false)
    }
}

pub fn merge(record: &CustomerRecord, ov: Option<&Override>) -> ViewModel {
    let mut merged = record.clone();
    let Some(ov) = ov else {
        return ViewModel {
            record: merged,
            flagged: None,
            remark: None,
            kyc_status: None,
            loan_status: None,
            card_blocked: None,
        };
    };

    if let Some(frozen) = ov.frozen {
        merged.frozen = frozen;
    }
    if ov.flagged == Some(true) {
        merged.is_high_risk = true;
        merged.risk_level = RiskLevel::High;
    }

    ViewModel {
        record: merged,
        flagged: ov.flagged,
        remark: ov.remark.clone(),
        kyc_status: ov.kyc_status,
        loan_status: ov.loan_status,
        card_blocked: ov.card_blocked,
    }
}

pub fn merge_all(records: &[CustomerRecord], overrides: &OverrideSnapshot) -> Vec<ViewModel> {
    records
        .iter()
        .map(|r| merge(r, overrides.get(&r.customer_id)))
        .collect()
}

/// Pass-through dependency that holds overrides for the desk.
/// Writes combine field-wise with whatever is already stored.
pub trait OverrideStore {
    fn get(&self, customer_id: &str) -> DeskResult<Option<Override>>;

    fn snapshot(&self) -> DeskResult<OverrideSnapshot>;

    fn upsert(&mut self, customer_id: &str, patch: &Override) -> DeskResult<Override>;

    /// Put back exactly `previous`, or remove the entry when it is `None`.
    fn restore(&mut self, customer_id: &str, previous: Option<&Override>) -> DeskResult<()>;
}

/// Process-local override store.
#[derive(Debug, Clone, Default)]
pub struct MemoryOverrides {
    entries: OverrideSnapshot,
}

impl MemoryOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(entries: OverrideSnapshot) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OverrideStore for MemoryOverrides {
    fn get(&self, customer_id: &str) -> DeskResult<Option<Override>> {
        Ok(self.entries.get(customer_id).cloned())
    }

    fn snapshot(&self) -> DeskResult<OverrideSnapshot> {
        Ok(self.entries.clone())
    }

    fn upsert(&mut self, customer_id: &str, patch: &Override) -> DeskResult<Override> {
        let entry = self.entries.entry(customer_id.to_string()).or_default();
        entry.apply(patch);
        Ok(entry.clone())
    }

    fn restore(&mut self, customer_id: &str, previous: Option<&Override>) -> DeskResult<()> {
        match previous {
            Some(ov) => {
                self.entries.insert(customer_id.to_string(), ov.clone());
            }
            None => {
                self.entries.remove(customer_id);
            }
        }
        Ok(())
    }
}
