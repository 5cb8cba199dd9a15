//! Audit trail for state-changing admin actions.
//!
//! RULE: one entry per state change. Free-text remarks are never audited.

use crate::{
    error::{DeskError, DeskResult},
    overrides::{KycStatus, LoanDecision},
    types::{Actor, CustomerId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Freeze,
    Unfreeze,
    Flag,
    Unflag,
    KycVerified,
    KycRejected,
    KycPending,
    LoanApproved,
    LoanRejected,
    LoanPending,
    CardBlocked,
    CardUnblocked,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freeze => "FREEZE",
            Self::Unfreeze => "UNFREEZE",
            Self::Flag => "FLAG",
            Self::Unflag => "UNFLAG",
            Self::KycVerified => "KYC_VERIFIED",
            Self::KycRejected => "KYC_REJECTED",
            Self::KycPending => "KYC_PENDING",
            Self::LoanApproved => "LOAN_APPROVED",
            Self::LoanRejected => "LOAN_REJECTED",
            Self::LoanPending => "LOAN_PENDING",
            Self::CardBlocked => "CARD_BLOCKED",
            Self::CardUnblocked => "CARD_UNBLOCKED",
        }
    }

    pub fn for_frozen(frozen: bool) -> Self {
        if frozen { Self::Freeze } else { Self::Unfreeze }
    }

    pub fn for_flagged(flagged: bool) -> Self {
        if flagged { Self::Flag } else { Self::Unflag }
    }

    pub fn for_card_blocked(blocked: bool) -> Self {
        if blocked { Self::CardBlocked } else { Self::CardUnblocked }
    }

    pub fn for_kyc(status: KycStatus) -> Self {
        match status {
            KycStatus::Verified => Self::KycVerified,
            KycStatus::Rejected => Self::KycRejected,
            KycStatus::Pending => Self::KycPending,
        }
    }

    pub fn for_loan(decision: LoanDecision) -> Self {
        match decision {
            LoanDecision::Approved => Self::LoanApproved,
            LoanDecision::Rejected => Self::LoanRejected,
            LoanDecision::Pending => Self::LoanPending,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        let action = match s {
            "FREEZE" => Self::Freeze,
            "UNFREEZE" => Self::Unfreeze,
            "FLAG" => Self::Flag,
            "UNFLAG" => Self::Unflag,
            "KYC_VERIFIED" => Self::KycVerified,
            "KYC_REJECTED" => Self::KycRejected,
            "KYC_PENDING" => Self::KycPending,
            "LOAN_APPROVED" => Self::LoanApproved,
            "LOAN_REJECTED" => Self::LoanRejected,
            "LOAN_PENDING" => Self::LoanPending,
            "CARD_BLOCKED" => Self::CardBlocked,
            "CARD_UNBLOCKED" => Self::CardUnblocked,
            other => {
                return Err(DeskError::InvalidValue {
                    field: "action",
                    value: other.to_string(),
                })
            }
        };
        Ok(action)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub customer_id: CustomerId,
    pub action: AuditAction,
    pub details: String,
    pub actor: Actor,
}

impl AuditLogEntry {
    pub fn new(customer_id: &str, action: AuditAction, details: impl Into<String>, actor: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            customer_id: customer_id.to_string(),
            action,
            details: details.into(),
            actor: actor.to_string(),
        }
    }
}

/// External log sink for audit entries.
pub trait AuditSink {
    fn append(&mut self, entry: &AuditLogEntry) -> DeskResult<()>;
}

/// Keeps entries in memory, newest last.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLog {
    entries: Vec<AuditLogEntry>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[AuditLogEntry] {
        &self.entries
    }

    pub fn for_customer<'a>(&'a self, customer_id: &'a str) -> impl Iterator<Item = &'a AuditLogEntry> + 'a {
        self.entries.iter().filter(move |e| e.customer_id == customer_id)
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&mut self, entry: &AuditLogEntry) -> DeskResult<()> {
        self.entries.push(entry.clone());
        Ok(())
    }
}
