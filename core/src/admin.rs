//! Admin actions: the only writer of overrides.
//!
//! Every state-changing action:
//!   1. upserts a one-field patch into the override store
//!   2. appends exactly one audit entry
//!   3. publishes OverrideChanged and AuditRecorded on the bus (if attached)
//! Remarks follow steps 1 and 3 only.

use crate::{
    audit::{AuditAction, AuditLogEntry, AuditSink},
    error::{DeskError, DeskResult},
    event::{DeskEvent, NotificationBus},
    overrides::{KycStatus, LoanDecision, Override, OverrideStore},
    types::Actor,
};

pub struct AdminDesk<O: OverrideStore, A: AuditSink> {
    actor: Actor,
    overrides: O,
    audit: A,
    bus: Option<NotificationBus>,
}

impl<O: OverrideStore, A: AuditSink> AdminDesk<O, A> {
    pub fn new(actor: impl Into<Actor>, overrides: O, audit: A) -> Self {
        Self {
            actor: actor.into(),
            overrides,
            audit,
            bus: None,
        }
    }

    pub fn with_bus(mut self, bus: NotificationBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn overrides(&self) -> &O {
        &self.overrides
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn bus_mut(&mut self) -> Option<&mut NotificationBus> {
        self.bus.as_mut()
    }

    pub fn set_frozen(&mut self, customer_id: &str, frozen: bool) -> DeskResult<AuditLogEntry> {
        let patch = Override {
            frozen: Some(frozen),
            ..Override::default()
        };
        let details = if frozen { "Account frozen" } else { "Account unfrozen" };
        self.apply(customer_id, patch, AuditAction::for_frozen(frozen), details.to_string())
    }

    pub fn set_flagged(&mut self, customer_id: &str, flagged: bool) -> DeskResult<AuditLogEntry> {
        let patch = Override {
            flagged: Some(flagged),
            ..Override::default()
        };
        let details = if flagged {
            "Marked as suspicious"
        } else {
            "Suspicious flag cleared"
        };
        self.apply(customer_id, patch, AuditAction::for_flagged(flagged), details.to_string())
    }

    pub fn set_kyc_status(&mut self, customer_id: &str, status: KycStatus) -> DeskResult<AuditLogEntry> {
        let patch = Override {
            kyc_status: Some(status),
            ..Override::default()
        };
        self.apply(
            customer_id,
            patch,
            AuditAction::for_kyc(status),
            format!("KYC status set to {status}"),
        )
    }

    pub fn set_loan_status(&mut self, customer_id: &str, decision: LoanDecision) -> DeskResult<AuditLogEntry> {
        let patch = Override {
            loan_status: Some(decision),
            ..Override::default()
        };
        self.apply(
            customer_id,
            patch,
            AuditAction::for_loan(decision),
            format!("Loan application {}", decision.as_str().to_lowercase()),
        )
    }

    pub fn set_card_blocked(&mut self, customer_id: &str, blocked: bool) -> DeskResult<AuditLogEntry> {
        let patch = Override {
            card_blocked: Some(blocked),
            ..Override::default()
        };
        let details = if blocked { "Card blocked" } else { "Card unblocked" };
        self.apply(customer_id, patch, AuditAction::for_card_blocked(blocked), details.to_string())
    }

    /// Attach a free-text remark. Not a state change, so nothing is audited.
    pub fn set_remark(&mut self, customer_id: &str, remark: &str) -> DeskResult<Override> {
        let customer_id = check_customer_id(customer_id)?;
        let patch = Override {
            remark: Some(remark.trim().to_string()),
            ..Override::default()
        };
        let current = self.overrides.upsert(customer_id, &patch)?;
        self.publish(DeskEvent::OverrideChanged {
            customer_id: customer_id.to_string(),
            current: current.clone(),
        });
        Ok(current)
    }

    fn apply(
        &mut self,
        customer_id: &str,
        patch: Override,
        action: AuditAction,
        details: String,
    ) -> DeskResult<AuditLogEntry> {
        let customer_id = check_customer_id(customer_id)?;
        let previous = self.overrides.get(customer_id)?;
        let current = self.overrides.upsert(customer_id, &patch)?;
        let entry = AuditLogEntry::new(customer_id, action, details, &self.actor);
        // A state change without its audit entry must not survive.
        if let Err(e) = self.audit.append(&entry) {
            log::warn!("admin: audit append failed for {customer_id}, reverting override: {e}");
            self.overrides.restore(customer_id, previous.as_ref())?;
            return Err(e);
        }
        log::info!("admin: {} {action} {customer_id}", self.actor);

        self.publish(DeskEvent::OverrideChanged {
            customer_id: customer_id.to_string(),
            current,
        });
        self.publish(DeskEvent::AuditRecorded {
            entry: entry.clone(),
        });
        Ok(entry)
    }

    fn publish(&mut self, event: DeskEvent) {
        if let Some(bus) = self.bus.as_mut() {
            bus.publish(event);
        }
    }
}

/// Ids are matched against normalized records, which carry trimmed ids.
fn check_customer_id(customer_id: &str) -> DeskResult<&str> {
    let trimmed = customer_id.trim();
    if trimmed.is_empty() {
        return Err(DeskError::UnknownCustomer {
            customer_id: customer_id.to_string(),
        });
    }
    Ok(trimmed)
}
