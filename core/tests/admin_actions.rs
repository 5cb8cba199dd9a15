//! Admin action tests: override writes, audit trail and notifications.
//!
//! Verifies that:
//!   - Every state change writes exactly one audit entry
//!   - Remarks update the override but are never audited
//!   - The SQLite store combines patches field-wise like the memory store
//!   - Audit entries survive in the database in insertion order
//!   - A change whose audit entry cannot be written is reverted

use bankdesk_core::{
    admin::AdminDesk,
    audit::{AuditAction, AuditLogEntry, AuditSink, MemoryAuditLog},
    error::{DeskError, DeskResult},
    event::{DeskEvent, NotificationBus, Topic},
    overrides::{
        KycStatus, LoanDecision, MemoryOverrides, Override, OverrideSnapshot, OverrideStore,
    },
    store::DeskStore,
};

/// Sink whose backing log is unreachable.
struct UnreachableSink;

impl AuditSink for UnreachableSink {
    fn append(&mut self, _entry: &AuditLogEntry) -> DeskResult<()> {
        Err(DeskError::Other(anyhow::anyhow!("audit log unreachable")))
    }
}

fn memory_desk() -> AdminDesk<MemoryOverrides, MemoryAuditLog> {
    AdminDesk::new("auditor", MemoryOverrides::new(), MemoryAuditLog::new())
}

/// Two connections onto one private in-memory database.
fn shared_stores() -> (DeskStore, DeskStore) {
    let uri = format!(
        "file:admin_{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4().simple()
    );
    let overrides = DeskStore::open(&uri).unwrap();
    overrides.migrate().unwrap();
    let audit = overrides.reopen().unwrap();
    (overrides, audit)
}

#[test]
fn each_state_change_is_audited_once() {
    let mut desk = memory_desk();
    desk.set_frozen("C1", true).unwrap();
    desk.set_flagged("C1", true).unwrap();
    desk.set_kyc_status("C1", KycStatus::Verified).unwrap();
    desk.set_loan_status("C1", LoanDecision::Rejected).unwrap();
    desk.set_card_blocked("C1", true).unwrap();
    desk.set_frozen("C1", false).unwrap();

    let actions: Vec<_> = desk.audit().entries().iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        [
            AuditAction::Freeze,
            AuditAction::Flag,
            AuditAction::KycVerified,
            AuditAction::LoanRejected,
            AuditAction::CardBlocked,
            AuditAction::Unfreeze,
        ]
    );
    assert!(desk.audit().entries().iter().all(|e| e.actor == "auditor"));

    let current = desk.overrides().get("C1").unwrap().unwrap();
    assert_eq!(current.frozen, Some(false));
    assert_eq!(current.flagged, Some(true));
    assert_eq!(current.kyc_status, Some(KycStatus::Verified));
}

#[test]
fn audit_details_describe_the_change() {
    let mut desk = memory_desk();
    let e = desk.set_frozen("C1", true).unwrap();
    assert_eq!(e.details, "Account frozen");
    let e = desk.set_flagged("C1", false).unwrap();
    assert_eq!(e.details, "Suspicious flag cleared");
    assert_eq!(e.action.as_str(), "UNFLAG");
    let e = desk.set_kyc_status("C1", KycStatus::Rejected).unwrap();
    assert_eq!(e.details, "KYC status set to Rejected");
    let e = desk.set_loan_status("C1", LoanDecision::Approved).unwrap();
    assert_eq!(e.details, "Loan application approved");
    let e = desk.set_card_blocked("C1", false).unwrap();
    assert_eq!(e.details, "Card unblocked");
}

#[test]
fn remarks_are_not_audited() {
    let mut desk = memory_desk();
    let current = desk.set_remark("C1", "  called the branch  ").unwrap();
    assert_eq!(current.remark.as_deref(), Some("called the branch"));
    assert!(desk.audit().entries().is_empty());
    assert_eq!(desk.overrides().len(), 1);
}

#[test]
fn blank_customer_id_is_rejected() {
    let mut desk = memory_desk();
    let err = desk.set_frozen("  ", true).unwrap_err();
    assert!(matches!(err, DeskError::UnknownCustomer { .. }));
    assert!(desk.set_remark("", "x").is_err());
    assert!(desk.audit().entries().is_empty());
    assert!(desk.overrides().is_empty());
}

#[test]
fn bus_receives_override_and_audit_events() {
    let mut bus = NotificationBus::new();
    let overrides_rx = bus.subscribe(Topic::Overrides);
    let audit_rx = bus.subscribe(Topic::Audit);
    let dataset_rx = bus.subscribe(Topic::Dataset);
    let mut desk = memory_desk().with_bus(bus);

    desk.set_flagged("C7", true).unwrap();
    desk.set_remark("C7", "watch").unwrap();

    let changes: Vec<_> = overrides_rx.try_iter().collect();
    assert_eq!(changes.len(), 2);
    match &changes[1] {
        DeskEvent::OverrideChanged { customer_id, current } => {
            assert_eq!(customer_id, "C7");
            assert_eq!(current.flagged, Some(true));
            assert_eq!(current.remark.as_deref(), Some("watch"));
        }
        other => panic!("unexpected event {other:?}"),
    }

    let audits: Vec<_> = audit_rx.try_iter().collect();
    assert_eq!(audits.len(), 1, "remark must not publish an audit event");
    assert!(dataset_rx.try_recv().is_err());
}

#[test]
fn dropped_subscribers_are_pruned() {
    let mut bus = NotificationBus::new();
    let kept = bus.subscribe(Topic::Audit);
    drop(bus.subscribe(Topic::Audit));
    assert_eq!(bus.subscriber_count(Topic::Audit), 2);

    let mut desk = memory_desk().with_bus(bus);
    desk.set_frozen("C1", true).unwrap();

    let bus = desk.bus_mut().unwrap();
    assert_eq!(bus.subscriber_count(Topic::Audit), 1);
    assert_eq!(kept.try_iter().count(), 1);
}

#[test]
fn sqlite_upsert_combines_fields() {
    let mut store = DeskStore::open_migrated(":memory:").unwrap();
    store
        .upsert(
            "C1",
            &Override {
                frozen: Some(true),
                kyc_status: Some(KycStatus::Pending),
                ..Override::default()
            },
        )
        .unwrap();
    let current = store
        .upsert(
            "C1",
            &Override {
                kyc_status: Some(KycStatus::Verified),
                remark: Some("ok".into()),
                ..Override::default()
            },
        )
        .unwrap();

    assert_eq!(current.frozen, Some(true));
    assert_eq!(current.kyc_status, Some(KycStatus::Verified));
    assert_eq!(current.remark.as_deref(), Some("ok"));
    assert_eq!(current.flagged, None);
    assert_eq!(store.override_count().unwrap(), 1);

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot["C1"], current);

    store.clear_override("C1").unwrap();
    assert!(store.get("C1").unwrap().is_none());
}

#[test]
fn desk_persists_to_sqlite() {
    let (overrides, audit) = shared_stores();
    let mut desk = AdminDesk::new("ops", overrides, audit);

    desk.set_frozen("C1001", true).unwrap();
    desk.set_loan_status("C1001", LoanDecision::Approved).unwrap();
    desk.set_remark("C1001", "verified over phone").unwrap();
    desk.set_card_blocked("C1002", true).unwrap();

    assert_eq!(desk.audit().audit_count().unwrap(), 3);

    let history = desk.audit().audit_for_customer("C1001").unwrap();
    let actions: Vec<_> = history.iter().map(|e| e.action).collect();
    assert_eq!(actions, [AuditAction::Freeze, AuditAction::LoanApproved]);
    assert!(history.iter().all(|e| e.actor == "ops"));

    let recent = desk.audit().recent_audit(1).unwrap();
    assert_eq!(recent[0].action, AuditAction::CardBlocked);
    assert_eq!(recent[0].customer_id, "C1002");

    // Both connections see the same override rows.
    let seen_by_audit_conn = desk.audit().get("C1001").unwrap().unwrap();
    assert_eq!(seen_by_audit_conn.remark.as_deref(), Some("verified over phone"));
    assert_eq!(seen_by_audit_conn.frozen, Some(true));
}

#[test]
fn audit_round_trips_through_sqlite() {
    let (_overrides, mut audit) = shared_stores();
    let entry = bankdesk_core::audit::AuditLogEntry::new(
        "C9",
        AuditAction::KycRejected,
        "KYC status set to Rejected",
        "admin",
    );
    bankdesk_core::audit::AuditSink::append(&mut audit, &entry).unwrap();

    let stored = audit.audit_for_customer("C9").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, entry.id);
    assert_eq!(stored[0].action, entry.action);
    assert_eq!(stored[0].details, entry.details);
    assert_eq!(
        stored[0].timestamp.timestamp_micros(),
        entry.timestamp.timestamp_micros()
    );
}

#[test]
fn failed_audit_reverts_the_override() {
    let mut desk = AdminDesk::new("ops", MemoryOverrides::new(), UnreachableSink);
    assert!(desk.set_frozen("C1", true).is_err());
    assert!(desk.overrides().get("C1").unwrap().is_none());
    assert!(desk.overrides().is_empty());
}

#[test]
fn failed_audit_restores_the_previous_override() {
    let mut seeded = OverrideSnapshot::new();
    seeded.insert(
        "C1".into(),
        Override {
            frozen: Some(false),
            remark: Some("kept".into()),
            ..Override::default()
        },
    );
    let before = seeded["C1"].clone();
    let mut desk = AdminDesk::new("ops", MemoryOverrides::from_snapshot(seeded), UnreachableSink);

    assert!(desk.set_frozen("C1", true).is_err());
    assert!(desk.set_kyc_status("C1", KycStatus::Rejected).is_err());
    assert_eq!(desk.overrides().get("C1").unwrap(), Some(before));
}

#[test]
fn sqlite_restore_replaces_the_whole_row() {
    let mut store = DeskStore::open_migrated(":memory:").unwrap();
    let previous = Override {
        flagged: Some(true),
        ..Override::default()
    };
    store.upsert("C1", &previous).unwrap();
    store
        .upsert(
            "C1",
            &Override {
                frozen: Some(true),
                ..Override::default()
            },
        )
        .unwrap();

    store.restore("C1", Some(&previous)).unwrap();
    assert_eq!(store.get("C1").unwrap(), Some(previous));

    store.restore("C1", None).unwrap();
    assert!(store.get("C1").unwrap().is_none());
    assert_eq!(store.override_count().unwrap(), 0);
}

#[test]
fn padded_ids_are_stored_trimmed() {
    let mut desk = memory_desk();
    let entry = desk.set_frozen(" C1 ", true).unwrap();
    assert_eq!(entry.customer_id, "C1");
    desk.set_remark("C1\t", "padded").unwrap();

    let snapshot = desk.overrides().snapshot().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot["C1"].frozen, Some(true));
    assert_eq!(snapshot["C1"].remark.as_deref(), Some("padded"));
}
