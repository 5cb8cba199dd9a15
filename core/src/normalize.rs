//! Normalizer: groups raw rows by customer and derives one canonical
//! CustomerRecord per customer.
//!
//! RULES:
//!   - Exactly one record per distinct customer identifier, in first-seen order.
//!   - Within a group, the first row supplies profile fields and the last
//!     row supplies current state. "Last" follows the configured RowOrdering.
//!   - is_high_risk is evaluated once, here, and never recomputed downstream.
//!   - Pure function of its input: same rows in, same records out.

use crate::{
    config::{DeskConfig, RiskRules, RowOrdering},
    finance::{classify_utilization_with, UtilizationReport},
    raw::{AccountType, ActiveStatus, RawRow, RiskLevel},
    types::{CustomerId, RowIndex},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Deposits and inbound transfers credit the account; everything else debits it.
    pub fn from_source_text(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        if lower.contains("deposit") || lower.contains("credit") || lower.contains("transfer in") {
            Self::Credit
        } else {
            Self::Debit
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub kind: TransactionKind,
    pub amount: f64,
    pub balance_after: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanState {
    Approved,
    Pending,
}

impl LoanState {
    fn from_source_text(text: Option<&str>) -> Self {
        match text {
            Some(s) if s.eq_ignore_ascii_case("approved") => Self::Approved,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub amount: f64,
    pub loan_type: String,
    pub interest_rate: f64,
    pub term_months: i64,
    pub status: LoanState,
    pub created: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub card_id: Option<String>,
    pub card_type: Option<String>,
    pub credit_limit: f64,
    pub balance: f64,
    pub minimum_due: f64,
    pub due_date: Option<NaiveDate>,
    /// Fraction of the limit in use, in [0, 1] for well-formed sources.
    pub utilization: f64,
    pub reward_points: i64,
    pub classification: UtilizationReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub full_name: String,
    pub age: i64,
    pub gender: String,
    pub address: String,
    pub city: String,
    pub contact_number: String,
    pub email: String,
    pub account_type: AccountType,
    pub account_opened: Option<NaiveDate>,
    pub balance: f64,
    pub risk_level: RiskLevel,
    pub active_status: ActiveStatus,
    pub frozen: bool,
    pub cibil_score: i64,
    pub payment_delay_days: i64,
    pub is_high_risk: bool,
    /// Newest first.
    pub transactions: Vec<Transaction>,
    pub loans: Vec<Loan>,
    pub card: CardSummary,
    /// Row indexes of the rows this record was derived from.
    pub source_rows: Vec<RowIndex>,
}

/// The high-risk predicate. Boundaries are strict: a delay of exactly the
/// threshold, or a score equal to the minimum, is not high-risk.
pub fn is_high_risk(risk_level: RiskLevel, payment_delay_days: i64, cibil_score: i64, rules: &RiskRules) -> bool {
    risk_level == RiskLevel::High
        || payment_delay_days > rules.high_risk_delay_days
        || cibil_score < rules.min_cibil_score
}

pub struct Normalizer {
    config: DeskConfig,
}

impl Normalizer {
    pub fn new(config: DeskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn normalize(&self, rows: &[RawRow]) -> Vec<CustomerRecord> {
        let groups = group_by_customer(rows);
        groups
            .into_iter()
            .map(|(customer_id, mut group)| {
                if self.config.ingestion.ordering == RowOrdering::TransactionDate {
                    group.sort_by_key(|r| r.transaction_date);
                }
                self.derive_record(customer_id, &group)
            })
            .collect()
    }

    fn derive_record(&self, customer_id: CustomerId, group: &[&RawRow]) -> CustomerRecord {
        // group is never empty: grouping only creates entries on insert.
        let first = group[0];
        let last = group[group.len() - 1];
        let rules = &self.config.risk;

        let high_risk = is_high_risk(last.risk_level, last.payment_delay_days, last.cibil_score, rules);
        let risk_level = if high_risk && rules.escalate_risk_level {
            RiskLevel::High
        } else {
            last.risk_level
        };

        CustomerRecord {
            full_name: first.full_name(),
            age: first.age,
            gender: first.gender.clone(),
            address: first.address.clone(),
            city: first.city.clone(),
            contact_number: first.contact_number.clone(),
            email: first.email.clone(),
            account_type: first.account_type,
            account_opened: first.account_opened,
            balance: last.account_balance,
            risk_level,
            active_status: last.active_status,
            frozen: last.freeze_account,
            cibil_score: last.cibil_score,
            payment_delay_days: last.payment_delay_days,
            is_high_risk: high_risk,
            transactions: materialize_transactions(&customer_id, group),
            loans: materialize_loans(group),
            card: self.card_summary(last),
            source_rows: group.iter().map(|r| r.row_index).collect(),
            customer_id,
        }
    }

    fn card_summary(&self, last: &RawRow) -> CardSummary {
        let utilization = match last.credit_utilization {
            Some(u) => u,
            None if last.credit_limit > 0.0 => last.credit_card_balance / last.credit_limit,
            None => 0.0,
        };
        CardSummary {
            card_id: last.card_id.clone(),
            card_type: last.card_type.clone(),
            credit_limit: last.credit_limit,
            balance: last.credit_card_balance,
            minimum_due: last.minimum_payment_due,
            due_date: last.payment_due_date,
            utilization,
            reward_points: last.reward_points,
            classification: classify_utilization_with(
                last.credit_card_balance,
                last.credit_limit,
                &self.config.utilization,
            ),
        }
    }
}

/// Group rows by trimmed customer id, keeping first-seen customer order and
/// source row order within each group. Rows without an id are dropped.
fn group_by_customer(rows: &[RawRow]) -> Vec<(CustomerId, Vec<&RawRow>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(CustomerId, Vec<&RawRow>)> = Vec::new();
    let mut dropped = 0usize;

    for row in rows {
        let id = match row.customer_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => {
                dropped += 1;
                log::warn!("normalize: row {} has no customer id, dropped", row.row_index);
                continue;
            }
        };
        match index.get(id) {
            Some(&slot) => groups[slot].1.push(row),
            None => {
                index.insert(id, groups.len());
                groups.push((id.to_string(), vec![row]));
            }
        }
    }

    if dropped > 0 {
        log::warn!("normalize: dropped {dropped} malformed rows");
    }
    groups
}

fn materialize_transactions(customer_id: &str, group: &[&RawRow]) -> Vec<Transaction> {
    group
        .iter()
        .rev()
        .filter(|r| r.transaction_amount > 0.0)
        .map(|r| {
            let type_text = r.transaction_type.as_deref().unwrap_or_default();
            Transaction {
                id: format!("{customer_id}-TXN-{}", r.row_index),
                date: r.transaction_date,
                kind: TransactionKind::from_source_text(type_text),
                amount: r.transaction_amount,
                balance_after: r.balance_after,
                description: r
                    .transaction_reason
                    .clone()
                    .unwrap_or_else(|| type_text.to_string()),
            }
        })
        .collect()
}

fn materialize_loans(group: &[&RawRow]) -> Vec<Loan> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut loans = Vec::new();
    for row in group {
        let Some(id) = row.loan_id.as_deref() else {
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        loans.push(Loan {
            id: id.to_string(),
            amount: row.loan_amount,
            loan_type: row.loan_type.clone().unwrap_or_default(),
            interest_rate: row.interest_rate,
            term_months: row.loan_term_months,
            status: LoanState::from_source_text(row.loan_status.as_deref()),
            created: row.loan_date.or(row.transaction_date),
        });
    }
    loans
}
