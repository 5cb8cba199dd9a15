//! Typed raw rows and the coercion step that produces them.
//!
//! RULE: string sentinels ("N/A", "True", "") never leave this module.
//! Every field is converted to a typed value here; fields that fail to
//! coerce default to zero/absent and are named in `coercion_failures`.

use crate::{config::IngestionConfig, types::RowIndex};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ── Enumerations asserted by the source ────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AccountType {
    #[default]
    Savings,
    Current,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "Savings",
            Self::Current => "Current",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "savings" | "saving" => Some(Self::Savings),
            "current" | "checking" => Some(Self::Current),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
}

impl ActiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

// ── Source shape ───────────────────────────────────────────────────

/// One JSON object exactly as the source delivers it.
/// Values stay untyped until `RawRow::from_source` coerces them.
#[derive(Debug, Clone, Default)]
pub struct SourceRow {
    pub customer_id: Option<Value>,
    pub first_name: Option<Value>,
    pub last_name: Option<Value>,
    pub age: Option<Value>,
    pub gender: Option<Value>,
    pub address: Option<Value>,
    pub city: Option<Value>,
    pub contact_number: Option<Value>,
    pub email: Option<Value>,
    pub account_type: Option<Value>,
    pub account_opened: Option<Value>,
    pub account_balance: Option<Value>,
    pub risk_level: Option<Value>,
    pub active_status: Option<Value>,
    pub freeze_account: Option<Value>,
    pub cibil_score: Option<Value>,
    pub payment_delay_days: Option<Value>,
    pub transaction_date: Option<Value>,
    pub transaction_type: Option<Value>,
    pub transaction_amount: Option<Value>,
    pub balance_after: Option<Value>,
    pub transaction_reason: Option<Value>,
    pub loan_id: Option<Value>,
    pub loan_amount: Option<Value>,
    pub loan_type: Option<Value>,
    pub interest_rate: Option<Value>,
    pub loan_term: Option<Value>,
    pub loan_status: Option<Value>,
    pub loan_date: Option<Value>,
    pub card_id: Option<Value>,
    pub card_type: Option<Value>,
    pub credit_limit: Option<Value>,
    pub credit_card_balance: Option<Value>,
    pub minimum_payment_due: Option<Value>,
    pub payment_due_date: Option<Value>,
    pub credit_utilization: Option<Value>,
    pub reward_points: Option<Value>,
}

impl SourceRow {
    /// Pick each field out of a row object. When both spellings of a key
    /// are present the canonical one wins.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            customer_id: pick(obj, &["Customer ID"]),
            first_name: pick(obj, &["First Name"]),
            last_name: pick(obj, &["Last Name"]),
            age: pick(obj, &["Age"]),
            gender: pick(obj, &["Gender"]),
            address: pick(obj, &["Address"]),
            city: pick(obj, &["City"]),
            contact_number: pick(obj, &["Contact Number"]),
            email: pick(obj, &["Email"]),
            account_type: pick(obj, &["Account Type"]),
            account_opened: pick(obj, &["Date Of Account Opening"]),
            account_balance: pick(obj, &["Account Balance"]),
            risk_level: pick(obj, &["RiskLevel", "Risk Level"]),
            active_status: pick(obj, &["ActiveStatus", "Active Status"]),
            freeze_account: pick(obj, &["FreezeAccount", "Freeze Account"]),
            cibil_score: pick(obj, &["CIBIL_Score", "CIBIL Score"]),
            payment_delay_days: pick(obj, &["Payment Delay Days"]),
            transaction_date: pick(obj, &["Transaction Date"]),
            transaction_type: pick(obj, &["Transaction Type"]),
            transaction_amount: pick(obj, &["Transaction Amount"]),
            balance_after: pick(obj, &["Account Balance After Transaction"]),
            transaction_reason: pick(obj, &["Transaction Reason"]),
            loan_id: pick(obj, &["Loan ID"]),
            loan_amount: pick(obj, &["Loan Amount"]),
            loan_type: pick(obj, &["Loan Type"]),
            interest_rate: pick(obj, &["Interest Rate"]),
            loan_term: pick(obj, &["Loan Term"]),
            loan_status: pick(obj, &["Loan Status"]),
            loan_date: pick(obj, &["Approval/Rejection Date"]),
            card_id: pick(obj, &["CardID", "Card ID"]),
            card_type: pick(obj, &["Card Type"]),
            credit_limit: pick(obj, &["Credit Limit"]),
            credit_card_balance: pick(obj, &["Credit Card Balance"]),
            minimum_payment_due: pick(obj, &["Minimum Payment Due"]),
            payment_due_date: pick(obj, &["Payment Due Date"]),
            credit_utilization: pick(obj, &["Credit Utilization"]),
            reward_points: pick(obj, &["Rewards Points", "Reward Points"]),
        }
    }
}

fn pick(obj: &Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|k| obj.get(*k)).cloned()
}

// ── Typed row ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct RawRow {
    pub row_index: RowIndex,
    pub customer_id: Option<String>,

    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub gender: String,
    pub address: String,
    pub city: String,
    pub contact_number: String,
    pub email: String,
    pub account_type: AccountType,
    pub account_opened: Option<NaiveDate>,
    pub account_balance: f64,
    pub risk_level: RiskLevel,
    pub active_status: ActiveStatus,
    pub freeze_account: bool,
    pub cibil_score: i64,
    pub payment_delay_days: i64,

    pub transaction_date: Option<NaiveDate>,
    pub transaction_type: Option<String>,
    pub transaction_amount: f64,
    pub balance_after: f64,
    pub transaction_reason: Option<String>,

    pub loan_id: Option<String>,
    pub loan_amount: f64,
    pub loan_type: Option<String>,
    pub interest_rate: f64,
    pub loan_term_months: i64,
    pub loan_status: Option<String>,
    pub loan_date: Option<NaiveDate>,

    pub card_id: Option<String>,
    pub card_type: Option<String>,
    pub credit_limit: f64,
    pub credit_card_balance: f64,
    pub minimum_payment_due: f64,
    pub payment_due_date: Option<NaiveDate>,
    /// Fraction in [0, 1] as asserted by the source; `None` when absent.
    pub credit_utilization: Option<f64>,
    pub reward_points: i64,

    /// Source keys whose values could not be coerced.
    pub coercion_failures: Vec<&'static str>,
}

impl RawRow {
    pub fn from_source(row_index: RowIndex, src: &SourceRow, config: &IngestionConfig) -> Self {
        let mut c = Coercer::new(&config.sentinel);

        let account_type = c.parse_enum("Account Type", &src.account_type, AccountType::parse);
        let risk_level = c.parse_enum("RiskLevel", &src.risk_level, RiskLevel::parse);
        let active_status = c.parse_enum("ActiveStatus", &src.active_status, ActiveStatus::parse);

        let mut row = RawRow {
            row_index,
            customer_id: c.text(&src.customer_id),
            first_name: c.text(&src.first_name).unwrap_or_default(),
            last_name: c.text(&src.last_name).unwrap_or_default(),
            age: c.integer("Age", &src.age),
            gender: c.text(&src.gender).unwrap_or_default(),
            address: c.text(&src.address).unwrap_or_default(),
            city: c.text(&src.city).unwrap_or_default(),
            contact_number: c.text(&src.contact_number).unwrap_or_default(),
            email: c.text(&src.email).unwrap_or_default(),
            account_type,
            account_opened: c.date("Date Of Account Opening", &src.account_opened),
            account_balance: c.number("Account Balance", &src.account_balance),
            risk_level,
            active_status,
            freeze_account: c.boolean("FreezeAccount", &src.freeze_account),
            cibil_score: c.integer("CIBIL_Score", &src.cibil_score),
            payment_delay_days: c.integer("Payment Delay Days", &src.payment_delay_days),

            transaction_date: c.date("Transaction Date", &src.transaction_date),
            transaction_type: c.text(&src.transaction_type),
            transaction_amount: c.number("Transaction Amount", &src.transaction_amount),
            balance_after: c.number("Account Balance After Transaction", &src.balance_after),
            transaction_reason: c.text(&src.transaction_reason),

            loan_id: c.text(&src.loan_id),
            loan_amount: c.number("Loan Amount", &src.loan_amount),
            loan_type: c.text(&src.loan_type),
            interest_rate: c.number("Interest Rate", &src.interest_rate),
            loan_term_months: c.integer("Loan Term", &src.loan_term),
            loan_status: c.text(&src.loan_status),
            loan_date: c.date("Approval/Rejection Date", &src.loan_date),

            card_id: c.text(&src.card_id),
            card_type: c.text(&src.card_type),
            credit_limit: c.number("Credit Limit", &src.credit_limit),
            credit_card_balance: c.number("Credit Card Balance", &src.credit_card_balance),
            minimum_payment_due: c.number("Minimum Payment Due", &src.minimum_payment_due),
            payment_due_date: c.date("Payment Due Date", &src.payment_due_date),
            credit_utilization: c.optional_number("Credit Utilization", &src.credit_utilization),
            reward_points: c.integer("Rewards Points", &src.reward_points),

            coercion_failures: Vec::new(),
        };
        row.coercion_failures = c.failures;
        row
    }

    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }
}

// ── Coercion ───────────────────────────────────────────────────────

/// 2^63: the first float magnitude outside the `i64` range.
const INTEGER_LIMIT: f64 = 9_223_372_036_854_775_808.0;

struct Coercer<'a> {
    sentinel: &'a str,
    failures: Vec<&'static str>,
}

impl<'a> Coercer<'a> {
    fn new(sentinel: &'a str) -> Self {
        Self {
            sentinel,
            failures: Vec::new(),
        }
    }

    /// Trimmed text, or `None` for null, blank and sentinel values.
    fn text(&self, value: &Option<Value>) -> Option<String> {
        let s = match value {
            None | Some(Value::Null) => return None,
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => other.to_string(),
        };
        if s.is_empty() || s.eq_ignore_ascii_case(self.sentinel) {
            None
        } else {
            Some(s)
        }
    }

    fn optional_number(&mut self, field: &'static str, value: &Option<Value>) -> Option<f64> {
        if let Some(Value::Number(n)) = value {
            return match n.as_f64() {
                Some(v) if v.is_finite() => Some(v),
                _ => {
                    self.failures.push(field);
                    None
                }
            };
        }
        let text = self.text(value)?;
        let cleaned: String = text
            .chars()
            .filter(|ch| !matches!(ch, ',' | '₹' | '$' | ' '))
            .collect();
        match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                self.failures.push(field);
                None
            }
        }
    }

    fn number(&mut self, field: &'static str, value: &Option<Value>) -> f64 {
        self.optional_number(field, value).unwrap_or(0.0)
    }

    /// Values that do not fit an `i64` are failures, never clamped.
    fn integer(&mut self, field: &'static str, value: &Option<Value>) -> i64 {
        let Some(v) = self.optional_number(field, value) else {
            return 0;
        };
        let rounded = v.round();
        if rounded >= -INTEGER_LIMIT && rounded < INTEGER_LIMIT {
            rounded as i64
        } else {
            self.failures.push(field);
            0
        }
    }

    fn boolean(&mut self, field: &'static str, value: &Option<Value>) -> bool {
        if let Some(Value::Bool(b)) = value {
            return *b;
        }
        let Some(text) = self.text(value) else {
            return false;
        };
        match text.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => true,
            "false" | "no" | "n" | "0" => false,
            _ => {
                self.failures.push(field);
                false
            }
        }
    }

    fn date(&mut self, field: &'static str, value: &Option<Value>) -> Option<NaiveDate> {
        let text = self.text(value)?;
        match parse_date(&text) {
            Some(d) => Some(d),
            None => {
                self.failures.push(field);
                None
            }
        }
    }

    fn parse_enum<T: Default>(
        &mut self,
        field: &'static str,
        value: &Option<Value>,
        parse: fn(&str) -> Option<T>,
    ) -> T {
        let Some(text) = self.text(value) else {
            return T::default();
        };
        match parse(&text) {
            Some(v) => v,
            None => {
                self.failures.push(field);
                T::default()
            }
        }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse the date layouts seen in banking exports.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive())
}
