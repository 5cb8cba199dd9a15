//! Synthetic dataset generator.
//!
//! Produces a JSON payload in exactly the shape the ingestion adapter
//! reads: one flat object per account event, several per customer,
//! with the source's string encodings ("True"/"False", "N/A") intact.
//! Deterministic for a given seed.

use crate::{
    name_generator::NameGenerator,
    rng::{DeskRng, Stream},
};
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

const MAX_ROWS_PER_CUSTOMER: i64 = 4;
const LOAN_TYPES: &[&str] = &["Personal", "Home", "Auto", "Education"];
const CARD_TYPES: &[&str] = &["Visa", "MasterCard", "RuPay", "AMEX"];
const TXN_TYPES: &[&str] = &["Deposit", "Withdrawal", "Transfer"];
const TXN_REASONS: &[&str] = &[
    "Salary credit", "ATM withdrawal", "Utility bill", "Online shopping",
    "Rent payment", "Fund transfer", "Grocery purchase", "EMI payment",
];

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Generate rows for `customers` customers as a JSON array.
pub fn generate_payload(seed: u64, customers: usize) -> Value {
    let mut profile_rng = DeskRng::new(seed, Stream::Profile);
    let mut txn_rng = DeskRng::new(seed, Stream::Transaction);
    let mut loan_rng = DeskRng::new(seed, Stream::Loan);
    let mut card_rng = DeskRng::new(seed, Stream::Card);

    let mut rows = Vec::new();
    for i in 0..customers {
        let customer_id = format!("C{}", 1000 + i);
        let (first, last) = NameGenerator::generate_name(&mut profile_rng);
        let email = NameGenerator::generate_email(&mut profile_rng, first, last);
        let city = NameGenerator::generate_city(&mut profile_rng);
        let phone = NameGenerator::generate_phone(&mut profile_rng);
        let age = profile_rng.range_i64(21, 75);
        let gender = if profile_rng.chance(0.5) { "Male" } else { "Female" };
        let account_type = if profile_rng.chance(0.7) { "Savings" } else { "Current" };
        let opened = base_date() - Duration::days(profile_rng.range_i64(30, 3_000));
        let risk = *profile_rng.pick(&["Low", "Low", "Medium", "High"]);
        let cibil = profile_rng.range_i64(550, 900);
        let delay = if profile_rng.chance(0.15) {
            profile_rng.range_i64(61, 120)
        } else {
            profile_rng.range_i64(0, 45)
        };
        let frozen = profile_rng.chance(0.08);
        let active = if profile_rng.chance(0.9) { "Active" } else { "Inactive" };

        let has_loan = loan_rng.chance(0.5);
        let loan_id = format!("L{}", 5000 + i);
        let loan_amount = (loan_rng.range_f64(50_000.0, 2_000_000.0) / 1_000.0).round() * 1_000.0;
        let loan_type = *loan_rng.pick(LOAN_TYPES);
        let loan_rate = (loan_rng.range_f64(7.0, 16.0) * 100.0).round() / 100.0;
        let loan_term = *loan_rng.pick(&[12i64, 24, 36, 60, 120, 240]);
        let loan_status = if loan_rng.chance(0.6) { "Approved" } else { "Rejected" };

        let has_card = card_rng.chance(0.7);
        let card_id = format!("CC{}", 9000 + i);
        let card_type = *card_rng.pick(CARD_TYPES);
        let credit_limit = (card_rng.range_f64(20_000.0, 300_000.0) / 1_000.0).round() * 1_000.0;
        let reward_points = card_rng.range_i64(0, 5_000);

        let row_count = txn_rng.range_i64(1, MAX_ROWS_PER_CUSTOMER);
        let mut balance = (txn_rng.range_f64(1_000.0, 500_000.0) * 100.0).round() / 100.0;
        let mut day = base_date() + Duration::days(txn_rng.range_i64(0, 60));

        for _ in 0..row_count {
            let txn_type = *txn_rng.pick(TXN_TYPES);
            // Roughly one row in eight is a snapshot row with no movement.
            let amount = if txn_rng.chance(0.125) {
                0.0
            } else {
                (txn_rng.range_f64(100.0, 50_000.0) * 100.0).round() / 100.0
            };
            let opening = balance;
            if txn_type == "Deposit" {
                balance += amount;
            } else {
                balance = (balance - amount).max(0.0);
            }
            balance = (balance * 100.0).round() / 100.0;
            day += Duration::days(txn_rng.range_i64(1, 30));

            let card_balance = if has_card {
                (card_rng.range_f64(0.0, credit_limit) * 100.0).round() / 100.0
            } else {
                0.0
            };

            rows.push(json!({
                "Customer ID": customer_id,
                "First Name": first,
                "Last Name": last,
                "Age": age,
                "Gender": gender,
                "Address": format!("{} MG Road", profile_rng.range_i64(1, 400)),
                "City": city,
                "Contact Number": phone,
                "Email": email,
                "Account Type": account_type,
                "Date Of Account Opening": fmt_date(opened),
                "Account Balance": format!("{opening:.2}"),
                "RiskLevel": risk,
                "ActiveStatus": active,
                "FreezeAccount": if frozen { "True" } else { "False" },
                "CIBIL_Score": cibil,
                "Payment Delay Days": delay.to_string(),
                "Transaction Date": fmt_date(day),
                "Transaction Type": txn_type,
                "Transaction Amount": amount,
                "Account Balance After Transaction": balance,
                "Transaction Reason": *txn_rng.pick(TXN_REASONS),
                "Loan ID": if has_loan { loan_id.as_str() } else { "N/A" },
                "Loan Amount": if has_loan { json!(loan_amount) } else { json!("N/A") },
                "Loan Type": if has_loan { loan_type } else { "N/A" },
                "Interest Rate": if has_loan { json!(loan_rate) } else { json!("N/A") },
                "Loan Term": if has_loan { json!(loan_term) } else { json!("N/A") },
                "Loan Status": if has_loan { loan_status } else { "N/A" },
                "Approval/Rejection Date": if has_loan { fmt_date(opened + Duration::days(10)) } else { "N/A".to_string() },
                "CardID": if has_card { card_id.as_str() } else { "N/A" },
                "Card Type": if has_card { card_type } else { "N/A" },
                "Credit Limit": if has_card { credit_limit } else { 0.0 },
                "Credit Card Balance": card_balance,
                "Minimum Payment Due": (card_balance * 0.05 * 100.0).round() / 100.0,
                "Payment Due Date": fmt_date(day + Duration::days(20)),
                "Credit Utilization": if has_card && credit_limit > 0.0 {
                    json!(((card_balance / credit_limit) * 10_000.0).round() / 10_000.0)
                } else {
                    json!("N/A")
                },
                "Rewards Points": reward_points,
            }));
        }
    }
    Value::Array(rows)
}
