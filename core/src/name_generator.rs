//! Deterministic customer profile text from curated lists.
//!
//! Same RNG seed = same names, cities and email addresses.

use crate::rng::DeskRng;

pub struct NameGenerator;

impl NameGenerator {
    /// First and last name as separate parts.
    pub fn generate_name(rng: &mut DeskRng) -> (&'static str, &'static str) {
        (*rng.pick(Self::first_names()), *rng.pick(Self::last_names()))
    }

    pub fn generate_city(rng: &mut DeskRng) -> &'static str {
        *rng.pick(Self::cities())
    }

    /// Lower-case `first.last<n>@domain` address.
    pub fn generate_email(rng: &mut DeskRng, first: &str, last: &str) -> String {
        let domain = rng.pick(Self::email_domains());
        let suffix = rng.next_u64_below(100);
        format!(
            "{}.{}{}@{}",
            first.to_lowercase(),
            last.to_lowercase(),
            suffix,
            domain
        )
    }

    /// Ten-digit mobile number starting 6-9.
    pub fn generate_phone(rng: &mut DeskRng) -> String {
        let lead = rng.range_i64(6, 9);
        let rest = rng.next_u64_below(1_000_000_000);
        format!("{lead}{rest:09}")
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "Aarav", "Vivaan", "Aditya", "Arjun", "Rohan", "Karan", "Ishaan", "Kabir",
            "Rahul", "Vikram", "Sanjay", "Manish", "Nikhil", "Pranav", "Siddharth", "Yash",
            "Ananya", "Diya", "Priya", "Kavya", "Meera", "Neha", "Pooja", "Riya",
            "Sneha", "Tanvi", "Isha", "Aditi", "Lakshmi", "Divya", "Shreya", "Nandini",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Sharma", "Verma", "Patel", "Iyer", "Reddy", "Nair", "Gupta", "Mehta",
            "Rao", "Das", "Kulkarni", "Joshi", "Chatterjee", "Banerjee", "Singh", "Khan",
            "Menon", "Pillai", "Desai", "Shah", "Agarwal", "Bose", "Kapoor", "Malhotra",
        ]
    }

    fn cities() -> &'static [&'static str] {
        &[
            "Mumbai", "Delhi", "Bengaluru", "Chennai", "Kolkata", "Hyderabad",
            "Pune", "Ahmedabad", "Jaipur", "Lucknow", "Kochi", "Indore",
        ]
    }

    fn email_domains() -> &'static [&'static str] {
        &["example.com", "mail.test", "bank.test"]
    }
}
