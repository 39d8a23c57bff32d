//! Order reconciliation rules: totals, numbering, opaque identifiers.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Flat tax applied to every order.
pub const TAX_RATE_PERCENT: i64 = 2;

/// Length of the post-checkout access token (matches a 32-byte URL-safe
/// token).
const SECURE_TOKEN_LEN: usize = 43;
const TRACKING_ID_LEN: usize = 10;

const URL_SAFE_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const TRACKING_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    New,
    Accepted,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Accepted => "Accepted",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "New" => Some(Self::New),
            "Accepted" => Some(Self::Accepted),
            "Completed" => Some(Self::Completed),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Completed and cancelled orders accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total: i64,
    pub tax: i64,
    pub grand_total: i64,
}

/// Sum the cart lines and apply the flat tax.
pub fn order_totals(lines: &[(i64, i32)]) -> Totals {
    let total: i64 = lines
        .iter()
        .map(|(unit_price, quantity)| unit_price * i64::from(*quantity))
        .sum();
    let tax = total * TAX_RATE_PERCENT / 100;
    Totals {
        total,
        tax,
        grand_total: total + tax,
    }
}

/// Date-based order number: `YYYYMMDD` followed by the order's row
/// sequence.
pub fn order_number(date: NaiveDate, seq: i64) -> String {
    format!("{}{}", date.format("%Y%m%d"), seq)
}

/// Unguessable token granting post-checkout confirmation access.
pub fn generate_secure_token() -> String {
    random_string(URL_SAFE_CHARS, SECURE_TOKEN_LEN)
}

/// Short customer-facing code for order-status lookup.
pub fn generate_tracking_id() -> String {
    random_string(TRACKING_CHARS, TRACKING_ID_LEN)
}

fn random_string(charset: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// Customer display name.
pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}")
}

/// Single-line delivery address.
pub fn full_address(line_1: &str, line_2: &str) -> String {
    if line_2.is_empty() {
        line_1.to_string()
    } else {
        format!("{line_1} {line_2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_apply_flat_two_percent_tax() {
        let totals = order_totals(&[(100, 2), (50, 1)]);
        assert_eq!(totals.total, 250);
        assert_eq!(totals.tax, 5);
        assert_eq!(totals.grand_total, 255);
    }

    #[test]
    fn totals_of_empty_cart_are_zero() {
        assert_eq!(
            order_totals(&[]),
            Totals {
                total: 0,
                tax: 0,
                grand_total: 0
            }
        );
    }

    #[test]
    fn order_number_is_date_then_sequence() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(order_number(date, 17), "2025030917");
    }

    #[test]
    fn tracking_id_is_ten_uppercase_alphanumerics() {
        let id = generate_tracking_id();
        assert_eq!(id.len(), 10);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn secure_token_is_url_safe() {
        let token = generate_secure_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn generated_identifiers_are_distinct() {
        // Different alphabets and lengths; a collision would be a bug,
        // not bad luck.
        assert_ne!(generate_secure_token(), generate_secure_token());
        assert_ne!(generate_tracking_id(), generate_tracking_id());
        assert_ne!(generate_secure_token(), generate_tracking_id());
    }

    #[test]
    fn status_round_trips_and_terminality() {
        for status in [
            OrderStatus::New,
            OrderStatus::Accepted,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("Shipped"), None);
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
    }

    #[test]
    fn name_and_address_formatting() {
        assert_eq!(full_name("Asha", "Rao"), "Asha Rao");
        assert_eq!(full_address("12 MG Road", "Flat 4"), "12 MG Road Flat 4");
        assert_eq!(full_address("12 MG Road", ""), "12 MG Road");
    }
}
