//! WhatsApp order handoff: message templates and the `wa.me` deep link.
//!
//! Pure string construction. No length limit is enforced; very large
//! carts produce very long URLs, which some WhatsApp clients truncate
//! on their own.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except unreserved characters and `/` is percent-encoded.
const MESSAGE_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// One cart line as it appears in an order message.
#[derive(Clone, Debug)]
pub struct MessageLine {
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    /// (category, value) pairs, e.g. ("color", "Red").
    pub variations: Vec<(String, String)>,
}

impl MessageLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// Chat URL carrying a prefilled message.
pub fn whatsapp_url(owner_number: &str, message: &str) -> String {
    let encoded = utf8_percent_encode(message, MESSAGE_ENCODE);
    format!("https://wa.me/{owner_number}?text={encoded}")
}

/// Message for ordering a single product.
pub fn build_product_message(
    name: &str,
    quantity: i32,
    variations: &[(String, String)],
    unit_price: i64,
    image_url: Option<&str>,
) -> String {
    let total = unit_price * i64::from(quantity);

    let mut variation_block = String::new();
    if !variations.is_empty() {
        variation_block.push('\n');
        for (category, value) in variations {
            variation_block.push_str(&format!("• {}: {}\n", title_case(category), value));
        }
    }

    let message = format!(
        "📦 *Product Order*\n\n*{name}*\n{variation_block}\nQuantity: {quantity}\n\
         Price per item: Rs. {unit_price}\nTotal: Rs. {total}\n\n{}",
        image_url.unwrap_or("")
    );
    message.trim().to_string()
}

/// Message for ordering the whole cart: numbered lines with per-line
/// subtotals, a grand total, and the closing call to action.
pub fn build_cart_message(lines: &[MessageLine], grand_total: i64) -> String {
    let mut message = String::from("Order Summary\n\n");

    for (idx, line) in lines.iter().enumerate() {
        message.push_str(&format!("{}. {}\n", idx + 1, line.name));
        for (category, value) in &line.variations {
            message.push_str(&format!("   - {}: {}\n", title_case(category), value));
        }
        message.push_str(&format!(
            "   Qty: {} x Rs.{} = Rs.{}\n\n",
            line.quantity,
            line.unit_price,
            line.line_total()
        ));
    }

    message.push_str("─────────────────\n");
    message.push_str(&format!("Total: Rs. {grand_total}\n\n"));
    message.push_str("Please confirm this order and let us know your delivery address. Thanks!");

    message.trim().to_string()
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: i32, unit_price: i64, variations: &[(&str, &str)]) -> MessageLine {
        MessageLine {
            name: name.to_string(),
            quantity,
            unit_price,
            variations: variations
                .iter()
                .map(|(c, v)| (c.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn product_message_lists_variations_and_totals() {
        let message = build_product_message(
            "Linen Shirt",
            2,
            &[("color".to_string(), "Blue".to_string())],
            450,
            Some("https://shop.example/media/linen.jpg"),
        );
        assert!(message.starts_with("📦 *Product Order*"));
        assert!(message.contains("*Linen Shirt*"));
        assert!(message.contains("• Color: Blue"));
        assert!(message.contains("Quantity: 2"));
        assert!(message.contains("Price per item: Rs. 450"));
        assert!(message.contains("Total: Rs. 900"));
        assert!(message.ends_with("https://shop.example/media/linen.jpg"));
    }

    #[test]
    fn product_message_without_variations_or_image() {
        let message = build_product_message("Loafers", 1, &[], 1200, None);
        assert!(message.contains("Quantity: 1"));
        assert!(!message.contains('•'));
        assert!(message.ends_with("Total: Rs. 1200"));
    }

    #[test]
    fn cart_message_numbers_lines_and_sums() {
        let lines = vec![
            line("Linen Shirt", 2, 100, &[("color", "Blue")]),
            line("Loafers", 1, 50, &[]),
        ];
        let message = build_cart_message(&lines, 250);
        assert!(message.starts_with("Order Summary"));
        assert!(message.contains("1. Linen Shirt"));
        assert!(message.contains("   - Color: Blue"));
        assert!(message.contains("   Qty: 2 x Rs.100 = Rs.200"));
        assert!(message.contains("2. Loafers"));
        assert!(message.contains("   Qty: 1 x Rs.50 = Rs.50"));
        assert!(message.contains("Total: Rs. 250"));
        assert!(message.ends_with("Thanks!"));
    }

    #[test]
    fn url_percent_encodes_the_message() {
        let url = whatsapp_url("919876543210", "Order Summary\n\n1. Linen Shirt");
        assert!(url.starts_with("https://wa.me/919876543210?text="));
        assert!(url.contains("Order%20Summary%0A%0A1.%20Linen%20Shirt"));
        // Unreserved characters survive as-is.
        assert!(!url.contains("%2E"));
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(title_case("color"), "Color");
        assert_eq!(title_case("shoe size"), "Shoe Size");
    }
}
