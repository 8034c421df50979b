//! Text formatting shared by the command outputs

use crate::core::Card;

/// Format an amount in won with comma digit grouping
pub fn format_won(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-₩{}", grouped)
    } else {
        format!("₩{}", grouped)
    }
}

/// Pay day as an ordinal ("15th"), or "-" when the data source omitted it
pub fn format_pay_day(card: &Card) -> String {
    match card.pay_day {
        Some(day) => {
            let suffix = match (day % 10, day % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{}{}", day, suffix)
        }
        None => "-".to_string(),
    }
}

pub fn card_label(card: &Card) -> &str {
    if card.name.is_empty() {
        &card.id
    } else {
        &card.name
    }
}
