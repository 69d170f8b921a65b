//! Text formatting for amounts and table cells.

use rust_decimal::Decimal;

/// Dollars with thousand separators, rounded to cents, e.g.
/// `"$1,234,567.89"` or `"-$42.50"`. Amounts that round to zero print
/// without a sign.
pub fn format_amount(amount: Decimal) -> String {
    let cents = amount.abs().round_dp(2);
    let sign = if amount.is_sign_negative() && !cents.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{cents:.2}");
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}${grouped}.{fraction}")
}

/// Describe a budget difference (`actual - budget`) for people:
/// `"Over by $12.00"`, `"Under by $3.50"` or `"On budget"`.
pub fn describe_difference(difference: Decimal) -> String {
    let magnitude = format_amount(difference.abs());
    if difference.round_dp(2).is_zero() {
        "On budget".to_string()
    } else if difference.is_sign_positive() {
        format!("Over by {magnitude}")
    } else {
        format!("Under by {magnitude}")
    }
}

/// Shorten `text` to at most `width` characters, marking a cut with a
/// trailing "…" that counts toward the width.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().nth(width).is_none() {
        return text.to_string();
    }
    let Some(keep) = width.checked_sub(1) else {
        return String::new();
    };
    let cut = text
        .char_indices()
        .nth(keep)
        .map_or(text.len(), |(at, _)| at);
    format!("{}…", &text[..cut])
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
