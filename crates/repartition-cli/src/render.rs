//! Plain-text breakdown of a distribution for the terminal.

use std::fmt::Write;

use repartition_types::{Amount, DistributionResult};

/// `1234567` → `"1 234 567"`.
pub fn format_amount(amount: Amount) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// Breakdown grouped by display section, followed by the verdict.
pub fn breakdown(result: &DistributionResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{:<32}{:>16}", "Total amount", format_amount(result.total_amount));
    let _ = writeln!(out, "{:<32}{:>16}", "FSP levy", format_amount(result.levy_amount));
    let _ = writeln!(out, "{:<32}{:>16}", "Net amount to distribute", format_amount(result.net_amount));

    for group in result.grouped() {
        if group.items.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", group.title);
        for item in &group.items {
            let _ = writeln!(
                out,
                "  {:<24}{:>8.2} %{:>14}",
                item.name,
                item.percentage,
                format_amount(item.computed_amount)
            );
        }
        let _ = writeln!(out, "  {:<34}{:>14}", "Subtotal", format_amount(group.subtotal));
    }

    let _ = writeln!(out);
    if result.verified {
        let _ = writeln!(out, "Verification: OK");
    } else {
        let _ = writeln!(out, "Verification: NOT VERIFIED");
        for message in &result.messages {
            let _ = writeln!(out, "  ! {message}");
        }
    }
    out
}
