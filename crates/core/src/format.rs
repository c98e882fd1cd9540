use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};

const RUPEE: &str = "₹";
const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;

/// Format an amount with Indian digit grouping and 2 decimals,
/// e.g. `₹1,23,456.78`.
pub fn format_currency(amount: f64, show_symbol: bool) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let paise = (amount.abs() * 100.0).round() as u64;
    let formatted = format!("{sign}{}.{:02}", group_indian(paise / 100), paise % 100);
    if show_symbol {
        format!("{RUPEE}{formatted}")
    } else {
        formatted
    }
}

/// Last three digits, then groups of two: 12345678 → 1,23,45,678.
fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    groups.push(rest);
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Currency change with an explicit `+` for non-negative values.
pub fn format_change(change: f64) -> String {
    let sign = if change >= 0.0 { "+" } else { "" };
    format!("{sign}{}", format_currency(change, true))
}

pub fn format_percent_change(percent: f64) -> String {
    let sign = if percent >= 0.0 { "+" } else { "" };
    format!("{sign}{percent:.2}%")
}

/// Crore / lakh abbreviation for large amounts (market cap etc).
pub fn format_large_number(num: f64) -> String {
    if num >= CRORE {
        format!("{RUPEE}{:.2} Cr", num / CRORE)
    } else if num >= LAKH {
        format!("{RUPEE}{:.2} L", num / LAKH)
    } else {
        format_currency(num, true)
    }
}

/// CSS-style class for a signed value.
pub fn change_class(value: f64) -> &'static str {
    if value >= 0.0 {
        "positive"
    } else {
        "negative"
    }
}

/// NSE trading hours: weekdays 09:15 to 15:30 IST (UTC+5:30), bounds inclusive.
pub fn is_market_open(now: DateTime<Utc>) -> bool {
    let ist = now + Duration::minutes(5 * 60 + 30);
    if matches!(ist.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let minutes = ist.hour() * 60 + ist.minute();
    (9 * 60 + 15..=15 * 60 + 30).contains(&minutes)
}
