const LAKH: u64 = 100_000;
const CRORE: u64 = 10_000_000;

/// Format whole rupees with Indian digit grouping: `₹12,34,567`.
pub fn format_inr(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }
    let (head, last3) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (more, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = more;
    }
    groups.push(rest);
    groups.reverse();
    format!("₹{},{last3}", groups.join(","))
}

/// Short form used on dashboards: `₹12.4L`, `₹4.5Cr`.
pub fn format_inr_compact(amount: u64) -> String {
    if amount >= CRORE {
        format!("₹{:.1}Cr", amount as f64 / CRORE as f64)
    } else if amount >= LAKH {
        format!("₹{:.1}L", amount as f64 / LAKH as f64)
    } else {
        format_inr(amount)
    }
}
