use loader_logging::loader_warn;
use message_loader_engine::{NodeId, Page};

/// Parses the leading integer of `text`, ignoring anything after the digits.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Numeric values written into the child elements of `container`.
pub fn collect_samples(page: &Page, container: NodeId) -> Vec<i64> {
    let mut samples = Vec::new();
    for child in page.child_elements(container) {
        let text = page.text(child).unwrap_or_default();
        match parse_leading_int(&text) {
            Some(value) => samples.push(value),
            None => loader_warn!("skipping non-numeric sample {:?}", text.trim()),
        }
    }
    samples
}
