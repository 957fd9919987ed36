pub trait StripCodeBlock {
    fn strip_code_block(&self) -> &str;
}

impl StripCodeBlock for str {
    fn strip_code_block(&self) -> &str {
        let trimmed = self.trim();
        if trimmed.starts_with("```")
            && let Some(pos) = trimmed.find('\n')
        {
            let inner = &trimmed[pos + 1..];
            if let Some(inner) = inner.strip_suffix("```") {
                return inner.trim();
            }
        }
        trimmed
    }
}

/// Formats an integer with thousands separators, e.g. 1234567 -> "1,234,567".
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Truncates to `max` characters, replacing the tail with "..." when cut.
/// Operates on chars, not bytes, so multi-byte input stays valid.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
