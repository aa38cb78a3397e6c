//! Text handling shared by the entities and the command surface.
//!
//! Input coming from the shell is never rejected for being malformed: names are
//! clipped to fixed lengths and numbers fall back to zero, matching how the
//! ledger has always accepted data entry.

/// Maximum number of characters kept for client and product names.
pub const MAX_NAME_LEN: usize = 99;

/// Maximum number of characters kept for bill dates (`YYYY-MM-DD`).
pub const MAX_DATE_LEN: usize = 10;

/// Keep at most `max` characters of `input`, never splitting a character.
pub fn truncate_chars(input: &str, max: usize) -> String {
    match input.char_indices().nth(max) {
        Some((byte_idx, _)) => input[..byte_idx].to_string(),
        None => input.to_string(),
    }
}

/// Format a price with exactly two decimals.
/// Example: 9.5 -> "9.50", 19.99 -> "19.99"
pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}

/// Parse the leading integer of `input`, or 0 when there is none.
/// Example: "12" -> 12, " 12abc" -> 12, "-3" -> -3, "abc" -> 0
///
/// Values that do not fit in an `i32` also yield 0.
pub fn parse_id_lenient(input: &str) -> i32 {
    let input = input.trim_start();
    let sign_len = usize::from(input.starts_with(['+', '-']));
    let digits = input[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len() - sign_len);

    input[..sign_len + digits].parse().unwrap_or(0)
}

/// Parse the longest leading decimal number of `input`, or 0.0 when there is none.
/// Example: "19.99" -> 19.99, "9.5kg" -> 9.5, ".5" -> 0.5, "abc" -> 0.0
///
/// Only decimal notation is recognised: hexadecimal input such as "0x1A"
/// reads as its leading "0".
pub fn parse_price_lenient(input: &str) -> f64 {
    let input = input.trim_start();
    let boundaries = input
        .char_indices()
        .map(|(idx, c)| idx + c.len_utf8())
        .collect::<Vec<_>>();

    boundaries
        .into_iter()
        .rev()
        .find_map(|end| input[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("Alice", 10), "Alice");
        assert_eq!(truncate_chars("Alice", 5), "Alice");
        assert_eq!(truncate_chars("Alice", 3), "Ali");
        assert_eq!(truncate_chars("", 3), "");
        // Multi-byte characters are kept whole
        assert_eq!(truncate_chars("Zoë Café", 3), "Zoë");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(9.5), "9.50");
        assert_eq!(format_price(19.99), "19.99");
        assert_eq!(format_price(0.0), "0.00");
        assert_eq!(format_price(-5.0), "-5.00");
        assert_eq!(format_price(100.0), "100.00");
    }

    #[test]
    fn test_parse_id_lenient() {
        assert_eq!(parse_id_lenient("12"), 12);
        assert_eq!(parse_id_lenient("  12abc"), 12);
        assert_eq!(parse_id_lenient("-3"), -3);
        assert_eq!(parse_id_lenient("+4"), 4);
        assert_eq!(parse_id_lenient("abc"), 0);
        assert_eq!(parse_id_lenient(""), 0);
        assert_eq!(parse_id_lenient("-"), 0);
        assert_eq!(parse_id_lenient("99999999999"), 0);
    }

    #[test]
    fn test_parse_price_lenient() {
        assert_eq!(parse_price_lenient("19.99"), 19.99);
        assert_eq!(parse_price_lenient("9.5kg"), 9.5);
        assert_eq!(parse_price_lenient(" .5"), 0.5);
        assert_eq!(parse_price_lenient("-2"), -2.0);
        assert_eq!(parse_price_lenient("1e2x"), 100.0);
        assert_eq!(parse_price_lenient("abc"), 0.0);
        assert_eq!(parse_price_lenient(""), 0.0);
        assert_eq!(parse_price_lenient("0x1A"), 0.0);
    }
}
