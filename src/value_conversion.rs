use crate::table::Cell;

/// Converts a raw CSV field into a typed cell.
///
/// Anything matching the plain decimal/exponent form, optionally surrounded
/// by ASCII whitespace, becomes a `Number`, so integers come out as floats.
/// Everything else, including thousands separators, `inf` and `nan`, is kept
/// as `Text` exactly as read.
pub fn convert_field_value(field: String, no_type_conversion: bool) -> Cell {
    let trimmed = field.trim_matches(|c: char| c.is_ascii_whitespace());
    if no_type_conversion || !is_numeric_literal(trimmed) {
        return Cell::Text(field);
    }

    match trimmed.parse::<f64>() {
        Ok(num) if num.is_finite() => Cell::Number(num),
        _ => Cell::Text(field),
    }
}

/// `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`
fn is_numeric_literal(field: &str) -> bool {
    let bytes = field.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        pos += 1;
    }

    let int_digits = count_digits(&bytes[pos..]);
    pos += int_digits;

    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        frac_digits = count_digits(&bytes[pos..]);
        pos += frac_digits;
    }

    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_digits = count_digits(&bytes[pos..]);
        if exp_digits == 0 {
            return false;
        }
        pos += exp_digits;
    }

    pos == bytes.len()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(field: &str) -> Cell {
        convert_field_value(field.to_string(), false)
    }

    #[test]
    fn test_convert_field_value_integers() {
        assert_eq!(convert("42"), Cell::Number(42.0));
        assert_eq!(convert("-42"), Cell::Number(-42.0));
        assert_eq!(convert("+7"), Cell::Number(7.0));
    }

    #[test]
    fn test_convert_field_value_floats() {
        assert_eq!(convert("3.14"), Cell::Number(3.14));
        assert_eq!(convert(".5"), Cell::Number(0.5));
        assert_eq!(convert("5."), Cell::Number(5.0));
        assert_eq!(convert("1e3"), Cell::Number(1000.0));
        assert_eq!(convert("2.5E-2"), Cell::Number(0.025));
    }

    #[test]
    fn test_convert_field_value_leading_zeros_become_numbers() {
        assert_eq!(convert("02134"), Cell::Number(2134.0));
    }

    #[test]
    fn test_convert_field_value_thousands_separator_stays_text() {
        assert_eq!(convert("1,000"), Cell::from("1,000"));
        assert_eq!(convert("1.000,50"), Cell::from("1.000,50"));
    }

    #[test]
    fn test_convert_field_value_keeps_text_untouched() {
        assert_eq!(convert(" abc "), Cell::from(" abc "));
        assert_eq!(convert(" 1 2 "), Cell::from(" 1 2 "));
        assert_eq!(convert("Hello World"), Cell::from("Hello World"));
        assert_eq!(convert("TRUE"), Cell::from("TRUE"));
        assert_eq!(convert(""), Cell::from(""));
    }

    #[test]
    fn test_convert_field_value_surrounding_whitespace() {
        assert_eq!(convert(" 12 "), Cell::Number(12.0));
        assert_eq!(convert(" 2"), Cell::Number(2.0));
        assert_eq!(convert("\t-1.5\r"), Cell::Number(-1.5));
        assert_eq!(convert(" inf "), Cell::from(" inf "));
        assert_eq!(convert("   "), Cell::from("   "));
    }

    #[test]
    fn test_convert_field_value_rejects_non_finite() {
        assert_eq!(convert("inf"), Cell::from("inf"));
        assert_eq!(convert("NaN"), Cell::from("NaN"));
        assert_eq!(convert("1e400"), Cell::from("1e400"));
    }

    #[test]
    fn test_convert_field_value_malformed_numbers() {
        for field in ["-", ".", "1e", "1e+", "1.2.3", "0x10", "1_000", "12abc"] {
            assert_eq!(convert(field), Cell::from(field), "field {field:?}");
        }
    }

    #[test]
    fn test_convert_field_value_no_type_conversion() {
        assert_eq!(convert_field_value("42".into(), true), Cell::from("42"));
    }

    #[test]
    fn test_text_coercion_is_idempotent() {
        let first = convert("abc");
        let again = convert(first.as_text().unwrap_or_default());
        assert_eq!(first, again);
    }
}
