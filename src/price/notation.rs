/// Currency marker stripped on decode and reapplied on write.
pub const CURRENCY_PREFIX: char = '$';

const SUBSCRIPT_ZERO: u32 = 0x2080;

/// Value of a Unicode subscript digit (U+2080..=U+2089).
fn subscript_value(c: char) -> Option<u32> {
    let code = c as u32;
    (SUBSCRIPT_ZERO..=SUBSCRIPT_ZERO + 9)
        .contains(&code)
        .then(|| code - SUBSCRIPT_ZERO)
}

/// Decode a displayed price like `$0.0₅8372` into a plain decimal string.
///
/// The currency prefix is stripped. In the fractional part, the first
/// subscript digit `d` expands to a run of `d` zeros carrying the digit
/// itself (`₅` → `000005`); a `₀` marker expands to nothing. Everything
/// after the marker is copied verbatim, including any later subscripts.
///
/// Never fails: input that is not a number comes back stripped but otherwise
/// untouched.
pub fn decode_price(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix(CURRENCY_PREFIX).unwrap_or(trimmed);

    let Some((integer, fraction)) = stripped.split_once('.') else {
        return stripped.to_string();
    };

    let mut expanded = String::with_capacity(fraction.len() + 16);
    let mut chars = fraction.chars();
    while let Some(c) = chars.next() {
        match subscript_value(c) {
            Some(d) => {
                expanded.extend(std::iter::repeat('0').take(d as usize));
                if d > 0 {
                    expanded.push(char::from_digit(d, 10).unwrap_or('0'));
                }
                expanded.push_str(chars.as_str());
                break;
            }
            None => expanded.push(c),
        }
    }

    format!("{integer}.{expanded}")
}

/// Reapply the currency prefix for the sheet cell.
pub fn with_currency(price_text: &str) -> String {
    format!("{CURRENCY_PREFIX}{price_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_subscript_run() {
        assert_eq!(decode_price("$0.0₅8372"), "0.00000058372");
    }

    #[test]
    fn plain_price_only_loses_prefix() {
        assert_eq!(decode_price("$1.23"), "1.23");
        assert_eq!(decode_price("1.23"), "1.23");
        assert_eq!(decode_price("$0.000123"), "0.000123");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(decode_price("$1.23\n"), "1.23");
        assert_eq!(decode_price("  $0.0₅8372 "), "0.00000058372");
    }

    #[test]
    fn zero_subscript_expands_to_nothing() {
        assert_eq!(decode_price("$0.₀5"), "0.5");
    }

    #[test]
    fn integer_price_passes_through() {
        assert_eq!(decode_price("$42"), "42");
        assert_eq!(decode_price("1,234"), "1,234");
    }

    #[test]
    fn only_first_run_expands() {
        assert_eq!(decode_price("$0.0₂1₃4"), "0.00021₃4");
    }

    #[test]
    fn subscript_outside_fraction_is_untouched() {
        assert_eq!(decode_price("$1₂.5"), "1₂.5");
    }

    #[test]
    fn garbage_never_panics() {
        assert_eq!(decode_price(""), "");
        assert_eq!(decode_price("$"), "");
        assert_eq!(decode_price("$."), ".");
        assert_eq!(decode_price("N/A"), "N/A");
        assert_eq!(decode_price("$.₉"), ".0000000009");
    }

    #[test]
    fn decoding_decoded_output_is_noop() {
        for raw in ["$0.0₅8372", "$1.23", "$0.₀5", "$42", "$0.0₉1"] {
            let once = decode_price(raw);
            assert_eq!(decode_price(&once), once, "input {raw}");
        }
    }

    #[test]
    fn currency_reapplied() {
        assert_eq!(with_currency("0.00000058372"), "$0.00000058372");
    }
}
