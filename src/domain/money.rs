use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Largest amount a single entry may carry: 10 trillion units.
/// Up to this bound a cents value survives the trip through an `f64` decimal
/// unchanged, so anything accepted here also loads back from storage.
pub const MAX_AMOUNT_CENTS: Cents = 1_000_000_000_000_000;

/// Format cents as a human-readable decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Format cents for display with a currency symbol and thousands separators.
/// Example: ("₹", 380000) -> "₹3,800.00", ("$", -1200) -> "-$12.00"
pub fn format_currency(cents: Cents, symbol: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = (abs_cents / 100).to_string();
    let remainder = abs_cents % 100;

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}{}.{:02}", sign, symbol, grouped, remainder)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
///
/// Magnitudes above [`MAX_AMOUNT_CENTS`] are `OutOfRange`.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let cents = parse_unbounded_cents(input)?;
    if cents.unsigned_abs() > MAX_AMOUNT_CENTS.unsigned_abs() {
        return Err(ParseCentsError::OutOfRange);
    }
    Ok(cents)
}

fn parse_unbounded_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => {
            let units = parse_digits(parts[0])?;
            let cents = units
                .checked_mul(100)
                .ok_or(ParseCentsError::OutOfRange)?;
            Ok(if negative { -cents } else { cents })
        }
        2 => {
            let units = if parts[0].is_empty() {
                0
            } else {
                parse_digits(parts[0])?
            };

            // Pad or truncate the fractional part to 2 digits
            let decimal_str = parts[1];
            let decimal_cents = match decimal_str.len() {
                0 => 0,
                1 => parse_digits(decimal_str)? * 10,
                2 => parse_digits(decimal_str)?,
                _ => {
                    parse_digits(decimal_str)?;
                    parse_digits(&decimal_str[..2])?
                }
            };

            if parts[0].is_empty() && decimal_str.is_empty() {
                return Err(ParseCentsError::InvalidFormat);
            }

            let cents = units
                .checked_mul(100)
                .and_then(|c| c.checked_add(decimal_cents))
                .ok_or(ParseCentsError::OutOfRange)?;
            Ok(if negative { -cents } else { cents })
        }
        _ => Err(ParseCentsError::InvalidFormat),
    }
}

// `i64::from_str` accepts a leading '+', plain digits only here.
fn parse_digits(s: &str) -> Result<i64, ParseCentsError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }
    s.parse().map_err(|_| ParseCentsError::OutOfRange)
}

/// Convert cents to the decimal number written to JSON records.
pub fn cents_to_decimal(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Convert a decimal number read from JSON records to cents, rounding to the
/// nearest cent. Returns `None` for NaN, infinities and magnitudes above
/// [`MAX_AMOUNT_CENTS`].
pub fn decimal_to_cents(value: f64) -> Option<Cents> {
    if !value.is_finite() || value.abs() > cents_to_decimal(MAX_AMOUNT_CENTS) {
        return None;
    }
    Some((value * 100.0).round() as Cents)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    OutOfRange,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::OutOfRange => write!(f, "amount out of range"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(380000, "₹"), "₹3,800.00");
        assert_eq!(format_currency(0, "₹"), "₹0.00");
        assert_eq!(format_currency(99, "$"), "$0.99");
        assert_eq!(format_currency(123456789, "$"), "$1,234,567.89");
        assert_eq!(format_currency(100000, "€"), "€1,000.00");
        assert_eq!(format_currency(-120000, "$"), "-$1,200.00");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.34"), Ok(1234));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents("0.01"), Ok(1));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("7."), Ok(700));
        assert_eq!(parse_cents(" 42 "), Ok(4200));
        assert_eq!(parse_cents("-5"), Ok(-500));
        assert_eq!(parse_cents("100.999"), Ok(10099)); // Truncates
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert_eq!(parse_cents("abc"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents(""), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("."), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("+5"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("1e5"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("12.34.56"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("1.2x"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::OutOfRange)
        );
    }

    #[test]
    fn test_parse_cents_bounded_by_max_amount() {
        assert_eq!(parse_cents("10000000000000"), Ok(MAX_AMOUNT_CENTS));
        assert_eq!(parse_cents("-10000000000000"), Ok(-MAX_AMOUNT_CENTS));
        assert_eq!(
            parse_cents("10000000000000.01"),
            Err(ParseCentsError::OutOfRange)
        );
        assert_eq!(
            parse_cents("100000000000000"),
            Err(ParseCentsError::OutOfRange)
        );
        assert_eq!(
            parse_cents("50000000000000000"),
            Err(ParseCentsError::OutOfRange)
        );
    }

    #[test]
    fn test_decimal_conversion() {
        assert_eq!(decimal_to_cents(5000.0), Some(500000));
        assert_eq!(decimal_to_cents(12.34), Some(1234));
        assert_eq!(decimal_to_cents(0.1 + 0.2), Some(30));
        assert_eq!(decimal_to_cents(f64::NAN), None);
        assert_eq!(decimal_to_cents(f64::INFINITY), None);
        assert_eq!(cents_to_decimal(1250), 12.5);

        for cents in [
            1,
            99,
            1234,
            500000,
            123456789,
            MAX_AMOUNT_CENTS - 1,
            MAX_AMOUNT_CENTS,
        ] {
            assert_eq!(decimal_to_cents(cents_to_decimal(cents)), Some(cents));
        }

        // Same bound as parse_cents
        assert_eq!(decimal_to_cents(10_000_000_000_000.0), Some(MAX_AMOUNT_CENTS));
        assert_eq!(decimal_to_cents(10_000_000_000_000.02), None);
        assert_eq!(decimal_to_cents(1e14), None);
    }
}
