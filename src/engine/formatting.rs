//! Display helpers for strategy previews.

use crate::domain::Decimal;

/// `$1,234.57` style: two fractional digits, grouped thousands.
pub fn format_usd(value: Decimal) -> String {
    let fixed = value.abs().to_fixed(2);
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.round_dp(2).is_negative() { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, fraction)
}

/// Like [`format_usd`], but never shows more than `max`.
pub fn format_usd_max(value: Decimal, max: Decimal) -> String {
    format_usd(value.min(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(d("0")), "$0.00");
        assert_eq!(format_usd(d("999.999")), "$1,000.00");
        assert_eq!(format_usd(d("1234567.891")), "$1,234,567.89");
        assert_eq!(format_usd(d("-12.5")), "-$12.50");
        assert_eq!(format_usd(d("-0.001")), "$0.00");
    }

    #[test]
    fn test_format_usd_max_caps() {
        assert_eq!(format_usd_max(d("2200"), d("2000")), "$2,000.00");
        assert_eq!(format_usd_max(d("1250"), d("2000")), "$1,250.00");
    }
}
