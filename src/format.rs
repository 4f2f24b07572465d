//! Display formatting shared by every surface (local API, terminal dashboard, logs).
//!
//! One policy everywhere: values are rounded (never truncated) to two decimals,
//! large amounts get a K/M/B/T suffix, and a missing value renders as
//! [`PLACEHOLDER`]. A reported zero is a value and renders as such.

/// Missing value in tables and cards.
pub const PLACEHOLDER: &str = "-";
/// Missing value in detail views.
pub const PLACEHOLDER_NA: &str = "N/A";

const UNITS: [(f64, &str); 5] = [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];

fn compact_usd(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let mut idx = UNITS.iter().rposition(|(scale, _)| abs >= *scale).unwrap_or(0);
    let mut scaled = abs / UNITS[idx].0;
    // 999_999 would round to "1000.00K"; promote it to the next unit instead
    if (scaled * 100.0).round() / 100.0 >= 1000.0 && idx + 1 < UNITS.len() {
        idx += 1;
        scaled = abs / UNITS[idx].0;
    }
    format!("{sign}${scaled:.2}{}", UNITS[idx].1)
}

/// `$1.50B`, `$2.30M`, `$12.35K`, `$450.00`.
pub fn format_usd(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => compact_usd(v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Like [`format_usd`] but keeps six decimals for sub-cent prices.
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v != 0.0 && v.abs() < 0.01 => {
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{sign}${:.6}", v.abs())
        }
        other => format_usd(other),
    }
}

/// Ratio as a percentage: `0.1234` → `12.34%`.
pub fn format_ratio_percent(ratio: Option<f64>) -> String {
    format_percent(ratio.map(|r| r * 100.0))
}

/// Value already in percent: `12.3456` → `12.35%`.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}%"),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Percent change with an explicit sign: `+4.20%`, `-1.00%`.
pub fn format_signed_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v >= 0.0 { "+" } else { "" };
            format!("{sign}{v:.2}%")
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// 0–100 scores: `72.50`.
pub fn format_score(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn format_bool(value: Option<bool>) -> String {
    match value {
        Some(true) => "Yes".to_string(),
        Some(false) => "No".to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// Return on investment between two prices. Undefined for a zero entry price.
pub fn format_roi(current_price: f64, entry_price: f64) -> String {
    if entry_price == 0.0 {
        return PLACEHOLDER.to_string();
    }
    format_signed_percent(Some((current_price - entry_price) / entry_price * 100.0))
}

/// `7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU` → `7xKXtg...gAsU`.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Cut to `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Swap the table placeholder for the detail-view one.
pub fn detail(formatted: String) -> String {
    if formatted == PLACEHOLDER {
        PLACEHOLDER_NA.to_string()
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_suffixes() {
        assert_eq!(format_usd(Some(1_500_000_000.0)), "$1.50B");
        assert_eq!(format_usd(Some(2_300_000.0)), "$2.30M");
        assert_eq!(format_usd(Some(450.0)), "$450.00");
        assert_eq!(format_usd(Some(12_346.0)), "$12.35K");
        assert_eq!(format_usd(Some(3.2e12)), "$3.20T");
    }

    #[test]
    fn usd_rounds_instead_of_truncating() {
        assert_eq!(format_usd(Some(1_999_999_999.0)), "$2.00B");
        assert_eq!(format_usd(Some(999_999.0)), "$1.00M");
        assert_eq!(format_usd(Some(999.999)), "$1.00K");
    }

    #[test]
    fn zero_and_missing_are_distinct() {
        assert_eq!(format_usd(Some(0.0)), "$0.00");
        assert_eq!(format_usd(None), "-");
        assert_eq!(format_score(Some(0.0)), "0.00");
        assert_eq!(format_bool(Some(false)), "No");
        assert_eq!(format_bool(None), "-");
        assert_eq!(detail(format_usd(None)), "N/A");
    }

    #[test]
    fn small_prices_keep_precision() {
        assert_eq!(format_price(Some(0.000123)), "$0.000123");
        assert_eq!(format_price(Some(0.5)), "$0.50");
        assert_eq!(format_price(Some(0.0)), "$0.00");
    }

    #[test]
    fn percents() {
        assert_eq!(format_ratio_percent(Some(0.1234)), "12.34%");
        assert_eq!(format_signed_percent(Some(4.2)), "+4.20%");
        assert_eq!(format_signed_percent(Some(-1.0)), "-1.00%");
        assert_eq!(format_roi(110.0, 100.0), "+10.00%");
        assert_eq!(format_roi(1.0, 0.0), "-");
    }

    #[test]
    fn addresses_and_truncation() {
        assert_eq!(
            shorten_address("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"),
            "7xKXtg...gAsU"
        );
        assert_eq!(shorten_address("short"), "short");
        assert_eq!(truncate("Bitcoin", 4), "Bit…");
        assert_eq!(truncate("BTC", 4), "BTC");
    }
}
