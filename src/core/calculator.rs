use crate::core::format::{format_amount, normalize_decimals, parse_number};
use crate::domain::model::{
    normalize_code, CalculationInputs, CalculationResult, CalculationView, RateAttribution,
    RawInputs, EMPTY_DISPLAY,
};
use chrono::Local;

pub const DESCRIPTION_PLACEHOLDER: &str = "Enter the currencies, original submitted amount, reimbursed-to-date, and FX (or click Calculate to fetch) to generate a description of the adjustment.";

const OLD_CCY_FALLBACK: &str = "OLD";
const NEW_CCY_FALLBACK: &str = "NEW";

impl CalculationInputs {
    /// 從表單文字轉換；非數字欄位視為 0，不回報錯誤
    pub fn from_raw(raw: &RawInputs) -> Self {
        Self {
            original: parse_number(&raw.original),
            reimbursed: parse_number(&raw.reimbursed),
            rate: parse_number(&raw.rate),
            decimals: normalize_decimals(&raw.decimals),
            old_ccy: normalize_code(&raw.old_ccy),
            new_ccy: normalize_code(&raw.new_ccy),
        }
    }
}

pub fn calculate(inputs: &CalculationInputs) -> CalculationResult {
    let remaining_old = (inputs.original - inputs.reimbursed).max(0.0);
    let remaining_new = remaining_old * inputs.rate;
    CalculationResult {
        remaining_old,
        remaining_new,
        hybrid_total: inputs.reimbursed + remaining_new,
    }
}

pub fn render(inputs: &CalculationInputs, attribution: &RateAttribution) -> CalculationView {
    let result = calculate(inputs);
    let decimals = inputs.decimals;
    let old_tag = display_code(&inputs.old_ccy, OLD_CCY_FALLBACK);
    let new_tag = display_code(&inputs.new_ccy, NEW_CCY_FALLBACK);

    let remaining_old = if inputs.original != 0.0 || inputs.reimbursed != 0.0 {
        format!("{} {}", format_amount(result.remaining_old, decimals), old_tag)
    } else {
        EMPTY_DISPLAY.to_string()
    };
    let remaining_new = if result.remaining_old != 0.0 && inputs.rate != 0.0 {
        format!("{} {}", format_amount(result.remaining_new, decimals), new_tag)
    } else {
        EMPTY_DISPLAY.to_string()
    };
    let hybrid_total = if inputs.rate != 0.0 || inputs.reimbursed != 0.0 {
        format_amount(result.hybrid_total, decimals)
    } else {
        EMPTY_DISPLAY.to_string()
    };

    CalculationView {
        remaining_old,
        remaining_new,
        hybrid_total,
        hybrid_tag: format!("[{} + {}]", old_tag, new_tag),
        old_ccy_tag: old_tag.to_string(),
        new_ccy_tag: new_tag.to_string(),
        description: describe(inputs, &result, attribution),
    }
}

fn display_code<'a>(code: &'a str, fallback: &'a str) -> &'a str {
    if code.is_empty() {
        fallback
    } else {
        code
    }
}

fn describe(
    inputs: &CalculationInputs,
    result: &CalculationResult,
    attribution: &RateAttribution,
) -> String {
    if !(inputs.original > 0.0
        && inputs.rate > 0.0
        && !inputs.old_ccy.is_empty()
        && !inputs.new_ccy.is_empty())
    {
        return DESCRIPTION_PLACEHOLDER.to_string();
    }

    let d = inputs.decimals;
    let old = &inputs.old_ccy;
    let new = &inputs.new_ccy;

    let mut fx_note = format!("FX rate powered by {}", attribution.label());
    if let Some(timestamp) = attribution.timestamp() {
        fx_note.push_str(&format!(
            " (retrieved at {})",
            timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ));
    }

    [
        format!(
            "This reimbursement plan was originally submitted for {} {}.",
            format_amount(inputs.original, d),
            old
        ),
        format!(
            "{} {} has been reimbursed to date, leaving {} {} outstanding.",
            format_amount(inputs.reimbursed, d),
            old,
            format_amount(result.remaining_old, d),
            old
        ),
        format!(
            "After changing from {} to {}, the remaining balance will be reimbursed as {} {}.",
            old,
            new,
            format_amount(result.remaining_new, d),
            new
        ),
        format!(
            "Therefore, the updated submitted amount becomes {}.",
            format_amount(result.hybrid_total, d)
        ),
        format!("{}.", fx_note),
    ]
    .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn inputs(original: f64, reimbursed: f64, rate: f64) -> CalculationInputs {
        CalculationInputs {
            original,
            reimbursed,
            rate,
            decimals: 2,
            old_ccy: "USD".to_string(),
            new_ccy: "EUR".to_string(),
        }
    }

    #[test]
    fn test_calculate_basic_scenario() {
        let result = calculate(&inputs(1000.0, 400.0, 0.9));
        assert_eq!(result.remaining_old, 600.0);
        assert!((result.remaining_new - 540.0).abs() < 1e-9);
        assert!((result.hybrid_total - 940.0).abs() < 1e-9);
    }

    #[test]
    fn test_remaining_old_is_clamped_at_zero() {
        let result = calculate(&inputs(100.0, 250.0, 1.5));
        assert_eq!(result.remaining_old, 0.0);
        assert_eq!(result.remaining_new, 0.0);
        assert_eq!(result.hybrid_total, 250.0);
    }

    #[test]
    fn test_calculate_is_idempotent() {
        let input = inputs(123.45, 67.8, 1.1);
        assert_eq!(calculate(&input), calculate(&input));
        let attribution = RateAttribution::Manual;
        assert_eq!(render(&input, &attribution), render(&input, &attribution));
    }

    #[test]
    fn test_render_end_to_end_scenario() {
        let view = render(&inputs(1000.0, 400.0, 0.9), &RateAttribution::Manual);

        assert_eq!(view.remaining_old, "600.00 USD");
        assert_eq!(view.remaining_new, "540.00 EUR");
        assert_eq!(view.hybrid_total, "940.00");
        assert_eq!(view.hybrid_tag, "[USD + EUR]");
        assert_eq!(view.old_ccy_tag, "USD");
        assert_eq!(view.new_ccy_tag, "EUR");

        for needle in ["1,000.00 USD", "400.00 USD", "600.00 USD", "540.00 EUR", "940.00"] {
            assert!(view.description.contains(needle), "missing {}", needle);
        }
        assert!(view
            .description
            .ends_with("FX rate powered by manual entry."));
    }

    #[test]
    fn test_render_sourced_attribution_includes_retrieval_time() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let attribution = RateAttribution::Sourced {
            source: "open.er-api.com".to_string(),
            timestamp: Some(timestamp),
        };
        let view = render(&inputs(1000.0, 400.0, 0.9), &attribution);

        assert!(view
            .description
            .contains("FX rate powered by open.er-api.com (retrieved at "));
    }

    #[test]
    fn test_render_placeholder_description() {
        let view = render(&inputs(1000.0, 400.0, 0.0), &RateAttribution::Manual);
        assert_eq!(view.description, DESCRIPTION_PLACEHOLDER);
        assert_eq!(view.remaining_old, "600.00 USD");
        assert_eq!(view.remaining_new, EMPTY_DISPLAY);
        assert_eq!(view.hybrid_total, "400.00");

        let mut missing_code = inputs(1000.0, 400.0, 0.9);
        missing_code.new_ccy.clear();
        let view = render(&missing_code, &RateAttribution::Manual);
        assert_eq!(view.description, DESCRIPTION_PLACEHOLDER);
        assert_eq!(view.remaining_new, "540.00 NEW");
        assert_eq!(view.hybrid_tag, "[USD + NEW]");
    }

    #[test]
    fn test_render_all_zero_shows_dashes() {
        let view = render(&inputs(0.0, 0.0, 0.0), &RateAttribution::Manual);
        assert_eq!(view.remaining_old, EMPTY_DISPLAY);
        assert_eq!(view.remaining_new, EMPTY_DISPLAY);
        assert_eq!(view.hybrid_total, EMPTY_DISPLAY);
    }

    #[test]
    fn test_from_raw_coerces_fields() {
        let raw = RawInputs {
            old_ccy: " usd ".to_string(),
            new_ccy: "eur".to_string(),
            original: "1000".to_string(),
            reimbursed: "abc".to_string(),
            rate: "".to_string(),
            decimals: "1.7".to_string(),
        };
        let parsed = CalculationInputs::from_raw(&raw);
        assert_eq!(parsed.old_ccy, "USD");
        assert_eq!(parsed.new_ccy, "EUR");
        assert_eq!(parsed.original, 1000.0);
        assert_eq!(parsed.reimbursed, 0.0);
        assert_eq!(parsed.rate, 0.0);
        assert_eq!(parsed.decimals, 1);
    }
}
