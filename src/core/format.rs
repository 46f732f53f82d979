use crate::domain::model::EMPTY_DISPLAY;

pub const DEFAULT_DECIMALS: usize = 2;
pub const MAX_DECIMALS: usize = 20;

/// 將自由文字轉為數字；無法解析或非有限值一律視為 0
pub fn parse_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// 小數位數：空白或無效時用預設值，其餘取 floor 並限制在 0..=MAX_DECIMALS
pub fn normalize_decimals(raw: &str) -> usize {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => {
            let floored = n.floor();
            if floored <= 0.0 {
                0
            } else {
                (floored as usize).min(MAX_DECIMALS)
            }
        }
        _ => DEFAULT_DECIMALS,
    }
}

/// 四捨五入（遠離零）到指定位數，並加上千分位逗號
pub fn format_amount(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return EMPTY_DISPLAY.to_string();
    }

    let decimals = decimals.min(MAX_DECIMALS);
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    let rounded = if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    };

    let digits = format!("{:.*}", decimals, rounded.abs());
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits.as_str(), None),
    };

    let mut out = String::with_capacity(digits.len() + int_part.len() / 3 + 1);
    if rounded < 0.0 && digits.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(int_part: &str) -> String {
    let len = int_part.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
