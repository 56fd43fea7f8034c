//! The one numeric policy for raw grid input.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    /// Blank input; the user has not entered anything.
    Unset,
    /// Not a finite decimal number. Ignored everywhere, never reported.
    Invalid,
    Negative(f64),
    Zero,
    Positive(f64),
}

impl CellValue {
    /// Amount that counts towards a displayed total.
    pub fn amount(self) -> Option<f64> {
        match self {
            CellValue::Positive(value) => Some(value),
            CellValue::Zero => Some(0.0),
            _ => None,
        }
    }
}

pub fn parse_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Unset;
    }

    match trimmed.parse::<f64>() {
        Ok(value) if !value.is_finite() => CellValue::Invalid,
        Ok(value) if value == 0.0 => CellValue::Zero,
        Ok(value) if value < 0.0 => CellValue::Negative(value),
        Ok(value) => CellValue::Positive(value),
        Err(_) => CellValue::Invalid,
    }
}

/// Shortest decimal that parses back to `value` (`f64`'s `Display`), so `7.0`
/// prints as `7`.
pub fn format_amount(value: f64) -> String {
    value.to_string()
}
