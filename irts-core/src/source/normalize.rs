//! Pure transforms applied to raw source values.

use std::num::ParseFloatError;

/// Category codes as published, and the names stored in the dataset.
pub const CATEGORY_RENAMES: &[(&str, &str)] = &[("PREFIXADOS", "pre"), ("IPCA", "ipca")];

/// Map a published category code to its stored name. Unknown codes pass
/// through unchanged.
pub fn rename_category(raw: &str) -> String {
    CATEGORY_RENAMES
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Parse a comma-decimal number. Blank means absent, never zero.
pub fn parse_decimal_comma(raw: &str) -> Result<Option<f64>, ParseFloatError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.replace(',', ".").parse::<f64>().map(Some)
}
