use validator::ValidationError;

/// Drops surrounding whitespace from free-text input.
pub(crate) fn trim_text(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn trim_opt_text(value: Option<String>) -> Option<String> {
    value.map(trim_text)
}

/// Rejects strings that are empty once surrounding whitespace is removed.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Accepts `#RRGGBB` colors only.
pub(crate) fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let Some(digits) = value.strip_prefix('#') else {
        return Err(ValidationError::new("hex_color"));
    };
    if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color"))
    }
}
