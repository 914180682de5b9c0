//! Validation helpers for DTOs.

use validator::ValidationError;

/// Whether `value` is a `#RRGGBB` color.
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Validates that a team color is written as `#RRGGBB`.
///
/// # Examples
///
/// ```ignore
/// validate_color("#1e88e5") // Ok
/// validate_color("#1E88E5") // Ok
/// validate_color("blue")    // Err
/// ```
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    if is_hex_color(color) {
        return Ok(());
    }

    let mut err = ValidationError::new("color_format");
    err.message = Some(format!("Color must look like #RRGGBB (got {color:?})").into());
    Err(err)
}

/// Rejects strings that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_color_valid() {
        assert!(validate_color("#000000").is_ok());
        assert!(validate_color("#abcdef").is_ok());
        assert!(validate_color("#ABCDEF").is_ok());
    }

    #[test]
    fn test_validate_color_invalid() {
        assert!(validate_color("abcdef").is_err()); // missing hash
        assert!(validate_color("#abcde").is_err()); // too short
        assert!(validate_color("#abcdeg").is_err()); // invalid hex
        assert!(validate_color("#ábcde").is_err()); // multibyte
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Tim A").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }
}
