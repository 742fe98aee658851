//! Form-level validation rules shared by the record types.

use regex::Regex;

use crate::error::{Error, Result};

/// Email shape accepted by HTML `type=email` inputs.
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

/// Reject blank values for a required text field.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "is required"));
    }
    Ok(())
}

/// Reject values that are not a plausible email address.
pub(crate) fn require_email(field: &'static str, value: &str) -> Result<()> {
    require_text(field, value)?;
    let re = Regex::new(EMAIL_PATTERN).map_err(|e| Error::internal(e.to_string()))?;
    if !re.is_match(value.trim()) {
        return Err(Error::validation(
            field,
            format!("'{value}' is not a valid email address"),
        ));
    }
    Ok(())
}

/// Reject amounts that are negative or not finite.
pub(crate) fn require_amount(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::validation(
            field,
            format!("{value} is not a non-negative amount"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "Khalsa School").is_ok());
        assert!(require_text("name", "").is_err());
        assert!(require_text("name", "   ").is_err());
    }

    #[test]
    fn test_require_email_accepts_common_addresses() {
        assert!(require_email("email", "john@gurunanakacademy.com").is_ok());
        assert!(require_email("email", "first.last+tag@school.bc.ca").is_ok());
        assert!(require_email("email", "admin@localhost").is_ok());
    }

    #[test]
    fn test_require_email_rejects_garbage() {
        let err = require_email("email", "not-an-email").unwrap_err();
        assert!(err.is_validation());
        assert!(require_email("email", "a@").is_err());
        assert!(require_email("email", "@b.com").is_err());
        assert!(require_email("email", "two words@b.com").is_err());
    }

    #[test]
    fn test_require_amount() {
        assert!(require_amount("amount", 0.0).is_ok());
        assert!(require_amount("amount", 40.0).is_ok());
        assert!(require_amount("amount", -1.0).is_err());
        assert!(require_amount("amount", f64::NAN).is_err());
        assert!(require_amount("amount", f64::INFINITY).is_err());
    }
}
