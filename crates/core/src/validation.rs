//! Client-side address form validation.
//!
//! These checks run before submission and surface field-level error text;
//! input that fails them must never reach the network layer.
//!
//! The phone rule follows the regional mobile numbering plan the storefront
//! ships in: exactly 10 digits with a leading digit of 6-9. Postal codes are
//! 6 digits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::AddressInput;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FieldError {
    /// A required field was empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// A field did not match its expected format.
    #[error("{field} is invalid: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },
}

impl FieldError {
    /// The field the error belongs to, for inline rendering.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Required { field } | Self::InvalidFormat { field, .. } => field,
        }
    }
}

/// All field errors for a submitted form, collected rather than
/// fail-fast so every invalid field can be highlighted at once.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("validation failed: {}", format_fields(.0))]
#[serde(bound(deserialize = "'de: 'static"))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// Errors for one field, if any.
    pub fn for_field(&self, field: &str) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter(move |e| e.field() == field)
    }
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate an address form.
///
/// # Errors
///
/// Returns every failing field at once so the form can render inline
/// messages next to each one.
pub fn validate_address(input: &AddressInput) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    check_required(&mut errors, "name", &input.name);
    check_required(&mut errors, "street", &input.street);
    check_required(&mut errors, "city", &input.city);
    check_required(&mut errors, "state", &input.state);
    check_required(&mut errors, "country", &input.country);

    if let Err(e) = validate_zip_code(&input.zip_code) {
        errors.push(e);
    }
    if let Err(e) = validate_phone(&input.phone) {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Validate a 6-digit postal code.
///
/// # Errors
///
/// Returns a field error when the code is empty or not exactly 6 digits.
pub fn validate_zip_code(zip_code: &str) -> Result<(), FieldError> {
    let zip_code = zip_code.trim();

    if zip_code.is_empty() {
        return Err(FieldError::Required { field: "zip_code" });
    }

    if zip_code.len() != 6 || !zip_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::InvalidFormat {
            field: "zip_code",
            reason: "must be exactly 6 digits",
        });
    }

    Ok(())
}

/// Validate a 10-digit mobile number (leading digit 6-9).
///
/// # Errors
///
/// Returns a field error when the number is empty, the wrong length,
/// non-numeric, or starts with a digit outside 6-9.
pub fn validate_phone(phone: &str) -> Result<(), FieldError> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(FieldError::Required { field: "phone" });
    }

    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::InvalidFormat {
            field: "phone",
            reason: "must be exactly 10 digits",
        });
    }

    if !matches!(phone.chars().next(), Some('6'..='9')) {
        return Err(FieldError::InvalidFormat {
            field: "phone",
            reason: "must start with 6, 7, 8, or 9",
        });
    }

    Ok(())
}

fn check_required(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::Required { field });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::AddressKind;

    fn valid_input() -> AddressInput {
        AddressInput {
            name: "Priya Sharma".to_string(),
            phone: "9876543210".to_string(),
            street: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            zip_code: "560001".to_string(),
            country: "India".to_string(),
            kind: AddressKind::Home,
            is_default: false,
        }
    }

    #[test]
    fn test_valid_address_passes() {
        assert!(validate_address(&valid_input()).is_ok());
    }

    #[test]
    fn test_missing_required_fields_are_all_collected() {
        let input = AddressInput {
            name: String::new(),
            street: "  ".to_string(),
            ..valid_input()
        };
        let errors = validate_address(&input).unwrap_err();
        assert_eq!(errors.0.len(), 2);
        assert_eq!(errors.for_field("name").count(), 1);
        assert_eq!(errors.for_field("street").count(), 1);
    }

    #[test]
    fn test_zip_code_must_be_six_digits() {
        assert!(validate_zip_code("560001").is_ok());
        assert!(validate_zip_code("56001").is_err());
        assert!(validate_zip_code("5600011").is_err());
        assert!(validate_zip_code("56000a").is_err());
    }

    #[test]
    fn test_phone_length_and_digits() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("987654321").is_err());
        assert!(validate_phone("98765432100").is_err());
        assert!(validate_phone("98765abc10").is_err());
    }

    #[test]
    fn test_phone_leading_digit_range() {
        assert!(validate_phone("6000000000").is_ok());
        assert!(validate_phone("5000000000").is_err());
        assert!(validate_phone("1234567890").is_err());
    }

    #[test]
    fn test_invalid_phone_never_reaches_address_validation_success() {
        let input = AddressInput {
            phone: "12345".to_string(),
            ..valid_input()
        };
        let errors = validate_address(&input).unwrap_err();
        assert_eq!(errors.for_field("phone").count(), 1);
    }
}
