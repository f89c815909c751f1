//! Common validation rules shared across request payloads.

use rust_decimal::Decimal;
use validator::ValidationError;

use crate::utils::money;

/// Validates PO and invoice numbers.
///
/// Requirements:
/// - 1-64 characters after trimming
/// - ASCII alphanumerics plus `-`, `/`, `_` and `.`
pub fn validate_document_number(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 64 || trimmed.len() != value.len() {
        return Err(ValidationError::new("document_number_invalid_length"));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '/' | '_' | '.'))
    {
        return Err(ValidationError::new("document_number_invalid_characters"));
    }

    Ok(())
}

/// Amounts carry at most two decimal places and fit a `NUMERIC(14, 2)`
/// column. Negative values are allowed (credit notes).
pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if !money::has_amount_precision(*value) {
        return Err(ValidationError::new("amount_too_precise"));
    }
    if !money::is_storable_amount(*value) {
        return Err(ValidationError::new("amount_out_of_range"));
    }
    Ok(())
}

pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_amount(value)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("amount_negative"));
    }
    Ok(())
}

/// VAT rates lie in `[0, 1]` with at most four decimal places.
pub fn validate_vat_rate(value: &Decimal) -> Result<(), ValidationError> {
    if !money::is_valid_rate(*value) {
        return Err(ValidationError::new("vat_rate_out_of_range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(value: &str) -> Decimal {
        Decimal::from_str(value).expect("decimal literal")
    }

    #[test]
    fn document_number_rejects_empty_and_padded() {
        assert!(validate_document_number("").is_err());
        assert!(validate_document_number(" PO-1").is_err());
    }

    #[test]
    fn document_number_rejects_special_chars() {
        assert!(validate_document_number("PO#12").is_err());
    }

    #[test]
    fn document_number_accepts_valid() {
        assert!(validate_document_number("PO-2025/0042").is_ok());
    }

    #[test]
    fn amount_rules() {
        assert!(validate_amount(&d("-100.00")).is_ok());
        assert!(validate_amount(&d("1.001")).is_err());
        assert!(validate_non_negative_amount(&d("0")).is_ok());
        assert!(validate_non_negative_amount(&d("-0.01")).is_err());
    }

    #[test]
    fn amounts_beyond_column_width_are_rejected() {
        let err = validate_amount(&d("50000000000000000000000000000")).expect_err("too large");
        assert_eq!(err.code, "amount_out_of_range");
        assert!(validate_amount(&d("-1000000000000.00")).is_err());
        assert!(validate_non_negative_amount(&d("1000000000000")).is_err());
        assert!(validate_non_negative_amount(&d("999999999999.99")).is_ok());
    }

    #[test]
    fn vat_rate_rules() {
        assert!(validate_vat_rate(&d("0.23")).is_ok());
        assert!(validate_vat_rate(&d("0.135")).is_ok());
        assert!(validate_vat_rate(&d("23")).is_err());
    }
}
