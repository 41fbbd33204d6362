//! # Validation Module
//!
//! Input validation for invoice drafts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Entry form                                                    │
//! │  ├── Required fields, lengths, mobile format                            │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: InvoiceService::create_invoice                                │
//! │  └── THIS MODULE: same rules, run before a number is allocated          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL constraints                                               │
//! │  └── UNIQUE (invoice_no), UNIQUE (year, month, seq)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation runs before allocation, so a rejected draft never consumes a
//! sequence number.
//!
//! ## Usage
//! ```rust
//! use invoicer_core::validation::{validate_line_item, validate_mobile};
//! use invoicer_core::LineItem;
//! use rust_decimal::Decimal;
//!
//! validate_mobile("mobile", "9876543210").unwrap();
//! assert!(validate_mobile("mobile", "98765").is_err());
//!
//! let item = LineItem::new("Solar panel", Decimal::from(2), Decimal::from(100));
//! validate_line_item(&item).unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{InvoiceDraft, LineItem, Party};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum length of a party name.
pub const MIN_NAME_LEN: usize = 2;

/// Minimum length of a party address.
pub const MIN_ADDRESS_LEN: usize = 10;

/// Digits in a mobile number.
pub const MOBILE_DIGITS: usize = 10;

/// Largest accepted line quantity.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest accepted unit rate.
///
/// With [`MAX_QUANTITY`] this keeps `quantity * rate * percent` far inside
/// `Decimal`'s range, so the calculator cannot overflow.
pub const MAX_RATE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

// =============================================================================
// Field Validators
// =============================================================================

/// Rejects blank values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Requires at least `min` characters after trimming.
pub fn validate_min_len(field: &str, value: &str, min: usize) -> ValidationResult<()> {
    validate_required(field, value)?;
    if value.trim().chars().count() < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    Ok(())
}

/// Requires exactly ten ASCII digits.
pub fn validate_mobile(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;
    let value = value.trim();
    if value.len() != MOBILE_DIGITS || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must be exactly {MOBILE_DIGITS} digits"),
        });
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, value: Decimal) -> ValidationResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Requires `value <= max`.
pub fn validate_max(field: &str, value: Decimal, max: Decimal) -> ValidationResult<()> {
    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Requires `0 <= value <= 100`.
pub fn validate_percent(field: &str, value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Checks a line item against the calculator's preconditions.
pub fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    validate_required("description", &item.description)?;
    validate_non_negative("quantity", item.quantity)?;
    validate_max("quantity", item.quantity, MAX_QUANTITY)?;
    validate_non_negative("rate", item.rate.amount())?;
    validate_max("rate", item.rate.amount(), MAX_RATE)?;
    validate_percent("discount_percent", item.discount_percent)?;
    validate_percent("tax_percent", item.tax_percent)?;
    Ok(())
}

/// Checks a party's identity fields. The tax id is free-form.
pub fn validate_party(party: &Party) -> ValidationResult<()> {
    validate_min_len("name", &party.name, MIN_NAME_LEN)?;
    validate_min_len("address", &party.address, MIN_ADDRESS_LEN)?;
    validate_mobile("mobile", &party.mobile)?;
    Ok(())
}

/// Validates a whole draft before it is numbered.
///
/// ## Rules
/// - Receiver must pass [`validate_party`]
/// - Consignee is optional; when any field is filled it must pass too
/// - At least one line item, each passing [`validate_line_item`]
/// - The date must fall in a numbering scope (years 1000-9999)
///
/// ## Errors
/// - `CoreError::InvalidScope` when the date has no numbering scope
/// - `CoreError::Validation` for party and empty-items failures, with the
///   field prefixed (`receiver.mobile`)
/// - `CoreError::InvalidLineItem` with the zero-based index of the first
///   bad item
pub fn validate_draft(draft: &InvoiceDraft) -> CoreResult<()> {
    draft.scope()?;

    validate_party(&draft.receiver).map_err(|e| e.within("receiver."))?;

    if !draft.consignee.is_blank() {
        validate_party(&draft.consignee).map_err(|e| e.within("consignee."))?;
    }

    if draft.items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        }
        .into());
    }

    for (index, item) in draft.items.iter().enumerate() {
        validate_line_item(item).map_err(|e| CoreError::InvalidLineItem {
            index,
            reason: e.to_string(),
        })?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn receiver() -> Party {
        Party::new("Acme Solar", "Ring Road, Surat", "9876543210", "")
    }

    fn draft() -> InvoiceDraft {
        let at = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
        InvoiceDraft::new(at, receiver()).with_item(LineItem::new("Panel", dec!(1), dec!(100)))
    }

    #[test]
    fn test_mobile() {
        assert!(validate_mobile("mobile", "9876543210").is_ok());
        assert!(validate_mobile("mobile", " 9876543210 ").is_ok());
        assert!(validate_mobile("mobile", "987654321").is_err());
        assert!(validate_mobile("mobile", "98765432101").is_err());
        assert!(validate_mobile("mobile", "98765-4321").is_err());
        assert!(matches!(
            validate_mobile("mobile", ""),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_min_len() {
        assert!(validate_min_len("name", "Al", 2).is_ok());
        assert!(matches!(
            validate_min_len("name", " A ", 2),
            Err(ValidationError::TooShort { min: 2, .. })
        ));
    }

    #[test]
    fn test_percent_bounds() {
        assert!(validate_percent("tax", dec!(0)).is_ok());
        assert!(validate_percent("tax", dec!(100)).is_ok());
        assert!(validate_percent("tax", dec!(100.01)).is_err());
        assert!(validate_percent("tax", dec!(-0.5)).is_err());
    }

    #[test]
    fn test_line_item_rules() {
        let ok = LineItem::new("Panel", dec!(0), dec!(0));
        assert!(validate_line_item(&ok).is_ok());

        let blank = LineItem::new("  ", dec!(1), dec!(1));
        assert!(matches!(
            validate_line_item(&blank),
            Err(ValidationError::Required { .. })
        ));

        let negative = LineItem::new("Panel", dec!(-1), dec!(1));
        assert!(matches!(
            validate_line_item(&negative),
            Err(ValidationError::Negative { .. })
        ));

        let discount = LineItem::new("Panel", dec!(1), dec!(1)).with_discount(dec!(120));
        assert!(validate_line_item(&discount).is_err());
    }

    #[test]
    fn test_magnitude_caps() {
        assert_eq!(MAX_QUANTITY, Decimal::from(1_000_000_000u64));
        assert_eq!(MAX_RATE, Decimal::from(1_000_000_000_000u64));

        let at_caps = LineItem::new("Panel", MAX_QUANTITY, MAX_RATE).with_discount(dec!(100));
        assert!(validate_line_item(&at_caps).is_ok());
        let computed = crate::calc::compute(&at_caps);
        assert!(computed.taxable.is_zero());

        let huge_qty = Decimal::from(1_000_000_000_000_000u64);
        let huge = LineItem::new("Panel", huge_qty, huge_qty);
        assert!(matches!(
            validate_line_item(&huge),
            Err(ValidationError::OutOfRange { .. })
        ));
        let huge_rate = LineItem::new("Panel", dec!(1), MAX_RATE + dec!(0.01));
        assert!(validate_line_item(&huge_rate).is_err());
    }

    #[test]
    fn test_draft_outside_numbering_years_rejected() {
        let mut d = draft();
        d.date = Utc.with_ymd_and_hms(999, 5, 10, 9, 0, 0).unwrap();
        assert!(matches!(
            validate_draft(&d),
            Err(CoreError::InvalidScope(_))
        ));

        d.date = Utc.with_ymd_and_hms(1000, 1, 1, 0, 0, 0).unwrap();
        assert!(validate_draft(&d).is_ok());
    }

    #[test]
    fn test_valid_draft() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn test_blank_consignee_is_skipped() {
        let d = draft().with_consignee(Party::new("", " ", "", ""));
        assert!(validate_draft(&d).is_ok());
    }

    #[test]
    fn test_partial_consignee_is_checked() {
        let d = draft().with_consignee(Party::new("Site B", "", "", ""));
        let err = validate_draft(&d).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: consignee.address is required"
        );
    }

    #[test]
    fn test_receiver_errors_are_prefixed() {
        let mut d = draft();
        d.receiver.mobile = "123".to_string();
        let err = validate_draft(&d).unwrap_err();
        assert!(err.to_string().contains("receiver.mobile"));
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut d = draft();
        d.items.clear();
        assert!(matches!(
            validate_draft(&d),
            Err(CoreError::Validation(ValidationError::Empty { .. }))
        ));
    }

    #[test]
    fn test_bad_item_reports_index() {
        let d = draft().with_item(LineItem::new("Inverter", dec!(1), dec!(1)).with_tax(dec!(101)));
        match validate_draft(&d) {
            Err(CoreError::InvalidLineItem { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("tax_percent"));
            }
            other => panic!("expected InvalidLineItem, got {other:?}"),
        }
    }
}
