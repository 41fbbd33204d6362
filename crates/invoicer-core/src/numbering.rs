//! # Invoice Numbering
//!
//! Formats `(scope, sequence)` pairs as invoice numbers and parses them back.
//!
//! ## Format
//! ```text
//! INV-{YYYY}{MM}-{sequence}
//!      │     │    └── unpadded, from the sequence allocator
//!      │     └── zero-padded month
//!      └── four-digit year
//!
//! scope 2024-05, seq 1   →  INV-202405-1
//! scope 2024-05, seq 12  →  INV-202405-12
//! ```
//!
//! Uniqueness comes from the allocator handing out each `(scope, seq)` pair
//! once; the formatter only has to be injective, which the fixed-width
//! `YYYYMM` block guarantees.

use crate::error::{CoreError, CoreResult};
use crate::types::SequenceScope;

/// Prefix of every invoice number.
pub const INVOICE_NUMBER_PREFIX: &str = "INV";

/// Formats an invoice number.
///
/// ## Example
/// ```rust
/// use invoicer_core::numbering::format_invoice_number;
/// use invoicer_core::SequenceScope;
///
/// let scope = SequenceScope::new(2024, 5).unwrap();
/// assert_eq!(format_invoice_number(scope, 2), "INV-202405-2");
/// ```
pub fn format_invoice_number(scope: SequenceScope, sequence: u64) -> String {
    format!(
        "{}-{:04}{:02}-{}",
        INVOICE_NUMBER_PREFIX,
        scope.year(),
        scope.month(),
        sequence
    )
}

/// Parses an invoice number back into its scope and sequence.
pub fn parse_invoice_number(invoice_no: &str) -> CoreResult<(SequenceScope, u64)> {
    let invalid = || CoreError::InvalidInvoiceNumber(invoice_no.to_string());

    let mut parts = invoice_no.split('-');
    let (prefix, period, seq) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(period), Some(seq), None) => (prefix, period, seq),
        _ => return Err(invalid()),
    };

    if prefix != INVOICE_NUMBER_PREFIX || period.len() != 6 {
        return Err(invalid());
    }
    if !period.bytes().all(|b| b.is_ascii_digit()) || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    // Unpadded: "01" would alias "1"
    if seq.is_empty() || (seq.len() > 1 && seq.starts_with('0')) {
        return Err(invalid());
    }

    let year: i32 = period[..4].parse().map_err(|_| invalid())?;
    let month: u32 = period[4..].parse().map_err(|_| invalid())?;
    let scope = SequenceScope::new(year, month).map_err(|_| invalid())?;
    let sequence: u64 = seq.parse().map_err(|_| invalid())?;

    Ok((scope, sequence))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sequential_numbers_in_scope() {
        let scope: SequenceScope = "2024-05".parse().unwrap();
        assert_eq!(format_invoice_number(scope, 1), "INV-202405-1");
        assert_eq!(format_invoice_number(scope, 2), "INV-202405-2");
    }

    #[test]
    fn test_month_is_zero_padded() {
        let scope = SequenceScope::new(2025, 1).unwrap();
        assert_eq!(format_invoice_number(scope, 10), "INV-202501-10");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "INV-202405",
            "INV-202405-",
            "INV-202405-01",
            "INV-2024-05-1",
            "BILL-202405-1",
            "INV-202413-1",
            "INV-20245-1",
            "INV-202405-1a",
        ] {
            assert!(parse_invoice_number(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_roundtrip_example() {
        let (scope, seq) = parse_invoice_number("INV-202405-12").unwrap();
        assert_eq!(scope.key(), "2024-05");
        assert_eq!(seq, 12);
    }

    fn scope_strategy() -> impl Strategy<Value = SequenceScope> {
        (1000i32..=9999, 1u32..=12).prop_map(|(y, m)| SequenceScope::new(y, m).unwrap())
    }

    proptest! {
        #[test]
        fn format_is_injective(
            a in (scope_strategy(), 0u64..1_000_000),
            b in (scope_strategy(), 0u64..1_000_000),
        ) {
            let fa = format_invoice_number(a.0, a.1);
            let fb = format_invoice_number(b.0, b.1);
            prop_assert_eq!(fa == fb, a == b);
        }

        #[test]
        fn format_is_stable_and_parses_back(scope in scope_strategy(), seq in 0u64..u64::MAX) {
            let first = format_invoice_number(scope, seq);
            prop_assert_eq!(&first, &format_invoice_number(scope, seq));
            prop_assert_eq!(parse_invoice_number(&first).unwrap(), (scope, seq));
        }
    }
}
