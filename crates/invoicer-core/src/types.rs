//! # Domain Types
//!
//! Core domain types used throughout Invoicer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   issue()    ┌─────────────────┐                  │
//! │  │  InvoiceDraft   │ ───────────► │     Invoice     │                  │
//! │  │  ─────────────  │  + sequence  │  ─────────────  │                  │
//! │  │  date           │              │  id (UUID)      │                  │
//! │  │  receiver       │              │  invoice_no     │                  │
//! │  │  consignee      │              │  scope + seq    │                  │
//! │  │  items          │              │  items, totals  │                  │
//! │  │  (no number!)   │              │                 │                  │
//! │  └─────────────────┘              └─────────────────┘                  │
//! │                                                                         │
//! │  ┌─────────────────┐   compute()  ┌─────────────────┐  aggregate()     │
//! │  │    LineItem     │ ───────────► │ComputedLineItem │ ──────► Totals   │
//! │  └─────────────────┘              └─────────────────┘                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two-Phase Construction
//! A draft is never numbered and never persisted. An [`Invoice`] can only be
//! produced from a draft plus a sequence number, so an invoice without a
//! number is not representable.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::calc;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::numbering;
use crate::{DEFAULT_CLASSIFICATION_CODE, DEFAULT_TAX_PERCENT};

// =============================================================================
// Unit
// =============================================================================

/// Unit of measure for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    /// Pieces.
    #[default]
    Pcs,
    /// Sets.
    Set,
    /// Kilowatts.
    Kw,
    /// Metres.
    Mtr,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Pcs => "PCS",
            Unit::Set => "SET",
            Unit::Kw => "KW",
            Unit::Mtr => "MTR",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PCS" => Ok(Unit::Pcs),
            "SET" => Ok(Unit::Set),
            "KW" => Ok(Unit::Kw),
            "MTR" => Ok(Unit::Mtr),
            other => Err(ValidationError::InvalidFormat {
                field: "unit".to_string(),
                reason: format!("unknown unit '{other}', expected one of PCS, SET, KW, MTR"),
            }),
        }
    }
}

// =============================================================================
// Party
// =============================================================================

/// Identity block for the receiver (bill-to) or consignee (ship-to).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub address: String,
    pub mobile: String,
    /// GSTIN.
    pub tax_id: String,
}

impl Party {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        mobile: impl Into<String>,
        tax_id: impl Into<String>,
    ) -> Self {
        Party {
            name: name.into(),
            address: address.into(),
            mobile: mobile.into(),
            tax_id: tax_id.into(),
        }
    }

    /// True when every field is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        [&self.name, &self.address, &self.mobile, &self.tax_id]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One billable entry on an invoice.
///
/// Callers guarantee `quantity >= 0`, `rate >= 0` and both percents in
/// `0..=100`; see [`crate::validation::validate_line_item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    /// HSN / SAC classification code.
    pub code: String,
    pub quantity: Decimal,
    pub unit: Unit,
    pub rate: Money,
    pub discount_percent: Decimal,
    pub tax_percent: Decimal,
}

impl LineItem {
    /// Creates an item with the entry-form defaults: code `995468`, unit
    /// PCS, no discount, 18% tax.
    pub fn new(description: impl Into<String>, quantity: Decimal, rate: Decimal) -> Self {
        LineItem {
            description: description.into(),
            code: DEFAULT_CLASSIFICATION_CODE.to_string(),
            quantity,
            unit: Unit::default(),
            rate: Money::new(rate),
            discount_percent: Decimal::ZERO,
            tax_percent: Decimal::from(DEFAULT_TAX_PERCENT),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_discount(mut self, percent: Decimal) -> Self {
        self.discount_percent = percent;
        self
    }

    pub fn with_tax(mut self, percent: Decimal) -> Self {
        self.tax_percent = percent;
        self
    }
}

/// A line item together with its derived amounts.
///
/// Always produced by [`calc::compute`]; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputedLineItem {
    pub item: LineItem,
    pub gross: Money,
    pub discount_amount: Money,
    pub taxable: Money,
    pub tax_amount: Money,
    pub line_total: Money,
}

// =============================================================================
// Totals
// =============================================================================

/// Invoice totals, rounded to 2 places.
///
/// `total_amount == taxable_value + gst_amount` holds exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub taxable_value: Money,
    pub gst_amount: Money,
    pub total_amount: Money,
}

// =============================================================================
// Sequence Scope
// =============================================================================

/// A numbering period: invoices are numbered independently per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawScope")]
pub struct SequenceScope {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawScope {
    year: i32,
    month: u32,
}

impl TryFrom<RawScope> for SequenceScope {
    type Error = CoreError;

    fn try_from(raw: RawScope) -> CoreResult<Self> {
        SequenceScope::new(raw.year, raw.month)
    }
}

impl SequenceScope {
    /// Creates a scope; the year must have 4 digits and the month be 1-12.
    pub fn new(year: i32, month: u32) -> CoreResult<Self> {
        if !(1000..=9999).contains(&year) {
            return Err(CoreError::InvalidScope(format!(
                "year {year} must have four digits"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidScope(format!(
                "month {month} must be between 1 and 12"
            )));
        }
        Ok(SequenceScope { year, month })
    }

    /// The scope a given calendar date falls into.
    ///
    /// Dates outside years 1000-9999 have no scope.
    pub fn from_date(date: NaiveDate) -> CoreResult<Self> {
        Self::new(date.year(), date.month())
    }

    /// The scope a timestamp falls into (UTC calendar).
    pub fn from_datetime(at: DateTime<Utc>) -> CoreResult<Self> {
        Self::from_date(at.date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Counter key, e.g. `2024-05`.
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for SequenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for SequenceScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidScope(format!("'{s}' is not a YYYY-MM key"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        SequenceScope::new(year, month)
    }
}

// =============================================================================
// Invoice Draft
// =============================================================================

/// An invoice before it has a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub date: DateTime<Utc>,
    pub receiver: Party,
    /// May be blank.
    #[serde(default)]
    pub consignee: Party,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub remarks: String,
}

impl InvoiceDraft {
    pub fn new(date: DateTime<Utc>, receiver: Party) -> Self {
        InvoiceDraft {
            date,
            receiver,
            consignee: Party::default(),
            items: Vec::new(),
            remarks: String::new(),
        }
    }

    pub fn with_consignee(mut self, consignee: Party) -> Self {
        self.consignee = consignee;
        self
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    /// The numbering scope this draft will be issued under.
    pub fn scope(&self) -> CoreResult<SequenceScope> {
        SequenceScope::from_datetime(self.date)
    }

    pub fn totals(&self) -> Totals {
        calc::aggregate(&calc::compute_all(&self.items))
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A numbered invoice, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_no: String,
    pub scope: SequenceScope,
    pub sequence: u64,
    pub date: DateTime<Utc>,
    pub receiver: Party,
    pub consignee: Party,
    pub items: Vec<LineItem>,
    pub totals: Totals,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Turns a draft into an invoice using an allocated sequence.
    ///
    /// Totals are recomputed from the items; anything the caller computed
    /// earlier is ignored.
    ///
    /// ## Errors
    /// `CoreError::InvalidScope` if the draft date has no numbering scope.
    pub fn issue(draft: InvoiceDraft, sequence: u64, created_at: DateTime<Utc>) -> CoreResult<Self> {
        let scope = draft.scope()?;
        let totals = draft.totals();
        Ok(Invoice {
            id: Uuid::new_v4(),
            invoice_no: numbering::format_invoice_number(scope, sequence),
            scope,
            sequence,
            date: draft.date,
            receiver: draft.receiver,
            consignee: draft.consignee,
            items: draft.items,
            totals,
            remarks: draft.remarks,
            created_at,
        })
    }

    /// Line items with derived amounts, recomputed on every call.
    pub fn computed_items(&self) -> Vec<ComputedLineItem> {
        calc::compute_all(&self.items)
    }

    /// Totals recomputed from the items.
    pub fn recompute_totals(&self) -> Totals {
        calc::aggregate(&self.computed_items())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
