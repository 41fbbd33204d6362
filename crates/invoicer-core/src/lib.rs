//! # invoicer-core: Pure Business Logic for Invoicer
//!
//! Everything that decides what an invoice says: line math, totals,
//! numbering, pagination and page content. No I/O lives here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoicer Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Entry form / HTTP handler / CLI                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ InvoiceDraft                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │       invoicer-db: InvoiceService, SequenceAllocator            │   │
//! │  │       SQLite counters + invoices, migrations, config            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ invoicer-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌────────┐ ┌──────────┐ │   │
//! │  │   │  calc   │ │numbering│ │  layout   │ │document│ │validation│ │   │
//! │  │   │ lines,  │ │ INV-..  │ │ page plan │ │ blocks │ │  rules   │ │   │
//! │  │   │ totals  │ │         │ │           │ │        │ │          │ │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOGGING • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, Party, InvoiceDraft, Invoice, ...)
//! - [`money`] - Decimal money with explicit rounding
//! - [`calc`] - Line item calculator and totals aggregator
//! - [`numbering`] - Invoice number formatting and parsing
//! - [`layout`] - Page layout planner
//! - [`document`] - Page content assembler
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use invoicer_core::{document, layout::PageCapacity, Invoice, InvoiceDraft, LineItem, Party};
//! use rust_decimal::Decimal;
//!
//! let at = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
//! let draft = InvoiceDraft::new(at, Party::new("Acme", "Ring Road, Surat", "9876543210", ""))
//!     .with_item(LineItem::new("Panel", Decimal::from(2), Decimal::from(100)));
//!
//! let invoice = Invoice::issue(draft, 1, at).unwrap();
//! assert_eq!(invoice.invoice_no, "INV-202405-1");
//!
//! let pages = document::assemble(&invoice, &Default::default(), PageCapacity::default()).unwrap();
//! assert_eq!(pages.len(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calc;
pub mod document;
pub mod error;
pub mod layout;
pub mod money;
pub mod numbering;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Item rows that fit on one page (`P`).
pub const ROWS_PER_PAGE: usize = 15;

/// Rows the identity block takes on the first page (`R`).
pub const FIRST_PAGE_RESERVED_ROWS: usize = 2;

/// Tax percent a new line item starts with.
pub const DEFAULT_TAX_PERCENT: u32 = 18;

/// HSN/SAC code a new line item starts with.
pub const DEFAULT_CLASSIFICATION_CODE: &str = "995468";
