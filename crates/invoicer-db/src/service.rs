//! # Invoice Service
//!
//! Creates, fetches and lays out invoices.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_invoice(draft)                                                  │
//! │       │                                                                 │
//! │       ├── validate_draft ─────────── fail → Validation / InvalidLineItem│
//! │       │                               (no number consumed)              │
//! │       ▼                                                                 │
//! │  allocator.allocate(scope) ───────── fail → AllocationFailed            │
//! │       │  (exactly once)               (nothing persisted)               │
//! │       ▼                                                                 │
//! │  Invoice::issue(draft, seq) → number + recomputed totals                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  invoices().insert ──────────────── unique violation → Duplicate...     │
//! │       │                             other failure → Database            │
//! │       │                             (seq is now a permanent gap)        │
//! │       ▼                                                                 │
//! │  Ok(invoice)                                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use invoicer_core::document::{self, Boilerplate, PageContent};
use invoicer_core::layout::PageCapacity;
use invoicer_core::{numbering, validation};
use invoicer_core::{CoreError, Invoice, InvoiceDraft, SequenceScope, ValidationError};

use crate::allocator::{AllocationError, SequenceAllocator};
use crate::error::DbError;
use crate::pool::Database;

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced to callers of the invoice service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No sequence number could be obtained. Nothing was persisted.
    #[error(transparent)]
    AllocationFailed(#[from] AllocationError),

    /// The store already holds this number. Means the counter store handed
    /// out a value twice; never retried.
    #[error("Invoice number {0} already exists")]
    DuplicateInvoiceNumber(String),

    #[error("Invalid line item at position {index}: {reason}")]
    InvalidLineItem { index: usize, reason: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invoice not found: {0}")]
    NotFound(String),

    /// Page planning produced an inconsistent layout.
    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidLineItem { index, reason } => {
                ServiceError::InvalidLineItem { index, reason }
            }
            CoreError::Validation(e) => ServiceError::Validation(e),
            CoreError::LayoutInvariantViolation(msg) => ServiceError::Layout(msg),
            e @ CoreError::InvalidCapacity { .. } => ServiceError::Layout(e.to_string()),
            CoreError::InvalidScope(reason) => ServiceError::Validation(ValidationError::InvalidFormat {
                field: "date".to_string(),
                reason,
            }),
            CoreError::InvalidInvoiceNumber(value) => {
                ServiceError::Validation(ValidationError::InvalidFormat {
                    field: "invoice_no".to_string(),
                    reason: format!("'{value}' is not an invoice number"),
                })
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Service
// =============================================================================

/// Invoice operations over an explicit database handle and allocator.
#[derive(Debug, Clone)]
pub struct InvoiceService {
    db: Database,
    allocator: SequenceAllocator,
    capacity: PageCapacity,
}

impl InvoiceService {
    pub fn new(db: Database, allocator: SequenceAllocator) -> Self {
        InvoiceService {
            db,
            allocator,
            capacity: PageCapacity::default(),
        }
    }

    /// Overrides the page capacity used by [`render`](Self::render).
    pub fn with_capacity(mut self, capacity: PageCapacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Validates, numbers and stores a draft.
    ///
    /// Allocation happens exactly once per call. If the insert fails after
    /// that, the sequence number stays consumed.
    pub async fn create_invoice(&self, draft: InvoiceDraft) -> ServiceResult<Invoice> {
        validation::validate_draft(&draft)?;

        let scope = draft.scope()?;
        let sequence = self.allocator.allocate(scope).await?;
        let invoice = Invoice::issue(draft, sequence, Utc::now())?;

        match self.db.invoices().insert(&invoice).await {
            Ok(()) => {
                info!(
                    id = %invoice.id,
                    invoice_no = %invoice.invoice_no,
                    items = invoice.items.len(),
                    total = %invoice.totals.total_amount,
                    "Invoice created"
                );
                Ok(invoice)
            }
            Err(DbError::UniqueViolation { field, .. }) => {
                error!(
                    invoice_no = %invoice.invoice_no,
                    %scope,
                    sequence,
                    %field,
                    "Allocated invoice number already stored; counter store is not atomic"
                );
                Err(ServiceError::DuplicateInvoiceNumber(invoice.invoice_no))
            }
            Err(e) => {
                warn!(
                    invoice_no = %invoice.invoice_no,
                    %scope,
                    sequence,
                    error = %e,
                    "Invoice insert failed; sequence number left as a gap"
                );
                Err(ServiceError::Database(e))
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Invoice> {
        self.db
            .invoices()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Looks up an invoice by number. Malformed numbers are rejected
    /// before touching the database.
    pub async fn get_by_number(&self, invoice_no: &str) -> ServiceResult<Invoice> {
        numbering::parse_invoice_number(invoice_no)?;
        self.db
            .invoices()
            .get_by_number(invoice_no)
            .await?
            .ok_or_else(|| ServiceError::NotFound(invoice_no.to_string()))
    }

    /// Invoices in `scope`, in sequence order.
    pub async fn list_for_scope(&self, scope: SequenceScope) -> ServiceResult<Vec<Invoice>> {
        Ok(self.db.invoices().list_by_scope(scope).await?)
    }

    /// Loads an invoice and assembles its pages.
    ///
    /// Totals are recomputed from the stored items.
    pub async fn render(
        &self,
        id: Uuid,
        boilerplate: &Boilerplate,
    ) -> ServiceResult<Vec<PageContent>> {
        let mut invoice = self.get(id).await?;

        let totals = invoice.recompute_totals();
        if totals != invoice.totals {
            warn!(
                invoice_no = %invoice.invoice_no,
                stored = %invoice.totals.total_amount,
                recomputed = %totals.total_amount,
                "Stored totals differ from items; using recomputed totals"
            );
            invoice.totals = totals;
        }

        let pages = document::assemble(&invoice, boilerplate, self.capacity)?;
        info!(invoice_no = %invoice.invoice_no, pages = pages.len(), "Invoice assembled");
        Ok(pages)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
