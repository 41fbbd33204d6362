//! # Invoice Repository
//!
//! Stores issued invoices. Invoices are immutable once inserted; there is
//! no update or delete.
//!
//! Parties and items are JSON text columns, amounts are decimal strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use invoicer_core::{Invoice, Money, SequenceScope, Totals};

use crate::error::{DbError, DbResult};

const SELECT_INVOICE: &str = r#"
    SELECT
        id, invoice_no, invoice_year, invoice_month, invoice_seq,
        date, receiver, consignee, items,
        taxable_value, gst_amount, total_amount,
        remarks, created_at
    FROM invoices
"#;

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw `invoices` row.
#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_no: String,
    invoice_year: i64,
    invoice_month: i64,
    invoice_seq: i64,
    date: DateTime<Utc>,
    receiver: String,
    consignee: String,
    items: String,
    taxable_value: String,
    gst_amount: String,
    total_amount: String,
    remarks: String,
    created_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self) -> DbResult<Invoice> {
        let year = i32::try_from(self.invoice_year).map_err(|e| DbError::decode("invoice_year", e))?;
        let month =
            u32::try_from(self.invoice_month).map_err(|e| DbError::decode("invoice_month", e))?;
        let scope =
            SequenceScope::new(year, month).map_err(|e| DbError::decode("invoice_month", e))?;

        Ok(Invoice {
            id: Uuid::parse_str(&self.id).map_err(|e| DbError::decode("id", e))?,
            invoice_no: self.invoice_no,
            scope,
            sequence: u64::try_from(self.invoice_seq)
                .map_err(|e| DbError::decode("invoice_seq", e))?,
            date: self.date,
            receiver: serde_json::from_str(&self.receiver)?,
            consignee: serde_json::from_str(&self.consignee)?,
            items: serde_json::from_str(&self.items)?,
            totals: Totals {
                taxable_value: money("taxable_value", &self.taxable_value)?,
                gst_amount: money("gst_amount", &self.gst_amount)?,
                total_amount: money("total_amount", &self.total_amount)?,
            },
            remarks: self.remarks,
            created_at: self.created_at,
        })
    }
}

fn money(column: &str, raw: &str) -> DbResult<Money> {
    Decimal::from_str(raw)
        .map(Money::new)
        .map_err(|e| DbError::decode(column, e))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Inserts an issued invoice.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` with the invoice number as value if the
    /// number, or its `(year, month, seq)` triple, is already stored.
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(id = %invoice.id, invoice_no = %invoice.invoice_no, "Inserting invoice");

        let sequence = i64::try_from(invoice.sequence)
            .map_err(|e| DbError::decode("invoice_seq", e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_no, invoice_year, invoice_month, invoice_seq,
                date, receiver, consignee, items,
                taxable_value, gst_amount, total_amount,
                remarks, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14
            )
            "#,
        )
        .bind(invoice.id.to_string())
        .bind(&invoice.invoice_no)
        .bind(i64::from(invoice.scope.year()))
        .bind(i64::from(invoice.scope.month()))
        .bind(sequence)
        .bind(invoice.date)
        .bind(serde_json::to_string(&invoice.receiver)?)
        .bind(serde_json::to_string(&invoice.consignee)?)
        .bind(serde_json::to_string(&invoice.items)?)
        .bind(invoice.totals.taxable_value.to_string())
        .bind(invoice.totals.gst_amount.to_string())
        .bind(invoice.totals.total_amount.to_string())
        .bind(&invoice.remarks)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => {
                    Err(DbError::duplicate(field, invoice.invoice_no.clone()))
                }
                other => Err(other),
            },
        }
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> =
            sqlx::query_as(&format!("{SELECT_INVOICE} WHERE id = ?1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(InvoiceRow::into_invoice).transpose()
    }

    /// Gets an invoice by its number, e.g. `INV-202405-1`.
    pub async fn get_by_number(&self, invoice_no: &str) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> =
            sqlx::query_as(&format!("{SELECT_INVOICE} WHERE invoice_no = ?1"))
                .bind(invoice_no)
                .fetch_optional(&self.pool)
                .await?;

        row.map(InvoiceRow::into_invoice).transpose()
    }

    /// All invoices in a scope, in sequence order.
    pub async fn list_by_scope(&self, scope: SequenceScope) -> DbResult<Vec<Invoice>> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "{SELECT_INVOICE} WHERE invoice_year = ?1 AND invoice_month = ?2 ORDER BY invoice_seq"
        ))
        .bind(i64::from(scope.year()))
        .bind(i64::from(scope.month()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InvoiceRow::into_invoice).collect()
    }

    /// Counts stored invoices.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
