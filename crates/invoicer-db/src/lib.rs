//! # invoicer-db: Database Layer for Invoicer
//!
//! Persistence, sequence allocation and the invoice service.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoicer Data Flow                               │
//! │                                                                         │
//! │  Caller (form handler, CLI, seed binary)                                │
//! │       │  InvoiceDraft                                                   │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   invoicer-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌─────────────────┐   ┌──────────────┐    │   │
//! │  │   │ InvoiceService│──►│SequenceAllocator│──►│ CounterStore │    │   │
//! │  │   │ (service.rs)  │   │ (allocator.rs)  │   │  (trait)     │    │   │
//! │  │   └───────┬───────┘   └─────────────────┘   └──────┬───────┘    │   │
//! │  │           │                                        │            │   │
//! │  │   ┌───────▼───────┐   ┌─────────────────┐   ┌──────▼───────┐    │   │
//! │  │   │   Database    │──►│InvoiceRepository│   │CounterRepo / │    │   │
//! │  │   │   (pool.rs)   │   │                 │   │InMemoryStore │    │   │
//! │  │   └───────────────┘   └─────────────────┘   └──────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite: sequence_counters, invoices  (migrations/sqlite)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Counter and invoice repositories
//! - [`allocator`] - Sequence allocation with retry and timeout
//! - [`service`] - Invoice creation, lookup and page assembly
//! - [`config`] - TOML + environment configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use invoicer_db::{Database, InvoiceService, InvoicerConfig, SequenceAllocator};
//!
//! let config = InvoicerConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//! let allocator = SequenceAllocator::new(Arc::new(db.counters()), config.allocator_policy());
//! let service = InvoiceService::new(db, allocator).with_capacity(config.page_capacity()?);
//!
//! let invoice = service.create_invoice(draft).await?;
//! println!("{}", invoice.invoice_no); // INV-202405-1
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use allocator::{
    AllocationError, AllocatorPolicy, CounterStore, InMemoryCounterStore, SequenceAllocator,
};
pub use config::{ConfigError, InvoicerConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{InvoiceService, ServiceError, ServiceResult};

// Repository re-exports for convenience
pub use repository::counter::CounterRepository;
pub use repository::invoice::InvoiceRepository;
