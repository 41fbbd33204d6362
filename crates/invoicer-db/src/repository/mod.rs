//! # Repository Module
//!
//! Database repository implementations for Invoicer.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  InvoiceService                                                         │
//! │       │                                                                 │
//! │       │  db.invoices().get_by_number("INV-202405-1")                    │
//! │       ▼                                                                 │
//! │  InvoiceRepository                  CounterRepository                   │
//! │  ├── insert(&invoice)               ├── increment(scope)  (upsert)      │
//! │  ├── get_by_id(id)                  └── current(scope)                  │
//! │  ├── get_by_number(no)                                                  │
//! │  ├── list_by_scope(scope)                                               │
//! │  └── count()                                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CounterRepository`](counter::CounterRepository) - Per-scope sequence counters
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Issued invoices

pub mod counter;
pub mod invoice;
