//! # Seed Data Generator
//!
//! Populates the database with sample invoices for development.
//!
//! ## Usage
//! ```bash
//! # Create 10 invoices (default) in the configured database
//! cargo run -p invoicer-db --bin seed
//!
//! # Custom amount
//! cargo run -p invoicer-db --bin seed -- --count 50
//!
//! # Specify database path
//! cargo run -p invoicer-db --bin seed -- --db ./data/invoicer.db
//! ```
//!
//! Invoices get between 1 and 40 line items so that single-page and
//! multi-page layouts both show up. The largest one is assembled at the end
//! and its page breakdown logged.

use chrono::Utc;
use rust_decimal::Decimal;
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use invoicer_core::document::Boilerplate;
use invoicer_core::{InvoiceDraft, LineItem, Party, Unit};
use invoicer_db::{Database, InvoiceService, InvoicerConfig, SequenceAllocator};

/// Sample catalogue: (description, unit, rate in paise)
const CATALOGUE: &[(&str, Unit, i64)] = &[
    ("Mono PERC Solar Panel 540W", Unit::Pcs, 1_450_000),
    ("On-Grid Inverter 5kW", Unit::Set, 4_850_000),
    ("Hybrid Inverter 3kW", Unit::Set, 3_975_050),
    ("DC Cable 4 sq mm", Unit::Mtr, 6_500),
    ("AC Cable 6 sq mm", Unit::Mtr, 9_875),
    ("Mounting Structure GI", Unit::Kw, 450_000),
    ("Earthing Kit", Unit::Set, 320_000),
    ("Lightning Arrester", Unit::Pcs, 275_000),
    ("ACDB / DCDB Box", Unit::Set, 560_000),
    ("Net Meter Installation", Unit::Pcs, 1_200_000),
];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Patel Textiles", "Plot 14, GIDC Pandesara, Surat", "9825012345"),
    ("Shah Residency", "B-402, Vesu Main Road, Surat", "9898123456"),
    ("Gujarat Agro Mills", "Survey 221, Kamrej Char Rasta, Surat", "9714456789"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut count: usize = 10;
    let mut config = InvoicerConfig::load_or_default(None);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database.path = Some(args[i + 1].clone().into());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Invoicer Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of invoices to create (default: 10)");
                println!("  -d, --db <PATH>    Database file path (default: from invoicer.toml)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db_path = config.database_path();
    info!(path = %db_path.display(), count, "Seeding invoices");
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::new(config.db_config()).await?;
    let allocator = SequenceAllocator::new(Arc::new(db.counters()), config.allocator_policy());
    let service = InvoiceService::new(db.clone(), allocator).with_capacity(config.page_capacity()?);

    let start = std::time::Instant::now();
    let mut largest = None;

    for n in 0..count {
        let draft = sample_draft(n);
        let items = draft.items.len();
        match service.create_invoice(draft).await {
            Ok(invoice) => {
                if largest.map_or(true, |(_, len)| items > len) {
                    largest = Some((invoice.id, items));
                }
            }
            Err(e) => warn!(error = %e, "Failed to create sample invoice"),
        }
    }

    info!(
        created = db.invoices().count().await?,
        elapsed = ?start.elapsed(),
        "Seeding complete"
    );

    if let Some((id, items)) = largest {
        let pages = service.render(id, &Boilerplate::default()).await?;
        for page in &pages {
            info!(
                page = page.number,
                of = page.total_pages,
                role = ?page.role,
                items = ?page.items,
                "Layout of largest invoice ({items} items)"
            );
        }
    }

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=invoicer_db=trace` - Trace for this crate only
/// - Default: `info,invoicer=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,invoicer=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Deterministic sample draft; item count cycles through 1..=40.
fn sample_draft(n: usize) -> InvoiceDraft {
    let (name, address, mobile) = CUSTOMERS[n % CUSTOMERS.len()];
    let mut draft = InvoiceDraft::new(Utc::now(), Party::new(name, address, mobile, ""))
        .with_remarks(if n % 3 == 0 { "Installation within 7 days" } else { "" });

    let items = (n * 7) % 40 + 1;
    for k in 0..items {
        let (description, unit, paise) = CATALOGUE[(n + k) % CATALOGUE.len()];
        let quantity = Decimal::from((k % 4 + 1) as u32);
        let mut item = LineItem::new(description, quantity, Decimal::new(paise, 2)).with_unit(unit);
        if k % 5 == 0 {
            item = item.with_discount(Decimal::from(5));
        }
        draft = draft.with_item(item);
    }
    draft
}
