//! # Document Assembler
//!
//! Turns an invoice into an ordered list of pages, each an ordered list of
//! content blocks. The output is plain data handed to a renderer; nothing
//! here knows about bytes, fonts or pixels.
//!
//! ## Page State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   FIRST ──────► MIDDLE ──► MIDDLE ──► ... ──────► LAST                  │
//! │     │                                               ▲                   │
//! │     └──────────── (1 page: FIRST and LAST) ─────────┘                   │
//! │                                                                         │
//! │  every page : Header                                                    │
//! │  FIRST      : Parties, ItemTable (with column header)                   │
//! │  not FIRST  : Continuation, ItemTable (rows only)                       │
//! │  LAST       : Totals, Remarks?, BankDetails, Terms, CompanyDetails,     │
//! │               Signatures, Footer                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pages are visited strictly by index; there is no backtracking.

use rust_decimal::Decimal;
use serde::Serialize;
use std::ops::Range;

use crate::calc;
use crate::error::CoreResult;
use crate::layout::{self, PageCapacity, PageDescriptor};
use crate::money::Money;
use crate::types::{ComputedLineItem, Invoice, Party, Unit};

// =============================================================================
// Boilerplate
// =============================================================================

/// A signature slot printed at the bottom of the last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureSlot {
    pub label: String,
    pub caption: String,
}

/// Static business text owned by the caller (letterhead, bank, terms).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Boilerplate {
    pub title: String,
    pub issuer_address: String,
    pub bank_details: Vec<String>,
    pub terms: Vec<String>,
    pub company_details: Vec<String>,
    pub signatures: Vec<SignatureSlot>,
    pub thank_you_note: String,
    /// Currency name used in the amount-in-words line.
    pub currency_name: String,
    /// Short label for the tax row, e.g. `GST`.
    pub tax_label: String,
}

impl Default for Boilerplate {
    fn default() -> Self {
        let lines = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Boilerplate {
            title: "TAX INVOICE".to_string(),
            issuer_address: "UG 12, Shree Krishna AC Mall, Dindoli, Surat, Gujarat 394210"
                .to_string(),
            bank_details: lines(&[
                "Account: Sunburn Renewable Energy",
                "Bank: Bank of Baroda",
                "A/C: 26690200002271",
                "IFSC: BARB0DUMSUR",
                "Branch: Puna Kumbhariya",
            ]),
            terms: lines(&[
                "Goods once sold cannot be returned",
                "Warranty as per manufacturer terms",
                "Taxes as applicable by government",
                "Payment within 15 days",
                "Late payment interest @18% p.a.",
            ]),
            company_details: lines(&[
                "Sunburn Renewable Energy",
                "GSTIN: 24FIHPR5445A1ZC",
                "PAN: FIHPR5445A",
                "State: Surat, Gujarat (24)",
            ]),
            signatures: vec![
                SignatureSlot {
                    label: "For Solar Solutions Pro".to_string(),
                    caption: "Authorized Signatory".to_string(),
                },
                SignatureSlot {
                    label: "Customer Acceptance".to_string(),
                    caption: "Signature with Seal".to_string(),
                },
            ],
            thank_you_note:
                "Thank you for your business! We value your trust and look forward to serving you again."
                    .to_string(),
            currency_name: "Rupees".to_string(),
            tax_label: "GST".to_string(),
        }
    }
}

// =============================================================================
// Content Blocks
// =============================================================================

/// One row of the item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRow {
    /// 1-based position across the whole invoice.
    pub serial: usize,
    pub description: String,
    pub code: String,
    pub quantity: Decimal,
    pub unit: Unit,
    /// Rounded to 2 places.
    pub rate: Money,
    pub discount_percent: Decimal,
    pub tax_percent: Decimal,
    /// Line total rounded to 2 places.
    pub amount: Money,
}

/// The totals card on the last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalsBlock {
    pub subtotal: Money,
    /// e.g. `GST (18%)` when every item shares one rate, else `GST`.
    pub tax_label: String,
    pub tax_amount: Money,
    /// Present only when some item carries a discount.
    pub discount: Option<Money>,
    pub total: Money,
    pub amount_in_words: String,
}

/// A renderable unit of page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    Header {
        title: String,
        invoice_no: String,
        date: String,
        issuer_address: String,
    },
    Parties {
        bill_to: Party,
        ship_to: Party,
    },
    Continuation {
        text: String,
    },
    ItemTable {
        show_header: bool,
        rows: Vec<ItemRow>,
    },
    Totals(TotalsBlock),
    Remarks {
        text: String,
    },
    BankDetails {
        lines: Vec<String>,
    },
    Terms {
        lines: Vec<String>,
    },
    CompanyDetails {
        lines: Vec<String>,
    },
    Signatures {
        slots: Vec<SignatureSlot>,
    },
    Footer {
        note: String,
        page_number: usize,
        total_pages: usize,
    },
}

// =============================================================================
// Pages
// =============================================================================

/// Where a page sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageRole {
    First,
    Middle,
    Last,
    /// A single page that is both first and last.
    Only,
}

impl PageRole {
    pub fn of(page: &PageDescriptor) -> Self {
        match (page.is_first_page, page.is_last_page) {
            (true, true) => PageRole::Only,
            (true, false) => PageRole::First,
            (false, true) => PageRole::Last,
            (false, false) => PageRole::Middle,
        }
    }

    pub fn is_first(&self) -> bool {
        matches!(self, PageRole::First | PageRole::Only)
    }

    pub fn is_last(&self) -> bool {
        matches!(self, PageRole::Last | PageRole::Only)
    }
}

/// Assembled content of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    pub number: usize,
    pub total_pages: usize,
    pub role: PageRole,
    pub items: Range<usize>,
    pub blocks: Vec<ContentBlock>,
}

// =============================================================================
// Assembler
// =============================================================================

/// Plans pages for `invoice` and fills each with content blocks.
///
/// Amounts are recomputed from the items, so the output never depends on
/// stored totals being fresh.
///
/// ## Errors
/// `LayoutInvariantViolation` if the planned pages do not cover the items
/// exactly once.
pub fn assemble(
    invoice: &Invoice,
    boilerplate: &Boilerplate,
    capacity: PageCapacity,
) -> CoreResult<Vec<PageContent>> {
    let computed = invoice.computed_items();
    let pages = layout::plan(computed.len(), capacity);
    layout::verify_coverage(&pages, computed.len())?;

    let total_pages = pages.len();
    let header = ContentBlock::Header {
        title: boilerplate.title.clone(),
        invoice_no: invoice.invoice_no.clone(),
        date: invoice.date.format("%d %b %Y").to_string(),
        issuer_address: boilerplate.issuer_address.clone(),
    };

    let assembled = pages
        .iter()
        .map(|page| {
            let role = PageRole::of(page);
            let mut blocks = vec![header.clone()];

            if role.is_first() {
                blocks.push(ContentBlock::Parties {
                    bill_to: invoice.receiver.clone(),
                    ship_to: invoice.consignee.clone(),
                });
            } else {
                blocks.push(ContentBlock::Continuation {
                    text: format!(
                        "Invoice {} - Continued from previous page",
                        invoice.invoice_no
                    ),
                });
            }

            blocks.push(ContentBlock::ItemTable {
                show_header: role.is_first(),
                rows: item_rows(&computed[page.range()], page.start),
            });

            if role.is_last() {
                closing_blocks(invoice, &computed, boilerplate, page, total_pages, &mut blocks);
            }

            PageContent {
                number: page.number(),
                total_pages,
                role,
                items: page.range(),
                blocks,
            }
        })
        .collect();

    Ok(assembled)
}

fn item_rows(slice: &[ComputedLineItem], start: usize) -> Vec<ItemRow> {
    slice
        .iter()
        .enumerate()
        .map(|(i, c)| ItemRow {
            serial: start + i + 1,
            description: c.item.description.clone(),
            code: c.item.code.clone(),
            quantity: c.item.quantity.normalize(),
            unit: c.item.unit,
            rate: c.item.rate.rounded(),
            discount_percent: c.item.discount_percent.normalize(),
            tax_percent: c.item.tax_percent.normalize(),
            amount: c.line_total.rounded(),
        })
        .collect()
}

fn closing_blocks(
    invoice: &Invoice,
    computed: &[ComputedLineItem],
    boilerplate: &Boilerplate,
    page: &PageDescriptor,
    total_pages: usize,
    blocks: &mut Vec<ContentBlock>,
) {
    blocks.push(ContentBlock::Totals(totals_block(computed, boilerplate)));

    if !invoice.remarks.trim().is_empty() {
        blocks.push(ContentBlock::Remarks {
            text: invoice.remarks.trim().to_string(),
        });
    }

    blocks.push(ContentBlock::BankDetails {
        lines: boilerplate.bank_details.clone(),
    });
    blocks.push(ContentBlock::Terms {
        lines: boilerplate.terms.clone(),
    });
    blocks.push(ContentBlock::CompanyDetails {
        lines: boilerplate.company_details.clone(),
    });
    blocks.push(ContentBlock::Signatures {
        slots: boilerplate.signatures.clone(),
    });
    blocks.push(ContentBlock::Footer {
        note: boilerplate.thank_you_note.clone(),
        page_number: page.number(),
        total_pages,
    });
}

fn totals_block(computed: &[ComputedLineItem], boilerplate: &Boilerplate) -> TotalsBlock {
    let totals = calc::aggregate(computed);
    let discount = calc::total_discount(computed);

    let tax_label = match common_tax_percent(computed) {
        Some(rate) => format!("{} ({}%)", boilerplate.tax_label, rate),
        None => boilerplate.tax_label.clone(),
    };

    TotalsBlock {
        subtotal: totals.taxable_value,
        tax_label,
        tax_amount: totals.gst_amount,
        discount: (!discount.is_zero()).then_some(discount),
        total: totals.total_amount,
        amount_in_words: format!("{} {} only", boilerplate.currency_name, totals.total_amount),
    }
}

fn common_tax_percent(computed: &[ComputedLineItem]) -> Option<Decimal> {
    let first = computed.first()?.item.tax_percent;
    computed
        .iter()
        .all(|c| c.item.tax_percent == first)
        .then(|| first.normalize())
}

// =============================================================================
// Rendering Collaborator
// =============================================================================

/// Turns assembled pages into a downloadable byte stream (PDF, HTML, ...).
///
/// Implemented outside this crate.
pub trait DocumentRenderer {
    type Error: std::error::Error;

    /// File extension without the dot, e.g. `pdf`.
    fn extension(&self) -> &str;

    fn content_type(&self) -> &str;

    fn render(&self, invoice_no: &str, pages: &[PageContent]) -> Result<Vec<u8>, Self::Error>;
}

/// Download file name, e.g. `Invoice-INV-202405-1.pdf`.
pub fn download_file_name(invoice_no: &str, extension: &str) -> String {
    format!("Invoice-{invoice_no}.{extension}")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvoiceDraft, LineItem};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn invoice_with(items: usize) -> Invoice {
        let at = Utc.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap();
        let mut draft = InvoiceDraft::new(
            at,
            Party::new("Acme Solar", "Ring Road, Surat", "9876543210", "24ABCDE1234F1Z5"),
        )
        .with_remarks("Deliver before noon");
        for i in 0..items {
            draft = draft.with_item(LineItem::new(format!("Panel {i}"), dec!(2), dec!(100)));
        }
        Invoice::issue(draft, 1, at).unwrap()
    }

    fn kinds(page: &PageContent) -> Vec<&'static str> {
        page.blocks
            .iter()
            .map(|b| match b {
                ContentBlock::Header { .. } => "header",
                ContentBlock::Parties { .. } => "parties",
                ContentBlock::Continuation { .. } => "continuation",
                ContentBlock::ItemTable { .. } => "items",
                ContentBlock::Totals(_) => "totals",
                ContentBlock::Remarks { .. } => "remarks",
                ContentBlock::BankDetails { .. } => "bank",
                ContentBlock::Terms { .. } => "terms",
                ContentBlock::CompanyDetails { .. } => "company",
                ContentBlock::Signatures { .. } => "signatures",
                ContentBlock::Footer { .. } => "footer",
            })
            .collect()
    }

    fn rows(page: &PageContent) -> &[ItemRow] {
        page.blocks
            .iter()
            .find_map(|b| match b {
                ContentBlock::ItemTable { rows, .. } => Some(rows.as_slice()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_single_page_is_first_and_last() {
        let pages = assemble(&invoice_with(3), &Boilerplate::default(), PageCapacity::default())
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].role, PageRole::Only);
        assert_eq!(
            kinds(&pages[0]),
            vec![
                "header", "parties", "items", "totals", "remarks", "bank", "terms", "company",
                "signatures", "footer"
            ]
        );
    }

    #[test]
    fn test_empty_invoice_still_gets_closing_blocks() {
        let pages = assemble(&invoice_with(0), &Boilerplate::default(), PageCapacity::default())
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert!(rows(&pages[0]).is_empty());
        assert!(kinds(&pages[0]).contains(&"totals"));
    }

    #[test]
    fn test_three_page_sequence() {
        let pages = assemble(&invoice_with(35), &Boilerplate::default(), PageCapacity::default())
            .unwrap();

        let roles: Vec<PageRole> = pages.iter().map(|p| p.role).collect();
        assert_eq!(roles, vec![PageRole::First, PageRole::Middle, PageRole::Last]);
        assert_eq!(kinds(&pages[1]), vec!["header", "continuation", "items"]);
        assert_eq!(kinds(&pages[2])[..3].to_vec(), vec!["header", "continuation", "items"]);
        assert!(kinds(&pages[0]).iter().all(|k| *k != "totals"));
    }

    #[test]
    fn test_serials_continue_across_pages() {
        let pages = assemble(&invoice_with(20), &Boilerplate::default(), PageCapacity::default())
            .unwrap();

        let serials: Vec<usize> = pages
            .iter()
            .flat_map(|p| rows(p).iter().map(|r| r.serial))
            .collect();
        assert_eq!(serials, (1..=20).collect::<Vec<_>>());
        assert_eq!(rows(&pages[1])[0].serial, 14);
    }

    #[test]
    fn test_totals_block_content() {
        let pages = assemble(&invoice_with(1), &Boilerplate::default(), PageCapacity::default())
            .unwrap();
        let totals = pages[0]
            .blocks
            .iter()
            .find_map(|b| match b {
                ContentBlock::Totals(t) => Some(t.clone()),
                _ => None,
            })
            .unwrap();

        assert_eq!(totals.subtotal.to_string(), "200.00");
        assert_eq!(totals.tax_label, "GST (18%)");
        assert_eq!(totals.tax_amount.to_string(), "36.00");
        assert_eq!(totals.discount, None);
        assert_eq!(totals.amount_in_words, "Rupees 236.00 only");
    }

    #[test]
    fn test_mixed_tax_rates_drop_rate_from_label() {
        let mut invoice = invoice_with(2);
        invoice.items[1].tax_percent = dec!(5);
        invoice.items[0].discount_percent = dec!(10);
        let pages = assemble(&invoice, &Boilerplate::default(), PageCapacity::default()).unwrap();

        let totals = pages[0]
            .blocks
            .iter()
            .find_map(|b| match b {
                ContentBlock::Totals(t) => Some(t.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(totals.tax_label, "GST");
        assert_eq!(totals.discount.map(|d| d.to_string()), Some("20.00".to_string()));
    }

    #[test]
    fn test_blank_remarks_are_skipped() {
        let mut invoice = invoice_with(1);
        invoice.remarks = "   ".to_string();
        let pages = assemble(&invoice, &Boilerplate::default(), PageCapacity::default()).unwrap();
        assert!(!kinds(&pages[0]).contains(&"remarks"));
    }

    #[test]
    fn test_footer_page_numbers() {
        let pages = assemble(&invoice_with(30), &Boilerplate::default(), PageCapacity::default())
            .unwrap();
        let last = pages.last().unwrap();
        assert!(last.blocks.contains(&ContentBlock::Footer {
            note: Boilerplate::default().thank_you_note,
            page_number: 3,
            total_pages: 3,
        }));
    }

    struct PlainText;

    impl DocumentRenderer for PlainText {
        type Error = std::fmt::Error;

        fn extension(&self) -> &str {
            "txt"
        }

        fn content_type(&self) -> &str {
            "text/plain"
        }

        fn render(&self, invoice_no: &str, pages: &[PageContent]) -> Result<Vec<u8>, Self::Error> {
            use std::fmt::Write;
            let mut out = String::new();
            writeln!(out, "{invoice_no}")?;
            for page in pages {
                writeln!(out, "page {}/{}: {} items", page.number, page.total_pages, page.items.len())?;
            }
            Ok(out.into_bytes())
        }
    }

    #[test]
    fn test_renderer_receives_pages_in_order() {
        let invoice = invoice_with(20);
        let pages = assemble(&invoice, &Boilerplate::default(), PageCapacity::default()).unwrap();
        let renderer = PlainText;

        let bytes = renderer.render(&invoice.invoice_no, &pages).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "INV-202405-1\npage 1/2: 13 items\npage 2/2: 7 items\n"
        );
        assert_eq!(
            download_file_name(&invoice.invoice_no, renderer.extension()),
            "Invoice-INV-202405-1.txt"
        );
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(
            download_file_name("INV-202405-1", "pdf"),
            "Invoice-INV-202405-1.pdf"
        );
    }
}
