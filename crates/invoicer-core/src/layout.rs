//! # Page Layout Planner
//!
//! Partitions an ordered list of line items into document pages.
//!
//! ## Capacity Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Page 1 (FIRST)          Page 2..n-1 (MIDDLE)     Page n (LAST)         │
//! │  ┌──────────────────┐    ┌──────────────────┐    ┌──────────────────┐   │
//! │  │ identity block   │ R  │ continuation     │    │ continuation     │   │
//! │  │ (R rows)         │    │                  │    │                  │   │
//! │  ├──────────────────┤    ├──────────────────┤    ├──────────────────┤   │
//! │  │ items            │P-R │ items            │ P  │ items (≤ P)      │   │
//! │  │                  │    │                  │    ├──────────────────┤   │
//! │  │                  │    │                  │    │ totals, terms,   │   │
//! │  │                  │    │                  │    │ signatures       │   │
//! │  └──────────────────┘    └──────────────────┘    └──────────────────┘   │
//! │                                                                         │
//! │  Reference policy: P = 15 rows per page, R = 2 reserved rows            │
//! │  20 items → [0..13) on page 1, [13..20) on page 2                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The last-page content (totals, terms, signatures) never triggers an extra
//! page here. If a stricter renderer cannot fit it, reflowing is the
//! assembler's job; the planner only partitions items.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{CoreError, CoreResult};
use crate::{FIRST_PAGE_RESERVED_ROWS, ROWS_PER_PAGE};

// =============================================================================
// Page Capacity
// =============================================================================

/// How many item rows fit on each page.
///
/// Deserialization goes through [`PageCapacity::new`], so a decoded policy
/// always leaves room for at least one item on the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPageCapacity")]
pub struct PageCapacity {
    rows_per_page: usize,
    first_page_reserved_rows: usize,
}

#[derive(Deserialize)]
struct RawPageCapacity {
    rows_per_page: usize,
    first_page_reserved_rows: usize,
}

impl TryFrom<RawPageCapacity> for PageCapacity {
    type Error = CoreError;

    fn try_from(raw: RawPageCapacity) -> CoreResult<Self> {
        PageCapacity::new(raw.rows_per_page, raw.first_page_reserved_rows)
    }
}

impl PageCapacity {
    /// Creates a policy. `rows_per_page` must exceed
    /// `first_page_reserved_rows` so the first page holds at least one item.
    pub fn new(rows_per_page: usize, first_page_reserved_rows: usize) -> CoreResult<Self> {
        if rows_per_page <= first_page_reserved_rows {
            return Err(CoreError::InvalidCapacity {
                rows_per_page,
                reserved: first_page_reserved_rows,
            });
        }
        Ok(PageCapacity {
            rows_per_page,
            first_page_reserved_rows,
        })
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn first_page_reserved_rows(&self) -> usize {
        self.first_page_reserved_rows
    }

    /// Item rows available on the first page (`P - R`).
    pub fn first_page_items(&self) -> usize {
        self.rows_per_page - self.first_page_reserved_rows
    }
}

impl Default for PageCapacity {
    fn default() -> Self {
        PageCapacity {
            rows_per_page: ROWS_PER_PAGE,
            first_page_reserved_rows: FIRST_PAGE_RESERVED_ROWS,
        }
    }
}

// =============================================================================
// Page Descriptor
// =============================================================================

/// One planned page: which slice of items it shows and where it sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    /// Zero-based page index.
    pub index: usize,
    /// Offset of the first item on this page.
    pub start: usize,
    /// Number of items on this page.
    pub len: usize,
    pub is_first_page: bool,
    pub is_last_page: bool,
}

impl PageDescriptor {
    /// Item index range covered by this page.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// One-based page number for display.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Greedily fills pages in order.
///
/// Always returns at least one page; zero items yields a single empty page
/// that is both first and last.
///
/// ## Example
/// ```rust
/// use invoicer_core::layout::{plan, PageCapacity};
///
/// let pages = plan(20, PageCapacity::default());
/// assert_eq!(pages.len(), 2);
/// assert_eq!(pages[0].range(), 0..13);
/// assert_eq!(pages[1].range(), 13..20);
/// assert!(pages[1].is_last_page);
/// ```
pub fn plan(item_count: usize, capacity: PageCapacity) -> Vec<PageDescriptor> {
    let mut pages = Vec::new();
    let mut start = 0;

    loop {
        let room = if pages.is_empty() {
            capacity.first_page_items()
        } else {
            capacity.rows_per_page()
        };
        let len = room.min(item_count - start);
        let is_last_page = start + len == item_count;

        pages.push(PageDescriptor {
            index: pages.len(),
            start,
            len,
            is_first_page: pages.is_empty(),
            is_last_page,
        });

        if is_last_page {
            return pages;
        }
        start += len;
    }
}

/// Checks that `pages` cover `0..item_count` exactly once, in order, with
/// one first page at the front and one last page at the end.
pub fn verify_coverage(pages: &[PageDescriptor], item_count: usize) -> CoreResult<()> {
    let violation = |msg: String| Err(CoreError::LayoutInvariantViolation(msg));

    if pages.is_empty() {
        return violation("no pages planned".to_string());
    }

    let mut expected_start = 0;
    for (i, page) in pages.iter().enumerate() {
        if page.index != i {
            return violation(format!("page at position {i} has index {}", page.index));
        }
        if page.start != expected_start {
            return violation(format!(
                "page {i} starts at item {} but item {expected_start} is next",
                page.start
            ));
        }
        if page.is_first_page != (i == 0) {
            return violation(format!("page {i} has a wrong first-page flag"));
        }
        if page.is_last_page != (i == pages.len() - 1) {
            return violation(format!("page {i} has a wrong last-page flag"));
        }
        expected_start += page.len;
    }

    if expected_start != item_count {
        return violation(format!(
            "pages cover {expected_start} items, invoice has {item_count}"
        ));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
