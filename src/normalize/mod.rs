//! XML-to-record normalization shared by the batch, single-item, and
//! enrichment paths.
//!
//! Each source database speaks its own schema (`PubmedArticle` for PubMed,
//! `article` for PMC); both funnel through [`normalize`] so the extraction
//! rules exist exactly once.

mod pmc;
mod pubmed;

use crate::error::Result;
use crate::paper::{PaperRecord, SourceDb};

/// Literal placed in the abstract slot when no abstract markup exists
pub const NO_ABSTRACT: &str = "No abstract available.";

/// Parse one raw XML document into uniform paper records, one per top-level
/// article element. A document without article elements yields an empty list,
/// not an error.
pub fn normalize(xml: &str, db: SourceDb) -> Result<Vec<PaperRecord>> {
    match db {
        SourceDb::Pubmed => pubmed::parse_articles(xml),
        SourceDb::Pmc => pmc::parse_articles(xml),
    }
}

/// PMC full-text PDF location for a bare numeric PMC id.
pub(crate) fn pmc_pdf_url(pmcid: &str) -> String {
    format!("https://www.ncbi.nlm.nih.gov/pmc/articles/PMC{pmcid}/pdf/")
}

/// Compose `YYYY-MM-DD`, `YYYY-MM`, or `YYYY` from date pieces.
///
/// Numeric month/day values are zero-padded to two digits regardless of the
/// source digit count; named months (PubMed emits `Sep` and friends) pass
/// through unchanged. A day without a month is ignored.
pub(crate) fn compose_pubdate(year: &str, month: &str, day: &str) -> String {
    if year.is_empty() {
        return String::new();
    }
    let mut date = year.to_string();
    if !month.is_empty() {
        date.push('-');
        date.push_str(&pad_two(month));
        if !day.is_empty() {
            date.push('-');
            date.push_str(&pad_two(day));
        }
    }
    date
}

fn pad_two(part: &str) -> String {
    match part.parse::<u32>() {
        Ok(n) => format!("{n:02}"),
        Err(_) => part.to_string(),
    }
}
