//! PMC enrichment pass for PubMed-sourced records.
//!
//! PubMed metadata is often thinner than the PMC version of the same paper,
//! so after the primary pass every record that resolved a PMC
//! cross-reference is re-fetched from PMC in one batched call and its richer
//! fields are overlaid in place. The sanitized pmcid is the join key; records
//! without one are never touched. The pass is all-or-nothing: a failed PMC
//! fetch fails the whole request.

use crate::error::Result;
use crate::eutils::EUtilsClient;
use crate::normalize;
use crate::paper::{PaperRecord, SourceDb};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Re-fetch the PMC version of every record carrying a pmcid and overlay the
/// richer fields onto the records in place.
#[instrument(skip(client, records), fields(records = records.len()))]
pub async fn enrich_from_pmc(client: &EUtilsClient, records: &mut [PaperRecord]) -> Result<()> {
    let pmcids: Vec<String> = records
        .iter()
        .filter(|r| !r.pmcid.is_empty())
        .map(|r| r.pmcid.clone())
        .collect();

    if pmcids.is_empty() {
        debug!("no PMC cross-references to enrich");
        return Ok(());
    }

    let xml = client.fetch_xml(SourceDb::Pmc, &pmcids).await?;
    let pmc_records = normalize::normalize(&xml, SourceDb::Pmc)?;
    let enriched = overlay_pmc_fields(records, &pmc_records);

    info!(
        requested = pmcids.len(),
        enriched, "PMC enrichment pass completed"
    );
    Ok(())
}

/// Merge step: for each record whose pmcid matches a PMC article, replace the
/// enrichable fields with the PMC extraction. `uid` and `pmcid` are
/// preserved; records without a PMC counterpart are left unmodified.
pub fn overlay_pmc_fields(records: &mut [PaperRecord], pmc_records: &[PaperRecord]) -> usize {
    let by_pmcid: HashMap<&str, &PaperRecord> = pmc_records
        .iter()
        .filter(|r| !r.pmcid.is_empty())
        .map(|r| (r.pmcid.as_str(), r))
        .collect();

    let mut enriched = 0;
    for record in records.iter_mut() {
        if record.pmcid.is_empty() {
            continue;
        }
        if let Some(pmc) = by_pmcid.get(record.pmcid.as_str()) {
            record.title = pmc.title.clone();
            record.abstract_text = pmc.abstract_text.clone();
            record.sortfirstauthor = pmc.sortfirstauthor.clone();
            record.authors = pmc.authors.clone();
            record.authors_array = pmc.authors_array.clone();
            record.source = pmc.source.clone();
            record.pubdate = pmc.pubdate.clone();
            record.pdf_url = pmc.pdf_url.clone();
            enriched += 1;
        }
    }
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pubmed_record(uid: &str, pmcid: &str) -> PaperRecord {
        let mut record = PaperRecord {
            uid: uid.to_string(),
            pmcid: pmcid.to_string(),
            title: "PubMed title".into(),
            abstract_text: "No abstract available.".into(),
            source: "Medline TA".into(),
            pubdate: "2020".into(),
            ..Default::default()
        };
        record.set_authors(vec!["P Author".into()]);
        record
    }

    fn pmc_record(pmcid: &str) -> PaperRecord {
        let mut record = PaperRecord {
            uid: "31978945".into(),
            pmcid: pmcid.to_string(),
            title: "PMC title".into(),
            abstract_text: "Full abstract text.".into(),
            source: "PLoS ONE".into(),
            pubdate: "2021-03-07".into(),
            pdf_url: format!("https://www.ncbi.nlm.nih.gov/pmc/articles/PMC{pmcid}/pdf/"),
            ..Default::default()
        };
        record.set_authors(vec!["Jane Smith".into(), "John Doe".into()]);
        record
    }

    #[test]
    fn test_overlay_replaces_enrichable_fields() {
        let mut records = vec![pubmed_record("31978945", "7906746")];
        let pmc = vec![pmc_record("7906746")];

        let enriched = overlay_pmc_fields(&mut records, &pmc);

        assert_eq!(enriched, 1);
        let record = &records[0];
        assert_eq!(record.title, "PMC title");
        assert_eq!(record.abstract_text, "Full abstract text.");
        assert_eq!(record.sortfirstauthor, "Jane Smith");
        assert_eq!(record.authors, "Jane Smith, John Doe");
        assert_eq!(record.source, "PLoS ONE");
        assert_eq!(record.pubdate, "2021-03-07");
        assert!(record.pdf_url.ends_with("PMC7906746/pdf/"));
        // identity fields survive
        assert_eq!(record.uid, "31978945");
        assert_eq!(record.pmcid, "7906746");
    }

    #[test]
    fn test_records_without_pmcid_untouched() {
        let mut records = vec![pubmed_record("222", "")];
        let pmc = vec![pmc_record("7906746")];

        let enriched = overlay_pmc_fields(&mut records, &pmc);

        assert_eq!(enriched, 0);
        assert_eq!(records[0].title, "PubMed title");
    }

    #[test]
    fn test_records_without_pmc_counterpart_untouched() {
        let mut records = vec![pubmed_record("222", "555")];
        let pmc = vec![pmc_record("7906746")];

        let enriched = overlay_pmc_fields(&mut records, &pmc);

        assert_eq!(enriched, 0);
        assert_eq!(records[0].title, "PubMed title");
        assert_eq!(records[0].pmcid, "555");
    }
}
