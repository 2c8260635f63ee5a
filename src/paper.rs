//! The uniform record shape shared by both source databases.

use crate::error::ProxyError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Source database a request is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDb {
    Pubmed,
    Pmc,
}

impl SourceDb {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDb::Pubmed => "pubmed",
            SourceDb::Pmc => "pmc",
        }
    }
}

impl fmt::Display for SourceDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceDb {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pubmed" => Ok(SourceDb::Pubmed),
            "pmc" => Ok(SourceDb::Pmc),
            other => Err(ProxyError::InvalidRequest(format!(
                "unsupported db {other:?}, expected \"pubmed\" or \"pmc\""
            ))),
        }
    }
}

/// One normalized paper, serialized with the exact wire-level field names the
/// frontend consumes.
///
/// `articletitle` is a historical wire name: it carries the normalized
/// abstract text, not the title. The clean name lives on the struct field and
/// the rename happens only at the serialization boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaperRecord {
    /// Sanitized PMC cross-reference ID, empty when none was found.
    pub pmcid: String,
    /// Source database's primary identifier (PMID or PMC numeric ID).
    pub uid: String,
    pub title: String,
    #[serde(rename = "articletitle")]
    pub abstract_text: String,
    pub sortfirstauthor: String,
    pub authors: String,
    /// Present on the batch endpoint, omitted on the single-item endpoint.
    #[serde(rename = "authorsArray", skip_serializing_if = "Option::is_none")]
    pub authors_array: Option<Vec<String>>,
    pub source: String,
    pub pubdate: String,
    #[serde(rename = "pdfUrl")]
    pub pdf_url: String,
}

impl PaperRecord {
    /// Install the surviving author list, deriving the joined display string
    /// and the sort key in one place.
    pub fn set_authors(&mut self, names: Vec<String>) {
        self.sortfirstauthor = names
            .first()
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string());
        self.authors = names.join(", ");
        self.authors_array = Some(names);
    }

    /// Drop the array form for the single-item endpoint's wire shape.
    pub fn without_authors_array(mut self) -> Self {
        self.authors_array = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_parsing() {
        assert_eq!("pubmed".parse::<SourceDb>().unwrap(), SourceDb::Pubmed);
        assert_eq!("pmc".parse::<SourceDb>().unwrap(), SourceDb::Pmc);
        assert!("medline".parse::<SourceDb>().is_err());
        assert!("PMC".parse::<SourceDb>().is_err());
        assert!("".parse::<SourceDb>().is_err());
    }

    #[test]
    fn test_set_authors() {
        let mut record = PaperRecord::default();
        record.set_authors(vec!["Jane Smith".into(), "John Doe".into()]);
        assert_eq!(record.sortfirstauthor, "Jane Smith");
        assert_eq!(record.authors, "Jane Smith, John Doe");
        assert_eq!(
            record.authors_array,
            Some(vec!["Jane Smith".to_string(), "John Doe".to_string()])
        );
    }

    #[test]
    fn test_set_authors_empty_list() {
        let mut record = PaperRecord::default();
        record.set_authors(Vec::new());
        assert_eq!(record.sortfirstauthor, "Unknown");
        assert_eq!(record.authors, "");
    }

    #[test]
    fn test_wire_field_names() {
        let mut record = PaperRecord {
            abstract_text: "Some abstract.".into(),
            pdf_url: "https://example.org/a.pdf".into(),
            ..Default::default()
        };
        record.set_authors(vec!["Jane Smith".into()]);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["articletitle"], "Some abstract.");
        assert_eq!(json["pdfUrl"], "https://example.org/a.pdf");
        assert_eq!(json["authorsArray"][0], "Jane Smith");

        let single = serde_json::to_value(record.without_authors_array()).unwrap();
        assert!(single.get("authorsArray").is_none());
    }
}
