//! Field extraction for the PubMed `PubmedArticle` schema.

use crate::error::{ProxyError, Result};
use crate::ids::sanitize_pmcid;
use crate::normalize::{compose_pubdate, pmc_pdf_url, NO_ABSTRACT};
use crate::paper::PaperRecord;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufReader;
use tracing::{debug, instrument};

/// Per-article accumulation state, reset at every `<PubmedArticle>`.
#[derive(Default)]
struct ArticleState {
    uid: String,
    title: String,
    abstract_segments: Vec<String>,
    current_segment: String,
    current_label: Option<String>,
    authors: Vec<String>,
    fore_name: String,
    last_name: String,
    collective_name: String,
    medline_ta: String,
    journal_title: String,
    year: String,
    month: String,
    day: String,
    fallback_year: String,
    pmcid: String,
    current_id_type: String,
    current_id_text: String,
}

impl ArticleState {
    fn push_author(&mut self) {
        let name = format!("{} {}", self.fore_name.trim(), self.last_name.trim())
            .trim()
            .to_string();
        let name = if name.is_empty() {
            self.collective_name.trim().to_string()
        } else {
            name
        };
        // entries equal to "Unknown" or empty are dropped
        if !name.is_empty() && name != "Unknown" {
            self.authors.push(name);
        }
        self.fore_name.clear();
        self.last_name.clear();
        self.collective_name.clear();
    }

    fn push_abstract_segment(&mut self) {
        let text = self.current_segment.trim().to_string();
        if !text.is_empty() {
            match self.current_label.take() {
                Some(label) => self.abstract_segments.push(format!("{label}: {text}")),
                None => self.abstract_segments.push(text),
            }
        } else {
            self.current_label = None;
        }
        self.current_segment.clear();
    }

    fn finish(self) -> PaperRecord {
        let mut record = PaperRecord {
            uid: self.uid.trim().to_string(),
            title: self.title.trim().to_string(),
            pmcid: self.pmcid.clone(),
            ..Default::default()
        };
        record.abstract_text = if self.abstract_segments.is_empty() {
            NO_ABSTRACT.to_string()
        } else {
            self.abstract_segments.join(" ")
        };
        record.set_authors(self.authors);
        record.source = if !self.medline_ta.trim().is_empty() {
            self.medline_ta.trim().to_string()
        } else {
            self.journal_title.trim().to_string()
        };
        let composed = compose_pubdate(self.year.trim(), self.month.trim(), self.day.trim());
        record.pubdate = if composed.is_empty() {
            self.fallback_year.trim().to_string()
        } else {
            composed
        };
        record.pdf_url = if record.pmcid.is_empty() {
            String::new()
        } else {
            pmc_pdf_url(&record.pmcid)
        };
        record
    }
}

/// Parse every `<PubmedArticle>` in an EFetch response into a record.
#[instrument(skip(xml), fields(xml_size = xml.len()))]
pub(super) fn parse_articles(xml: &str) -> Result<Vec<PaperRecord>> {
    let mut reader = Reader::from_reader(BufReader::new(xml.as_bytes()));
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut st = ArticleState::default();

    let mut in_article = false;
    // CommentsCorrections and ReferenceList carry PMIDs and ArticleIdLists of
    // *other* papers; nothing inside them may leak into the record.
    let mut in_comments = false;
    let mut in_reference_list = false;
    let mut in_pmid = false;
    let mut in_article_title = false;
    let mut in_abstract = false;
    let mut in_abstract_text = false;
    let mut in_author_list = false;
    let mut in_author = false;
    let mut in_fore_name = false;
    let mut in_last_name = false;
    let mut in_collective = false;
    let mut in_medline_ta = false;
    let mut in_journal = false;
    let mut in_journal_title = false;
    let mut in_pub_date = false;
    let mut in_pubmed_pubdate = false;
    let mut capture_fallback = false;
    let mut in_year = false;
    let mut in_month = false;
    let mut in_day = false;
    let mut in_article_id = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"PubmedArticle" => {
                    in_article = true;
                    st = ArticleState::default();
                }
                b"CommentsCorrections" => in_comments = true,
                b"ReferenceList" => in_reference_list = true,
                b"PMID" if in_article => {
                    in_pmid = !in_comments && !in_reference_list && st.uid.is_empty();
                }
                b"ArticleTitle" if in_article && !in_comments && !in_reference_list => {
                    in_article_title = true;
                }
                b"Abstract" if in_article => in_abstract = true,
                b"AbstractText" if in_abstract => {
                    in_abstract_text = true;
                    st.current_label = None;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"Label" {
                            st.current_label =
                                Some(String::from_utf8_lossy(&attr.value).to_string());
                        }
                    }
                }
                b"AuthorList" if in_article => in_author_list = true,
                b"Author" if in_author_list => in_author = true,
                b"ForeName" if in_author => in_fore_name = true,
                b"LastName" if in_author => in_last_name = true,
                b"CollectiveName" if in_author => in_collective = true,
                b"MedlineTA" if in_article => in_medline_ta = true,
                b"Journal" if in_article => in_journal = true,
                b"Title" if in_journal => in_journal_title = true,
                b"PubDate" if in_article => in_pub_date = true,
                b"PubMedPubDate" if in_article => {
                    in_pubmed_pubdate = true;
                    capture_fallback = st.fallback_year.is_empty();
                }
                b"Year" => in_year = true,
                b"Month" => in_month = true,
                b"Day" => in_day = true,
                b"ArticleId" if in_article && !in_reference_list => {
                    in_article_id = true;
                    st.current_id_type.clear();
                    st.current_id_text.clear();
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"IdType" {
                            st.current_id_type =
                                String::from_utf8_lossy(&attr.value).to_string();
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"PubmedArticle" => {
                    if in_article {
                        records.push(std::mem::take(&mut st).finish());
                        in_article = false;
                    }
                }
                b"CommentsCorrections" => in_comments = false,
                b"ReferenceList" => in_reference_list = false,
                b"PMID" => in_pmid = false,
                b"ArticleTitle" => in_article_title = false,
                b"Abstract" => in_abstract = false,
                b"AbstractText" => {
                    if in_abstract_text {
                        st.push_abstract_segment();
                    }
                    in_abstract_text = false;
                }
                b"AuthorList" => in_author_list = false,
                b"Author" => {
                    if in_author {
                        st.push_author();
                    }
                    in_author = false;
                }
                b"ForeName" => in_fore_name = false,
                b"LastName" => in_last_name = false,
                b"CollectiveName" => in_collective = false,
                b"MedlineTA" => in_medline_ta = false,
                b"Journal" => in_journal = false,
                b"Title" => in_journal_title = false,
                b"PubDate" => in_pub_date = false,
                b"PubMedPubDate" => in_pubmed_pubdate = false,
                b"Year" => in_year = false,
                b"Month" => in_month = false,
                b"Day" => in_day = false,
                b"ArticleId" => {
                    if in_article_id
                        && st.current_id_type == "pmc"
                        && st.pmcid.is_empty()
                    {
                        st.pmcid = sanitize_pmcid(&st.current_id_text);
                    }
                    in_article_id = false;
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if !in_article {
                    buf.clear();
                    continue;
                }
                let text = e
                    .unescape()
                    .map_err(|err| ProxyError::Xml {
                        message: format!("failed to decode XML text: {err}"),
                    })?
                    .into_owned();

                if in_pmid {
                    st.uid.push_str(&text);
                } else if in_article_title {
                    st.title.push_str(&text);
                } else if in_abstract_text && in_abstract {
                    if !st.current_segment.is_empty() {
                        st.current_segment.push(' ');
                    }
                    st.current_segment.push_str(&text);
                } else if in_fore_name && in_author {
                    st.fore_name.push_str(&text);
                } else if in_last_name && in_author {
                    st.last_name.push_str(&text);
                } else if in_collective && in_author {
                    st.collective_name.push_str(&text);
                } else if in_medline_ta {
                    st.medline_ta.push_str(&text);
                } else if in_journal_title && in_journal {
                    st.journal_title.push_str(&text);
                } else if in_pub_date {
                    if in_year {
                        st.year.push_str(&text);
                    } else if in_month {
                        st.month.push_str(&text);
                    } else if in_day {
                        st.day.push_str(&text);
                    }
                } else if in_pubmed_pubdate && in_year && capture_fallback {
                    st.fallback_year.push_str(&text);
                } else if in_article_id {
                    st.current_id_text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProxyError::Xml {
                    message: format!("XML parsing error: {e}"),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    debug!(records = records.len(), "parsed PubMed article set");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ARTICLES: &str = r#"<?xml version="1.0" ?>
<PubmedArticleSet>
<PubmedArticle>
    <MedlineCitation>
        <PMID Version="1">31978945</PMID>
        <Article>
            <Journal>
                <Title>BMJ (Clinical research ed.)</Title>
                <JournalIssue>
                    <PubDate>
                        <Year>2021</Year>
                        <Month>3</Month>
                        <Day>7</Day>
                    </PubDate>
                </JournalIssue>
            </Journal>
            <ArticleTitle> A living WHO guideline on drugs for covid-19. </ArticleTitle>
            <Abstract>
                <AbstractText Label="BACKGROUND">Drugs for covid-19 evolve quickly.</AbstractText>
                <AbstractText Label="METHODS">Living systematic review.</AbstractText>
            </Abstract>
            <AuthorList>
                <Author>
                    <LastName>Doe</LastName>
                    <ForeName>John</ForeName>
                </Author>
                <Author>
                    <CollectiveName>WHO Guideline Group</CollectiveName>
                </Author>
                <Author>
                    <LastName></LastName>
                </Author>
            </AuthorList>
        </Article>
        <MedlineJournalInfo>
            <MedlineTA>BMJ</MedlineTA>
        </MedlineJournalInfo>
        <CommentsCorrections RefType="CommentIn">
            <RefSource>Other J</RefSource>
            <PMID Version="1">99999999</PMID>
        </CommentsCorrections>
    </MedlineCitation>
    <PubmedData>
        <ArticleIdList>
            <ArticleId IdType="pubmed">31978945</ArticleId>
            <ArticleId IdType="pmc">PMC7906746</ArticleId>
        </ArticleIdList>
    </PubmedData>
</PubmedArticle>
<PubmedArticle>
    <MedlineCitation>
        <PMID Version="1">25760099</PMID>
        <Article>
            <Journal>
                <Title>Nature methods</Title>
                <JournalIssue>
                    <PubDate>
                        <Year>2015</Year>
                    </PubDate>
                </JournalIssue>
            </Journal>
            <ArticleTitle>CRISPR screening.</ArticleTitle>
            <AuthorList>
                <Author>
                    <LastName>Smith</LastName>
                    <ForeName>Jane</ForeName>
                </Author>
            </AuthorList>
        </Article>
    </MedlineCitation>
</PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_two_articles_extracted() {
        let records = parse_articles(TWO_ARTICLES).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.uid, "31978945");
        assert_eq!(first.title, "A living WHO guideline on drugs for covid-19.");
        assert_eq!(
            first.abstract_text,
            "BACKGROUND: Drugs for covid-19 evolve quickly. METHODS: Living systematic review."
        );
        assert_eq!(first.sortfirstauthor, "John Doe");
        assert_eq!(first.authors, "John Doe, WHO Guideline Group");
        assert_eq!(
            first.authors_array,
            Some(vec![
                "John Doe".to_string(),
                "WHO Guideline Group".to_string()
            ])
        );
        // MedlineTA wins over Journal > Title
        assert_eq!(first.source, "BMJ");
        assert_eq!(first.pubdate, "2021-03-07");
        assert_eq!(first.pmcid, "7906746");
        assert_eq!(
            first.pdf_url,
            "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC7906746/pdf/"
        );

        let second = &records[1];
        assert_eq!(second.uid, "25760099");
        assert_eq!(second.source, "Nature methods");
        assert_eq!(second.pubdate, "2015");
        assert_eq!(second.abstract_text, NO_ABSTRACT);
        assert_eq!(second.pmcid, "");
        assert_eq!(second.pdf_url, "");
    }

    #[test]
    fn test_comments_corrections_pmid_does_not_leak() {
        let records = parse_articles(TWO_ARTICLES).unwrap();
        assert_eq!(records[0].uid, "31978945");
    }

    #[test]
    fn test_history_year_fallback() {
        let xml = r#"<PubmedArticleSet>
<PubmedArticle>
    <MedlineCitation>
        <PMID>11111111</PMID>
        <Article>
            <ArticleTitle>No journal date.</ArticleTitle>
        </Article>
    </MedlineCitation>
    <PubmedData>
        <History>
            <PubMedPubDate PubStatus="pubmed">
                <Year>2019</Year>
                <Month>5</Month>
            </PubMedPubDate>
            <PubMedPubDate PubStatus="medline">
                <Year>2020</Year>
            </PubMedPubDate>
        </History>
    </PubmedData>
</PubmedArticle>
</PubmedArticleSet>"#;
        let records = parse_articles(xml).unwrap();
        assert_eq!(records[0].pubdate, "2019");
    }

    #[test]
    fn test_named_month_passthrough() {
        let xml = r#"<PubmedArticleSet>
<PubmedArticle>
    <MedlineCitation>
        <PMID>22222222</PMID>
        <Article>
            <Journal>
                <JournalIssue>
                    <PubDate><Year>2020</Year><Month>Sep</Month></PubDate>
                </JournalIssue>
            </Journal>
            <ArticleTitle>Named month.</ArticleTitle>
        </Article>
    </MedlineCitation>
</PubmedArticle>
</PubmedArticleSet>"#;
        let records = parse_articles(xml).unwrap();
        assert_eq!(records[0].pubdate, "2020-Sep");
    }

    #[test]
    fn test_no_authors_yields_unknown_sort_key() {
        let xml = r#"<PubmedArticleSet>
<PubmedArticle>
    <MedlineCitation>
        <PMID>33333333</PMID>
        <Article><ArticleTitle>Anonymous.</ArticleTitle></Article>
    </MedlineCitation>
</PubmedArticle>
</PubmedArticleSet>"#;
        let records = parse_articles(xml).unwrap();
        assert_eq!(records[0].sortfirstauthor, "Unknown");
        assert_eq!(records[0].authors, "");
        assert_eq!(records[0].authors_array, Some(Vec::new()));
    }

    #[test]
    fn test_empty_document_yields_empty_list() {
        let records = parse_articles("<PubmedArticleSet></PubmedArticleSet>").unwrap();
        assert!(records.is_empty());
    }
}
