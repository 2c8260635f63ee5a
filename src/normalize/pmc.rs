//! Field extraction for the PMC `article` schema.

use crate::error::{ProxyError, Result};
use crate::ids::sanitize_pmcid;
use crate::normalize::{compose_pubdate, pmc_pdf_url, NO_ABSTRACT};
use crate::paper::PaperRecord;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufReader;
use tracing::{debug, instrument};

/// Per-article accumulation state, reset at every `<article>`.
#[derive(Default)]
struct ArticleState {
    uid: String,
    title: String,
    paragraphs: Vec<String>,
    current_paragraph: String,
    authors: Vec<String>,
    given_names: String,
    surname: String,
    raw_name: String,
    journal_title: String,
    year: String,
    month: String,
    day: String,
    seen_pub_date: bool,
    pmcid: String,
    current_id_type: String,
    current_id_text: String,
    self_uri_pdf: Option<String>,
    ext_link_pdf: Option<String>,
}

impl ArticleState {
    fn push_author(&mut self) {
        let name = format!("{} {}", self.given_names.trim(), self.surname.trim())
            .trim()
            .to_string();
        let name = if name.is_empty() {
            self.raw_name.trim().to_string()
        } else {
            name
        };
        if !name.is_empty() {
            self.authors.push(name);
        }
        self.given_names.clear();
        self.surname.clear();
        self.raw_name.clear();
    }

    fn close_article_id(&mut self) {
        let text = self.current_id_text.trim().to_string();
        match self.current_id_type.as_str() {
            "pmid" if self.uid.is_empty() => self.uid = text,
            "pmc" if self.pmcid.is_empty() => self.pmcid = sanitize_pmcid(&text),
            _ => {}
        }
        self.current_id_type.clear();
        self.current_id_text.clear();
    }

    /// PDF link precedence: self-uri marked as PDF, then the first external
    /// link ending in `.pdf`, then the constructed PMC template. A relative
    /// self-uri is rewritten under this record's own sanitized id.
    fn resolve_pdf_url(&self) -> String {
        if let Some(href) = &self.self_uri_pdf {
            if href.starts_with("http://") || href.starts_with("https://") {
                return href.clone();
            }
            if !self.pmcid.is_empty() {
                return format!(
                    "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC{}/{}",
                    self.pmcid,
                    href.trim_start_matches('/')
                );
            }
        }
        if let Some(href) = &self.ext_link_pdf {
            return href.clone();
        }
        if self.pmcid.is_empty() {
            String::new()
        } else {
            pmc_pdf_url(&self.pmcid)
        }
    }

    fn finish(self) -> PaperRecord {
        let mut record = PaperRecord {
            uid: self.uid.trim().to_string(),
            title: self.title.trim().to_string(),
            pmcid: self.pmcid.clone(),
            ..Default::default()
        };
        record.abstract_text = if self.paragraphs.is_empty() {
            NO_ABSTRACT.to_string()
        } else {
            self.paragraphs.join(" ")
        };
        record.source = self.journal_title.trim().to_string();
        record.pubdate = compose_pubdate(self.year.trim(), self.month.trim(), self.day.trim());
        // resolve the link before the author list is moved out of self
        record.pdf_url = self.resolve_pdf_url();
        record.set_authors(self.authors);
        record
    }
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

fn href_attr(e: &BytesStart<'_>) -> Option<String> {
    attr_value(e, b"xlink:href").or_else(|| attr_value(e, b"href"))
}

/// Parse every `<article>` in a pmc-articleset into a record.
#[instrument(skip(xml), fields(xml_size = xml.len()))]
pub(super) fn parse_articles(xml: &str) -> Result<Vec<PaperRecord>> {
    let mut reader = Reader::from_reader(BufReader::new(xml.as_bytes()));
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut st = ArticleState::default();

    let mut in_article = false;
    // Metadata lives in <front>; <back> holds the reference list, whose
    // article-titles, names, and cited-paper links must not leak into the
    // record.
    let mut in_front = false;
    let mut in_back = false;
    let mut in_title_group = false;
    let mut in_article_title = false;
    let mut in_abstract = false;
    let mut in_abstract_p = false;
    let mut in_contrib_group = false;
    let mut in_contrib = false;
    let mut in_name = false;
    let mut in_given = false;
    let mut in_surname = false;
    let mut in_journal_title = false;
    let mut in_pub_date = false;
    let mut in_year = false;
    let mut in_month = false;
    let mut in_day = false;
    let mut in_article_id = false;

    let mut buf = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf);
        match event {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"article" => {
                    in_article = true;
                    st = ArticleState::default();
                }
                b"front" if in_article => in_front = true,
                b"back" if in_article => in_back = true,
                b"title-group" if in_front => in_title_group = true,
                b"article-title" if in_title_group => in_article_title = true,
                b"abstract" if in_front => in_abstract = true,
                b"p" if in_abstract => {
                    in_abstract_p = true;
                    st.current_paragraph.clear();
                }
                b"contrib-group" if in_front => in_contrib_group = true,
                b"contrib" if in_contrib_group => {
                    in_contrib = attr_value(e, b"contrib-type").as_deref() == Some("author");
                }
                b"name" | b"string-name" | b"collab" if in_contrib => {
                    in_name = true;
                    st.raw_name.clear();
                }
                b"given-names" if in_name => in_given = true,
                b"surname" if in_name => in_surname = true,
                b"journal-title" if in_front => in_journal_title = true,
                b"pub-date" if in_front && !st.seen_pub_date => in_pub_date = true,
                b"year" if in_pub_date => in_year = true,
                b"month" if in_pub_date => in_month = true,
                b"day" if in_pub_date => in_day = true,
                b"article-id" if in_front => {
                    in_article_id = true;
                    st.current_id_type = attr_value(e, b"pub-id-type").unwrap_or_default();
                    st.current_id_text.clear();
                }
                b"self-uri" if in_article && !in_back => {
                    if st.self_uri_pdf.is_none()
                        && attr_value(e, b"content-type")
                            .map(|ct| ct.to_ascii_lowercase().contains("pdf"))
                            .unwrap_or(false)
                    {
                        st.self_uri_pdf = href_attr(e);
                    }
                }
                b"ext-link" if in_article && !in_back => {
                    if st.ext_link_pdf.is_none() {
                        if let Some(href) = href_attr(e) {
                            if href.ends_with(".pdf") {
                                st.ext_link_pdf = Some(href);
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"self-uri" if in_article && !in_back => {
                    if st.self_uri_pdf.is_none()
                        && attr_value(e, b"content-type")
                            .map(|ct| ct.to_ascii_lowercase().contains("pdf"))
                            .unwrap_or(false)
                    {
                        st.self_uri_pdf = href_attr(e);
                    }
                }
                b"ext-link" if in_article && !in_back => {
                    if st.ext_link_pdf.is_none() {
                        if let Some(href) = href_attr(e) {
                            if href.ends_with(".pdf") {
                                st.ext_link_pdf = Some(href);
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"article" => {
                    if in_article {
                        records.push(std::mem::take(&mut st).finish());
                        in_article = false;
                    }
                }
                b"front" => in_front = false,
                b"back" => in_back = false,
                b"title-group" => in_title_group = false,
                b"article-title" => in_article_title = false,
                b"abstract" => in_abstract = false,
                b"p" => {
                    if in_abstract_p {
                        let text = st.current_paragraph.trim().to_string();
                        if !text.is_empty() {
                            st.paragraphs.push(text);
                        }
                    }
                    in_abstract_p = false;
                }
                b"contrib-group" => in_contrib_group = false,
                b"contrib" => {
                    if in_contrib {
                        st.push_author();
                    }
                    in_contrib = false;
                }
                b"name" | b"string-name" | b"collab" => in_name = false,
                b"given-names" => in_given = false,
                b"surname" => in_surname = false,
                b"journal-title" => in_journal_title = false,
                b"pub-date" => {
                    if in_pub_date {
                        st.seen_pub_date = true;
                    }
                    in_pub_date = false;
                }
                b"year" => in_year = false,
                b"month" => in_month = false,
                b"day" => in_day = false,
                b"article-id" => {
                    if in_article_id {
                        st.close_article_id();
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

                if in_article_title {
                    st.title.push_str(&text);
                } else if in_abstract_p {
                    if !st.current_paragraph.is_empty() {
                        st.current_paragraph.push(' ');
                    }
                    st.current_paragraph.push_str(&text);
                } else if in_given {
                    st.given_names.push_str(&text);
                    st.raw_name.push_str(&text);
                    st.raw_name.push(' ');
                } else if in_surname {
                    st.surname.push_str(&text);
                    st.raw_name.push_str(&text);
                    st.raw_name.push(' ');
                } else if in_name {
                    if !st.raw_name.is_empty() && !st.raw_name.ends_with(' ') {
                        st.raw_name.push(' ');
                    }
                    st.raw_name.push_str(&text);
                } else if in_journal_title {
                    st.journal_title.push_str(&text);
                } else if in_year {
                    st.year.push_str(&text);
                } else if in_month {
                    st.month.push_str(&text);
                } else if in_day {
                    st.day.push_str(&text);
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

    debug!(records = records.len(), "parsed PMC article set");
    Ok(records)
}
