//! Minimal HXL-tagged CSV reader
//!
//! An HXL table is an ordinary CSV file with one extra row of hashtags
//! (`#org+impl`, `#adm1+name`, ...) somewhere near the top. Columns are
//! addressed by tag pattern rather than header text, so spreadsheets with
//! differently-worded headers still line up.

use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use thiserror::Error;

/// A hashtag with its attributes, e.g. `#org +impl` -> (`org`, [`impl`])
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pub tag: String,
    pub attributes: Vec<String>,
}

impl TagPattern {
    /// Parse a hashtag; returns `None` for text that is not a hashtag
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let body = text.strip_prefix('#')?;
        let mut parts = body.split('+').map(|p| p.trim().to_lowercase());
        let tag = parts.next().filter(|t| is_tag_word(t))?;
        let attributes: Vec<String> = parts.filter(|a| !a.is_empty()).collect();
        if attributes.iter().any(|a| !is_tag_word(a)) {
            return None;
        }
        Some(Self { tag, attributes })
    }

    /// True when `column` has this tag and at least these attributes
    pub fn matches(&self, column: &TagPattern) -> bool {
        self.tag == column.tag && self.attributes.iter().all(|a| column.attributes.contains(a))
    }
}

fn is_tag_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// True when every non-blank cell is a hashtag and there is at least one
fn is_hashtag_row(record: &StringRecord) -> bool {
    let mut seen = false;
    for cell in record.iter().map(str::trim).filter(|c| !c.is_empty()) {
        if TagPattern::parse(cell).is_none() {
            return false;
        }
        seen = true;
    }
    seen
}

/// Parsed HXL table: column tags plus the data rows below the hashtag row
#[derive(Debug)]
pub struct HxlTable {
    columns: Vec<Option<TagPattern>>,
    rows: Vec<StringRecord>,
    bad_rows: Vec<(usize, String)>,
}

/// Why a table could not be read
#[derive(Debug, Error)]
pub enum HxlReadError {
    #[error("no HXL hashtag row found")]
    NoHashtags,

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl HxlTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, HxlReadError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut columns = None;
        let mut rows = Vec::new();
        let mut bad_rows = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let row_num = idx + 1;
            let record = match result {
                Ok(r) => r,
                // An I/O failure means the rest of the file is unreadable
                Err(e) if e.is_io_error() => return Err(HxlReadError::Csv(e)),
                Err(e) => {
                    bad_rows.push((row_num, e.to_string()));
                    continue;
                }
            };
            if columns.is_none() {
                if is_hashtag_row(&record) {
                    columns = Some(record.iter().map(TagPattern::parse).collect());
                }
                continue;
            }
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            rows.push(record);
        }

        let columns = columns.ok_or(HxlReadError::NoHashtags)?;
        Ok(Self {
            columns,
            rows,
            bad_rows,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = HxlRow<'_>> {
        self.rows.iter().map(move |record| HxlRow {
            columns: &self.columns,
            record,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that failed to parse, as (1-based line, message)
    pub fn bad_rows(&self) -> &[(usize, String)] {
        &self.bad_rows
    }
}

/// One data row, addressed by tag pattern
#[derive(Debug, Clone, Copy)]
pub struct HxlRow<'a> {
    columns: &'a [Option<TagPattern>],
    record: &'a StringRecord,
}

impl<'a> HxlRow<'a> {
    /// First non-blank value in a column matching `pattern` (e.g. `#org+impl`)
    pub fn get(&self, pattern: &str) -> Option<&'a str> {
        let query = TagPattern::parse(pattern)?;
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.as_ref().is_some_and(|c| query.matches(c)))
            .filter_map(|(i, _)| self.record.get(i))
            .find(|value| !value.trim().is_empty())
    }
}
