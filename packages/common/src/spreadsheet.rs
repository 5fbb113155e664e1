//! Extraction of URLs from uploaded `.xlsx` workbooks.
//!
//! Only the first worksheet is read and its first row is treated as the header.
//! The URL column is located by an ordered chain of strategies: header alias
//! match, then content sniffing, then the first column.

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use tracing::debug;

use crate::url::{has_scheme, normalize_and_validate};

/// Header names recognized as the URL column, in priority order.
const URL_COLUMN_ALIASES: &[&str] = &[
    "url", "urls", "link", "links", "website", "websites", "web", "site", "sites", "domain",
    "domains", "address", "addresses",
];

/// Number of non-empty values sampled per column when sniffing content.
const SNIFF_SAMPLE: usize = 5;

/// A worksheet reduced to trimmed text cells; `None` marks an empty cell.
pub type Table = Vec<Vec<Option<String>>>;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Cannot read Excel file: {0}")]
    Unreadable(String),
    #[error("Excel file is empty")]
    EmptySheet,
    #[error("URL column not found")]
    NoUrlColumn,
    #[error("No valid URLs found in Excel file")]
    NoUrls,
}

/// How the URL column was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStrategy {
    HeaderAlias,
    ContentSniff,
    FirstColumn,
}

/// A data cell that could not be turned into a valid URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based index of the data row (the header is not counted).
    pub row: usize,
    pub value: String,
}

impl RejectedRow {
    pub fn message(&self) -> String {
        format!("Row {}: Invalid URL - {}", self.row, self.value)
    }
}

/// Result of ingesting a worksheet.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Normalized URLs, deduplicated, in first-occurrence order.
    pub urls: Vec<String>,
    pub rejected: Vec<RejectedRow>,
    pub column: usize,
    pub strategy: ColumnStrategy,
}

type Strategy = fn(&[Option<String>], &[Vec<Option<String>>], usize) -> Option<usize>;

const STRATEGIES: &[(ColumnStrategy, Strategy)] = &[
    (ColumnStrategy::HeaderAlias, by_header_alias),
    (ColumnStrategy::ContentSniff, by_content),
    (ColumnStrategy::FirstColumn, first_column),
];

/// Read the first worksheet of an `.xlsx` workbook and extract its URLs.
pub fn ingest_xlsx(bytes: &[u8]) -> Result<IngestReport, IngestError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| IngestError::Unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptySheet)?
        .map_err(|e| IngestError::Unreadable(e.to_string()))?;

    let table: Table = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    ingest_table(&table)
}

/// Extract URLs from an already-decoded worksheet.
pub fn ingest_table(table: &[Vec<Option<String>>]) -> Result<IngestReport, IngestError> {
    let Some((header, data)) = table.split_first() else {
        return Err(IngestError::EmptySheet);
    };
    if data.iter().all(|row| row.iter().all(Option::is_none)) {
        return Err(IngestError::EmptySheet);
    }

    let width = table.iter().map(Vec::len).max().unwrap_or(0);
    let (column, strategy) = detect_url_column(header, data, width)?;
    debug!(column, ?strategy, "URL column detected");

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let mut rejected = Vec::new();

    for (i, row) in data.iter().enumerate() {
        let Some(value) = cell(row, column) else {
            continue;
        };
        match normalize_and_validate(value) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
            Err(_) => rejected.push(RejectedRow {
                row: i + 1,
                value: value.to_string(),
            }),
        }
    }

    if urls.is_empty() {
        return Err(IngestError::NoUrls);
    }

    Ok(IngestReport {
        urls,
        rejected,
        column,
        strategy,
    })
}

/// Run the strategy chain and return the first column any strategy picks.
pub fn detect_url_column(
    header: &[Option<String>],
    data: &[Vec<Option<String>>],
    width: usize,
) -> Result<(usize, ColumnStrategy), IngestError> {
    STRATEGIES
        .iter()
        .find_map(|(kind, strategy)| strategy(header, data, width).map(|col| (col, *kind)))
        .ok_or(IngestError::NoUrlColumn)
}

/// A value looks like a URL if it carries a scheme or contains a dot.
pub fn looks_like_url(value: &str) -> bool {
    has_scheme(value) || value.contains('.')
}

fn by_header_alias(
    header: &[Option<String>],
    _data: &[Vec<Option<String>>],
    _width: usize,
) -> Option<usize> {
    let names: Vec<Option<String>> = header
        .iter()
        .map(|c| c.as_deref().map(str::to_lowercase))
        .collect();
    URL_COLUMN_ALIASES.iter().find_map(|alias| {
        names
            .iter()
            .position(|name| name.as_deref() == Some(*alias))
    })
}

fn by_content(
    _header: &[Option<String>],
    data: &[Vec<Option<String>>],
    width: usize,
) -> Option<usize> {
    (0..width).find(|&col| {
        let sample: Vec<&str> = data
            .iter()
            .filter_map(|row| cell(row, col))
            .take(SNIFF_SAMPLE)
            .collect();
        if sample.is_empty() {
            return false;
        }
        let hits = sample.iter().filter(|v| looks_like_url(v)).count();
        hits * 2 > sample.len()
    })
}

fn first_column(
    _header: &[Option<String>],
    _data: &[Vec<Option<String>>],
    width: usize,
) -> Option<usize> {
    (width > 0).then_some(0)
}

fn cell(row: &[Option<String>], col: usize) -> Option<&str> {
    row.get(col).and_then(|c| c.as_deref())
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}
