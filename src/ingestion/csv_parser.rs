//! CSV Parser - turns raw delimited text into a header and aligned rows

use crate::error::{Result, SandboxError};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

/// How fields are split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvDialect {
    /// Plain split on the delimiter. Quotes are ordinary characters, so a
    /// quoted field containing the delimiter is split in two.
    #[default]
    Simple,

    /// RFC 4180 quoting via the `csv` crate. The delimiter must be ASCII.
    Quoted,
}

/// Header cells (trimmed, not yet sanitized) and rows aligned to them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse `content` into a header and rows.
///
/// Lines that are blank after trimming are dropped entirely. Every row is
/// cut or padded with empty strings to the header's width. Fails with
/// `EmptyInput` when no non-blank line exists.
pub fn parse(content: &str, delimiter: char, dialect: CsvDialect) -> Result<ParsedCsv> {
    let records = match dialect {
        CsvDialect::Simple => split_simple(content, delimiter),
        CsvDialect::Quoted => split_quoted(content, delimiter)?,
    };

    let mut records = records.into_iter();
    let headers = records.next().ok_or(SandboxError::EmptyInput)?;
    let width = headers.len();

    let rows = records
        .map(|mut fields| {
            fields.resize(width, String::new());
            fields
        })
        .collect();

    Ok(ParsedCsv { headers, rows })
}

fn split_simple(content: &str, delimiter: char) -> Vec<Vec<String>> {
    content
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(delimiter)
                .map(|field| field.trim().to_string())
                .collect()
        })
        .collect()
}

fn split_quoted(content: &str, delimiter: char) -> Result<Vec<Vec<String>>> {
    if !delimiter.is_ascii() {
        return Err(SandboxError::Csv(format!(
            "quoted dialect needs an ASCII delimiter, got {:?}",
            delimiter
        )));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut out = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        if fields.iter().all(|f| f.is_empty()) && fields.len() <= 1 {
            continue;
        }
        out.push(fields);
    }

    Ok(out)
}
