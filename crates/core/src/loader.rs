use crate::error::IngestError;
use crate::models::Record;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    Utf16,
    Windows1252,
}

impl TextEncoding {
    fn from_bom_encoding(encoding: &'static Encoding) -> Self {
        if encoding == UTF_16LE || encoding == UTF_16BE {
            Self::Utf16
        } else if encoding == UTF_8 {
            Self::Utf8
        } else {
            Self::Windows1252
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Windows1252 => "windows-1252",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
    pub encoding: TextEncoding,
}

/// Decodes raw file bytes: BOM-declared encoding first, then strict UTF-8,
/// then Windows-1252, which accepts any byte sequence.
pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        if let Some(text) =
            encoding.decode_without_bom_handling_and_without_replacement(&bytes[bom_length..])
        {
            return (text.into_owned(), TextEncoding::from_bom_encoding(encoding));
        }
    }

    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return (text.into_owned(), TextEncoding::Utf8);
    }

    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (text.into_owned(), TextEncoding::Windows1252)
}

pub fn parse_table(text: &str, encoding: TextEncoding) -> Result<Table, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (column, value) in headers.iter().zip(row.iter()) {
            record.insert(column.clone(), value);
        }
        records.push(record);
    }

    Ok(Table {
        headers,
        records,
        encoding,
    })
}

pub fn read_table(path: &Path) -> Result<Table, IngestError> {
    if !path.exists() {
        return Err(IngestError::SourceNotFound(path.display().to_string()));
    }

    let bytes = fs::read(path)?;
    let (text, encoding) = decode_text(&bytes);
    let table = parse_table(&text, encoding)?;

    tracing::debug!(
        path = %path.display(),
        %encoding,
        rows = table.records.len(),
        columns = table.headers.len(),
        "loaded table"
    );

    Ok(table)
}
