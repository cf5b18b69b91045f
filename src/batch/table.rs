//! Tabular batch input.

use std::collections::HashMap;

use crate::error::BatchError;

/// Parsed rows plus the header names present in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularData {
    pub fields: Vec<String>,
    pub records: Vec<HashMap<String, String>>,
}

impl TabularData {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}

/// Turns uploaded bytes into field-name → value records.
pub trait TabularRecordParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<TabularData, BatchError>;
}

/// CSV with a header row.
///
/// Blank lines are skipped. Short rows simply lack the trailing fields, and
/// values are kept untrimmed.
#[derive(Debug, Clone, Copy)]
pub struct CsvRecordParser {
    pub delimiter: u8,
}

impl Default for CsvRecordParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvRecordParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TabularRecordParser for CsvRecordParser {
    fn parse(&self, bytes: &[u8]) -> Result<TabularData, BatchError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let fields: Vec<String> = reader
            .headers()
            .map_err(|e| BatchError::Parse(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row.map_err(|e| BatchError::Parse(format!("row {}: {}", i + 1, e)))?;
            if row.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            let record = fields
                .iter()
                .zip(row.iter())
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect();
            records.push(record);
        }

        log::debug!("Parsed {} rows with fields {:?}", records.len(), fields);
        Ok(TabularData { fields, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_header_and_rows() {
        let csv = "data,label,fgColor\nhttps://a.example,Shop A,#ff0000\n\nhttps://b.example,,\n";
        let table = CsvRecordParser::new().parse(csv.as_bytes()).unwrap();

        assert_eq!(table.fields, vec!["data", "label", "fgColor"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0]["label"], "Shop A");
        assert_eq!(table.records[1]["label"], "");
        assert!(table.has_field("data"));
    }

    #[test]
    fn test_quoted_values_and_bom() {
        let csv = "\u{feff}data,label\n\"a,b\",\"Say \"\"hi\"\"\"\n";
        let table = CsvRecordParser::new().parse(csv.as_bytes()).unwrap();
        assert_eq!(table.fields[0], "data");
        assert_eq!(table.records[0]["data"], "a,b");
        assert_eq!(table.records[0]["label"], "Say \"hi\"");
    }

    #[test]
    fn test_short_rows_lack_trailing_fields() {
        let csv = "data,label\nonly-data\n";
        let table = CsvRecordParser::new().parse(csv.as_bytes()).unwrap();
        assert_eq!(table.records[0].get("label"), None);
    }

    #[test]
    fn test_missing_data_column_is_reported_as_absent() {
        let table = CsvRecordParser::new().parse(b"url,label\nx,y\n").unwrap();
        assert!(!table.has_field("data"));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let result = CsvRecordParser::new().parse(b"data\n\xff\xfe\n");
        assert!(matches!(result, Err(BatchError::Parse(_))));
    }
}
