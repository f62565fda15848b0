//! CSV checker-upload pipeline
//!
//! The operator selects a CSV, previews the parsed rows page by page,
//! and submits the *original file* to the backend. The server is the
//! single source of truth for validation, deduplication, and
//! insertion; the preview only exists so an operator can eyeball the
//! batch before committing.

use crate::admin::AdminClient;
use crate::error::{ClientError, ClientResult};
use shared::response::UploadReport;
use thiserror::Error;

/// Rows shown per preview page.
pub const PAGE_SIZE: usize = 100;

/// Columns the header row must contain, in any order.
pub const REQUIRED_HEADERS: [&str; 3] = ["serial", "pin", "waec_type"];

/// A user-supplied file: name, declared MIME type, raw bytes.
#[derive(Debug, Clone)]
pub struct CsvFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl CsvFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// A file qualifies if it declares a CSV MIME type or carries a
    /// `.csv` extension.
    pub fn looks_like_csv(&self) -> bool {
        if let Some(content_type) = &self.content_type {
            if content_type.to_lowercase().contains("csv") {
                return true;
            }
        }
        self.name.to_lowercase().ends_with(".csv")
    }
}

/// One parsed preview row. Ragged lines yield empty-string fields
/// rather than failing the whole preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub serial: String,
    pub pin: String,
    pub waec_type: String,
}

/// Errors terminal for a file selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("Please select a CSV file")]
    NotCsv,

    #[error("File is not valid UTF-8 text")]
    NotText,

    #[error("CSV must contain a header row and at least one data row")]
    TooFewLines,

    #[error("Missing required headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),
}

/// Parse the file text into preview rows.
///
/// The header line is trimmed and lower-cased, then the three required
/// columns are located by name, tolerant of order, intolerant of
/// absence.
pub fn parse_preview(text: &str) -> Result<Vec<ParsedRow>, CsvError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(CsvError::TooFewLines);
    }

    let headers: Vec<String> = lines[0]
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CsvError::MissingHeaders(missing));
    }

    let index_of = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let serial_idx = index_of("serial");
    let pin_idx = index_of("pin");
    let type_idx = index_of("waec_type");

    let rows = lines[1..]
        .iter()
        .map(|line| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let field = |idx: usize| fields.get(idx).copied().unwrap_or("").to_string();
            ParsedRow {
                serial: field(serial_idx),
                pin: field(pin_idx),
                waec_type: field(type_idx),
            }
        })
        .collect();

    Ok(rows)
}

/// Number of preview pages for a row count.
pub fn page_count(total_rows: usize) -> usize {
    total_rows.div_ceil(PAGE_SIZE).max(1)
}

#[derive(Debug)]
struct Batch {
    file: CsvFile,
    rows: Vec<ParsedRow>,
    page: usize,
}

/// The upload pipeline state machine.
///
/// `select_file` -> preview/pagination -> `submit` -> report. Parse
/// failures revert to the no-file state; submit failures keep the file
/// selected so the operator can retry without re-choosing it.
#[derive(Debug, Default)]
pub struct UploadPipeline {
    batch: Option<Batch>,
    report: Option<UploadReport>,
}

impl UploadPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a file and parse the preview.
    ///
    /// A file that is not a CSV at all is rejected without touching
    /// existing state. Once a file passes the gate, prior preview and
    /// report are discarded; a parse failure then leaves the pipeline
    /// in the no-file state.
    pub fn select_file(&mut self, file: CsvFile) -> Result<(), CsvError> {
        if !file.looks_like_csv() {
            return Err(CsvError::NotCsv);
        }
        self.batch = None;
        self.report = None;

        let text = std::str::from_utf8(&file.bytes).map_err(|_| CsvError::NotText)?;
        let rows = parse_preview(text)?;

        self.batch = Some(Batch {
            file,
            rows,
            page: 1,
        });
        Ok(())
    }

    pub fn has_file(&self) -> bool {
        self.batch.is_some()
    }

    pub fn total_rows(&self) -> usize {
        self.batch.as_ref().map(|b| b.rows.len()).unwrap_or(0)
    }

    pub fn page_count(&self) -> usize {
        page_count(self.total_rows())
    }

    pub fn current_page(&self) -> usize {
        self.batch.as_ref().map(|b| b.page).unwrap_or(1)
    }

    /// Move to a page, clamped to `[1, page_count]`, and return its
    /// rows. The UI disables out-of-range controls; a direct call with
    /// a bad page number must still land on a real page.
    pub fn goto_page(&mut self, page: usize) -> &[ParsedRow] {
        let last = self.page_count();
        if let Some(batch) = self.batch.as_mut() {
            batch.page = page.clamp(1, last);
        }
        self.page_rows()
    }

    /// Rows of the current page.
    pub fn page_rows(&self) -> &[ParsedRow] {
        match &self.batch {
            Some(batch) => {
                let start = (batch.page - 1) * PAGE_SIZE;
                let end = (start + PAGE_SIZE).min(batch.rows.len());
                &batch.rows[start..end]
            }
            None => &[],
        }
    }

    /// Submit the original file (not the parsed preview) as multipart
    /// form data. On acknowledgment the batch is discarded and the
    /// server's report kept; on network/server failure the file stays
    /// selected for a retry.
    pub async fn submit(&mut self, admin: &AdminClient) -> ClientResult<&UploadReport> {
        let batch = self
            .batch
            .as_ref()
            .ok_or_else(|| ClientError::Validation("No file selected".into()))?;

        match admin.upload_checkers(&batch.file).await {
            Ok(report) => {
                tracing::info!(
                    inserted = report.inserted,
                    skipped = report.skipped,
                    errors = report.errors.len(),
                    "checker upload acknowledged"
                );
                self.batch = None;
                self.report = Some(report);
                Ok(self.report.as_ref().expect("report just stored"))
            }
            Err(err) => {
                tracing::warn!(%err, "checker upload failed");
                Err(err)
            }
        }
    }

    /// The last acknowledged server report, if any.
    pub fn report(&self) -> Option<&UploadReport> {
        self.report.as_ref()
    }

    /// Back to the initial no-file state.
    pub fn clear(&mut self) {
        self.batch = None;
        self.report = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(text: &str) -> CsvFile {
        CsvFile::new("checkers.csv", text.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_headers_any_order() {
        let rows =
            parse_preview("pin,waec_type,serial\n1234,BECE,WB001\n5678,WASSCE,WB002").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            ParsedRow {
                serial: "WB001".into(),
                pin: "1234".into(),
                waec_type: "BECE".into(),
            }
        );
    }

    #[test]
    fn test_parse_header_case_insensitive() {
        let rows = parse_preview("Serial,PIN,Waec_Type\nS1,P1,BECE").unwrap();
        assert_eq!(rows[0].serial, "S1");
    }

    #[test]
    fn test_missing_headers_all_named() {
        let err = parse_preview("serial,foo\nS1,x").unwrap_err();
        assert_eq!(
            err,
            CsvError::MissingHeaders(vec!["pin".into(), "waec_type".into()])
        );
        assert!(err.to_string().contains("pin"));
        assert!(err.to_string().contains("waec_type"));
    }

    #[test]
    fn test_header_only_fails_fast() {
        // A matching header with zero data rows must not upload an
        // empty batch.
        assert_eq!(
            parse_preview("serial,pin,waec_type\n\n"),
            Err(CsvError::TooFewLines)
        );
        assert_eq!(parse_preview(""), Err(CsvError::TooFewLines));
    }

    #[test]
    fn test_ragged_rows_yield_empty_fields() {
        let rows = parse_preview("serial,pin,waec_type\nS1\nS2,P2").unwrap();
        assert_eq!(rows[0].pin, "");
        assert_eq!(rows[0].waec_type, "");
        assert_eq!(rows[1].pin, "P2");
        assert_eq!(rows[1].waec_type, "");
    }

    #[test]
    fn test_row_count_matches_data_lines() {
        let mut text = String::from("serial,pin,waec_type\n");
        for i in 0..250 {
            text.push_str(&format!("S{i},P{i},BECE\n"));
        }
        let rows = parse_preview(&text).unwrap();
        assert_eq!(rows.len(), 250);
    }

    #[test]
    fn test_pagination_windows() {
        let mut text = String::from("serial,pin,waec_type\n");
        for i in 0..250 {
            text.push_str(&format!("S{i},P{i},BECE\n"));
        }
        let mut pipeline = UploadPipeline::new();
        pipeline.select_file(csv(&text)).unwrap();

        assert_eq!(pipeline.page_count(), 3);

        let page1 = pipeline.goto_page(1);
        assert_eq!(page1.len(), 100);
        assert_eq!(page1[0].serial, "S0");
        assert_eq!(page1[99].serial, "S99");

        let page3 = pipeline.goto_page(3);
        assert_eq!(page3.len(), 50);
        assert_eq!(page3[0].serial, "S200");
        assert_eq!(page3[49].serial, "S249");
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        let mut pipeline = UploadPipeline::new();
        pipeline
            .select_file(csv("serial,pin,waec_type\nS1,P1,BECE"))
            .unwrap();

        pipeline.goto_page(99);
        assert_eq!(pipeline.current_page(), 1);
        pipeline.goto_page(0);
        assert_eq!(pipeline.current_page(), 1);
    }

    #[test]
    fn test_reject_non_csv_without_state_change() {
        let mut pipeline = UploadPipeline::new();
        pipeline
            .select_file(csv("serial,pin,waec_type\nS1,P1,BECE\nS2,P2,WASSCE"))
            .unwrap();
        assert!(pipeline.has_file());

        let not_csv = CsvFile::new("photo.png", vec![1, 2, 3]);
        assert_eq!(pipeline.select_file(not_csv), Err(CsvError::NotCsv));
        // The rejected selection left the prior preview untouched
        assert!(pipeline.has_file());
        assert_eq!(pipeline.total_rows(), 2);
        assert_eq!(pipeline.page_rows()[0].serial, "S1");
    }

    #[test]
    fn test_reject_non_csv_keeps_prior_report() {
        let mut pipeline = UploadPipeline::new();
        pipeline.report = Some(UploadReport {
            inserted: 5,
            skipped: 1,
            errors: vec![],
        });

        let not_csv = CsvFile::new("photo.png", vec![1, 2, 3]);
        assert_eq!(pipeline.select_file(not_csv), Err(CsvError::NotCsv));
        assert_eq!(pipeline.report().unwrap().inserted, 5);

        // An accepted file is what discards the old report
        pipeline
            .select_file(csv("serial,pin,waec_type\nS1,P1,BECE"))
            .unwrap();
        assert!(pipeline.report().is_none());
    }

    #[test]
    fn test_mime_type_without_extension_accepted() {
        let file = CsvFile::new("export", b"serial,pin,waec_type\nS1,P1,BECE".to_vec())
            .with_content_type("text/csv");
        let mut pipeline = UploadPipeline::new();
        pipeline.select_file(file).unwrap();
        assert_eq!(pipeline.total_rows(), 1);
    }

    #[test]
    fn test_parse_failure_reverts_to_no_file() {
        let mut pipeline = UploadPipeline::new();
        assert!(pipeline.select_file(csv("serial,foo\nS1,x")).is_err());
        assert!(!pipeline.has_file());
        assert!(pipeline.page_rows().is_empty());
    }
}
