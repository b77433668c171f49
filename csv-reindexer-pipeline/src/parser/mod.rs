//! Record parser.
//!
//! Streams delimited lines from the source, validates the header against the
//! index mapping and turns each following line into a [`Document`]. A single
//! forward pass; the parser cannot be rewound.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::debug;

use crate::errors::IngestError;
use csv_reindexer_shared::{Document, FieldValue, IndexMapping, IngestionRequest};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Check that every header field is a mapped property.
pub fn validate_header(
    header: &[String],
    mapping: &IndexMapping,
    alias: &str,
) -> Result<(), IngestError> {
    for field in header {
        if !mapping.has_property(field) {
            return Err(IngestError::schema(format!(
                "mapping field not found, alias: {}, field: {}",
                alias, field
            )));
        }
    }
    Ok(())
}

/// Build a document from one split row.
///
/// The first column is the id; the others become the body in header order.
/// Callers must have checked that `fields` and `header` have equal length.
pub fn build_document(header: &[String], fields: &[&str], array_delimiter: Option<&str>) -> Document {
    let id = fields.first().copied().unwrap_or_default();
    let body = header
        .iter()
        .zip(fields.iter())
        .skip(1)
        .map(|(name, raw)| (name.clone(), FieldValue::parse(raw, array_delimiter)))
        .collect();

    Document {
        id: id.to_string(),
        fields: body,
    }
}

/// Lazily parses documents out of a line stream.
pub struct RecordParser<R> {
    lines: Lines<R>,
    header: Vec<String>,
    field_delimiter: String,
    array_delimiter: Option<String>,
    line_number: usize,
    rows_read: usize,
}

impl<R: AsyncBufRead + Unpin> RecordParser<R> {
    /// Read and validate the header line.
    ///
    /// An empty input or a header naming an unmapped field is a
    /// `SchemaValidationError`.
    pub async fn open(reader: R, request: &IngestionRequest) -> Result<Self, IngestError> {
        let mut lines = reader.lines();

        let header_line = lines
            .next_line()
            .await?
            .ok_or_else(|| IngestError::schema(format!("{} has no header line", request.key)))?;

        let header: Vec<String> = header_line
            .trim_start_matches(BYTE_ORDER_MARK)
            .split(request.field_delimiter.as_str())
            .map(str::to_string)
            .collect();

        validate_header(&header, &request.mapping, &request.alias)?;
        debug!(fields = ?header, "Validated header");

        Ok(Self {
            lines,
            header,
            field_delimiter: request.field_delimiter.clone(),
            array_delimiter: request.array_delimiter.clone(),
            line_number: 1,
            rows_read: 0,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows turned into documents so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Parse the next row, or `None` at end of input.
    ///
    /// A row whose field count differs from the header ends the run with
    /// `FieldCountMismatchError`.
    pub async fn next_document(&mut self) -> Result<Option<Document>, IngestError> {
        let Some(line) = self.lines.next_line().await? else {
            return Ok(None);
        };
        self.line_number += 1;

        let fields: Vec<&str> = line.split(self.field_delimiter.as_str()).collect();
        if fields.len() != self.header.len() {
            return Err(IngestError::field_count_mismatch(
                self.line_number,
                self.header.len(),
                fields.len(),
            ));
        }

        self.rows_read += 1;
        Ok(Some(build_document(
            &self.header,
            &fields,
            self.array_delimiter.as_deref(),
        )))
    }
}
