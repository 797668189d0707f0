//! CSV parsing for the batch import pipeline
//!
//! Tolerant of header casing and spacing; row-level deserialization failures
//! become per-row errors for the validator instead of failing the upload.

use super::ImportError;
use crate::domain::ImportRow;
use csv::{ReaderBuilder, StringRecord, Trim};

/// Columns a data row cannot be built without
const REQUIRED_COLUMNS: &[&str] = &["product_id", "device", "start_led", "led_count"];

/// One CSV data row, parsed or failed
#[derive(Debug)]
pub struct ParsedRow {
	/// 1-based line in the upload (header is line 1)
	pub line: usize,
	pub result: Result<ImportRow, String>,
}

/// Parse CSV text into rows, checking only structure
///
/// Business validation (products, devices, ranges) happens in the validate
/// phase; this stage fails the whole upload only for an empty file or
/// missing required columns.
pub fn parse_rows(content: &str) -> Result<Vec<ParsedRow>, ImportError> {
	if content.trim().is_empty() {
		return Err(ImportError::EmptyInput);
	}

	let mut reader = ReaderBuilder::new()
		.trim(Trim::All)
		.from_reader(content.as_bytes());

	let headers: Vec<String> = reader
		.headers()
		.map_err(ImportError::Parse)?
		.iter()
		.map(normalize_header)
		.collect();

	let missing: Vec<&str> = REQUIRED_COLUMNS
		.iter()
		.copied()
		.filter(|required| !headers.iter().any(|h| h == required))
		.collect();
	if !missing.is_empty() {
		return Err(ImportError::MissingColumns(missing.join(", ")));
	}

	reader.set_headers(StringRecord::from(headers));

	let rows: Vec<ParsedRow> = reader
		.deserialize::<ImportRow>()
		.enumerate()
		.map(|(index, result)| ParsedRow {
			line: index + 2,
			result: result.map_err(|e| e.to_string()),
		})
		.collect();

	if rows.is_empty() {
		return Err(ImportError::EmptyInput);
	}

	Ok(rows)
}

fn normalize_header(header: &str) -> String {
	header.trim().to_lowercase().replace([' ', '-'], "_")
}
