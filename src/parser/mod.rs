//! HTML parsing and data extraction
//!
//! This module turns an upstream olddb result page into structured
//! [`Spot`] records. The page carries the spots in the third table of the
//! body, behind two header rows, with `&nbsp;`-padded cells.
//!
//! Malformed rows (too few cells, an unparsable number, or a missing
//! required field) are dropped record-by-record; only a page without the
//! expected table is reported as an error.

use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

use crate::error::ParseError;
use crate::models::Spot;

/// Cell layout of an olddb result row.
const MIN_CELLS: usize = 13;

fn table_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("body > table").expect("invalid css selector"))
}

fn row_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("tr").expect("invalid css selector"))
}

fn cell_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("td").expect("invalid css selector"))
}

/// Parse an olddb result page into spots.
///
/// # Errors
///
/// Returns [`ParseError::TableNotFound`] when the page does not contain
/// the expected spot table.
pub fn parse_spots(html: &str) -> Result<Vec<Spot>, ParseError> {
    let document = Html::parse_document(html);

    // The spots live in the third table of the body; the first two hold
    // the query form and the result summary.
    let table = document
        .select(table_selector())
        .nth(2)
        .ok_or(ParseError::TableNotFound)?;

    let mut spots = Vec::new();
    for row in table.select(row_selector()).skip(2) {
        let cells: Vec<String> = row.select(cell_selector()).map(cell_text).collect();
        if cells.len() < MIN_CELLS {
            continue;
        }
        match parse_row(&cells) {
            Some(spot) => spots.push(spot),
            None => {
                tracing::trace!(row = ?cells, "skipping malformed spot row");
            }
        }
    }

    Ok(spots)
}

/// Collapse a cell into clean text: entity-decoded `&nbsp;` padding is
/// stripped entirely, surrounding whitespace trimmed.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .replace('\u{a0}', "")
        .trim()
        .to_string()
}

/// Parse one cleaned row into a spot, or `None` when any required field
/// is absent or unparsable.
fn parse_row(cells: &[String]) -> Option<Spot> {
    let timestamp = NaiveDateTime::parse_from_str(&cells[0], "%Y-%m-%d %H:%M")
        .ok()?
        .and_utc();

    let call = required(&cells[1])?;
    let frequency_hz = (cells[2].parse::<f64>().ok()? * 1_000_000.0).round() as i64;
    let snr = cells[3].parse().ok()?;
    let drift = cells[4].parse().ok()?;
    let grid = required(&cells[5])?;
    let power_dbm = cells[6].parse().ok()?;
    let power_w = cells[7].parse().ok()?;
    let reporter = required(&cells[8])?;
    let reporter_grid = required(&cells[9])?;
    let distance_km = cells[10].parse().ok()?;
    let distance_mi = cells[11].parse().ok()?;
    let mode = required(&cells[12])?;
    let version = cells.get(13).map(|v| v.to_string()).filter(|v| !v.is_empty());

    Some(Spot::new(
        timestamp,
        call,
        frequency_hz,
        snr,
        drift,
        grid,
        power_dbm,
        power_w,
        reporter,
        reporter_grid,
        distance_km,
        distance_mi,
        mode,
        version,
    ))
}

fn required(cell: &str) -> Option<&str> {
    if cell.is_empty() {
        None
    } else {
        Some(cell)
    }
}
