// src/roster.rs

use anyhow::Context;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::{debug, instrument};

use crate::error::{PortalError, PortalResult};
use crate::fetch::ResourceFetcher;

/// Header names accepted for each logical column, in priority order.
const ID_KEYS: &[&str] = &["NPM", "npm"];
const NAME_KEYS: &[&str] = &["NAMA", "Nama", "nama"];
const ORDINAL_KEYS: &[&str] = &["NO", "no"];

/// One data row of a roster, pass list or assistant list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub student_id: String,
    /// Blank when the sheet has no name column or the cell is empty.
    pub name: String,
    /// Explicit `NO` column value, if present and numeric.
    pub sequence_number: Option<u32>,
    /// 1-based position among the parsed data rows.
    pub position: usize,
}

impl RosterRow {
    /// Zero-based page of this row in a combined certificate document.
    ///
    /// Uses the explicit ordinal when it is positive, else the row position.
    pub fn page_index(&self) -> usize {
        match self.sequence_number {
            Some(n) if n > 0 => n as usize - 1,
            _ => self.position.saturating_sub(1),
        }
    }

    pub fn matches(&self, student_id: &str) -> bool {
        self.student_id.trim() == student_id.trim()
    }
}

/// First row whose ID equals `student_id` after trimming both sides.
///
/// Case is compared as-is.
pub fn find_student<'a>(rows: &'a [RosterRow], student_id: &str) -> Option<&'a RosterRow> {
    rows.iter().find(|row| row.matches(student_id))
}

/// Fetch `location` and parse its first sheet on the blocking pool.
#[instrument(level = "debug", skip(fetcher))]
pub async fn load_table(fetcher: &dyn ResourceFetcher, location: &str) -> PortalResult<Vec<RosterRow>> {
    let bytes = fetcher.fetch(location).await?;
    let rows = tokio::task::spawn_blocking(move || parse_table(&bytes))
        .await
        .context("table parse task")?
        .map_err(|reason| PortalError::unavailable(location, reason))?;
    debug!(location, rows = rows.len(), "table loaded");
    Ok(rows)
}

/// Parse the first sheet of a workbook (xlsx, xls, xlsb or ods).
///
/// The first row is the header row. Blank data rows are skipped; all other
/// rows are returned in sheet order.
pub fn parse_table(bytes: &[u8]) -> Result<Vec<RosterRow>, String> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| format!("unreadable workbook: {}", e))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| format!("unreadable first sheet: {}", e))?,
        None => return Err("workbook has no sheets".to_string()),
    };
    Ok(rows_from_range(&range))
}

fn rows_from_range(range: &Range<Data>) -> Vec<RosterRow> {
    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Vec::new(),
    };

    let column = |keys: &[&str]| -> Vec<usize> {
        keys.iter()
            .filter_map(|key| header.iter().position(|h| h == key))
            .collect()
    };
    let id_cols = column(ID_KEYS);
    let name_cols = column(NAME_KEYS);
    let ordinal_cols = column(ORDINAL_KEYS);

    // first non-blank cell among the candidate columns
    let pick = |cells: &[Data], cols: &[usize]| -> Option<String> {
        cols.iter()
            .filter_map(|&i| cells.get(i))
            .map(cell_text)
            .find(|text| !text.trim().is_empty())
    };

    rows.filter(|cells| cells.iter().any(|c| !cell_text(c).trim().is_empty()))
        .enumerate()
        .map(|(i, cells)| RosterRow {
            student_id: pick(cells, &id_cols).unwrap_or_default(),
            name: pick(cells, &name_cols).unwrap_or_default(),
            sequence_number: pick(cells, &ordinal_cols).and_then(|s| parse_ordinal(&s)),
            position: i + 1,
        })
        .collect()
}

/// Text form of a cell; whole floats render without a fractional part.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

fn parse_ordinal(text: &str) -> Option<u32> {
    let text = text.trim();
    text.parse::<u32>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u32))
}
