//! In-memory workbook layout and the atomic spreadsheet writer.

use super::blocks::Cell;
use crate::error::{DashboardError, Result};
use rust_xlsxwriter::{Format, Image, Workbook, Worksheet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CLEANED_SHEET: &str = "Cleaned_Data";
pub const SUMMARY_SHEET: &str = "Summary";

/// An image placed with its top-left corner on a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnchor {
    pub row: u32,
    pub col: u16,
    pub path: PathBuf,
}

/// One worksheet: a grid of rows plus anchored images.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetLayout {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
    /// Rows rendered in bold (titles and headers).
    pub bold_rows: Vec<u32>,
    pub images: Vec<ImageAnchor>,
}

impl SheetLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Index of the next row to be written.
    pub fn cursor(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn push_bold_row(&mut self, row: Vec<Cell>) {
        self.bold_rows.push(self.cursor());
        self.rows.push(row);
    }

    pub fn push_blank_rows(&mut self, count: u32) {
        for _ in 0..count {
            self.rows.push(Vec::new());
        }
    }

    /// Find the first row whose leading cell is `text`.
    pub fn find_row(&self, text: &str) -> Option<u32> {
        self.rows
            .iter()
            .position(|row| matches!(row.first(), Some(Cell::Text(t)) if t == text))
            .map(|row| row as u32)
    }
}

/// Every sheet of a report, in tab order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookLayout {
    pub sheets: Vec<SheetLayout>,
}

impl WorkbookLayout {
    pub fn sheet(&self, name: &str) -> Option<&SheetLayout> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn image_count(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.images.len()).sum()
    }
}

/// Save a layout as an xlsx file.
///
/// The workbook is first saved next to `dest` and then renamed onto it, so
/// a failed save never leaves a partial report at `dest`.
pub fn save_workbook(layout: &WorkbookLayout, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| DashboardError::write(parent, e))?;
    }

    let mut workbook = Workbook::new();
    for sheet in &layout.sheets {
        let worksheet = build_worksheet(sheet).map_err(|e| DashboardError::write(dest, e))?;
        workbook.push_worksheet(worksheet);
    }

    let staging = staging_path(dest);
    if let Err(e) = workbook.save(&staging) {
        discard(&staging);
        return Err(DashboardError::write(dest, e));
    }
    if let Err(e) = fs::rename(&staging, dest) {
        discard(&staging);
        return Err(DashboardError::write(dest, e));
    }

    info!(
        "Report saved: {} ({} sheets, {} images)",
        dest.display(),
        layout.sheets.len(),
        layout.image_count()
    );
    Ok(())
}

fn build_worksheet(sheet: &SheetLayout) -> std::result::Result<Worksheet, rust_xlsxwriter::XlsxError> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(&sheet.name)?;
    let bold = Format::new().set_bold();

    for (row, cells) in sheet.rows.iter().enumerate() {
        let row = row as u32;
        let is_bold = sheet.bold_rows.contains(&row);
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            match (cell, is_bold) {
                (Cell::Text(text), true) => {
                    worksheet.write_string_with_format(row, col, text, &bold)?;
                }
                (Cell::Text(text), false) => {
                    worksheet.write_string(row, col, text)?;
                }
                (Cell::Number(value), _) => {
                    worksheet.write_number(row, col, *value)?;
                }
                (Cell::Blank, _) => {}
            }
        }
    }

    for anchor in &sheet.images {
        let image = Image::new(&anchor.path)?;
        worksheet.insert_image(anchor.row, anchor.col, &image)?;
        debug!(
            "Embedded '{}' at {}!R{}C{}",
            anchor.path.display(),
            sheet.name,
            anchor.row + 1,
            anchor.col + 1
        );
    }

    Ok(worksheet)
}

fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    dest.with_file_name(format!(".{}.partial", name))
}

fn discard(staging: &Path) {
    if staging.exists()
        && let Err(e) = fs::remove_file(staging)
    {
        warn!("Could not remove '{}': {}", staging.display(), e);
    }
}
