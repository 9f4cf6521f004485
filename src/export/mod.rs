//! Spreadsheet export of tables, the database schema and the report list.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use thiserror::Error;
use tokio::task;
use tracing::info;

use crate::db::{
    models::ReportSummary,
    tables::{CellValue, Table, TableData},
    Store, StoreError,
};

/// Excel's limit on sheet name length.
const SHEET_NAME_MAX: usize = 31;
const MAX_COLUMN_WIDTH: usize = 50;
const DEFAULT_SHEET: &str = "Data";

const SCHEMA_HEADERS: [&str; 5] = ["Column", "Type", "Required", "Primary key", "Default"];
const REPORT_HEADERS: [&str; 7] = ["ID", "Type", "Pool", "Period", "Author", "Formed at", "Status"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no data to export")]
    NoData,

    #[error("no column names given")]
    NoColumns,

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("export task failed: {0}")]
    Task(#[from] task::JoinError),
}

/// Writes workbooks into a fixed directory unless given an explicit target.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// One-sheet workbook with a styled header row. Returns the written path.
    pub fn export_table(
        &self,
        data: &TableData,
        target: Option<&Path>,
        sheet_name: &str,
    ) -> Result<PathBuf, ExportError> {
        check_exportable(data)?;
        let path = self.resolve(target, "export")?;

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(safe_sheet_name(sheet_name))?;
        write_sheet(sheet, data)?;
        workbook.save(&path)?;

        info!(path = %path.display(), rows = data.rows.len(), "Table exported");
        Ok(path)
    }

    /// One sheet per application table describing its columns.
    pub async fn export_schema(
        &self,
        store: &Store,
        target: Option<&Path>,
    ) -> Result<PathBuf, ExportError> {
        let mut sheets = Vec::new();
        for name in store.get_table_names().await? {
            let Ok(table) = name.parse::<Table>() else {
                continue;
            };
            let columns = store.get_table_columns(table).await?;
            let data = TableData {
                columns: SCHEMA_HEADERS.map(str::to_owned).to_vec(),
                rows: columns
                    .into_iter()
                    .map(|c| {
                        vec![
                            c.name.into(),
                            c.data_type.into(),
                            yes_no(c.not_null).into(),
                            yes_no(c.primary_key).into(),
                            c.default_value.into(),
                        ]
                    })
                    .collect(),
            };
            sheets.push((table, data));
        }
        if sheets.is_empty() {
            return Err(ExportError::NoData);
        }

        let exporter = self.clone();
        let target = target.map(Path::to_path_buf);
        task::spawn_blocking(move || exporter.write_schema(&sheets, target.as_deref())).await?
    }

    fn write_schema(
        &self,
        sheets: &[(Table, TableData)],
        target: Option<&Path>,
    ) -> Result<PathBuf, ExportError> {
        let path = self.resolve(target, "database_schema")?;
        let mut workbook = Workbook::new();
        for (table, data) in sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(safe_sheet_name(table.as_str()))?;
            write_sheet(sheet, data)?;
        }
        workbook.save(&path)?;

        info!(path = %path.display(), tables = sheets.len(), "Database schema exported");
        Ok(path)
    }

    /// The report list as shown to operators, one row per report.
    pub fn export_reports(
        &self,
        reports: &[ReportSummary],
        target: Option<&Path>,
    ) -> Result<PathBuf, ExportError> {
        self.export_table(&reports_table(reports), target, "Reports")
    }

    fn resolve(&self, target: Option<&Path>, prefix: &str) -> Result<PathBuf, ExportError> {
        let path = match target {
            Some(t) if t.is_absolute() => t.to_path_buf(),
            Some(t) => self.dir.join(t),
            None => self.dir.join(default_file_name(prefix, Local::now())),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}

/// `<prefix>_YYYYMMDD_HHMMSS.xlsx`
pub fn default_file_name(prefix: &str, now: DateTime<Local>) -> String {
    format!("{prefix}_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Make `name` acceptable to Excel as a worksheet name.
pub fn safe_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '[' | ']' => '_',
            other => other,
        })
        .take(SHEET_NAME_MAX)
        .collect();

    if replaced.trim().is_empty() {
        DEFAULT_SHEET.to_owned()
    } else {
        replaced
    }
}

pub fn reports_table(reports: &[ReportSummary]) -> TableData {
    TableData {
        columns: REPORT_HEADERS.map(str::to_owned).to_vec(),
        rows: reports
            .iter()
            .map(|r| {
                vec![
                    r.id.into(),
                    r.report_type.label().into(),
                    r.pool_name.as_deref().unwrap_or("Not set").into(),
                    format!("{} - {}", r.period_start, r.period_end).into(),
                    r.author_name().unwrap_or_else(|| "Unknown".to_owned()).into(),
                    r.formed_at.format("%Y-%m-%d %H:%M").to_string().into(),
                    (if r.is_filled() { "Filled" } else { "Empty" }).into(),
                ]
            })
            .collect(),
    }
}

fn check_exportable(data: &TableData) -> Result<(), ExportError> {
    if data.columns.is_empty() {
        return Err(ExportError::NoColumns);
    }
    if data.rows.is_empty() {
        return Err(ExportError::NoData);
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x366092))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
}

fn cell_format() -> Format {
    Format::new()
        .set_font_size(10)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
}

fn write_sheet(sheet: &mut Worksheet, data: &TableData) -> Result<(), XlsxError> {
    let header = header_format();
    let body = cell_format();
    let mut widths: Vec<usize> = data.columns.iter().map(|c| c.chars().count()).collect();

    for (col, name) in data.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header)?;
    }

    for (r, row) in data.rows.iter().enumerate() {
        let xl_row = (r + 1) as u32;
        // Cells beyond the header count are dropped.
        for (col, cell) in row.iter().take(data.columns.len()).enumerate() {
            let xl_col = col as u16;
            match cell {
                CellValue::Integer(v) => {
                    sheet.write_number_with_format(xl_row, xl_col, *v as f64, &body)?;
                }
                CellValue::Real(v) => {
                    sheet.write_number_with_format(xl_row, xl_col, *v, &body)?;
                }
                CellValue::Text(s) => {
                    sheet.write_string_with_format(xl_row, xl_col, s, &body)?;
                }
                CellValue::Empty => {
                    sheet.write_blank(xl_row, xl_col, &body)?;
                }
            }
            widths[col] = widths[col].max(cell.to_text().chars().count());
        }
    }

    for (col, width) in widths.into_iter().enumerate() {
        sheet.set_column_width(col as u16, column_width(width) as f64)?;
    }
    Ok(())
}

fn column_width(longest: usize) -> usize {
    (longest + 2).min(MAX_COLUMN_WIDTH)
}
