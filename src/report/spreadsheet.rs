//! Spreadsheet export of the crime-data views.
//!
//! Sheets are first laid out as rows of cells, then written as `.xlsx`
//! with `rust_xlsxwriter`. Counts are written as numeric cells.

use crate::analysis::summary::{column_headers, CaseSummary, CategoryTally, DateRange};
use crate::analysis::trend::{MonthCount, QuarterTrend};
use crate::analysis::Stats;
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUMMARY_TITLE: &str = "Rekapitulasi Data Gangguan Kamtibmas";
pub const TREND_TITLE: &str = "Tren Kasus 3 Bulan Terakhir";

const CATEGORY_COLUMN_WIDTH: f64 = 30.0;
const SUMMARY_COLUMN_WIDTH: f64 = 10.0;
const TREND_COLUMN_WIDTH: f64 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Number(n as f64)
    }
}

/// One worksheet, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub file_name: String,
    pub column_widths: Vec<f64>,
    /// Index of the header row, written in bold along with the title.
    pub header_row: usize,
    pub rows: Vec<Vec<Cell>>,
}

fn tally_row(label: &str, tally: &CategoryTally) -> Vec<Cell> {
    let mut row = vec![Cell::text(label)];
    row.extend(tally.columns().into_iter().map(Cell::from));
    row
}

/// The `Rekapitulasi GK` sheet.
///
/// Title, period line, blank row, header, one row per case type and the
/// `Total` row. An empty summary still carries a zero `Total` row.
pub fn summary_sheet(summary: &Stats<CaseSummary>, range: Option<&DateRange>) -> Sheet {
    let mut header = vec![Cell::text("Kasus")];
    header.extend(column_headers().into_iter().map(Cell::text));

    let mut rows = vec![
        vec![Cell::text(SUMMARY_TITLE)],
        vec![Cell::text(DateRange::period_label(range))],
        Vec::new(),
        header,
    ];

    let totals = match summary.data() {
        Some(data) => {
            rows.extend(data.rows.iter().map(|(case_type, tally)| tally_row(case_type, tally)));
            data.totals
        }
        None => CategoryTally::default(),
    };
    rows.push(tally_row("Total", &totals));

    let file_name = match range {
        Some(r) => format!(
            "Rekapitulasi_GK_{}_{}.xlsx",
            r.start.format("%Y-%m-%d"),
            r.end.format("%Y-%m-%d")
        ),
        None => "Rekapitulasi_GK_semua_data.xlsx".to_string(),
    };

    let mut column_widths = vec![CATEGORY_COLUMN_WIDTH];
    column_widths.extend(std::iter::repeat(SUMMARY_COLUMN_WIDTH).take(8));

    Sheet {
        name: "Rekapitulasi GK",
        file_name,
        column_widths,
        header_row: 3,
        rows,
    }
}

fn month_cells(months: &[MonthCount]) -> impl Iterator<Item = Cell> + '_ {
    months
        .iter()
        .flat_map(|m| [Cell::from(m.total), Cell::from(m.completed)])
}

/// The `Tren Kasus 3 Bulan` sheet.
pub fn trend_sheet(trend: &QuarterTrend) -> Sheet {
    let mut header = vec![Cell::text("Kasus")];
    for label in trend.labels() {
        header.push(Cell::text(format!("{label} Total")));
        header.push(Cell::text(format!("{label} Selesai")));
    }

    let mut rows = vec![vec![Cell::text(TREND_TITLE)], Vec::new(), header];
    for row in &trend.rows {
        let mut cells = vec![Cell::text(row.case_type.as_str())];
        cells.extend(month_cells(&row.months));
        rows.push(cells);
    }
    let mut total = vec![Cell::text("Total")];
    total.extend(month_cells(&trend.totals()));
    rows.push(total);

    let mut column_widths = vec![CATEGORY_COLUMN_WIDTH];
    column_widths.extend(std::iter::repeat(TREND_COLUMN_WIDTH).take(trend.months.len() * 2));

    Sheet {
        name: "Tren Kasus 3 Bulan",
        file_name: "Tren_Kasus_3_Bulan_Terakhir.xlsx".to_string(),
        column_widths,
        header_row: 2,
        rows,
    }
}

/// Write `sheet` as a single-sheet workbook at `path`.
pub fn write_workbook(sheet: &Sheet, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet.name)
        .context("Invalid worksheet name")?;

    for (col, width) in sheet.column_widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    for (r, row) in sheet.rows.iter().enumerate() {
        let emphasized = r == 0 || r == sheet.header_row;
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Cell::Text(text) if emphasized => {
                    worksheet.write_string_with_format(r, c, text, &bold)?;
                }
                Cell::Text(text) => {
                    worksheet.write_string(r, c, text)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write spreadsheet: {}", path.display()))?;
    Ok(())
}

/// Write `sheet` into `dir` under its own file name.
pub fn export(sheet: &Sheet, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let path = dir.join(&sheet.file_name);
    write_workbook(sheet, &path)?;
    info!("Exported {} to {}", sheet.name, path.display());
    Ok(path)
}
