use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::table::{Cell, Table};

use super::{persist, write_error, SheetWriter, SHEET_NAME};

/// Writes `.xlsx` workbooks
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWriter;

impl SheetWriter for XlsxWriter {
    fn write(&self, table: &Table, output_path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(SHEET_NAME)
            .map_err(|e| write_error(output_path, e))?;

        for (row_idx, col_idx, cell) in table.cells() {
            let row = u32::try_from(row_idx)
                .map_err(|_| write_error(output_path, format!("row {} out of range", row_idx)))?;
            let col = u16::try_from(col_idx).map_err(|_| {
                write_error(output_path, format!("column {} out of range", col_idx))
            })?;

            let written = match cell {
                Cell::Number(n) => worksheet.write_number(row, col, *n).map(|_| ()),
                Cell::Text(s) if s.is_empty() => Ok(()),
                Cell::Text(s) => worksheet.write_string(row, col, s.as_str()).map(|_| ()),
            };
            written.map_err(|e| write_error(output_path, e))?;
        }

        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| write_error(output_path, e))?;
        persist(output_path, &bytes)
    }
}
