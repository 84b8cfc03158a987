//! Spreadsheet workbooks.
//!
//! Read with calamine, written with rust_xlsxwriter. On read, the first
//! `title_rows` rows are skipped, the next row is the header, and columns
//! that are blank from the header down are dropped (the experiment runner
//! leaves column A empty below its title).

use std::path::Path;

use answerlab_shared::{AnswerLabError, Cell, Result, Sheet, Workbook};
use calamine::{Data, Range, Reader, open_workbook_auto};

/// Longest text a spreadsheet cell holds.
const MAX_CELL_CHARS: usize = 32_767;

/// Spreadsheet grid limits (rows include the header).
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

pub(crate) fn read(path: &Path, title_rows: u32) -> Result<Workbook> {
    let mut source = open_workbook_auto(path)
        .map_err(|e| AnswerLabError::parse(format!("failed to open {}: {e}", path.display())))?;

    let mut sheets = Vec::new();
    for name in source.sheet_names() {
        let range = source.worksheet_range(&name).map_err(|e| {
            AnswerLabError::parse(format!(
                "failed to read sheet '{name}' of {}: {e}",
                path.display()
            ))
        })?;
        sheets.push(sheet_from_range(name, &range, title_rows));
    }

    Ok(Workbook { meta: None, sheets })
}

fn sheet_from_range(name: String, range: &Range<Data>, title_rows: u32) -> Sheet {
    let Some((last_row, last_col)) = range.end() else {
        return Sheet::new(name, Vec::new());
    };
    if title_rows > last_row {
        return Sheet::new(name, Vec::new());
    }

    let mut grid = (title_rows..=last_row).map(|r| {
        (0..=last_col)
            .map(|c| range.get_value((r, c)).map_or(Cell::Empty, cell_from_data))
            .collect::<Vec<Cell>>()
    });
    let header = grid.next().unwrap_or_default();
    let data: Vec<Vec<Cell>> = grid.collect();

    let kept: Vec<usize> = (0..header.len())
        .filter(|&c| !is_blank(&header[c]) || data.iter().any(|row| !is_blank(&row[c])))
        .collect();

    Sheet {
        name,
        columns: kept.iter().map(|&c| column_name(&header[c], c)).collect(),
        rows: data
            .into_iter()
            .map(|row| kept.iter().map(|&c| row[c].clone()).collect())
            .collect(),
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::Text(other.to_string()),
    }
}

fn is_blank(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => true,
        Cell::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn column_name(cell: &Cell, index: usize) -> String {
    match cell {
        Cell::Text(s) if !s.trim().is_empty() => s.clone(),
        Cell::Number(n) => n.to_string(),
        Cell::Bool(b) => b.to_string(),
        _ => format!("Unnamed: {index}"),
    }
}

pub(crate) fn write(path: &Path, workbook: &Workbook) -> Result<()> {
    let mut book = rust_xlsxwriter::Workbook::new();

    for sheet in &workbook.sheets {
        let worksheet = book.add_worksheet();
        write_sheet(worksheet, sheet)?;
    }

    book.save(path).map_err(|e| {
        AnswerLabError::Workbook(format!("failed to write {}: {e}", path.display()))
    })
}

fn write_sheet(worksheet: &mut rust_xlsxwriter::Worksheet, sheet: &Sheet) -> Result<()> {
    let widest = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
    if sheet.columns.len().max(widest) > MAX_COLUMNS || sheet.rows.len() + 1 > MAX_ROWS {
        return Err(AnswerLabError::Workbook(format!(
            "sheet '{}' is too large for a spreadsheet",
            sheet.name
        )));
    }

    let fail = |e: rust_xlsxwriter::XlsxError| {
        AnswerLabError::Workbook(format!("failed to write sheet '{}': {e}", sheet.name))
    };

    worksheet.set_name(&sheet.name).map_err(fail)?;

    for (c, column) in sheet.columns.iter().enumerate() {
        worksheet
            .write_string(0, c as u16, clip(column))
            .map_err(fail)?;
    }

    for (r, row) in sheet.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) if s.is_empty() => {}
                Cell::Text(s) => {
                    worksheet.write_string(r, c, clip(s)).map_err(fail)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n).map_err(fail)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(r, c, *b).map_err(fail)?;
                }
            }
        }
    }

    Ok(())
}

/// `text` cut to what one cell can hold.
fn clip(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_keeps_short_text() {
        assert_eq!(clip("x + C"), "x + C");
        let long = "é".repeat(MAX_CELL_CHARS + 5);
        assert_eq!(clip(&long).chars().count(), MAX_CELL_CHARS);
    }

    #[test]
    fn column_names_follow_header_cells() {
        assert_eq!(column_name(&Cell::from("llama"), 1), "llama");
        assert_eq!(column_name(&Cell::Number(0.7), 2), "0.7");
        assert_eq!(column_name(&Cell::Empty, 3), "Unnamed: 3");
    }

    #[test]
    fn data_cells_map_to_workbook_cells() {
        assert_eq!(cell_from_data(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(cell_from_data(&Data::String("x".into())), Cell::from("x"));
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
        assert_eq!(cell_from_data(&Data::Bool(false)), Cell::Bool(false));
    }
}
