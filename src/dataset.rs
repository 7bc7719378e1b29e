use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{NaiveDateTime, Timelike};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::{debug, info};

use crate::error::LessonError;
use crate::fields::{self, FieldRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Xlsx,
    Csv,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, LessonError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" => Ok(FileFormat::Xlsx),
            "csv" => Ok(FileFormat::Csv),
            "" => Err(LessonError::UnsupportedFormat(
                "file has no extension".to_string(),
            )),
            other => Err(LessonError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

/// Rectangular table of text cells. Every row has exactly one cell per column;
/// an absent value is the empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Adds `name` with `default` in every row unless it already exists.
    pub fn ensure_column(&mut self, name: &str, default: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(default.to_string());
        }
        self.columns.len() - 1
    }

    pub fn get(&self, row: usize, field: &str) -> Option<&str> {
        let col = self.column_index(field)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// `None` when the row or column does not exist, otherwise whether the
    /// stored value changed.
    pub fn set(&mut self, row: usize, field: &str, value: &str) -> Option<bool> {
        let col = self.column_index(field)?;
        let cell = self.rows.get_mut(row)?.get_mut(col)?;
        if cell.as_str() == value {
            return Some(false);
        }
        *cell = value.to_string();
        Some(true)
    }

    /// Appends a row; cells are matched by column name, unknown names are
    /// ignored and unset columns stay empty.
    pub fn push_record<'a>(&mut self, values: impl IntoIterator<Item = (&'a str, String)>) -> usize {
        let mut row = vec![String::new(); self.columns.len()];
        for (field, value) in values {
            if let Some(col) = self.column_index(field) {
                row[col] = value;
            }
        }
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|cells| Record {
            index,
            columns: &self.columns,
            cells,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().enumerate().map(|(index, cells)| Record {
            index,
            columns: &self.columns,
            cells,
        })
    }

    fn from_raw(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = rows
            .iter()
            .map(|r| r.len())
            .chain(std::iter::once(headers.len()))
            .max()
            .unwrap_or(0);

        let mut columns: Vec<String> = Vec::with_capacity(width);
        for idx in 0..width {
            let name = headers.get(idx).map(|h| h.trim()).unwrap_or("");
            let name = if name.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name.to_string()
            };
            columns.push(unique_name(&columns, name));
        }

        let rows = rows
            .into_iter()
            .filter(|r| r.iter().any(|c| !c.is_empty()))
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();

        Self { columns, rows }
    }
}

/// Repeated headers become `Name.1`, `Name.2`, ... so every field name maps
/// to exactly one column.
fn unique_name(taken: &[String], name: String) -> String {
    if !taken.contains(&name) {
        return name;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{name}.{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub index: usize,
    columns: &'a [String],
    cells: &'a [String],
}

impl<'a> Record<'a> {
    pub fn get(&self, field: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| c == field)
            .map(|idx| self.cells[idx].as_str())
    }

    /// Value of `field`, or "" when the column is absent.
    pub fn text(&self, field: &str) -> &'a str {
        self.get(field).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        let cells = self.cells;
        self.columns
            .iter()
            .zip(cells.iter())
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub week_field: String,
    pub title_field: String,
    pub sheet_name: Option<String>,
}

pub fn load(
    path: &Path,
    format: FileFormat,
    sheet: Option<&str>,
) -> Result<LoadedDataset, LessonError> {
    if !path.is_file() {
        return Err(LessonError::DatasetNotFound(path.to_path_buf()));
    }

    let (headers, rows, sheet_name) = match format {
        FileFormat::Xlsx => {
            let ((headers, rows), name) = read_xlsx(path, sheet)?;
            (headers, rows, Some(name))
        }
        FileFormat::Csv => {
            let (headers, rows) = read_csv(path)?;
            (headers, rows, None)
        }
    };

    let (dataset, week_field, title_field) = normalize(headers, rows);
    info!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        week_field = %week_field,
        title_field = %title_field,
        "loaded dataset"
    );
    Ok(LoadedDataset {
        dataset,
        week_field,
        title_field,
        sheet_name,
    })
}

/// Builds the normalized table and resolves the week/title fields. Pure
/// function of the raw header and cell text.
pub fn normalize(headers: Vec<String>, rows: Vec<Vec<String>>) -> (Dataset, String, String) {
    let mut dataset = Dataset::from_raw(headers, rows);

    for field in fields::REQUIRED_TEXT_FIELDS {
        dataset.ensure_column(field, "");
    }

    let week_field = match fields::detect_role(&dataset.columns, FieldRole::Week) {
        Some(idx) => dataset.columns[idx].clone(),
        None => {
            debug!("no week column found, synthesizing one");
            dataset.ensure_column(fields::DEFAULT_WEEK_FIELD, fields::DEFAULT_WEEK_VALUE);
            fields::DEFAULT_WEEK_FIELD.to_string()
        }
    };

    let title_field = match fields::detect_role(&dataset.columns, FieldRole::Title) {
        Some(idx) => dataset.columns[idx].clone(),
        None => {
            debug!("no title column found, synthesizing one");
            dataset.ensure_column(fields::DEFAULT_TITLE_FIELD, fields::DEFAULT_TITLE_VALUE);
            fields::DEFAULT_TITLE_FIELD.to_string()
        }
    };

    (dataset, week_field, title_field)
}

/// Overwrites the whole file with the current table.
pub fn save(
    dataset: &Dataset,
    path: &Path,
    format: FileFormat,
    sheet_name: Option<&str>,
) -> Result<(), LessonError> {
    match format {
        FileFormat::Xlsx => write_xlsx(dataset, path, sheet_name)
            .map_err(|e| LessonError::Write(format!("{}: {e}", path.display())))?,
        FileFormat::Csv => write_csv(dataset, path)?,
    }
    info!(path = %path.display(), rows = dataset.len(), "saved dataset");
    Ok(())
}

type RawTable = (Vec<String>, Vec<Vec<String>>);

fn read_xlsx(path: &Path, sheet: Option<&str>) -> Result<(RawTable, String), LessonError> {
    let read_err = |e: String| LessonError::Read(format!("{}: {e}", path.display()));

    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: calamine::XlsxError| read_err(e.to_string()))?;
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| read_err("workbook has no sheets".to_string()))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| read_err(format!("sheet '{sheet_name}': {e}")))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();
    let body = rows.map(|r| r.iter().map(cell_text).collect()).collect();
    Ok(((headers, body), sheet_name))
}

fn read_csv(path: &Path) -> Result<RawTable, LessonError> {
    let read_err = |e: csv::Error| LessonError::Read(format!("{}: {e}", path.display()));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;
    let headers = reader
        .headers()
        .map_err(read_err)?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

fn write_xlsx(dataset: &Dataset, path: &Path, sheet_name: Option<&str>) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    if let Some(name) = sheet_name {
        worksheet.set_name(name)?;
    }

    for (col, name) in dataset.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name.as_str(), &header_format)?;
    }
    for (r, row) in dataset.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match numeric_cell(value) {
                Some(n) => worksheet.write_number(r, c as u16, n)?,
                None => worksheet.write_string(r, c as u16, value.as_str())?,
            };
        }
    }

    workbook.save(path)
}

fn write_csv(dataset: &Dataset, path: &Path) -> Result<(), LessonError> {
    let write_err = |e: csv::Error| LessonError::Write(format!("{}: {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer.write_record(&dataset.columns).map_err(write_err)?;
    for row in &dataset.rows {
        writer.write_record(row).map_err(write_err)?;
    }
    writer.flush()?;
    Ok(())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => number_text(*f),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => date_text(d),
            None => number_text(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Canonical text for a numeric cell: integral values carry no fraction and
/// NaN/infinity count as missing.
pub fn number_text(f: f64) -> String {
    if !f.is_finite() {
        return String::new();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{}", f as i64);
    }
    format!("{f}")
}

fn date_text(d: NaiveDateTime) -> String {
    if d.hour() == 0 && d.minute() == 0 && d.second() == 0 {
        d.format("%Y-%m-%d").to_string()
    } else {
        d.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Text that prints back identically as a number is stored as a number.
fn numeric_cell(s: &str) -> Option<f64> {
    let f: f64 = s.parse().ok()?;
    if f.is_finite() && number_text(f) == s {
        Some(f)
    } else {
        None
    }
}
