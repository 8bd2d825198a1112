//! In-memory tables with a run-dependent column set.
//!
//! A [`Row`] is an ordered mapping from column name to [`Cell`]. Rows need
//! not share keys; a [`Table`] fixes the column order once every row exists
//! and reads absent keys as [`Cell::Empty`].

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ReportError;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Infers a cell from a CSV field.
    ///
    /// Integers are recognised only when they print back identically, so
    /// identifiers such as `007` stay text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Empty;
        }
        if let Ok(n) = raw.parse::<i64>() {
            if n.to_string() == raw {
                return Self::Int(n);
            }
            return Self::Text(raw.to_owned());
        }
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() && !raw.starts_with('+') => Self::Float(f),
            _ => Self::Text(raw.to_owned()),
        }
    }

    /// Converts a JSON scalar. Strings are kept verbatim; arrays and objects
    /// become their compact JSON text.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Text(b.to_string()),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::Text(n.to_string())),
            Value::String(s) if s.is_empty() => Self::Empty,
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    /// Integral floats collapse to [`Cell::Int`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn from_f64(f: f64) -> Self {
        if f.fract() == 0.0 && f.abs() < 9.0e15 {
            Self::Int(f as i64)
        } else {
            Self::Float(f)
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Empty | Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.as_f64().is_some_and(|f| f == 0.0)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_owned())
        }
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

pub type Row = IndexMap<String, Cell>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Builds a table whose header is `fixed` followed by every other key
    /// observed in `rows`, sorted.
    #[must_use]
    pub fn from_rows(fixed: &[&str], rows: Vec<Row>) -> Self {
        let fixed_set: HashSet<&str> = fixed.iter().copied().collect();
        let mut extra: Vec<String> = rows
            .iter()
            .flat_map(|r| r.keys())
            .filter(|k| !fixed_set.contains(k.as_str()))
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        extra.sort();

        let mut columns: Vec<String> = fixed.iter().map(|c| (*c).to_owned()).collect();
        columns.extend(extra);
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell at `row`/`column`, [`Cell::Empty`] when absent.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }

    /// Names from `wanted` that are not columns of this table.
    #[must_use]
    pub fn missing_columns<'a>(&self, wanted: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        wanted
            .into_iter()
            .filter(|c| !self.has_column(c))
            .map(str::to_owned)
            .collect()
    }

    /// Columns whose every non-empty cell is numeric. A column with no
    /// values at all counts as numeric.
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(c.as_str()))
                    .all(|cell| cell.is_empty() || cell.is_numeric())
            })
            .cloned()
            .collect()
    }

    pub fn drop_columns(&mut self, names: &[&str]) {
        self.columns.retain(|c| !names.contains(&c.as_str()));
        for row in &mut self.rows {
            for name in names {
                row.shift_remove(*name);
            }
        }
    }

    /// Projects onto `names`, in that order.
    #[must_use]
    pub fn select(&self, names: &[String]) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                names
                    .iter()
                    .map(|n| (n.clone(), r.get(n).cloned().unwrap_or(Cell::Empty)))
                    .collect()
            })
            .collect();
        Self {
            columns: names.to_vec(),
            rows,
        }
    }

    /// Renames every column for which `rename` returns a new name.
    pub fn rename_columns(&mut self, rename: impl Fn(&str) -> Option<String>) {
        let renames: Vec<(String, String)> = self
            .columns
            .iter()
            .filter_map(|c| rename(c).map(|n| (c.clone(), n)))
            .collect();
        if renames.is_empty() {
            return;
        }
        for column in &mut self.columns {
            if let Some((_, new)) = renames.iter().find(|(old, _)| old == column) {
                column.clone_from(new);
            }
        }
        for row in &mut self.rows {
            *row = std::mem::take(row)
                .into_iter()
                .map(|(k, v)| {
                    let k = renames
                        .iter()
                        .find(|(old, _)| *old == k)
                        .map_or(k, |(_, new)| new.clone());
                    (k, v)
                })
                .collect();
        }
    }

    /// Replaces every empty or absent cell with `fill`.
    pub fn fill_empty(&mut self, fill: &Cell) {
        for row in &mut self.rows {
            for column in &self.columns {
                let cell = row.entry(column.clone()).or_insert(Cell::Empty);
                if cell.is_empty() {
                    *cell = fill.clone();
                }
            }
        }
    }

    /// Reads a CSV file with a header row, inferring cell types.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the file cannot be opened or parsed, or if
    /// the header repeats a column name.
    pub fn read_csv(path: &Path) -> Result<Self, ReportError> {
        let file = std::fs::File::open(path).map_err(|e| ReportError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_csv_reader(file, &path.display().to_string())
    }

    /// Parses CSV from any reader. `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_csv`].
    pub fn from_csv_reader<R: Read>(reader: R, origin: &str) -> Result<Self, ReportError> {
        let csv_err = |e| ReportError::Csv {
            path: origin.to_owned(),
            source: e,
        };
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_owned)
            .collect();
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(ReportError::DuplicateColumn {
                path: origin.to_owned(),
                column: dup.clone(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let row: Row = columns
                .iter()
                .enumerate()
                .map(|(i, c)| (c.clone(), record.get(i).map_or(Cell::Empty, Cell::parse)))
                .collect();
            rows.push(row);
        }

        tracing::debug!(source = %origin, rows = rows.len(), columns = columns.len(), "read CSV");
        Ok(Self { columns, rows })
    }

    /// Serializes header and rows to CSV bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Csv`] if a record cannot be written.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, ReportError> {
        let csv_err = |e| ReportError::Csv {
            path: "<buffer>".to_owned(),
            source: e,
        };
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns).map_err(csv_err)?;
        for row in &self.rows {
            writer
                .write_record(self.columns.iter().map(|c| {
                    row.get(c).map_or_else(String::new, ToString::to_string)
                }))
                .map_err(csv_err)?;
        }
        writer
            .into_inner()
            .map_err(|e| csv_err(csv::Error::from(e.into_error())))
    }

    /// Writes the table as CSV: the whole file is serialized first, then
    /// written in one call.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] on serialization or I/O failure.
    pub fn write_csv(&self, path: &Path) -> Result<(), ReportError> {
        let bytes = self.to_csv_bytes()?;
        std::fs::write(path, bytes).map_err(|e| ReportError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), rows = self.rows.len(), "wrote CSV");
        Ok(())
    }
}

/// Writes `value` as pretty-printed JSON in a single write.
///
/// # Errors
///
/// Returns [`ReportError`] on serialization or I/O failure.
pub fn write_json_pretty<T: serde::Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), ReportError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, bytes).map_err(|e| ReportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), "wrote JSON");
    Ok(())
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
