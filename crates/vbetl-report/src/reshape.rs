//! Table reshaping for the merge and normalize jobs.
//!
//! The stages are independent functions over [`Table`]: group-by aggregation,
//! a key-based left join, terminal number formatting and the wide-to-long
//! un-pivot driven by [`DimensionsFile`].

use std::collections::{HashMap, HashSet};

use vbetl_core::DimensionsFile;

use crate::error::ReportError;
use crate::table::{Cell, Row, Table};

/// Video columns always carried into the merged report.
const MERGE_VIDEO_COLUMNS: [&str; 5] = ["video_id", "duration", "lastViewed", "whenPublished", "views"];
/// Numeric video columns left out of the merged report.
const MERGE_EXCLUDED: [&str; 3] = ["video_id", "commentCount", "score"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalSeparator {
    #[default]
    Dot,
    Comma,
}

fn require(table: &Table, context: &str, columns: &[&str]) -> Result<(), ReportError> {
    let missing = table.missing_columns(columns.iter().copied());
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::MissingColumns {
            context: context.to_owned(),
            columns: missing,
        })
    }
}

fn add_cells(a: &Cell, b: &Cell) -> Cell {
    match (a, b) {
        (Cell::Int(x), Cell::Int(y)) => x.checked_add(*y).map_or_else(
            || Cell::from_f64(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0)),
            Cell::Int,
        ),
        _ => Cell::Float(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0)),
    }
}

/// Groups rows by `key`, summing `sum_column` and keeping the first
/// non-empty value of every other column.
///
/// Groups appear in first-seen order. Rows with an empty key are dropped.
/// Output columns are `key`, `sum_column`, then the remaining columns in
/// input order.
///
/// # Errors
///
/// Returns [`ReportError::MissingColumns`] if either column is absent.
pub fn aggregate_sum(table: &Table, key: &str, sum_column: &str) -> Result<Table, ReportError> {
    require(table, "aggregate", &[key, sum_column])?;

    let mut columns = vec![key.to_owned(), sum_column.to_owned()];
    columns.extend(
        table
            .columns()
            .iter()
            .filter(|c| *c != key && *c != sum_column)
            .cloned(),
    );

    let mut groups: Vec<Row> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut dropped = 0usize;
    let mut non_numeric = 0usize;

    for row in table.rows() {
        let key_cell = row.get(key).unwrap_or(&Cell::Empty);
        if key_cell.is_empty() {
            dropped += 1;
            continue;
        }
        let value = match row.get(sum_column) {
            Some(cell @ (Cell::Int(_) | Cell::Float(_))) => cell.clone(),
            Some(Cell::Text(_)) => {
                non_numeric += 1;
                Cell::Int(0)
            }
            Some(Cell::Empty) | None => Cell::Int(0),
        };

        let slot = *index.entry(key_cell.to_string()).or_insert_with(|| {
            let mut group = Row::new();
            for c in &columns {
                group.insert(c.clone(), Cell::Empty);
            }
            group.insert(key.to_owned(), key_cell.clone());
            group.insert(sum_column.to_owned(), Cell::Int(0));
            groups.push(group);
            groups.len() - 1
        });

        let group = &mut groups[slot];
        let total = add_cells(&group[sum_column], &value);
        group.insert(sum_column.to_owned(), total);
        for c in columns.iter().skip(2) {
            let current = &group[c.as_str()];
            if current.is_empty() {
                if let Some(cell) = row.get(c.as_str()).filter(|v| !v.is_empty()) {
                    group.insert(c.clone(), cell.clone());
                }
            }
        }
    }

    if dropped > 0 {
        tracing::warn!(%key, dropped, "rows with an empty key were left out of the aggregation");
    }
    if non_numeric > 0 {
        tracing::warn!(column = %sum_column, count = non_numeric, "non-numeric values counted as zero");
    }
    tracing::debug!(input = table.len(), groups = groups.len(), "aggregated");
    Ok(Table::new(columns, groups))
}

/// Left-joins `right` onto `left` where `left[left_key] == right[right_key]`.
///
/// Every left row appears exactly once, in order. The first right row with a
/// matching key wins. Right columns of unmatched rows are filled with `0`.
/// The right key column is not carried over; a right column whose name is
/// already taken on the left gets a `_right` suffix.
///
/// # Errors
///
/// Returns [`ReportError::MissingColumns`] if a key column is absent.
pub fn left_join(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
) -> Result<Table, ReportError> {
    require(left, "join (left side)", &[left_key])?;
    require(right, "join (right side)", &[right_key])?;

    let left_names: HashSet<&str> = left.columns().iter().map(String::as_str).collect();
    let right_columns: Vec<(String, String)> = right
        .columns()
        .iter()
        .filter(|c| *c != right_key)
        .map(|c| {
            let out = if left_names.contains(c.as_str()) {
                format!("{c}_right")
            } else {
                c.clone()
            };
            (c.clone(), out)
        })
        .collect();

    let mut lookup: HashMap<String, &Row> = HashMap::new();
    let mut duplicates = 0usize;
    for row in right.rows() {
        let Some(key) = row.get(right_key).filter(|k| !k.is_empty()) else {
            continue;
        };
        if lookup.contains_key(&key.to_string()) {
            duplicates += 1;
        } else {
            lookup.insert(key.to_string(), row);
        }
    }
    if duplicates > 0 {
        tracing::warn!(key = %right_key, duplicates, "duplicate join keys on right side, first match used");
    }

    let mut matched = 0usize;
    let rows: Vec<Row> = left
        .rows()
        .iter()
        .map(|l| {
            let mut out = l.clone();
            let hit = l
                .get(left_key)
                .filter(|k| !k.is_empty())
                .and_then(|k| lookup.get(&k.to_string()));
            if hit.is_some() {
                matched += 1;
            }
            for (source, name) in &right_columns {
                let cell = match hit {
                    Some(r) => r.get(source.as_str()).cloned().unwrap_or(Cell::Empty),
                    None => Cell::Int(0),
                };
                out.insert(name.clone(), cell);
            }
            out
        })
        .collect();

    let mut columns = left.columns().to_vec();
    columns.extend(right_columns.into_iter().map(|(_, name)| name));

    tracing::info!(rows = rows.len(), matched, "joined tables");
    Ok(Table::new(columns, rows))
}

/// Renders numeric columns for output. Integral values lose their decimal
/// point; with [`DecimalSeparator::Comma`] the remaining fractions use a
/// comma. Non-numeric columns pass through untouched.
#[must_use]
pub fn format_numbers(table: &Table, separator: DecimalSeparator) -> Table {
    let numeric: HashSet<String> = table.numeric_columns().into_iter().collect();
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|(k, v)| {
                    let cell = if numeric.contains(k) {
                        format_cell(v, separator)
                    } else {
                        v.clone()
                    };
                    (k.clone(), cell)
                })
                .collect()
        })
        .collect();
    Table::new(table.columns().to_vec(), rows)
}

fn format_cell(cell: &Cell, separator: DecimalSeparator) -> Cell {
    match cell {
        Cell::Float(f) => match Cell::from_f64(*f) {
            Cell::Float(f) if separator == DecimalSeparator::Comma => {
                Cell::Text(f.to_string().replace('.', ","))
            }
            other => other,
        },
        other => other.clone(),
    }
}

/// Unfolds one-hot count columns into one record per non-zero cell.
///
/// For every row, config and `(column, label)` pair whose value is neither
/// empty nor zero, emits the metadata columns plus `dimension = label` and
/// `metric = value`; every other dimension and metric column stays empty.
/// Output columns are the metadata columns, then distinct dimension names,
/// then distinct metric names.
///
/// # Errors
///
/// Returns [`ReportError::MissingColumns`] if a metadata column is absent.
/// Absent source columns are logged and contribute nothing.
pub fn unpivot(table: &Table, config: &DimensionsFile) -> Result<Table, ReportError> {
    let metadata: Vec<&str> = config.metadata_columns.iter().map(String::as_str).collect();
    require(table, "normalize metadata", &metadata)?;

    let absent = table.missing_columns(
        config
            .dimensions
            .iter()
            .flat_map(|d| d.columns.iter().map(String::as_str)),
    );
    for column in &absent {
        tracing::warn!(%column, "source column not in input, no records for it");
    }

    let dimension_names = config.dimension_names();
    let metric_names = config.metric_names();
    let mut columns: Vec<String> = config.metadata_columns.clone();
    columns.extend(dimension_names.iter().map(|d| (*d).to_owned()));
    columns.extend(metric_names.iter().map(|m| (*m).to_owned()));

    let mut blank = Row::new();
    for c in &columns {
        blank.insert(c.clone(), Cell::Empty);
    }

    let mut records: Vec<Row> = Vec::new();
    for row in table.rows() {
        let mut base = blank.clone();
        for m in &metadata {
            base.insert((*m).to_owned(), row.get(*m).cloned().unwrap_or(Cell::Empty));
        }
        for dim in &config.dimensions {
            for (column, label) in dim.pairs() {
                let Some(value) = row.get(column) else {
                    continue;
                };
                if value.is_empty() || value.is_zero() {
                    continue;
                }
                let mut record = base.clone();
                record.insert(dim.dimension.clone(), Cell::from(label));
                record.insert(dim.metric.clone(), value.clone());
                records.push(record);
            }
        }
    }

    tracing::info!(input = table.len(), records = records.len(), "normalized");
    Ok(Table::new(columns, records))
}

/// Options for [`merge_webcast_video`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    pub decimal: DecimalSeparator,
}

/// Builds the merged webcast/video report.
///
/// Daily video rows are collapsed per `video_id` (views summed), reduced to
/// the carried and numeric columns, prefixed with `v_`, and left-joined onto
/// the webcasts by `vodId`. Remaining gaps are filled with `0` before
/// numbers are formatted.
///
/// # Errors
///
/// Returns [`ReportError::MissingColumns`] if either input lacks a column the
/// merge relies on.
pub fn merge_webcast_video(
    videos: &Table,
    webcasts: &Table,
    options: MergeOptions,
) -> Result<Table, ReportError> {
    require(videos, "merge (videos)", &MERGE_VIDEO_COLUMNS)?;
    require(webcasts, "merge (webcasts)", &["vodId"])?;

    let mut daily = videos.clone();
    daily.drop_columns(&["date"]);
    let aggregated = aggregate_sum(&daily, "video_id", "views")?;

    let mut keep: Vec<String> = MERGE_VIDEO_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
    for column in aggregated.numeric_columns() {
        if !MERGE_EXCLUDED.contains(&column.as_str()) && !keep.contains(&column) {
            keep.push(column);
        }
    }
    let mut per_video = aggregated.select(&keep);
    per_video.rename_columns(|c| (c != "video_id").then(|| format!("v_{c}")));

    let mut merged = left_join(webcasts, &per_video, "vodId", "video_id")?;
    merged.fill_empty(&Cell::Int(0));
    Ok(format_numbers(&merged, options.decimal))
}

#[cfg(test)]
#[path = "reshape_test.rs"]
mod tests;
