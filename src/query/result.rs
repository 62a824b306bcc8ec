//! Result renderer
//!
//! The last field of every wrapped row is its provenance annotation; every
//! field before it is a user column in original order. Each user cell is
//! tagged with the annotation reference `(column, annotation)` of its row.

use serde::Serialize;

use super::errors::{QueryError, QueryResult};
use crate::engine::ResultSet;
use crate::identifier::{encode_annotation_ref, OutputCellPosition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCell {
    pub position: OutputCellPosition,
    pub value: Option<String>,
    /// Annotation reference handed to the correlation decoder on hover
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub index: usize,
    /// Raw annotation, empty when the engine returned NULL
    pub annotation: String,
    pub cells: Vec<ResultCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    /// User column names; the annotation column is consumed, not shown
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn cell(&self, position: OutputCellPosition) -> Option<&ResultCell> {
        let column = usize::try_from(position.column.checked_sub(1)?).ok()?;
        self.rows.get(position.row)?.cells.get(column)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Render a wrapped result set
///
/// An empty result with no column metadata renders as an empty table.
/// Anything narrower than one data column plus the annotation fails fast.
pub fn render_result(set: &ResultSet) -> QueryResult<ResultTable> {
    let width = set.width();
    if width == 0 && set.rows.is_empty() {
        return Ok(ResultTable::default());
    }
    if width < 2 {
        return Err(QueryError::MalformedResult {
            rows: set.rows.len(),
            width,
        });
    }

    let data_width = width - 1;
    let columns = set.columns.iter().take(data_width).cloned().collect();
    let rows = set
        .rows
        .iter()
        .enumerate()
        .map(|(index, fields)| render_row(index, fields, width))
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(ResultTable { columns, rows })
}

fn render_row(index: usize, fields: &[Option<String>], width: usize) -> QueryResult<ResultRow> {
    if fields.len() != width {
        return Err(QueryError::RaggedRow {
            row: index,
            expected: width,
            found: fields.len(),
        });
    }

    let (values, last) = fields.split_at(width - 1);
    let annotation = last[0].clone().unwrap_or_default();
    let cells = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let column = (i + 1) as u32;
            ResultCell {
                position: OutputCellPosition::new(index, column),
                value: value.clone(),
                reference: encode_annotation_ref(column, &annotation),
            }
        })
        .collect();

    Ok(ResultRow {
        index,
        annotation,
        cells,
    })
}
