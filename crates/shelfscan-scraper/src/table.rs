//! Tabular extraction.
//!
//! Reading (async, through the automation surface) and parsing (pure) are
//! split: [`read_table`] captures the cell text of a table region into a
//! [`TableSnapshot`], and [`extract_table`] turns that snapshot into raw rows.

use shelfscan_core::RawRow;

use crate::surface::RegionHandle;

/// Cell text captured from one table region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSnapshot {
    /// `thead tr th` cells.
    pub head_cells: Vec<String>,
    /// `th` cells of the first `tr`, used when there is no `thead`.
    pub first_row_header_cells: Vec<String>,
    /// `td` cells of each `tbody tr`; `None` when the table has no body
    /// section (or it has no rows).
    pub body_rows: Option<Vec<Vec<String>>>,
    /// `td` cells of every `tr`, in document order.
    pub all_rows: Vec<Vec<String>>,
}

/// Captures the cell text of `table`.
///
/// Individual lookups that fail are treated as empty. Returns `None` only
/// when neither the body rows nor the plain rows can be queried at all.
pub async fn read_table<R: RegionHandle>(table: &R) -> Option<TableSnapshot> {
    let head_cells = table.child_texts("thead tr th").await.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "no readable thead cells");
        Vec::new()
    });

    let body = table.children("tbody tr").await;
    let rows = table.children("tr").await;
    if body.is_err() && rows.is_err() {
        tracing::debug!("table region rows could not be read");
        return None;
    }
    let body = body.unwrap_or_default();
    let rows = rows.unwrap_or_default();

    let first_row_header_cells = if head_cells.is_empty() {
        match rows.first() {
            Some(first) => first.child_texts("th").await.unwrap_or_default(),
            None => Vec::new(),
        }
    } else {
        Vec::new()
    };

    let body_rows = if body.is_empty() {
        None
    } else {
        Some(row_cells(&body).await)
    };
    let all_rows = if body_rows.is_some() {
        Vec::new()
    } else {
        row_cells(&rows).await
    };

    Some(TableSnapshot {
        head_cells,
        first_row_header_cells,
        body_rows,
        all_rows,
    })
}

async fn row_cells<R: RegionHandle>(rows: &[R]) -> Vec<Vec<String>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(row.child_texts("td").await.unwrap_or_default());
    }
    out
}

/// Zips each data row against the table's headers.
///
/// Headers come from `thead`, else the first row's `th` cells, else are
/// synthesized as `col0..colN` from the first data row. Data rows are the
/// body rows when a body section exists, otherwise every row but the first.
/// Cells beyond the header count get their positional name. Rows without
/// cells are skipped.
#[must_use]
pub fn extract_table(snapshot: &TableSnapshot) -> Vec<RawRow> {
    let data: &[Vec<String>] = match &snapshot.body_rows {
        Some(rows) => rows,
        None => snapshot.all_rows.get(1..).unwrap_or_default(),
    };

    let mut headers: Vec<String> = if snapshot.head_cells.is_empty() {
        snapshot.first_row_header_cells.clone()
    } else {
        snapshot.head_cells.clone()
    };
    headers.iter_mut().for_each(|h| *h = h.trim().to_owned());

    data.iter()
        .filter(|cells| !cells.is_empty())
        .map(|cells| {
            if headers.is_empty() {
                headers = (0..cells.len()).map(positional).collect();
            }
            cells
                .iter()
                .enumerate()
                .map(|(j, cell)| {
                    let key = headers.get(j).cloned().unwrap_or_else(|| positional(j));
                    (key, cell.trim().to_owned())
                })
                .collect()
        })
        .collect()
}

fn positional(index: usize) -> String {
    format!("col{index}")
}
