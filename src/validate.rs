use crate::error::Result;
use crate::schema::TABLE;
use rusqlite::Connection;

/// Key columns whose null counts the operator reviews after a load.
const KEY_COLUMNS: &[&str] = &["customer", "total_claim_amount", "state", "gender"];

/// Post-load sanity counts. Read-only; the operator decides whether to
/// proceed, there is no automated gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub total_rows: i64,
    /// (column name, null count) for each key column.
    pub null_counts: Vec<(String, i64)>,
}

pub fn validate(conn: &Connection) -> Result<ValidationReport> {
    let total_rows: i64 =
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", TABLE), [], |row| {
            row.get(0)
        })?;

    let mut null_counts = Vec::with_capacity(KEY_COLUMNS.len());
    for column in KEY_COLUMNS {
        let nulls: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {} IS NULL",
                TABLE, column
            ),
            [],
            |row| row.get(0),
        )?;
        null_counts.push((column.to_string(), nulls));
    }

    tracing::info!(rows = total_rows, "validation counts collected");
    Ok(ValidationReport {
        total_rows,
        null_counts,
    })
}
