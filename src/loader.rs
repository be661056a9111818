use crate::error::{EtlError, Result};
use crate::schema::{PolicyRecord, COLUMNS, TABLE};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Source format for `effective_to_date` (e.g. `2/18/2011`).
const SOURCE_DATE_FORMAT: &str = "%m/%d/%Y";

/// Bulk-loads a CSV file into the target table.
///
/// The header row must match the declared column names exactly, in order.
/// All inserts run inside a single transaction with one prepared statement:
/// a malformed field or duplicate customer key aborts the whole load and
/// leaves the table untouched. Returns the number of rows inserted.
pub fn load_csv<P: AsRef<Path>>(conn: &mut Connection, csv_path: P) -> Result<u64> {
    let mut reader = csv::Reader::from_path(csv_path.as_ref())?;
    validate_header(&mut reader)?;

    let tx = conn.transaction()?;
    let mut inserted: u64 = 0;
    {
        let placeholders = vec!["?"; COLUMNS.len()].join(", ");
        let column_names: Vec<&str> = COLUMNS.iter().map(|(name, _)| *name).collect();
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            TABLE,
            column_names.join(", "),
            placeholders
        ))?;

        for (idx, row) in reader.deserialize::<PolicyRecord>().enumerate() {
            // Header is line 1, first record line 2
            let line = idx as u64 + 2;
            let record = row?;
            let values = bind_values(&record, line)?;
            stmt.execute(rusqlite::params_from_iter(values))?;
            inserted += 1;
        }
    }
    tx.commit()?;

    info!(rows = inserted, table = TABLE, "CSV load committed");
    Ok(inserted)
}

/// Rejects the file before any insert if its header does not match the
/// declared schema (missing, extra, or re-ordered columns).
fn validate_header<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<()> {
    let headers = reader.headers()?;
    let found: Vec<&str> = headers.iter().map(|h| h.trim()).collect();
    let expected: Vec<&str> = COLUMNS.iter().map(|(name, _)| *name).collect();
    if found != expected {
        return Err(EtlError::HeaderMismatch(format!(
            "expected {} columns [{}...], found {} columns [{}...]",
            expected.len(),
            expected.iter().take(3).cloned().collect::<Vec<_>>().join(", "),
            found.len(),
            found.iter().take(3).cloned().collect::<Vec<_>>().join(", "),
        )));
    }
    Ok(())
}

/// Converts one parsed record into SQL values in declared column order.
/// Dates are normalized to ISO `YYYY-MM-DD` so month rollups are a plain
/// prefix extraction downstream.
fn bind_values(record: &PolicyRecord, line: u64) -> Result<Vec<Value>> {
    if record.customer.trim().is_empty() {
        return Err(EtlError::BadRecord {
            line,
            message: "customer key is empty".to_string(),
        });
    }

    let effective_to_date = match &record.effective_to_date {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, SOURCE_DATE_FORMAT).map_err(|e| {
                EtlError::BadRecord {
                    line,
                    message: format!("unparseable effective_to_date '{}': {}", raw, e),
                }
            })?;
            Value::Text(date.format("%Y-%m-%d").to_string())
        }
        None => Value::Null,
    };

    fn text(v: &Option<String>) -> Value {
        v.as_ref()
            .map(|s| Value::Text(s.clone()))
            .unwrap_or(Value::Null)
    }
    fn real(v: &Option<f64>) -> Value {
        v.map(Value::Real).unwrap_or(Value::Null)
    }
    fn int(v: &Option<i64>) -> Value {
        v.map(Value::Integer).unwrap_or(Value::Null)
    }

    Ok(vec![
        Value::Text(record.customer.clone()),
        text(&record.state),
        real(&record.customer_lifetime_value),
        text(&record.response),
        text(&record.coverage),
        int(&record.coverage_index),
        text(&record.education),
        int(&record.education_index),
        effective_to_date,
        text(&record.employment_status),
        int(&record.employment_index),
        text(&record.gender),
        real(&record.income),
        text(&record.location_code),
        int(&record.location_index),
        text(&record.marital_status),
        int(&record.marital_index),
        real(&record.monthly_premium_auto),
        int(&record.months_since_last_claim),
        int(&record.months_since_policy_inception),
        int(&record.number_of_open_complaints),
        int(&record.number_of_policies),
        text(&record.policy_type),
        int(&record.policy_type_index),
        text(&record.policy),
        int(&record.policy_index),
        text(&record.renew_offer_type),
        text(&record.sales_channel),
        int(&record.sales_channel_index),
        real(&record.total_claim_amount),
        text(&record.vehicle_class),
        int(&record.vehicle_class_index),
        text(&record.vehicle_size),
        int(&record.vehicle_size_index),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_mismatch_is_rejected() {
        let mut reader = csv::Reader::from_reader("customer,wrong_column\nAA,1\n".as_bytes());
        let err = validate_header(&mut reader).unwrap_err();
        assert!(matches!(err, EtlError::HeaderMismatch(_)));
    }

    #[test]
    fn source_dates_normalize_to_iso() {
        let date = NaiveDate::parse_from_str("2/18/2011", SOURCE_DATE_FORMAT).unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2011-02-18");
    }
}
