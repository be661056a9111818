use crate::error::Result;
use rusqlite::Connection;
use serde::Deserialize;

/// Target table for the raw policy snapshots.
pub const TABLE: &str = "motor_insurance_raw";

/// Base columns in CSV order: (name, SQLite type). The CSV header row must
/// match the names exactly. The `*_index` columns carry the label-encoded
/// form of their categorical neighbor.
pub const COLUMNS: &[(&str, &str)] = &[
    ("customer", "TEXT"),
    ("state", "TEXT"),
    ("customer_lifetime_value", "REAL"),
    ("response", "TEXT"),
    ("coverage", "TEXT"),
    ("coverage_index", "INTEGER"),
    ("education", "TEXT"),
    ("education_index", "INTEGER"),
    ("effective_to_date", "TEXT"),
    ("employment_status", "TEXT"),
    ("employment_index", "INTEGER"),
    ("gender", "TEXT"),
    ("income", "REAL"),
    ("location_code", "TEXT"),
    ("location_index", "INTEGER"),
    ("marital_status", "TEXT"),
    ("marital_index", "INTEGER"),
    ("monthly_premium_auto", "REAL"),
    ("months_since_last_claim", "INTEGER"),
    ("months_since_policy_inception", "INTEGER"),
    ("number_of_open_complaints", "INTEGER"),
    ("number_of_policies", "INTEGER"),
    ("policy_type", "TEXT"),
    ("policy_type_index", "INTEGER"),
    ("policy", "TEXT"),
    ("policy_index", "INTEGER"),
    ("renew_offer_type", "TEXT"),
    ("sales_channel", "TEXT"),
    ("sales_channel_index", "INTEGER"),
    ("total_claim_amount", "REAL"),
    ("vehicle_class", "TEXT"),
    ("vehicle_class_index", "INTEGER"),
    ("vehicle_size", "TEXT"),
    ("vehicle_size_index", "INTEGER"),
];

/// One CSV record as read from disk, before date normalization. Empty CSV
/// fields deserialize to `None`; `customer` is required non-empty by the
/// loader before insert.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyRecord {
    pub customer: String,
    pub state: Option<String>,
    pub customer_lifetime_value: Option<f64>,
    pub response: Option<String>,
    pub coverage: Option<String>,
    pub coverage_index: Option<i64>,
    pub education: Option<String>,
    pub education_index: Option<i64>,
    pub effective_to_date: Option<String>,
    pub employment_status: Option<String>,
    pub employment_index: Option<i64>,
    pub gender: Option<String>,
    pub income: Option<f64>,
    pub location_code: Option<String>,
    pub location_index: Option<i64>,
    pub marital_status: Option<String>,
    pub marital_index: Option<i64>,
    pub monthly_premium_auto: Option<f64>,
    pub months_since_last_claim: Option<i64>,
    pub months_since_policy_inception: Option<i64>,
    pub number_of_open_complaints: Option<i64>,
    pub number_of_policies: Option<i64>,
    pub policy_type: Option<String>,
    pub policy_type_index: Option<i64>,
    pub policy: Option<String>,
    pub policy_index: Option<i64>,
    pub renew_offer_type: Option<String>,
    pub sales_channel: Option<String>,
    pub sales_channel_index: Option<i64>,
    pub total_claim_amount: Option<f64>,
    pub vehicle_class: Option<String>,
    pub vehicle_class_index: Option<i64>,
    pub vehicle_size: Option<String>,
    pub vehicle_size_index: Option<i64>,
}

fn create_table_sql() -> String {
    let cols: Vec<String> = COLUMNS
        .iter()
        .map(|(name, ty)| {
            if *name == "customer" {
                // SQLite does not imply NOT NULL for non-integer primary keys
                format!("{} {} NOT NULL PRIMARY KEY", name, ty)
            } else {
                format!("{} {}", name, ty)
            }
        })
        .collect();
    format!("CREATE TABLE {} (\n    {}\n)", TABLE, cols.join(",\n    "))
}

/// Drops and recreates the target table. Each run starts from a clean slate;
/// everything previously loaded or derived is discarded.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", TABLE))?;
    conn.execute_batch(&format!("{};", create_table_sql()))?;
    tracing::info!(table = TABLE, "schema created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Db;

    #[test]
    fn create_schema_is_idempotent() {
        let db = Db::open_in_memory().unwrap();
        create_schema(db.conn()).unwrap();
        // Drop-and-recreate must succeed against an existing table
        create_schema(db.conn()).unwrap();

        let count: i64 = db
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", TABLE), [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn customer_is_the_primary_key() {
        let db = Db::open_in_memory().unwrap();
        create_schema(db.conn()).unwrap();
        db.conn()
            .execute(
                &format!("INSERT INTO {} (customer) VALUES ('AA11111')", TABLE),
                [],
            )
            .unwrap();
        let dup = db.conn().execute(
            &format!("INSERT INTO {} (customer) VALUES ('AA11111')", TABLE),
            [],
        );
        assert!(dup.is_err());
    }
}
