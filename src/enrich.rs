use crate::error::Result;
use crate::schema::TABLE;
use rusqlite::Connection;
use tracing::info;

/// Income bracket thresholds; lower brackets are inclusive
/// (30000 -> "Low", 70000 -> "Medium").
const INCOME_NONE_MAX: f64 = 0.0;
const INCOME_LOW_MAX: f64 = 30_000.0;
const INCOME_MEDIUM_MAX: f64 = 70_000.0;

/// Adds and populates the three derived columns:
///
/// - `annual_premium` = `monthly_premium_auto * 12` (null source stays null)
/// - `has_claim` = 1 iff `total_claim_amount > 0`, else 0. A null claim
///   amount falls into the ELSE branch and yields 0; whether that matches
///   "claim status unknown" is an open question upstream, preserved as-is.
/// - `income_band` = four-way bracket over `income`
///
/// Column additions are guarded by a `PRAGMA table_info` check so a re-run
/// does not fail; the UPDATE expressions are idempotent by construction.
pub fn enrich(conn: &Connection) -> Result<()> {
    ensure_column(conn, "annual_premium", "REAL")?;
    ensure_column(conn, "has_claim", "INTEGER")?;
    ensure_column(conn, "income_band", "TEXT")?;

    let annual = conn.execute(
        &format!(
            "UPDATE {} SET annual_premium = monthly_premium_auto * 12",
            TABLE
        ),
        [],
    )?;

    let claims = conn.execute(
        &format!(
            "UPDATE {} SET has_claim = CASE WHEN total_claim_amount > 0 THEN 1 ELSE 0 END",
            TABLE
        ),
        [],
    )?;

    let bands = conn.execute(
        &format!(
            "UPDATE {} SET income_band = CASE \
                WHEN income <= {} THEN 'No Income' \
                WHEN income <= {} THEN 'Low' \
                WHEN income <= {} THEN 'Medium' \
                ELSE 'High' END",
            TABLE, INCOME_NONE_MAX, INCOME_LOW_MAX, INCOME_MEDIUM_MAX
        ),
        [],
    )?;

    info!(annual, claims, bands, "derived columns populated");
    Ok(())
}

/// ALTER TABLE ADD COLUMN, skipped when the column is already present.
fn ensure_column(conn: &Connection, name: &str, sql_type: &str) -> Result<()> {
    if column_exists(conn, name)? {
        info!(column = name, "column already present, skipping add");
        return Ok(());
    }
    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {};",
        TABLE, name, sql_type
    ))?;
    Ok(())
}

pub fn column_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", TABLE))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let column: String = row.get(1)?;
        if column == name {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::create_schema;
    use crate::storage::Db;

    fn seeded_db() -> Db {
        let db = Db::open_in_memory().unwrap();
        create_schema(db.conn()).unwrap();
        db.conn()
            .execute_batch(
                "INSERT INTO motor_insurance_raw
                     (customer, income, monthly_premium_auto, total_claim_amount)
                 VALUES
                     ('C1', 0, 100, 0),
                     ('C2', 30000, 200, 50),
                     ('C3', 30000.01, 0, 10),
                     ('C4', 70000, 85, 0),
                     ('C5', 70001, 110, 421.5);",
            )
            .unwrap();
        db
    }

    fn band_of(db: &Db, customer: &str) -> String {
        db.conn()
            .query_row(
                "SELECT income_band FROM motor_insurance_raw WHERE customer = ?1",
                [customer],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn annual_premium_is_exactly_twelve_months() {
        let db = seeded_db();
        enrich(db.conn()).unwrap();
        let premium: f64 = db
            .conn()
            .query_row(
                "SELECT annual_premium FROM motor_insurance_raw WHERE customer = 'C2'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(premium, 2400.0);
    }

    #[test]
    fn has_claim_is_one_iff_claim_positive() {
        let db = seeded_db();
        enrich(db.conn()).unwrap();
        let flags: Vec<(String, i64)> = {
            let mut stmt = db
                .conn()
                .prepare("SELECT customer, has_claim FROM motor_insurance_raw ORDER BY customer")
                .unwrap();
            stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
                .unwrap()
                .collect::<std::result::Result<_, _>>()
                .unwrap()
        };
        assert_eq!(
            flags,
            vec![
                ("C1".to_string(), 0),
                ("C2".to_string(), 1),
                ("C3".to_string(), 1),
                ("C4".to_string(), 0),
                ("C5".to_string(), 1),
            ]
        );
    }

    #[test]
    fn income_band_thresholds_are_inclusive_on_lower_brackets() {
        let db = seeded_db();
        enrich(db.conn()).unwrap();
        assert_eq!(band_of(&db, "C1"), "No Income");
        assert_eq!(band_of(&db, "C2"), "Low");
        assert_eq!(band_of(&db, "C3"), "Medium");
        assert_eq!(band_of(&db, "C4"), "Medium");
        assert_eq!(band_of(&db, "C5"), "High");
    }

    #[test]
    fn null_claim_amount_falls_into_else_branch() {
        let db = seeded_db();
        db.conn()
            .execute(
                "INSERT INTO motor_insurance_raw (customer) VALUES ('C6')",
                [],
            )
            .unwrap();
        enrich(db.conn()).unwrap();
        let flag: i64 = db
            .conn()
            .query_row(
                "SELECT has_claim FROM motor_insurance_raw WHERE customer = 'C6'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(flag, 0);
    }

    #[test]
    fn enrich_is_safe_to_rerun() {
        let db = seeded_db();
        enrich(db.conn()).unwrap();
        enrich(db.conn()).unwrap();
        assert!(column_exists(db.conn(), "annual_premium").unwrap());
        assert!(column_exists(db.conn(), "has_claim").unwrap());
        assert!(column_exists(db.conn(), "income_band").unwrap());
    }
}
