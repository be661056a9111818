use crate::error::Result;
use crate::schema::TABLE;
use rusqlite::Connection;

/// Loss ratio for one categorical group. `loss_ratio` is `None` when the
/// group's premium sum is zero (division defused to NULL, never raised).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLossRatio {
    pub group: Option<String>,
    pub loss_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleClassClaims {
    pub vehicle_class: Option<String>,
    pub avg_claim: Option<f64>,
    pub policies: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleCoverageLossRatio {
    pub vehicle_class: Option<String>,
    pub coverage: Option<String>,
    pub loss_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmploymentPremiums {
    pub employment_status: Option<String>,
    pub avg_annual_premium: Option<f64>,
    pub avg_claim: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPolicyCount {
    pub month: Option<String>,
    pub policies: i64,
}

/// The seven descriptive views, each a pure function of current table state.
/// Ratios are rounded to 4 places and averages to 2, in the SELECT output
/// only; stored values are never altered.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub overall_loss_ratio: Option<f64>,
    pub loss_ratio_by_coverage: Vec<GroupLossRatio>,
    pub claims_by_vehicle_class: Vec<VehicleClassClaims>,
    pub loss_ratio_by_vehicle_and_coverage: Vec<VehicleCoverageLossRatio>,
    pub premiums_by_employment: Vec<EmploymentPremiums>,
    pub loss_ratio_by_state: Vec<GroupLossRatio>,
    pub policies_by_month: Vec<MonthlyPolicyCount>,
}

pub fn collect(conn: &Connection) -> Result<Report> {
    Ok(Report {
        overall_loss_ratio: overall_loss_ratio(conn)?,
        loss_ratio_by_coverage: loss_ratio_by(conn, "coverage")?,
        claims_by_vehicle_class: claims_by_vehicle_class(conn)?,
        loss_ratio_by_vehicle_and_coverage: loss_ratio_by_vehicle_and_coverage(conn)?,
        premiums_by_employment: premiums_by_employment(conn)?,
        loss_ratio_by_state: loss_ratio_by(conn, "state")?,
        policies_by_month: policies_by_month(conn)?,
    })
}

/// Σclaims / Σpremiums over the whole table; NULL (not an error) when the
/// denominator is zero or the table is empty.
pub fn overall_loss_ratio(conn: &Connection) -> Result<Option<f64>> {
    let ratio = conn.query_row(
        &format!(
            "SELECT ROUND(CAST(SUM(total_claim_amount) AS REAL) / NULLIF(SUM(annual_premium), 0), 4) \
             FROM {}",
            TABLE
        ),
        [],
        |row| row.get(0),
    )?;
    Ok(ratio)
}

fn loss_ratio_by(conn: &Connection, column: &str) -> Result<Vec<GroupLossRatio>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {col}, \
                ROUND(CAST(SUM(total_claim_amount) AS REAL) / NULLIF(SUM(annual_premium), 0), 4) AS loss_ratio \
         FROM {table} \
         GROUP BY {col} \
         ORDER BY loss_ratio DESC",
        col = column,
        table = TABLE
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(GroupLossRatio {
            group: row.get(0)?,
            loss_ratio: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

fn claims_by_vehicle_class(conn: &Connection) -> Result<Vec<VehicleClassClaims>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT vehicle_class, ROUND(AVG(total_claim_amount), 2) AS avg_claim, COUNT(*) \
         FROM {} \
         GROUP BY vehicle_class \
         ORDER BY avg_claim DESC",
        TABLE
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(VehicleClassClaims {
            vehicle_class: row.get(0)?,
            avg_claim: row.get(1)?,
            policies: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

fn loss_ratio_by_vehicle_and_coverage(
    conn: &Connection,
) -> Result<Vec<VehicleCoverageLossRatio>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT vehicle_class, coverage, \
                ROUND(CAST(SUM(total_claim_amount) AS REAL) / NULLIF(SUM(annual_premium), 0), 4) AS loss_ratio \
         FROM {} \
         GROUP BY vehicle_class, coverage \
         ORDER BY loss_ratio DESC",
        TABLE
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(VehicleCoverageLossRatio {
            vehicle_class: row.get(0)?,
            coverage: row.get(1)?,
            loss_ratio: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

/// Average annual premium is recomputed inline from `monthly_premium_auto`,
/// deliberately not read from the stored derived column.
fn premiums_by_employment(conn: &Connection) -> Result<Vec<EmploymentPremiums>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT employment_status, \
                ROUND(AVG(monthly_premium_auto * 12), 2) AS avg_annual_premium, \
                ROUND(AVG(total_claim_amount), 2) AS avg_claim \
         FROM {} \
         GROUP BY employment_status \
         ORDER BY avg_claim DESC",
        TABLE
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(EmploymentPremiums {
            employment_status: row.get(0)?,
            avg_annual_premium: row.get(1)?,
            avg_claim: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

fn policies_by_month(conn: &Connection) -> Result<Vec<MonthlyPolicyCount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT substr(effective_to_date, 1, 7) AS month, COUNT(*) \
         FROM {} \
         GROUP BY month \
         ORDER BY month ASC",
        TABLE
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(MonthlyPolicyCount {
            month: row.get(0)?,
            policies: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

fn fmt_ratio(value: &Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_avg(value: &Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_group(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "(null)".to_string())
}

impl Report {
    /// Prints the summary tables to the console.
    pub fn print(&self) {
        println!("\n📈 Overall loss ratio: {}", fmt_ratio(&self.overall_loss_ratio));

        println!("\n📊 Loss ratio by coverage:");
        for row in &self.loss_ratio_by_coverage {
            println!("   {:<16} {}", fmt_group(&row.group), fmt_ratio(&row.loss_ratio));
        }

        println!("\n🚗 Average claim by vehicle class:");
        for row in &self.claims_by_vehicle_class {
            println!(
                "   {:<16} avg claim {:<10} policies {}",
                fmt_group(&row.vehicle_class),
                fmt_avg(&row.avg_claim),
                row.policies
            );
        }

        println!("\n📊 Loss ratio by vehicle class and coverage:");
        for row in &self.loss_ratio_by_vehicle_and_coverage {
            println!(
                "   {:<16} {:<12} {}",
                fmt_group(&row.vehicle_class),
                fmt_group(&row.coverage),
                fmt_ratio(&row.loss_ratio)
            );
        }

        println!("\n💼 Premiums and claims by employment status:");
        for row in &self.premiums_by_employment {
            println!(
                "   {:<16} avg premium {:<10} avg claim {}",
                fmt_group(&row.employment_status),
                fmt_avg(&row.avg_annual_premium),
                fmt_avg(&row.avg_claim)
            );
        }

        println!("\n🗺️  Loss ratio by state:");
        for row in &self.loss_ratio_by_state {
            println!("   {:<16} {}", fmt_group(&row.group), fmt_ratio(&row.loss_ratio));
        }

        println!("\n📅 Policies by month:");
        for row in &self.policies_by_month {
            println!("   {:<10} {}", fmt_group(&row.month), row.policies);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::enrich;
    use crate::schema::create_schema;
    use crate::storage::Db;

    #[test]
    fn empty_table_yields_null_loss_ratio() {
        let db = Db::open_in_memory().unwrap();
        create_schema(db.conn()).unwrap();
        enrich(db.conn()).unwrap();
        assert_eq!(overall_loss_ratio(db.conn()).unwrap(), None);
    }

    #[test]
    fn zero_premium_group_yields_null_not_error() {
        let db = Db::open_in_memory().unwrap();
        create_schema(db.conn()).unwrap();
        db.conn()
            .execute_batch(
                "INSERT INTO motor_insurance_raw
                     (customer, coverage, monthly_premium_auto, total_claim_amount)
                 VALUES ('C1', 'Basic', 0, 10);",
            )
            .unwrap();
        enrich(db.conn()).unwrap();

        let report = collect(db.conn()).unwrap();
        assert_eq!(report.overall_loss_ratio, None);
        assert_eq!(report.loss_ratio_by_coverage.len(), 1);
        assert_eq!(report.loss_ratio_by_coverage[0].loss_ratio, None);
    }

    #[test]
    fn monthly_counts_sort_ascending() {
        let db = Db::open_in_memory().unwrap();
        create_schema(db.conn()).unwrap();
        db.conn()
            .execute_batch(
                "INSERT INTO motor_insurance_raw (customer, effective_to_date, monthly_premium_auto)
                 VALUES
                     ('C1', '2011-02-18', 100),
                     ('C2', '2011-01-02', 100),
                     ('C3', '2011-02-26', 100);",
            )
            .unwrap();
        enrich(db.conn()).unwrap();

        let months = policies_by_month(db.conn()).unwrap();
        assert_eq!(
            months,
            vec![
                MonthlyPolicyCount {
                    month: Some("2011-01".to_string()),
                    policies: 1
                },
                MonthlyPolicyCount {
                    month: Some("2011-02".to_string()),
                    policies: 2
                },
            ]
        );
    }
}
