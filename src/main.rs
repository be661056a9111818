use clap::{Parser, Subcommand};
use tracing::{error, info};

mod config;
mod enrich;
mod error;
mod loader;
mod logging;
mod report;
mod schema;
mod storage;
mod validate;

use crate::config::Config;
use crate::error::EtlError;
use crate::storage::Db;
use crate::validate::ValidationReport;

#[derive(Parser)]
#[command(name = "claims_etl")]
#[command(about = "Motor-insurance claims ETL and descriptive reporting")]
#[command(version = "0.1.0")]
struct Cli {
    /// Database file (overrides config.toml)
    #[arg(long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop and recreate the target table
    Schema,
    /// Bulk-load a CSV file into the table
    Load {
        /// CSV file path (falls back to config.toml [load].csv_path)
        csv: Option<String>,
    },
    /// Print row and null counts for the loaded table
    Validate,
    /// Add and populate the derived feature columns
    Enrich,
    /// Run the seven descriptive aggregate queries
    Report,
    /// Run all stages in order: schema, load, validate, enrich, report
    Run {
        /// CSV file path (falls back to config.toml [load].csv_path)
        csv: Option<String>,
    },
}

fn resolve_csv(arg: Option<String>, config: &Config) -> Result<String, EtlError> {
    arg.or_else(|| config.load.csv_path.clone()).ok_or_else(|| {
        EtlError::Config(
            "no CSV path given and no [load].csv_path in config.toml".to_string(),
        )
    })
}

fn print_validation(report: &ValidationReport) {
    println!("\n🔍 Validation counts:");
    println!("   Total rows: {}", report.total_rows);
    for (column, nulls) in &report.null_counts {
        println!("   Nulls in {:<20} {}", column, nulls);
    }
}

fn load_stage(db: &mut Db, csv_path: &str) -> Result<u64, EtlError> {
    info!(csv = csv_path, "starting CSV load");
    let rows = loader::load_csv(db.conn_mut(), csv_path)?;
    println!("📥 Loaded {} rows from {}", rows, csv_path);
    Ok(rows)
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    let db_path = cli.db.unwrap_or_else(|| config.database.path.clone());

    let mut db = Db::open(&db_path)?;
    info!(db = %db_path, "database opened");

    let outcome = match cli.command {
        Commands::Schema => {
            schema::create_schema(db.conn()).map(|()| println!("✅ Schema created"))
        }
        Commands::Load { csv } => {
            resolve_csv(csv, &config).and_then(|path| load_stage(&mut db, &path).map(|_| ()))
        }
        Commands::Validate => validate::validate(db.conn()).map(|report| {
            print_validation(&report);
        }),
        Commands::Enrich => {
            enrich::enrich(db.conn()).map(|()| println!("✅ Derived columns populated"))
        }
        Commands::Report => report::collect(db.conn()).map(|report| report.print()),
        Commands::Run { csv } => resolve_csv(csv, &config).and_then(|path| {
            // Strictly sequential; any stage failure halts the rest
            println!("🚀 Running full pipeline...");
            schema::create_schema(db.conn())?;
            println!("✅ Schema created");
            load_stage(&mut db, &path)?;
            let validation = validate::validate(db.conn())?;
            print_validation(&validation);
            enrich::enrich(db.conn())?;
            println!("✅ Derived columns populated");
            let report = report::collect(db.conn())?;
            report.print();
            println!("\n✅ Pipeline completed");
            Ok(())
        }),
    };

    if let Err(e) = outcome {
        error!("Pipeline stage failed: {}", e);
        println!("❌ {}", e);
        std::process::exit(1);
    }

    Ok(())
}
