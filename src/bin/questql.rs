//! questql command line
//!
//! Runs player SQL against a JSON database, grades it against a floor, or
//! prints the parsed statement.

use clap::{Parser, Subcommand};
use log::debug;
use questql::questql::grading::{Diagnostics, FloorSpec, QueryValidator};
use questql::questql::sql::config::{load_emulator_config, load_registry, load_typed};
use questql::questql::sql::{Database, EmulatorConfig, Registry, Row, SqlEmulator, SqlParser};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "questql")]
#[command(about = "Run and grade player SQL against in-memory tables")]
#[command(version)]
struct Cli {
    /// Clause/aggregate manifest (YAML or JSON); built-ins when omitted
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Engine config file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every pipeline phase
    #[arg(long, global = true)]
    trace_phases: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print the result rows as JSON
    Run {
        /// Database file: {"table": [{...}, ...], ...}
        #[arg(long)]
        db: PathBuf,

        /// Report the error instead of printing an empty result
        #[arg(long)]
        strict: bool,

        sql: String,
    },
    /// Grade a query against a floor; exits 1 on failure
    Grade {
        #[arg(long)]
        db: PathBuf,

        /// Floor spec file with answer / patterns / specialValidation
        #[arg(long)]
        floor: PathBuf,

        /// Print diagnostics for a failed attempt
        #[arg(long)]
        explain: bool,

        sql: String,
    },
    /// Print the parsed statement as JSON
    Parse { sql: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { db, strict, sql } => {
            let emulator = build_emulator(&cli)?;
            let database = load_database(db)?;
            let rows = if *strict {
                emulator.try_emulate(sql, &database)?
            } else {
                emulator.emulate(sql, &database)
            };
            print_rows(&rows)?;
        }
        Commands::Grade {
            db,
            floor,
            explain,
            sql,
        } => {
            let emulator = build_emulator(&cli)?;
            let database = load_database(db)?;
            let floor: FloorSpec = load_typed(floor)?;
            let report = QueryValidator::new(&emulator).grade(sql, &floor, &database);
            println!("{}", if report.passed { "PASS" } else { "FAIL" });
            for note in &report.notes {
                println!("  {}", note);
            }
            if !report.passed {
                if *explain {
                    let diagnostics = Diagnostics::collect(sql, &emulator, &database);
                    for problem in diagnostics.problems() {
                        println!("  {}", problem);
                    }
                    if !diagnostics.missing_tables.is_empty() {
                        println!("  tables: {}", database.table_names().join(", "));
                    }
                }
                process::exit(1);
            }
        }
        Commands::Parse { sql } => {
            let statement = SqlParser::new().parse(sql)?;
            println!("{}", serde_json::to_string_pretty(&statement)?);
        }
    }
    Ok(())
}

fn build_emulator(cli: &Cli) -> Result<SqlEmulator, Box<dyn std::error::Error>> {
    let registry = match &cli.manifest {
        Some(path) => load_registry(path)?,
        None => Registry::with_builtins(),
    };
    let mut config = match &cli.config {
        Some(path) => load_emulator_config(path)?,
        None => EmulatorConfig::default(),
    };
    if cli.trace_phases {
        config = config.with_trace_phases(true);
    }
    debug!("Registered clauses: {:?}", registry.clause_keywords());
    Ok(SqlEmulator::new(registry, config))
}

fn load_database(path: &Path) -> Result<Database, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read database {}: {}", path.display(), e))?;
    Ok(Database::from_json_str(&text)?)
}

fn print_rows(rows: &[Row]) -> Result<(), Box<dyn std::error::Error>> {
    let json: Vec<serde_json::Value> = rows.iter().map(Row::to_json).collect();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
