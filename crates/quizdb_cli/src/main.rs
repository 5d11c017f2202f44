//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `quizdb_core` linkage and schema bootstrap from configuration.
//! - Print deterministic `key=value` lines for quick local sanity checks.

use log::info;
use quizdb_core::db::{count_rows, migrations::latest_version, schema_version};
use quizdb_core::CoreConfig;
use std::error::Error;
use std::process::ExitCode;

const COUNTED_TABLES: &[&str] = &[
    "users",
    "questions",
    "answers",
    "games",
    "results",
    "user_scores",
];

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("quizdb error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    config.init_logging()?;

    println!("quizdb_core ping={}", quizdb_core::ping());
    println!("quizdb_core version={}", quizdb_core::core_version());

    let conn = config.open_db()?;
    println!(
        "schema version={} latest={}",
        schema_version(&conn)?,
        latest_version()
    );
    for table in COUNTED_TABLES {
        println!("rows table={table} count={}", count_rows(&conn, table)?);
    }

    info!("event=cli_probe module=cli status=ok");
    Ok(())
}
