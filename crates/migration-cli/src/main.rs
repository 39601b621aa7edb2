//! Thin CLI wrapper (out of scope per the core contract, included here as a
//! shell that does argument parsing, boundary validation, and output
//! writing — nothing that the core pipeline itself should own).

mod boundary;
mod opt;
mod output;

use chrono::Utc;
use migration_core::{CancellationToken, DiffEngine, DiffRequest};
use opt::{Opt, OutputFormat};
use schema_describer::{EngineKind, ReadOptions};
use schema_differ::SystemClock;
use structopt::StructOpt;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();
    let exit_code = run(opt).await;
    std::process::exit(exit_code);
}

async fn run(opt: Opt) -> i32 {
    install_tracing(opt.verbose);

    let migration_name = opt.migration_name.clone().unwrap_or_else(default_migration_name);

    if let Err(err) = boundary::validate_connection_string(&opt.source) {
        eprintln!("error: source connection string: {}", err);
        return EXIT_FAILURE;
    }
    if let Err(err) = boundary::validate_connection_string(&opt.target) {
        eprintln!("error: target connection string: {}", err);
        return EXIT_FAILURE;
    }
    if let Err(err) = boundary::validate_migration_name(&migration_name) {
        eprintln!("error: migration name: {}", err);
        return EXIT_FAILURE;
    }

    let engine = match EngineKind::parse(&opt.engine_type) {
        Some(engine) => engine,
        None => {
            eprintln!("error: unknown engine type '{}', expected one of postgres|mysql|sqlserver|sqlite", opt.engine_type);
            return EXIT_FAILURE;
        }
    };

    let options = ReadOptions {
        include_tables: split_csv(opt.tables.as_deref()),
        exclude_tables: split_csv(opt.ignore.as_deref()),
        ..ReadOptions::default()
    };

    let clock = SystemClock;
    let diff_engine = DiffEngine::new(engine, &clock);
    let cancel = CancellationToken::new();

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    let request = DiffRequest {
        source_conn: &opt.source,
        target_conn: &opt.target,
        options,
        migration_name: migration_name.clone(),
    };

    match diff_engine.run(request, &cancel).await {
        Ok(outcome) => {
            if let Err(err) = write_output(opt.output, &outcome, &migration_name) {
                eprintln!("error: could not write output: {}", err);
                return EXIT_FAILURE;
            }
            EXIT_SUCCESS
        }
        Err(_) if cancel.is_cancelled() => EXIT_CANCELLED,
        Err(err) => {
            eprintln!("error: {}", err);
            EXIT_FAILURE
        }
    }
}

fn write_output(format: OutputFormat, outcome: &migration_core::DiffOutcome, migration_name: &str) -> std::io::Result<()> {
    match format {
        OutputFormat::Console => {
            println!("{}", output::render_console(outcome));
            Ok(())
        }
        OutputFormat::Sql => output::write_sql(outcome, migration_name),
        OutputFormat::Json => output::write_json(outcome, migration_name),
        OutputFormat::Markdown => output::write_markdown(outcome, migration_name),
    }
}

fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split(',').map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn default_migration_name() -> String {
    format!("schema_migration_{}", Utc::now().format("%Y%m%d_%H%M%S"))
}

fn install_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = tracing_subscriber::fmt().with_max_level(level).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_drops_empty_entries() {
        assert_eq!(split_csv(Some("users, orders ,,  products")), vec!["users", "orders", "products"]);
    }

    #[test]
    fn split_csv_of_none_is_empty() {
        assert!(split_csv(None).is_empty());
    }

    #[test]
    fn default_migration_name_has_the_expected_shape() {
        let name = default_migration_name();
        assert!(name.starts_with("schema_migration_"));
        assert_eq!(name.len(), "schema_migration_".len() + "20260101_000000".len());
    }
}
