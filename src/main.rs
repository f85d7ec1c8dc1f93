// ==========================================
// Schedule Import - command line entry
// ==========================================
// Usage:
//   schedule-import import <file> [--user <id>]
//   schedule-import delete <imported_file_id>
//   schedule-import list [limit]
//
// Database path: SCHEDULE_IMPORT_DB_PATH, else the per-user data dir.
// SCHEDULE_IMPORT_LOG_FORMAT=json switches to JSON log lines.
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use schedule_import::api::ImportApi;
use schedule_import::{db, logging};

const LOG_FORMAT_ENV: &str = "SCHEDULE_IMPORT_LOG_FORMAT";
const DEFAULT_UPLOADED_BY: i64 = 1;
const DEFAULT_LIST_LIMIT: usize = 20;

const USAGE: &str = "usage:
  schedule-import import <file> [--user <id>]
  schedule-import delete <imported_file_id>
  schedule-import list [limit]";

enum Command {
    Import { path: String, uploaded_by: i64 },
    Delete { imported_file_id: i64 },
    List { limit: usize },
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let command = args.next().ok_or_else(|| anyhow!(USAGE))?;

    match command.as_str() {
        "import" => {
            let mut path = None;
            let mut uploaded_by = DEFAULT_UPLOADED_BY;
            while let Some(arg) = args.next() {
                if arg == "--user" {
                    let raw = args.next().context("--user needs a value")?;
                    uploaded_by = raw
                        .parse()
                        .with_context(|| format!("invalid user id: {}", raw))?;
                } else if path.is_none() {
                    path = Some(arg);
                } else {
                    bail!("unexpected argument: {}\n{}", arg, USAGE);
                }
            }
            let path = path.ok_or_else(|| anyhow!("missing file path\n{}", USAGE))?;
            Ok(Command::Import { path, uploaded_by })
        }
        "delete" => {
            let raw = args.next().ok_or_else(|| anyhow!(USAGE))?;
            let imported_file_id = raw
                .parse()
                .with_context(|| format!("invalid import id: {}", raw))?;
            Ok(Command::Delete { imported_file_id })
        }
        "list" => {
            let limit = match args.next() {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("invalid limit: {}", raw))?,
                None => DEFAULT_LIST_LIMIT,
            };
            Ok(Command::List { limit })
        }
        other => bail!("unknown command: {}\n{}", other, USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    match std::env::var(LOG_FORMAT_ENV) {
        Ok(format) if format.eq_ignore_ascii_case("json") => logging::init_json(),
        _ => logging::init(),
    }

    let command = parse_args(std::env::args().skip(1))?;

    let db_path = db::default_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let db_path = db_path.to_string_lossy().to_string();
    tracing::info!(version = schedule_import::VERSION, db_path = %db_path, "starting");

    let api = ImportApi::open(&db_path).await?;

    match command {
        Command::Import { path, uploaded_by } => {
            let response = match api.import_file_from_path(&path, uploaded_by).await {
                Ok(response) => response,
                Err(e) => {
                    for row_error in e.row_errors() {
                        eprintln!("  row {}: {}", row_error.row, row_error.error);
                    }
                    return Err(anyhow!("{} ({})", e, e.detail()));
                }
            };
            println!("{}", response.message);
            for row_error in &response.errors {
                println!("  row {}: {}", row_error.row, row_error.error);
            }
            println!("imported_file_id={}", response.imported_file_id);
        }
        Command::Delete { imported_file_id } => {
            let response = api.delete_import(imported_file_id).await?;
            println!("{}", response.message);
            if !response.deleted {
                std::process::exit(1);
            }
        }
        Command::List { limit } => {
            for file in api.list_imports(limit).await? {
                println!(
                    "{}\t{}\t{}\t{}/{}\t{}",
                    file.id,
                    file.created_at.to_rfc3339(),
                    file.status.as_str(),
                    file.success_count,
                    file.success_count + file.error_count,
                    file.original_name
                );
            }
        }
    }

    Ok(())
}
