use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

pub async fn init_db(db_url: &str) -> PgPool {
    info!("Connecting to PostgreSQL...");

    let pool = connect_with_retry(db_url).await;

    let schema = include_str!("../schema.sql");
    apply_schema(&pool, schema).await;

    info!("Database connected and schema applied.");
    pool
}

async fn connect_with_retry(db_url: &str) -> PgPool {
    let max_retries = 30;
    let delay = Duration::from_secs(1);

    for i in 1..=max_retries {
        match PgPoolOptions::new()
            .max_connections(20)
            .connect(db_url)
            .await
        {
            Ok(p) => return p,
            Err(e) => {
                warn!(
                    "DB connection attempt {}/{} failed: {}. Retrying...",
                    i, max_retries, e
                );
                sleep(delay).await;
            }
        }
    }
    panic!("FATAL: Could not connect to Postgres after {max_retries} attempts.");
}

async fn apply_schema(pool: &PgPool, schema: &str) {
    for (i, sql) in split_sql(schema).into_iter().enumerate() {
        if sql.trim().is_empty() {
            continue;
        }

        if let Err(e) = sqlx::query(&sql).execute(pool).await {
            if let Some(db_err) = e.as_database_error() {
                if let Some(code) = db_err.code() {
                    // already-exists classes: safe to ignore on repeat boot
                    if ["42P07", "42710", "42723", "42P16"].contains(&code.as_ref()) {
                        continue;
                    }
                }
            }

            eprintln!("schema migration failed on statement #{}:", i + 1);
            eprintln!("{}", sql.trim());
            eprintln!("error: {e}");
            panic!("FATAL: schema migration failed.");
        }
    }
}

/// Splits a `.sql` file on statement-terminating semicolons, tolerating
/// `--` comments and ignoring semicolons inside function bodies (`$$...$$`).
fn split_sql(raw: &str) -> Vec<String> {
    let mut cmds = Vec::new();
    let mut current = String::new();
    let mut inside_dollar = false;

    for line in raw.lines() {
        let effective_line = line.find("--").map_or(line, |idx| &line[..idx]);
        let trimmed_check = effective_line.trim();

        if line.contains("$$") {
            inside_dollar = !inside_dollar;
        }

        current.push_str(line);
        current.push('\n');

        if !inside_dollar && !trimmed_check.is_empty() && trimmed_check.ends_with(';') {
            cmds.push(current.trim().to_string());
            current = String::new();
        }
    }

    if !current.trim().is_empty() {
        cmds.push(current.trim().to_string());
    }
    cmds
}

/// Loads the distinct set of known formats from the store at startup.
/// The store is rebuilt offline and is read-only at serve time, so this
/// snapshot is taken once and held for the lifetime of the process.
pub async fn load_known_formats(pool: &PgPool) -> Vec<String> {
    sqlx::query_scalar::<_, String>("SELECT DISTINCT format FROM bigram_records")
        .fetch_all(pool)
        .await
        .unwrap_or_default()
}
