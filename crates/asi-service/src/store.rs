use asi_core::model::{Bigram, BigramRecord};
use asi_core::store::{BigramStore, StoreQueryResult, StoreStats};
use asi_core::{AsiError, AsiResult, Format};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::BTreeSet;
use std::time::Instant;

/// PostgreSQL-backed `BigramStore`. Bound by the index on
/// `(format, c1, c2)` declared in `schema.sql`: query cost is proportional
/// to the candidate bigram set, not to the full archetype corpus.
#[derive(Clone)]
pub struct PostgresBigramStore {
    pool: PgPool,
    known_formats: BTreeSet<Format>,
}

impl PostgresBigramStore {
    pub fn new(pool: PgPool, known_formats: Vec<String>) -> Self {
        Self {
            pool,
            known_formats: known_formats.into_iter().collect(),
        }
    }
}

#[async_trait]
impl BigramStore for PostgresBigramStore {
    async fn lookup(
        &self,
        format: &Format,
        candidates: &BTreeSet<Bigram>,
    ) -> AsiResult<StoreQueryResult> {
        if candidates.is_empty() {
            return Ok(StoreQueryResult {
                rows: Vec::new(),
                stats: StoreStats {
                    rows_scanned: 0,
                    exec_ms: 0.0,
                },
            });
        }

        let c1s: Vec<&str> = candidates.iter().map(|b| b.c1.as_str()).collect();
        let c2s: Vec<&str> = candidates.iter().map(|b| b.c2.as_str()).collect();

        let start = Instant::now();
        let rows = sqlx::query(
            r#"
            SELECT archetype, c1, c2, k1, k2
            FROM bigram_records
            WHERE format = $1
              AND (c1, c2) IN (SELECT * FROM UNNEST($2::text[], $3::text[]))
            "#,
        )
        .bind(format)
        .bind(&c1s[..])
        .bind(&c2s[..])
        .fetch_all(&self.pool)
        .await
        .map_err(classify_sqlx_error)?;

        let exec_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let archetype: String = row.try_get("archetype").map_err(classify_sqlx_error)?;
            let c1: String = row.try_get("c1").map_err(classify_sqlx_error)?;
            let c2: String = row.try_get("c2").map_err(classify_sqlx_error)?;
            let k1: i16 = row.try_get("k1").map_err(classify_sqlx_error)?;
            let k2: i16 = row.try_get("k2").map_err(classify_sqlx_error)?;
            records.push(BigramRecord {
                archetype,
                bigram: Bigram::canonical(c1, c2),
                k1: k1 as u8,
                k2: k2 as u8,
            });
        }

        Ok(StoreQueryResult {
            stats: StoreStats {
                rows_scanned: records.len() as u64,
                exec_ms,
            },
            rows: records,
        })
    }

    fn is_known_format(&self, format: &Format) -> bool {
        self.known_formats.contains(format)
    }
}

/// Distinguishes the two store-level failure modes from §4.2: a row or
/// column shape the code doesn't recognize (the store's schema has drifted
/// from what this binary expects — fatal, not worth retrying) from every
/// other `sqlx` failure (connection refused, pool exhausted, timed out —
/// transient, surfaced to the client as a generic service-unavailable).
fn classify_sqlx_error(e: sqlx::Error) -> AsiError {
    match &e {
        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::ColumnIndexOutOfBounds { .. } => AsiError::SchemaMismatch(e.to_string()),
        _ => AsiError::StoreUnavailable(e.to_string()),
    }
}
