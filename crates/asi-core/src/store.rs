//! The bigram store interface (component C2). The engine never talks to a
//! concrete database; it talks to this trait, so a SQL-backed store (see
//! `asi-service`) and an in-memory fixture store can both serve it.

use crate::error::AsiResult;
use crate::model::{Bigram, BigramRecord, Format};
use async_trait::async_trait;
use fnv::FnvHashMap;
use std::collections::BTreeSet;
use std::time::Instant;

/// Metadata the store reports alongside its rows: how much work it did, so
/// the response's `meta` block can surface it to the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    pub rows_scanned: u64,
    pub exec_ms: f64,
}

/// The result of a single `lookup` call: every record whose bigram was in
/// the candidate set, plus the stats that went into producing them.
#[derive(Debug, Clone, Default)]
pub struct StoreQueryResult {
    pub rows: Vec<BigramRecord>,
    pub stats: StoreStats,
}

/// Given a format and a candidate bigram set, returns the matching records.
/// Implementations must make the query cost proportional to `|candidates|`,
/// not to the size of the full archetype corpus for the format.
#[async_trait]
pub trait BigramStore: Send + Sync {
    async fn lookup(
        &self,
        format: &Format,
        candidates: &BTreeSet<Bigram>,
    ) -> AsiResult<StoreQueryResult>;

    /// Whether `format` is a format this store has data for at all. Used by
    /// the request orchestrator to distinguish "unknown format" (a client
    /// error) from "known format, zero matching rows" (a valid empty result).
    fn is_known_format(&self, format: &Format) -> bool;
}

/// An in-memory store, indexed by `(format, bigram)` so lookups cost
/// `O(|candidates|)` regardless of corpus size. Used by tests, the CLI, and
/// as a fixture store for any deployment that doesn't need Postgres.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBigramStore {
    index: FnvHashMap<(Format, Bigram), Vec<BigramRecord>>,
    known_formats: BTreeSet<Format>,
}

impl InMemoryBigramStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a format as known even before any record is inserted for
    /// it, so an empty archetype corpus is still distinguishable from an
    /// unrecognized format.
    pub fn register_format(&mut self, format: &Format) {
        self.known_formats.insert(format.clone());
    }

    pub fn insert(&mut self, format: &Format, record: BigramRecord) {
        self.known_formats.insert(format.clone());
        self.index
            .entry((format.clone(), record.bigram.clone()))
            .or_default()
            .push(record);
    }

    pub fn from_records<I: IntoIterator<Item = (Format, BigramRecord)>>(records: I) -> Self {
        let mut store = Self::new();
        for (format, record) in records {
            store.insert(&format, record);
        }
        store
    }
}

#[async_trait]
impl BigramStore for InMemoryBigramStore {
    async fn lookup(
        &self,
        format: &Format,
        candidates: &BTreeSet<Bigram>,
    ) -> AsiResult<StoreQueryResult> {
        let start = Instant::now();
        let mut rows = Vec::new();
        let mut rows_scanned = 0u64;

        for bigram in candidates {
            if let Some(matches) = self.index.get(&(format.clone(), bigram.clone())) {
                rows_scanned += matches.len() as u64;
                rows.extend(matches.iter().cloned());
            }
        }

        Ok(StoreQueryResult {
            rows,
            stats: StoreStats {
                rows_scanned,
                exec_ms: start.elapsed().as_secs_f64() * 1000.0,
            },
        })
    }

    fn is_known_format(&self, format: &Format) -> bool {
        self.known_formats.contains(format)
    }
}

/// A malformed CSV bigram corpus: either the file itself doesn't parse, or
/// a row names the same card twice, which `Bigram::canonical` cannot
/// represent. Reported back to the caller rather than panicking, so a bad
/// corpus fails the `asi-cli ingest`/`query` commands loudly but gracefully
/// instead of aborting the process.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("row {line}: a bigram requires two distinct cards, got '{card}' twice")]
    DuplicateCard { line: u64, card: String },
}

/// Loads `BigramRecord`s for `format` from a CSV file with header
/// `archetype,c1,c2,k1,k2`. Intended for test fixtures and for the CLI's
/// `ingest` command; the production build pipeline that keeps the
/// Postgres-backed store current is out of scope here.
pub fn load_csv_records<P: AsRef<std::path::Path>>(
    path: P,
) -> Result<Vec<BigramRecord>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.len() < 5 {
            continue;
        }
        let line = row.position().map_or(0, |p| p.line());
        let archetype = row[0].trim().to_string();
        let c1 = row[1].trim().to_string();
        let c2 = row[2].trim().to_string();
        let k1: u8 = row[3].trim().parse().unwrap_or(1);
        let k2: u8 = row[4].trim().parse().unwrap_or(1);

        if c1 == c2 {
            return Err(CsvLoadError::DuplicateCard { line, card: c1 });
        }

        records.push(BigramRecord {
            archetype,
            bigram: crate::model::Bigram::canonical(c1, c2),
            k1,
            k2,
        });
    }
    Ok(records)
}
