use asi_core::store::load_csv_records;
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

/// Validates a CSV bigram corpus and reports its archetype coverage. Does
/// not write to any store; the production build pipeline that populates
/// Postgres from a source of truth lives outside this crate.
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    pub corpus: PathBuf,
}

pub async fn run(args: IngestArgs) {
    let records = match load_csv_records(&args.corpus) {
        Ok(r) => r,
        Err(e) => {
            error!("failed to parse '{}': {e}", args.corpus.display());
            process::exit(1);
        }
    };

    if records.is_empty() {
        error!("corpus '{}' contains no records", args.corpus.display());
        process::exit(1);
    }

    let archetypes: BTreeSet<String> = records.iter().map(|r| r.archetype.clone()).collect();
    info!(
        "parsed {} record(s) across {} archetype(s)",
        records.len(),
        archetypes.len()
    );

    crate::reports::tables::ingest_summary(&archetypes, records.len());
}
