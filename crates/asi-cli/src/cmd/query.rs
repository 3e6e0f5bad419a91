use asi_core::store::{load_csv_records, BigramStore, InMemoryBigramStore};
use asi_core::{extractor, scoring};
use clap::Args;
use std::path::PathBuf;
use std::process;
use tracing::error;

/// Scores a decklist offline against a CSV bigram corpus, bypassing the
/// HTTP service entirely. Useful for exercising the engine against a
/// candidate corpus before it is loaded into the production store.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Path to a CSV bigram corpus (header: archetype,c1,c2,k1,k2).
    #[arg(short, long)]
    pub corpus: PathBuf,

    /// Format tag to associate the corpus records with.
    #[arg(short, long, default_value = "default")]
    pub format: String,

    /// Card names making up the deck to score.
    #[arg(required = true)]
    pub cards: Vec<String>,
}

pub async fn run(args: QueryArgs) {
    let records = match load_csv_records(&args.corpus) {
        Ok(r) => r,
        Err(e) => {
            error!("failed to load corpus '{}': {e}", args.corpus.display());
            process::exit(1);
        }
    };

    let store = InMemoryBigramStore::from_records(
        records.into_iter().map(|r| (args.format.clone(), r)),
    );

    let (_deck, candidates) = match extractor::extract(args.cards.clone()) {
        Ok(pair) => pair,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let result = store
        .lookup(&args.format, &candidates)
        .await
        .expect("in-memory store lookup cannot fail");
    let outcome = scoring::score(&result.rows);

    crate::reports::tables::ranked_scores(&outcome.ranked);
}
