//! Archetype Similarity Index scoring engine.
//!
//! This crate is the read-only core: the data model of archetypes and
//! bigrams (`model`), the hypergeometric joint-probability kernel
//! (`hypergeometric`), the bigram extractor (`extractor`), the bigram
//! store interface (`store`), and the two-pass scoring engine
//! (`scoring`). HTTP routing, credential handling, and the offline build
//! pipeline that populates a production store all live outside this
//! crate.

pub mod error;
pub mod extractor;
pub mod hypergeometric;
pub mod model;
pub mod scoring;
pub mod store;

pub use error::{AsiError, AsiResult};
pub use model::{Archetype, Bigram, BigramRecord, Card, Deck, Format};
pub use scoring::{ArchetypeWeights, ScoringOutcome};
pub use store::{BigramStore, InMemoryBigramStore, StoreQueryResult, StoreStats};
