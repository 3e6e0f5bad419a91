//! The bigram extractor (component C3): turns a submitted decklist into the
//! unordered set of unique card-pair bigrams that component C2 will be
//! queried with.

use crate::error::{AsiError, AsiResult};
use crate::model::{Bigram, Card, Deck};
use itertools::Itertools;
use std::collections::BTreeSet;

/// Deduplicates a client-submitted card list into a [`Deck`], then expands
/// it into every unordered pair in canonical form. `|B_q|` is `O(|D|^2)`;
/// a 75-card sideboarded deck produces roughly 2,775 pairs.
pub fn extract(cards: Vec<Card>) -> AsiResult<(Deck, BTreeSet<Bigram>)> {
    let deck = Deck::from_cards(cards).ok_or(AsiError::TooFewCards)?;
    let bigrams = candidate_bigrams(&deck);
    Ok((deck, bigrams))
}

fn candidate_bigrams(deck: &Deck) -> BTreeSet<Bigram> {
    deck.iter()
        .tuple_combinations()
        .map(|(a, b)| Bigram::canonical(a.clone(), b.clone()))
        .collect()
}
