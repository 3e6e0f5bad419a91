//! The hypergeometric kernel (component C1).
//!
//! Everything here operates over a bounded integer domain: a 60-card deck,
//! a 7-card opening hand, and copy counts of at most a handful of cards.
//! Binomial coefficients are computed exactly over `u128` and cached once
//! per process; floating point only enters once the ratio is formed.

use std::sync::OnceLock;

/// Opening hand size used throughout serve-time scoring.
pub const HAND_SIZE: u32 = 7;
/// Deck size assumed by the joint-probability model.
pub const DECK_SIZE: u32 = 60;

const TABLE_N: usize = (DECK_SIZE as usize) + 1;
const TABLE_R: usize = (HAND_SIZE as usize) + 1;

/// `C(n, r)` for `n in 0..=DECK_SIZE`, `r in 0..=HAND_SIZE`, computed once
/// and shared read-only for the lifetime of the process. No copy count
/// exceeds `HAND_SIZE` in the formulas this kernel evaluates, so the table
/// never needs a wider second dimension.
fn choose_table() -> &'static [[u128; TABLE_R]; TABLE_N] {
    static TABLE: OnceLock<[[u128; TABLE_R]; TABLE_N]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [[0u128; TABLE_R]; TABLE_N];
        for (n, row) in table.iter_mut().enumerate() {
            for (r, cell) in row.iter_mut().enumerate() {
                *cell = choose_exact(n as u64, r as u64);
            }
        }
        table
    })
}

/// Exact `C(n, r)` via the multiplicative formula. Used only to seed the
/// cache; not on the request hot path.
fn choose_exact(n: u64, r: u64) -> u128 {
    if r > n {
        return 0;
    }
    let r = r.min(n - r);
    let mut acc: u128 = 1;
    for i in 0..r {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
    }
    acc
}

/// `C(n, r)`, served from the process-wide cache when both arguments fall
/// within the table's bounds, falling back to direct computation otherwise
/// (the bound always holds for the formulas in this module, but the guard
/// keeps the function total rather than panicking on a future misuse).
fn choose(n: u64, r: u64) -> u128 {
    if (n as usize) < TABLE_N && (r as usize) < TABLE_R {
        choose_table()[n as usize][r as usize]
    } else {
        choose_exact(n, r)
    }
}

/// `H(k, N, n, m)`: the probability of drawing at least `n` and at most `k`
/// successes when drawing `k` cards without replacement from a population
/// of `N` containing `m` successes.
///
/// `H(k, N, n, m) = sum_{i=n..=min(m,k)} C(m,i) * C(N-m,k-i) / C(N,k)`
pub fn tail_probability(k: u32, n_pop: u32, n_thresh: u32, m: u32) -> f64 {
    if m == 0 {
        return 0.0;
    }
    if m >= n_pop {
        return 1.0;
    }

    let denom = choose(n_pop as u64, k as u64);
    if denom == 0 {
        return 0.0;
    }

    let upper = m.min(k);
    if n_thresh > upper {
        return 0.0;
    }

    let mut numerator: u128 = 0;
    for i in n_thresh..=upper {
        numerator += choose(m as u64, i as u64) * choose((n_pop - m) as u64, (k - i) as u64);
    }

    (numerator as f64 / denom as f64).clamp(0.0, 1.0)
}

/// `H(HAND_SIZE, DECK_SIZE, 1, m)`: probability of at least one copy of an
/// `m`-copy pool in a 7-card opening hand out of a 60-card deck.
pub fn at_least_one(m: u32) -> f64 {
    tail_probability(HAND_SIZE, DECK_SIZE, 1, m)
}

/// `P(b | A)`: inclusion-exclusion joint probability of drawing at least
/// one copy of either card in a bigram `(k1, k2)` copy split.
///
/// `p1 + p2 - p_union`, where `p_union` treats the two copy pools as merged.
pub fn joint_probability(k1: u32, k2: u32) -> f64 {
    let p1 = at_least_one(k1);
    let p2 = at_least_one(k2);
    let p_union = at_least_one(k1 + k2);
    p1 + p2 - p_union
}

/// `P_MAX(b)`: the per-bigram normalizer, using `k_max = max(4, ceil((k1+k2)/2))`
/// as a stand-in "fully-played" copy count so the normalizer never shrinks
/// as copy counts grow.
pub fn p_max(k1: u32, k2: u32) -> f64 {
    let k_max = k_max_for(k1, k2);
    let p = at_least_one(k_max);
    1.0 - (1.0 - p).powi(2)
}

fn k_max_for(k1: u32, k2: u32) -> u32 {
    let half_ceil = (k1 + k2).div_ceil(2);
    half_ceil.max(4)
}
