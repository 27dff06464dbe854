//! # Weighted Random Selection
//!
//! The pure selection algorithm: given an ordered candidate sequence and a
//! weight-lookup function, pick one index with probability proportional to
//! weight. This is the one place where probability mass must exactly match
//! the configured proportions in expectation.
//!
//! Randomness is injected as an `Rng` parameter rather than drawn from an
//! ambient global generator, so tests can replay selections with a fixed
//! seed and a fixed candidate order.

use rand::Rng;

use crate::core::types::Endpoint;

/// Select one candidate index by weighted random choice
///
/// Algorithm:
/// 1. An empty sequence yields `None` - the caller owns the translation
///    into its no-candidates error
/// 2. Each candidate's weight is clamped to `max(0.0, weight)`, preserving
///    input order
/// 3. If the total weight is zero (all candidates non-positive), selection
///    falls back to a uniform draw so a result is still guaranteed
/// 4. Otherwise a value `r` is drawn uniformly in `[0, total)` and the scan
///    over cumulative partial sums returns the first index whose running sum
///    exceeds `r`
///
/// A candidate with weight `w` among a total `T > 0` is chosen with
/// probability `w / T`, independent of how many default-weight candidates
/// are also present. Selection is reproducible given a fixed `rng` and a
/// fixed candidate order; it never depends on map iteration order.
pub fn choose<R, F>(candidates: &[Endpoint], weight_of: F, rng: &mut R) -> Option<usize>
where
    R: Rng,
    F: Fn(&Endpoint) -> f64,
{
    if candidates.is_empty() {
        return None;
    }

    let weights: Vec<f64> = candidates
        .iter()
        .map(|candidate| weight_of(candidate).max(0.0))
        .collect();

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Some(rng.gen_range(0..candidates.len()));
    }

    let r = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if r < cumulative {
            return Some(index);
        }
    }

    // Float round-off can leave r marginally past the last partial sum.
    Some(candidates.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn candidates(n: u16) -> Vec<Endpoint> {
        (0..n).map(|i| Endpoint::new("localhost", 5001 + i)).collect()
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(choose(&[], |_| 1.0, &mut rng), None);
    }

    #[test]
    fn test_single_candidate_is_always_chosen() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = candidates(1);
        for _ in 0..100 {
            assert_eq!(choose(&pool, |_| 1.0, &mut rng), Some(0));
        }
    }

    #[test]
    fn test_result_is_always_a_valid_index() {
        let mut rng = StdRng::seed_from_u64(42);
        let pool = candidates(5);
        for _ in 0..10_000 {
            let index = choose(&pool, |e| (e.port % 3) as f64, &mut rng).unwrap();
            assert!(index < pool.len());
        }
    }

    #[test]
    fn test_zero_total_weight_falls_back_to_uniform() {
        let mut rng = StdRng::seed_from_u64(99);
        let pool = candidates(3);
        let mut counts = [0u32; 3];
        for _ in 0..30_000 {
            counts[choose(&pool, |_| 0.0, &mut rng).unwrap()] += 1;
        }
        for count in counts {
            assert!((count as i64 - 10_000).abs() < 600, "counts: {:?}", counts);
        }
    }

    #[test]
    fn test_negative_weights_are_clamped() {
        let mut rng = StdRng::seed_from_u64(3);
        let pool = candidates(2);
        // First candidate -5 clamps to 0, second stays 1: the second owns
        // all the probability mass.
        for _ in 0..1_000 {
            let index = choose(
                &pool,
                |e| if e.port == 5001 { -5.0 } else { 1.0 },
                &mut rng,
            )
            .unwrap();
            assert_eq!(index, 1);
        }
    }

    #[test]
    fn test_weights_three_to_one_split() {
        let mut rng = StdRng::seed_from_u64(2024);
        let pool = candidates(2);
        let mut first = 0u32;
        let draws = 100_000;
        for _ in 0..draws {
            if choose(&pool, |e| if e.port == 5001 { 3.0 } else { 1.0 }, &mut rng).unwrap() == 0 {
                first += 1;
            }
        }
        let frequency = first as f64 / draws as f64;
        assert!(
            (frequency - 0.75).abs() < 0.02,
            "expected ~0.75, got {}",
            frequency
        );
    }

    #[test]
    fn test_selection_is_reproducible_with_fixed_seed() {
        let pool = candidates(4);
        let weight_of = |e: &Endpoint| (e.port - 5000) as f64;

        let mut first_rng = StdRng::seed_from_u64(1234);
        let mut second_rng = StdRng::seed_from_u64(1234);
        for _ in 0..1_000 {
            assert_eq!(
                choose(&pool, weight_of, &mut first_rng),
                choose(&pool, weight_of, &mut second_rng)
            );
        }
    }

    #[test]
    fn test_default_weight_candidates_do_not_skew_weighted_ones() {
        // One candidate at weight 2 among three default-weight candidates:
        // expected share is 2/5 regardless of the unweighted peers.
        let mut rng = StdRng::seed_from_u64(55);
        let pool = candidates(4);
        let weight_of = |e: &Endpoint| if e.port == 5001 { 2.0 } else { 1.0 };

        let mut first = 0u32;
        let draws = 100_000;
        for _ in 0..draws {
            if choose(&pool, weight_of, &mut rng).unwrap() == 0 {
                first += 1;
            }
        }
        let frequency = first as f64 / draws as f64;
        assert!(
            (frequency - 0.4).abs() < 0.02,
            "expected ~0.4, got {}",
            frequency
        );
    }
}
