use crate::domain::model::{AllocationResult, Quotient, MAX_DIVISOR_CEILING};
use crate::utils::error::{DhondtError, Result};
use crate::utils::validation::validate_non_negative;
use serde::{Deserialize, Serialize};

/// 負票數的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum NegativeVotes {
    /// 回報 InvalidInput，不做任何計算
    #[default]
    Reject,
    /// 相容模式：負數視為 0
    Clamp,
}

/// Stateless D'Hondt engine configured with a divisor ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Apportioner {
    max_divisor: u32,
    negative_votes: NegativeVotes,
}

impl Apportioner {
    pub fn new(max_divisor: u32) -> Self {
        Self {
            max_divisor,
            negative_votes: NegativeVotes::Reject,
        }
    }

    pub fn with_negative_votes(mut self, mode: NegativeVotes) -> Self {
        self.negative_votes = mode;
        self
    }

    pub fn max_divisor(&self) -> u32 {
        self.max_divisor
    }

    pub fn allocate(&self, votes: &[i64], seats: u32) -> Result<AllocationResult> {
        allocate_with(votes, seats, self.max_divisor, self.negative_votes)
    }
}

pub fn allocate(votes: &[i64], seats: u32, max_divisor: u32) -> Result<AllocationResult> {
    allocate_with(votes, seats, max_divisor, NegativeVotes::Reject)
}

pub fn allocate_with(
    votes: &[i64],
    seats: u32,
    max_divisor: u32,
    negative_votes: NegativeVotes,
) -> Result<AllocationResult> {
    if max_divisor == 0 || max_divisor > MAX_DIVISOR_CEILING {
        return Err(DhondtError::invalid_input(
            "max_divisor",
            max_divisor,
            format!("must be between 1 and {}", MAX_DIVISOR_CEILING),
        ));
    }

    let counts = votes
        .iter()
        .enumerate()
        .map(|(party, &v)| -> Result<u64> {
            match negative_votes {
                NegativeVotes::Reject => {
                    validate_non_negative(&format!("votes[{}]", party), v)?;
                    Ok(v as u64)
                }
                NegativeVotes::Clamp => Ok(v.max(0) as u64),
            }
        })
        .collect::<Result<Vec<u64>>>()?;

    // 零票政黨不產生任何商
    let mut ranking: Vec<Quotient> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v > 0)
        .flat_map(|(party, &votes)| {
            (1..=max_divisor).map(move |divisor| Quotient {
                party,
                divisor,
                votes,
            })
        })
        .collect();
    ranking.sort_by(Quotient::rank_cmp);

    let winners = (seats as usize).min(ranking.len());
    let mut seat_counts = vec![0u32; counts.len()];
    for quotient in &ranking[..winners] {
        seat_counts[quotient.party] += 1;
    }
    let next = (winners < ranking.len()).then_some(winners);

    tracing::debug!(
        "Allocated {} of {} seats across {} quotients (divisor ceiling {})",
        winners,
        seats,
        ranking.len(),
        max_divisor
    );

    Ok(AllocationResult {
        ranking,
        seats: seat_counts,
        winners,
        next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CellState;

    /// 測試用的簡單偽亂數，結果可重現
    fn pseudo_votes(seed: u64, parties: usize) -> Vec<i64> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (0..parties)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let raw = (state >> 33) % 5000;
                // 約四分之一的政黨為零票
                if raw % 4 == 0 {
                    0
                } else {
                    raw as i64
                }
            })
            .collect()
    }

    #[test]
    fn test_classic_dhondt_example() {
        // 100000, 80000, 50000, 40000, 33333, 30000, 26667 當選
        let result = allocate(&[100_000, 80_000, 30_000, 20_000], 7, 20).unwrap();
        assert_eq!(result.seats, vec![3, 3, 1, 0]);
        assert_eq!(result.winners, 7);

        let next = result.next_quotient().unwrap();
        assert_eq!((next.party, next.divisor), (0, 4));
    }

    #[test]
    fn test_classic_example_eight_seats() {
        let result = allocate(&[100_000, 80_000, 30_000, 20_000], 8, 20).unwrap();
        assert_eq!(result.seats, vec![4, 3, 1, 0]);

        // 100000/5、80000/4、20000/1 同值，政黨編號小者優先
        let next = result.next_quotient().unwrap();
        assert_eq!((next.party, next.divisor), (0, 5));
    }

    #[test]
    fn test_classic_example_with_tight_ceiling() {
        let result = allocate(&[100_000, 80_000, 30_000, 20_000], 8, 3).unwrap();
        assert_eq!(result.seats, vec![3, 3, 1, 1]);
    }

    #[test]
    fn test_all_zero_votes() {
        let result = allocate(&[0, 0, 0], 5, 20).unwrap();
        assert_eq!(result.seats, vec![0, 0, 0]);
        assert!(result.ranking.is_empty());
        assert!(result.winning().is_empty());
        assert_eq!(result.next, None);
    }

    #[test]
    fn test_zero_seats() {
        let result = allocate(&[500, 300, 200], 0, 20).unwrap();
        assert_eq!(result.seats, vec![0, 0, 0]);
        assert!(result.winning().is_empty());
        let next = result.next_quotient().unwrap();
        assert_eq!((next.party, next.divisor), (0, 1));
    }

    #[test]
    fn test_divisor_ceiling_caps_dominant_party() {
        let result = allocate(&[1_000_000, 10], 10, 3).unwrap();
        assert_eq!(result.seats, vec![3, 3]);
        assert_eq!(result.total_awarded(), 6);
        assert_eq!(result.next, None);
    }

    #[test]
    fn test_ties_broken_by_party_then_divisor() {
        let result = allocate(&[100, 100, 50], 3, 4).unwrap();
        let order: Vec<(usize, u32)> = result
            .ranking
            .iter()
            .take(5)
            .map(|q| (q.party, q.divisor))
            .collect();
        assert_eq!(order, vec![(0, 1), (1, 1), (0, 2), (1, 2), (2, 1)]);
        assert_eq!(result.seats, vec![2, 1, 0]);
        assert_eq!(result.cell_state(1, 2), CellState::Next);
        assert_eq!(result.cell_state(0, 2), CellState::Won);
        assert_eq!(result.cell_state(2, 1), CellState::Idle);
    }

    #[test]
    fn test_negative_votes_rejected() {
        match allocate(&[10, -1, 5], 3, 5) {
            Err(DhondtError::InvalidInput { field, .. }) => assert_eq!(field, "votes[1]"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_votes_clamped_in_compat_mode() {
        let engine = Apportioner::new(5).with_negative_votes(NegativeVotes::Clamp);
        let result = engine.allocate(&[10, -1, 5], 3).unwrap();
        assert_eq!(result.seats[1], 0);
        assert_eq!(result.total_awarded(), 3);
    }

    #[test]
    fn test_zero_divisor_ceiling_rejected() {
        assert!(matches!(
            allocate(&[10, 5], 2, 0),
            Err(DhondtError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_oversized_divisor_ceiling_rejected() {
        match allocate(&[1], 1, u32::MAX) {
            Err(DhondtError::InvalidInput { field, .. }) => assert_eq!(field, "max_divisor"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
        assert!(allocate(&[1], 1, MAX_DIVISOR_CEILING + 1).is_err());

        let result = allocate(&[1], 1, MAX_DIVISOR_CEILING).unwrap();
        assert_eq!(result.ranking.len(), MAX_DIVISOR_CEILING as usize);
    }

    #[test]
    fn test_total_seats_matches_available_quotients() {
        for seed in 0..40 {
            let votes = pseudo_votes(seed, 8);
            let positive = votes.iter().filter(|&&v| v > 0).count();
            for max_divisor in [1u32, 3, 7, 20] {
                for seats in [0u32, 1, 5, 13, 40, 200] {
                    let result = allocate(&votes, seats, max_divisor).unwrap();
                    let available = positive * max_divisor as usize;
                    assert_eq!(
                        result.total_awarded() as usize,
                        (seats as usize).min(available),
                        "votes {:?} seats {} ceiling {}",
                        votes,
                        seats,
                        max_divisor
                    );
                    for (party, &v) in votes.iter().enumerate() {
                        if v == 0 {
                            assert_eq!(result.seats[party], 0);
                        }
                        assert!(result.seats[party] <= max_divisor);
                    }
                }
            }
        }
    }

    #[test]
    fn test_more_votes_never_lose_seats() {
        for seed in 0..25 {
            let base = pseudo_votes(seed, 6);
            for party in 0..base.len() {
                let before = allocate(&base, 15, 10).unwrap().seats[party];
                for bump in [1i64, 17, 250, 4000] {
                    let mut votes = base.clone();
                    votes[party] += bump;
                    let after = allocate(&votes, 15, 10).unwrap().seats[party];
                    assert!(
                        after >= before,
                        "party {} lost seats after +{} votes: {:?}",
                        party,
                        bump,
                        base
                    );
                }
            }
        }
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let votes = [300, 200, 100, 300, 150, 0];
        let first = allocate(&votes, 9, 6).unwrap();
        let second = allocate(&votes, 9, 6).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
