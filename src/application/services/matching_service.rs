use rand::Rng;

use crate::domain::entities::{MatchPair, Participant};

/// Upper bound on full re-draws before a matching run gives up. A draw only
/// dead-ends when the last unassigned receiver is the last giver itself, so
/// for any real participant set this bound is never reached.
pub const MAX_DRAW_ATTEMPTS: usize = 64;

#[derive(Debug)]
pub enum MatchingError {
    /// Fewer than two participants signed up.
    NotEnoughParticipants(usize),
    /// No valid assignment was found within `MAX_DRAW_ATTEMPTS`.
    DrawAttemptsExhausted,
}

impl std::fmt::Display for MatchingError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MatchingError::NotEnoughParticipants(count) => {
                write!(f, "Not enough participants for a draw: {}", count)
            }
            MatchingError::DrawAttemptsExhausted => {
                write!(f, "No valid assignment found within {} draws", MAX_DRAW_ATTEMPTS)
            }
        }
    }
}

impl std::error::Error for MatchingError {}

/// Draws the giver/receiver assignment for a Wichteln round.
pub struct MatchingService;

impl MatchingService {
    /// Produces a random derangement of the participants: every participant
    /// gives exactly once and receives exactly once, and nobody is assigned
    /// to themselves.
    ///
    /// The randomness source is injected so tests can drive the draw with a
    /// seeded rng.
    pub fn draw_pairs(
        participants: &[Participant],
        rng: &mut impl Rng,
    ) -> Result<Vec<MatchPair>, MatchingError> {
        if participants.len() < 2 {
            return Err(MatchingError::NotEnoughParticipants(participants.len()));
        }

        for _ in 0..MAX_DRAW_ATTEMPTS {
            if let Some(pairs) = Self::try_draw(participants, rng) {
                return Ok(pairs);
            }
        }

        Err(MatchingError::DrawAttemptsExhausted)
    }

    /// One greedy attempt: each giver in turn picks a uniformly random
    /// receiver among those not yet taken, excluding themselves. Returns
    /// `None` when a giver is left with no candidate, which aborts the whole
    /// attempt.
    fn try_draw(participants: &[Participant], rng: &mut impl Rng) -> Option<Vec<MatchPair>> {
        let mut open_receivers: Vec<usize> = (0..participants.len()).collect();
        let mut pairs = Vec::with_capacity(participants.len());

        for giver in 0..participants.len() {
            let candidates: Vec<usize> = open_receivers
                .iter()
                .copied()
                .filter(|&receiver| receiver != giver)
                .collect();

            if candidates.is_empty() {
                return None;
            }

            let receiver = candidates[rng.gen_range(0..candidates.len())];
            open_receivers.retain(|&r| r != receiver);
            pairs.push(MatchPair::new(
                participants[giver].clone(),
                participants[receiver].clone(),
            ));
        }

        Some(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn participants(count: usize) -> Vec<Participant> {
        (0..count)
            .map(|i| {
                Participant::new(
                    i as u64 + 1,
                    format!("user-{}", i),
                    "Steam".to_string(),
                    format!("code-{}", i),
                )
            })
            .collect()
    }

    fn assert_is_derangement(input: &[Participant], pairs: &[MatchPair]) {
        assert_eq!(pairs.len(), input.len());

        let givers: HashSet<u64> = pairs.iter().map(|p| p.giver.id).collect();
        let receivers: HashSet<u64> = pairs.iter().map(|p| p.receiver.id).collect();
        let everyone: HashSet<u64> = input.iter().map(|p| p.id).collect();

        assert_eq!(givers, everyone, "every participant gives exactly once");
        assert_eq!(receivers, everyone, "every participant receives exactly once");

        for pair in pairs {
            assert_ne!(pair.giver.id, pair.receiver.id, "no self-assignment");
        }
    }

    #[test]
    fn draws_a_derangement_for_various_sizes_and_seeds() {
        for size in [2, 3, 5, 8, 20] {
            let input = participants(size);
            for seed in 0..20 {
                let mut rng = StdRng::seed_from_u64(seed);
                let pairs = MatchingService::draw_pairs(&input, &mut rng)
                    .expect("draw must succeed for two or more participants");
                assert_is_derangement(&input, &pairs);
            }
        }
    }

    #[test]
    fn two_participants_always_swap() {
        let input = participants(2);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pairs = MatchingService::draw_pairs(&input, &mut rng)
                .expect("the two-participant draw is forced and must never fail");
            assert_eq!(pairs[0].giver.id, pairs[1].receiver.id);
            assert_eq!(pairs[0].receiver.id, pairs[1].giver.id);
        }
    }

    #[test]
    fn rejects_empty_and_single_participant_sets() {
        let mut rng = StdRng::seed_from_u64(7);

        match MatchingService::draw_pairs(&participants(0), &mut rng) {
            Err(MatchingError::NotEnoughParticipants(0)) => {}
            other => panic!("expected NotEnoughParticipants(0), got {:?}", other.err()),
        }

        match MatchingService::draw_pairs(&participants(1), &mut rng) {
            Err(MatchingError::NotEnoughParticipants(1)) => {}
            other => panic!("expected NotEnoughParticipants(1), got {:?}", other.err()),
        }
    }

    #[test]
    fn pairs_preserve_signup_details() {
        let input = participants(3);
        let mut rng = StdRng::seed_from_u64(42);
        let pairs = MatchingService::draw_pairs(&input, &mut rng).unwrap();

        for pair in pairs {
            let original = input.iter().find(|p| p.id == pair.receiver.id).unwrap();
            assert_eq!(pair.receiver.gift_platform_name, original.gift_platform_name);
            assert_eq!(
                pair.receiver.gift_platform_friend_code,
                original.gift_platform_friend_code
            );
        }
    }
}
