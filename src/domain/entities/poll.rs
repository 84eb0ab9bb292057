use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single answer option of a poll. The marker is the reaction emoji used
/// as the ballot for this option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub marker: String,
    pub label: String,
}

/// A reaction-based poll tracked until its end time passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub channel_id: u64,
    pub message_id: u64,
    pub question: String,
    pub options: Vec<PollOption>,
    pub end_time: DateTime<Utc>,
    pub max_votes_per_user: u32,
}

/// One tallied option of a closed poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalliedOption {
    pub marker: String,
    pub label: String,
    pub votes: u64,
}

impl Poll {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.options.iter().any(|option| option.marker == marker)
    }

    pub fn markers(&self) -> Vec<String> {
        self.options.iter().map(|option| option.marker.clone()).collect()
    }

    /// Computes the final tally from the live per-option reaction counts.
    ///
    /// The bot seeds every option with one reaction of its own, so each raw
    /// count is reduced by one. The result is sorted by votes descending;
    /// ties keep the original option order (stable sort).
    pub fn tally(&self, raw_counts: &[u64]) -> Vec<TalliedOption> {
        let mut tallied: Vec<TalliedOption> = self
            .options
            .iter()
            .zip(raw_counts.iter().copied().chain(std::iter::repeat(0)))
            .map(|(option, raw)| TalliedOption {
                marker: option.marker.clone(),
                label: option.label.clone(),
                votes: raw.saturating_sub(1),
            })
            .collect();

        tallied.sort_by(|a, b| b.votes.cmp(&a.votes));
        tallied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn poll_with_options(labels: &[&str]) -> Poll {
        let markers = ["🇦", "🇧", "🇨"];
        Poll {
            channel_id: 1,
            message_id: 2,
            question: "Wohin fahren wir?".to_string(),
            options: labels
                .iter()
                .enumerate()
                .map(|(i, label)| PollOption {
                    marker: markers[i].to_string(),
                    label: label.to_string(),
                })
                .collect(),
            end_time: Utc::now() + Duration::minutes(5),
            max_votes_per_user: 1,
        }
    }

    #[test]
    fn tally_subtracts_the_bot_seed_and_sorts_descending() {
        let poll = poll_with_options(&["A", "B", "C"]);
        let tallied = poll.tally(&[3, 1, 4]);

        let as_pairs: Vec<(&str, u64)> = tallied
            .iter()
            .map(|t| (t.label.as_str(), t.votes))
            .collect();
        assert_eq!(as_pairs, vec![("C", 3), ("A", 2), ("B", 0)]);
    }

    #[test]
    fn tally_keeps_option_order_on_ties() {
        let poll = poll_with_options(&["A", "B", "C"]);
        let tallied = poll.tally(&[3, 3, 3]);

        let labels: Vec<&str> = tallied.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
    }

    #[test]
    fn tally_saturates_at_zero_for_missing_seed() {
        let poll = poll_with_options(&["A"]);
        let tallied = poll.tally(&[0]);
        assert_eq!(tallied[0].votes, 0);
    }

    #[test]
    fn tally_treats_missing_counts_as_zero() {
        let poll = poll_with_options(&["A", "B"]);
        let tallied = poll.tally(&[2]);
        assert_eq!(tallied.len(), 2);
        assert_eq!(tallied[1].votes, 0);
    }

    #[test]
    fn expiry_is_inclusive_of_the_end_time() {
        let poll = poll_with_options(&["A"]);
        assert!(poll.is_expired(poll.end_time));
        assert!(!poll.is_expired(poll.end_time - Duration::seconds(1)));
    }
}
