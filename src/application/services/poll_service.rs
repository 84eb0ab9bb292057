use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::services::notification_service::NotificationService;
use crate::domain::entities::Poll;
use crate::domain::gateway::{GatewayError, MessagingGateway};
use crate::domain::repositories::{PollRepository, StoreError};

#[derive(Debug)]
pub enum PollError {
    Store(StoreError),
    Gateway(GatewayError),
}

impl std::fmt::Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PollError::Store(err) => write!(f, "{}", err),
            PollError::Gateway(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PollError {}

impl From<StoreError> for PollError {
    fn from(err: StoreError) -> Self {
        PollError::Store(err)
    }
}

impl From<GatewayError> for PollError {
    fn from(err: GatewayError) -> Self {
        PollError::Gateway(err)
    }
}

/// Lifecycle controller for reaction polls: tracks open polls, closes and
/// tallies them when their end time passes, and enforces the per-user vote
/// cap on every incoming reaction.
pub struct PollService {
    polls: Arc<dyn PollRepository>,
    gateway: Arc<dyn MessagingGateway>,
    notifier: Arc<NotificationService>,
}

impl PollService {
    pub fn new(
        polls: Arc<dyn PollRepository>,
        gateway: Arc<dyn MessagingGateway>,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self {
            polls,
            gateway,
            notifier,
        }
    }

    /// Start tracking a freshly posted poll.
    pub async fn register_poll(&self, poll: Poll) -> Result<(), PollError> {
        info!(
            "Tracking poll on message {} until {}",
            poll.message_id, poll.end_time
        );
        self.polls.add_poll(poll).await?;
        Ok(())
    }

    /// Closes every poll whose end time has passed. The store removes the
    /// polls at claim time, so a tick that is still awaiting network I/O when
    /// the next tick fires cannot process the same poll twice. One poll's
    /// failure (deleted message, missing permissions) is logged and skipped
    /// without blocking the rest. Returns the number of polls tallied.
    pub async fn close_expired(&self, now: DateTime<Utc>) -> usize {
        let expired = match self.polls.claim_expired(now).await {
            Ok(expired) => expired,
            Err(err) => {
                error!("Could not read expired polls: {}", err);
                return 0;
            }
        };

        let mut closed = 0;
        for poll in expired {
            match self.close_poll(&poll).await {
                Ok(()) => closed += 1,
                Err(err) => {
                    // the poll was already claimed out of the store, results
                    // for it are dropped rather than retried
                    warn!(
                        "Skipping results for poll on message {}: {}",
                        poll.message_id, err
                    );
                }
            }
        }
        closed
    }

    async fn close_poll(&self, poll: &Poll) -> Result<(), GatewayError> {
        let raw_counts = self
            .gateway
            .fetch_reaction_counts(poll.channel_id, poll.message_id, &poll.markers())
            .await?;

        let tallied = poll.tally(&raw_counts);
        self.notifier.send_poll_results(poll, &tallied).await?;

        info!("Poll \"{}\" closed and tallied", poll.question);
        Ok(())
    }

    /// Per-vote cap enforcement, invoked on every reaction-add event. If the
    /// reacting user now holds more reactions across the poll's markers than
    /// the poll allows, the triggering (most recent) reaction is removed.
    /// Returns whether a reaction was removed.
    pub async fn enforce_vote_cap(
        &self,
        channel_id: u64,
        message_id: u64,
        user_id: u64,
        marker: &str,
    ) -> Result<bool, PollError> {
        let Some(poll) = self.polls.find_by_message(channel_id, message_id).await? else {
            return Ok(false);
        };

        if !poll.has_marker(marker) {
            return Ok(false);
        }

        let total = self
            .gateway
            .count_user_reactions(channel_id, message_id, &poll.markers(), user_id)
            .await?;

        if total <= poll.max_votes_per_user {
            return Ok(false);
        }

        self.gateway
            .remove_user_reaction(channel_id, message_id, user_id, marker)
            .await?;
        info!(
            "Removed an over-limit vote of user {} on poll message {}",
            user_id, message_id
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PollOption;
    use crate::domain::gateway::MessageEmbed;
    use crate::infrastructure::repositories::JsonPollRepository;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Gateway double with per-message raw reaction counts and per-user vote
    /// totals; messages in `missing_messages` behave like deleted ones.
    #[derive(Default)]
    struct MockGateway {
        raw_counts: HashMap<u64, Vec<u64>>,
        user_totals: HashMap<(u64, u64), u32>,
        missing_messages: HashSet<u64>,
        embeds: Mutex<Vec<(u64, MessageEmbed)>>,
        removed_reactions: Mutex<Vec<(u64, u64, String)>>,
    }

    #[async_trait]
    impl MessagingGateway for MockGateway {
        async fn send_channel_message(
            &self,
            _channel_id: u64,
            _content: &str,
        ) -> Result<u64, GatewayError> {
            Ok(1)
        }

        async fn send_channel_embed(
            &self,
            channel_id: u64,
            embed: MessageEmbed,
        ) -> Result<u64, GatewayError> {
            self.embeds.lock().unwrap().push((channel_id, embed));
            Ok(1)
        }

        async fn edit_channel_message(
            &self,
            _channel_id: u64,
            _message_id: u64,
            _content: &str,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn delete_message(
            &self,
            _channel_id: u64,
            _message_id: u64,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn send_direct_message(
            &self,
            _user_id: u64,
            _content: &str,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn fetch_reaction_counts(
            &self,
            _channel_id: u64,
            message_id: u64,
            markers: &[String],
        ) -> Result<Vec<u64>, GatewayError> {
            if self.missing_messages.contains(&message_id) {
                return Err(GatewayError::NotFound);
            }
            Ok(self
                .raw_counts
                .get(&message_id)
                .cloned()
                .unwrap_or_else(|| vec![0; markers.len()]))
        }

        async fn count_user_reactions(
            &self,
            _channel_id: u64,
            message_id: u64,
            _markers: &[String],
            user_id: u64,
        ) -> Result<u32, GatewayError> {
            Ok(self
                .user_totals
                .get(&(message_id, user_id))
                .copied()
                .unwrap_or(0))
        }

        async fn remove_user_reaction(
            &self,
            _channel_id: u64,
            message_id: u64,
            user_id: u64,
            marker: &str,
        ) -> Result<(), GatewayError> {
            self.removed_reactions
                .lock()
                .unwrap()
                .push((message_id, user_id, marker.to_string()));
            Ok(())
        }
    }

    fn poll(message_id: u64, end_time: DateTime<Utc>, max_votes_per_user: u32) -> Poll {
        let markers = ["1️⃣", "2️⃣", "3️⃣"];
        Poll {
            channel_id: 5,
            message_id,
            question: "Wohin fahren wir?".to_string(),
            options: ["A", "B", "C"]
                .iter()
                .enumerate()
                .map(|(i, label)| PollOption {
                    marker: markers[i].to_string(),
                    label: label.to_string(),
                })
                .collect(),
            end_time,
            max_votes_per_user,
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        gateway: Arc<MockGateway>,
        service: PollService,
    }

    fn fixture(gateway: MockGateway) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polls.json");
        let repo = Arc::new(JsonPollRepository::new(path.to_str().unwrap()));
        let gateway = Arc::new(gateway);
        let notifier = Arc::new(NotificationService::new(gateway.clone()));
        let service = PollService::new(repo, gateway.clone(), notifier);
        Fixture {
            _dir: dir,
            gateway,
            service,
        }
    }

    #[tokio::test]
    async fn an_expired_poll_is_tallied_and_posted_in_vote_order() {
        let now = Utc::now();
        let fx = fixture(MockGateway {
            raw_counts: HashMap::from([(100, vec![3, 1, 4])]),
            ..MockGateway::default()
        });
        fx.service
            .register_poll(poll(100, now - Duration::seconds(1), 1))
            .await
            .unwrap();

        assert_eq!(fx.service.close_expired(now).await, 1);

        let embeds = fx.gateway.embeds.lock().unwrap();
        let (channel_id, embed) = &embeds[0];
        assert_eq!(*channel_id, 5);

        // seed subtracted, sorted descending: C(3), A(2), B(0)
        let fields: Vec<(String, String)> = embed
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();
        assert_eq!(fields[0], ("3️⃣ C".to_string(), "3 Stimmen".to_string()));
        assert_eq!(fields[1], ("1️⃣ A".to_string(), "2 Stimmen".to_string()));
        assert_eq!(fields[2], ("2️⃣ B".to_string(), "0 Stimmen".to_string()));
    }

    #[tokio::test]
    async fn polls_that_have_not_ended_stay_tracked() {
        let now = Utc::now();
        let fx = fixture(MockGateway::default());
        fx.service
            .register_poll(poll(100, now + Duration::minutes(5), 1))
            .await
            .unwrap();

        assert_eq!(fx.service.close_expired(now).await, 0);
        assert!(fx.gateway.embeds.lock().unwrap().is_empty());

        // still claimable once the end time passes
        assert_eq!(fx.service.close_expired(now + Duration::minutes(6)).await, 1);
    }

    #[tokio::test]
    async fn a_deleted_message_skips_that_poll_without_blocking_others() {
        let now = Utc::now();
        let fx = fixture(MockGateway {
            raw_counts: HashMap::from([(101, vec![1, 1, 1])]),
            missing_messages: HashSet::from([100]),
            ..MockGateway::default()
        });
        fx.service
            .register_poll(poll(100, now - Duration::seconds(2), 1))
            .await
            .unwrap();
        fx.service
            .register_poll(poll(101, now - Duration::seconds(1), 1))
            .await
            .unwrap();

        assert_eq!(fx.service.close_expired(now).await, 1);
        assert_eq!(fx.gateway.embeds.lock().unwrap().len(), 1);

        // the failed poll was consumed at claim time, it is not retried
        assert_eq!(fx.service.close_expired(now).await, 0);
    }

    #[tokio::test]
    async fn a_second_vote_over_the_cap_is_removed() {
        let now = Utc::now();
        let fx = fixture(MockGateway {
            user_totals: HashMap::from([((100, 7), 2)]),
            ..MockGateway::default()
        });
        fx.service
            .register_poll(poll(100, now + Duration::minutes(5), 1))
            .await
            .unwrap();

        let removed = fx.service.enforce_vote_cap(5, 100, 7, "2️⃣").await.unwrap();
        assert!(removed);
        assert_eq!(
            fx.gateway.removed_reactions.lock().unwrap().as_slice(),
            &[(100, 7, "2️⃣".to_string())]
        );
    }

    #[tokio::test]
    async fn votes_at_or_under_the_cap_are_left_alone() {
        let now = Utc::now();
        let fx = fixture(MockGateway {
            user_totals: HashMap::from([((100, 7), 2)]),
            ..MockGateway::default()
        });
        fx.service
            .register_poll(poll(100, now + Duration::minutes(5), 2))
            .await
            .unwrap();

        let removed = fx.service.enforce_vote_cap(5, 100, 7, "1️⃣").await.unwrap();
        assert!(!removed);
        assert!(fx.gateway.removed_reactions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reactions_outside_tracked_polls_or_markers_are_ignored() {
        let now = Utc::now();
        let fx = fixture(MockGateway {
            user_totals: HashMap::from([((100, 7), 99)]),
            ..MockGateway::default()
        });
        fx.service
            .register_poll(poll(100, now + Duration::minutes(5), 1))
            .await
            .unwrap();

        // unknown message
        assert!(!fx.service.enforce_vote_cap(5, 999, 7, "1️⃣").await.unwrap());
        // tracked message, but the emoji is not a poll marker
        assert!(!fx.service.enforce_vote_cap(5, 100, 7, "😀").await.unwrap());
        assert!(fx.gateway.removed_reactions.lock().unwrap().is_empty());
    }
}
