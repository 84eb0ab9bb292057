use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::Poll;
use crate::domain::repositories::StoreError;

#[async_trait]
pub trait PollRepository: Send + Sync {
    /// Track a newly created poll.
    async fn add_poll(&self, poll: Poll) -> Result<(), StoreError>;

    /// Look up a tracked poll by the message it is rendered on.
    async fn find_by_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<Option<Poll>, StoreError>;

    /// Remove and return every poll whose end time has passed. Removal and
    /// read are one atomic step so overlapping ticks cannot claim the same
    /// poll twice.
    async fn claim_expired(&self, now: DateTime<Utc>) -> Result<Vec<Poll>, StoreError>;
}
