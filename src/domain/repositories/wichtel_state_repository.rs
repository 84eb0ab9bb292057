use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::repositories::StoreError;

/// Persisted state of an open Wichteln round: when the signup window closes
/// and where the signup announcement lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WichtelRound {
    pub end_time: DateTime<Utc>,
    pub announcement_channel_id: u64,
    pub announcement_message_id: u64,
}

#[async_trait]
pub trait WichtelStateRepository: Send + Sync {
    /// Persist a freshly opened round. Overwrites any previous round state.
    async fn open_round(&self, round: WichtelRound) -> Result<(), StoreError>;

    /// The currently open round, if any. A stored-but-unparseable end time
    /// surfaces as `StoreError::Corrupt`.
    async fn current_round(&self) -> Result<Option<WichtelRound>, StoreError>;

    /// Atomically take the round out of the store and return it. A second
    /// caller racing this one observes `None` and must not process the round.
    async fn claim_round(&self) -> Result<Option<WichtelRound>, StoreError>;

    /// Drop any round state unconditionally, including malformed state that
    /// `current_round` refuses to parse.
    async fn reset_round(&self) -> Result<(), StoreError>;
}
