use async_trait::async_trait;

use crate::domain::entities::Participant;
use crate::domain::repositories::StoreError;

#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Add a participant, or update the record if the user already signed up.
    /// At most one record per user id exists at any time.
    async fn upsert_participant(&self, participant: Participant) -> Result<(), StoreError>;

    /// All participants currently flagged as taking part in the round.
    async fn active_participants(&self) -> Result<Vec<Participant>, StoreError>;

    /// Clear every signup. After this, `active_participants` is empty.
    async fn reset_participants(&self) -> Result<(), StoreError>;
}
