use crate::domain::entities::participant::Participant;

/// One giver/receiver assignment produced by a matching draw.
///
/// Pairs only exist between the draw and the notification DMs, they are never
/// persisted.
#[derive(Debug, Clone)]
pub struct MatchPair {
    pub giver: Participant,
    pub receiver: Participant,
}

impl MatchPair {
    pub fn new(giver: Participant, receiver: Participant) -> Self {
        Self { giver, receiver }
    }
}
