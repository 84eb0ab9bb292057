use serde::{Deserialize, Serialize};

/// A user signed up for the current Wichteln round.
///
/// The display name is fixed at signup time (guild nickname, falling back to
/// the account name) so the pairing DMs stay consistent even if the member
/// renames themselves before the deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: u64,
    pub display_name: String,
    pub gift_platform_name: String,
    pub gift_platform_friend_code: String,
    pub participates: bool,
}

impl Participant {
    pub fn new(
        id: u64,
        display_name: String,
        gift_platform_name: String,
        gift_platform_friend_code: String,
    ) -> Self {
        Self {
            id,
            display_name,
            gift_platform_name,
            gift_platform_friend_code,
            participates: true,
        }
    }
}
