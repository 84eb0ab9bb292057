use std::sync::Arc;
use tracing::warn;

use crate::domain::entities::{MatchPair, Poll, TalliedOption};
use crate::domain::gateway::{EmbedField, GatewayError, MessageEmbed, MessagingGateway};

/// Composes and delivers the bot's outbound messages: pairing DMs, round
/// status lines and poll result embeds. All user-facing text is German.
pub struct NotificationService {
    gateway: Arc<dyn MessagingGateway>,
}

impl NotificationService {
    pub fn new(gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { gateway }
    }

    /// DMs every giver the name and gift-platform identity of their assigned
    /// receiver. A failed DM (closed DMs, blocked bot) is logged and skipped;
    /// it never aborts the remaining notifications. Returns
    /// `(delivered, failed)` counts.
    pub async fn notify_pairs(&self, pairs: &[MatchPair]) -> (usize, usize) {
        let mut delivered = 0;
        let mut failed = 0;

        for pair in pairs {
            let content = Self::pairing_message(pair);
            match self.gateway.send_direct_message(pair.giver.id, &content).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(
                        "Could not DM the pairing to user {}: {}",
                        pair.giver.id, err
                    );
                    failed += 1;
                }
            }
        }

        (delivered, failed)
    }

    /// Post a plain status line to a channel.
    pub async fn send_status(&self, channel_id: u64, content: &str) -> Result<(), GatewayError> {
        self.gateway.send_channel_message(channel_id, content).await.map(|_| ())
    }

    /// Post the results embed of a closed poll to its origin channel.
    pub async fn send_poll_results(
        &self,
        poll: &Poll,
        tallied: &[TalliedOption],
    ) -> Result<(), GatewayError> {
        let fields = tallied
            .iter()
            .map(|option| EmbedField {
                name: format!("{} {}", option.marker, option.label),
                value: match option.votes {
                    1 => "1 Stimme".to_string(),
                    votes => format!("{} Stimmen", votes),
                },
                inline: false,
            })
            .collect();

        let embed = MessageEmbed {
            title: format!("📊 Ergebnis: {}", poll.question),
            description: "Die Umfrage ist beendet. So habt ihr abgestimmt:".to_string(),
            fields,
            colour: (66, 135, 245),
        };

        self.gateway.send_channel_embed(poll.channel_id, embed).await.map(|_| ())
    }

    fn pairing_message(pair: &MatchPair) -> String {
        format!(
            "🎁 Ho ho ho! Du bist der Wichtel für **{}**!\n\
             Plattform: **{}**\n\
             Freundescode: `{}`\n\
             Viel Spaß beim Schenken!",
            pair.receiver.display_name,
            pair.receiver.gift_platform_name,
            pair.receiver.gift_platform_friend_code,
        )
    }
}
