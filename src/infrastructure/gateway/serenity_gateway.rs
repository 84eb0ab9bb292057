use async_trait::async_trait;
use serenity::builder::{CreateEmbed, CreateMessage, EditMessage};
use serenity::http::{Http, HttpError};
use serenity::model::channel::ReactionType;
use serenity::model::colour::Color;
use serenity::model::id::{ChannelId, MessageId, UserId};
use std::sync::Arc;

use crate::domain::gateway::{GatewayError, MessageEmbed, MessagingGateway};

/// `MessagingGateway` backed by the Discord REST API.
pub struct SerenityGateway {
    http: Arc<Http>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn map_api_error(err: serenity::Error) -> GatewayError {
        if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
            if response.status_code.as_u16() == 404 {
                return GatewayError::NotFound;
            }
        }
        GatewayError::Api(err.to_string())
    }

    fn build_embed(embed: MessageEmbed) -> CreateEmbed {
        let (r, g, b) = embed.colour;
        CreateEmbed::new()
            .title(embed.title)
            .description(embed.description)
            .color(Color::from_rgb(r, g, b))
            .fields(
                embed
                    .fields
                    .into_iter()
                    .map(|field| (field.name, field.value, field.inline)),
            )
    }
}

#[async_trait]
impl MessagingGateway for SerenityGateway {
    async fn send_channel_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> Result<u64, GatewayError> {
        ChannelId::new(channel_id)
            .say(&self.http, content)
            .await
            .map(|message| message.id.get())
            .map_err(Self::map_api_error)
    }

    async fn send_channel_embed(
        &self,
        channel_id: u64,
        embed: MessageEmbed,
    ) -> Result<u64, GatewayError> {
        let builder = CreateMessage::new().embed(Self::build_embed(embed));
        ChannelId::new(channel_id)
            .send_message(&self.http, builder)
            .await
            .map(|message| message.id.get())
            .map_err(Self::map_api_error)
    }

    async fn edit_channel_message(
        &self,
        channel_id: u64,
        message_id: u64,
        content: &str,
    ) -> Result<(), GatewayError> {
        ChannelId::new(channel_id)
            .edit_message(
                &self.http,
                MessageId::new(message_id),
                EditMessage::new().content(content),
            )
            .await
            .map(|_| ())
            .map_err(Self::map_api_error)
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), GatewayError> {
        ChannelId::new(channel_id)
            .delete_message(&self.http, MessageId::new(message_id))
            .await
            .map_err(Self::map_api_error)
    }

    async fn send_direct_message(&self, user_id: u64, content: &str) -> Result<(), GatewayError> {
        let dm_channel = UserId::new(user_id)
            .create_dm_channel(&self.http)
            .await
            .map_err(|err| GatewayError::Delivery(err.to_string()))?;

        dm_channel
            .send_message(&self.http, CreateMessage::new().content(content))
            .await
            .map(|_| ())
            .map_err(|err| GatewayError::Delivery(err.to_string()))
    }

    async fn fetch_reaction_counts(
        &self,
        channel_id: u64,
        message_id: u64,
        markers: &[String],
    ) -> Result<Vec<u64>, GatewayError> {
        let message = ChannelId::new(channel_id)
            .message(&self.http, MessageId::new(message_id))
            .await
            .map_err(Self::map_api_error)?;

        Ok(markers
            .iter()
            .map(|marker| {
                message
                    .reactions
                    .iter()
                    .find(|reaction| match &reaction.reaction_type {
                        ReactionType::Unicode(emoji) => emoji == marker,
                        _ => false,
                    })
                    .map(|reaction| reaction.count)
                    .unwrap_or(0)
            })
            .collect())
    }

    async fn count_user_reactions(
        &self,
        channel_id: u64,
        message_id: u64,
        markers: &[String],
        user_id: u64,
    ) -> Result<u32, GatewayError> {
        let channel = ChannelId::new(channel_id);
        let message = MessageId::new(message_id);
        let mut total = 0;

        for marker in markers {
            let users = channel
                .reaction_users(
                    &self.http,
                    message,
                    ReactionType::Unicode(marker.clone()),
                    Some(100),
                    None::<UserId>,
                )
                .await
                .map_err(Self::map_api_error)?;

            if users.iter().any(|user| user.id.get() == user_id) {
                total += 1;
            }
        }

        Ok(total)
    }

    async fn remove_user_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        user_id: u64,
        marker: &str,
    ) -> Result<(), GatewayError> {
        ChannelId::new(channel_id)
            .delete_reaction(
                &self.http,
                MessageId::new(message_id),
                Some(UserId::new(user_id)),
                ReactionType::Unicode(marker.to_string()),
            )
            .await
            .map_err(Self::map_api_error)
    }
}
