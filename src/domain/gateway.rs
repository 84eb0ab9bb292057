use async_trait::async_trait;

/// Delivery error from the messaging gateway. Everything here is recoverable;
/// callers log and carry on with the remaining recipients or polls.
#[derive(Debug)]
pub enum GatewayError {
    /// The message or channel no longer exists.
    NotFound,
    /// A direct message could not be delivered (e.g. the user closed DMs).
    Delivery(String),
    /// Any other API failure (permissions, network).
    Api(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            GatewayError::NotFound => write!(f, "Message or channel not found"),
            GatewayError::Delivery(msg) => write!(f, "Delivery failed: {}", msg),
            GatewayError::Api(msg) => write!(f, "API error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

/// A field of an outbound embed.
#[derive(Debug, Clone)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Platform-independent embed description, rendered by the gateway
/// implementation.
#[derive(Debug, Clone)]
pub struct MessageEmbed {
    pub title: String,
    pub description: String,
    pub fields: Vec<EmbedField>,
    pub colour: (u8, u8, u8),
}

/// Outbound messaging seam. Services and schedulers receive this as an
/// `Arc<dyn MessagingGateway>` at construction instead of reaching for the
/// Discord client through ambient state.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a plain text message, returning the new message's id.
    async fn send_channel_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> Result<u64, GatewayError>;

    /// Send an embed message, returning the new message's id.
    async fn send_channel_embed(
        &self,
        channel_id: u64,
        embed: MessageEmbed,
    ) -> Result<u64, GatewayError>;

    /// Replace the text content of an existing message.
    async fn edit_channel_message(
        &self,
        channel_id: u64,
        message_id: u64,
        content: &str,
    ) -> Result<(), GatewayError>;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), GatewayError>;

    async fn send_direct_message(&self, user_id: u64, content: &str) -> Result<(), GatewayError>;

    /// Live reaction count per marker on a message, in marker order. Markers
    /// nobody reacted with report zero.
    async fn fetch_reaction_counts(
        &self,
        channel_id: u64,
        message_id: u64,
        markers: &[String],
    ) -> Result<Vec<u64>, GatewayError>;

    /// How many of the given markers the user has currently reacted with.
    async fn count_user_reactions(
        &self,
        channel_id: u64,
        message_id: u64,
        markers: &[String],
        user_id: u64,
    ) -> Result<u32, GatewayError>;

    async fn remove_user_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        user_id: u64,
        marker: &str,
    ) -> Result<(), GatewayError>;
}
