use crate::application::commands::{
    register_help_command, register_poll_command, register_wichteln_command, run_help_command,
    run_poll, run_wichteln,
};
use crate::application::commands::wichteln::{
    JOIN_BUTTON_ID, SIGNUP_MODAL_ID, handle_join_button, process_signup_modal,
};
use crate::application::scheduler::{PollScheduler, WichtelScheduler};
use crate::application::services::{NotificationService, PollService, WichtelService};
use crate::domain::gateway::MessagingGateway;
use crate::domain::repositories::{ParticipantRepository, WichtelStateRepository};
use crate::infrastructure::gateway::SerenityGateway;
use crate::infrastructure::repositories::{JsonPollRepository, JsonWichtelRepository};

use anyhow::Context as _;
use serenity::http::Http;
use serenity::model::channel::{Reaction, ReactionType};
use serenity::model::{application::Interaction, gateway::Ready, id::GuildId};
use serenity::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

const WICHTEL_DATA_FILE: &str = "wichtel.json";
const POLL_DATA_FILE: &str = "polls.json";

pub struct BotHandler {
    wichtel_service: Arc<WichtelService>,
    poll_service: Arc<PollService>,
    // set once in `ready`; needed to ignore the bot's own seed reactions
    bot_user_id: AtomicU64,
}

impl BotHandler {
    pub fn new(wichtel_service: Arc<WichtelService>, poll_service: Arc<PollService>) -> Self {
        Self {
            wichtel_service,
            poll_service,
            bot_user_id: AtomicU64::new(0),
        }
    }
}

#[serenity::async_trait]
impl EventHandler for BotHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Bot ready as {}", ready.user.name);
        self.bot_user_id.store(ready.user.id.get(), Ordering::Relaxed);

        // register commands in each guild
        for guild_status in ready.guilds {
            let guild_id: GuildId = guild_status.id;

            let _ = guild_id
                .create_command(&ctx.http, register_wichteln_command())
                .await;
            let _ = guild_id
                .create_command(&ctx.http, register_poll_command())
                .await;
            let _ = guild_id
                .create_command(&ctx.http, register_help_command())
                .await;

            info!("Commands registered for guild {}", guild_id.get());
        }

        // the poll loop runs for the whole process lifetime
        PollScheduler::start(self.poll_service.clone());

        // pick a persisted signup window back up after a restart
        if self.wichtel_service.has_active_round().await {
            info!("Resuming the Wichtel expiry check for a persisted round");
            WichtelScheduler::start(self.wichtel_service.clone());
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        // handle slash commands
        if let Some(command) = interaction.clone().command() {
            debug!("Received command interaction: {}", command.data.name);
            match command.data.name.as_str() {
                "wichteln" => run_wichteln(&ctx, &command, &self.wichtel_service).await,
                "umfrage" => run_poll(&ctx, &command, &self.poll_service).await,
                "help" => run_help_command(&ctx, &command).await,
                other => debug!("Command not recognized: {}", other),
            }
        }

        // the signup button on the announcement
        if let Some(component) = interaction.clone().message_component() {
            if component.data.custom_id == JOIN_BUTTON_ID {
                handle_join_button(&ctx, &component).await;
            }
        }

        // the submitted signup modal
        if let Some(modal) = interaction.clone().modal_submit() {
            if modal.data.custom_id == SIGNUP_MODAL_ID {
                if let Err(err) = process_signup_modal(&ctx, &modal, &self.wichtel_service).await {
                    error!("Failed to process the signup modal: {}", err);
                }
            }
        }
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        let Some(user_id) = reaction.user_id else {
            return;
        };
        if user_id.get() == self.bot_user_id.load(Ordering::Relaxed) {
            return;
        }
        let ReactionType::Unicode(marker) = &reaction.emoji else {
            return;
        };

        if let Err(err) = self
            .poll_service
            .enforce_vote_cap(
                reaction.channel_id.get(),
                reaction.message_id.get(),
                user_id.get(),
                marker,
            )
            .await
        {
            error!("Vote cap enforcement failed: {}", err);
        }
    }
}

pub async fn run_bot() -> anyhow::Result<()> {
    let token = std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let gateway: Arc<dyn MessagingGateway> =
        Arc::new(SerenityGateway::new(Arc::new(Http::new(&token))));

    let wichtel_repo = Arc::new(JsonWichtelRepository::new(WICHTEL_DATA_FILE));
    let participants: Arc<dyn ParticipantRepository> = wichtel_repo.clone();
    let state: Arc<dyn WichtelStateRepository> = wichtel_repo;
    let poll_repo = Arc::new(JsonPollRepository::new(POLL_DATA_FILE));

    let notifier = Arc::new(NotificationService::new(gateway.clone()));
    let wichtel_service = Arc::new(WichtelService::new(
        participants,
        state,
        notifier.clone(),
        gateway.clone(),
    ));
    let poll_service = Arc::new(PollService::new(poll_repo, gateway, notifier));

    let handler = BotHandler::new(wichtel_service, poll_service);

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await?;

    client.start().await?;
    Ok(())
}
