use chrono::{Duration, Utc};
use chrono_tz::Europe::Berlin;
use serenity::all::{
    ActionRowComponent, ButtonStyle, CommandDataOptionValue, CommandInteraction,
    CommandOptionType, ComponentInteraction, CreateButton, CreateCommand, CreateCommandOption,
    CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage, InputTextStyle,
    ModalInteraction, Permissions,
};
use serenity::builder::{CreateActionRow, CreateInputText, CreateModal};
use serenity::prelude::*;
use std::sync::Arc;
use tracing::error;

use crate::application::commands::utils::get_integer_option;
use crate::application::scheduler::WichtelScheduler;
use crate::application::services::WichtelService;
use crate::application::services::wichtel_service::{RoundOutcome, WichtelError};
use crate::domain::entities::Participant;
use crate::domain::repositories::WichtelRound;

pub const JOIN_BUTTON_ID: &str = "wichtel_join";
pub const SIGNUP_MODAL_ID: &str = "wichtel_signup_modal";

pub fn register_wichteln_command() -> CreateCommand {
    CreateCommand::new("wichteln")
        .description("Wichtelrunden verwalten")
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "start",
                "Startet eine neue Wichtelrunde in diesem Kanal",
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "tage",
                    "Anmeldefrist in Tagen",
                )
                .min_int_value(1)
                .max_int_value(60)
                .required(true),
            ),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "status",
            "Zeigt Anmeldeschluss und Teilnehmerzahl",
        ))
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "beenden",
            "Beendet die laufende Runde sofort und lost aus",
        ))
}

pub async fn run_wichteln(
    ctx: &Context,
    command: &CommandInteraction,
    wichtel_service: &Arc<WichtelService>,
) {
    let Some(sub) = command.data.options.first() else {
        return;
    };

    match sub.name.as_str() {
        "start" => {
            let days = match &sub.value {
                CommandDataOptionValue::SubCommand(options) => {
                    get_integer_option(options, 0).unwrap_or(3)
                }
                _ => 3,
            };
            run_start(ctx, command, wichtel_service, days).await;
        }
        "status" => run_status(ctx, command, wichtel_service).await,
        "beenden" => run_force_end(ctx, command, wichtel_service).await,
        other => error!("Unknown wichteln subcommand: {}", other),
    }
}

async fn run_start(
    ctx: &Context,
    command: &CommandInteraction,
    wichtel_service: &Arc<WichtelService>,
    days: i64,
) {
    let end_time = Utc::now() + Duration::days(days);

    // post the announcement first so its ids can be persisted with the round
    let join_button = CreateButton::new(JOIN_BUTTON_ID)
        .label("Mitmachen")
        .style(ButtonStyle::Success);
    let announcement = CreateMessage::new()
        .content(WichtelService::announcement_text(end_time, 0))
        .components(vec![CreateActionRow::Buttons(vec![join_button])]);

    let message = match command.channel_id.send_message(&ctx.http, announcement).await {
        Ok(message) => message,
        Err(err) => {
            error!("Could not post the signup announcement: {}", err);
            respond_ephemeral(ctx, command, "Die Ankündigung konnte nicht gepostet werden.").await;
            return;
        }
    };

    let round = WichtelRound {
        end_time,
        announcement_channel_id: command.channel_id.get(),
        announcement_message_id: message.id.get(),
    };

    match wichtel_service.open_round(round).await {
        Ok(()) => {
            WichtelScheduler::start(wichtel_service.clone());
            respond_ephemeral(
                ctx,
                command,
                &format!("Wichtelrunde gestartet! Anmeldeschluss in {} Tagen.", days),
            )
            .await;
        }
        Err(err) => {
            // the round was not opened, take the orphaned announcement down
            let _ = message.delete(&ctx.http).await;
            let reply = match err {
                WichtelError::RoundAlreadyActive => "Es läuft bereits eine Wichtelrunde.".to_string(),
                other => {
                    error!("Could not open the Wichtel round: {}", other);
                    "Die Wichtelrunde konnte nicht gestartet werden.".to_string()
                }
            };
            respond_ephemeral(ctx, command, &reply).await;
        }
    }
}

async fn run_status(
    ctx: &Context,
    command: &CommandInteraction,
    wichtel_service: &Arc<WichtelService>,
) {
    let reply = match wichtel_service.round_status().await {
        Ok(Some((end_time, count))) => format!(
            "Anmeldeschluss: **{}** Uhr\nAngemeldet: **{}**",
            end_time.with_timezone(&Berlin).format("%d.%m.%Y, %H:%M"),
            count,
        ),
        Ok(None) => "Zurzeit läuft keine Wichtelrunde.".to_string(),
        Err(err) => {
            error!("Could not read the Wichtel round status: {}", err);
            "Der Status konnte nicht gelesen werden.".to_string()
        }
    };
    respond_ephemeral(ctx, command, &reply).await;
}

async fn run_force_end(
    ctx: &Context,
    command: &CommandInteraction,
    wichtel_service: &Arc<WichtelService>,
) {
    let reply = match wichtel_service.finish_round().await {
        Ok(RoundOutcome::NoActiveRound) => "Zurzeit läuft keine Wichtelrunde.".to_string(),
        Ok(RoundOutcome::NotEnoughParticipants(count)) => format!(
            "Runde beendet, aber mit {} Anmeldung(en) gab es nicht genug Teilnehmer.",
            count
        ),
        Ok(RoundOutcome::Matched { delivered, failed }) => format!(
            "Runde beendet: {} Wichtel benachrichtigt, {} Nachrichten fehlgeschlagen.",
            delivered, failed
        ),
        Err(err) => {
            error!("Force-ending the Wichtel round failed: {}", err);
            "Die Runde konnte nicht beendet werden.".to_string()
        }
    };
    respond_ephemeral(ctx, command, &reply).await;
}

/// Opens the signup modal when the announcement button is clicked.
pub async fn handle_join_button(ctx: &Context, component: &ComponentInteraction) {
    let platform_input = CreateInputText::new(
        InputTextStyle::Short,
        "Plattform (z. B. Steam, PSN, Switch)",
        "gift_platform",
    )
    .required(true);
    let friend_code_input = CreateInputText::new(
        InputTextStyle::Short,
        "Freundescode / Nutzername dort",
        "friend_code",
    )
    .required(true);

    let modal = CreateModal::new(SIGNUP_MODAL_ID, "Wichtel-Anmeldung").components(vec![
        CreateActionRow::InputText(platform_input),
        CreateActionRow::InputText(friend_code_input),
    ]);

    if let Err(err) = component
        .create_response(&ctx.http, CreateInteractionResponse::Modal(modal))
        .await
    {
        error!("Could not open the signup modal: {}", err);
    }
}

/// Records the signup once the modal is submitted.
pub async fn process_signup_modal(
    ctx: &Context,
    modal: &ModalInteraction,
    wichtel_service: &Arc<WichtelService>,
) -> Result<(), String> {
    let platform = modal_input(modal, 0).ok_or("No platform input found")?;
    let friend_code = modal_input(modal, 1).ok_or("No friend code input found")?;

    let display_name = modal
        .member
        .as_ref()
        .and_then(|member| member.nick.clone())
        .unwrap_or_else(|| modal.user.name.clone());

    let participant = Participant::new(modal.user.id.get(), display_name, platform, friend_code);

    let reply = match wichtel_service.signup(participant).await {
        Ok(count) => format!("Du bist dabei! 🎁 Aktuell angemeldet: {}", count),
        Err(WichtelError::NoActiveRound) => "Zurzeit läuft keine Wichtelrunde.".to_string(),
        Err(err) => {
            error!("Signup failed: {}", err);
            "Deine Anmeldung konnte nicht gespeichert werden.".to_string()
        }
    };

    let builder = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(reply)
            .ephemeral(true),
    );
    modal
        .create_response(&ctx.http, builder)
        .await
        .map_err(|err| format!("Could not respond to the signup modal: {}", err))
}

fn modal_input(modal: &ModalInteraction, row: usize) -> Option<String> {
    modal
        .data
        .components
        .get(row)
        .and_then(|row| row.components.first())
        .and_then(|component| match component {
            ActionRowComponent::InputText(input) => input.value.clone(),
            _ => None,
        })
        .filter(|value| !value.trim().is_empty())
}

async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, content: &str) {
    let builder = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if let Err(err) = command.create_response(&ctx.http, builder).await {
        error!("Error responding to /wichteln: {:?}", err);
    }
}
