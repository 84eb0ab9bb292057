use chrono::{Duration, Utc};
use chrono_tz::Europe::Berlin;
use lazy_static::lazy_static;
use serenity::all::{
    CommandInteraction, CommandOptionType, CreateCommand, CreateCommandOption, CreateEmbed,
    CreateInteractionResponse, CreateInteractionResponseMessage, ReactionType,
};
use serenity::model::colour::Color;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::error;

use crate::application::commands::utils::{get_integer_option, get_string_option};
use crate::application::services::PollService;
use crate::domain::entities::{Poll, PollOption};

lazy_static! {
    /// Reaction emoji handed out to poll options in order.
    static ref OPTION_MARKERS: Vec<String> = vec![
        "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟",
    ]
    .into_iter()
    .map(String::from)
    .collect();
}

pub fn register_poll_command() -> CreateCommand {
    CreateCommand::new("umfrage")
        .description("Erstellt eine Umfrage mit Reaktions-Abstimmung")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "frage", "Die Frage der Umfrage")
                .required(true),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "antworten",
                "Antwortmöglichkeiten, getrennt durch Semikolons (2 bis 10)",
            )
            .required(true),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                "minuten",
                "Laufzeit der Umfrage in Minuten",
            )
            .min_int_value(1)
            .max_int_value(7 * 24 * 60)
            .required(true),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                "max_stimmen",
                "Wie viele Stimmen jede Person hat (Standard: 1)",
            )
            .min_int_value(1)
            .max_int_value(10)
            .required(false),
        )
}

pub async fn run_poll(ctx: &Context, command: &CommandInteraction, poll_service: &Arc<PollService>) {
    let options = &command.data.options;
    let question = get_string_option(options, 0).unwrap_or_default();
    let answers_raw = get_string_option(options, 1).unwrap_or_default();
    let minutes = get_integer_option(options, 2).unwrap_or(60);
    let max_votes = get_integer_option(options, 3).unwrap_or(1).max(1) as u32;

    let labels: Vec<String> = answers_raw
        .split(';')
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .collect();

    if labels.len() < 2 || labels.len() > OPTION_MARKERS.len() {
        respond_ephemeral(
            ctx,
            command,
            "Gib zwischen 2 und 10 Antworten an, getrennt durch Semikolons.",
        )
        .await;
        return;
    }

    let end_time = Utc::now() + Duration::minutes(minutes);
    let poll_options: Vec<PollOption> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| PollOption {
            marker: OPTION_MARKERS[i].clone(),
            label: label.clone(),
        })
        .collect();

    let option_lines: Vec<String> = poll_options
        .iter()
        .map(|option| format!("{} {}", option.marker, option.label))
        .collect();
    let embed = CreateEmbed::new()
        .title(format!("📊 {}", question))
        .description(option_lines.join("\n"))
        .color(Color::from_rgb(66, 135, 245))
        .field(
            "Läuft bis",
            format!(
                "{} Uhr (max. {} Stimme(n) pro Person)",
                end_time.with_timezone(&Berlin).format("%d.%m.%Y, %H:%M"),
                max_votes,
            ),
            false,
        );

    let builder = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new().embed(embed),
    );
    if let Err(err) = command.create_response(&ctx.http, builder).await {
        error!("Could not post the poll: {}", err);
        return;
    }

    // the response message carries the reactions and identifies the poll
    let message = match command.get_response(&ctx.http).await {
        Ok(message) => message,
        Err(err) => {
            error!("Could not fetch the posted poll message: {}", err);
            return;
        }
    };

    // seed one bot reaction per option; the tally subtracts it again
    for option in &poll_options {
        if let Err(err) = message
            .react(&ctx.http, ReactionType::Unicode(option.marker.clone()))
            .await
        {
            error!("Could not seed the reaction {}: {}", option.marker, err);
        }
    }

    let poll = Poll {
        channel_id: command.channel_id.get(),
        message_id: message.id.get(),
        question,
        options: poll_options,
        end_time,
        max_votes_per_user: max_votes,
    };

    if let Err(err) = poll_service.register_poll(poll).await {
        error!("Could not track the poll: {}", err);
    }
}

async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, content: &str) {
    let builder = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if let Err(err) = command.create_response(&ctx.http, builder).await {
        error!("Error responding to /umfrage: {:?}", err);
    }
}
