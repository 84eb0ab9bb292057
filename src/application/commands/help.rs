use serenity::all::{
    CommandInteraction, CreateCommand, CreateInteractionResponse, CreateInteractionResponseMessage,
};
use serenity::prelude::*;
use tracing::error;

pub fn register_help_command() -> CreateCommand {
    CreateCommand::new("help").description("Zeigt alle Befehle an")
}

pub async fn run_help_command(ctx: &Context, command: &CommandInteraction) {
    let content = "\
**Verfügbare Befehle:**\n\
`/wichteln start` - Startet eine neue Wichtelrunde (Moderation)\n\
`/wichteln status` - Zeigt Anmeldeschluss und Teilnehmerzahl\n\
`/wichteln beenden` - Beendet die laufende Runde sofort (Moderation)\n\
`/umfrage` - Erstellt eine Umfrage mit Reaktions-Abstimmung\n\
`/help` - Zeigt diese Hilfe";

    let builder = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::default()
            .content(content)
            .ephemeral(true),
    );

    if let Err(err) = command.create_response(&ctx.http, builder).await {
        error!("Error executing /help: {:?}", err);
    }
}
