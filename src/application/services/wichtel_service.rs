use chrono::{DateTime, Utc};
use chrono_tz::Europe::Berlin;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::services::matching_service::{MatchingError, MatchingService};
use crate::application::services::notification_service::NotificationService;
use crate::domain::entities::Participant;
use crate::domain::gateway::{GatewayError, MessagingGateway};
use crate::domain::repositories::{
    ParticipantRepository, StoreError, WichtelRound, WichtelStateRepository,
};

#[derive(Debug)]
pub enum WichtelError {
    /// A new round cannot be opened while one is running.
    RoundAlreadyActive,
    /// A signup or force-end arrived while no round is open.
    NoActiveRound,
    Store(StoreError),
}

impl std::fmt::Display for WichtelError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            WichtelError::RoundAlreadyActive => write!(f, "A Wichteln round is already running"),
            WichtelError::NoActiveRound => write!(f, "No Wichteln round is currently running"),
            WichtelError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for WichtelError {}

impl From<StoreError> for WichtelError {
    fn from(err: StoreError) -> Self {
        WichtelError::Store(err)
    }
}

/// What a single expiry-check tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The deadline is still in the future; keep polling.
    Pending,
    /// The deadline passed and the round was finished on this tick.
    Finished,
    /// There is nothing left to poll for (no round, or defensive reset).
    Stopped,
}

/// How a finished round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Somebody else already claimed and finished the round.
    NoActiveRound,
    /// Fewer than two signups (or an exhausted draw); no pairs were sent.
    NotEnoughParticipants(usize),
    Matched { delivered: usize, failed: usize },
}

/// Lifecycle controller for the Wichteln gift exchange.
///
/// Owns the `Idle → SignupOpen → MatchingDue → Idle` cycle: opening the
/// signup window, recording signups, finishing the round at the deadline and
/// resetting all state afterwards. Finishing is claim-first: the persisted
/// round is removed from the store before any work happens, so an expiry
/// tick racing a manual force-end runs the end-of-round logic exactly once.
pub struct WichtelService {
    participants: Arc<dyn ParticipantRepository>,
    state: Arc<dyn WichtelStateRepository>,
    notifier: Arc<NotificationService>,
    gateway: Arc<dyn MessagingGateway>,
}

impl WichtelService {
    pub fn new(
        participants: Arc<dyn ParticipantRepository>,
        state: Arc<dyn WichtelStateRepository>,
        notifier: Arc<NotificationService>,
        gateway: Arc<dyn MessagingGateway>,
    ) -> Self {
        Self {
            participants,
            state,
            notifier,
            gateway,
        }
    }

    /// The signup announcement text, re-rendered on every signup to keep the
    /// participant count current. The deadline is shown in German local time.
    pub fn announcement_text(end_time: DateTime<Utc>, participant_count: usize) -> String {
        format!(
            "🎁 **Wichteln!**\n\
             Eine neue Wichtelrunde hat begonnen. Klickt auf den Button, um mitzumachen!\n\
             Anmeldeschluss: **{}** Uhr\n\
             Bisher angemeldet: **{}**",
            end_time.with_timezone(&Berlin).format("%d.%m.%Y, %H:%M"),
            participant_count,
        )
    }

    /// Opens the signup window. The announcement message must already be
    /// posted; its ids are persisted so the round can clean it up later.
    pub async fn open_round(&self, round: WichtelRound) -> Result<(), WichtelError> {
        if self.state.current_round().await?.is_some() {
            return Err(WichtelError::RoundAlreadyActive);
        }

        // a previous round's leftovers must not leak into the new window
        self.participants.reset_participants().await?;
        self.state.open_round(round.clone()).await?;

        info!(
            "Wichteln signup window opened, deadline {}",
            round.end_time
        );
        Ok(())
    }

    /// Records (or updates) a signup and returns the current participant
    /// count. Rejected while no round is open.
    pub async fn signup(&self, participant: Participant) -> Result<usize, WichtelError> {
        let round = self
            .state
            .current_round()
            .await?
            .ok_or(WichtelError::NoActiveRound)?;

        self.participants.upsert_participant(participant).await?;
        let count = self.participants.active_participants().await?.len();

        // keep the announcement's participant counter fresh; cosmetic, so a
        // failed edit only warns
        if let Err(err) = self
            .gateway
            .edit_channel_message(
                round.announcement_channel_id,
                round.announcement_message_id,
                &Self::announcement_text(round.end_time, count),
            )
            .await
        {
            warn!("Could not update the signup announcement: {}", err);
        }

        Ok(count)
    }

    /// Whether the expiry loop should be running. Unreadable state counts as
    /// active so the next tick can perform the defensive reset.
    pub async fn has_active_round(&self) -> bool {
        !matches!(self.state.current_round().await, Ok(None))
    }

    /// Deadline and signup count of the open round, if any.
    pub async fn round_status(&self) -> Result<Option<(DateTime<Utc>, usize)>, WichtelError> {
        let Some(round) = self.state.current_round().await? else {
            return Ok(None);
        };
        let count = self.participants.active_participants().await?.len();
        Ok(Some((round.end_time, count)))
    }

    /// One expiry check. Invoked every second while a round is open.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickOutcome {
        let round = match self.state.current_round().await {
            Ok(round) => round,
            Err(err) => {
                warn!(
                    "Wichtel round state is unreadable ({}), resetting defensively",
                    err
                );
                self.defensive_reset().await;
                return TickOutcome::Stopped;
            }
        };

        match round {
            None => TickOutcome::Stopped,
            Some(round) if round.end_time > now => TickOutcome::Pending,
            Some(_) => {
                match self.finish_round().await {
                    Ok(outcome) => debug!("Wichtel round finished: {:?}", outcome),
                    Err(err) => {
                        warn!("Finishing the Wichtel round failed ({}), resetting", err);
                        self.defensive_reset().await;
                    }
                }
                TickOutcome::Finished
            }
        }
    }

    /// Ends the round now: claims the persisted state, draws the pairs, DMs
    /// every giver, deletes the announcement and clears the signups. Also the
    /// entry point for the manual force-end command.
    pub async fn finish_round(&self) -> Result<RoundOutcome, WichtelError> {
        // claim-first: once the round is taken out of the store, any racing
        // second trigger sees no active round and no-ops
        let Some(round) = self.state.claim_round().await? else {
            return Ok(RoundOutcome::NoActiveRound);
        };

        let participants = self.participants.active_participants().await?;

        // Bind the draw in its own statement so the non-`Send` `ThreadRng`
        // temporary is dropped before the awaits below (keeps the future `Send`).
        let draw_result = MatchingService::draw_pairs(&participants, &mut rand::thread_rng());
        let pairs = match draw_result {
            Ok(pairs) => pairs,
            Err(MatchingError::NotEnoughParticipants(count)) => {
                info!("Wichteln ended with not enough participants ({})", count);
                self.close_without_pairs(&round).await?;
                return Ok(RoundOutcome::NotEnoughParticipants(count));
            }
            Err(err @ MatchingError::DrawAttemptsExhausted) => {
                warn!("Wichtel draw failed: {}", err);
                self.close_without_pairs(&round).await?;
                return Ok(RoundOutcome::NotEnoughParticipants(participants.len()));
            }
        };

        let (delivered, failed) = self.notifier.notify_pairs(&pairs).await;
        info!(
            "Wichtel pairs drawn: {} notified, {} DMs failed",
            delivered, failed
        );

        self.delete_announcement(&round).await;

        if let Err(err) = self
            .notifier
            .send_status(
                round.announcement_channel_id,
                "Die Wichtel wurden ausgelost! Schaut in eure Direktnachrichten. 🎁",
            )
            .await
        {
            warn!("Could not post the round-end status: {}", err);
        }

        self.participants.reset_participants().await?;

        Ok(RoundOutcome::Matched { delivered, failed })
    }

    async fn close_without_pairs(&self, round: &WichtelRound) -> Result<(), WichtelError> {
        if let Err(err) = self
            .notifier
            .send_status(
                round.announcement_channel_id,
                "Das Wichteln wurde beendet, aber es gab nicht genug Teilnehmer. 😢",
            )
            .await
        {
            warn!("Could not post the too-few-participants status: {}", err);
        }

        self.delete_announcement(round).await;
        self.participants.reset_participants().await?;
        Ok(())
    }

    async fn delete_announcement(&self, round: &WichtelRound) {
        match self
            .gateway
            .delete_message(round.announcement_channel_id, round.announcement_message_id)
            .await
        {
            Ok(()) => {}
            Err(GatewayError::NotFound) => {
                debug!("Signup announcement was already deleted");
            }
            Err(err) => {
                warn!("Could not delete the signup announcement: {}", err);
            }
        }
    }

    /// Invalid-state path: drop everything and return to idle instead of
    /// crashing or matching on garbage.
    async fn defensive_reset(&self) {
        if let Err(err) = self.state.reset_round().await {
            warn!("Resetting the round state failed: {}", err);
        }
        if let Err(err) = self.participants.reset_participants().await {
            warn!("Resetting the participants failed: {}", err);
        }
    }
}
