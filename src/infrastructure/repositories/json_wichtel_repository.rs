use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::domain::entities::Participant;
use crate::domain::repositories::{
    ParticipantRepository, StoreError, WichtelRound, WichtelStateRepository,
};
use crate::infrastructure::repositories::json_storage;

/// On-disk shape of the Wichteln state: the open round (if any) plus the
/// signup list. The end time is stored as an RFC 3339 string; a hand-edited
/// or truncated value surfaces as `StoreError::Corrupt` on read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WichtelFile {
    end_time: Option<String>,
    announcement_channel_id: Option<u64>,
    announcement_message_id: Option<u64>,
    participants: Vec<Participant>,
}

/// JSON-file-backed store for both the round state and the participants.
/// All mutations happen under one lock and are mirrored to disk immediately.
#[derive(Clone)]
pub struct JsonWichtelRepository {
    state: Arc<Mutex<WichtelFile>>,
    file_path: String,
}

impl JsonWichtelRepository {
    pub fn new(file_path: &str) -> Self {
        let loaded = json_storage::load_json(file_path).unwrap_or_else(|err| {
            warn!("Could not load {} ({}), starting empty", file_path, err);
            WichtelFile::default()
        });
        Self {
            state: Arc::new(Mutex::new(loaded)),
            file_path: file_path.to_string(),
        }
    }

    fn save(&self, file: &WichtelFile) -> Result<(), StoreError> {
        json_storage::save_json(file, &self.file_path)
            .map_err(|err| StoreError::Storage(err.to_string()))
    }

    fn parse_round(file: &WichtelFile) -> Result<Option<WichtelRound>, StoreError> {
        let Some(raw) = &file.end_time else {
            return Ok(None);
        };

        let end_time = DateTime::parse_from_rfc3339(raw)
            .map_err(|err| {
                StoreError::Corrupt(format!("End time {:?} is not a valid timestamp: {}", raw, err))
            })?
            .with_timezone(&Utc);

        let (Some(channel_id), Some(message_id)) =
            (file.announcement_channel_id, file.announcement_message_id)
        else {
            return Err(StoreError::Corrupt(
                "Round has an end time but no announcement ids".to_string(),
            ));
        };

        Ok(Some(WichtelRound {
            end_time,
            announcement_channel_id: channel_id,
            announcement_message_id: message_id,
        }))
    }

    fn clear_round_fields(file: &mut WichtelFile) {
        file.end_time = None;
        file.announcement_channel_id = None;
        file.announcement_message_id = None;
    }
}

#[async_trait]
impl WichtelStateRepository for JsonWichtelRepository {
    async fn open_round(&self, round: WichtelRound) -> Result<(), StoreError> {
        let mut file = self.state.lock().unwrap();
        file.end_time = Some(round.end_time.to_rfc3339_opts(SecondsFormat::Secs, true));
        file.announcement_channel_id = Some(round.announcement_channel_id);
        file.announcement_message_id = Some(round.announcement_message_id);
        self.save(&file)
    }

    async fn current_round(&self) -> Result<Option<WichtelRound>, StoreError> {
        let file = self.state.lock().unwrap();
        Self::parse_round(&file)
    }

    async fn claim_round(&self) -> Result<Option<WichtelRound>, StoreError> {
        let mut file = self.state.lock().unwrap();
        let round = Self::parse_round(&file)?;
        if round.is_some() {
            Self::clear_round_fields(&mut file);
            self.save(&file)?;
        }
        Ok(round)
    }

    async fn reset_round(&self) -> Result<(), StoreError> {
        let mut file = self.state.lock().unwrap();
        Self::clear_round_fields(&mut file);
        self.save(&file)
    }
}

#[async_trait]
impl ParticipantRepository for JsonWichtelRepository {
    async fn upsert_participant(&self, participant: Participant) -> Result<(), StoreError> {
        let mut file = self.state.lock().unwrap();
        file.participants.retain(|p| p.id != participant.id);
        file.participants.push(participant);
        self.save(&file)
    }

    async fn active_participants(&self) -> Result<Vec<Participant>, StoreError> {
        let file = self.state.lock().unwrap();
        Ok(file
            .participants
            .iter()
            .filter(|p| p.participates)
            .cloned()
            .collect())
    }

    async fn reset_participants(&self) -> Result<(), StoreError> {
        let mut file = self.state.lock().unwrap();
        file.participants.clear();
        self.save(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_repo() -> (tempfile::TempDir, JsonWichtelRepository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wichtel.json");
        let repo = JsonWichtelRepository::new(path.to_str().unwrap());
        (dir, repo)
    }

    fn participant(id: u64) -> Participant {
        Participant::new(
            id,
            format!("user-{}", id),
            "Steam".to_string(),
            format!("code-{}", id),
        )
    }

    fn round() -> WichtelRound {
        WichtelRound {
            end_time: Utc::now() + Duration::days(3),
            announcement_channel_id: 10,
            announcement_message_id: 20,
        }
    }

    #[tokio::test]
    async fn signup_keeps_one_record_per_user() {
        let (_dir, repo) = temp_repo();

        repo.upsert_participant(participant(1)).await.unwrap();
        let mut updated = participant(1);
        updated.gift_platform_name = "PSN".to_string();
        repo.upsert_participant(updated).await.unwrap();

        let active = repo.active_participants().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].gift_platform_name, "PSN");
    }

    #[tokio::test]
    async fn reset_empties_the_signup_list() {
        let (_dir, repo) = temp_repo();
        repo.upsert_participant(participant(1)).await.unwrap();
        repo.upsert_participant(participant(2)).await.unwrap();

        repo.reset_participants().await.unwrap();
        assert!(repo.active_participants().await.unwrap().is_empty());

        // resetting again is harmless
        repo.reset_participants().await.unwrap();
        assert!(repo.active_participants().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn claim_round_is_take_and_clear() {
        let (_dir, repo) = temp_repo();
        let opened = round();
        WichtelStateRepository::open_round(&repo, opened.clone())
            .await
            .unwrap();

        let claimed = repo.claim_round().await.unwrap().unwrap();
        assert_eq!(claimed.announcement_message_id, opened.announcement_message_id);

        // a second (racing) claim observes no active round
        assert!(repo.claim_round().await.unwrap().is_none());
        assert!(repo.current_round().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn state_survives_a_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wichtel.json");
        let path = path.to_str().unwrap();

        {
            let repo = JsonWichtelRepository::new(path);
            WichtelStateRepository::open_round(&repo, round()).await.unwrap();
            repo.upsert_participant(participant(1)).await.unwrap();
        }

        let reloaded = JsonWichtelRepository::new(path);
        assert!(reloaded.current_round().await.unwrap().is_some());
        assert_eq!(reloaded.active_participants().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_end_time_surfaces_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wichtel.json");
        std::fs::write(
            &path,
            r#"{
                "end_time": "irgendwann im Dezember",
                "announcement_channel_id": 10,
                "announcement_message_id": 20,
                "participants": []
            }"#,
        )
        .unwrap();

        let repo = JsonWichtelRepository::new(path.to_str().unwrap());
        assert!(matches!(
            repo.current_round().await,
            Err(StoreError::Corrupt(_))
        ));

        // the defensive reset path must still be able to clear it
        repo.reset_round().await.unwrap();
        assert!(repo.current_round().await.unwrap().is_none());
    }
}
