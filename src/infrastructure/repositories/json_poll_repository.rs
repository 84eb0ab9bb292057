use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::domain::entities::Poll;
use crate::domain::repositories::{PollRepository, StoreError};
use crate::infrastructure::repositories::json_storage;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PollFile {
    polls: Vec<Poll>,
}

/// JSON-file-backed store for the open polls. Expired polls leave the store
/// at claim time, inside the lock, so overlapping scheduler ticks can never
/// hand out the same poll twice.
#[derive(Clone)]
pub struct JsonPollRepository {
    state: Arc<Mutex<PollFile>>,
    file_path: String,
}

impl JsonPollRepository {
    pub fn new(file_path: &str) -> Self {
        let loaded = json_storage::load_json(file_path).unwrap_or_else(|err| {
            warn!("Could not load {} ({}), starting empty", file_path, err);
            PollFile::default()
        });
        Self {
            state: Arc::new(Mutex::new(loaded)),
            file_path: file_path.to_string(),
        }
    }

    fn save(&self, file: &PollFile) -> Result<(), StoreError> {
        json_storage::save_json(file, &self.file_path)
            .map_err(|err| StoreError::Storage(err.to_string()))
    }
}

#[async_trait]
impl PollRepository for JsonPollRepository {
    async fn add_poll(&self, poll: Poll) -> Result<(), StoreError> {
        let mut file = self.state.lock().unwrap();
        file.polls.push(poll);
        self.save(&file)
    }

    async fn find_by_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<Option<Poll>, StoreError> {
        let file = self.state.lock().unwrap();
        Ok(file
            .polls
            .iter()
            .find(|poll| poll.channel_id == channel_id && poll.message_id == message_id)
            .cloned())
    }

    async fn claim_expired(&self, now: DateTime<Utc>) -> Result<Vec<Poll>, StoreError> {
        let mut file = self.state.lock().unwrap();

        let (expired, remaining): (Vec<Poll>, Vec<Poll>) = file
            .polls
            .drain(..)
            .partition(|poll| poll.is_expired(now));
        file.polls = remaining;

        if !expired.is_empty() {
            self.save(&file)?;
        }
        Ok(expired)
    }
}
