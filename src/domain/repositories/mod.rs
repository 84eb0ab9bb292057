pub mod participant_repository;
pub mod poll_repository;
pub mod wichtel_state_repository;

pub use participant_repository::ParticipantRepository;
pub use poll_repository::PollRepository;
pub use wichtel_state_repository::{WichtelRound, WichtelStateRepository};

/// Error raised by the persistence layer.
#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    Storage(String),
    /// The stored state could not be interpreted (e.g. a malformed end time).
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StoreError::Storage(msg) => write!(f, "Storage error: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "Corrupt state: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}
