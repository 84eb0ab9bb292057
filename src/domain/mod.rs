pub mod entities;
pub mod gateway;
pub mod repositories;

pub use entities::{MatchPair, Participant, Poll, PollOption, TalliedOption};
pub use gateway::{GatewayError, MessagingGateway};
pub use repositories::StoreError;
