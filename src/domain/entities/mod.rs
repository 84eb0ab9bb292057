pub mod match_pair;
pub mod participant;
pub mod poll;

pub use match_pair::MatchPair;
pub use participant::Participant;
pub use poll::{Poll, PollOption, TalliedOption};
