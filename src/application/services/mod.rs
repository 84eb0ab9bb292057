pub mod matching_service;
pub mod notification_service;
pub mod poll_service;
pub mod wichtel_service;

pub use matching_service::MatchingService;
pub use notification_service::NotificationService;
pub use poll_service::PollService;
pub use wichtel_service::WichtelService;
