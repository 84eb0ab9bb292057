pub mod json_poll_repository;
pub mod json_storage;
pub mod json_wichtel_repository;

pub use json_poll_repository::JsonPollRepository;
pub use json_wichtel_repository::JsonWichtelRepository;
