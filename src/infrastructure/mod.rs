pub mod discord_bot;
pub mod gateway;
pub mod repositories;
