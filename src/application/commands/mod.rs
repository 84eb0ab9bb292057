pub mod help;
pub mod poll;
pub mod utils;
pub mod wichteln;

pub use help::{register_help_command, run_help_command};
pub use poll::{register_poll_command, run_poll};
pub use wichteln::{register_wichteln_command, run_wichteln};
