pub mod poll_scheduler;
pub mod wichtel_scheduler;

pub use poll_scheduler::PollScheduler;
pub use wichtel_scheduler::WichtelScheduler;
