pub mod get_string;

pub use get_string::{get_integer_option, get_string_option};
