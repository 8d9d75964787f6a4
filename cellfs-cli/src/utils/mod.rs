pub mod log;
pub mod path;

pub use log::{LogLevel, log_level, set_log_level};
