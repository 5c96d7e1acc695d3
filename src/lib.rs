pub mod config;
pub mod flight_log;
pub mod logging;
pub mod models;
pub mod path_buffer;
