pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod model;
pub mod report;
pub mod sink;
pub mod source;
pub mod time;
