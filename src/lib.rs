pub mod api_football;
pub mod api_parse;
pub mod cards;
pub mod config;
pub mod delivery;
pub mod fouls;
pub mod goals;
pub mod history;
pub mod http_client;
pub mod logging;
pub mod memory_source;
pub mod players;
pub mod prediction;
pub mod report;
pub mod run_guard;
pub mod star;
pub mod stats;
