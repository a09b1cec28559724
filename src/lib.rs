pub mod config;
pub mod coordinator;
pub mod messaging;
pub mod playback;
pub mod registry;
pub mod session;
pub mod types;
pub mod utils;
pub mod ws;
