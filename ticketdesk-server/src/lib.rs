pub mod command;
pub mod config;
pub mod desk;
pub mod discord;
pub mod handler;
pub mod index;
pub mod interpreter;
pub mod locks;
pub mod platform;
pub mod render;
pub mod scheduler;
pub mod status;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigError};
pub use desk::{DeskSettings, TicketDesk};
pub use platform::{PlatformError, Responder, TicketPlatform};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

fn short_hash(hash: &str) -> String {
    hash.chars().take(8).collect()
}

pub fn get_bot_version() -> String {
    // First check for git hash from the container build environment
    if let Some(git_hash) = option_env!("TICKETDESK_GIT_HASH") {
        short_hash(git_hash)
    } else if let Some(git_hash) = built_info::GIT_COMMIT_HASH {
        // Fall back to built crate's git detection (for cargo builds)
        short_hash(git_hash)
    } else {
        "unknown".to_string()
    }
}
