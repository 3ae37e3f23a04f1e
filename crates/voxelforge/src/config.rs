//! Server configuration.

use serde::{Deserialize, Serialize};
use voxelforge_session::SessionConfig;

/// Settings for a Voxelforge server.
///
/// Serializable so deployments can keep it in a config file; every
/// field has a sensible default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the listener to.
    pub bind_addr: String,

    /// Message shown in server browsers.
    pub motd: String,

    /// Player cap; logins beyond it are refused.
    pub max_players: u8,

    /// World height in blocks, reported at login.
    pub world_height: u8,

    /// Game mode reported at login (0 = survival).
    pub game_mode: i32,

    /// Dimension reported at login (0 = overworld).
    pub dimension: i8,

    /// Difficulty reported at login.
    pub difficulty: i8,

    /// Per-session tunables.
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:25565".to_string(),
            motd: "A Voxelforge Server".to_string(),
            max_players: 16,
            world_height: 128,
            game_mode: 0,
            dimension: 0,
            difficulty: 0,
            session: SessionConfig::default(),
        }
    }
}
