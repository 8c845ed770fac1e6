//! Room configuration and the game phase machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Tunables for the single room a server instance hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum clients admitted; further connections are rejected.
    pub max_players: usize,

    /// Minimum registered clients required for the owner to start a
    /// round. Also the competitive-mode abort threshold: a running
    /// round ends when the registry drops below this.
    pub min_players: usize,

    /// Score at or above which a submission wins the round.
    pub win_threshold: f32,

    /// How a running round reacts to departures, see [`RoundMode`].
    pub mode: RoundMode,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 5,
            min_players: 2,
            win_threshold: 100.0,
            mode: RoundMode::Competitive,
        }
    }
}

/// Abort policy for a running round when players disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundMode {
    /// The round needs opponents: abort when the registry drops below
    /// the configured minimum.
    Competitive,

    /// The round runs as long as anyone is left alive: abort only when
    /// the alive count reaches zero.
    Survival,
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// The room's game state machine. Two states, three transitions:
///
/// ```text
///            owner Start (validated)
///   Waiting ─────────────────────────▶ Running
///      ▲                                  │
///      └──────────────────────────────────┘
///        all dead / winner found / abort policy
/// ```
///
/// No other transitions exist. The room's exclusive-access discipline
/// guarantees the machine is never re-entered mid-transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Lobby state: picks and ready flags accumulate here. Initial.
    Waiting,
    /// A round is in progress.
    Running,
}

impl GamePhase {
    /// Returns `true` if a round is in progress.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Running => write!(f, "Running"),
        }
    }
}
