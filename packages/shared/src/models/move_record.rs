use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::team::Team;

/// Append-only log entry for an accepted move.
/// PK: game_id, SK: seq. The `identity_game` attribute backs the
/// `GSI_MoveByIdentityGame` index used to find an identity's pinned team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub game_id: String,
    pub seq: u32,
    pub identity: String,
    pub move_text: String,
    pub team: Team,
    pub identity_game: String,
    pub created_at: DateTime<Utc>,
}

impl MoveRecord {
    pub fn new(game_id: &str, seq: u32, identity: &str, move_text: &str, team: Team) -> Self {
        MoveRecord {
            game_id: game_id.to_string(),
            seq,
            identity: identity.to_string(),
            move_text: move_text.to_string(),
            team,
            identity_game: identity_game_key(identity, game_id),
            created_at: Utc::now(),
        }
    }
}

/// Composite index key, e.g. "U123#abcd1234"
pub fn identity_game_key(identity: &str, game_id: &str) -> String {
    format!("{}#{}", identity, game_id)
}
