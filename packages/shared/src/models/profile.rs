use serde::{Deserialize, Serialize};

use crate::models::team::Team;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub identity: String,
    /// Team the identity is pinned to in the open game, if any.
    pub team: Option<Team>,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Profile {
    pub fn summary(&self) -> String {
        let team = match self.team {
            Some(team) => format!("playing for {}", team),
            None => "not in the current game".to_string(),
        };
        format!(
            "{} is {}. Record: {} wins, {} losses, {} draws.",
            self.identity, team, self.wins, self.losses, self.draws
        )
    }
}
