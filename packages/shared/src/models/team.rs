use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two sides sharing the board. Which team plays white is
/// decided per game, see [`crate::models::game::Game::white_team`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    pub fn initial(self) -> char {
        match self {
            Team::Red => 'R',
            Team::Blue => 'B',
        }
    }

    /// Picks either team with equal probability.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Team {
        if rng.gen_bool(0.5) {
            Team::Red
        } else {
            Team::Blue
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Red => write!(f, "red"),
            Team::Blue => write!(f, "blue"),
        }
    }
}

impl FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(Team::Red),
            "blue" | "b" => Ok(Team::Blue),
            other => Err(format!("Unknown team: {}", other)),
        }
    }
}
