use chess::Color;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::team::Team;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Terminal result code of a game: the winning team's initial, or `D` for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "R")]
    RedWin,
    #[serde(rename = "B")]
    BlueWin,
    #[serde(rename = "D")]
    Draw,
}

impl GameResult {
    pub fn win_for(team: Team) -> Self {
        match team {
            Team::Red => GameResult::RedWin,
            Team::Blue => GameResult::BlueWin,
        }
    }

    pub fn winner(self) -> Option<Team> {
        match self {
            GameResult::RedWin => Some(Team::Red),
            GameResult::BlueWin => Some(Team::Blue),
            GameResult::Draw => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            GameResult::RedWin => Team::Red.initial(),
            GameResult::BlueWin => Team::Blue.initial(),
            GameResult::Draw => 'D',
        }
    }
}

/// The shared match. Keyed by the remote host's game id.
/// At most one game without a `result` exists at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub game_id: String,
    pub fen: String,
    pub move_count: u32,
    pub turn: Team,
    pub white_team: Team,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// A fresh game on the starting position. The creating team plays white,
    /// so the new game is waiting on it.
    pub fn new(game_id: &str, white_team: Team) -> Self {
        let now = Utc::now();
        Game {
            game_id: game_id.to_string(),
            fen: STARTING_FEN.to_string(),
            move_count: 0,
            turn: white_team,
            white_team,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.result.is_none()
    }

    pub fn color_of(&self, team: Team) -> Color {
        if team == self.white_team {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn team_of(&self, color: Color) -> Team {
        match color {
            Color::White => self.white_team,
            Color::Black => self.white_team.opponent(),
        }
    }

    /// Returns the successor row after `team` has played a move that produced `fen`.
    /// The caller persists it with a full upsert.
    pub fn advanced(&self, fen: String, team: Team, result: Option<GameResult>) -> Self {
        Game {
            game_id: self.game_id.clone(),
            fen,
            move_count: self.move_count + 1,
            turn: team.opponent(),
            white_team: self.white_team,
            result,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}
