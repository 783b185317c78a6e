use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::team::Team;

/// What the submitter asked to play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveRequest {
    Text(String),
    /// Let the processor pick uniformly among the legal moves.
    Random,
}

impl MoveRequest {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "random" | "rand" | "?" => MoveRequest::Random,
            _ => MoveRequest::Text(trimmed.to_string()),
        }
    }
}

/// Deferred unit of work handed from intake to the move processor.
/// Stored in the move queue table, PK: game_id, SK: work_id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub game_id: String,
    pub work_id: String,
    pub game_was_open: bool,
    pub team: Team,
    pub identity: String,
    pub request: MoveRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(
        game_id: &str,
        game_was_open: bool,
        team: Team,
        identity: &str,
        request: MoveRequest,
        reply_to: Option<String>,
    ) -> Self {
        let enqueued_at = Utc::now();
        WorkItem {
            game_id: game_id.to_string(),
            // Time-prefixed so the sort key follows enqueue order within a game
            work_id: format!(
                "{:020}-{}",
                enqueued_at.timestamp_nanos_opt().unwrap_or_default(),
                Uuid::new_v4()
            ),
            game_was_open,
            team,
            identity: identity.to_string(),
            request,
            reply_to,
            enqueued_at,
        }
    }
}
