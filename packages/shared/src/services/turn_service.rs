use rand::Rng;

use crate::models::team::Team;

/// The game is waiting on another team and the identity is pinned to its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnViolation {
    pub pinned: Team,
    pub waiting_on: Team,
}

impl TurnViolation {
    pub fn message(&self) -> String {
        format!(
            "Not your turn: you play for {} and the game is waiting on {}.",
            self.pinned, self.waiting_on
        )
    }
}

/// Decides which team a submission counts for.
///
/// * `waiting_on` is the open game's team to move, `None` when no game is open.
/// * `pinned` is the team on the identity's last move in the open game.
/// * `requested` is the team the submission asked for, if any.
///
/// Pinned identities keep their team and are rejected out of turn. Unpinned
/// identities are routed onto whichever team moves next. With no open game the
/// request is honoured, or a team is drawn at random.
pub fn resolve_team<R: Rng + ?Sized>(
    waiting_on: Option<Team>,
    pinned: Option<Team>,
    requested: Option<Team>,
    rng: &mut R,
) -> Result<Team, TurnViolation> {
    match (waiting_on, pinned) {
        (Some(waiting_on), Some(pinned)) if pinned != waiting_on => {
            Err(TurnViolation { pinned, waiting_on })
        }
        (Some(_), Some(pinned)) => Ok(pinned),
        (Some(waiting_on), None) => Ok(waiting_on),
        // A pin only exists inside an open game
        (None, _) => Ok(requested.unwrap_or_else(|| Team::random(rng))),
    }
}
