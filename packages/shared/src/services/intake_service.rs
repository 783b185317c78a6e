use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::models::game::Game;
use crate::models::outcome::RejectionReason;
use crate::models::team::Team;
use crate::models::work_item::{MoveRequest, WorkItem};
use crate::repositories::game_repository::GameRepository;
use crate::repositories::move_queue_repository::MoveQueue;
use crate::repositories::move_repository::MoveRepository;
use crate::repositories::remote_host_repository::RemoteHostRepository;
use crate::services::chess_service::ChessService;
use crate::services::errors::intake_service_errors::IntakeServiceError;
use crate::services::turn_service::resolve_team;

/// Immediate answer to a submission. Legality and the remote host are only
/// consulted later, by the move processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeDecision {
    Pending {
        game_id: String,
        team: Team,
        message: String,
    },
    Rejected {
        reason: RejectionReason,
        message: String,
    },
}

impl IntakeDecision {
    fn rejected(reason: RejectionReason, message: impl Into<String>) -> Self {
        IntakeDecision::Rejected {
            reason,
            message: message.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, IntakeDecision::Pending { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            IntakeDecision::Pending { message, .. } | IntakeDecision::Rejected { message, .. } => {
                message
            }
        }
    }
}

#[derive(Clone)]
pub struct IntakeService {
    games: Arc<dyn GameRepository + Send + Sync>,
    moves: Arc<dyn MoveRepository + Send + Sync>,
    queue: Arc<dyn MoveQueue + Send + Sync>,
    remote: Arc<dyn RemoteHostRepository + Send + Sync>,
    chess: ChessService,
    move_timeout: Duration,
    creation_lock: Arc<tokio::sync::Mutex<()>>,
    // Submissions accepted here but maybe not yet persisted by the processor
    recent_submissions: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl IntakeService {
    pub fn new(
        games: Arc<dyn GameRepository + Send + Sync>,
        moves: Arc<dyn MoveRepository + Send + Sync>,
        queue: Arc<dyn MoveQueue + Send + Sync>,
        remote: Arc<dyn RemoteHostRepository + Send + Sync>,
        move_timeout: Duration,
    ) -> Self {
        IntakeService {
            games,
            moves,
            queue,
            remote,
            chess: ChessService::new(),
            move_timeout,
            creation_lock: Arc::new(tokio::sync::Mutex::new(())),
            recent_submissions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn accept(
        &self,
        identity: &str,
        raw_text: &str,
        requested_team: Option<Team>,
        reply_to: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<IntakeDecision, IntakeServiceError> {
        let request = MoveRequest::parse(raw_text);
        if request == MoveRequest::Text(String::new()) {
            return Ok(IntakeDecision::rejected(
                RejectionReason::InvalidMove,
                "Send a move like e4 or Nf3, or \"random\".",
            ));
        }

        let open_game = self.games.get_open_game().await?;

        let last_move = match &open_game {
            Some(game) => self.moves.get_last_move(identity, &game.game_id).await?,
            None => None,
        };

        let last_activity = [
            last_move.as_ref().map(|record| record.created_at),
            self.recent_submission(identity, open_game.as_ref()),
        ]
        .into_iter()
        .flatten()
        .max();

        if let Some(remaining) = last_activity.and_then(|at| self.cooldown_remaining(at, now)) {
            info!("Cooldown for {}: {} ms remaining", identity, remaining.as_millis());
            return Ok(IntakeDecision::rejected(
                RejectionReason::Cooldown,
                format!(
                    "Slow down! You can move again in {:.1} seconds.",
                    remaining.as_secs_f64()
                ),
            ));
        }

        let pinned = last_move.as_ref().map(|record| record.team);
        let team = match resolve_team(
            open_game.as_ref().map(|game| game.turn),
            pinned,
            requested_team,
            &mut rand::thread_rng(),
        ) {
            Ok(team) => team,
            Err(violation) => {
                info!("Turn violation for {}: {:?}", identity, violation);
                return Ok(IntakeDecision::rejected(
                    RejectionReason::TurnViolation,
                    violation.message(),
                ));
            }
        };

        let (game, team, game_was_open) = match open_game {
            Some(game) => (game, team, true),
            None => {
                if let MoveRequest::Text(text) = &request {
                    if !self.chess.prevalidate_opening(text) {
                        return Ok(IntakeDecision::rejected(
                            RejectionReason::InvalidMove,
                            format!("{} is not a valid opening move.", text),
                        ));
                    }
                }
                self.open_game_for(identity, team).await?
            }
        };

        let item = WorkItem::new(
            &game.game_id,
            game_was_open,
            team,
            identity,
            request,
            reply_to,
        );
        self.queue.enqueue(&item).await?;
        self.remember_submission(identity, &game.game_id, now);

        info!(
            "Enqueued {} for {} on team {} in game {}",
            item.work_id, identity, team, game.game_id
        );

        Ok(IntakeDecision::Pending {
            game_id: game.game_id,
            team,
            message: format!("Move submitted for team {}, waiting for the board.", team),
        })
    }

    /// Link to the game in progress.
    pub async fn board_link(&self) -> Result<String, IntakeServiceError> {
        match self.games.get_open_game().await? {
            Some(game) => Ok(format!(
                "Current game ({} moves, {} to move): {}",
                game.move_count,
                game.turn,
                self.remote.game_url(&game.game_id)
            )),
            None => Ok("No game in progress. Send a move to start one!".to_string()),
        }
    }

    /// Creates the remote and local game unless another submission got there first.
    async fn open_game_for(
        &self,
        identity: &str,
        team: Team,
    ) -> Result<(Game, Team, bool), IntakeServiceError> {
        let _guard = self.creation_lock.lock().await;

        if let Some(game) = self.games.get_open_game().await? {
            // Lost the race. Nobody is pinned in a game this young, so route to its turn
            let team = game.turn;
            return Ok((game, team, true));
        }

        let game_id = self.remote.create_game(identity).await?;
        let game = Game::new(&game_id, team);
        self.games.upsert_game(&game).await?;

        info!("Created game {} with {} playing white", game_id, team);
        Ok((game, team, false))
    }

    fn cooldown_remaining(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
        let elapsed = (now - last).to_std().unwrap_or_default();
        self.move_timeout.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    fn recent_submission(&self, identity: &str, open_game: Option<&Game>) -> Option<DateTime<Utc>> {
        let game = open_game?;
        let recent = match self.recent_submissions.lock() {
            Ok(recent) => recent,
            Err(poisoned) => poisoned.into_inner(),
        };
        recent
            .get(&submission_key(identity, &game.game_id))
            .copied()
    }

    fn remember_submission(&self, identity: &str, game_id: &str, now: DateTime<Utc>) {
        let mut recent = match self.recent_submissions.lock() {
            Ok(recent) => recent,
            Err(poisoned) => {
                warn!("Recent submission map was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let horizon = now - chrono::Duration::from_std(self.move_timeout)
            .unwrap_or_else(|_| chrono::Duration::zero());
        recent.retain(|_, at| *at > horizon);
        recent.insert(submission_key(identity, game_id), now);
    }
}

fn submission_key(identity: &str, game_id: &str) -> String {
    format!("{}#{}", identity, game_id)
}
