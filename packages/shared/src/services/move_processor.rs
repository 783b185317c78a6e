use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::models::game::{Game, GameResult};
use crate::models::move_record::MoveRecord;
use crate::models::outcome::{MoveOutcome, RejectionReason};
use crate::models::work_item::{MoveRequest, WorkItem};
use crate::repositories::game_repository::GameRepository;
use crate::repositories::move_repository::MoveRepository;
use crate::repositories::remote_host_repository::RemoteHostRepository;
use crate::services::chess_service::{AppliedMove, ChessService, GameStatus};
use crate::services::errors::move_processor_errors::MoveProcessorError;
use crate::services::notification_service::{MoveNotice, NotificationService};

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MoveProcessorTrait: Send + Sync {
    /// Runs one work item to a final outcome. Must only be called by the single
    /// consumer of the item's game.
    async fn process(&self, item: &WorkItem) -> Result<MoveOutcome, MoveProcessorError>;
}

/// The only writer of game state.
#[derive(Clone)]
pub struct MoveProcessor {
    games: Arc<dyn GameRepository + Send + Sync>,
    moves: Arc<dyn MoveRepository + Send + Sync>,
    remote: Arc<dyn RemoteHostRepository + Send + Sync>,
    notifications: NotificationService,
    chess: ChessService,
}

impl MoveProcessor {
    pub fn new(
        games: Arc<dyn GameRepository + Send + Sync>,
        moves: Arc<dyn MoveRepository + Send + Sync>,
        remote: Arc<dyn RemoteHostRepository + Send + Sync>,
        notifications: NotificationService,
    ) -> Self {
        MoveProcessor {
            games,
            moves,
            remote,
            notifications,
            chess: ChessService::new(),
        }
    }

    async fn check_turn(
        &self,
        item: &WorkItem,
    ) -> Result<Result<Game, MoveOutcome>, MoveProcessorError> {
        let game = match self.games.get_game(&item.game_id).await? {
            Some(game) => game,
            None => {
                warn!("Game {} not found for work item {}", item.game_id, item.work_id);
                return Ok(Err(MoveOutcome::rejected(
                    RejectionReason::InfrastructureFailure,
                    "That game no longer exists.",
                )));
            }
        };

        if !game.is_open() {
            return Ok(Err(MoveOutcome::rejected(
                RejectionReason::TurnViolation,
                "Too late, that game is already over.",
            )));
        }

        if game.turn != item.team {
            return Ok(Err(MoveOutcome::rejected(
                RejectionReason::TurnViolation,
                format!("Too late, the turn passed to {}.", game.turn),
            )));
        }

        // Pins can form between intake and processing
        if let Some(last) = self
            .moves
            .get_last_move(&item.identity, &item.game_id)
            .await?
        {
            if last.team != item.team {
                return Ok(Err(MoveOutcome::rejected(
                    RejectionReason::TurnViolation,
                    format!("Not your turn: you play for {} in this game.", last.team),
                )));
            }
        }

        Ok(Ok(game))
    }

    async fn persist(
        &self,
        item: &WorkItem,
        game: &Game,
        move_text: &str,
        applied: &AppliedMove,
        result: Option<GameResult>,
    ) -> Result<Game, MoveProcessorError> {
        let record = MoveRecord::new(
            &game.game_id,
            game.move_count + 1,
            &item.identity,
            move_text,
            item.team,
        );
        let advanced = game.advanced(
            self.chess.serialize_position(&applied.board),
            item.team,
            result,
        );

        let outcome = match self.moves.insert_move(&record).await {
            Ok(()) => self
                .games
                .upsert_game(&advanced)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        if let Err(e) = outcome {
            error!(
                "Remote host accepted {} ({}) in game {} for work item {} but local persistence failed: {}",
                move_text,
                applied.coordinates(),
                game.game_id,
                item.work_id,
                e
            );
            return Err(MoveProcessorError::Divergence(e));
        }

        Ok(advanced)
    }
}

fn result_of(status: GameStatus, item: &WorkItem) -> Option<GameResult> {
    match status {
        GameStatus::Ongoing => None,
        GameStatus::Checkmate => Some(GameResult::win_for(item.team)),
        GameStatus::Stalemate | GameStatus::Draw => Some(GameResult::Draw),
    }
}

#[async_trait]
impl MoveProcessorTrait for MoveProcessor {
    async fn process(&self, item: &WorkItem) -> Result<MoveOutcome, MoveProcessorError> {
        info!(
            "Processing work item {} for {} in game {}",
            item.work_id, item.identity, item.game_id
        );

        let game = match self.check_turn(item).await? {
            Ok(game) => game,
            Err(rejection) => {
                info!("Rejected work item {}: {}", item.work_id, rejection.message());
                return Ok(rejection);
            }
        };

        let board = self.chess.load_position(Some(&game.fen))?;
        if board.side_to_move() != game.color_of(item.team) {
            error!(
                "Game {} is {} to move on the stored board but {} on the row",
                game.game_id,
                game.team_of(board.side_to_move()),
                item.team
            );
            return Ok(MoveOutcome::rejected(
                RejectionReason::InfrastructureFailure,
                "The stored board is out of step with this game, not played.",
            ));
        }

        let move_text = match &item.request {
            MoveRequest::Text(text) => text.clone(),
            MoveRequest::Random => match self.chess.random_move(&board, &mut rand::thread_rng()) {
                Some(chosen) => chosen,
                None => {
                    return Ok(MoveOutcome::rejected(
                        RejectionReason::InvalidMove,
                        "There are no legal moves left to pick from.",
                    ));
                }
            },
        };

        let applied = match self.chess.apply_move(&board, &move_text, true) {
            Some(applied) => applied,
            None => {
                info!("Invalid move {} in game {}", move_text, game.game_id);
                return Ok(MoveOutcome::rejected(
                    RejectionReason::InvalidMove,
                    format!("{} is not a legal move here, not played.", move_text),
                ));
            }
        };
        let result = result_of(applied.status, item);

        debug!(
            "Submitting {} to remote game {}",
            applied.coordinates(),
            game.game_id
        );
        let accepted = self
            .remote
            .submit_move(
                &game.game_id,
                &applied.coordinates(),
                applied.side,
                &item.identity,
            )
            .await?;
        if !accepted {
            return Ok(MoveOutcome::rejected(
                RejectionReason::RemoteRejection,
                format!("{} was rejected by the game host, not played.", move_text),
            ));
        }

        let advanced = self
            .persist(item, &game, &move_text, &applied, result)
            .await?;

        let notice = MoveNotice {
            identity: item.identity.clone(),
            move_text: move_text.clone(),
            side: applied.side,
            piece: applied.piece,
            game_url: self.remote.game_url(&game.game_id),
            move_count: advanced.move_count,
            just_created: game.move_count == 0,
            result,
            since_last_update: (Utc::now() - game.updated_at).to_std().unwrap_or_default(),
        };
        self.notifications.notify_move(&notice).await;

        info!(
            "Move {} accepted as #{} in game {}",
            move_text, advanced.move_count, game.game_id
        );

        let mut message = format!("{} played for {}.", move_text, item.team);
        match result.map(GameResult::winner) {
            Some(Some(winner)) => message.push_str(&format!(" Checkmate, {} wins!", winner)),
            Some(None) => message.push_str(" The game is drawn."),
            None => {}
        }

        Ok(MoveOutcome::accepted(message))
    }
}
