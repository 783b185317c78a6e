use std::sync::Arc;
use std::time::Duration;

use chess::{Color, Piece};
use tracing::{debug, error};

use crate::config::NotificationPolicy;
use crate::models::game::GameResult;
use crate::repositories::chat_repository::ChatRepository;

/// What the pipeline knows about a move once it has been persisted.
#[derive(Debug, Clone)]
pub struct MoveNotice {
    pub identity: String,
    pub move_text: String,
    pub side: Color,
    pub piece: Piece,
    pub game_url: String,
    /// Move count after this move.
    pub move_count: u32,
    pub just_created: bool,
    pub result: Option<GameResult>,
    /// Time between the previous game update and this move.
    pub since_last_update: Duration,
}

impl MoveNotice {
    pub fn is_terminal(&self) -> bool {
        self.result.is_some()
    }
}

fn on_cadence(
    just_created: bool,
    since_last_update: Duration,
    move_count: u32,
    policy: &NotificationPolicy,
) -> bool {
    just_created
        || since_last_update > policy.throttle
        || (policy.every_n_moves > 0 && move_count % policy.every_n_moves == 0)
}

/// Game endings are always announced. Otherwise only a new game, a move after
/// a quiet spell, or every n-th move.
pub fn should_notify(
    just_created: bool,
    terminal: bool,
    since_last_update: Duration,
    move_count: u32,
    policy: &NotificationPolicy,
) -> bool {
    terminal || on_cadence(just_created, since_last_update, move_count, policy)
}

/// The board link follows the notify cadence and is dropped once the game is over.
pub fn should_include_link(
    just_created: bool,
    terminal: bool,
    since_last_update: Duration,
    move_count: u32,
    policy: &NotificationPolicy,
) -> bool {
    !terminal && on_cadence(just_created, since_last_update, move_count, policy)
}

pub fn piece_symbol(side: Color, piece: Piece) -> char {
    match (side, piece) {
        (Color::White, Piece::King) => '♔',
        (Color::White, Piece::Queen) => '♕',
        (Color::White, Piece::Rook) => '♖',
        (Color::White, Piece::Bishop) => '♗',
        (Color::White, Piece::Knight) => '♘',
        (Color::White, Piece::Pawn) => '♙',
        (Color::Black, Piece::King) => '♚',
        (Color::Black, Piece::Queen) => '♛',
        (Color::Black, Piece::Rook) => '♜',
        (Color::Black, Piece::Bishop) => '♝',
        (Color::Black, Piece::Knight) => '♞',
        (Color::Black, Piece::Pawn) => '♟',
    }
}

pub fn compose_message(notice: &MoveNotice, policy: &NotificationPolicy) -> String {
    let mut message = format!(
        "{} {} played {}",
        piece_symbol(notice.side, notice.piece),
        notice.identity,
        notice.move_text
    );

    if should_include_link(
        notice.just_created,
        notice.is_terminal(),
        notice.since_last_update,
        notice.move_count,
        policy,
    ) {
        message.push_str(&format!(" | {}", notice.game_url));
    }

    if let Some(result) = notice.result {
        match result.winner() {
            Some(team) => message.push_str(&format!(". Game over, {} wins!", team)),
            None => message.push_str(". Game over, it's a draw."),
        }
    }

    message
}

#[derive(Clone)]
pub struct NotificationService {
    chat: Arc<dyn ChatRepository + Send + Sync>,
    policy: NotificationPolicy,
}

impl NotificationService {
    pub fn new(chat: Arc<dyn ChatRepository + Send + Sync>, policy: NotificationPolicy) -> Self {
        NotificationService { chat, policy }
    }

    /// Announces a processed move if the throttle allows it. Returns whether a
    /// message was sent. Delivery failures are logged only.
    pub async fn notify_move(&self, notice: &MoveNotice) -> bool {
        if !should_notify(
            notice.just_created,
            notice.is_terminal(),
            notice.since_last_update,
            notice.move_count,
            &self.policy,
        ) {
            debug!("Skipping notification for move {}", notice.move_count);
            return false;
        }

        let text = compose_message(notice, &self.policy);
        self.publish(&self.policy.channel, &text).await
    }

    /// Sends `text` to `channel`, logging instead of failing.
    pub async fn publish(&self, channel: &str, text: &str) -> bool {
        match self.chat.publish(channel, text).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to publish to {}: {}", channel, e);
                false
            }
        }
    }
}
