//! In-memory collaborators and a harness wiring intake, queue and processor
//! together the way the lambdas do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chess::Color;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::RwLock;

use shared::config::NotificationPolicy;
use shared::models::game::Game;
use shared::models::move_record::MoveRecord;
use shared::models::team::Team;
use shared::repositories::chat_repository::ChatRepository;
use shared::repositories::errors::chat_errors::ChatError;
use shared::repositories::errors::game_repository_errors::GameRepositoryError;
use shared::repositories::errors::move_repository_errors::MoveRepositoryError;
use shared::repositories::errors::remote_host_errors::RemoteHostError;
use shared::repositories::game_repository::GameRepository;
use shared::repositories::move_repository::MoveRepository;
use shared::repositories::remote_host_repository::RemoteHostRepository;
use shared::services::intake_service::{IntakeDecision, IntakeService};
use shared::services::local_move_queue::{Completion, LocalMoveQueue};
use shared::services::move_processor::MoveProcessor;
use shared::services::move_worker::MoveWorker;
use shared::services::notification_service::NotificationService;

#[derive(Clone, Default)]
pub struct InMemoryGameRepository {
    games: Arc<RwLock<HashMap<String, Game>>>,
}

impl InMemoryGameRepository {
    pub async fn insert(&self, game: Game) {
        self.games.write().await.insert(game.game_id.clone(), game);
    }

    pub async fn open_game(&self) -> Option<Game> {
        self.games
            .read()
            .await
            .values()
            .find(|game| game.is_open())
            .cloned()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn get_open_game(&self) -> Result<Option<Game>, GameRepositoryError> {
        Ok(self.open_game().await)
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError> {
        Ok(self.games.read().await.get(game_id).cloned())
    }

    async fn upsert_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        self.insert(game.clone()).await;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMoveRepository {
    moves: Arc<RwLock<Vec<MoveRecord>>>,
}

impl InMemoryMoveRepository {
    pub async fn all(&self) -> Vec<MoveRecord> {
        self.moves.read().await.clone()
    }
}

#[async_trait]
impl MoveRepository for InMemoryMoveRepository {
    async fn get_last_move(
        &self,
        identity: &str,
        game_id: &str,
    ) -> Result<Option<MoveRecord>, MoveRepositoryError> {
        Ok(self
            .moves
            .read()
            .await
            .iter()
            .filter(|record| record.identity == identity && record.game_id == game_id)
            .max_by_key(|record| record.seq)
            .cloned())
    }

    async fn insert_move(&self, record: &MoveRecord) -> Result<(), MoveRepositoryError> {
        let mut moves = self.moves.write().await;
        if moves
            .iter()
            .any(|existing| existing.game_id == record.game_id && existing.seq == record.seq)
        {
            return Err(MoveRepositoryError::AlreadyExists);
        }
        moves.push(record.clone());
        Ok(())
    }

    async fn list_games_for_identity(
        &self,
        identity: &str,
    ) -> Result<Vec<(String, Team)>, MoveRepositoryError> {
        let mut games: Vec<(String, Team)> = Vec::new();
        for record in self.moves.read().await.iter() {
            if record.identity == identity && !games.iter().any(|(id, _)| *id == record.game_id) {
                games.push((record.game_id.clone(), record.team));
            }
        }
        Ok(games)
    }
}

#[derive(Clone, Default)]
pub struct FakeRemoteHost {
    created: Arc<AtomicUsize>,
    reject_moves: Arc<AtomicBool>,
    submitted: Arc<RwLock<Vec<(String, String, Color)>>>,
}

impl FakeRemoteHost {
    pub fn games_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn reject_moves(&self, reject: bool) {
        self.reject_moves.store(reject, Ordering::SeqCst);
    }

    pub async fn submitted(&self) -> Vec<(String, String, Color)> {
        self.submitted.read().await.clone()
    }
}

#[async_trait]
impl RemoteHostRepository for FakeRemoteHost {
    async fn create_game(&self, _hosting_identity: &str) -> Result<String, RemoteHostError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("remote-{}", n))
    }

    async fn submit_move(
        &self,
        game_id: &str,
        coordinate_move: &str,
        side: Color,
        _acting_identity: &str,
    ) -> Result<bool, RemoteHostError> {
        if self.reject_moves.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.submitted
            .write()
            .await
            .push((game_id.to_string(), coordinate_move.to_string(), side));
        Ok(true)
    }

    fn game_url(&self, game_id: &str) -> String {
        format!("https://lichess.test/{}", game_id)
    }
}

#[derive(Clone, Default)]
pub struct RecordingChat {
    messages: Arc<RwLock<Vec<(String, String)>>>,
}

impl RecordingChat {
    pub async fn messages(&self) -> Vec<(String, String)> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl ChatRepository for RecordingChat {
    async fn publish(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        self.messages
            .write()
            .await
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub games: InMemoryGameRepository,
    pub moves: InMemoryMoveRepository,
    pub remote: FakeRemoteHost,
    pub chat: RecordingChat,
    pub intake: IntakeService,
    completions: UnboundedReceiver<Completion>,
}

impl Harness {
    pub fn new(move_timeout: Duration) -> Self {
        let games = InMemoryGameRepository::default();
        let moves = InMemoryMoveRepository::default();
        let remote = FakeRemoteHost::default();
        let chat = RecordingChat::default();

        let notifications =
            NotificationService::new(Arc::new(chat.clone()), NotificationPolicy::default());
        let processor = MoveProcessor::new(
            Arc::new(games.clone()),
            Arc::new(moves.clone()),
            Arc::new(remote.clone()),
            notifications.clone(),
        );
        let worker = MoveWorker::new(Arc::new(processor), notifications, Duration::from_secs(5));
        let (queue, completions) = LocalMoveQueue::new(worker);

        let intake = IntakeService::new(
            Arc::new(games.clone()),
            Arc::new(moves.clone()),
            Arc::new(queue),
            Arc::new(remote.clone()),
            move_timeout,
        );

        Harness {
            games,
            moves,
            remote,
            chat,
            intake,
            completions,
        }
    }

    pub async fn submit(
        &self,
        identity: &str,
        text: &str,
        team: Option<Team>,
        now: DateTime<Utc>,
    ) -> IntakeDecision {
        self.intake
            .accept(identity, text, team, Some(format!("@{}", identity)), now)
            .await
            .expect("intake should not fail against in-memory stores")
    }

    pub async fn next_completion(&mut self) -> Completion {
        tokio::time::timeout(Duration::from_secs(5), self.completions.recv())
            .await
            .expect("work item was not processed in time")
            .expect("completion channel closed")
    }

    /// Submits and waits for the processor when intake accepts.
    pub async fn play(
        &mut self,
        identity: &str,
        text: &str,
        team: Option<Team>,
        now: DateTime<Utc>,
    ) -> Option<Completion> {
        match self.submit(identity, text, team, now).await {
            IntakeDecision::Pending { .. } => Some(self.next_completion().await),
            IntakeDecision::Rejected { .. } => None,
        }
    }

    pub fn assert_idle(&mut self) {
        assert!(
            self.completions.try_recv().is_err(),
            "no further work item should have been processed"
        );
    }
}
