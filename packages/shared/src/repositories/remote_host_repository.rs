use async_trait::async_trait;
use chess::Color;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::LichessConfig;
use crate::repositories::errors::remote_host_errors::RemoteHostError;

#[cfg(test)]
use mockall::automock;

/// The match-hosting service that holds the live game and has the final say
/// on whether a move is played.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteHostRepository: Send + Sync {
    /// Opens a new remote game and returns its id.
    async fn create_game(&self, hosting_identity: &str) -> Result<String, RemoteHostError>;

    /// Plays `coordinate_move` (e.g. "e2e4", "e7e8q") for `side`.
    /// `Ok(false)` means the host refused the move.
    async fn submit_move(
        &self,
        game_id: &str,
        coordinate_move: &str,
        side: Color,
        acting_identity: &str,
    ) -> Result<bool, RemoteHostError>;

    fn game_url(&self, game_id: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    id: Option<String>,
    challenge: Option<ChallengeBody>,
}

#[derive(Debug, Deserialize)]
struct ChallengeBody {
    id: String,
}

/// Lichess board API. Each colour is played by its own bot account.
pub struct LichessRepository {
    client: reqwest::Client,
    config: LichessConfig,
}

impl LichessRepository {
    pub fn new(client: reqwest::Client, config: LichessConfig) -> Self {
        Self { client, config }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn token_for(&self, side: Color) -> &str {
        match side {
            Color::White => &self.config.white_token,
            Color::Black => &self.config.black_token,
        }
    }
}

#[async_trait]
impl RemoteHostRepository for LichessRepository {
    async fn create_game(&self, hosting_identity: &str) -> Result<String, RemoteHostError> {
        info!("Creating remote game on behalf of {}", hosting_identity);

        // White's account challenges black's account...
        let response = self
            .client
            .post(format!(
                "{}/api/challenge/{}",
                self.base_url(),
                self.config.black_username
            ))
            .bearer_auth(&self.config.white_token)
            .form(&[
                ("rated", "false"),
                ("color", "white"),
                ("variant", "standard"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteHostError::UnexpectedResponse(format!(
                "challenge returned {}",
                status
            )));
        }

        let body: ChallengeResponse = response.json().await?;
        let game_id = body
            .challenge
            .map(|challenge| challenge.id)
            .or(body.id)
            .ok_or_else(|| {
                RemoteHostError::UnexpectedResponse("challenge response without id".to_string())
            })?;

        // ...and black's account accepts, which starts the game under the same id
        let response = self
            .client
            .post(format!(
                "{}/api/challenge/{}/accept",
                self.base_url(),
                game_id
            ))
            .bearer_auth(&self.config.black_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteHostError::UnexpectedResponse(format!(
                "accepting challenge {} returned {}",
                game_id, status
            )));
        }

        info!("Remote game {} created", game_id);
        Ok(game_id)
    }

    async fn submit_move(
        &self,
        game_id: &str,
        coordinate_move: &str,
        side: Color,
        acting_identity: &str,
    ) -> Result<bool, RemoteHostError> {
        let response = self
            .client
            .post(format!(
                "{}/api/board/game/{}/move/{}",
                self.base_url(),
                game_id,
                coordinate_move
            ))
            .bearer_auth(self.token_for(side))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(
                "Remote host accepted {} by {} in game {}",
                coordinate_move, acting_identity, game_id
            );
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            "Remote host rejected {} by {} in game {}: {} {}",
            coordinate_move, acting_identity, game_id, status, body
        );
        Ok(false)
    }

    fn game_url(&self, game_id: &str) -> String {
        format!("{}/{}", self.base_url(), game_id)
    }
}
