use std::sync::Arc;

use crate::models::profile::Profile;
use crate::repositories::game_repository::GameRepository;
use crate::repositories::move_repository::MoveRepository;
use crate::services::errors::profile_service_errors::ProfileServiceError;

#[derive(Clone)]
pub struct ProfileService {
    games: Arc<dyn GameRepository + Send + Sync>,
    moves: Arc<dyn MoveRepository + Send + Sync>,
}

impl ProfileService {
    pub fn new(
        games: Arc<dyn GameRepository + Send + Sync>,
        moves: Arc<dyn MoveRepository + Send + Sync>,
    ) -> Self {
        ProfileService { games, moves }
    }

    /// Record over finished games plus the team the identity is pinned to in
    /// the game in progress, if any.
    pub async fn profile(&self, identity: &str) -> Result<Profile, ProfileServiceError> {
        let mut profile = Profile {
            identity: identity.to_string(),
            team: None,
            wins: 0,
            losses: 0,
            draws: 0,
        };

        for (game_id, team) in self.moves.list_games_for_identity(identity).await? {
            let Some(game) = self.games.get_game(&game_id).await? else {
                continue;
            };

            match game.result {
                None => profile.team = Some(team),
                Some(result) => match result.winner() {
                    Some(winner) if winner == team => profile.wins += 1,
                    Some(_) => profile.losses += 1,
                    None => profile.draws += 1,
                },
            }
        }

        Ok(profile)
    }
}
