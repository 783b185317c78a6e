use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

use crate::models::move_record::{identity_game_key, MoveRecord};
use crate::models::team::Team;
use crate::repositories::errors::move_repository_errors::MoveRepositoryError;

#[cfg(test)]
use mockall::automock;

const IDENTITY_GAME_INDEX: &str = "GSI_MoveByIdentityGame";
const IDENTITY_INDEX: &str = "GSI_MoveByIdentity";

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MoveRepository: Send + Sync {
    /// Most recent move the identity played in the given game.
    async fn get_last_move(
        &self,
        identity: &str,
        game_id: &str,
    ) -> Result<Option<MoveRecord>, MoveRepositoryError>;

    /// Appends a move. Fails with `AlreadyExists` if the sequence number is taken.
    async fn insert_move(&self, record: &MoveRecord) -> Result<(), MoveRepositoryError>;

    /// Every game the identity played in, with the team it played for.
    async fn list_games_for_identity(
        &self,
        identity: &str,
    ) -> Result<Vec<(String, Team)>, MoveRepositoryError>;
}

pub struct DynamoDbMoveRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbMoveRepository {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[async_trait]
impl MoveRepository for DynamoDbMoveRepository {
    async fn get_last_move(
        &self,
        identity: &str,
        game_id: &str,
    ) -> Result<Option<MoveRecord>, MoveRepositoryError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(IDENTITY_GAME_INDEX)
            .key_condition_expression("identity_game = :identity_game")
            .expression_attribute_values(
                ":identity_game",
                AttributeValue::S(identity_game_key(identity, game_id)),
            )
            .scan_index_forward(false)
            .limit(1)
            .send()
            .await
            .map_err(|e| MoveRepositoryError::DynamoDb(e.to_string()))?;

        match output.items.and_then(|items| items.into_iter().next()) {
            Some(item) => {
                let record: MoveRecord = from_item(item)
                    .map_err(|e| MoveRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn insert_move(&self, record: &MoveRecord) -> Result<(), MoveRepositoryError> {
        let item =
            to_item(record).map_err(|e| MoveRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#seq)")
            .expression_attribute_names("#seq", "seq")
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    MoveRepositoryError::AlreadyExists
                } else {
                    MoveRepositoryError::DynamoDb(service_error.to_string())
                }
            })?;

        Ok(())
    }

    async fn list_games_for_identity(
        &self,
        identity: &str,
    ) -> Result<Vec<(String, Team)>, MoveRepositoryError> {
        let mut games: Vec<(String, Team)> = Vec::new();
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(IDENTITY_INDEX)
                .key_condition_expression("#identity = :identity")
                .expression_attribute_names("#identity", "identity")
                .expression_attribute_values(":identity", AttributeValue::S(identity.to_string()))
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|e| MoveRepositoryError::DynamoDb(e.to_string()))?;

            for item in output.items.unwrap_or_default() {
                let record: MoveRecord = from_item(item)
                    .map_err(|e| MoveRepositoryError::Serialization(e.to_string()))?;
                // Pinning keeps the team constant within a game, one entry per game is enough
                if !games.iter().any(|(game_id, _)| *game_id == record.game_id) {
                    games.push((record.game_id, record.team));
                }
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        Ok(games)
    }
}
