use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::to_item;
use tracing::debug;

use crate::models::work_item::WorkItem;
use crate::repositories::errors::move_queue_errors::MoveQueueError;

#[cfg(test)]
use mockall::automock;

/// Durable hand-off between intake and the move processor.
/// Items for the same game must be consumed one at a time, in enqueue order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MoveQueue: Send + Sync {
    async fn enqueue(&self, item: &WorkItem) -> Result<(), MoveQueueError>;

    /// Marks the item as fully processed.
    async fn acknowledge(&self, item: &WorkItem) -> Result<(), MoveQueueError>;
}

/// Queue table whose stream drives the move-processor lambda.
/// PK: game_id, SK: work_id. The stream mapping runs with a batch size of 1,
/// so records for a game are delivered in order, one at a time.
pub struct DynamoDbMoveQueue {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbMoveQueue {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[async_trait]
impl MoveQueue for DynamoDbMoveQueue {
    async fn enqueue(&self, item: &WorkItem) -> Result<(), MoveQueueError> {
        let dynamo_item =
            to_item(item).map_err(|e| MoveQueueError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(dynamo_item))
            .send()
            .await
            .map_err(|e| MoveQueueError::DynamoDb(e.to_string()))?;

        debug!(
            "Enqueued work item {} for game {}",
            item.work_id, item.game_id
        );
        Ok(())
    }

    async fn acknowledge(&self, item: &WorkItem) -> Result<(), MoveQueueError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("game_id", AttributeValue::S(item.game_id.clone()))
            .key("work_id", AttributeValue::S(item.work_id.clone()))
            .send()
            .await
            .map_err(|e| MoveQueueError::DynamoDb(e.to_string()))?;

        debug!(
            "Acknowledged work item {} for game {}",
            item.work_id, item.game_id
        );
        Ok(())
    }
}
