use std::sync::Arc;

use aws_lambda_events::event::dynamodb::Event;
use lambda_runtime::Error;
use serde_dynamo::aws_sdk_dynamodb_1::from_item;
use serde_dynamo::Item;
use shared::models::outcome::MoveOutcome;
use shared::models::work_item::WorkItem;
use shared::repositories::move_queue_repository::MoveQueue;
use shared::services::move_worker::MoveWorker;
use tracing::{debug, error, info, warn};

/// Consumes the move-queue table stream. The stream is sharded by game and
/// delivered one record at a time, which gives one in-flight item per game.
#[derive(Clone)]
pub struct MoveQueueProcessor {
    worker: MoveWorker,
    queue: Arc<dyn MoveQueue + Send + Sync>,
}

impl MoveQueueProcessor {
    pub fn new(worker: MoveWorker, queue: Arc<dyn MoveQueue + Send + Sync>) -> Self {
        Self { worker, queue }
    }

    pub async fn process_event(&self, event: Event) -> Result<(), Error> {
        debug!(
            "Move processor received event with {} records",
            event.records.len()
        );

        for record in event.records {
            self.process_record(&record.event_name, record.change.new_image)
                .await;
        }

        Ok(())
    }

    /// Handles one stream record. A record whose image is not a work item is
    /// skipped so it cannot hold up the rest of the shard.
    pub async fn process_record(&self, event_name: &str, new_image: Item) -> Option<MoveOutcome> {
        debug!("Processing record with event_name: {}", event_name);

        match event_name {
            "INSERT" => match from_item::<WorkItem>(new_image.into()) {
                Ok(item) => Some(self.handle(&item).await),
                Err(e) => {
                    error!("Skipping malformed work item: {}", e);
                    None
                }
            },
            "REMOVE" => {
                debug!("Ignoring acknowledged work item");
                None
            }
            _ => {
                warn!("Unhandled event type: {}", event_name);
                None
            }
        }
    }

    async fn handle(&self, item: &WorkItem) -> MoveOutcome {
        info!(
            "Work item {} dequeued for game {} ({} on {})",
            item.work_id, item.game_id, item.identity, item.team
        );

        let outcome = self.worker.handle(item).await;
        match &outcome {
            MoveOutcome::Accepted { message } => info!("Accepted: {}", message),
            MoveOutcome::Rejected { reason, message } => {
                info!("Rejected ({}): {}", reason, message)
            }
        }

        if let Err(e) = self.queue.acknowledge(item).await {
            // The outcome is final, a stale queue row is only noise
            error!("Failed to acknowledge work item {}: {}", item.work_id, e);
        }

        outcome
    }
}
