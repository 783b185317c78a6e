use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::models::outcome::{MoveOutcome, RejectionReason};
use crate::models::work_item::WorkItem;
use crate::services::move_processor::MoveProcessorTrait;
use crate::services::notification_service::NotificationService;

/// Attempts per work item, the first run plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

const GENERIC_FAILURE: &str = "Something went wrong while playing your move, please try again.";
const DIVERGENCE_FAILURE: &str =
    "Your move reached the game host but could not be saved here. Check the board before moving again.";

/// Drives a work item through the processor under a timeout, retries
/// infrastructure failures once, then replies to the submitter.
#[derive(Clone)]
pub struct MoveWorker {
    processor: Arc<dyn MoveProcessorTrait + Send + Sync>,
    notifications: NotificationService,
    timeout: Duration,
}

impl MoveWorker {
    pub fn new(
        processor: Arc<dyn MoveProcessorTrait + Send + Sync>,
        notifications: NotificationService,
        timeout: Duration,
    ) -> Self {
        MoveWorker {
            processor,
            notifications,
            timeout,
        }
    }

    pub async fn handle(&self, item: &WorkItem) -> MoveOutcome {
        let outcome = self.run(item).await;

        if let Some(channel) = &item.reply_to {
            self.notifications
                .publish(channel, &format!("<@{}> {}", item.identity, outcome.message()))
                .await;
        }

        outcome
    }

    async fn run(&self, item: &WorkItem) -> MoveOutcome {
        for attempt in 1..=MAX_ATTEMPTS {
            match tokio::time::timeout(self.timeout, self.processor.process(item)).await {
                Ok(Ok(outcome)) => return outcome,
                Ok(Err(e)) if e.is_retryable() => {
                    warn!(
                        "Attempt {}/{} for work item {} failed: {}",
                        attempt, MAX_ATTEMPTS, item.work_id, e
                    );
                }
                Ok(Err(e)) => {
                    error!("Work item {} left game {} diverged: {}", item.work_id, item.game_id, e);
                    return MoveOutcome::rejected(RejectionReason::DivergenceRisk, DIVERGENCE_FAILURE);
                }
                Err(_) => {
                    warn!(
                        "Attempt {}/{} for work item {} timed out after {} ms",
                        attempt,
                        MAX_ATTEMPTS,
                        item.work_id,
                        self.timeout.as_millis()
                    );
                }
            }
        }

        info!("Giving up on work item {}", item.work_id);
        MoveOutcome::rejected(RejectionReason::InfrastructureFailure, GENERIC_FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationPolicy;
    use crate::models::team::Team;
    use crate::models::work_item::MoveRequest;
    use crate::repositories::chat_repository::MockChatRepository;
    use crate::services::errors::move_processor_errors::MoveProcessorError;
    use crate::services::move_processor::MockMoveProcessorTrait;
    use async_trait::async_trait;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn silent_chat() -> NotificationService {
        let mut chat = MockChatRepository::new();
        chat.expect_publish().never();
        NotificationService::new(Arc::new(chat), NotificationPolicy::default())
    }

    fn item(reply_to: Option<&str>) -> WorkItem {
        WorkItem::new(
            "game-1",
            true,
            Team::Red,
            "U1",
            MoveRequest::Text("e4".to_string()),
            reply_to.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_retryable_failure_is_retried_once() {
        let mut processor = MockMoveProcessorTrait::new();
        let mut seq = Sequence::new();
        processor
            .expect_process()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(MoveProcessorError::Retryable("store down".to_string())));
        processor
            .expect_process()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(MoveOutcome::accepted("e4 played for red.")));

        let worker = MoveWorker::new(Arc::new(processor), silent_chat(), Duration::from_secs(1));

        let outcome = worker.handle(&item(None)).await;

        assert!(outcome.is_accepted());
    }

    #[tokio::test]
    async fn test_gives_up_after_second_failure() {
        let mut processor = MockMoveProcessorTrait::new();
        processor
            .expect_process()
            .times(MAX_ATTEMPTS as usize)
            .returning(|_| Err(MoveProcessorError::Retryable("store down".to_string())));

        let worker = MoveWorker::new(Arc::new(processor), silent_chat(), Duration::from_secs(1));

        let outcome = worker.handle(&item(None)).await;

        assert_eq!(
            outcome,
            MoveOutcome::rejected(RejectionReason::InfrastructureFailure, GENERIC_FAILURE)
        );
    }

    #[tokio::test]
    async fn test_divergence_is_never_retried() {
        let mut processor = MockMoveProcessorTrait::new();
        processor
            .expect_process()
            .times(1)
            .returning(|_| Err(MoveProcessorError::Divergence("put failed".to_string())));

        let worker = MoveWorker::new(Arc::new(processor), silent_chat(), Duration::from_secs(1));

        let outcome = worker.handle(&item(None)).await;

        assert_eq!(outcome.reason(), Some(RejectionReason::DivergenceRisk));
    }

    struct StalledProcessor;

    #[async_trait]
    impl MoveProcessorTrait for StalledProcessor {
        async fn process(&self, _item: &WorkItem) -> Result<MoveOutcome, MoveProcessorError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(MoveOutcome::accepted("too slow"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failed_attempt() {
        let worker = MoveWorker::new(
            Arc::new(StalledProcessor),
            silent_chat(),
            Duration::from_millis(100),
        );

        let outcome = worker.handle(&item(None)).await;

        assert_eq!(outcome.reason(), Some(RejectionReason::InfrastructureFailure));
    }

    #[tokio::test]
    async fn test_outcome_is_sent_to_reply_channel() {
        let mut processor = MockMoveProcessorTrait::new();
        processor
            .expect_process()
            .returning(|_| Ok(MoveOutcome::accepted("e4 played for red.")));

        let mut chat = MockChatRepository::new();
        chat.expect_publish()
            .with(eq("D42"), eq("<@U1> e4 played for red."))
            .times(1)
            .returning(|_, _| Ok(()));
        let notifications = NotificationService::new(Arc::new(chat), NotificationPolicy::default());

        let worker = MoveWorker::new(Arc::new(processor), notifications, Duration::from_secs(1));

        worker.handle(&item(Some("D42"))).await;
    }
}
