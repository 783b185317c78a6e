use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::models::outcome::MoveOutcome;
use crate::models::work_item::WorkItem;
use crate::repositories::errors::move_queue_errors::MoveQueueError;
use crate::repositories::move_queue_repository::MoveQueue;
use crate::services::move_worker::MoveWorker;

/// A processed work item.
#[derive(Debug, Clone)]
pub struct Completion {
    pub item: WorkItem,
    pub outcome: MoveOutcome,
}

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

type Consumers = Arc<Mutex<HashMap<String, UnboundedSender<WorkItem>>>>;

/// In-process queue with one consumer task per game. Items for a game are
/// handled one at a time in enqueue order. A consumer that has been idle for
/// `idle_timeout` retires and the next item for its game starts a fresh one.
/// Must be used inside a tokio runtime.
pub struct LocalMoveQueue {
    worker: MoveWorker,
    consumers: Consumers,
    completions: UnboundedSender<Completion>,
    idle_timeout: Duration,
}

fn lock(consumers: &Consumers) -> MutexGuard<'_, HashMap<String, UnboundedSender<WorkItem>>> {
    match consumers.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl LocalMoveQueue {
    pub fn new(worker: MoveWorker) -> (Self, UnboundedReceiver<Completion>) {
        Self::with_idle_timeout(worker, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(
        worker: MoveWorker,
        idle_timeout: Duration,
    ) -> (Self, UnboundedReceiver<Completion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        let queue = LocalMoveQueue {
            worker,
            consumers: Arc::new(Mutex::new(HashMap::new())),
            completions,
            idle_timeout,
        };
        (queue, receiver)
    }

    fn spawn_consumer(&self, game_id: &str) -> UnboundedSender<WorkItem> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<WorkItem>();
        let worker = self.worker.clone();
        let completions = self.completions.clone();
        let consumers = self.consumers.clone();
        let own_sender = sender.clone();
        let idle_timeout = self.idle_timeout;
        let game_id = game_id.to_string();

        tokio::spawn(async move {
            info!("Started move consumer for game {}", game_id);
            loop {
                let item = match tokio::time::timeout(idle_timeout, receiver.recv()).await {
                    Ok(Some(item)) => item,
                    Ok(None) => break,
                    Err(_) => {
                        // Enqueue sends under this lock, so nothing can slip in after the check
                        let mut map = lock(&consumers);
                        match receiver.try_recv() {
                            Ok(item) => item,
                            Err(_) => {
                                if map
                                    .get(&game_id)
                                    .is_some_and(|current| current.same_channel(&own_sender))
                                {
                                    map.remove(&game_id);
                                }
                                break;
                            }
                        }
                    }
                };

                let outcome = worker.handle(&item).await;
                if completions.send(Completion { item, outcome }).is_err() {
                    debug!("Nobody is listening for completions in game {}", game_id);
                }
            }
            info!("Move consumer for game {} stopped", game_id);
        });

        sender
    }
}

#[async_trait]
impl MoveQueue for LocalMoveQueue {
    async fn enqueue(&self, item: &WorkItem) -> Result<(), MoveQueueError> {
        let mut consumers = lock(&self.consumers);

        let sender = match consumers.get(&item.game_id) {
            Some(sender) if !sender.is_closed() => sender.clone(),
            _ => {
                let sender = self.spawn_consumer(&item.game_id);
                consumers.insert(item.game_id.clone(), sender.clone());
                sender
            }
        };

        sender
            .send(item.clone())
            .map_err(|_| MoveQueueError::Closed(item.game_id.clone()))
    }

    /// Items leave the channel when they are received, nothing to delete.
    async fn acknowledge(&self, _item: &WorkItem) -> Result<(), MoveQueueError> {
        Ok(())
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
    use crate::services::move_processor::MoveProcessorTrait;
    use crate::services::notification_service::NotificationService;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingProcessor {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MoveProcessorTrait for RecordingProcessor {
        async fn process(&self, item: &WorkItem) -> Result<MoveOutcome, MoveProcessorError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            // Earlier items sleep longer, so overlap would reorder them
            let delay = match &item.request {
                MoveRequest::Text(text) => 30 - text.len() as u64,
                MoveRequest::Random => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.seen.lock().unwrap().push(item.work_id.clone());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(MoveOutcome::accepted("ok"))
        }
    }

    fn worker(processor: Arc<RecordingProcessor>) -> MoveWorker {
        let chat = MockChatRepository::new();
        MoveWorker::new(
            processor,
            NotificationService::new(Arc::new(chat), NotificationPolicy::default()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_items_for_one_game_run_in_order_one_at_a_time() {
        let processor = Arc::new(RecordingProcessor::default());
        let (queue, mut completions) = LocalMoveQueue::new(worker(processor.clone()));

        let items: Vec<WorkItem> = ["a", "bb", "ccc"]
            .iter()
            .map(|text| {
                WorkItem::new(
                    "game-1",
                    true,
                    Team::Red,
                    "U1",
                    MoveRequest::Text(text.to_string()),
                    None,
                )
            })
            .collect();

        for item in &items {
            queue.enqueue(item).await.unwrap();
        }

        let mut completed = Vec::new();
        for _ in 0..items.len() {
            completed.push(completions.recv().await.unwrap().item.work_id);
        }

        let expected: Vec<String> = items.iter().map(|item| item.work_id.clone()).collect();
        assert_eq!(completed, expected);
        assert_eq!(*processor.seen.lock().unwrap(), expected);
        assert_eq!(processor.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_consumer_retires_and_game_keeps_working() {
        let processor = Arc::new(RecordingProcessor::default());
        let (queue, mut completions) =
            LocalMoveQueue::with_idle_timeout(worker(processor.clone()), Duration::from_secs(60));
        let first = WorkItem::new("game-1", true, Team::Red, "U1", MoveRequest::Random, None);

        queue.enqueue(&first).await.unwrap();
        completions.recv().await.unwrap();
        assert_eq!(lock(&queue.consumers).len(), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(lock(&queue.consumers).is_empty());

        let second = WorkItem::new("game-1", true, Team::Blue, "U2", MoveRequest::Random, None);
        queue.enqueue(&second).await.unwrap();
        let completion = completions.recv().await.unwrap();

        assert_eq!(completion.item.work_id, second.work_id);
        assert_eq!(processor.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_acknowledge_is_a_no_op() {
        let processor = Arc::new(RecordingProcessor::default());
        let (queue, _completions) = LocalMoveQueue::new(worker(processor));
        let item = WorkItem::new("game-1", true, Team::Red, "U1", MoveRequest::Random, None);

        assert!(queue.acknowledge(&item).await.is_ok());
    }
}
