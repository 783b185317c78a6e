use lambda_runtime::{run, service_fn, Error};
use std::sync::Arc;

mod processor;
use processor::MoveQueueProcessor;
use shared::{
    config::Config,
    repositories::{
        chat_repository::SlackRepository, game_repository::DynamoDbGameRepository,
        move_queue_repository::DynamoDbMoveQueue, move_repository::DynamoDbMoveRepository,
        remote_host_repository::LichessRepository,
    },
    services::{
        move_processor::MoveProcessor, move_worker::MoveWorker,
        notification_service::NotificationService,
    },
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;

    let aws_config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&aws_config);
    let http = reqwest::Client::new();

    let games = Arc::new(DynamoDbGameRepository::new(client.clone(), &config.games_table));
    let moves = Arc::new(DynamoDbMoveRepository::new(client.clone(), &config.moves_table));
    let queue = Arc::new(DynamoDbMoveQueue::new(client, &config.move_queue_table));
    let remote = Arc::new(LichessRepository::new(http.clone(), config.lichess.clone()));
    let chat = Arc::new(SlackRepository::new(http, &config.slack_webhook_url));

    let notifications = NotificationService::new(chat, config.notification.clone());
    let processor = MoveProcessor::new(games, moves, remote, notifications.clone());
    let worker = MoveWorker::new(
        Arc::new(processor),
        notifications,
        config.processing_timeout,
    );

    let queue_processor = MoveQueueProcessor::new(worker, queue);

    run(service_fn(
        move |event: lambda_runtime::LambdaEvent<aws_lambda_events::event::dynamodb::Event>| {
            let queue_processor = queue_processor.clone();
            async move { queue_processor.process_event(event.payload).await }
        },
    ))
    .await
}
