use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

pub mod state;

use shared::config::Config;
use shared::models::team::Team;
use shared::repositories::game_repository::DynamoDbGameRepository;
use shared::repositories::move_queue_repository::DynamoDbMoveQueue;
use shared::repositories::move_repository::DynamoDbMoveRepository;
use shared::repositories::remote_host_repository::LichessRepository;
use shared::services::intake_service::{IntakeDecision, IntakeService};
use shared::services::profile_service::ProfileService;

/// A decoded chat command. `action` is one of `move`, `board` or `profile`.
#[derive(Debug, Deserialize)]
pub struct IntakeEvent {
    pub action: String,
    pub identity: Option<String>,
    pub text: Option<String>,
    pub team: Option<String>,
    pub reply_to: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct IntakeResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
}

impl IntakeResponse {
    fn new(status_code: u16, message: impl Into<String>) -> Self {
        IntakeResponse {
            status_code,
            message: message.into(),
        }
    }
}

const GENERIC_FAILURE: &str = "Something went wrong, please try again.";

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

    let games = Arc::new(DynamoDbGameRepository::new(client.clone(), &config.games_table));
    let moves = Arc::new(DynamoDbMoveRepository::new(client.clone(), &config.moves_table));
    let queue = Arc::new(DynamoDbMoveQueue::new(client, &config.move_queue_table));
    let remote = Arc::new(LichessRepository::new(
        reqwest::Client::new(),
        config.lichess.clone(),
    ));

    let app_state = state::AppState {
        intake_service: Arc::new(IntakeService::new(
            games.clone(),
            moves.clone(),
            queue,
            remote,
            config.move_timeout,
        )),
        profile_service: Arc::new(ProfileService::new(games, moves)),
    };

    run(service_fn(|event: LambdaEvent<IntakeEvent>| {
        intake_handler(event.payload, app_state.clone())
    }))
    .await
}

async fn intake_handler(
    event: IntakeEvent,
    state: state::AppState,
) -> Result<IntakeResponse, Error> {
    debug!("Received intake event: {:?}", event);

    let response = match event.action.as_str() {
        "move" => handle_move(event, &state).await,
        "board" => handle_board(&state).await,
        "profile" => handle_profile(event, &state).await,
        other => {
            error!("Unknown action: {}", other);
            IntakeResponse::new(400, format!("Unknown action: {}", other))
        }
    };

    Ok(response)
}

async fn handle_move(event: IntakeEvent, state: &state::AppState) -> IntakeResponse {
    let Some(identity) = event.identity else {
        return IntakeResponse::new(400, "identity is required");
    };
    let text = event.text.unwrap_or_default();

    let requested_team = match event.team.as_deref().map(str::parse::<Team>) {
        None => None,
        Some(Ok(team)) => Some(team),
        Some(Err(e)) => return IntakeResponse::new(400, e),
    };

    match state
        .intake_service
        .accept(
            &identity,
            &text,
            requested_team,
            event.reply_to,
            chrono::Utc::now(),
        )
        .await
    {
        Ok(decision @ IntakeDecision::Pending { .. }) => {
            info!("Move from {} is pending", identity);
            IntakeResponse::new(202, decision.message())
        }
        Ok(IntakeDecision::Rejected { reason, message }) => {
            info!("Move from {} rejected at intake: {}", identity, reason);
            IntakeResponse::new(200, message)
        }
        Err(e) => {
            error!("Intake failed for {}: {}", identity, e);
            IntakeResponse::new(500, GENERIC_FAILURE)
        }
    }
}

async fn handle_board(state: &state::AppState) -> IntakeResponse {
    match state.intake_service.board_link().await {
        Ok(message) => IntakeResponse::new(200, message),
        Err(e) => {
            error!("Board lookup failed: {}", e);
            IntakeResponse::new(500, GENERIC_FAILURE)
        }
    }
}

async fn handle_profile(event: IntakeEvent, state: &state::AppState) -> IntakeResponse {
    let Some(identity) = event.identity else {
        return IntakeResponse::new(400, "identity is required");
    };

    match state.profile_service.profile(&identity).await {
        Ok(profile) => IntakeResponse::new(200, profile.summary()),
        Err(e) => {
            error!("Profile lookup failed for {}: {}", identity, e);
            IntakeResponse::new(500, GENERIC_FAILURE)
        }
    }
}
