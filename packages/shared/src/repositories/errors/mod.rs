pub mod chat_errors;
pub mod game_repository_errors;
pub mod move_queue_errors;
pub mod move_repository_errors;
pub mod remote_host_errors;
