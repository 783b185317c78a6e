pub mod chat_repository;
pub mod errors;
pub mod game_repository;
pub mod move_queue_repository;
pub mod move_repository;
pub mod remote_host_repository;
