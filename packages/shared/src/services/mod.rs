pub mod chess_service;
pub mod errors;
pub mod intake_service;
pub mod local_move_queue;
pub mod move_processor;
pub mod move_worker;
pub mod notification_service;
pub mod profile_service;
pub mod turn_service;
