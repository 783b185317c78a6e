pub mod chess_service_errors;
pub mod intake_service_errors;
pub mod move_processor_errors;
pub mod profile_service_errors;
