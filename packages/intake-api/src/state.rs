use std::sync::Arc;

use shared::services::intake_service::IntakeService;
use shared::services::profile_service::ProfileService;

#[derive(Clone)]
pub struct AppState {
    pub intake_service: Arc<IntakeService>,
    pub profile_service: Arc<ProfileService>,
}
